pub mod invoice;
pub mod query;
pub mod reminder;
pub mod status;
pub mod template;
