use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub body_html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContent {
    pub subject: String,
    pub body: String,
}
