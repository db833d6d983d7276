use chrono::NaiveDate;
use serde::Serialize;

use crate::models::invoice::TransactionRecord;

/// Status code the record store uses for an open, unpaid customer invoice.
pub const OPEN_INVOICE_STATUS: &str = "CustInvc:A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    SubsidiaryAnyOf(Vec<i64>),
    Mainline(bool),
    StatusAnyOf(Vec<String>),
    /// Whole days between `as_of` and the due date equal `days`.
    DaysPastDue { as_of: NaiveDate, days: u32 },
}

impl Filter {
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        match self {
            Filter::SubsidiaryAnyOf(ids) => ids.contains(&record.subsidiary_id),
            Filter::Mainline(mainline) => record.mainline == *mainline,
            Filter::StatusAnyOf(statuses) => statuses.iter().any(|s| *s == record.status),
            Filter::DaysPastDue { as_of, days } => {
                (*as_of - record.due_date).num_days() == i64::from(*days)
            }
        }
    }

    fn push_sql(&self, clauses: &mut Vec<String>, params: &mut Vec<SqlParam>) {
        match self {
            Filter::SubsidiaryAnyOf(ids) => {
                params.push(SqlParam::BigIntList(ids.clone()));
                clauses.push(format!("t.subsidiary_id = ANY(${})", params.len()));
            }
            Filter::Mainline(mainline) => {
                params.push(SqlParam::Bool(*mainline));
                clauses.push(format!("t.mainline = ${}", params.len()));
            }
            Filter::StatusAnyOf(statuses) => {
                params.push(SqlParam::TextList(statuses.clone()));
                clauses.push(format!("t.status = ANY(${})", params.len()));
            }
            Filter::DaysPastDue { as_of, days } => {
                params.push(SqlParam::Date(*as_of));
                let as_of_idx = params.len();
                params.push(SqlParam::BigInt(i64::from(*days)));
                clauses.push(format!(
                    "(${}::date - t.due_date)::bigint = ${}",
                    as_of_idx,
                    params.len()
                ));
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    TranDate,
    DueDate,
    TranId,
    Entity,
}

impl Field {
    fn expression(&self) -> &'static str {
        match self {
            Field::TranDate => "t.tran_date",
            Field::DueDate => "t.due_date",
            Field::TranId => "t.tran_id",
            Field::Entity => "t.entity_id",
        }
    }

    pub fn alias(&self) -> &'static str {
        match self {
            Field::TranDate => "tran_date",
            Field::DueDate => "due_date",
            Field::TranId => "tran_id",
            Field::Entity => "entity_id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Column {
    pub field: Field,
    pub sort: Option<SortOrder>,
}

impl Column {
    pub fn new(field: Field) -> Self {
        Self { field, sort: None }
    }

    pub fn sorted(field: Field, sort: SortOrder) -> Self {
        Self {
            field,
            sort: Some(sort),
        }
    }
}

/// Bind parameter for a rendered query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    BigInt(i64),
    Bool(bool),
    Date(NaiveDate),
    BigIntList(Vec<i64>),
    TextList(Vec<String>),
}

/// Relation the query reads invoice rows from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    #[default]
    Transactions,
    /// A named database view holding its own selection criteria. It must expose
    /// the same columns as `transactions`.
    SavedView(String),
}

impl RecordSource {
    fn relation(&self) -> &str {
        match self {
            RecordSource::Transactions => "transactions",
            RecordSource::SavedView(name) => name,
        }
    }
}

/// An unexecuted search over transactions. All filters are AND-ed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceQuery {
    pub source: RecordSource,
    pub filters: Vec<Filter>,
    pub columns: Vec<Column>,
}

impl InvoiceQuery {
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        self.filters.iter().all(|filter| filter.matches(record))
    }

    /// Applies the query to an in-memory record set, keeping the requested ordering.
    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a TransactionRecord>
    where
        I: IntoIterator<Item = &'a TransactionRecord>,
    {
        let mut selected: Vec<_> = records.into_iter().filter(|r| self.matches(r)).collect();

        for column in self.columns.iter().rev() {
            let Some(order) = column.sort else {
                continue;
            };

            selected.sort_by(|a, b| {
                let ordering = match column.field {
                    Field::TranDate => a.tran_date.cmp(&b.tran_date),
                    Field::DueDate => a.due_date.cmp(&b.due_date),
                    Field::TranId => a.tran_id.cmp(&b.tran_id),
                    Field::Entity => a.entity_id.cmp(&b.entity_id),
                };
                match order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        selected
    }

    /// Renders the query as PostgreSQL against its source joined to `customers`.
    pub fn to_sql(&self) -> (String, Vec<SqlParam>) {
        let mut select = vec!["t.id AS id".to_string()];
        select.extend(
            self.columns
                .iter()
                .map(|c| format!("{} AS {}", c.field.expression(), c.field.alias())),
        );
        select.push("c.email AS entity_email".to_string());

        let mut clauses = Vec::new();
        let mut params = Vec::new();
        for filter in &self.filters {
            filter.push_sql(&mut clauses, &mut params);
        }

        let mut sql = format!(
            "SELECT {} FROM {} t LEFT JOIN customers c ON c.id = t.entity_id",
            select.join(", "),
            self.source.relation()
        );

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        let order_by: Vec<String> = self
            .columns
            .iter()
            .filter_map(|c| {
                c.sort.map(|order| match order {
                    SortOrder::Asc => format!("{} ASC", c.field.expression()),
                    SortOrder::Desc => format!("{} DESC", c.field.expression()),
                })
            })
            .collect();

        if !order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_by.join(", "));
        }

        (sql, params)
    }
}
