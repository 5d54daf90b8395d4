use sea_orm::{DbErr, FromQueryResult, QueryResult};

pub const TABLE: &str = "MachineEvents";

pub const COLUMNS: [&str; 4] = ["id", "no", "name", "category"];

/// Catalogue entry describing what kind of event a monitoring record captured.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MachineEvent {
    pub id: Option<i64>,
    pub no: Option<i64>,
    pub name: Option<String>,
    pub category: Option<String>,
}

impl FromQueryResult for MachineEvent {
    fn from_query_result(res: &QueryResult, pre: &str) -> Result<Self, DbErr> {
        Ok(Self {
            id: res.try_get(pre, "id")?,
            no: res.try_get(pre, "no")?,
            name: res.try_get(pre, "name")?,
            category: res.try_get(pre, "category")?,
        })
    }
}
