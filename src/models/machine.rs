//! Machine rows (Finishing/Printing) and the unit/division they belong to (Core).

use sea_orm::{DbErr, FromQueryResult, QueryResult};

pub const TABLE: &str = "Machine";

pub const COLUMNS: [&str; 11] = [
    "id",
    "code",
    "condition",
    "name",
    "manufacture",
    "process",
    "unitCode",
    "unitDivisionId",
    "unitDivisionName",
    "unitName",
    "year",
];

pub const DIVISION_TABLE: &str = "divisions";

pub const DIVISION_COLUMNS: [&str; 3] = ["id", "code", "name"];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Machine {
    pub id: Option<i64>,
    pub code: Option<String>,
    pub condition: Option<String>,
    pub name: Option<String>,
    pub manufacture: Option<String>,
    pub process: Option<String>,
    pub unit_code: Option<String>,
    pub unit_division_id: Option<i64>,
    pub unit_division_name: Option<String>,
    pub unit_name: Option<String>,
    pub year: Option<i64>,
    /// Built from the denormalized unit columns during enrichment.
    pub unit: Unit,
}

/// Unit a machine is installed in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Unit {
    pub code: Option<String>,
    pub name: Option<String>,
    pub division: Option<Division>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Division {
    pub id: Option<i64>,
    pub code: Option<String>,
    pub name: Option<String>,
}

impl Machine {
    /// Builds `unit` from the flat unit columns and nests `division` under it.
    pub fn with_unit(mut self, division: Option<Division>) -> Self {
        self.unit = Unit {
            code: self.unit_code.clone(),
            name: self.unit_name.clone(),
            division,
        };
        self
    }
}

impl FromQueryResult for Machine {
    fn from_query_result(res: &QueryResult, pre: &str) -> Result<Self, DbErr> {
        Ok(Self {
            id: res.try_get(pre, "id")?,
            code: res.try_get(pre, "code")?,
            condition: res.try_get(pre, "condition")?,
            name: res.try_get(pre, "name")?,
            manufacture: res.try_get(pre, "manufacture")?,
            process: res.try_get(pre, "process")?,
            unit_code: res.try_get(pre, "unitCode")?,
            unit_division_id: res.try_get(pre, "unitDivisionId")?,
            unit_division_name: res.try_get(pre, "unitDivisionName")?,
            unit_name: res.try_get(pre, "unitName")?,
            year: res.try_get(pre, "year")?,
            unit: Unit::default(),
        })
    }
}

impl FromQueryResult for Division {
    fn from_query_result(res: &QueryResult, pre: &str) -> Result<Self, DbErr> {
        Ok(Self {
            id: res.try_get(pre, "id")?,
            code: res.try_get(pre, "code")?,
            name: res.try_get(pre, "name")?,
        })
    }
}
