//! # Core Master Data Repository
//!
//! Divisions and buyers are master data owned by the Core database.

use std::sync::Arc;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, FromQueryResult};

use super::{first_match, lookup_statement};
use crate::models::{Buyer, Division, machine, production_order};

#[derive(Clone, Debug)]
pub struct CoreRepository {
    db: Arc<DatabaseConnection>,
}

impl CoreRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn find_division(&self, id: i64) -> Result<Option<Division>, DbErr> {
        let stmt = lookup_statement(
            self.db.get_database_backend(),
            machine::DIVISION_TABLE,
            &machine::DIVISION_COLUMNS,
            "id",
            id,
        );
        let rows = Division::find_by_statement(stmt).all(self.db.as_ref()).await?;
        Ok(first_match(rows, machine::DIVISION_TABLE, id))
    }

    pub async fn find_buyer(&self, id: i64) -> Result<Option<Buyer>, DbErr> {
        let stmt = lookup_statement(
            self.db.get_database_backend(),
            production_order::BUYER_TABLE,
            &production_order::BUYER_COLUMNS,
            "id",
            id,
        );
        let rows = Buyer::find_by_statement(stmt).all(self.db.as_ref()).await?;
        Ok(first_match(rows, production_order::BUYER_TABLE, id))
    }
}
