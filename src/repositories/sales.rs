//! # Sales Repository

use std::sync::Arc;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, FromQueryResult};

use super::{first_match, lookup_statement};
use crate::models::{ProductionOrder, production_order};

/// Repository for production orders held by the Sales database.
#[derive(Clone, Debug)]
pub struct SalesRepository {
    db: Arc<DatabaseConnection>,
}

impl SalesRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Look up a production order by id. Buyer and synthesized sub-objects are
    /// attached by the caller.
    pub async fn find_production_order(&self, id: i64) -> Result<Option<ProductionOrder>, DbErr> {
        let stmt = lookup_statement(
            self.db.get_database_backend(),
            production_order::TABLE,
            &production_order::COLUMNS,
            "id",
            id,
        );
        let rows = ProductionOrder::find_by_statement(stmt)
            .all(self.db.as_ref())
            .await?;
        Ok(first_match(rows, production_order::TABLE, id))
    }
}
