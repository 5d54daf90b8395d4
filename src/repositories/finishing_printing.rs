//! # Finishing/Printing Repository
//!
//! Monitoring events, machines and the machine event catalogue all live in the
//! Finishing/Printing production database.

use std::sync::Arc;

use sea_orm::sea_query::{Alias, Query};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, FromQueryResult};

use super::{first_match, lookup_statement};
use crate::models::{
    Machine, MachineEvent, MonitoringEvent, machine, machine_event, monitoring_event,
};

/// Repository for the Finishing/Printing source.
#[derive(Clone, Debug)]
pub struct FinishingPrintingRepository {
    db: Arc<DatabaseConnection>,
}

impl FinishingPrintingRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Extract the base monitoring event rows, optionally capped at `limit`.
    pub async fn extract_monitoring_events(
        &self,
        limit: Option<u64>,
    ) -> Result<Vec<MonitoringEvent>, DbErr> {
        let mut query = Query::select();
        query
            .columns(monitoring_event::COLUMNS.iter().map(|column| Alias::new(*column)))
            .from(Alias::new(monitoring_event::TABLE));
        if let Some(limit) = limit {
            query.limit(limit);
        }

        let stmt = self.db.get_database_backend().build(&query);
        MonitoringEvent::find_by_statement(stmt).all(self.db.as_ref()).await
    }

    /// Look up a machine by id. The unit and division are attached by the caller.
    pub async fn find_machine(&self, id: i64) -> Result<Option<Machine>, DbErr> {
        let stmt = lookup_statement(
            self.db.get_database_backend(),
            machine::TABLE,
            &machine::COLUMNS,
            "id",
            id,
        );
        let rows = Machine::find_by_statement(stmt).all(self.db.as_ref()).await?;
        Ok(first_match(rows, machine::TABLE, id))
    }

    /// Look up a machine event catalogue entry by id.
    pub async fn find_machine_event(&self, id: i64) -> Result<Option<MachineEvent>, DbErr> {
        let stmt = lookup_statement(
            self.db.get_database_backend(),
            machine_event::TABLE,
            &machine_event::COLUMNS,
            "id",
            id,
        );
        let rows = MachineEvent::find_by_statement(stmt).all(self.db.as_ref()).await?;
        Ok(first_match(rows, machine_event::TABLE, id))
    }
}
