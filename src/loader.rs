//! # Batch Loader
//!
//! Writes formatted rows to the warehouse staging table and merges them into the
//! fact table with the upsert procedure, all inside one transaction.
//!
//! Rows are split into consecutive batches of at most `batch_size`. Each batch becomes
//! one parameterized multi-row `INSERT`; all batches are submitted concurrently on the
//! transaction and awaited together. Any batch or upsert failure rolls the whole load
//! back.

use std::sync::Arc;

use futures::future::join_all;
use sea_orm::sea_query::{Alias, IntoTableRef, Query, SimpleExpr, TableRef};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, Statement,
    TransactionTrait,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::LoadError;
use crate::formatter::{FormattedRow, Literal};

pub const STAGING_TABLE: &str = "DL_Fact_Monitoring_Event_Temp";

pub const UPSERT_PROCEDURE: &str = "DL_UPSERT_FACT_MONITORING_EVENT";

/// Default and maximum number of rows per staging insert.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Staging insert column list. Part of the warehouse contract.
pub const STAGING_COLUMNS: [&str; 35] = [
    "cartNumber",
    "monitoringEventCode",
    "monitoringEventStartedDate",
    "eventStartedTime",
    "monitoringEventEndDate",
    "eventEndTime",
    "machineCode",
    "machineName",
    "machineProcess",
    "machineStepProcess",
    "unitCode",
    "divisionCode",
    "divisionName",
    "unitName",
    "productionOrderBuyerName",
    "productionOrderConstruction",
    "productionOrderDetailCode",
    "productionOrderDetailColorRequest",
    "productionOrderDetailColorTemplate",
    "productionOrderDetailColorTypeName",
    "productionOrderOrderType",
    "productionOrderProcessType",
    "productionOrderSalesContractNo",
    "monitoringEventRemark",
    "selectedProductionOrderDetailCode",
    "selectedProductionOrderDetailColorRequest",
    "selectedProductionOrderDetailColorTemplate",
    "selectedProductionOrderDetailColorTypeName",
    "machineEventName",
    "eventRange",
    "productionOrderOrderNo",
    "machineEventNo",
    "createdBy",
    "deleted",
    "eventCategory",
];

/// Values for [`STAGING_COLUMNS`], position for position.
///
/// The `productionOrderDetail*` columns are fed from the `selectedProductionOrderDetail*`
/// fields, as the warehouse has always received them.
pub fn staging_values(row: &FormattedRow) -> [&Literal; 35] {
    [
        &row.cart_number,
        &row.monitoring_event_code,
        &row.monitoring_event_started_date,
        &row.event_started_time,
        &row.monitoring_event_end_date,
        &row.event_end_time,
        &row.machine_code,
        &row.machine_name,
        &row.machine_process,
        &row.machine_step_process,
        &row.unit_code,
        &row.division_code,
        &row.division_name,
        &row.unit_name,
        &row.production_order_buyer_name,
        &row.production_order_construction,
        &row.selected_production_order_detail_code,
        &row.selected_production_order_detail_color_request,
        &row.selected_production_order_detail_color_template,
        &row.selected_production_order_detail_color_type_name,
        &row.production_order_order_type,
        &row.production_order_process_type,
        &row.production_order_sales_contract_no,
        &row.monitoring_event_remark,
        &row.selected_production_order_detail_code,
        &row.selected_production_order_detail_color_request,
        &row.selected_production_order_detail_color_template,
        &row.selected_production_order_detail_color_type_name,
        &row.machine_event_name,
        &row.event_range,
        &row.production_order_order_no,
        &row.machine_event_no,
        &row.created_by,
        &row.deleted,
        &row.event_category,
    ]
}

/// Outcome of one staging insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    /// Zero-based position of the batch in submission order.
    pub batch: usize,
    pub rows: usize,
    pub rows_affected: u64,
}

/// The statement that merges the staging table into the fact table.
pub fn upsert_statement(backend: DbBackend) -> Statement {
    let sql = match backend {
        DbBackend::Postgres | DbBackend::MySql => format!("CALL {UPSERT_PROCEDURE}()"),
        _ => format!("EXEC {UPSERT_PROCEDURE}"),
    };
    Statement::from_string(backend, sql)
}

struct Batch {
    index: usize,
    rows: usize,
    statement: Statement,
}

#[derive(Clone, Debug)]
pub struct BatchLoader {
    warehouse: Arc<DatabaseConnection>,
    schema: Option<String>,
    batch_size: usize,
}

impl BatchLoader {
    pub fn new(warehouse: Arc<DatabaseConnection>, schema: Option<String>) -> Self {
        Self {
            warehouse,
            schema,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Load `rows` atomically: stage every batch, run the upsert, commit.
    ///
    /// An empty row set submits no batches but still runs the upsert and commits.
    #[instrument(skip_all, fields(rows = rows.len(), batch_size = self.batch_size))]
    pub async fn load(&self, rows: &[FormattedRow]) -> Result<Vec<BatchResult>, LoadError> {
        let backend = self.warehouse.get_database_backend();
        let batches = self.build_batches(backend, rows)?;

        let txn = self
            .warehouse
            .begin()
            .await
            .map_err(LoadError::TransactionOpen)?;

        match self.stage_and_upsert(&txn, backend, batches).await {
            Ok(results) => {
                txn.commit().await.map_err(LoadError::Commit)?;
                metrics::counter!("monitoring_event_batches_loaded_total")
                    .increment(results.len() as u64);
                info!(batches = results.len(), "Warehouse load committed");
                Ok(results)
            }
            Err(cause) => {
                warn!(error = %cause, code = cause.code(), "Rolling back warehouse load");
                match txn.rollback().await {
                    Ok(()) => Err(cause),
                    Err(source) => Err(LoadError::Rollback {
                        cause: Box::new(cause),
                        source,
                    }),
                }
            }
        }
    }

    async fn stage_and_upsert(
        &self,
        txn: &DatabaseTransaction,
        backend: DbBackend,
        batches: Vec<Batch>,
    ) -> Result<Vec<BatchResult>, LoadError> {
        let submitted = batches
            .iter()
            .map(|batch| (batch.index, batch.rows))
            .collect::<Vec<_>>();
        let outcomes = join_all(
            batches
                .into_iter()
                .map(|batch| txn.execute(batch.statement)),
        )
        .await;

        let mut results = Vec::with_capacity(outcomes.len());
        for ((batch, rows), outcome) in submitted.into_iter().zip(outcomes) {
            let exec = outcome.map_err(|source| LoadError::BatchInsert {
                batch,
                rows,
                source,
            })?;
            debug!(batch, rows, rows_affected = exec.rows_affected(), "Staged batch");
            results.push(BatchResult {
                batch,
                rows,
                rows_affected: exec.rows_affected(),
            });
        }

        txn.execute(upsert_statement(backend))
            .await
            .map_err(|source| LoadError::Upsert {
                procedure: UPSERT_PROCEDURE,
                source,
            })?;

        Ok(results)
    }

    fn build_batches(
        &self,
        backend: DbBackend,
        rows: &[FormattedRow],
    ) -> Result<Vec<Batch>, LoadError> {
        rows.chunks(self.batch_size)
            .enumerate()
            .map(|(index, chunk)| {
                self.insert_statement(backend, chunk)
                    .map(|statement| Batch {
                        index,
                        rows: chunk.len(),
                        statement,
                    })
                    .map_err(|source| LoadError::BatchInsert {
                        batch: index,
                        rows: chunk.len(),
                        source,
                    })
            })
            .collect()
    }

    fn staging_table(&self) -> TableRef {
        match &self.schema {
            Some(schema) => {
                (Alias::new(schema.as_str()), Alias::new(STAGING_TABLE)).into_table_ref()
            }
            None => Alias::new(STAGING_TABLE).into_table_ref(),
        }
    }

    fn insert_statement(
        &self,
        backend: DbBackend,
        chunk: &[FormattedRow],
    ) -> Result<Statement, DbErr> {
        let mut insert = Query::insert();
        insert
            .into_table(self.staging_table())
            .columns(STAGING_COLUMNS.iter().map(|column| Alias::new(*column)));

        for row in chunk {
            let values = staging_values(row)
                .into_iter()
                .map(|literal| SimpleExpr::Value(literal.to_value()));
            insert
                .values(values)
                .map_err(|err| DbErr::Custom(format!("invalid staging row: {err}")))?;
        }

        Ok(backend.build(&insert))
    }
}
