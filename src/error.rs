//! # Error Handling
//!
//! Stage-specific error types for the monitoring event pipeline and the opaque
//! [`FailureReport`] handed back to whoever triggered the run.

use std::fmt;

use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::telemetry;

/// Pipeline stage an error originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extract,
    Enrich,
    Format,
    Load,
}

/// The lookup an enrichment error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Join {
    Machine,
    Division,
    ProductionOrder,
    Buyer,
    MachineEvent,
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Join::Machine => "machine",
            Join::Division => "division",
            Join::ProductionOrder => "production order",
            Join::Buyer => "buyer",
            Join::MachineEvent => "machine event",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("{join} lookup for id {key} failed: {source}")]
    Query {
        join: Join,
        key: i64,
        #[source]
        source: DbErr,
    },
    #[error("{join} with id {key} not found")]
    NotFound { join: Join, key: i64 },
}

#[derive(Debug, Error, PartialEq)]
pub enum FormatError {
    #[error("{field} millisecond value {value} is not a valid instant")]
    InvalidInstant { field: &'static str, value: i64 },
    #[error("{field} leaves the representable date range after the warehouse offset")]
    DateOutOfRange { field: &'static str },
}

/// Failures of the warehouse load transaction.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open warehouse transaction: {0}")]
    TransactionOpen(#[source] DbErr),
    #[error("staging batch {batch} ({rows} rows) failed: {source}")]
    BatchInsert {
        batch: usize,
        rows: usize,
        #[source]
        source: DbErr,
    },
    #[error("upsert procedure {procedure} failed: {source}")]
    Upsert {
        procedure: &'static str,
        #[source]
        source: DbErr,
    },
    #[error("failed to commit warehouse transaction: {0}")]
    Commit(#[source] DbErr),
    /// Rolling back after `cause` failed as well; both stay observable.
    #[error("rollback after [{cause}] failed: {source}")]
    Rollback {
        cause: Box<LoadError>,
        #[source]
        source: DbErr,
    },
}

impl LoadError {
    pub fn code(&self) -> &'static str {
        match self {
            LoadError::TransactionOpen(_) => "TRANSACTION_OPEN_FAILURE",
            LoadError::BatchInsert { .. } => "BATCH_INSERT_FAILURE",
            LoadError::Upsert { .. } => "UPSERT_FAILURE",
            LoadError::Commit(_) => "COMMIT_FAILURE",
            LoadError::Rollback { .. } => "ROLLBACK_FAILURE",
        }
    }
}

/// Any failure that aborts a pipeline run.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("extraction failed: {0}")]
    Extraction(#[source] DbErr),
    #[error("enrichment failed for record {index}: {source}")]
    Enrichment {
        index: usize,
        #[source]
        source: EnrichError,
    },
    #[error("formatting failed for record {index}: {source}")]
    Formatting {
        index: usize,
        #[source]
        source: FormatError,
    },
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl EtlError {
    pub fn stage(&self) -> Stage {
        match self {
            EtlError::Extraction(_) => Stage::Extract,
            EtlError::Enrichment { .. } => Stage::Enrich,
            EtlError::Formatting { .. } => Stage::Format,
            EtlError::Load(_) => Stage::Load,
        }
    }

    /// Stable error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            EtlError::Extraction(_) => "EXTRACTION_FAILURE",
            EtlError::Enrichment { .. } => "ENRICHMENT_FAILURE",
            EtlError::Formatting { .. } => "FORMATTING_FAILURE",
            EtlError::Load(load) => load.code(),
        }
    }

    /// Serializable description of the failure for the invoker.
    pub fn report(&self) -> FailureReport {
        let cause = match self {
            EtlError::Load(LoadError::Rollback { cause, .. }) => Some(Box::new(FailureReport {
                stage: Stage::Load,
                code: cause.code(),
                message: cause.to_string(),
                cause: None,
                run_id: None,
            })),
            _ => None,
        };

        FailureReport {
            stage: self.stage(),
            code: self.code(),
            message: self.to_string(),
            cause,
            run_id: telemetry::current_run_id(),
        }
    }
}

/// Opaque failure payload describing what failed and at which stage.
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub stage: Stage,
    pub code: &'static str,
    pub message: String,
    /// The original failure when cleanup after it failed too.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<FailureReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
}
