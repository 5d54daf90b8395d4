//! # Monitoring Event ETL
//!
//! Extracts monitoring events from the Finishing/Printing database, enriches them from
//! the Core and Sales databases, renders warehouse literals and loads them into the
//! analytical warehouse in a single transaction.

pub mod config;
pub mod db;
pub mod enrichment;
pub mod error;
pub mod formatter;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod repositories;
pub mod scheduler;
pub mod telemetry;
