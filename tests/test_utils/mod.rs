//! Test utilities for database testing.
//!
//! Sets up in-memory SQLite databases shaped like the three operational sources and
//! the warehouse staging table, plus helpers for inserting fixture rows.

#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use monitoring_event_etl::db::SourceConnections;
use monitoring_event_etl::loader::{STAGING_COLUMNS, STAGING_TABLE};
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DbBackend, MockExecResult, Statement, Value,
};

const FINISHING_PRINTING_SCHEMA: &[&str] = &[
    r#"CREATE TABLE "monitoringevent" (
        "cartNumber" TEXT,
        "code" TEXT,
        "dateStart" TIMESTAMP,
        "timeInMilisStart" INTEGER,
        "timeInMilisEnd" INTEGER,
        "dateEnd" TIMESTAMP,
        "productionOrderId" INTEGER,
        "productionOrderOrderNo" TEXT,
        "remark" TEXT,
        "machineId" INTEGER,
        "machineName" TEXT,
        "machineEventName" TEXT,
        "machineEventId" INTEGER,
        "createdBy" TEXT,
        "isDeleted" BOOLEAN,
        "machineEventCategory" TEXT
    )"#,
    r#"CREATE TABLE "Machine" (
        "id" INTEGER,
        "code" TEXT,
        "condition" TEXT,
        "name" TEXT,
        "manufacture" TEXT,
        "process" TEXT,
        "unitCode" TEXT,
        "unitDivisionId" INTEGER,
        "unitDivisionName" TEXT,
        "unitName" TEXT,
        "year" INTEGER
    )"#,
    r#"CREATE TABLE "MachineEvents" (
        "id" INTEGER,
        "no" INTEGER,
        "name" TEXT,
        "category" TEXT
    )"#,
];

const CORE_SCHEMA: &[&str] = &[
    r#"CREATE TABLE "divisions" ("id" INTEGER, "code" TEXT, "name" TEXT)"#,
    r#"CREATE TABLE "Buyers" (
        "id" INTEGER,
        "address" TEXT,
        "code" TEXT,
        "contact" TEXT,
        "country" TEXT,
        "name" TEXT,
        "tempo" INTEGER
    )"#,
];

const SALES_SCHEMA: &[&str] = &[r#"CREATE TABLE "ProductionOrder" (
        "id" INTEGER,
        "buyerId" INTEGER,
        "buyerCode" TEXT,
        "buyerName" TEXT,
        "buyerType" TEXT,
        "deliveryDate" TIMESTAMP,
        "designCode" TEXT,
        "designNumber" TEXT,
        "finishWidth" TEXT,
        "handlingStandard" TEXT,
        "materialName" TEXT,
        "orderQuantity" REAL,
        "orderTypeName" TEXT,
        "processTypeName" TEXT,
        "remark" TEXT,
        "sample" TEXT,
        "shrinkageStandard" TEXT,
        "uomUnit" TEXT,
        "orderNo" TEXT,
        "RUN" TEXT,
        "salesContractNo" TEXT
    )"#];

async fn sqlite_with(schema: &[&str]) -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    for ddl in schema {
        db.execute(Statement::from_string(db.get_database_backend(), *ddl))
            .await?;
    }
    Ok(db)
}

/// Three separate in-memory databases shaped like the operational sources.
pub async fn setup_source_dbs() -> Result<SourceConnections> {
    Ok(SourceConnections {
        finishing_printing: Arc::new(sqlite_with(FINISHING_PRINTING_SCHEMA).await?),
        core: Arc::new(sqlite_with(CORE_SCHEMA).await?),
        sales: Arc::new(sqlite_with(SALES_SCHEMA).await?),
    })
}

/// In-memory warehouse with the staging table in the default schema.
///
/// `cartNumber` is NOT NULL so tests can make a batch fail on demand.
pub async fn setup_staging_db() -> Result<Arc<DatabaseConnection>> {
    staging_db_with_cart_number("TEXT NOT NULL").await
}

/// Like [`setup_staging_db`], but a NULL `cartNumber` makes SQLite abort the whole
/// transaction itself, so the loader's own rollback then fails.
pub async fn setup_self_aborting_staging_db() -> Result<Arc<DatabaseConnection>> {
    staging_db_with_cart_number("TEXT NOT NULL ON CONFLICT ROLLBACK").await
}

async fn staging_db_with_cart_number(definition: &str) -> Result<Arc<DatabaseConnection>> {
    let columns = STAGING_COLUMNS
        .iter()
        .map(|column| {
            if *column == "cartNumber" {
                format!(r#""{column}" {definition}"#)
            } else {
                format!(r#""{column}" TEXT"#)
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    let ddl = format!(r#"CREATE TABLE "{STAGING_TABLE}" ({columns})"#);
    Ok(Arc::new(sqlite_with(&[ddl.as_str()]).await?))
}

/// Number of rows currently in `table`.
pub async fn count_rows(db: &DatabaseConnection, table: &str) -> Result<i64> {
    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            format!(r#"SELECT COUNT(*) AS "count" FROM "{table}""#),
        ))
        .await?
        .ok_or_else(|| anyhow::anyhow!("count returned no row"))?;
    Ok(row.try_get("", "count")?)
}

/// Inserts one row given as column/value pairs.
pub async fn insert_row(
    db: &DatabaseConnection,
    table: &str,
    values: Vec<(&str, Value)>,
) -> Result<()> {
    let columns = values
        .iter()
        .map(|(column, _)| format!(r#""{column}""#))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; values.len()].join(", ");
    let stmt = Statement::from_sql_and_values(
        DbBackend::Sqlite,
        format!(r#"INSERT INTO "{table}" ({columns}) VALUES ({placeholders})"#),
        values.into_iter().map(|(_, value)| value),
    );
    db.execute(stmt).await?;
    Ok(())
}

pub async fn insert_monitoring_event(
    db: &DatabaseConnection,
    values: Vec<(&str, Value)>,
) -> Result<()> {
    insert_row(db, "monitoringevent", values).await
}

pub async fn insert_machine(
    db: &DatabaseConnection,
    id: i64,
    code: &str,
    division_id: Option<i64>,
) -> Result<()> {
    insert_row(
        db,
        "Machine",
        vec![
            ("id", Value::from(id)),
            ("code", Value::from(code)),
            ("condition", Value::from("GOOD")),
            ("name", Value::from("Stenter 'A'")),
            ("manufacture", Value::from("Monforts")),
            ("process", Value::from("Finishing")),
            ("unitCode", Value::from("U1")),
            ("unitDivisionId", Value::from(division_id)),
            ("unitDivisionName", Value::from("Textile")),
            ("unitName", Value::from("Finishing Unit")),
            ("year", Value::from(2015i64)),
        ],
    )
    .await
}

pub async fn insert_division(
    db: &DatabaseConnection,
    id: i64,
    code: &str,
    name: &str,
) -> Result<()> {
    insert_row(
        db,
        "divisions",
        vec![
            ("id", Value::from(id)),
            ("code", Value::from(code)),
            ("name", Value::from(name)),
        ],
    )
    .await
}

pub async fn insert_machine_event(
    db: &DatabaseConnection,
    id: i64,
    no: i64,
    name: &str,
    category: &str,
) -> Result<()> {
    insert_row(
        db,
        "MachineEvents",
        vec![
            ("id", Value::from(id)),
            ("no", Value::from(no)),
            ("name", Value::from(name)),
            ("category", Value::from(category)),
        ],
    )
    .await
}

pub async fn insert_production_order(
    db: &DatabaseConnection,
    id: i64,
    order_no: &str,
    buyer_id: Option<i64>,
) -> Result<()> {
    insert_row(
        db,
        "ProductionOrder",
        vec![
            ("id", Value::from(id)),
            ("buyerId", Value::from(buyer_id)),
            ("deliveryDate", Value::from(at(2021, 4, 30, 18, 0, 0))),
            ("materialName", Value::from("Cotton")),
            ("orderQuantity", Value::from(1200.5f64)),
            ("orderTypeName", Value::from("SOLID")),
            ("processTypeName", Value::from("DYEING")),
            ("uomUnit", Value::from("MTR")),
            ("orderNo", Value::from(order_no)),
            ("RUN", Value::from("1 RUN")),
            ("salesContractNo", Value::from("SC-01")),
        ],
    )
    .await
}

pub async fn insert_buyer(db: &DatabaseConnection, id: i64, name: &str) -> Result<()> {
    insert_row(
        db,
        "Buyers",
        vec![
            ("id", Value::from(id)),
            ("address", Value::from("Jl. Raya 1")),
            ("code", Value::from("B01")),
            ("contact", Value::from("0812")),
            ("country", Value::from("Indonesia")),
            ("name", Value::from(name)),
            ("tempo", Value::from(30i64)),
        ],
    )
    .await
}

pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

pub fn exec_result(rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}

/// Every statement a mock connection saw, in order.
///
/// Every other handle to `db` must be dropped first.
pub fn logged_sql(db: Arc<DatabaseConnection>) -> Vec<String> {
    Arc::try_unwrap(db)
        .expect("mock connection still shared")
        .into_transaction_log()
        .iter()
        .flat_map(|txn| txn.statements().iter().map(|stmt| stmt.sql.clone()))
        .collect()
}
