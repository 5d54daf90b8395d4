//! # Repository Layer
//!
//! Read-only query helpers for the three operational sources. Every lookup takes a
//! single key and yields zero or one logical row; when the source returns several
//! matches the first one is used and the occurrence is logged.

pub mod finishing_printing;
pub mod master_data;
pub mod sales;

pub use finishing_printing::FinishingPrintingRepository;
pub use master_data::CoreRepository;
pub use sales::SalesRepository;

use sea_orm::sea_query::{Alias, Expr, Query};
use sea_orm::{DbBackend, Statement};

/// Builds `SELECT <columns> FROM <table> WHERE <key_column> = <key>` for `backend`.
pub(crate) fn lookup_statement(
    backend: DbBackend,
    table: &str,
    columns: &[&str],
    key_column: &str,
    key: i64,
) -> Statement {
    let query = Query::select()
        .columns(columns.iter().map(|column| Alias::new(*column)))
        .from(Alias::new(table))
        .and_where(Expr::col(Alias::new(key_column)).eq(key))
        .to_owned();
    backend.build(&query)
}

/// Keeps the first row of a single-key lookup.
///
/// Several matches for one key are tolerated: the first wins, and a warning records
/// which table and key were ambiguous.
pub(crate) fn first_match<T>(rows: Vec<T>, table: &'static str, key: i64) -> Option<T> {
    if rows.len() > 1 {
        tracing::warn!(
            table,
            key,
            matches = rows.len(),
            "Lookup matched multiple rows; using the first"
        );
        metrics::counter!("monitoring_event_ambiguous_lookups_total", "table" => table)
            .increment(1);
    }
    rows.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_statement_targets_one_key() {
        let stmt = lookup_statement(DbBackend::Postgres, "Machine", &["id", "code"], "id", 7);

        assert_eq!(
            stmt.sql,
            r#"SELECT "id", "code" FROM "Machine" WHERE "id" = $1"#
        );
        assert_eq!(stmt.values.map(|values| values.0.len()), Some(1));
    }

    #[test]
    fn test_first_match_keeps_first_row() {
        assert_eq!(first_match(vec![1, 2, 3], "Machine", 1), Some(1));
        assert_eq!(first_match(Vec::<i32>::new(), "Machine", 1), None);
    }
}
