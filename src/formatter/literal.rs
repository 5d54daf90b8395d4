//! Warehouse literal values.
//!
//! A [`Literal`] renders exactly as the warehouse's bulk-insert syntax expects
//! (`'text'`, a bare number, or `null`) and also knows how to bind itself as a
//! statement parameter. Text binds as text, integers as `BIGINT`, and null as a
//! text-typed NULL, since every staging column is text.

use std::fmt;

use sea_orm::Value;

/// Rendering of an absent value.
pub const NULL_MARKER: &str = "null";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Null,
    /// Quoted text. The payload is already escaped and excludes the surrounding quotes.
    Text(String),
    /// Bare, unquoted integer.
    Integer(i64),
}

impl Literal {
    /// Quoted text; `None` renders as the null marker.
    pub fn text(value: Option<&str>) -> Self {
        match value {
            Some(value) => Literal::Text(escape(value)),
            None => Literal::Null,
        }
    }

    /// Quoted text where an empty string counts as absent.
    pub fn non_empty_text(value: Option<&str>) -> Self {
        Self::text(value.filter(|value| !value.is_empty()))
    }

    /// Any displayable value rendered as quoted text.
    pub fn quoted<T: fmt::Display>(value: Option<T>) -> Self {
        match value {
            Some(value) => Literal::Text(escape(&value.to_string())),
            None => Literal::Null,
        }
    }

    /// An integer rendered without quotes.
    pub fn bare(value: Option<i64>) -> Self {
        value.map_or(Literal::Null, Literal::Integer)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    /// The value bound for this literal in a parameterized insert.
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Null => Value::from(None::<String>),
            Literal::Text(text) => Value::from(text.clone()),
            Literal::Integer(number) => Value::from(*number),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str(NULL_MARKER),
            Literal::Text(text) => write!(f, "'{text}'"),
            Literal::Integer(number) => write!(f, "{number}"),
        }
    }
}

/// Replaces every single quote with a double quote.
///
/// Lossy; warehouse text has always been stored with this substitution.
pub fn escape(value: &str) -> String {
    value.replace('\'', "\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendering() {
        assert_eq!(Literal::text(Some("C1")).to_string(), "'C1'");
        assert_eq!(Literal::text(None).to_string(), "null");
        assert_eq!(Literal::bare(Some(2019)).to_string(), "2019");
        assert_eq!(Literal::bare(None).to_string(), "null");
        assert_eq!(Literal::quoted(Some(1.5)).to_string(), "'1.5'");
        assert_eq!(Literal::quoted(Some(false)).to_string(), "'false'");
    }

    #[test]
    fn test_quote_substitution_preserves_count() {
        for input in ["it's fine", "''", "O'Neil's 'loom'", "no quotes"] {
            let rendered = Literal::text(Some(input)).to_string();
            let inner = &rendered[1..rendered.len() - 1];

            assert!(!inner.contains('\''), "{rendered}");
            assert_eq!(
                inner.matches('"').count(),
                input.matches('\'').count(),
                "{rendered}"
            );
        }
    }

    #[test]
    fn test_empty_text_is_absent_only_when_asked() {
        assert_eq!(Literal::text(Some("")), Literal::Text(String::new()));
        assert!(Literal::non_empty_text(Some("")).is_null());
        assert!(Literal::non_empty_text(None).is_null());
    }

    #[test]
    fn test_bound_values() {
        assert_eq!(Literal::Null.to_value(), Value::from(None::<String>));
        assert_eq!(
            Literal::text(Some("it's")).to_value(),
            Value::from("it\"s".to_string())
        );
        assert_eq!(Literal::bare(Some(2019)).to_value(), Value::BigInt(Some(2019)));
    }
}
