//! SQL type system
//!
//! Columns carry a declared semantic type derived from their storage type;
//! literals carry a type inferred from their lexical form.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type a schema column is declared to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Number,
    Boolean,
    Date,
}

impl ColumnType {
    /// Map a storage type name (`varchar(100)`, `INT UNSIGNED`, `json`, ...)
    /// to its semantic type. Unknown storage types are treated as strings.
    pub fn from_storage_type(storage_type: &str) -> Self {
        match base_type_name(storage_type).as_str() {
            "int" | "integer" | "tinyint" | "smallint" | "mediumint" | "bigint" | "int2"
            | "int4" | "int8" | "decimal" | "dec" | "numeric" | "fixed" | "float" | "float4"
            | "float8" | "double" | "real" | "bit" | "year" | "serial" | "bigserial"
            | "smallserial" => ColumnType::Number,
            "bool" | "boolean" => ColumnType::Boolean,
            "date" | "datetime" | "timestamp" | "timestamptz" | "time" | "timetz" => {
                ColumnType::Date
            }
            _ => ColumnType::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Number => "number",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primitive type inferred for a literal value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Date,
    Null,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Date => "date",
            ValueType::Null => "null",
        }
    }

    /// Whether this is the same primitive as `declared`
    pub fn matches(&self, declared: ColumnType) -> bool {
        matches!(
            (self, declared),
            (ValueType::String, ColumnType::String)
                | (ValueType::Number, ColumnType::Number)
                | (ValueType::Boolean, ColumnType::Boolean)
                | (ValueType::Date, ColumnType::Date)
        )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a storage type is JSON (MySQL cannot index these directly)
pub fn is_json_storage(storage_type: &str) -> bool {
    matches!(base_type_name(storage_type).as_str(), "json" | "jsonb")
}

/// Whether `text` denotes a real calendar date or date/time.
pub fn parses_as_datetime(text: &str) -> bool {
    let text = text.trim();
    if DateTime::parse_from_rfc3339(text).is_ok() || DateTime::parse_from_rfc2822(text).is_ok() {
        return true;
    }

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%Y/%m/%d %H:%M:%S",
    ];
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

    DATETIME_FORMATS
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(text, fmt).is_ok())
        || DATE_FORMATS
            .iter()
            .any(|fmt| NaiveDate::parse_from_str(text, fmt).is_ok())
}

/// Lowercased leading word of a type name: `VARCHAR(100)` -> `varchar`
fn base_type_name(storage_type: &str) -> String {
    storage_type
        .trim()
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or_default()
        .to_lowercase()
}
