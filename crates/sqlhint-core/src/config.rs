//! Analyzer configuration

use serde::{Deserialize, Serialize};

use crate::dialect::SqlDialect;
use crate::error::Result;
use crate::schema::Schema;

/// Options handed through to the statement parser and splitter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserOptions {
    /// SQL dialect ("mysql" or "postgresql")
    #[serde(default)]
    pub dialect: SqlDialect,
}

/// Configuration for [`Analyzer`](crate::Analyzer)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerOptions {
    #[serde(default)]
    pub parser: ParserOptions,

    /// Schema to check references against. Without one only syntax and
    /// INSERT arity are checked.
    #[serde(default)]
    pub schema: Option<Schema>,
}

impl AnalyzerOptions {
    /// Load options from TOML:
    ///
    /// ```toml
    /// [parser]
    /// dialect = "postgresql"
    /// ```
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_dialect(mut self, dialect: SqlDialect) -> Self {
        self.parser.dialect = dialect;
        self
    }
}
