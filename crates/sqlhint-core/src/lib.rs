//! sqlhint-core: SQL static analysis library
//!
//! Checks SQL text for syntax errors and, given a schema snapshot, for
//! unknown tables and columns, value/column type mismatches, INSERT arity
//! mismatches and filters on unindexed columns. No database connection is
//! needed.
//!
//! ```
//! use sqlhint_core::{Analyzer, Column, DiagnosticCode, Schema, Table};
//!
//! let schema = Schema::new("app").with_table(
//!     Table::new("users").with_column(Column::new("name", "varchar(100)")),
//! );
//! let diagnostics = Analyzer::with_schema(schema)
//!     .analyze("SELECT * FROM users WHERE name = 'x'")
//!     .unwrap();
//! assert_eq!(diagnostics[0].code, DiagnosticCode::MissingIndex);
//! ```

pub mod analyzer;
pub mod config;
pub mod dialect;
pub mod error;
pub mod parser;
pub mod schema;
pub mod types;

pub use analyzer::Analyzer;
pub use config::{AnalyzerOptions, ParserOptions};
pub use dialect::SqlDialect;
pub use error::{Diagnostic, DiagnosticCode, Error, Result, Severity, Span};
pub use schema::{Column, Schema, SchemaBuilder, Table};
pub use types::{ColumnType, ValueType};
