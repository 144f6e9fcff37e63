//! SQL analyzer module
//!
//! [`Analyzer::analyze`] splits the input into statements and, for each one,
//! reports syntax errors, INSERT arity mismatches and, when a schema is
//! available, unknown tables and columns, type mismatches and missing indexes.

mod autocorrect;
mod checks;
mod lookup;

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::config::AnalyzerOptions;
use crate::error::{Diagnostic, DiagnosticCode, Result, Span};
use crate::parser::{
    Clause, ParseResult, QueryKind, References, SqlFrontend, SqlSplitter, Statement,
    StatementParser, StatementSplitter,
};
use crate::schema::{Schema, Table};

pub use autocorrect::correct;
pub use checks::{is_invalid_assignment, is_missing_index};
pub use lookup::{resolve_column, resolve_table};

/// SQL Analyzer - checks statements against an optional schema
pub struct Analyzer<P = SqlFrontend, S = SqlSplitter> {
    parser: P,
    splitter: S,
    schema: Option<Schema>,
}

impl Analyzer {
    pub fn new(options: AnalyzerOptions) -> Self {
        Self {
            parser: SqlFrontend::new(&options.parser),
            splitter: SqlSplitter::new(options.parser.dialect),
            schema: options.schema,
        }
    }

    /// Analyzer with default parser options checking against `schema`
    pub fn with_schema(schema: Schema) -> Self {
        Self::new(AnalyzerOptions::default().with_schema(schema))
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalyzerOptions::default())
    }
}

impl<P: StatementParser, S: StatementSplitter> Analyzer<P, S> {
    /// Analyzer over caller-supplied parser and splitter
    pub fn with_collaborators(parser: P, splitter: S, schema: Option<Schema>) -> Self {
        Self {
            parser,
            splitter,
            schema,
        }
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// Analyze `text` and return its diagnostics in statement order.
    ///
    /// Problems with the SQL itself are diagnostics; `Err` only carries a
    /// failure of the parser.
    pub fn analyze(&self, text: &str) -> Result<Vec<Diagnostic>> {
        if text.is_empty() {
            return Ok(vec![Diagnostic::error(
                DiagnosticCode::EmptyQuery,
                "Query is empty.",
                Span::at(0),
            )]);
        }

        let mut diagnostics = Vec::new();
        for (index, statement) in self.splitter.split(text).into_iter().enumerate() {
            let result = self.parser.parse(statement.text)?;
            debug!(
                index,
                start = statement.span.start,
                stop = statement.span.stop,
                kind = ?result.query_kind,
                ddl = result.is_ddl,
                "analyzing statement"
            );

            check_syntax(&statement, &result, &mut diagnostics);
            if result.is_ddl {
                continue;
            }
            self.check_semantics(&statement, &result, &mut diagnostics);
        }

        Ok(diagnostics)
    }

    fn check_semantics(
        &self,
        statement: &Statement<'_>,
        result: &ParseResult,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let refs = &result.references;

        if result.query_kind == QueryKind::Insert && has_row_mismatch(refs) {
            diagnostics.push(Diagnostic::warning(
                DiagnosticCode::ColumnRowMismatch,
                "Column count does not match value count.",
                statement.span,
            ));
        }

        let Some(schema) = &self.schema else {
            debug!("no schema, skipping reference checks");
            return;
        };

        let base = statement.span.start;
        let mut tables: Vec<_> = refs.tables().collect();
        tables.sort_by_key(|(_, table)| table.span.start);

        for (table_id, table_ref) in tables {
            trace!(table = %table_ref.name, "resolving table");
            let Some(table) = resolve_table(&table_ref.name, schema, refs) else {
                let message = with_correction(
                    format!(
                        "Table '{}' does not exist in database '{}'.",
                        table_ref.name, schema.name
                    ),
                    correct(&table_ref.name.to_lowercase(), schema.table_names()),
                );
                diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::MissingTable,
                    message,
                    table_ref.span.shift(base),
                ));
                continue;
            };

            let mut columns: Vec<_> = refs
                .columns()
                .filter(|(_, column)| column.table == Some(table_id))
                .collect();
            columns.sort_by_key(|(_, column)| column.span.start);

            for (column_id, column_ref) in columns {
                trace!(column = %column_ref.name, table = %table.name, "resolving column");
                let Some(column) = resolve_column(&column_ref.name, table, refs) else {
                    diagnostics.push(missing_column(&column_ref.name, column_ref.span.shift(base), table));
                    continue;
                };

                let mut missing_index = false;
                for (_, value) in refs.values().filter(|(_, v)| v.column == Some(column_id)) {
                    if is_invalid_assignment(column, value) {
                        let inferred = value
                            .value_type
                            .map_or("unknown", |value_type| value_type.as_str());
                        diagnostics.push(Diagnostic::warning(
                            DiagnosticCode::TypeMismatch,
                            format!(
                                "Type {} is not assignable to type {}.",
                                inferred, column.declared_type
                            ),
                            value.span.shift(base),
                        ));
                    }
                    missing_index |= is_missing_index(column, value);
                }

                if missing_index {
                    diagnostics.push(Diagnostic::suggestion(
                        DiagnosticCode::MissingIndex,
                        format!(
                            "You can optimize this query by adding a MySQL index for column '{}'.",
                            column.name
                        ),
                        column_ref.span.shift(base),
                    ));
                }
            }
        }
    }
}

fn check_syntax(statement: &Statement<'_>, result: &ParseResult, diagnostics: &mut Vec<Diagnostic>) {
    if let Some(error) = &result.lexer_error {
        diagnostics.push(Diagnostic::error(
            DiagnosticCode::LexerError,
            error.message.clone(),
            statement.span,
        ));
    }

    if let Some(error) = &result.parser_error {
        let base = statement.span.start;
        let span = error
            .offending_token
            .map_or(Span::at(base), |token| token.shift(base));
        diagnostics.push(Diagnostic::error(
            DiagnosticCode::ParserError,
            error.message.clone(),
            span,
        ));
    }
}

/// Whether any VALUES row has a different length than the field list.
/// A missing field list counts as zero fields.
fn has_row_mismatch(refs: &References) -> bool {
    let fields = refs
        .columns()
        .filter(|(_, column)| column.clause == Clause::Fields)
        .count();

    let mut rows: BTreeMap<usize, usize> = BTreeMap::new();
    for (_, value) in refs.values() {
        if let Clause::Values { row } = value.clause {
            *rows.entry(row).or_default() += 1;
        }
    }
    rows.values().any(|&count| count != fields)
}

fn missing_column(name: &str, span: Span, table: &Table) -> Diagnostic {
    let message = with_correction(
        format!("Column '{}' does not exist in table '{}'.", name, table.name),
        correct(&name.to_lowercase(), table.column_names()),
    );
    Diagnostic::warning(DiagnosticCode::MissingColumn, message, span)
}

fn with_correction(mut message: String, correction: Option<&str>) -> String {
    if let Some(correction) = correction {
        message.push_str(&format!(" Did you mean '{}'?", correction));
    }
    message
}
