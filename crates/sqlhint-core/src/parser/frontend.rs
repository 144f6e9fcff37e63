//! sqlparser-backed statement parser

use sqlparser::ast::Statement as AstStatement;
use sqlparser::parser::{Parser, ParserError as SqlParserError};
use sqlparser::tokenizer::Tokenizer;
use tracing::{debug, trace};

use crate::config::ParserOptions;
use crate::dialect::SqlDialect;
use crate::error::{Error, Result, Span};

use super::collector::ReferenceCollector;
use super::location::{LineIndex, LiteralLocator};
use super::{ParseResult, QueryKind, StatementParser};

/// Parses statements with `sqlparser` and collects their references
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlFrontend {
    dialect: SqlDialect,
}

impl SqlFrontend {
    pub fn new(options: &ParserOptions) -> Self {
        Self {
            dialect: options.dialect,
        }
    }

    pub fn with_dialect(dialect: SqlDialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }
}

impl StatementParser for SqlFrontend {
    fn parse(&self, text: &str) -> Result<ParseResult> {
        let dialect = self.dialect.parser_dialect();

        let tokens = match Tokenizer::new(dialect.as_ref(), text).tokenize_with_location() {
            Ok(tokens) => tokens,
            Err(e) => {
                trace!(message = %e.message, "tokenizer rejected statement");
                return Ok(ParseResult::lexer_failure(e.message));
            }
        };
        let lines = LineIndex::new(text);

        let statements = match Parser::parse_sql(dialect.as_ref(), text) {
            Ok(statements) => statements,
            Err(SqlParserError::ParserError(message)) => {
                let (message, location) = split_location(&message);
                let offending_token = location
                    .and_then(|(line, column)| {
                        tokens
                            .iter()
                            .find(|t| t.span.start.line == line && t.span.start.column == column)
                            .and_then(|t| lines.span(&t.span))
                    })
                    .or_else(|| {
                        // EOF carries no location; point past the last character
                        message
                            .ends_with("found: EOF")
                            .then(|| Span::at(text.chars().count()))
                    });
                if offending_token.is_none() {
                    debug!(%message, "parser error has no locatable token");
                }
                return Ok(ParseResult::parser_failure(message, offending_token));
            }
            Err(SqlParserError::TokenizerError(message)) => {
                return Ok(ParseResult::lexer_failure(message));
            }
            Err(SqlParserError::RecursionLimitExceeded) => {
                return Err(Error::Parser {
                    message: "recursion limit exceeded".to_string(),
                });
            }
        };

        let literals = LiteralLocator::new(tokens.iter().map(|t| (&t.token, &t.span)), &lines);
        let mut collector = ReferenceCollector::new(&lines, literals);
        for statement in &statements {
            collector.collect(statement);
        }

        Ok(ParseResult {
            lexer_error: None,
            parser_error: None,
            references: collector.finish(),
            query_kind: statements.first().map(query_kind).unwrap_or_default(),
            is_ddl: statements.iter().any(is_ddl),
        })
    }
}

fn query_kind(statement: &AstStatement) -> QueryKind {
    match statement {
        AstStatement::Query(_) => QueryKind::Select,
        AstStatement::Insert(_) => QueryKind::Insert,
        AstStatement::Update { .. } => QueryKind::Update,
        AstStatement::Delete(_) => QueryKind::Delete,
        _ => QueryKind::Other,
    }
}

fn is_ddl(statement: &AstStatement) -> bool {
    matches!(
        statement,
        AstStatement::CreateTable { .. }
            | AstStatement::CreateIndex { .. }
            | AstStatement::CreateView { .. }
            | AstStatement::CreateSchema { .. }
            | AstStatement::CreateDatabase { .. }
            | AstStatement::AlterTable { .. }
            | AstStatement::AlterIndex { .. }
            | AstStatement::AlterView { .. }
            | AstStatement::Drop { .. }
            | AstStatement::Truncate { .. }
    )
}

/// Split sqlparser's `"... at Line: 1, Column: 8"` suffix off an error message
fn split_location(message: &str) -> (&str, Option<(u64, u64)>) {
    let Some((head, tail)) = message.rsplit_once(" at Line: ") else {
        return (message, None);
    };
    let Some((line, column)) = tail.split_once(", Column: ") else {
        return (message, None);
    };
    match (line.trim().parse(), column.trim().parse()) {
        (Ok(line), Ok(column)) => (head, Some((line, column))),
        _ => (message, None),
    }
}
