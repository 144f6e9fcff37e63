//! Statement splitting and parsing
//!
//! The analyzer consumes statements and parse results through the
//! [`StatementSplitter`] and [`StatementParser`] traits. [`SqlSplitter`] and
//! [`SqlFrontend`] are the default implementations, built on `sqlparser`.

mod collector;
mod frontend;
mod location;
mod references;
mod splitter;

use crate::error::{Result, Span};

pub use frontend::SqlFrontend;
pub use references::{
    AliasReference, Clause, ColumnReference, RefId, Reference, References, TableReference,
    ValueReference,
};
pub use splitter::SqlSplitter;

/// One statement of the input text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statement<'a> {
    pub text: &'a str,
    /// Position of `text` within the whole input
    pub span: Span,
}

/// Tokenizer failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerError {
    pub message: String,
}

/// Grammar failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserError {
    pub message: String,
    /// Statement-relative span of the token the parser stopped at
    pub offending_token: Option<Span>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryKind {
    Select,
    Insert,
    Update,
    Delete,
    #[default]
    Other,
}

/// Everything the analyzer needs to know about one parsed statement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    pub lexer_error: Option<LexerError>,
    pub parser_error: Option<ParserError>,
    pub references: References,
    pub query_kind: QueryKind,
    pub is_ddl: bool,
}

impl ParseResult {
    pub fn lexer_failure(message: impl Into<String>) -> Self {
        Self {
            lexer_error: Some(LexerError {
                message: message.into(),
            }),
            ..Self::default()
        }
    }

    pub fn parser_failure(message: impl Into<String>, offending_token: Option<Span>) -> Self {
        Self {
            parser_error: Some(ParserError {
                message: message.into(),
                offending_token,
            }),
            ..Self::default()
        }
    }
}

/// Splits input text into statements, in source order
pub trait StatementSplitter {
    fn split<'a>(&self, text: &'a str) -> Vec<Statement<'a>>;
}

/// Parses the text of a single statement.
///
/// Syntax problems are reported inside the [`ParseResult`]; an `Err` means
/// the parser itself failed and analysis cannot continue.
pub trait StatementParser {
    fn parse(&self, text: &str) -> Result<ParseResult>;
}
