//! Error and diagnostic types

use miette::SourceSpan;
use serde::{Deserialize, Serialize};

/// Source location span, in characters of the analyzed text.
///
/// `start` is inclusive and `stop` is exclusive, so an empty input is `[0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub stop: usize,
}

impl Span {
    pub fn new(start: usize, stop: usize) -> Self {
        Self { start, stop }
    }

    /// Zero-width span at `offset`
    pub fn at(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.stop.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move a statement-relative span into the coordinates of the whole input
    pub fn shift(self, base: usize) -> Self {
        Self::new(self.start + base, self.stop + base)
    }

    /// Convert to a byte-based miette span over `source`.
    ///
    /// Offsets past the end of `source` clamp to its length.
    pub fn to_source_span(&self, source: &str) -> SourceSpan {
        let byte_at = |chars: usize| {
            source
                .char_indices()
                .nth(chars)
                .map(|(i, _)| i)
                .unwrap_or(source.len())
        };
        let start = byte_at(self.start);
        let stop = byte_at(self.stop).max(start);
        SourceSpan::new(start.into(), stop - start)
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Severity {
    Error = 1,
    Warning = 2,
    Suggestion = 3,
}

impl Severity {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Stable diagnostic codes.
///
/// The numeric values are part of the public contract; consumers match on
/// them instead of message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum DiagnosticCode {
    /// 1000: Input text is empty
    EmptyQuery = 1000,
    /// 1001: Tokenizer rejected the statement
    LexerError = 1001,
    /// 1002: Grammar rejected the statement
    ParserError = 1002,
    /// 1003: Table not found in schema
    MissingTable = 1003,
    /// 1004: Column not found in table
    MissingColumn = 1004,
    /// 1005: Value type not assignable to column type
    TypeMismatch = 1005,
    /// 1006: Filtered column has no index
    MissingIndex = 1006,
    /// 1007: INSERT field and value counts differ
    ColumnRowMismatch = 1007,
}

impl DiagnosticCode {
    pub const ALL: [DiagnosticCode; 8] = [
        DiagnosticCode::EmptyQuery,
        DiagnosticCode::LexerError,
        DiagnosticCode::ParserError,
        DiagnosticCode::MissingTable,
        DiagnosticCode::MissingColumn,
        DiagnosticCode::TypeMismatch,
        DiagnosticCode::MissingIndex,
        DiagnosticCode::ColumnRowMismatch,
    ];

    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticCode::EmptyQuery => "empty-query",
            DiagnosticCode::LexerError => "lexer-error",
            DiagnosticCode::ParserError => "parser-error",
            DiagnosticCode::MissingTable => "missing-table",
            DiagnosticCode::MissingColumn => "missing-column",
            DiagnosticCode::TypeMismatch => "type-mismatch",
            DiagnosticCode::MissingIndex => "missing-index",
            DiagnosticCode::ColumnRowMismatch => "column-row-mismatch",
        }
    }
}

impl TryFrom<u16> for DiagnosticCode {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        DiagnosticCode::ALL
            .into_iter()
            .find(|code| code.as_u16() == value)
            .ok_or(value)
    }
}

/// A single finding produced by analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn error(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            severity: Severity::Error,
            message: message.into(),
            span,
        }
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            severity: Severity::Warning,
            message: message.into(),
            span,
        }
    }

    pub fn suggestion(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            severity: Severity::Suggestion,
            message: message.into(),
            span,
        }
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn stop(&self) -> usize {
        self.span.stop
    }
}

/// Failures that originate outside the diagnostic pipeline: the parser
/// collaborator, schema loading and options loading.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("parser failure: {message}")]
    Parser { message: String },

    #[error("invalid schema: {message}")]
    Schema { message: String },

    #[error("invalid analyzer options: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid schema json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
