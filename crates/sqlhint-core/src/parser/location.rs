//! Mapping sqlparser line/column locations to character offsets

use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Location, Token};

use crate::error::Span;

/// Character offset of every line start in a statement
pub(crate) struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, ch) in text.chars().enumerate() {
            if ch == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// Offset of a 1-indexed line/column pair; `None` for the empty location
    pub(crate) fn offset(&self, line: u64, column: u64) -> Option<usize> {
        if line == 0 || column == 0 {
            return None;
        }
        self.line_starts
            .get(line as usize - 1)
            .map(|start| start + column as usize - 1)
    }

    pub(crate) fn location(&self, location: &Location) -> Option<usize> {
        self.offset(location.line, location.column)
    }

    pub(crate) fn span(&self, span: &sqlparser::tokenizer::Span) -> Option<Span> {
        let start = self.location(&span.start)?;
        let stop = self.location(&span.end).unwrap_or(start).max(start);
        Some(Span::new(start, stop))
    }
}

/// Literal as it appears in the token stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Literal {
    Number(String),
    String(String),
    Boolean(bool),
    Null,
}

impl Literal {
    fn from_token(token: &Token) -> Option<Self> {
        match token {
            Token::Number(n, _) => Some(Literal::Number(n.clone())),
            Token::SingleQuotedString(s)
            | Token::DoubleQuotedString(s)
            | Token::NationalStringLiteral(s)
            | Token::EscapedStringLiteral(s) => Some(Literal::String(s.clone())),
            Token::Word(word) if word.quote_style.is_none() => match word.keyword {
                Keyword::TRUE => Some(Literal::Boolean(true)),
                Keyword::FALSE => Some(Literal::Boolean(false)),
                Keyword::NULL => Some(Literal::Null),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Hands out source spans for literals as the AST walk meets them.
///
/// The AST carries no spans for literal values, so each one is matched to
/// the first unclaimed token with the same text.
pub(crate) struct LiteralLocator {
    tokens: Vec<(Literal, Span)>,
    claimed: Vec<bool>,
}

impl LiteralLocator {
    pub(crate) fn new<'t>(
        tokens: impl IntoIterator<Item = (&'t Token, &'t sqlparser::tokenizer::Span)>,
        lines: &LineIndex,
    ) -> Self {
        let tokens: Vec<(Literal, Span)> = tokens
            .into_iter()
            .filter_map(|(token, span)| Some((Literal::from_token(token)?, lines.span(span)?)))
            .collect();
        let claimed = vec![false; tokens.len()];
        Self { tokens, claimed }
    }

    pub(crate) fn claim(&mut self, literal: &Literal) -> Option<Span> {
        self.claim_where(|candidate| candidate == literal)
    }

    /// Claim the next string literal, whatever its text
    pub(crate) fn claim_string(&mut self) -> Option<(String, Span)> {
        let mut text = None;
        let span = self.claim_where(|candidate| match candidate {
            Literal::String(s) => {
                text = Some(s.clone());
                true
            }
            _ => false,
        })?;
        Some((text?, span))
    }

    fn claim_where(&mut self, mut matches: impl FnMut(&Literal) -> bool) -> Option<Span> {
        let index = self
            .tokens
            .iter()
            .zip(&self.claimed)
            .position(|((literal, _), claimed)| !claimed && matches(literal))?;
        self.claimed[index] = true;
        Some(self.tokens[index].1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_offsets() {
        let lines = LineIndex::new("SELECT *\nFROM users\nWHERE id = 1");
        assert_eq!(lines.offset(1, 1), Some(0));
        assert_eq!(lines.offset(2, 6), Some(14));
        assert_eq!(lines.offset(3, 1), Some(20));
        assert_eq!(lines.offset(0, 0), None);
        assert_eq!(lines.offset(9, 1), None);
    }

    #[test]
    fn test_literals_claimed_in_order() {
        let mut locator = LiteralLocator {
            tokens: vec![
                (Literal::String("a".into()), Span::new(7, 10)),
                (Literal::Number("1".into()), Span::new(20, 21)),
                (Literal::String("a".into()), Span::new(30, 33)),
            ],
            claimed: vec![false; 3],
        };
        assert_eq!(locator.claim(&Literal::String("a".into())), Some(Span::new(7, 10)));
        assert_eq!(locator.claim(&Literal::String("a".into())), Some(Span::new(30, 33)));
        assert_eq!(locator.claim(&Literal::String("a".into())), None);
        assert_eq!(locator.claim_string(), None);
        assert_eq!(locator.claim(&Literal::Number("1".into())), Some(Span::new(20, 21)));
    }
}
