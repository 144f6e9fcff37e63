//! Statement splitter

use crate::dialect::SqlDialect;
use crate::error::Span;

use super::{Statement, StatementSplitter};

/// Splits SQL text into statements on `;`, respecting quoted strings,
/// quoted identifiers and comments.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlSplitter {
    dialect: SqlDialect,
}

impl SqlSplitter {
    pub fn new(dialect: SqlDialect) -> Self {
        Self { dialect }
    }
}

impl StatementSplitter for SqlSplitter {
    fn split<'a>(&self, text: &'a str) -> Vec<Statement<'a>> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let len = chars.len();
        let mut statements = Vec::new();
        let mut start = 0;
        let mut i = 0;

        while i < len {
            match chars[i].1 {
                quote @ ('\'' | '"' | '`') => {
                    i = skip_quoted(&chars, i, quote);
                }
                '-' if next_is(&chars, i, '-') => {
                    i = skip_line_comment(&chars, i);
                }
                '#' if self.dialect == SqlDialect::MySQL => {
                    i = skip_line_comment(&chars, i);
                }
                '/' if next_is(&chars, i, '*') => {
                    i = skip_block_comment(&chars, i);
                }
                '$' if self.dialect == SqlDialect::PostgreSQL => {
                    i = skip_dollar_quoted(&chars, i);
                }
                ';' => {
                    push_trimmed(text, &chars, start, i, &mut statements);
                    start = i + 1;
                    i += 1;
                }
                _ => {
                    i += 1;
                }
            }
        }

        // Last statement (without trailing semicolon)
        push_trimmed(text, &chars, start, len, &mut statements);

        statements
    }
}

fn next_is(chars: &[(usize, char)], i: usize, expected: char) -> bool {
    chars.get(i + 1).is_some_and(|(_, c)| *c == expected)
}

/// Returns the index just past the closing quote, or the end of input if unterminated
fn skip_quoted(chars: &[(usize, char)], open: usize, quote: char) -> usize {
    let mut i = open + 1;
    while i < chars.len() {
        let c = chars[i].1;
        if c == '\\' && quote != '`' {
            i += 2;
        } else if c == quote {
            if next_is(chars, i, quote) {
                i += 2; // doubled quote
            } else {
                return i + 1;
            }
        } else {
            i += 1;
        }
    }
    chars.len()
}

fn skip_line_comment(chars: &[(usize, char)], start: usize) -> usize {
    let mut i = start;
    while i < chars.len() && chars[i].1 != '\n' {
        i += 1;
    }
    i
}

fn skip_block_comment(chars: &[(usize, char)], start: usize) -> usize {
    let mut i = start + 2;
    while i + 1 < chars.len() {
        if chars[i].1 == '*' && chars[i + 1].1 == '/' {
            return i + 2;
        }
        i += 1;
    }
    chars.len()
}

/// `$$ ... $$` or `$tag$ ... $tag$`
fn skip_dollar_quoted(chars: &[(usize, char)], start: usize) -> usize {
    let mut i = start + 1;
    while i < chars.len() && (chars[i].1.is_ascii_alphanumeric() || chars[i].1 == '_') {
        i += 1;
    }
    if i >= chars.len() || chars[i].1 != '$' {
        return start + 1;
    }
    let tag: Vec<char> = chars[start..=i].iter().map(|(_, c)| *c).collect();
    let mut j = i + 1;
    while j + tag.len() <= chars.len() {
        if chars[j..j + tag.len()]
            .iter()
            .map(|(_, c)| *c)
            .eq(tag.iter().copied())
        {
            return j + tag.len();
        }
        j += 1;
    }
    chars.len()
}

/// Push `chars[start..end]` without surrounding whitespace, unless it is blank
fn push_trimmed<'a>(
    text: &'a str,
    chars: &[(usize, char)],
    start: usize,
    end: usize,
    statements: &mut Vec<Statement<'a>>,
) {
    let Some(first) = (start..end).find(|&i| !chars[i].1.is_whitespace()) else {
        return;
    };
    let last = (first..end)
        .rev()
        .find(|&i| !chars[i].1.is_whitespace())
        .unwrap_or(first);

    let (byte_start, _) = chars[first];
    let (last_byte, last_char) = chars[last];
    statements.push(Statement {
        text: &text[byte_start..last_byte + last_char.len_utf8()],
        span: Span::new(first, last + 1),
    });
}
