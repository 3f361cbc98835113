// SPDX-License-Identifier: PMPL-1.0-or-later
//! Grammar parser contract.
//!
//! The editor only ever calls a [`QueryParser`] on an explicit parse
//! action, never per keystroke. [`PositionalParser`] is a lightweight
//! reference implementation that classifies tokens by clause position; a
//! full grammar parser plugs in behind the same trait.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::detect::{is_logical_word, tokenize, Token};
use crate::error::AssistError;

/// Operators spelled as two words.
const COMPOUND_OPERATORS: &[(&str, &str)] = &[("IS", "NOT"), ("NOT", "IN"), ("WAS", "NOT"), ("WAS", "IN")];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    Field,
    Operator,
    Value,
    LogicalOperator,
    OrderBy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedToken {
    pub kind: TokenKind,
    pub value: String,
    /// Byte offset of the token in the raw query.
    pub offset: usize,
}

/// Result of a successful parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryTree {
    pub raw: String,
    pub tokens: Vec<ParsedToken>,
    /// The `ORDER BY ...` tail, verbatim.
    pub order_by: Option<String>,
}

impl QueryTree {
    pub fn to_pretty_json(&self) -> Result<String, AssistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Field)
            .map(|t| t.value.as_str())
    }
}

/// Diagnostic returned when a query cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at byte {offset})")]
pub struct ParseFailure {
    pub message: String,
    pub offset: usize,
}

impl ParseFailure {
    fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

pub trait QueryParser: Send + Sync {
    fn parse(&self, query: &str) -> Result<QueryTree, ParseFailure>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Field,
    Operator,
    Value,
    Connective,
}

/// Classifies tokens as field, operator, value in repeating triples
/// separated by `AND`/`OR`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PositionalParser;

impl PositionalParser {
    pub fn new() -> Self {
        Self
    }
}

impl QueryParser for PositionalParser {
    fn parse(&self, query: &str) -> Result<QueryTree, ParseFailure> {
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return Err(ParseFailure::new("query is empty", 0));
        }
        if let Some(open) = tokens.iter().find(|t| t.unterminated) {
            return Err(ParseFailure::new("unterminated quoted value", open.start));
        }

        let mut parsed = Vec::with_capacity(tokens.len());
        let mut order_by = None;
        let mut expect = Expect::Field;
        let mut i = 0;

        while i < tokens.len() {
            let token = tokens[i];

            if token.text.eq_ignore_ascii_case("ORDER")
                && tokens.get(i + 1).is_some_and(|t| t.text.eq_ignore_ascii_case("BY"))
            {
                let tail = query[token.start..].trim_end().to_string();
                parsed.push(ParsedToken {
                    kind: TokenKind::OrderBy,
                    value: tail.clone(),
                    offset: token.start,
                });
                order_by = Some(tail);
                break;
            }

            if is_logical_word(token.text) {
                parsed.push(ParsedToken {
                    kind: TokenKind::LogicalOperator,
                    value: token.text.to_uppercase(),
                    offset: token.start,
                });
                expect = Expect::Field;
                i += 1;
                continue;
            }

            match expect {
                Expect::Field | Expect::Connective => {
                    parsed.push(ParsedToken {
                        kind: TokenKind::Field,
                        value: token.text.to_string(),
                        offset: token.start,
                    });
                    expect = Expect::Operator;
                    i += 1;
                }
                Expect::Operator => {
                    let compound = tokens.get(i + 1).filter(|next| {
                        COMPOUND_OPERATORS.iter().any(|(a, b)| {
                            token.text.eq_ignore_ascii_case(a) && next.text.eq_ignore_ascii_case(b)
                        })
                    });
                    let (value, consumed) = match compound {
                        Some(next) => (format!("{} {}", token.text, next.text).to_uppercase(), 2),
                        None => (token.text.to_string(), 1),
                    };
                    parsed.push(ParsedToken {
                        kind: TokenKind::Operator,
                        value,
                        offset: token.start,
                    });
                    expect = Expect::Value;
                    i += consumed;
                }
                Expect::Value => {
                    let (value, consumed) = value_at(query, &tokens[i..])?;
                    parsed.push(ParsedToken {
                        kind: TokenKind::Value,
                        value,
                        offset: token.start,
                    });
                    expect = Expect::Connective;
                    i += consumed;
                }
            }
        }

        debug!(tokens = parsed.len(), has_order_by = order_by.is_some(), "Parsed query");
        Ok(QueryTree {
            raw: query.to_string(),
            tokens: parsed,
            order_by,
        })
    }
}

/// Read one value starting at `tokens[0]`: a parenthesised list (kept
/// verbatim) or a single token with surrounding quotes removed.
fn value_at(query: &str, tokens: &[Token<'_>]) -> Result<(String, usize), ParseFailure> {
    let first = tokens[0];
    if first.text.starts_with('(') {
        let close = tokens
            .iter()
            .position(|t| t.text.ends_with(')'))
            .ok_or_else(|| ParseFailure::new("unclosed value list", first.start))?;
        let list = &query[first.start..tokens[close].end()];
        return Ok((list.to_string(), close + 1));
    }

    let text = first.text;
    let unquoted = if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        &text[1..text.len() - 1]
    } else {
        text
    };
    Ok((unquoted.to_string(), 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tree: &QueryTree) -> Vec<TokenKind> {
        tree.tokens.iter().map(|t| t.kind).collect()
    }

    fn values(tree: &QueryTree) -> Vec<&str> {
        tree.tokens.iter().map(|t| t.value.as_str()).collect()
    }

    #[test]
    fn test_simple_clause() {
        let tree = PositionalParser.parse("project = PROJECTA").unwrap();
        assert_eq!(
            kinds(&tree),
            [TokenKind::Field, TokenKind::Operator, TokenKind::Value]
        );
        assert_eq!(tree.raw, "project = PROJECTA");
    }

    #[test]
    fn test_logical_operators_between_clauses() {
        let tree = PositionalParser
            .parse("status = Open and priority != Low")
            .unwrap();
        assert_eq!(
            values(&tree),
            ["status", "=", "Open", "AND", "priority", "!=", "Low"]
        );
        assert_eq!(tree.tokens[3].kind, TokenKind::LogicalOperator);
        assert_eq!(tree.fields().collect::<Vec<_>>(), ["status", "priority"]);
    }

    #[test]
    fn test_quoted_value_is_one_token_without_quotes() {
        let tree = PositionalParser
            .parse("status = \"In Progress\" OR project = PROJECTB")
            .unwrap();
        assert_eq!(tree.tokens[2].value, "In Progress");
        assert_eq!(tree.tokens[2].offset, 9);
        assert_eq!(tree.tokens[3].kind, TokenKind::LogicalOperator);
    }

    #[test]
    fn test_compound_operators_stay_together() {
        let tree = PositionalParser
            .parse("assignee is not EMPTY AND status NOT IN (Open, Done)")
            .unwrap();
        assert_eq!(
            values(&tree),
            ["assignee", "IS NOT", "EMPTY", "AND", "status", "NOT IN", "(Open, Done)"]
        );
    }

    #[test]
    fn test_order_by_tail_captured() {
        let tree = PositionalParser
            .parse("project = PROJECTA ORDER BY created DESC  ")
            .unwrap();
        assert_eq!(tree.order_by.as_deref(), Some("ORDER BY created DESC"));
        assert_eq!(tree.tokens.last().map(|t| t.kind), Some(TokenKind::OrderBy));
        assert_eq!(tree.tokens.len(), 4);
    }

    #[test]
    fn test_order_by_only() {
        let tree = PositionalParser.parse("order by priority").unwrap();
        assert_eq!(kinds(&tree), [TokenKind::OrderBy]);
    }

    #[test]
    fn test_empty_query_fails() {
        let err = PositionalParser.parse("   ").unwrap_err();
        assert_eq!(err.message, "query is empty");
    }

    #[test]
    fn test_unterminated_quote_fails_at_quote() {
        let err = PositionalParser.parse("status = \"In Pro").unwrap_err();
        assert_eq!(err.offset, 9);
        assert_eq!(err.to_string(), "unterminated quoted value (at byte 9)");
    }

    #[test]
    fn test_unclosed_list_fails() {
        let err = PositionalParser.parse("status IN (Open, Done").unwrap_err();
        assert_eq!(err.message, "unclosed value list");
    }

    #[test]
    fn test_tree_serialises_with_upper_case_kinds() {
        let tree = PositionalParser.parse("summary ~ login").unwrap();
        let json = tree.to_pretty_json().unwrap();
        assert!(json.contains("\"FIELD\""));
        assert!(json.contains("\"order_by\": null"));
    }
}
