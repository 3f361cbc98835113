// SPDX-License-Identifier: PMPL-1.0-or-later
//! Context detection.
//!
//! Classifies the token under the caret as a field, operator or value and
//! finds the field that governs it. Detection is an ordered list of rules;
//! the first rule that matches wins:
//!
//! 1. **Empty prefix**: nothing but whitespace before the caret.
//! 2. **Operator pairing**: the right-most `field OPERATOR` pair of the
//!    current clause. Once an operator has been typed, everything after it
//!    is value, however many tokens the value spans.
//! 3. **Clause keyword**: the caret follows a completed `AND`/`OR`, or sits
//!    anywhere inside an `ORDER BY` clause.
//! 4. **Positional**: field/operator/value triplets counted from the start
//!    of the current clause.
//!
//! Tokens split on whitespace except inside double quotes, so
//! `"In Progress"` is one token. Carets are byte offsets; out-of-range
//! values clamp to the end of the text and round down to a char boundary.

use std::fmt;

use serde::Serialize;
use tracing::trace;

use crate::SuggestionKind;

/// Operator words recognised by the pairing rule (case-insensitive).
pub const OPERATOR_WORDS: &[&str] = &[
    "=", "!=", ">", ">=", "<", "<=", "~", "!~", "IN", "NOT", "IS", "CONTAINS", "WAS",
];

/// Logical connectives that start a new clause.
pub const LOGICAL_WORDS: &[&str] = &["AND", "OR"];

pub fn is_operator_word(token: &str) -> bool {
    OPERATOR_WORDS.iter().any(|op| op.eq_ignore_ascii_case(token))
}

pub fn is_logical_word(token: &str) -> bool {
    LOGICAL_WORDS.iter().any(|w| w.eq_ignore_ascii_case(token))
}

/// The detector's output.
///
/// `governing_field` is present exactly when the kind is operator or value;
/// the constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Context {
    kind: SuggestionKind,
    governing_field: Option<String>,
    partial: String,
}

impl Context {
    pub fn field(partial: impl Into<String>) -> Self {
        Self {
            kind: SuggestionKind::Field,
            governing_field: None,
            partial: partial.into(),
        }
    }

    pub fn operator(field: impl Into<String>, partial: impl Into<String>) -> Self {
        Self {
            kind: SuggestionKind::Operator,
            governing_field: Some(field.into()),
            partial: partial.into(),
        }
    }

    pub fn value(field: impl Into<String>, partial: impl Into<String>) -> Self {
        Self {
            kind: SuggestionKind::Value,
            governing_field: Some(field.into()),
            partial: partial.into(),
        }
    }

    pub fn kind(&self) -> SuggestionKind {
        self.kind
    }

    pub fn governing_field(&self) -> Option<&str> {
        self.governing_field.as_deref()
    }

    /// Text of the in-progress token typed so far. Empty when the caret
    /// starts a new term.
    pub fn partial(&self) -> &str {
        &self.partial
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.governing_field {
            Some(field) => write!(f, "{} for {}", self.kind, field)?,
            None => write!(f, "{}", self.kind)?,
        }
        if !self.partial.is_empty() {
            write!(f, " ({:?})", self.partial)?;
        }
        Ok(())
    }
}

/// Which detection rule produced a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionRule {
    EmptyPrefix,
    OperatorPairing,
    ClauseKeyword,
    Positional,
}

/// A token and its byte offset in the text it was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
    /// The token opened a double quote that was never closed.
    pub unterminated: bool,
}

impl Token<'_> {
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }
}

/// Split on whitespace, keeping double-quoted runs inside one token.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    let mut in_quote = false;

    for (i, ch) in text.char_indices() {
        match start {
            None => {
                if !ch.is_whitespace() {
                    start = Some(i);
                    in_quote = ch == '"';
                }
            }
            Some(s) => {
                if ch == '"' {
                    in_quote = !in_quote;
                } else if ch.is_whitespace() && !in_quote {
                    tokens.push(Token {
                        text: &text[s..i],
                        start: s,
                        unterminated: false,
                    });
                    start = None;
                }
            }
        }
    }

    if let Some(s) = start {
        tokens.push(Token {
            text: &text[s..],
            start: s,
            unterminated: in_quote,
        });
    }

    tokens
}

/// Clamp a caret to the text and round it down to a char boundary.
pub fn clamp_caret(text: &str, caret: usize) -> usize {
    let mut caret = caret.min(text.len());
    while !text.is_char_boundary(caret) {
        caret -= 1;
    }
    caret
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClauseOpener {
    Logical,
    OrderBy,
}

/// The text before the caret, tokenised and split into clauses.
#[derive(Debug)]
pub struct Prefix<'a> {
    before: &'a str,
    tokens: Vec<Token<'a>>,
    starting_new_term: bool,
    clause_start: usize,
    opener: Option<ClauseOpener>,
}

impl<'a> Prefix<'a> {
    pub fn new(text: &'a str, caret: usize) -> Self {
        let before = &text[..clamp_caret(text, caret)];
        let tokens = tokenize(before);
        let inside_quote = tokens.last().is_some_and(|t| t.unterminated);
        let starting_new_term =
            before.chars().next_back().is_some_and(char::is_whitespace) && !inside_quote;

        let completed = if starting_new_term {
            tokens.len()
        } else {
            tokens.len().saturating_sub(1)
        };

        let mut clause_start = 0;
        let mut opener = None;
        for i in 0..completed {
            let word = tokens[i].text;
            if is_logical_word(word) {
                clause_start = i + 1;
                opener = Some(ClauseOpener::Logical);
            } else if word.eq_ignore_ascii_case("BY")
                && i > 0
                && tokens[i - 1].text.eq_ignore_ascii_case("ORDER")
            {
                clause_start = i + 1;
                opener = Some(ClauseOpener::OrderBy);
            }
        }

        Self {
            before,
            tokens,
            starting_new_term,
            clause_start,
            opener,
        }
    }

    /// The token being typed, or `None` when the caret starts a new term.
    pub fn in_progress(&self) -> Option<&Token<'a>> {
        if self.starting_new_term {
            None
        } else {
            self.tokens.last()
        }
    }

    fn partial(&self) -> &'a str {
        self.in_progress().map_or("", |t| t.text)
    }

    fn clause(&self) -> &[Token<'a>] {
        &self.tokens[self.clause_start..]
    }

    fn completed_len(&self) -> usize {
        if self.starting_new_term {
            self.tokens.len()
        } else {
            self.tokens.len().saturating_sub(1)
        }
    }
}

type Rule = fn(&Prefix<'_>) -> Option<Context>;

/// Detection rules in priority order. Positional counting is the fallback
/// when none of them match.
const RULES: &[(DetectionRule, Rule)] = &[
    (DetectionRule::EmptyPrefix, empty_prefix),
    (DetectionRule::OperatorPairing, operator_pairing),
    (DetectionRule::ClauseKeyword, clause_keyword),
];

fn empty_prefix(prefix: &Prefix<'_>) -> Option<Context> {
    prefix.before.trim().is_empty().then(|| Context::field(""))
}

fn operator_pairing(prefix: &Prefix<'_>) -> Option<Context> {
    if prefix.opener == Some(ClauseOpener::OrderBy) {
        return None;
    }

    let clause = prefix.clause();
    // Right-most pair wins. The field side must not itself be an operator
    // word, so `IS NOT` and `NOT IN` bind to the field before them.
    let field_idx = (0..clause.len().saturating_sub(1))
        .rev()
        .find(|&i| is_operator_word(clause[i + 1].text) && !is_operator_word(clause[i].text))?;

    let field = clause[field_idx].text;
    let operator = clause[field_idx + 1];

    if field_idx + 2 < clause.len() {
        return Some(Context::value(field, prefix.partial()));
    }
    if prefix.starting_new_term {
        Some(Context::value(field, ""))
    } else {
        Some(Context::operator(field, operator.text))
    }
}

fn clause_keyword(prefix: &Prefix<'_>) -> Option<Context> {
    match prefix.opener {
        Some(ClauseOpener::OrderBy) => Some(Context::field(prefix.partial())),
        Some(ClauseOpener::Logical) if prefix.clause_start == prefix.completed_len() => {
            Some(Context::field(prefix.partial()))
        }
        _ => None,
    }
}

fn positional(prefix: &Prefix<'_>) -> Context {
    let clause = prefix.clause();
    // Position of the in-progress token within the clause.
    let position = if prefix.starting_new_term {
        clause.len()
    } else {
        clause.len().saturating_sub(1)
    };

    let partial = prefix.partial();
    match (position + 1) % 3 {
        1 => Context::field(partial),
        2 => Context::operator(clause[position - 1].text, partial),
        _ => Context::value(clause[position - 2].text, partial),
    }
}

/// Classify the caret position in `text`.
pub fn detect(text: &str, caret: usize) -> Context {
    detect_with_rule(text, caret).0
}

/// Classify the caret position and report which rule decided it.
pub fn detect_with_rule(text: &str, caret: usize) -> (Context, DetectionRule) {
    let prefix = Prefix::new(text, caret);

    let (context, rule) = RULES
        .iter()
        .find_map(|(rule, apply)| apply(&prefix).map(|context| (context, *rule)))
        .unwrap_or_else(|| (positional(&prefix), DetectionRule::Positional));

    trace!(
        caret,
        text_len = text.len(),
        rule = ?rule,
        kind = %context.kind(),
        "Detected context"
    );
    (context, rule)
}
