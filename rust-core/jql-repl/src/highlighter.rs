// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//!
//! JQL syntax highlighting for the interactive REPL.
//!
//! Implements `rustyline::highlight::Highlighter` to colour clause keywords,
//! operators, known field names and quoted values as the user types.

use std::borrow::Cow;
use std::collections::HashSet;

use colored::Colorize;
use jql_assist::detect::{is_logical_word, is_operator_word};
use jql_assist::Catalog;
use rustyline::highlight::Highlighter;

/// Keywords outside the operator vocabulary.
const CLAUSE_KEYWORDS: &[&str] = &["ORDER", "BY", "ASC", "DESC", "EMPTY", "NULL", "CHANGED"];

/// Syntax highlighter for JQL input lines.
pub struct JqlHighlighter {
    fields: HashSet<String>,
}

impl JqlHighlighter {
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            fields: catalog.fields.iter().map(|f| f.id.to_lowercase()).collect(),
        }
    }
}

impl Highlighter for JqlHighlighter {
    /// Highlighting is token-based:
    /// 1. Quoted values are yellow.
    /// 2. `AND`/`OR` and clause keywords are blue and bold.
    /// 3. Operator words and symbols are cyan.
    /// 4. Catalog field names are green.
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Owned(self.highlight_line(line))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: rustyline::highlight::CmdKind) -> bool {
        true
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        Cow::Borrowed(prompt)
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(hint.dimmed().to_string())
    }

    fn highlight_candidate<'c>(
        &self,
        candidate: &'c str,
        _completion: rustyline::CompletionType,
    ) -> Cow<'c, str> {
        Cow::Borrowed(candidate)
    }
}

impl JqlHighlighter {
    fn highlight_line(&self, line: &str) -> String {
        if line.starts_with('\\') {
            return line.bright_magenta().to_string();
        }

        let mut result = String::with_capacity(line.len() * 2);
        let chars: Vec<char> = line.chars().collect();
        let len = chars.len();
        let mut i = 0;

        while i < len {
            let ch = chars[i];

            if ch == '"' {
                let start = i;
                i += 1;
                while i < len && chars[i] != '"' {
                    i += 1;
                }
                if i < len {
                    i += 1;
                }
                let quoted: String = chars[start..i].iter().collect();
                result.push_str(&quoted.yellow().to_string());
                continue;
            }

            if is_symbol(ch) {
                let start = i;
                while i < len && is_symbol(chars[i]) {
                    i += 1;
                }
                let op: String = chars[start..i].iter().collect();
                result.push_str(&op.cyan().to_string());
                continue;
            }

            if ch.is_whitespace() || ch == '(' || ch == ')' || ch == ',' {
                result.push(ch);
                i += 1;
                continue;
            }

            let start = i;
            while i < len && !is_boundary(chars[i]) {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            result.push_str(&self.colour_word(&word));
        }

        result
    }

    fn colour_word(&self, word: &str) -> String {
        let upper = word.to_uppercase();
        if is_logical_word(word) || CLAUSE_KEYWORDS.contains(&upper.as_str()) {
            word.blue().bold().to_string()
        } else if is_operator_word(word) {
            word.cyan().to_string()
        } else if self.fields.contains(&word.to_lowercase()) {
            word.green().to_string()
        } else {
            word.to_string()
        }
    }
}

fn is_symbol(ch: char) -> bool {
    matches!(ch, '=' | '!' | '~' | '<' | '>')
}

fn is_boundary(ch: char) -> bool {
    ch.is_whitespace() || is_symbol(ch) || matches!(ch, '"' | '(' | ')' | ',')
}
