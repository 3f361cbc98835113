// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//!
//! Output formatters for parse trees, candidate lists and detected contexts.
//!
//! Supports two output modes:
//! - **Table**: Human-readable columnar output using `comfy-table`.
//! - **JSON**: Pretty-printed JSON of the library's serialisable types.

use comfy_table::{Cell, ContentArrangement, Table};
use jql_assist::detect::DetectionRule;
use jql_assist::parser::QueryTree;
use jql_assist::{Candidate, Context};
use serde::Serialize;
use serde_json::json;
use std::fmt;

/// Available output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown format '{other}'. Valid formats: table, json")),
        }
    }
}

/// Pretty-print any serialisable value with 2-space indentation.
fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unserialisable: {e}>"))
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header.iter().map(Cell::new));
    table
}

/// Render a successful parse: one row per classified token.
pub fn format_tree(tree: &QueryTree, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(tree),
        OutputFormat::Table => {
            let mut table = new_table(&["kind", "value", "offset"]);
            for token in &tree.tokens {
                let kind = serde_json::to_value(token.kind)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_else(|| format!("{:?}", token.kind));
                table.add_row(vec![
                    Cell::new(kind),
                    Cell::new(&token.value),
                    Cell::new(token.offset),
                ]);
            }
            table.to_string()
        }
    }
}

/// Render a candidate list under its heading.
pub fn format_candidates(heading: &str, candidates: &[Candidate], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(&json!({
            "heading": heading,
            "candidates": candidates,
        })),
        OutputFormat::Table => {
            if candidates.is_empty() {
                return format!("{heading}: (none)");
            }
            let mut table = new_table(&[heading, "description", "type"]);
            for c in candidates {
                table.add_row(vec![
                    Cell::new(&c.display_text),
                    Cell::new(c.description.as_deref().unwrap_or("")),
                    Cell::new(c.semantic_type.map(|t| t.to_string()).unwrap_or_default()),
                ]);
            }
            table.to_string()
        }
    }
}

/// Render a detected context and the rule that produced it.
pub fn format_context(context: &Context, rule: DetectionRule, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(&json!({
            "context": context,
            "rule": format!("{rule:?}"),
        })),
        OutputFormat::Table => {
            let mut table = new_table(&["kind", "governing field", "partial", "rule"]);
            table.add_row(vec![
                Cell::new(context.kind()),
                Cell::new(context.governing_field().unwrap_or("-")),
                Cell::new(format!("{:?}", context.partial())),
                Cell::new(format!("{rule:?}")),
            ]);
            table.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jql_assist::parser::{PositionalParser, QueryParser};
    use jql_assist::SemanticType;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("csv".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_tree_table_lists_tokens() {
        let tree = PositionalParser.parse("status = Open ORDER BY created").unwrap();
        let output = format_tree(&tree, OutputFormat::Table);
        assert!(output.contains("FIELD"));
        assert!(output.contains("ORDER_BY"));
        assert!(output.contains("ORDER BY created"));
    }

    #[test]
    fn test_tree_json_round_trips_raw() {
        let tree = PositionalParser.parse("status = Open").unwrap();
        let output = format_tree(&tree, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["raw"], "status = Open");
    }

    #[test]
    fn test_candidates_table() {
        let mut candidate = Candidate::plain("created").with_description("Created");
        candidate.semantic_type = Some(SemanticType::Date);
        let output = format_candidates("Fields", &[candidate], OutputFormat::Table);
        assert!(output.contains("Fields"));
        assert!(output.contains("date"));
    }

    #[test]
    fn test_empty_candidates() {
        assert_eq!(
            format_candidates("Values", &[], OutputFormat::Table),
            "Values: (none)"
        );
    }

    #[test]
    fn test_context_json() {
        let output = format_context(
            &Context::value("status", "Op"),
            DetectionRule::OperatorPairing,
            OutputFormat::Json,
        );
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["context"]["kind"], "value");
        assert_eq!(value["rule"], "OperatorPairing");
    }
}
