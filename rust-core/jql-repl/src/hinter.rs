// SPDX-License-Identifier: PMPL-1.0-or-later
//! Inline hint naming what the cursor is editing.

use jql_assist::detect;
use rustyline::hint::Hinter;
use rustyline::Context;

/// Shows the detected context (`field`, `operator for status`, ...) after
/// the cursor when it sits at the end of a query line.
pub struct ContextHinter;

impl ContextHinter {
    pub fn hint_for(line: &str, pos: usize) -> Option<String> {
        if line.trim().is_empty() || line.starts_with('\\') || pos < line.len() {
            return None;
        }
        Some(format!("  <{}>", detect(line, pos)))
    }
}

impl Hinter for ContextHinter {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        Self::hint_for(line, pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_names_governing_field() {
        assert_eq!(
            ContextHinter::hint_for("status = ", 9).as_deref(),
            Some("  <value for status>")
        );
    }

    #[test]
    fn test_hint_includes_partial() {
        assert_eq!(
            ContextHinter::hint_for("pri", 3).as_deref(),
            Some("  <field (\"pri\")>")
        );
    }

    #[test]
    fn test_no_hint_mid_line_or_for_commands() {
        assert!(ContextHinter::hint_for("status = Open", 3).is_none());
        assert!(ContextHinter::hint_for("\\parse", 6).is_none());
        assert!(ContextHinter::hint_for("", 0).is_none());
    }
}
