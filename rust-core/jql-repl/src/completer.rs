// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//!
//! Tab-completion for the JQL REPL.
//!
//! Completion follows the editor's commit protocol: the word under the
//! cursor is replaced by the chosen candidate plus one space. Candidates
//! come from the context detector and suggestion resolver, so the list
//! depends on whether the cursor sits on a field, an operator or a value.

use std::sync::Arc;

use jql_assist::detect::{clamp_caret, Prefix};
use jql_assist::{detect, filter_candidates, Candidate, SuggestionResolver};
use rustyline::completion::{Completer, Pair};
use rustyline::Context;
use tokio::runtime::Runtime;

/// Meta-commands starting with backslash.
pub const META_COMMANDS: &[&str] = &[
    "\\parse", "\\context", "\\fields", "\\functions", "\\operators", "\\format",
    "\\help", "\\quit", "\\q",
];

/// Tab-completer backed by the suggestion resolver.
///
/// API-backed value lookups are awaited on `runtime`, so completing a
/// `status` or `priority` value pauses for the simulated service latency.
pub struct JqlCompleter {
    resolver: Arc<SuggestionResolver>,
    runtime: Arc<Runtime>,
    max_candidates: usize,
}

impl JqlCompleter {
    pub fn new(resolver: Arc<SuggestionResolver>, runtime: Arc<Runtime>, max_candidates: usize) -> Self {
        Self {
            resolver,
            runtime,
            max_candidates,
        }
    }

    /// Replacement start and candidates for the cursor at `pos`.
    pub fn completions(&self, line: &str, pos: usize) -> (usize, Vec<Pair>) {
        let pos = clamp_caret(line, pos);
        if line.starts_with('\\') {
            if line[..pos].contains(char::is_whitespace) {
                return (pos, Vec::new());
            }
            return complete_meta(&line[..pos]);
        }

        let context = detect(line, pos);
        let start = Prefix::new(line, pos)
            .in_progress()
            .map_or(pos, |token| token.start);

        let resolved = self.runtime.block_on(self.resolver.resolve(&context));
        let mut shown = filter_candidates(resolved, context.partial());
        if self.max_candidates > 0 {
            shown.truncate(self.max_candidates);
        }

        (start, shown.iter().map(to_pair).collect())
    }
}

impl Completer for JqlCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok(self.completions(line, pos))
    }
}

fn to_pair(candidate: &Candidate) -> Pair {
    let display = match &candidate.description {
        Some(description) if *description != candidate.display_text => {
            format!("{:<24} {description}", candidate.display_text)
        }
        _ => candidate.display_text.clone(),
    };
    Pair {
        display,
        replacement: format!("{} ", candidate.display_text),
    }
}

fn complete_meta(typed: &str) -> (usize, Vec<Pair>) {
    let prefix = typed.to_lowercase();
    let candidates = META_COMMANDS
        .iter()
        .filter(|cmd| cmd.starts_with(&prefix))
        .map(|cmd| Pair {
            display: cmd.to_string(),
            replacement: cmd.to_string(),
        })
        .collect();
    (0, candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jql_assist::fetcher::default_remote_values;
    use jql_assist::{Catalog, SimulatedValueFetcher};

    fn completer() -> JqlCompleter {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let resolver = SuggestionResolver::new(
            Arc::new(Catalog::default()),
            Arc::new(SimulatedValueFetcher::new(default_remote_values(), 0, 0)),
        );
        JqlCompleter::new(Arc::new(resolver), Arc::new(runtime), 50)
    }

    fn replacements(pairs: &[Pair]) -> Vec<&str> {
        pairs.iter().map(|p| p.replacement.as_str()).collect()
    }

    #[test]
    fn test_field_prefix_completes_identifier() {
        let (start, pairs) = completer().completions("pri", 3);
        assert_eq!(start, 0);
        assert_eq!(replacements(&pairs), ["priority "]);
    }

    #[test]
    fn test_operator_position_after_field() {
        let (start, pairs) = completer().completions("created ", 8);
        assert_eq!(start, 8);
        assert!(replacements(&pairs).contains(&">= "));
    }

    #[test]
    fn test_value_replaces_partial_only() {
        let line = "project = PROJECTA AND status = prog";
        let (start, pairs) = completer().completions(line, line.len());
        assert_eq!(start, line.len() - 4);
        assert_eq!(replacements(&pairs), ["\"In Progress\" "]);
    }

    #[test]
    fn test_free_text_value_has_no_completions() {
        let (_, pairs) = completer().completions("summary ~ ", 10);
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_meta_commands() {
        let (start, pairs) = completer().completions("\\f", 2);
        assert_eq!(start, 0);
        assert_eq!(replacements(&pairs), ["\\fields", "\\functions", "\\format"]);
    }

    #[test]
    fn test_meta_command_arguments_not_completed() {
        let (_, pairs) = completer().completions("\\parse sta", 10);
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_display_includes_description() {
        let pair = to_pair(&Candidate::plain("duedate").with_description("Due Date"));
        assert!(pair.display.starts_with("duedate"));
        assert!(pair.display.ends_with("Due Date"));
        assert_eq!(pair.replacement, "duedate ");
    }
}
