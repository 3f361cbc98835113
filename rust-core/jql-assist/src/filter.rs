// SPDX-License-Identifier: PMPL-1.0-or-later
//! Presentation-layer filtering applied on top of resolved candidate lists.

use crate::{Candidate, SuggestionKind};

/// Keep candidates whose display text or description contains `partial`,
/// ignoring case. An empty partial keeps everything. Order is preserved.
pub fn filter_candidates(candidates: Vec<Candidate>, partial: &str) -> Vec<Candidate> {
    let needle = partial.trim().to_lowercase();
    if needle.is_empty() {
        return candidates;
    }
    candidates
        .into_iter()
        .filter(|c| {
            c.display_text.to_lowercase().contains(&needle)
                || c.description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Heading shown above the candidate list.
pub fn heading_label(kind: SuggestionKind) -> &'static str {
    match kind {
        SuggestionKind::Field => "Fields",
        SuggestionKind::Operator => "Operators",
        SuggestionKind::Value => "Values",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Vec<Candidate> {
        vec![
            Candidate::plain("priority").with_description("Priority"),
            Candidate::plain("project").with_description("Project"),
            Candidate::plain("duedate").with_description("Due Date"),
        ]
    }

    #[test]
    fn test_empty_partial_keeps_all() {
        assert_eq!(filter_candidates(fields(), "").len(), 3);
    }

    #[test]
    fn test_substring_not_prefix() {
        let kept = filter_candidates(fields(), "ject");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "project");
    }

    #[test]
    fn test_matches_description_ignoring_case() {
        let kept = filter_candidates(fields(), "due d");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "duedate");
    }

    #[test]
    fn test_order_preserved() {
        let kept = filter_candidates(fields(), "pr");
        let ids: Vec<&str> = kept.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["priority", "project"]);
    }

    #[test]
    fn test_headings() {
        assert_eq!(heading_label(SuggestionKind::Field), "Fields");
        assert_eq!(heading_label(SuggestionKind::Value), "Values");
    }
}
