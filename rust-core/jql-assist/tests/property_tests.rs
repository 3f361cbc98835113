// SPDX-License-Identifier: PMPL-1.0-or-later
//! Property-based tests for context detection and commit splicing

use jql_assist::detect::clamp_caret;
use jql_assist::{detect, splice, Catalog, SuggestionKind};
use proptest::prelude::*;

/// Query-shaped text: words, operators, quotes, parentheses and spaces
fn arb_query() -> impl Strategy<Value = String> {
    "[a-zA-Z=!~<> \"(),]{0,48}"
}

/// Anything at all, including multi-byte characters
fn arb_text() -> impl Strategy<Value = String> {
    any::<String>()
}

/// A clause prefix that ends where a new field may start
fn arb_lead() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("project = PROJECTA AND ".to_string()),
        Just("status = \"In Progress\" OR ".to_string()),
        Just("assignee IS NOT EMPTY AND ".to_string()),
    ]
}

fn catalog() -> Catalog {
    Catalog::default()
}

proptest! {
    #[test]
    fn test_detect_is_deterministic_and_total(text in arb_text(), caret in 0usize..256) {
        let first = detect(&text, caret);
        let second = detect(&text, caret);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_governing_field_present_iff_operator_or_value(text in arb_query(), caret in 0usize..64) {
        let context = detect(&text, caret);
        let governed = matches!(context.kind(), SuggestionKind::Operator | SuggestionKind::Value);
        prop_assert_eq!(context.governing_field().is_some(), governed);
    }

    #[test]
    fn test_partial_is_suffix_of_text_before_caret(text in arb_query(), caret in 0usize..64) {
        let context = detect(&text, caret);
        let before = &text[..clamp_caret(&text, caret)];
        prop_assert!(before.ends_with(context.partial()));
    }

    #[test]
    fn test_commit_caret_follows_inserted_space(
        text in arb_query(),
        caret in 0usize..64,
        insert in "[a-zA-Z=!~]{1,12}"
    ) {
        let clamped = clamp_caret(&text, caret);
        let edit = splice(&text, caret, &insert);
        let expected = format!("{insert} ");

        prop_assert!(edit.caret <= edit.text.len());
        prop_assert!(edit.text[..edit.caret].ends_with(&expected));
        prop_assert_eq!(&edit.text[edit.caret..], &text[clamped..]);
    }

    #[test]
    fn test_committing_field_then_operator_advances_context(
        lead in arb_lead(),
        field_index in 0usize..8,
        operator_index in 0usize..6,
        typed in 0usize..4
    ) {
        let catalog = catalog();
        let field = &catalog.fields[field_index % catalog.fields.len()];
        let operators = catalog.operators_for(Some(field.semantic_type));
        let operator = &operators[operator_index % operators.len()];

        let prefix_len = typed.min(field.id.len());
        let text = format!("{lead}{}", &field.id[..prefix_len]);
        let after_field = splice(&text, text.len(), &field.id);
        let context = detect(&after_field.text, after_field.caret);
        prop_assert_eq!(context.kind(), SuggestionKind::Operator);
        prop_assert_eq!(context.governing_field(), Some(field.id.as_str()));

        let after_operator = splice(&after_field.text, after_field.caret, operator);
        let context = detect(&after_operator.text, after_operator.caret);
        prop_assert_eq!(context.kind(), SuggestionKind::Value);
        prop_assert_eq!(context.governing_field(), Some(field.id.as_str()));
        prop_assert_eq!(context.partial(), "");
    }
}
