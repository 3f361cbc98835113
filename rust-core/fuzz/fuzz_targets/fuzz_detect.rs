// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Fuzz target for context detection and commit splicing.
// Run with: cargo +nightly fuzz run fuzz_detect
//
// The first two bytes choose a caret; the rest is the query text. Detection
// is total, so every input must classify without panicking, and splicing a
// candidate at that caret must leave the caret just past the inserted space.

#![no_main]

use jql_assist::{detect, splice, SuggestionKind};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let caret = u16::from_le_bytes([data[0], data[1]]) as usize;
    let Ok(text) = std::str::from_utf8(&data[2..]) else {
        return;
    };
    if text.len() > 4096 {
        return;
    }

    let context = detect(text, caret);
    let governed = context.kind() != SuggestionKind::Field;
    assert_eq!(context.governing_field().is_some(), governed);

    let edit = splice(text, caret, "x");
    assert!(edit.text[..edit.caret].ends_with("x "));
});
