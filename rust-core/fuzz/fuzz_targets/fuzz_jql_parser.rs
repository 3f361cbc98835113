// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Fuzz target for the positional JQL parser.
// Run with: cargo +nightly fuzz run fuzz_jql_parser
//
// The parser must reject malformed input with a ParseFailure, never a panic.

#![no_main]

use jql_assist::{PositionalParser, QueryParser};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The parser operates on &str, not raw bytes.
    if let Ok(input) = std::str::from_utf8(data) {
        if input.len() <= 4096 {
            if let Ok(tree) = PositionalParser.parse(input) {
                for token in &tree.tokens {
                    assert!(token.offset <= input.len());
                }
            }
        }
    }
});
