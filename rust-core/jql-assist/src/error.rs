// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for the autocompletion engine.

use thiserror::Error;

/// Errors surfaced by catalog loading, configuration, fetching and commits.
///
/// Detection is total and resolution fails open, so neither of them ever
/// returns one of these to the session.
#[derive(Error, Debug)]
pub enum AssistError {
    #[error("field {0} is not API-backed")]
    NotApiBacked(String),

    #[error("value fetch for field {field} failed: {reason}")]
    FetchFailed { field: String, reason: String },

    #[error("no candidate with id {0} in the open list")]
    UnknownCandidate(String),

    #[error("unknown suggestion kind: {0}")]
    UnknownKind(String),

    #[error("unknown semantic type: {0}")]
    UnknownSemanticType(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("catalog I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
