// SPDX-License-Identifier: PMPL-1.0-or-later
//! JQL Assist
//!
//! Context-sensitive autocompletion for field/operator/value queries joined
//! by logical connectives, with an optional trailing ORDER BY clause.
//! Detects what the caret is editing, resolves the valid candidates, and
//! splices a chosen candidate back into the query text.

pub mod catalog;
pub mod config;
pub mod detect;
pub mod driver;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod parser;
pub mod resolver;
pub mod session;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use catalog::{Catalog, FieldDescriptor, FunctionDescriptor, ValueEntry};
pub use config::AssistConfig;
pub use detect::{detect, Context};
pub use driver::{Outcome, SessionDriver};
pub use error::AssistError;
pub use fetcher::{SimulatedValueFetcher, ValueFetcher};
pub use filter::{filter_candidates, heading_label};
pub use parser::{ParseFailure, PositionalParser, QueryParser, QueryTree};
pub use resolver::SuggestionResolver;
pub use session::{splice, Edit, Effect, Event, Key, Phase, Session, Ticket, View};

/// What kind of token the caret is editing.
///
/// Sort-direction and clause-keyword positions collapse into `Field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Field,
    Operator,
    Value,
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestionKind::Field => write!(f, "field"),
            SuggestionKind::Operator => write!(f, "operator"),
            SuggestionKind::Value => write!(f, "value"),
        }
    }
}

impl FromStr for SuggestionKind {
    type Err = AssistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "field" => Ok(SuggestionKind::Field),
            "operator" => Ok(SuggestionKind::Operator),
            "value" => Ok(SuggestionKind::Value),
            _ => Err(AssistError::UnknownKind(s.to_string())),
        }
    }
}

/// Value-domain classification of a field.
///
/// Drives which operator set and which value set apply. Two fields with
/// different ids may share a semantic type (assignee and reporter are both
/// `User`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Text,
    Date,
    User,
    Project,
    Status,
    Priority,
}

impl SemanticType {
    /// All semantic types in canonical order.
    pub const ALL: [SemanticType; 6] = [
        SemanticType::Text,
        SemanticType::Date,
        SemanticType::User,
        SemanticType::Project,
        SemanticType::Status,
        SemanticType::Priority,
    ];
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Text => write!(f, "text"),
            SemanticType::Date => write!(f, "date"),
            SemanticType::User => write!(f, "user"),
            SemanticType::Project => write!(f, "project"),
            SemanticType::Status => write!(f, "status"),
            SemanticType::Priority => write!(f, "priority"),
        }
    }
}

impl FromStr for SemanticType {
    type Err = AssistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(SemanticType::Text),
            "date" => Ok(SemanticType::Date),
            "user" => Ok(SemanticType::User),
            "project" => Ok(SemanticType::Project),
            "status" => Ok(SemanticType::Status),
            "priority" => Ok(SemanticType::Priority),
            _ => Err(AssistError::UnknownSemanticType(s.to_string())),
        }
    }
}

/// A single suggestion offered to the user.
///
/// `id` is the stable identity used for keying and selection;
/// `display_text` is what gets spliced into the query on commit and
/// already carries any quoting the value needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub display_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_type: Option<SemanticType>,
}

impl Candidate {
    /// A candidate whose id and display text are the same string.
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: text.clone(),
            display_text: text,
            description: None,
            semantic_type: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
