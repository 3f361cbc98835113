// SPDX-License-Identifier: PMPL-1.0-or-later
//! Suggestion resolution.
//!
//! Maps a detected [`Context`] to its candidate list by dispatching on the
//! context kind to the catalog or, for API-backed fields, to the
//! [`ValueFetcher`]. Resolution fails open: unknown fields get the `text`
//! operator set, missing value sets give an empty list, and fetch errors
//! are logged and turned into an empty list.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::catalog::{Catalog, FieldDescriptor, ValueEntry};
use crate::detect::Context;
use crate::fetcher::ValueFetcher;
use crate::{Candidate, SuggestionKind};

pub struct SuggestionResolver {
    catalog: Arc<Catalog>,
    fetcher: Arc<dyn ValueFetcher>,
}

impl SuggestionResolver {
    pub fn new(catalog: Arc<Catalog>, fetcher: Arc<dyn ValueFetcher>) -> Self {
        Self { catalog, fetcher }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Whether resolving `context` goes through the fetcher and therefore
    /// suspends.
    pub fn requires_fetch(&self, context: &Context) -> bool {
        requires_fetch(&self.catalog, context)
    }

    /// Resolve the full (unfiltered) candidate list for a context.
    pub async fn resolve(&self, context: &Context) -> Vec<Candidate> {
        debug!(kind = %context.kind(), field = ?context.governing_field(), "Resolving suggestions");
        match context.kind() {
            SuggestionKind::Field => self.field_candidates(),
            SuggestionKind::Operator => self.operator_candidates(context.governing_field()),
            SuggestionKind::Value => self.value_candidates(context).await,
        }
    }

    pub fn field_candidates(&self) -> Vec<Candidate> {
        self.catalog
            .fields
            .iter()
            .map(FieldDescriptor::to_candidate)
            .collect()
    }

    pub fn operator_candidates(&self, field: Option<&str>) -> Vec<Candidate> {
        let semantic_type = field
            .and_then(|f| self.catalog.field(f))
            .map(|f| f.semantic_type);
        self.catalog
            .operators_for(semantic_type)
            .iter()
            .map(|op| Candidate::plain(op.as_str()))
            .collect()
    }

    pub fn function_candidates(&self) -> Vec<Candidate> {
        self.catalog
            .functions
            .iter()
            .map(|f| f.to_candidate())
            .collect()
    }

    async fn value_candidates(&self, context: &Context) -> Vec<Candidate> {
        let Some(field) = context
            .governing_field()
            .and_then(|f| self.catalog.field(f))
            .filter(|f| f.has_enumerable_values)
        else {
            return Vec::new();
        };

        if self.catalog.is_api_backed(&field.id) {
            return match self.fetcher.fetch_values(&field.id, context.partial()).await {
                Ok(values) => values,
                Err(e) => {
                    warn!(
                        field = %field.id,
                        fetcher = self.fetcher.name(),
                        error = %e,
                        "Value fetch failed, offering no values"
                    );
                    Vec::new()
                }
            };
        }

        self.catalog
            .static_values(field)
            .iter()
            .map(ValueEntry::to_candidate)
            .collect()
    }
}

/// Whether a context resolves through the asynchronous fetcher.
pub fn requires_fetch(catalog: &Catalog, context: &Context) -> bool {
    context.kind() == SuggestionKind::Value
        && context
            .governing_field()
            .and_then(|f| catalog.field(f))
            .is_some_and(|f| f.has_enumerable_values && catalog.is_api_backed(&f.id))
}
