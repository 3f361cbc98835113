// SPDX-License-Identifier: PMPL-1.0-or-later
//! Autocomplete session controller.
//!
//! A [`Session`] is a pure state machine: the host feeds it [`Event`]s and
//! carries out the [`Effect`]s it returns. It never awaits and never
//! touches a timer itself, which keeps every transition run-to-completion.
//!
//! ```text
//! Idle ──detect──▶ Resolving ──non-empty──▶ Open ──Enter/select──▶ Committing
//!                      │  ▲                  │ ▲                      │
//!                      │  └──────detect──────┘ │ list interaction     │
//!                      ▼                       ▼ │                    │
//!                    Closed ◀──grace──── PendingClose                 │
//!                      ▲                                              │
//!                      └───────────── Escape ────────── Resolving ◀───┘
//! ```
//!
//! Every resolution request carries a [`Ticket`]; a result is accepted only
//! while the session is still `Resolving` that ticket, so a slow fetch that
//! has been superseded is dropped on arrival (last request wins).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::catalog::Catalog;
use crate::config::AssistConfig;
use crate::detect::{clamp_caret, detect, Context, Prefix};
use crate::error::AssistError;
use crate::filter::{filter_candidates, heading_label};
use crate::resolver::requires_fetch;
use crate::{Candidate, SuggestionKind};

/// Identity of one resolution request or one pending close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Keys the session may intercept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
}

/// Something that happened in the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The text input gained focus.
    Focused,
    /// The value changed (typing, paste, or the echo of an applied edit).
    TextChanged { text: String, caret: usize },
    /// The caret moved without the text changing (click, key-up).
    CaretMoved { caret: usize },
    KeyDown(Key),
    /// A candidate was picked with the pointer.
    Select { id: String },
    /// Pointer went down on the candidate list.
    ListInteraction,
    /// Focus left the text input. `into_list` is true when the new focus
    /// target is part of the candidate list.
    Blurred { into_list: bool },
    /// The grace period scheduled by [`Effect::ScheduleClose`] ran out.
    GraceElapsed(Ticket),
    /// A resolution requested by [`Effect::Resolve`] finished.
    Resolved {
        ticket: Ticket,
        candidates: Vec<Candidate>,
    },
}

/// Text and caret to write back into the host's input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub text: String,
    pub caret: usize,
}

/// Work the host must carry out after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Resolve candidates for `context` and report back with
    /// [`Event::Resolved`] carrying the same ticket.
    Resolve { ticket: Ticket, context: Context },
    /// Replace the input's value and caret.
    ApplyEdit(Edit),
    /// Report [`Event::GraceElapsed`] with `ticket` after `after`.
    ScheduleClose { ticket: Ticket, after: Duration },
    /// Prevent the key's default action.
    ConsumeKey,
}

/// The single authoritative state of the candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Resolving { ticket: Ticket, loading: bool },
    Open { highlighted: usize },
    PendingClose { ticket: Ticket, highlighted: usize },
    Closed,
    Committing,
}

/// What the candidate-list presentation should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View<'a> {
    pub visible: bool,
    pub candidates: &'a [Candidate],
    pub highlighted: Option<usize>,
    pub is_loading: bool,
    pub heading: &'static str,
}

/// Replace the in-progress token before `caret` with `insert` followed by
/// one space. The caret lands right after that space.
///
/// With nothing but whitespace before the caret the candidate is inserted
/// at the caret unchanged.
pub fn splice(text: &str, caret: usize, insert: &str) -> Edit {
    let caret = clamp_caret(text, caret);
    let (before, after) = text.split_at(caret);
    let stem_len = Prefix::new(text, caret)
        .in_progress()
        .map_or(caret, |token| token.start);
    let stem = &before[..stem_len];

    let mut spliced = String::with_capacity(stem.len() + insert.len() + 1 + after.len());
    spliced.push_str(stem);
    spliced.push_str(insert);
    spliced.push(' ');
    spliced.push_str(after);

    Edit {
        text: spliced,
        caret: stem.len() + insert.len() + 1,
    }
}

/// State of one editing session, from editor mount to unmount.
pub struct Session {
    catalog: Arc<Catalog>,
    config: AssistConfig,
    text: String,
    caret: usize,
    context: Option<Context>,
    candidates: Vec<Candidate>,
    phase: Phase,
    next_ticket: u64,
}

impl Session {
    pub fn new(catalog: Arc<Catalog>, config: AssistConfig) -> Self {
        Self {
            catalog,
            config,
            text: String::new(),
            caret: 0,
            context: None,
            candidates: Vec::new(),
            phase: Phase::Idle,
            next_ticket: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_committing(&self) -> bool {
        self.phase == Phase::Committing
    }

    pub fn highlighted(&self) -> Option<usize> {
        match self.phase {
            Phase::Open { highlighted } | Phase::PendingClose { highlighted, .. } => {
                Some(highlighted)
            }
            _ => None,
        }
    }

    pub fn view(&self) -> View<'_> {
        let kind = self
            .context
            .as_ref()
            .map_or(SuggestionKind::Field, Context::kind);
        let is_loading = matches!(self.phase, Phase::Resolving { loading: true, .. });
        View {
            visible: is_loading || self.highlighted().is_some(),
            candidates: &self.candidates,
            highlighted: self.highlighted(),
            is_loading,
            heading: heading_label(kind),
        }
    }

    /// Apply one event and return the effects the host must perform.
    pub fn handle(&mut self, event: Event) -> Result<Vec<Effect>, AssistError> {
        let effects = match event {
            Event::Focused => self.refresh(true),
            Event::TextChanged { text, caret } => {
                self.caret = clamp_caret(&text, caret);
                self.text = text;
                self.refresh(false)
            }
            Event::CaretMoved { caret } => {
                self.caret = clamp_caret(&self.text, caret);
                self.refresh(false)
            }
            Event::KeyDown(key) => self.key_down(key),
            Event::Select { id } => self.select(&id)?,
            Event::ListInteraction => {
                if let Phase::PendingClose { highlighted, .. } = self.phase {
                    debug!("Candidate list interaction, cancelling pending close");
                    self.phase = Phase::Open { highlighted };
                }
                Vec::new()
            }
            Event::Blurred { into_list } => self.blurred(into_list),
            Event::GraceElapsed(ticket) => {
                if matches!(self.phase, Phase::PendingClose { ticket: t, .. } if t == ticket) {
                    self.phase = Phase::Closed;
                }
                Vec::new()
            }
            Event::Resolved { ticket, candidates } => {
                self.resolved(ticket, candidates);
                Vec::new()
            }
        };
        Ok(effects)
    }

    fn issue_ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        Ticket(self.next_ticket)
    }

    /// Re-run detection and request candidates if the context changed.
    fn refresh(&mut self, force: bool) -> Vec<Effect> {
        if self.is_committing() {
            debug!("Detection suppressed during commit");
            return Vec::new();
        }

        let context = detect(&self.text, self.caret);
        let changed = self.context.as_ref() != Some(&context);
        let reopen = force && !matches!(self.phase, Phase::Open { .. } | Phase::Resolving { .. });
        if !changed && !reopen {
            return Vec::new();
        }

        self.context = Some(context.clone());
        vec![self.request(context)]
    }

    fn request(&mut self, context: Context) -> Effect {
        let ticket = self.issue_ticket();
        let loading = requires_fetch(&self.catalog, &context);
        debug!(%ticket, %context, loading, "Requesting candidates");
        self.candidates.clear();
        self.phase = Phase::Resolving { ticket, loading };
        Effect::Resolve { ticket, context }
    }

    fn resolved(&mut self, ticket: Ticket, candidates: Vec<Candidate>) {
        let awaiting = matches!(self.phase, Phase::Resolving { ticket: t, .. } if t == ticket);
        if !awaiting {
            debug!(%ticket, "Discarding stale resolution");
            return;
        }

        let partial = self.context.as_ref().map_or("", Context::partial);
        let mut shown = filter_candidates(candidates, partial);
        if self.config.max_visible_candidates > 0 {
            shown.truncate(self.config.max_visible_candidates);
        }

        self.phase = if shown.is_empty() {
            Phase::Closed
        } else {
            Phase::Open { highlighted: 0 }
        };
        debug!(%ticket, count = shown.len(), "Candidates resolved");
        self.candidates = shown;
    }

    fn key_down(&mut self, key: Key) -> Vec<Effect> {
        if key == Key::Escape {
            let was_visible = self.view().visible;
            self.phase = Phase::Closed;
            return if was_visible {
                vec![Effect::ConsumeKey]
            } else {
                Vec::new()
            };
        }

        let Phase::Open { highlighted } = self.phase else {
            return Vec::new();
        };
        let count = self.candidates.len();

        match key {
            Key::ArrowDown => {
                self.phase = Phase::Open {
                    highlighted: (highlighted + 1) % count,
                };
                vec![Effect::ConsumeKey]
            }
            Key::ArrowUp => {
                self.phase = Phase::Open {
                    highlighted: (highlighted + count - 1) % count,
                };
                vec![Effect::ConsumeKey]
            }
            Key::Enter => match self.candidates.get(highlighted).cloned() {
                Some(candidate) => {
                    let mut effects = vec![Effect::ConsumeKey];
                    effects.extend(self.commit(&candidate));
                    effects
                }
                None => Vec::new(),
            },
            Key::Escape => Vec::new(),
        }
    }

    fn select(&mut self, id: &str) -> Result<Vec<Effect>, AssistError> {
        if !matches!(self.phase, Phase::Open { .. } | Phase::PendingClose { .. }) {
            debug!(id, "Ignoring selection while the list is not shown");
            return Ok(Vec::new());
        }
        let candidate = self
            .candidates
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| AssistError::UnknownCandidate(id.to_string()))?;
        Ok(self.commit(&candidate))
    }

    fn blurred(&mut self, into_list: bool) -> Vec<Effect> {
        if into_list {
            return Vec::new();
        }
        match self.phase {
            Phase::Open { highlighted } => {
                let ticket = self.issue_ticket();
                self.phase = Phase::PendingClose {
                    ticket,
                    highlighted,
                };
                vec![Effect::ScheduleClose {
                    ticket,
                    after: self.config.blur_grace(),
                }]
            }
            Phase::Resolving { .. } => {
                self.phase = Phase::Closed;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Splice `candidate` over the in-progress token and seed the next
    /// context from the result.
    ///
    /// Detection only ever sees the text before or after the whole splice:
    /// the session is `Committing` from the first write until the re-seed
    /// has run, and host echoes of the edit detect the same context and
    /// cause no further requests.
    fn commit(&mut self, candidate: &Candidate) -> Vec<Effect> {
        self.phase = Phase::Committing;

        let edit = splice(&self.text, self.caret, &candidate.display_text);
        self.text.clone_from(&edit.text);
        self.caret = edit.caret;
        let next = detect(&self.text, self.caret);
        debug!(
            candidate = %candidate.id,
            caret = self.caret,
            next = %next,
            "Committed candidate"
        );

        self.phase = Phase::Closed;
        self.context = Some(next.clone());
        vec![Effect::ApplyEdit(edit), self.request(next)]
    }
}
