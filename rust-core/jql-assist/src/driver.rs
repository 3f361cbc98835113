// SPDX-License-Identifier: PMPL-1.0-or-later
//! Tokio host for a [`Session`].
//!
//! Carries out session effects: synchronous resolutions are fed straight
//! back, fetches and close timers run as spawned tasks that report through
//! an mpsc channel. Session state is only ever touched from the driver, so
//! each event is applied to completion before the next one.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::AssistError;
use crate::resolver::SuggestionResolver;
use crate::session::{Edit, Effect, Event, Session};

const CHANNEL_CAPACITY: usize = 64;

/// Effects the host itself must apply after an event.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub edits: Vec<Edit>,
    pub key_consumed: bool,
}

pub struct SessionDriver {
    session: Session,
    resolver: Arc<SuggestionResolver>,
    sender: mpsc::Sender<Event>,
    receiver: mpsc::Receiver<Event>,
    in_flight: usize,
}

impl SessionDriver {
    pub fn new(session: Session, resolver: Arc<SuggestionResolver>) -> Self {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        Self {
            session,
            resolver,
            sender,
            receiver,
            in_flight: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Number of spawned fetches and timers not yet reported.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Apply a host event and everything it triggers synchronously.
    pub async fn dispatch(&mut self, event: Event) -> Result<Outcome, AssistError> {
        let mut outcome = Outcome::default();
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            for effect in self.session.handle(event)? {
                match effect {
                    Effect::Resolve { ticket, context } => {
                        if self.resolver.requires_fetch(&context) {
                            let resolver = Arc::clone(&self.resolver);
                            self.spawn(async move {
                                let candidates = resolver.resolve(&context).await;
                                Event::Resolved { ticket, candidates }
                            });
                        } else {
                            let candidates = self.resolver.resolve(&context).await;
                            queue.push_back(Event::Resolved { ticket, candidates });
                        }
                    }
                    Effect::ScheduleClose { ticket, after } => {
                        self.spawn(async move {
                            tokio::time::sleep(after).await;
                            Event::GraceElapsed(ticket)
                        });
                    }
                    Effect::ApplyEdit(edit) => outcome.edits.push(edit),
                    Effect::ConsumeKey => outcome.key_consumed = true,
                }
            }
        }

        Ok(outcome)
    }

    /// Wait for the next spawned task to report and apply its event.
    ///
    /// Returns `None` when nothing is in flight.
    pub async fn next_completion(&mut self) -> Result<Option<Outcome>, AssistError> {
        if self.in_flight == 0 {
            return Ok(None);
        }
        let Some(event) = self.receiver.recv().await else {
            return Ok(None);
        };
        self.in_flight -= 1;
        self.dispatch(event).await.map(Some)
    }

    /// Drain every in-flight task.
    pub async fn settle(&mut self) -> Result<Vec<Edit>, AssistError> {
        let mut edits = Vec::new();
        while let Some(outcome) = self.next_completion().await? {
            edits.extend(outcome.edits);
        }
        Ok(edits)
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: std::future::Future<Output = Event> + Send + 'static,
    {
        self.in_flight += 1;
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let event = task.await;
            if sender.send(event).await.is_err() {
                warn!("Session driver dropped before task completed");
            }
        });
        debug!(in_flight = self.in_flight, "Spawned session task");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::catalog::Catalog;
    use crate::config::AssistConfig;
    use crate::fetcher::{default_remote_values, SimulatedValueFetcher, ValueFetcher};
    use crate::session::{Key, Phase};
    use crate::Candidate;

    /// Answers each field after a fixed per-field delay.
    struct DelayedFetcher {
        delays: HashMap<&'static str, u64>,
        inner: SimulatedValueFetcher,
    }

    #[async_trait]
    impl ValueFetcher for DelayedFetcher {
        async fn fetch_values(&self, field: &str, query: &str) -> Result<Vec<Candidate>, AssistError> {
            let delay = self.delays.get(field).copied().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.inner.fetch_values(field, query).await
        }

        fn name(&self) -> &str {
            "delayed"
        }
    }

    fn driver_with(fetcher: Arc<dyn ValueFetcher>) -> SessionDriver {
        let catalog = Arc::new(Catalog::default());
        let session = Session::new(Arc::clone(&catalog), AssistConfig::default());
        SessionDriver::new(session, Arc::new(SuggestionResolver::new(catalog, fetcher)))
    }

    fn offline_driver() -> SessionDriver {
        driver_with(Arc::new(SimulatedValueFetcher::new(default_remote_values(), 0, 0)))
    }

    fn typed(text: &str) -> Event {
        Event::TextChanged {
            text: text.to_string(),
            caret: text.len(),
        }
    }

    #[tokio::test]
    async fn test_static_resolution_opens_inline() {
        let mut d = offline_driver();
        d.dispatch(Event::Focused).await.unwrap();
        assert_eq!(d.in_flight(), 0);
        assert_eq!(d.session().phase(), Phase::Open { highlighted: 0 });
        assert_eq!(d.session().view().heading, "Fields");
    }

    #[tokio::test]
    async fn test_fetch_runs_as_task() {
        let mut d = offline_driver();
        d.dispatch(typed("status = ")).await.unwrap();
        assert_eq!(d.in_flight(), 1);
        assert!(d.session().view().is_loading);

        d.settle().await.unwrap();
        assert_eq!(d.session().candidates().len(), 6);
        assert!(!d.session().view().is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_request_wins_over_slower_earlier_one() {
        let fetcher = DelayedFetcher {
            delays: HashMap::from([("status", 1500), ("priority", 100)]),
            inner: SimulatedValueFetcher::new(default_remote_values(), 0, 0),
        };
        let mut d = driver_with(Arc::new(fetcher));

        d.dispatch(typed("status = ")).await.unwrap();
        d.dispatch(typed("priority = ")).await.unwrap();
        assert_eq!(d.in_flight(), 2);

        d.next_completion().await.unwrap();
        assert_eq!(d.session().candidates()[0].id, "Highest");

        d.next_completion().await.unwrap();
        assert_eq!(d.in_flight(), 0);
        assert_eq!(d.session().candidates()[0].id, "Highest");
        assert_eq!(d.session().candidates().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blur_closes_after_grace() {
        let mut d = offline_driver();
        d.dispatch(Event::Focused).await.unwrap();
        d.dispatch(Event::Blurred { into_list: false }).await.unwrap();
        assert!(d.session().view().visible);

        let start = tokio::time::Instant::now();
        d.settle().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(150));
        assert_eq!(d.session().phase(), Phase::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_interaction_survives_grace() {
        let mut d = offline_driver();
        d.dispatch(Event::Focused).await.unwrap();
        d.dispatch(Event::Blurred { into_list: false }).await.unwrap();
        d.dispatch(Event::ListInteraction).await.unwrap();

        d.settle().await.unwrap();
        assert!(d.session().view().visible);
    }

    #[tokio::test]
    async fn test_enter_returns_edit_and_consumes_key() {
        let mut d = offline_driver();
        d.dispatch(typed("ass")).await.unwrap();
        let outcome = d.dispatch(Event::KeyDown(Key::Enter)).await.unwrap();

        assert!(outcome.key_consumed);
        assert_eq!(outcome.edits.len(), 1);
        assert_eq!(outcome.edits[0].text, "assignee ");
        assert_eq!(d.session().view().heading, "Operators");
    }

    #[tokio::test]
    async fn test_unknown_selection_surfaces_error() {
        let mut d = offline_driver();
        d.dispatch(Event::Focused).await.unwrap();
        let err = d
            .dispatch(Event::Select { id: "nope".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, AssistError::UnknownCandidate(_)));
    }
}
