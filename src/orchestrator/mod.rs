//! Request-lifecycle orchestration for prompt-to-image generation.
//!
//! A [`RequestOrchestrator`] owns one session's [`OrchestratorState`]. The
//! state lives in a `tokio::sync::watch` channel and every transition is a
//! single `send_modify`, so snapshots and subscribers only ever observe
//! whole transitions: start, success, failure, or selection.

use crate::{
    client::ImageGenerator,
    config::{OrchestratorConfig, SelectionPolicy, TriggerPolicy, DEFAULT_FAILURE_MESSAGE},
    error::{FailureKind, GenerationError},
    models::{GeneratedImageHistory, GenerationRequest, GenerationResult, OrchestratorState},
};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use uuid::Uuid;


/// How a single `trigger` call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Blank prompt; nothing happened.
    Skipped,
    /// Another request was in flight under `TriggerPolicy::RejectWhileInFlight`.
    Rejected,
    Completed(GenerationResult),
    Failed { message: String, kind: FailureKind },
}

impl TriggerOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TriggerOutcome::Completed(_))
    }
}

pub struct RequestOrchestrator<G> {
    generator: G,
    config: OrchestratorConfig,
    state: watch::Sender<OrchestratorState>,
    flights: Mutex<Flights>,
}

/// In-flight bookkeeping, guarded together with every state transition.
#[derive(Debug, Default)]
struct Flights {
    count: usize,
    /// Failure message held back while other requests are still loading.
    held_error: Option<String>,
}

enum Settlement {
    Succeeded(GenerationResult),
    Failed(String),
    Abandoned,
}

impl<G: ImageGenerator> RequestOrchestrator<G> {
    pub fn new(generator: G) -> Self {
        Self::with_config(generator, OrchestratorConfig::default())
    }

    /// A blank `failure_message` is replaced by the default one, since a
    /// failed trigger must always leave a non-empty `error`.
    pub fn with_config(generator: G, mut config: OrchestratorConfig) -> Self {
        if config.failure_message.trim().is_empty() {
            log::warn!("Blank failure message configured, using the default");
            config.failure_message = DEFAULT_FAILURE_MESSAGE.to_string();
        }

        let (state, _) = watch::channel(OrchestratorState::new());
        Self {
            generator,
            config,
            state,
            flights: Mutex::new(Flights::default()),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Runs one generation attempt and folds its result into state.
    ///
    /// Never returns an error: failures land in `OrchestratorState::error`
    /// and are described by the returned outcome.
    pub async fn trigger(&self, request: impl Into<GenerationRequest>) -> TriggerOutcome {
        let request = request.into();
        if request.is_blank() {
            log::debug!("Ignoring blank prompt");
            return TriggerOutcome::Skipped;
        }

        let request_id = short_id();
        let Some(flight) = self.begin(&request_id) else {
            log::warn!(
                "[req:{}] Rejected \"{}\": a generation is already in flight",
                request_id,
                request.prompt
            );
            return TriggerOutcome::Rejected;
        };

        log::info!("[req:{}] Generating image for \"{}\"", request_id, request.prompt);

        match self.generator.generate(&request).await {
            Ok(result) => flight.succeed(result),
            Err(error) => flight.fail(error),
        }
    }

    /// Read-only snapshot of the current state.
    pub fn get_state(&self) -> OrchestratorState {
        self.state.borrow().clone()
    }

    pub fn history(&self) -> GeneratedImageHistory {
        self.state.borrow().history.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<OrchestratorState> {
        self.state.subscribe()
    }

    /// Stream of snapshots, starting with the current one.
    pub fn state_stream(&self) -> WatchStream<OrchestratorState> {
        WatchStream::new(self.subscribe())
    }

    pub fn in_flight(&self) -> usize {
        self.lock_flights().count
    }

    /// Points `latest_image_url` at `url`. History is never touched.
    ///
    /// Under `SelectionPolicy::Strict` a URL absent from history is refused
    /// and `false` is returned.
    pub fn select_latest(&self, url: &str) -> bool {
        let strict = self.config.selection_policy == SelectionPolicy::Strict;
        let mut accepted = false;

        self.state.send_if_modified(|state| {
            if strict && !state.history.contains_url(url) {
                return false;
            }
            accepted = true;
            if state.latest_image_url.as_deref() == Some(url) {
                return false;
            }
            state.latest_image_url = Some(url.to_string());
            true
        });

        if !accepted {
            log::warn!("Refusing to select {}: not in history", url);
        }
        accepted
    }

    fn begin(&self, request_id: &str) -> Option<Flight<'_, G>> {
        let mut flights = self.lock_flights();
        if flights.count > 0 && self.config.trigger_policy == TriggerPolicy::RejectWhileInFlight {
            return None;
        }
        flights.count += 1;
        self.state.send_modify(OrchestratorState::begin);

        Some(Flight {
            orchestrator: self,
            request_id: request_id.to_string(),
            settled: false,
        })
    }

    /// Decrements the in-flight count and applies the settlement while the
    /// count is still locked, so a concurrent start cannot interleave.
    ///
    /// A failure stays held until nothing is loading; a later success
    /// discards it, an abandoned flight does not.
    fn settle(&self, settlement: Settlement) {
        let mut flights = self.lock_flights();
        flights.count = flights.count.saturating_sub(1);
        let still_loading = flights.count > 0;

        match settlement {
            Settlement::Succeeded(result) => {
                flights.held_error = None;
                self.state
                    .send_modify(|state| state.succeed(result, still_loading));
            }
            Settlement::Failed(message) => {
                flights.held_error = Some(message);
                let error = if still_loading { None } else { flights.held_error.take() };
                self.state.send_modify(|state| state.fail(error, still_loading));
            }
            Settlement::Abandoned => {
                let error = if still_loading { None } else { flights.held_error.take() };
                self.state.send_modify(|state| state.fail(error, still_loading));
            }
        }
    }

    fn lock_flights(&self) -> MutexGuard<'_, Flights> {
        self.flights
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<G: ImageGenerator + 'static> RequestOrchestrator<G> {
    /// Runs `trigger` on the tokio runtime so the caller can keep going.
    pub fn spawn_trigger(
        self: &Arc<Self>,
        request: impl Into<GenerationRequest>,
    ) -> JoinHandle<TriggerOutcome> {
        let orchestrator = Arc::clone(self);
        let request = request.into();
        tokio::spawn(async move { orchestrator.trigger(request).await })
    }
}

/// One accepted trigger. Dropping it unsettled (the trigger future was
/// dropped mid-call) still releases the in-flight slot.
struct Flight<'a, G: ImageGenerator> {
    orchestrator: &'a RequestOrchestrator<G>,
    request_id: String,
    settled: bool,
}

impl<G: ImageGenerator> Flight<'_, G> {
    fn succeed(mut self, result: GenerationResult) -> TriggerOutcome {
        self.settled = true;
        log::info!(
            "[req:{}] Image ready: {}",
            self.request_id,
            result.image_url()
        );

        self.orchestrator
            .settle(Settlement::Succeeded(result.clone()));

        TriggerOutcome::Completed(result)
    }

    fn fail(mut self, error: GenerationError) -> TriggerOutcome {
        self.settled = true;
        let kind = error.kind();
        log::error!(
            "[req:{}] Image generation failed ({:?}): {}",
            self.request_id,
            kind,
            error
        );

        let message = self.orchestrator.config.failure_message.clone();
        self.orchestrator
            .settle(Settlement::Failed(message.clone()));

        TriggerOutcome::Failed { message, kind }
    }
}

impl<G: ImageGenerator> Drop for Flight<'_, G> {
    fn drop(&mut self) {
        if !self.settled {
            log::warn!("[req:{}] Generation abandoned before completion", self.request_id);
            self.orchestrator.settle(Settlement::Abandoned);
        }
    }
}

fn short_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}
