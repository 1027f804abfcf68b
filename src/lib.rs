//! Prompt-to-image request orchestration.
//!
//! [`RequestOrchestrator`] submits prompts to an [`ImageGenerator`], tracks
//! loading and error state, and keeps an append-only history of the images
//! produced during a session.

pub mod client;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;

pub use client::{HttpImageClient, ImageGenerator, MockImageClient, MockOutcome};
pub use config::{ClientConfig, Config, OrchestratorConfig, SelectionPolicy, TriggerPolicy};
pub use error::{FailureKind, GenerationError, Result};
pub use models::{
    GeneratedImageHistory, GenerationRequest, GenerationResult, ImageEnvelope, OrchestratorState,
};
pub use orchestrator::{RequestOrchestrator, TriggerOutcome};
