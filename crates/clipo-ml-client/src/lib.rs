//! Clients for the external reasoning and transcription services.
//!
//! Both services speak the OpenAI-compatible HTTP dialect (Groq, OpenAI,
//! local gateways). The pipeline depends only on the `ReasoningClient` and
//! `Transcriber` traits so tests can substitute scripted fakes.

pub mod client;
pub mod error;
pub mod reasoning;
pub mod transcription;
pub mod types;

pub use client::{ApiKeyRing, MlClientConfig};
pub use error::{MlError, MlResult};
pub use reasoning::{ChatCompletionClient, ReasoningClient};
pub use transcription::{Transcriber, WhisperClient};
