//! Streaming agent runs for the live coaching engine.
//!
//! An [`AgentRunner`] drives one text-generation call for one agent role,
//! emitting cumulative partial results as tokens arrive and a final result
//! with structured metadata extracted from the labelled output.
//!
//! The model backend sits behind the [`TextGenerator`] trait:
//! - [`OpenRouterClient`] streams from OpenRouter's chat completions API
//! - [`ScriptedGenerator`] replays canned responses offline
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use coach_agent::{AgentInput, AgentRunner, ModelConfig, OpenRouterClient};
//! use coach_models::AgentKind;
//!
//! # async fn example() -> coach_agent::Result<()> {
//! let client = Arc::new(OpenRouterClient::from_env()?);
//! let runner = AgentRunner::new(AgentKind::Validation, client, ModelConfig::default());
//!
//! let result = runner
//!     .run(&AgentInput::new("Close the valve, then vent."), |partial| {
//!         println!("{}", partial.content);
//!     })
//!     .await;
//! println!("{:?}", result.metadata);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod fields;
pub mod generator;
pub mod input;
pub mod prompts;
pub mod runner;
pub mod scripted;

pub use client::{OpenRouterClient, SseParser, OPENROUTER_API_KEY_ENV};
pub use config::ModelConfig;
pub use contract::{field_specs, parse_metadata};
pub use error::{AgentError, Result};
pub use fields::{extract_fields, FieldKind, FieldSpec, FieldValue, ParsedFields};
pub use generator::{ChatMessage, GenerationRequest, TextGenerator};
pub use input::AgentInput;
pub use prompts::fallback_message;
pub use runner::AgentRunner;
pub use scripted::ScriptedGenerator;
