//! Per-session sliding-window transcript buffer.
//!
//! The buffer accumulates incrementally arriving speech fragments and decides,
//! with three independent rules, when enough new material has arrived to run
//! an analysis cycle:
//!
//! 1. a pending chunk ends a sentence (`complete_sentence`)
//! 2. pending words reach the trigger threshold (`word_threshold`)
//! 3. the oldest pending fragment has waited past the timeout (`timeout`)
//!
//! # Example
//!
//! ```
//! use coach_buffer::{BufferConfig, TranscriptBuffer, TriggerReason};
//! use coach_models::SessionId;
//!
//! let buffer = TranscriptBuffer::new(BufferConfig::default());
//! let session = SessionId::from("interview-1");
//!
//! buffer.add_chunk(&session, "Turn the valve clockwise.", true);
//! let ready = buffer.get_processable_content(&session);
//! assert_eq!(ready.reason, TriggerReason::CompleteSentence);
//!
//! buffer.mark_processed(&session, &ready.chunk_ids);
//! assert!(!buffer.get_processable_content(&session).should_process);
//! ```

pub mod buffer;
pub mod config;
pub mod error;

pub use buffer::{ProcessableContent, TranscriptBuffer, TriggerReason};
pub use config::BufferConfig;
pub use error::{BufferError, Result};
