//! Command-line driver for the live coaching engine.
//!
//! `coach run` feeds stdin lines to an [`Orchestrator`](coach_orchestrator::Orchestrator)
//! as transcribed speech and prints the resulting event stream.

pub mod cli;
pub mod commands;
