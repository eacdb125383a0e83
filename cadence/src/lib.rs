//! Cadence - a command execution core with lifecycle callbacks
//!
//! This crate drives a business command through a fixed sequence of seven
//! phases, with a state machine guarding every transition and a
//! priority-ordered callback engine hooking before, after, around and error
//! behavior onto any of them.

pub mod callback;
pub mod command;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod prelude;
pub mod state;

pub use error::{Error, Result};
