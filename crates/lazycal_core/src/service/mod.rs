//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own the undo/redo command log around event mutations.
//! - Keep UI layers decoupled from storage details.

pub mod event_manager;
pub mod history;
