//! Domain model for calendar events.
//!
//! # Responsibility
//! - Define the canonical event record and its color palette.
//! - Keep validation rules next to the data they protect.
//!
//! # Invariants
//! - Every persisted event is identified by a store-assigned `EventId`.
//! - Event instants are stored and compared in UTC.

pub mod color;
pub mod event;
