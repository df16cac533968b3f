//! Search layer.
//!
//! # Responsibility
//! - Expose the filter model used by search screens.
//! - Resolve filters into UTC windows consumed by the event store.

pub mod criteria;
