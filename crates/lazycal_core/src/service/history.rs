//! Undo/redo command log primitives.
//!
//! # Responsibility
//! - Define the reversible action recorded for every event mutation.
//! - Provide a capacity-bounded stack that evicts its oldest entry.
//!
//! # Invariants
//! - A `BoundedStack` never holds more than its capacity.
//! - `Edit` always carries both snapshots; `BulkDelete` carries ids only.

use crate::model::event::{Event, EventId};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum number of entries kept on each history stack.
pub const HISTORY_CAPACITY: usize = 50;

/// One reversible mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum UndoAction {
    /// An event was inserted; `after` is the persisted row.
    Add { after: Event },
    /// An event was deleted; `before` is the row as it was.
    Delete { before: Event },
    /// An event was overwritten in place.
    Edit { before: Event, after: Event },
    /// Every event named `name` was deleted. Only ids are captured, so this
    /// action cannot be replayed in either direction.
    BulkDelete { name: String, ids: Vec<EventId> },
}

impl UndoAction {
    /// Short label for menus and status lines, e.g. `Edit "Standup"`.
    pub fn describe(&self) -> String {
        match self {
            Self::Add { after } => format!("Add \"{}\"", after.name),
            Self::Delete { before } => format!("Delete \"{}\"", before.name),
            Self::Edit { before, after } if before.name != after.name => {
                format!("Edit \"{}\" (renamed to \"{}\")", before.name, after.name)
            }
            Self::Edit { after, .. } => format!("Edit \"{}\"", after.name),
            Self::BulkDelete { name, ids } => {
                format!("Delete all \"{}\" ({})", name, ids.len())
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Delete { .. } => "delete",
            Self::Edit { .. } => "edit",
            Self::BulkDelete { .. } => "bulk_delete",
        }
    }
}

/// History-specific failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoError {
    NothingToUndo,
    NothingToRedo,
    /// Bulk deletes store ids only and cannot be reconstructed.
    UnsupportedBulkOperation,
}

impl Display for UndoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NothingToUndo => write!(f, "nothing to undo"),
            Self::NothingToRedo => write!(f, "nothing to redo"),
            Self::UnsupportedBulkOperation => {
                write!(f, "undo/redo is not supported for bulk deletes")
            }
        }
    }
}

impl Error for UndoError {}

/// LIFO stack with a fixed capacity; pushing onto a full stack drops the
/// oldest entry.
#[derive(Debug, Clone)]
pub struct BoundedStack<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedStack<T> {
    /// Creates an empty stack; a `capacity` of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Pushes `item`, returning the evicted oldest entry if any.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_back()
    }

    pub fn peek(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::{BoundedStack, UndoAction, HISTORY_CAPACITY};
    use crate::model::event::Event;
    use chrono::{TimeZone, Utc};

    #[test]
    fn push_evicts_oldest_when_full() {
        let mut stack = BoundedStack::new(HISTORY_CAPACITY);
        for value in 0..HISTORY_CAPACITY {
            assert_eq!(stack.push(value), None);
        }
        assert_eq!(stack.push(HISTORY_CAPACITY), Some(0));
        assert_eq!(stack.len(), HISTORY_CAPACITY);
        assert_eq!(stack.peek(), Some(&HISTORY_CAPACITY));
    }

    #[test]
    fn zero_capacity_still_keeps_latest_entry() {
        let mut stack = BoundedStack::new(0);
        assert_eq!(stack.capacity(), 1);
        assert_eq!(stack.push('a'), None);
        assert_eq!(stack.push('b'), Some('a'));
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.peek(), Some(&'b'));
    }

    #[test]
    fn pop_is_lifo() {
        let mut stack = BoundedStack::new(3);
        stack.push('a');
        stack.push('b');
        assert_eq!(stack.pop(), Some('b'));
        assert_eq!(stack.pop(), Some('a'));
        assert_eq!(stack.pop(), None);
        assert!(stack.is_empty());
    }

    #[test]
    fn describe_mentions_event_name() {
        let event = Event::new(
            "Standup",
            Utc.with_ymd_and_hms(2024, 1, 8, 9, 0, 0).unwrap(),
            0.5,
        );
        let mut renamed = event.clone();
        renamed.name = "Daily".to_string();

        assert_eq!(
            UndoAction::Add {
                after: event.clone()
            }
            .describe(),
            "Add \"Standup\""
        );
        assert_eq!(
            UndoAction::Edit {
                before: event,
                after: renamed
            }
            .describe(),
            "Edit \"Standup\" (renamed to \"Daily\")"
        );
        assert_eq!(
            UndoAction::BulkDelete {
                name: "Standup".to_string(),
                ids: vec![1, 2, 3, 4]
            }
            .describe(),
            "Delete all \"Standup\" (4)"
        );
    }
}
