//! Event color palette.
//!
//! # Responsibility
//! - Define the fixed palette used to tag events.
//! - Derive a stable color from an event name when none is set.
//!
//! # Invariants
//! - Database codes are `1..=7`; `0` is reserved for "unset".
//! - `from_name` is pure and stable across processes and platforms.

use serde::{Deserialize, Serialize};

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Fixed color palette for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventColor {
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Orange,
}

impl EventColor {
    /// Palette in database-code order.
    pub const ALL: [EventColor; 7] = [
        EventColor::Red,
        EventColor::Green,
        EventColor::Yellow,
        EventColor::Blue,
        EventColor::Magenta,
        EventColor::Cyan,
        EventColor::Orange,
    ];

    /// Derives a color from an event name.
    ///
    /// Two events sharing a name always map to the same palette entry.
    pub fn from_name(name: &str) -> Self {
        let hash = name.bytes().fold(FNV_OFFSET_BASIS, |acc, byte| {
            (acc ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
        });
        Self::ALL[(hash % Self::ALL.len() as u32) as usize]
    }

    /// Stable database code (`1..=7`).
    pub fn code(self) -> i64 {
        match self {
            Self::Red => 1,
            Self::Green => 2,
            Self::Yellow => 3,
            Self::Blue => 4,
            Self::Magenta => 5,
            Self::Cyan => 6,
            Self::Orange => 7,
        }
    }

    /// Parses a database code. `0` and unknown values yield `None`.
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|color| color.code() == code)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Blue => "blue",
            Self::Magenta => "magenta",
            Self::Cyan => "cyan",
            Self::Orange => "orange",
        }
    }
}
