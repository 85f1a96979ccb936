//! Logical levels, edge types and the reconstruction of both from a sample index.
//!
//! The recorder only stores timestamps. Because consecutive transitions on a
//! single line strictly alternate, the edge type and resulting level of every
//! recorded sample follow from its index and the level reached by sample 0.

use std::ops::Not;

/// Logical level of the monitored line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn as_u8(self) -> u8 {
        match self {
            Level::Low => 0,
            Level::High => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::High => "high",
        }
    }

    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl Not for Level {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Direction of a recorded transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Rising,
    Falling,
}

impl Edge {
    pub fn as_str(self) -> &'static str {
        match self {
            Edge::Rising => "rising",
            Edge::Falling => "falling",
        }
    }

    /// Level the line is at once this edge has happened.
    pub fn resulting_level(self) -> Level {
        match self {
            Edge::Rising => Level::High,
            Edge::Falling => Level::Low,
        }
    }
}

/// Edge type of logical sample `idx`.
///
/// `initial_level` is the level reached by sample 0.
pub fn edge_of(idx: u32, initial_level: Level) -> Edge {
    let is_falling = (idx % 2 == 0) ^ initial_level.is_high();
    if is_falling {
        Edge::Falling
    } else {
        Edge::Rising
    }
}

/// Level of the line after logical sample `idx`.
///
/// `initial_level` is the level reached by sample 0.
pub fn level_of(idx: u32, initial_level: Level) -> Level {
    edge_of(idx, initial_level).resulting_level()
}
