use crate::edge::Level;

/// Condition that starts recording once the scope is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerMode {
    /// Record from the first edge of either polarity.
    #[default]
    Change,
    /// Record from the first rising edge.
    Rising,
    /// Record from the first falling edge.
    Falling,
}

impl TriggerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerMode::Change => "change",
            TriggerMode::Rising => "rising",
            TriggerMode::Falling => "falling",
        }
    }
}

/// Recorder state computed when a scope is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmState {
    /// Starting value of the logical index. `-1` means the next edge is
    /// consumed to align with the trigger polarity.
    pub initial_index: i32,
    /// Level reached by the first recorded sample.
    pub initial_level: Level,
}

impl ArmState {
    pub fn skips(&self) -> u32 {
        self.initial_index.unsigned_abs()
    }
}

/// Compute the arming state for `mode` given the line level read at arm time.
///
/// Must be evaluated in the same critical section that commits the result,
/// otherwise an edge arriving in between would be counted against a stale level.
pub fn arm(mode: TriggerMode, current_level: Level) -> ArmState {
    match mode {
        TriggerMode::Change => ArmState {
            initial_index: 0,
            initial_level: !current_level,
        },
        TriggerMode::Rising => ArmState {
            initial_index: if current_level == Level::Low { 0 } else { -1 },
            initial_level: Level::High,
        },
        TriggerMode::Falling => ArmState {
            initial_index: if current_level == Level::High { 0 } else { -1 },
            initial_level: Level::Low,
        },
    }
}
