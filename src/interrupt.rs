//! Interface to the platform's edge-interrupt controller and microsecond clock.
//!
//! Platforms implement these traits over their GPIO/EXTI drivers. The scope
//! hands the controller a boxed handler that owns everything the interrupt
//! routine needs, so no global pointer to the active scope is required.

use crate::edge::Level;

/// Which transitions the interrupt controller should report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeMode {
    AnyChange,
    Rising,
    Falling,
}

impl EdgeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeMode::AnyChange => "any-change",
            EdgeMode::Rising => "rising",
            EdgeMode::Falling => "falling",
        }
    }

    /// Whether a transition that ends at `new_level` should be reported.
    pub fn accepts(&self, new_level: Level) -> bool {
        match self {
            EdgeMode::AnyChange => true,
            EdgeMode::Rising => new_level == Level::High,
            EdgeMode::Falling => new_level == Level::Low,
        }
    }
}

/// What the controller should do with the handler after it returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerAction {
    Keep,
    /// Unbind the handler; no further edges will be delivered.
    Detach,
}

/// Interrupt handler bound to a line. Runs in interrupt context.
pub type EdgeHandler = Box<dyn FnMut() -> HandlerAction + Send>;

/// Edge-interrupt registration and pin reads for one platform.
pub trait EdgeInterrupts {
    /// Line (pin) identifier.
    type Line: Copy + std::fmt::Debug;
    /// Capability returned by `attach`, consumed by `detach`.
    type Handle;

    /// Bind `handler` to edges of `line` matching `mode`.
    fn attach(&mut self, line: Self::Line, mode: EdgeMode, handler: EdgeHandler) -> Self::Handle;

    /// Unbind a handler. Must be a no-op if the handler already detached
    /// itself by returning [`HandlerAction::Detach`].
    fn detach(&mut self, handle: Self::Handle);

    fn read_level(&self, line: Self::Line) -> Level;
}

/// Monotonic microsecond clock. Wraps at 2^32.
pub trait MicrosClock {
    fn now_micros(&self) -> u32;
}
