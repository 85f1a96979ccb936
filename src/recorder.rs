//! Interrupt-context sample recording.
//!
//! Everything here runs once per physical edge with interrupts for the line
//! held off. The routine is O(1), never blocks and never logs.

use std::sync::Arc;

use crate::config::{IndexingMode, ScopeConfig};
use crate::interrupt::{HandlerAction, MicrosClock};
use crate::sample::SampleDepth;
use crate::session::{SessionState, SharedSession};

/// Decisions taken while recording one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct RecordOutcome {
    /// The edge became sample 0 of the session.
    pub(crate) began: bool,
    /// The edge filled the buffer (linear) or closed a wrap epoch (wrapping).
    pub(crate) completed: bool,
    /// The handler should be unbound.
    pub(crate) detach: bool,
}

impl<const N: usize, D: SampleDepth> SessionState<N, D> {
    /// Apply one edge observed at `now` to the session.
    pub(crate) fn record(&mut self, now: u32, config: &ScopeConfig) -> RecordOutcome {
        let mut outcome = RecordOutcome::default();

        if !self.enabled {
            return outcome;
        }

        // Alignment edge consumed by a rising/falling trigger.
        if self.index < 0 {
            self.index += 1;
            return outcome;
        }

        let capacity = N as i32;
        let slot = match config.mode {
            IndexingMode::Linear => {
                if self.index >= capacity {
                    self.enabled = false;
                    return outcome;
                }
                self.index as usize
            }
            IndexingMode::Wrapping => (self.index as usize) & (N - 1),
        };

        if self.index == 0 {
            self.start = Some(now);
            outcome.began = true;
        }
        let start = self.start.unwrap_or(now);
        self.samples[slot] = D::from_offset(now.wrapping_sub(start));
        self.index += 1;

        if self.index % capacity == 0 {
            self.epochs = self.epochs.saturating_add(1);
            outcome.completed = true;

            match config.mode {
                IndexingMode::Linear => {
                    self.enabled = false;
                    outcome.detach = config.auto_stop;
                }
                IndexingMode::Wrapping => {
                    if config.auto_stop {
                        self.enabled = false;
                        outcome.detach = true;
                    }
                    // Fold into [N, 2N); N is even so index parity is kept.
                    if self.index == 2 * capacity {
                        self.index = capacity;
                    }
                }
            }
        }

        outcome
    }
}

/// Interrupt handler state: the shared session plus the clock to stamp edges.
///
/// Each edge enters a `critical-section` section. On a single-core target
/// that only masks interrupts, but the `std` implementation used on hosts is
/// a global lock, so there the handler can block while the main context is
/// inside an accessor. Those sections are short and never wait on the handler.
pub(crate) struct SampleRecorder<C, const N: usize, D = u32> {
    session: Arc<SharedSession<N, D>>,
    clock: C,
}

impl<C: MicrosClock, const N: usize, D: SampleDepth> SampleRecorder<C, N, D> {
    pub(crate) fn new(session: Arc<SharedSession<N, D>>, clock: C) -> Self {
        Self { session, clock }
    }

    /// Entry point called by the interrupt controller for every edge.
    pub(crate) fn on_edge(&mut self) -> HandlerAction {
        let now = self.clock.now_micros();
        self.session.on_edge(now)
    }
}
