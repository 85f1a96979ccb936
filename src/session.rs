//! State block shared between the interrupt routine and the main context.

use core::cell::RefCell;
use critical_section::{CriticalSection, Mutex};

use crate::callbacks::{CallbackDispatcher, HookKind};
use crate::config::{IndexingMode, ScopeConfig};
use crate::edge::Level;
use crate::interrupt::HandlerAction;
use crate::sample::SampleDepth;
use crate::trigger_config::ArmState;

/// Mutable fields of one capture session.
///
/// `index` and `samples` are written only by the recorder; `enabled` and the
/// arming fields are written by the main context inside a critical section.
/// `samples` hold offsets from `start`, truncated to `D`.
pub(crate) struct SessionState<const N: usize, D = u32> {
    pub(crate) index: i32,
    pub(crate) initial_level: Level,
    pub(crate) start: Option<u32>,
    pub(crate) epochs: u32,
    pub(crate) enabled: bool,
    pub(crate) samples: [D; N],
}

impl<const N: usize, D: SampleDepth> SessionState<N, D> {
    pub(crate) fn new() -> Self {
        Self {
            index: 0,
            initial_level: Level::Low,
            start: None,
            epochs: 0,
            enabled: false,
            samples: [D::default(); N],
        }
    }

    /// Reset bookkeeping for a new session and enable recording.
    pub(crate) fn arm(&mut self, arm: ArmState) {
        self.index = arm.initial_index;
        self.initial_level = arm.initial_level;
        self.start = None;
        self.epochs = 0;
        self.enabled = true;
    }

    /// Number of retained samples, 0 while skipping.
    pub(crate) fn sample_count(&self) -> usize {
        usize::try_from(self.index).map_or(0, |idx| idx.min(N))
    }

    pub(crate) fn pending_skips(&self) -> u32 {
        if self.index < 0 {
            self.index.unsigned_abs()
        } else {
            0
        }
    }

    /// Logical index (modulo the capacity in wrapping mode) of the oldest
    /// retained sample.
    pub(crate) fn first_index(&self) -> u32 {
        u32::try_from(self.index).map_or(0, |idx| idx - self.sample_count() as u32)
    }

    /// Buffer slot holding the `idx`-th oldest retained sample.
    pub(crate) fn slot_of(&self, idx: usize, mode: IndexingMode) -> Option<usize> {
        if idx >= self.sample_count() {
            return None;
        }
        Some(match mode {
            IndexingMode::Linear => idx,
            IndexingMode::Wrapping => (self.first_index() as usize + idx) & (N - 1),
        })
    }

    /// Offset of sample `idx` from the first recorded sample.
    pub(crate) fn time_of(&self, idx: usize, mode: IndexingMode) -> Option<u32> {
        self.slot_of(idx, mode).map(|slot| self.samples[slot].offset())
    }

    pub(crate) fn timestamp_of(&self, idx: usize, mode: IndexingMode) -> Option<u32> {
        let offset = self.time_of(idx, mode)?;
        Some(self.start?.wrapping_add(offset))
    }

    /// Retained timestamps, oldest first.
    pub(crate) fn chronological(&self, mode: IndexingMode) -> Vec<u32> {
        (0..self.sample_count())
            .filter_map(|idx| self.timestamp_of(idx, mode))
            .collect()
    }
}

/// Session state plus hooks, shared by the scope and its interrupt handler.
pub(crate) struct SharedSession<const N: usize, D = u32> {
    pub(crate) config: ScopeConfig,
    state: Mutex<RefCell<SessionState<N, D>>>,
    pub(crate) hooks: CallbackDispatcher,
}

impl<const N: usize, D: SampleDepth> SharedSession<N, D> {
    pub(crate) fn new(config: ScopeConfig) -> Self {
        Self {
            config,
            state: Mutex::new(RefCell::new(SessionState::new())),
            hooks: CallbackDispatcher::new(),
        }
    }

    /// Run `f` on the state inside an existing critical section.
    pub(crate) fn with_state<R>(
        &self,
        cs: CriticalSection<'_>,
        f: impl FnOnce(&mut SessionState<N, D>) -> R,
    ) -> R {
        f(&mut *self.state.borrow_ref_mut(cs))
    }

    /// Run `f` on the state in its own critical section.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&SessionState<N, D>) -> R) -> R {
        critical_section::with(|cs| f(&*self.state.borrow_ref(cs)))
    }

    /// Record one edge at `now` and dispatch hooks.
    ///
    /// The state borrow ends before any hook runs. The critical section is
    /// short and bounded, but on hosts it is a process-wide lock, so this can
    /// wait on a main-context accessor that holds it.
    pub(crate) fn on_edge(&self, now: u32) -> HandlerAction {
        critical_section::with(|cs| {
            let outcome = self.with_state(cs, |state| state.record(now, &self.config));
            if outcome.began && self.config.begin_hook {
                self.hooks.fire(cs, HookKind::Begin);
            }
            if outcome.completed && self.config.complete_hook {
                self.hooks.fire(cs, HookKind::Complete);
            }
            if outcome.detach {
                HandlerAction::Detach
            } else {
                HandlerAction::Keep
            }
        })
    }
}
