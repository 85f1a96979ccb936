//! Host-side stand-in for a GPIO line with an edge interrupt and a clock.
//!
//! Edges are injected from the calling thread and the attached handler runs
//! synchronously, the way a single interrupt vector would preempt `main`.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::edge::Level;
use crate::interrupt::{EdgeHandler, EdgeInterrupts, EdgeMode, HandlerAction, MicrosClock};

struct Binding {
    id: u64,
    mode: EdgeMode,
    /// Taken out while the handler runs.
    handler: Option<EdgeHandler>,
}

struct LineState {
    level: Level,
    binding: Option<Binding>,
}

struct SimShared {
    pin: u8,
    now: AtomicU32,
    next_id: AtomicU64,
    ignored: AtomicU32,
    line: Mutex<LineState>,
}

impl SimShared {
    fn line(&self) -> MutexGuard<'_, LineState> {
        self.line.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Capability returned by [`SimulatedLine::attach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimHandle(u64);

/// A simulated input line. Clones share the same line and clock.
#[derive(Clone)]
pub struct SimulatedLine {
    shared: Arc<SimShared>,
}

impl SimulatedLine {
    pub fn new(pin: u8, level: Level) -> Self {
        Self {
            shared: Arc::new(SimShared {
                pin,
                now: AtomicU32::new(0),
                next_id: AtomicU64::new(0),
                ignored: AtomicU32::new(0),
                line: Mutex::new(LineState {
                    level,
                    binding: None,
                }),
            }),
        }
    }

    pub fn pin(&self) -> u8 {
        self.shared.pin
    }

    pub fn level(&self) -> Level {
        self.shared.line().level
    }

    /// Force the level without raising an interrupt.
    pub fn set_level(&self, level: Level) {
        self.shared.line().level = level;
    }

    pub fn set_time(&self, micros: u32) {
        self.shared.now.store(micros, Ordering::SeqCst);
    }

    pub fn is_attached(&self) -> bool {
        self.shared.line().binding.is_some()
    }

    /// Edges that found no handler or did not match the attached edge mode.
    pub fn ignored_edges(&self) -> u32 {
        self.shared.ignored.load(Ordering::SeqCst)
    }

    /// Toggle the line at time `micros` and deliver the interrupt.
    pub fn toggle_at(&self, micros: u32) {
        self.set_time(micros);

        let taken = {
            let mut line = self.shared.line();
            line.level = !line.level;
            let new_level = line.level;
            match line.binding.as_mut() {
                Some(binding) if binding.mode.accepts(new_level) => {
                    let id = binding.id;
                    binding.handler.take().map(|handler| (id, handler))
                }
                _ => None,
            }
        };

        let Some((id, mut handler)) = taken else {
            self.shared.ignored.fetch_add(1, Ordering::SeqCst);
            return;
        };

        let action = handler();

        let mut line = self.shared.line();
        match action {
            HandlerAction::Detach => {
                if line.binding.as_ref().is_some_and(|b| b.id == id) {
                    log::trace!("Handler on pin {} detached itself", self.shared.pin);
                    line.binding = None;
                }
            }
            HandlerAction::Keep => {
                if let Some(binding) = line.binding.as_mut().filter(|b| b.id == id) {
                    binding.handler = Some(handler);
                }
            }
        }
    }

    /// Toggle the line once per timestamp.
    pub fn toggle_all(&self, times: &[u32]) {
        for &t in times {
            self.toggle_at(t);
        }
    }

    /// Clock handle sharing this line's time.
    pub fn clock(&self) -> SimClock {
        SimClock {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl EdgeInterrupts for SimulatedLine {
    type Line = u8;
    type Handle = SimHandle;

    fn attach(&mut self, line: u8, mode: EdgeMode, handler: EdgeHandler) -> SimHandle {
        debug_assert_eq!(line, self.shared.pin);
        let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst);
        log::trace!("Attaching handler {} to pin {} ({})", id, line, mode.as_str());
        self.shared.line().binding = Some(Binding {
            id,
            mode,
            handler: Some(handler),
        });
        SimHandle(id)
    }

    fn detach(&mut self, handle: SimHandle) {
        let mut line = self.shared.line();
        if line.binding.as_ref().is_some_and(|b| b.id == handle.0) {
            log::trace!("Detaching handler {} from pin {}", handle.0, self.shared.pin);
            line.binding = None;
        }
    }

    fn read_level(&self, _line: u8) -> Level {
        self.level()
    }
}

/// Clock side of a [`SimulatedLine`].
#[derive(Clone)]
pub struct SimClock {
    shared: Arc<SimShared>,
}

impl MicrosClock for SimClock {
    fn now_micros(&self) -> u32 {
        self.shared.now.load(Ordering::SeqCst)
    }
}
