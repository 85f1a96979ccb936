use core::cell::RefCell;
use critical_section::{CriticalSection, Mutex};

/// User callback fired from interrupt context.
///
/// Hooks must be short and must not block: while a hook runs, further edges on
/// the line are held off and may be coalesced by the platform.
pub type Hook = Box<dyn FnMut() + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Begin,
    Complete,
}

#[derive(Default)]
struct HookSlots {
    begin: Option<Hook>,
    complete: Option<Hook>,
}

impl HookSlots {
    fn slot(&mut self, kind: HookKind) -> &mut Option<Hook> {
        match kind {
            HookKind::Begin => &mut self.begin,
            HookKind::Complete => &mut self.complete,
        }
    }

    fn slot_ref(&self, kind: HookKind) -> &Option<Hook> {
        match kind {
            HookKind::Begin => &self.begin,
            HookKind::Complete => &self.complete,
        }
    }
}

/// Holds at most one begin and one complete hook.
pub(crate) struct CallbackDispatcher {
    slots: Mutex<RefCell<HookSlots>>,
}

impl CallbackDispatcher {
    pub(crate) fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new(HookSlots::default())),
        }
    }

    /// Replace (or clear, with `None`) the hook of `kind`.
    pub(crate) fn set(&self, cs: CriticalSection<'_>, kind: HookKind, hook: Option<Hook>) {
        *self.slots.borrow_ref_mut(cs).slot(kind) = hook;
    }

    pub(crate) fn is_set(&self, cs: CriticalSection<'_>, kind: HookKind) -> bool {
        self.slots.borrow_ref(cs).slot_ref(kind).is_some()
    }

    /// Invoke the hook of `kind`, if any.
    ///
    /// The hook is taken out of its slot for the duration of the call so that it
    /// can itself query the scope or register hooks without a double borrow. It
    /// is put back only if nothing was registered in the meantime.
    pub(crate) fn fire(&self, cs: CriticalSection<'_>, kind: HookKind) {
        let hook = self.slots.borrow_ref_mut(cs).slot(kind).take();
        if let Some(mut hook) = hook {
            hook();
            let mut slots = self.slots.borrow_ref_mut(cs);
            let slot = slots.slot(kind);
            if slot.is_none() {
                *slot = Some(hook);
            }
        }
    }
}
