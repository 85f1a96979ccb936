use std::sync::Arc;

use crate::callbacks::{Hook, HookKind};
use crate::capture::{Capture, CaptureError};
use crate::config::{ScopeConfig, ScopeConfigError};
use crate::edge::{self, Edge, Level};
use crate::interrupt::{EdgeInterrupts, EdgeMode, MicrosClock};
use crate::recorder::SampleRecorder;
use crate::sample::SampleDepth;
use crate::session::SharedSession;
use crate::trigger_config::{arm, TriggerMode};

/// Software scope recording edge timestamps of one digital input line.
///
/// `N` is the buffer capacity and `D` the storage type of one sample (see
/// [`SampleDepth`]). The scope is constructed inert; [`start`]
/// binds an interrupt handler and arms the trigger, [`stop`] unbinds it.
/// Per-sample accessors are meant to be used once the scope is stopped (or
/// the buffer is complete). While armed they return whatever the interrupt
/// routine has committed so far, which may be stale by the time it is used.
///
/// Edges arriving faster than the platform can run the handler may be
/// coalesced, and an edge racing [`stop`] may or may not be recorded.
/// Timestamps are taken from a 32-bit microsecond clock; captures spanning
/// more than 2^32 µs (about 71 minutes) are not corrected.
///
/// [`start`]: DigitalScope::start
/// [`stop`]: DigitalScope::stop
pub struct DigitalScope<A: EdgeInterrupts, C, const N: usize, D: SampleDepth = u32> {
    line: A::Line,
    interrupts: A,
    clock: C,
    session: Arc<SharedSession<N, D>>,
    handle: Option<A::Handle>,
}

impl<A, C, const N: usize, D> DigitalScope<A, C, N, D>
where
    A: EdgeInterrupts,
    C: MicrosClock + Clone + Send + 'static,
    D: SampleDepth,
{
    /// Create an inert scope for `line`.
    pub fn new(
        interrupts: A,
        clock: C,
        line: A::Line,
        config: ScopeConfig,
    ) -> Result<Self, ScopeConfigError> {
        if let Err(e) = config.validate(N) {
            log::debug!("Rejecting scope configuration for {:?}: {}", line, e);
            return Err(e);
        }

        log::debug!(
            "Scope on {:?}: capacity {}, {} buffer, offsets up to {} us",
            line,
            N,
            config.mode.as_str(),
            D::MAX_OFFSET
        );

        Ok(Self {
            line,
            interrupts,
            clock,
            session: Arc::new(SharedSession::new(config)),
            handle: None,
        })
    }

    /// Arm the scope. Does nothing if it is already armed.
    ///
    /// Reading the line level, committing the arming state and binding the
    /// handler happen in one critical section, so an edge arriving right after
    /// the level read is counted against the right level.
    pub fn start(&mut self, trigger: TriggerMode) {
        let armed = critical_section::with(|cs| {
            if self.session.with_state(cs, |state| state.enabled) {
                return None;
            }

            // A linear capture that completed without auto-stop is still bound.
            if let Some(handle) = self.handle.take() {
                self.interrupts.detach(handle);
            }

            let arm_state = arm(trigger, self.interrupts.read_level(self.line));
            self.session.with_state(cs, |state| state.arm(arm_state));

            let mut recorder = SampleRecorder::new(Arc::clone(&self.session), self.clock.clone());
            self.handle = Some(self.interrupts.attach(
                self.line,
                EdgeMode::AnyChange,
                Box::new(move || recorder.on_edge()),
            ));

            Some(arm_state)
        });

        match armed {
            Some(arm_state) => log::debug!(
                "Armed scope on {:?}: trigger {}, skipping {} edge(s)",
                self.line,
                trigger.as_str(),
                arm_state.skips()
            ),
            None => log::debug!("Scope on {:?} already armed", self.line),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.session.read(|state| state.enabled)
    }

    /// Number of retained samples. Never exceeds `N`.
    pub fn sample_count(&self) -> usize {
        self.session.read(|state| state.sample_count())
    }

    /// Whether all `N` slots hold samples. In linear mode this is the
    /// completion condition.
    pub fn is_full(&self) -> bool {
        self.sample_count() == N
    }

    /// Number of times the buffer was filled this session (at most 1 in
    /// linear mode, once per wrap in wrapping mode).
    pub fn completions(&self) -> u32 {
        self.session.read(|state| state.epochs)
    }

    /// Alignment edges still to be consumed before recording starts.
    pub fn pending_skips(&self) -> u32 {
        self.session.read(|state| state.pending_skips())
    }

    /// Absolute timestamp of sample `idx` (0 = oldest retained).
    pub fn timestamp_of(&self, idx: usize) -> Option<u32> {
        let mode = self.session.config.mode;
        self.session.read(|state| state.timestamp_of(idx, mode))
    }

    /// Time of sample `idx` in microseconds since the first recorded sample,
    /// truncated to the sample depth.
    pub fn time_of(&self, idx: usize) -> Option<u32> {
        let mode = self.session.config.mode;
        self.session.read(|state| state.time_of(idx, mode))
    }

    pub fn edge_of(&self, idx: usize) -> Option<Edge> {
        self.logical_index(idx)
            .map(|(logical, initial)| edge::edge_of(logical, initial))
    }

    /// Level of the line after sample `idx`.
    pub fn level_of(&self, idx: usize) -> Option<Level> {
        self.logical_index(idx)
            .map(|(logical, initial)| edge::level_of(logical, initial))
    }

    fn logical_index(&self, idx: usize) -> Option<(u32, Level)> {
        self.session.read(|state| {
            (idx < state.sample_count())
                .then(|| (state.first_index().wrapping_add(idx as u32), state.initial_level))
        })
    }

    /// Absolute timestamp of the first recorded sample of the session.
    pub fn start_time(&self) -> Option<u32> {
        self.session.read(|state| state.start)
    }

    /// Level reached by the first recorded sample. For rising triggers this
    /// is always high, for falling triggers always low.
    pub fn initial_level(&self) -> Level {
        self.session.read(|state| state.initial_level)
    }

    /// Level of the line just before the first recorded sample.
    pub fn idle_level(&self) -> Level {
        !self.initial_level()
    }

    /// Copy the recorded samples out of a stopped scope.
    pub fn capture(&self) -> Result<Capture, CaptureError> {
        let mode = self.session.config.mode;
        self.session.read(|state| {
            if state.enabled {
                return Err(CaptureError::StillArmed);
            }
            Ok(Capture::new(
                state.initial_level,
                state.first_index(),
                state.start,
                state.epochs,
                state.chronological(mode),
            ))
        })
    }

    /// Register the hook fired from interrupt context at the first recorded
    /// sample. Ignored (returns `false`) while armed or when begin hooks are
    /// disabled in the configuration.
    pub fn set_begin_hook<F>(&mut self, hook: F) -> bool
    where
        F: FnMut() + Send + 'static,
    {
        self.replace_hook(HookKind::Begin, Some(Box::new(hook)))
    }

    /// Register the hook fired from interrupt context when the buffer fills.
    /// Ignored (returns `false`) while armed or when complete hooks are
    /// disabled in the configuration.
    pub fn set_complete_hook<F>(&mut self, hook: F) -> bool
    where
        F: FnMut() + Send + 'static,
    {
        self.replace_hook(HookKind::Complete, Some(Box::new(hook)))
    }

    pub fn clear_begin_hook(&mut self) -> bool {
        self.replace_hook(HookKind::Begin, None)
    }

    pub fn clear_complete_hook(&mut self) -> bool {
        self.replace_hook(HookKind::Complete, None)
    }

    pub fn has_hook(&self, kind: HookKind) -> bool {
        critical_section::with(|cs| self.session.hooks.is_set(cs, kind))
    }

    fn replace_hook(&mut self, kind: HookKind, hook: Option<Hook>) -> bool {
        let enabled = match kind {
            HookKind::Begin => self.session.config.begin_hook,
            HookKind::Complete => self.session.config.complete_hook,
        };
        if !enabled {
            log::debug!("Ignoring {:?} hook: disabled in configuration", kind);
            return false;
        }

        let accepted = critical_section::with(|cs| {
            if self.session.with_state(cs, |state| state.enabled) {
                return false;
            }
            self.session.hooks.set(cs, kind, hook);
            true
        });
        if !accepted {
            log::debug!("Ignoring {:?} hook: scope on {:?} is armed", kind, self.line);
        }
        accepted
    }

    pub fn config(&self) -> ScopeConfig {
        self.session.config
    }

    pub fn capacity(&self) -> usize {
        N
    }
}

impl<A: EdgeInterrupts, C, const N: usize, D: SampleDepth> DigitalScope<A, C, N, D> {
    pub fn line(&self) -> A::Line {
        self.line
    }

    /// Disarm the scope and unbind its handler. Idempotent.
    pub fn stop(&mut self) {
        let was_bound = critical_section::with(|cs| {
            self.session.with_state(cs, |state| state.enabled = false);
            match self.handle.take() {
                Some(handle) => {
                    self.interrupts.detach(handle);
                    true
                }
                None => false,
            }
        });
        if was_bound {
            log::debug!("Stopped scope on {:?}", self.line);
        }
    }
}

impl<A: EdgeInterrupts, C, const N: usize, D: SampleDepth> Drop for DigitalScope<A, C, N, D> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimClock, SimulatedLine};
    use std::sync::atomic::{AtomicU32, Ordering};

    const PIN: u8 = 3;

    type Scope<const N: usize> = DigitalScope<SimulatedLine, SimClock, N>;

    fn scope<const N: usize>(level: Level, config: ScopeConfig) -> (Scope<N>, SimulatedLine) {
        let line = SimulatedLine::new(PIN, level);
        let scope = Scope::<N>::new(line.clone(), line.clock(), PIN, config).unwrap();
        (scope, line)
    }

    fn counter() -> (Arc<AtomicU32>, impl FnMut() + Send + 'static) {
        let count = Arc::new(AtomicU32::new(0));
        let inner = Arc::clone(&count);
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_new_scope_is_inert() {
        let (scope, line) = scope::<4>(Level::Low, ScopeConfig::linear());
        assert!(!scope.is_armed());
        assert!(!line.is_attached());
        assert_eq!(scope.sample_count(), 0);
        assert_eq!(scope.start_time(), None);
        assert_eq!(scope.capacity(), 4);
    }

    #[test]
    fn test_rejects_non_power_of_two_wrapping() {
        let line = SimulatedLine::new(PIN, Level::Low);
        let result = Scope::<6>::new(line.clone(), line.clock(), PIN, ScopeConfig::wrapping());
        assert!(matches!(
            result,
            Err(ScopeConfigError::NotPowerOfTwo { capacity: 6 })
        ));
    }

    #[test]
    fn test_linear_change_scenario() {
        let (mut scope, line) = scope::<4>(Level::Low, ScopeConfig::linear());
        let (completed, hook) = counter();
        assert!(scope.set_complete_hook(hook));

        scope.start(TriggerMode::Change);
        assert!(scope.is_armed());
        assert!(line.is_attached());

        for (n, t) in [100, 250, 400, 900].into_iter().enumerate() {
            line.toggle_at(t);
            assert_eq!(scope.sample_count(), n + 1);
        }
        assert!(scope.is_full());
        assert_eq!(completed.load(Ordering::SeqCst), 1);
        assert!(!scope.is_armed());

        line.toggle_at(1200);
        assert_eq!(scope.sample_count(), 4);
        assert_eq!(completed.load(Ordering::SeqCst), 1);

        scope.stop();
        assert_eq!(scope.start_time(), Some(100));
        assert_eq!(scope.time_of(1), Some(150));
        assert_eq!(scope.timestamp_of(1), Some(250));
        assert_eq!(scope.level_of(0), Some(Level::High));
        assert_eq!(scope.level_of(1), Some(Level::Low));
        assert_eq!(scope.level_of(2), Some(Level::High));
        assert_eq!(scope.level_of(3), Some(Level::Low));
        assert_eq!(scope.edge_of(0), Some(Edge::Rising));
        assert_eq!(scope.idle_level(), Level::Low);
        assert_eq!(scope.completions(), 1);
    }

    #[test]
    fn test_rising_trigger_skips_falling_edge() {
        let (mut scope, line) = scope::<4>(Level::High, ScopeConfig::linear());
        let (began, hook) = counter();
        assert!(scope.set_begin_hook(hook));

        scope.start(TriggerMode::Rising);
        assert_eq!(scope.pending_skips(), 1);

        line.toggle_at(10);
        assert_eq!(scope.sample_count(), 0);
        assert_eq!(began.load(Ordering::SeqCst), 0);

        line.toggle_at(30);
        assert_eq!(scope.sample_count(), 1);
        assert_eq!(began.load(Ordering::SeqCst), 1);
        assert_eq!(scope.level_of(0), Some(Level::High));
        assert_eq!(scope.start_time(), Some(30));

        line.toggle_at(50);
        assert_eq!(began.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_falling_trigger_from_high_records_first_edge() {
        let (mut scope, line) = scope::<4>(Level::High, ScopeConfig::linear());
        scope.start(TriggerMode::Falling);
        assert_eq!(scope.pending_skips(), 0);
        line.toggle_at(5);
        assert_eq!(scope.edge_of(0), Some(Edge::Falling));
        assert_eq!(scope.initial_level(), Level::Low);
    }

    #[test]
    fn test_out_of_range_accessors_return_none() {
        let (mut scope, line) = scope::<4>(Level::Low, ScopeConfig::linear());
        scope.start(TriggerMode::Change);
        line.toggle_at(7);
        scope.stop();

        assert_eq!(scope.time_of(1), None);
        assert_eq!(scope.timestamp_of(4), None);
        assert_eq!(scope.edge_of(1), None);
        assert_eq!(scope.level_of(100), None);
    }

    #[test]
    fn test_start_is_idempotent_while_armed() {
        let (mut scope, line) = scope::<4>(Level::Low, ScopeConfig::linear());
        scope.start(TriggerMode::Change);
        line.toggle_at(1);
        scope.start(TriggerMode::Rising);
        assert_eq!(scope.sample_count(), 1);
        assert_eq!(scope.level_of(0), Some(Level::High));
    }

    #[test]
    fn test_stop_detaches_and_is_idempotent() {
        let (mut scope, line) = scope::<4>(Level::Low, ScopeConfig::linear());
        scope.start(TriggerMode::Change);
        scope.stop();
        scope.stop();
        assert!(!scope.is_armed());
        assert!(!line.is_attached());

        line.toggle_at(5);
        assert_eq!(scope.sample_count(), 0);
        assert_eq!(line.ignored_edges(), 1);
    }

    #[test]
    fn test_restart_resets_session() {
        let (mut scope, line) = scope::<2>(Level::Low, ScopeConfig::linear());
        scope.start(TriggerMode::Change);
        line.toggle_all(&[1, 2]);
        assert!(scope.is_full());

        // Line is low again after two toggles.
        scope.start(TriggerMode::Falling);
        assert!(scope.is_armed());
        assert_eq!(scope.sample_count(), 0);
        assert_eq!(scope.start_time(), None);
        assert_eq!(scope.pending_skips(), 1);

        line.toggle_all(&[10, 20]);
        assert_eq!(scope.sample_count(), 1);
        assert_eq!(scope.start_time(), Some(20));
        assert_eq!(scope.level_of(0), Some(Level::Low));
    }

    #[test]
    fn test_hooks_ignored_while_armed() {
        let (mut scope, line) = scope::<2>(Level::Low, ScopeConfig::linear());
        scope.start(TriggerMode::Change);
        let (count, hook) = counter();
        assert!(!scope.set_complete_hook(hook));
        assert!(!scope.clear_begin_hook());

        line.toggle_all(&[1, 2]);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_disabled_hook_is_never_stored() {
        let config = ScopeConfig::linear().with_begin_hook(false);
        let (mut scope, line) = scope::<2>(Level::Low, config);
        let (count, hook) = counter();
        assert!(!scope.set_begin_hook(hook));
        assert!(!scope.has_hook(HookKind::Begin));

        scope.start(TriggerMode::Change);
        line.toggle_at(1);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_begin_fires_once_per_session() {
        let (mut scope, line) = scope::<8>(Level::Low, ScopeConfig::linear());
        let (began, hook) = counter();
        scope.set_begin_hook(hook);

        scope.start(TriggerMode::Change);
        line.toggle_all(&[1, 2, 3]);
        scope.stop();
        assert_eq!(began.load(Ordering::SeqCst), 1);

        scope.start(TriggerMode::Change);
        line.toggle_all(&[4, 5]);
        scope.stop();
        assert_eq!(began.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_auto_stop_unbinds_handler() {
        let config = ScopeConfig::linear().with_auto_stop(true);
        let (mut scope, line) = scope::<2>(Level::Low, config);
        scope.start(TriggerMode::Change);
        line.toggle_all(&[1, 2]);
        assert!(!line.is_attached());
        assert!(!scope.is_armed());

        line.toggle_at(3);
        assert_eq!(line.ignored_edges(), 1);
        scope.stop();
    }

    #[test]
    fn test_wrapping_keeps_latest_window() {
        let (mut scope, line) = scope::<4>(Level::Low, ScopeConfig::wrapping());
        let (completed, hook) = counter();
        scope.set_complete_hook(hook);
        scope.start(TriggerMode::Change);

        // N + k edges with k = 3.
        let times: Vec<u32> = (1..=7).map(|t| t * 10).collect();
        line.toggle_all(&times);
        assert!(scope.is_armed());
        assert_eq!(completed.load(Ordering::SeqCst), 1);

        scope.stop();
        let recent: Vec<_> = (0..4).filter_map(|i| scope.timestamp_of(i)).collect();
        assert_eq!(recent, [40, 50, 60, 70]);
        assert_eq!(scope.time_of(0), Some(30));
        // Fourth transition from low ends low.
        assert_eq!(scope.level_of(0), Some(Level::Low));
        assert_eq!(scope.level_of(1), Some(Level::High));
        assert_eq!(scope.completions(), 1);
    }

    #[test]
    fn test_wrapping_auto_stop_unbinds_at_first_wrap() {
        let config = ScopeConfig::wrapping().with_auto_stop(true);
        let (mut scope, line) = scope::<4>(Level::Low, config);
        let (completed, hook) = counter();
        scope.set_complete_hook(hook);
        scope.start(TriggerMode::Change);

        line.toggle_all(&[10, 20, 30]);
        assert!(line.is_attached());
        line.toggle_at(40);
        assert!(!line.is_attached());
        assert!(!scope.is_armed());
        assert_eq!(completed.load(Ordering::SeqCst), 1);

        line.toggle_at(50);
        assert_eq!(line.ignored_edges(), 1);
        assert_eq!(completed.load(Ordering::SeqCst), 1);
        assert_eq!(scope.completions(), 1);
        assert_eq!(scope.timestamp_of(3), Some(40));
    }

    #[test]
    fn test_wrapping_hook_fires_every_epoch() {
        let (mut scope, line) = scope::<4>(Level::Low, ScopeConfig::wrapping());
        let (completed, hook) = counter();
        scope.set_complete_hook(hook);
        scope.start(TriggerMode::Change);

        // 2N + k edges with k = 3.
        let times: Vec<u32> = (1..=11).map(|t| t * 10).collect();
        line.toggle_all(&times);
        assert!(scope.is_armed());
        assert_eq!(completed.load(Ordering::SeqCst), 2);
        assert_eq!(scope.completions(), 2);

        scope.stop();
        let recent: Vec<_> = (0..4).filter_map(|i| scope.timestamp_of(i)).collect();
        assert_eq!(recent, [80, 90, 100, 110]);
        // Eighth transition from low ends low.
        assert_eq!(scope.level_of(0), Some(Level::Low));
        assert!(scope.has_hook(HookKind::Complete));
    }

    #[test]
    fn test_narrow_depth_records_relative_offsets() {
        let line = SimulatedLine::new(PIN, Level::Low);
        let mut scope: DigitalScope<_, _, 4, u16> =
            DigitalScope::new(line.clone(), line.clock(), PIN, ScopeConfig::linear()).unwrap();
        scope.start(TriggerMode::Change);
        line.toggle_all(&[5_000_000, 5_000_120, 5_065_636]);
        scope.stop();

        assert_eq!(scope.start_time(), Some(5_000_000));
        assert_eq!(scope.time_of(1), Some(120));
        assert_eq!(scope.timestamp_of(1), Some(5_000_120));
        // 65 636 us exceeds u16 and wraps to 100.
        assert_eq!(scope.time_of(2), Some(100));

        let capture = scope.capture().unwrap();
        assert_eq!(capture.timestamps(), [5_000_000, 5_000_120, 5_000_100]);
    }

    #[test]
    fn test_capture_requires_stopped_scope() {
        let (mut scope, line) = scope::<4>(Level::High, ScopeConfig::linear());
        scope.start(TriggerMode::Change);
        line.toggle_all(&[5, 15]);
        assert_eq!(scope.capture(), Err(CaptureError::StillArmed));

        scope.stop();
        let capture = scope.capture().unwrap();
        assert_eq!(capture.len(), 2);
        assert_eq!(capture.initial_level(), Level::Low);
        assert_eq!(capture.get(1).unwrap().time, 10);
    }

    #[test]
    fn test_drop_detaches() {
        let line = SimulatedLine::new(PIN, Level::Low);
        {
            let mut scope =
                Scope::<4>::new(line.clone(), line.clock(), PIN, ScopeConfig::linear()).unwrap();
            scope.start(TriggerMode::Change);
            assert!(line.is_attached());
        }
        assert!(!line.is_attached());
    }
}
