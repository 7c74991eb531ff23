use crate::channel::{Channel, SubscriptionId, dispatch};
use gazeland_common::EntityId;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// The two purposes sharing the dwell timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DwellMode {
    Select,
    Teleport,
}

impl std::fmt::Display for DwellMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Select => f.write_str("select"),
            Self::Teleport => f.write_str("teleport"),
        }
    }
}

/// Payload of a completion event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DwellCompletion {
    pub mode: DwellMode,
    /// Threshold that was reached, in seconds.
    pub threshold: f32,
    /// Target that claimed the dwell, if it was started through [`DwellTimer::claim`].
    pub holder: Option<EntityId>,
}

/// Errors from dwell operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DwellError {
    #[error("dwell timer busy: {active} dwell in progress, {requested} rejected")]
    Busy {
        active: DwellMode,
        requested: DwellMode,
    },
}

/// Receives the dwell indicator: a fill fraction and the container visibility.
pub trait IndicatorSink {
    fn set_fill(&mut self, fill: f32);
    fn set_visible(&mut self, visible: bool);
}

impl<T: IndicatorSink> IndicatorSink for Rc<RefCell<T>> {
    fn set_fill(&mut self, fill: f32) {
        self.borrow_mut().set_fill(fill);
    }

    fn set_visible(&mut self, visible: bool) {
        self.borrow_mut().set_visible(visible);
    }
}

/// Plain indicator that just remembers the last values it was given.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndicatorState {
    pub fill: f32,
    pub visible: bool,
}

impl IndicatorSink for IndicatorState {
    fn set_fill(&mut self, fill: f32) {
        self.fill = fill;
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

/// Per-mode dwell durations in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub select: f32,
    pub teleport: f32,
}

impl Thresholds {
    pub fn get(&self, mode: DwellMode) -> f32 {
        match mode {
            DwellMode::Select => self.select,
            DwellMode::Teleport => self.teleport,
        }
    }

    fn set(&mut self, mode: DwellMode, seconds: f32) {
        match mode {
            DwellMode::Select => self.select = seconds,
            DwellMode::Teleport => self.teleport = seconds,
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            select: 2.5,
            teleport: 2.5,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveDwell {
    mode: DwellMode,
    holder: Option<EntityId>,
}

struct TimerState {
    active: Option<ActiveDwell>,
    elapsed: f32,
    thresholds: Thresholds,
    fill: f32,
    indicator_visible: bool,
    sink: Option<Box<dyn IndicatorSink>>,
    warned_missing_sink: bool,
}

impl TimerState {
    fn publish_fill(&mut self, fill: f32) {
        self.fill = fill;
        if let Some(sink) = self.sink.as_mut() {
            sink.set_fill(fill);
        }
    }

    fn publish_visible(&mut self, visible: bool) {
        self.indicator_visible = visible;
        match self.sink.as_mut() {
            Some(sink) => sink.set_visible(visible),
            None if visible && !self.warned_missing_sink => {
                self.warned_missing_sink = true;
                tracing::warn!("no dwell indicator bound; progress is tracked but not shown");
            }
            None => {}
        }
    }

    fn begin(&mut self, mode: DwellMode, holder: Option<EntityId>) -> Result<(), DwellError> {
        if let Some(active) = self.active {
            let other_holder = matches!(
                (active.holder, holder),
                (Some(current), Some(requested)) if current != requested
            );
            if active.mode != mode || other_holder {
                return Err(DwellError::Busy {
                    active: active.mode,
                    requested: mode,
                });
            }
        }
        let holder = holder.or(self.active.and_then(|a| a.holder));
        self.active = Some(ActiveDwell { mode, holder });
        self.elapsed = 0.0;
        self.publish_fill(0.0);
        self.publish_visible(true);
        tracing::debug!(%mode, threshold = self.thresholds.get(mode), "dwell started");
        Ok(())
    }

    fn stop(&mut self) {
        self.active = None;
        self.elapsed = 0.0;
        self.publish_visible(false);
        self.publish_fill(0.0);
    }

    fn advance(&mut self, delta: f32) -> Option<DwellCompletion> {
        let delta = if delta.is_finite() && delta > 0.0 {
            delta
        } else {
            0.0
        };
        let Some(active) = self.active else {
            self.publish_fill(0.0);
            return None;
        };

        self.elapsed += delta;
        let threshold = self.thresholds.get(active.mode);
        if self.elapsed >= threshold {
            self.stop();
            tracing::debug!(mode = %active.mode, threshold, "dwell completed");
            return Some(DwellCompletion {
                mode: active.mode,
                threshold,
                holder: active.holder,
            });
        }

        let fill = (self.elapsed / threshold).clamp(0.0, 1.0);
        self.publish_fill(fill);
        None
    }
}

/// Shared dwell timer.
///
/// One instance serves the whole scene; targets receive a clone of the handle
/// at construction. All methods take `&self` and release their internal
/// borrow before dispatching completions, so handlers may call back into the
/// timer.
#[derive(Clone)]
pub struct DwellTimer {
    state: Rc<RefCell<TimerState>>,
    selection: Channel<DwellCompletion>,
    teleport: Channel<DwellCompletion>,
}

impl DwellTimer {
    pub fn new() -> Self {
        Self::with_thresholds(Thresholds::default())
    }

    pub fn with_thresholds(thresholds: Thresholds) -> Self {
        let thresholds = Thresholds {
            select: sanitize_threshold(thresholds.select),
            teleport: sanitize_threshold(thresholds.teleport),
        };
        Self {
            state: Rc::new(RefCell::new(TimerState {
                active: None,
                elapsed: 0.0,
                thresholds,
                fill: 0.0,
                indicator_visible: false,
                sink: None,
                warned_missing_sink: false,
            })),
            selection: Channel::new(),
            teleport: Channel::new(),
        }
    }

    /// Attach the indicator. It is immediately synced to the current state.
    pub fn bind_indicator(&self, sink: impl IndicatorSink + 'static) {
        let mut state = self.state.borrow_mut();
        state.sink = Some(Box::new(sink));
        let (fill, visible) = (state.fill, state.indicator_visible);
        state.publish_fill(fill);
        state.publish_visible(visible);
    }

    /// Set the duration for `mode`. An in-progress dwell of another mode is
    /// untouched; one of the same mode continues against the new threshold.
    pub fn configure(&self, mode: DwellMode, seconds: f32) {
        self.state
            .borrow_mut()
            .thresholds
            .set(mode, sanitize_threshold(seconds));
    }

    pub fn threshold(&self, mode: DwellMode) -> f32 {
        self.state.borrow().thresholds.get(mode)
    }

    /// Begin accumulating for `mode`.
    ///
    /// The first caller holds the timer until cancel or completion: starting a
    /// different mode meanwhile fails with [`DwellError::Busy`]. Restarting
    /// the active mode re-zeros elapsed time.
    pub fn start(&self, mode: DwellMode) -> Result<(), DwellError> {
        self.state.borrow_mut().begin(mode, None)
    }

    /// Like [`start`](Self::start), but records `holder` so the completion
    /// can be routed back to it. A claim by a different holder is rejected.
    pub fn claim(&self, mode: DwellMode, holder: EntityId) -> Result<(), DwellError> {
        self.state.borrow_mut().begin(mode, Some(holder))
    }

    /// Stop the dwell if `mode` is the active one. Returns whether it was.
    pub fn cancel(&self, mode: DwellMode) -> bool {
        let mut state = self.state.borrow_mut();
        match state.active {
            Some(active) if active.mode == mode => {
                state.stop();
                tracing::debug!(%mode, "dwell cancelled");
                true
            }
            _ => false,
        }
    }

    /// Like [`cancel`](Self::cancel), but only if `holder` owns the dwell.
    pub fn release(&self, mode: DwellMode, holder: EntityId) -> bool {
        let owned = self.state.borrow().active.is_some_and(|active| {
            active.mode == mode && active.holder.is_none_or(|h| h == holder)
        });
        owned && self.cancel(mode)
    }

    /// Advance by `delta` seconds. Negative or non-finite deltas count as zero.
    ///
    /// Returns the completion that fired this tick, after every subscriber of
    /// that mode's channel has run.
    pub fn tick(&self, delta: f32) -> Option<DwellCompletion> {
        let selection = self.selection.snapshot();
        let teleport = self.teleport.snapshot();

        let completion = self.state.borrow_mut().advance(delta)?;
        let handlers = match completion.mode {
            DwellMode::Select => &selection,
            DwellMode::Teleport => &teleport,
        };
        let delivered = dispatch(handlers, &completion);
        tracing::trace!(mode = %completion.mode, delivered, "completion dispatched");
        Some(completion)
    }

    /// Completion channel for `mode`.
    pub fn completions(&self, mode: DwellMode) -> &Channel<DwellCompletion> {
        match mode {
            DwellMode::Select => &self.selection,
            DwellMode::Teleport => &self.teleport,
        }
    }

    pub fn subscribe(
        &self,
        mode: DwellMode,
        handler: impl Fn(&DwellCompletion) + 'static,
    ) -> SubscriptionId {
        self.completions(mode).subscribe(handler)
    }

    pub fn unsubscribe(&self, mode: DwellMode, id: SubscriptionId) -> bool {
        self.completions(mode).unsubscribe(id)
    }

    pub fn active_mode(&self) -> Option<DwellMode> {
        self.state.borrow().active.map(|a| a.mode)
    }

    pub fn holder(&self) -> Option<EntityId> {
        self.state.borrow().active.and_then(|a| a.holder)
    }

    /// Seconds accumulated by the active dwell.
    pub fn elapsed(&self) -> f32 {
        self.state.borrow().elapsed
    }

    /// Last published fill fraction, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        self.state.borrow().fill
    }

    pub fn indicator_visible(&self) -> bool {
        self.state.borrow().indicator_visible
    }
}

impl Default for DwellTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DwellTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("DwellTimer")
            .field("mode", &state.active.map(|a| a.mode))
            .field("elapsed", &state.elapsed)
            .field("thresholds", &state.thresholds)
            .field("indicator_visible", &state.indicator_visible)
            .finish()
    }
}

/// Negative and non-finite thresholds become zero, which completes on the
/// next tick.
fn sanitize_threshold(seconds: f32) -> f32 {
    if !seconds.is_finite() || seconds < 0.0 {
        tracing::warn!(seconds, "invalid dwell threshold, treating as zero");
        0.0
    } else {
        seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    fn counter(timer: &DwellTimer, mode: DwellMode) -> Rc<Cell<u32>> {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        timer.subscribe(mode, move |_| h.set(h.get() + 1));
        hits
    }

    #[test]
    fn select_completes_after_threshold() {
        // threshold 2.5 s, three 1.0 s ticks
        let timer = DwellTimer::new();
        timer.configure(DwellMode::Select, 2.5);
        let hits = counter(&timer, DwellMode::Select);

        timer.start(DwellMode::Select).unwrap();
        assert!(timer.tick(1.0).is_none());
        assert!(approx(timer.progress(), 0.4));
        assert!(timer.tick(1.0).is_none());
        assert!(approx(timer.progress(), 0.8));
        assert_eq!(hits.get(), 0);

        let done = timer.tick(1.0).unwrap();
        assert_eq!(done.mode, DwellMode::Select);
        assert_eq!(hits.get(), 1);
        assert_eq!(timer.progress(), 0.0);
        assert_eq!(timer.elapsed(), 0.0);
        assert!(timer.active_mode().is_none());
    }

    #[test]
    fn teleport_single_large_tick() {
        let timer = DwellTimer::new();
        timer.configure(DwellMode::Teleport, 1.5);
        let teleports = counter(&timer, DwellMode::Teleport);
        let selects = counter(&timer, DwellMode::Select);

        timer.start(DwellMode::Teleport).unwrap();
        let done = timer.tick(2.0).unwrap();
        assert_eq!(done.mode, DwellMode::Teleport);
        assert_eq!(teleports.get(), 1);
        assert_eq!(selects.get(), 0);
        assert_eq!(timer.elapsed(), 0.0);
        assert!(timer.active_mode().is_none());

        // Nothing more fires without a new start.
        timer.tick(5.0);
        assert_eq!(teleports.get(), 1);
    }

    #[test]
    fn cancel_hides_indicator_and_suppresses_completion() {
        let timer = DwellTimer::new();
        timer.configure(DwellMode::Select, 2.5);
        let hits = counter(&timer, DwellMode::Select);

        timer.start(DwellMode::Select).unwrap();
        assert!(timer.indicator_visible());
        timer.tick(1.0);
        assert!(timer.cancel(DwellMode::Select));
        assert!(!timer.indicator_visible());

        for _ in 0..10 {
            timer.tick(1.0);
            assert_eq!(timer.progress(), 0.0);
        }
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn cancel_other_mode_is_noop() {
        let timer = DwellTimer::new();
        timer.start(DwellMode::Teleport).unwrap();
        assert!(!timer.cancel(DwellMode::Select));
        assert_eq!(timer.active_mode(), Some(DwellMode::Teleport));
        assert!(timer.indicator_visible());
    }

    #[test]
    fn first_caller_holds_the_timer() {
        let timer = DwellTimer::new();
        timer.start(DwellMode::Select).unwrap();
        timer.tick(1.0);
        assert_eq!(
            timer.start(DwellMode::Teleport),
            Err(DwellError::Busy {
                active: DwellMode::Select,
                requested: DwellMode::Teleport,
            })
        );
        assert_eq!(timer.active_mode(), Some(DwellMode::Select));
        assert!(approx(timer.elapsed(), 1.0));
    }

    #[test]
    fn same_mode_restart_rezeroes() {
        let timer = DwellTimer::new();
        timer.start(DwellMode::Select).unwrap();
        timer.tick(2.0);
        timer.start(DwellMode::Select).unwrap();
        assert_eq!(timer.elapsed(), 0.0);
        assert!(timer.tick(2.0).is_none());
    }

    #[test]
    fn configure_other_mode_leaves_active_dwell_alone() {
        let timer = DwellTimer::new();
        timer.configure(DwellMode::Select, 2.0);
        timer.start(DwellMode::Select).unwrap();
        timer.tick(1.0);
        timer.configure(DwellMode::Teleport, 0.1);
        assert!(approx(timer.elapsed(), 1.0));
        assert!(timer.tick(0.5).is_none());
        assert!(timer.tick(0.5).is_some());
    }

    #[test]
    fn zero_and_negative_thresholds_complete_next_tick() {
        let timer = DwellTimer::new();
        timer.configure(DwellMode::Select, -3.0);
        assert_eq!(timer.threshold(DwellMode::Select), 0.0);
        timer.start(DwellMode::Select).unwrap();
        assert!(timer.tick(0.0).is_some());

        timer.configure(DwellMode::Teleport, 0.0);
        timer.start(DwellMode::Teleport).unwrap();
        assert!(timer.tick(0.016).is_some());

        timer.configure(DwellMode::Select, f32::INFINITY);
        assert_eq!(timer.threshold(DwellMode::Select), 0.0);
        timer.start(DwellMode::Select).unwrap();
        assert!(timer.tick(0.016).is_some());
        assert!(!timer.indicator_visible());

        let timer = DwellTimer::with_thresholds(Thresholds {
            select: f32::NEG_INFINITY,
            teleport: f32::NAN,
        });
        assert_eq!(timer.threshold(DwellMode::Select), 0.0);
        assert_eq!(timer.threshold(DwellMode::Teleport), 0.0);
    }

    #[test]
    fn negative_delta_does_not_rewind() {
        let timer = DwellTimer::new();
        timer.configure(DwellMode::Select, 2.0);
        timer.start(DwellMode::Select).unwrap();
        timer.tick(1.0);
        timer.tick(-5.0);
        timer.tick(f32::NAN);
        assert!(approx(timer.elapsed(), 1.0));
        assert!(approx(timer.progress(), 0.5));
    }

    #[test]
    fn exactly_one_completion_for_many_small_ticks() {
        let timer = DwellTimer::new();
        timer.configure(DwellMode::Select, 0.7);
        let hits = counter(&timer, DwellMode::Select);
        timer.start(DwellMode::Select).unwrap();
        for _ in 0..200 {
            timer.tick(1.0 / 90.0);
        }
        assert_eq!(hits.get(), 1);
        assert_eq!(timer.elapsed(), 0.0);
    }

    #[test]
    fn claim_rejects_other_holder_and_routes_completion() {
        let timer = DwellTimer::new();
        let a = EntityId::new();
        let b = EntityId::new();
        let seen = Rc::new(Cell::new(None));
        let s = Rc::clone(&seen);
        timer.subscribe(DwellMode::Select, move |c| s.set(c.holder));

        timer.claim(DwellMode::Select, a).unwrap();
        assert!(timer.claim(DwellMode::Select, b).is_err());
        assert!(!timer.release(DwellMode::Select, b));
        assert_eq!(timer.holder(), Some(a));

        timer.configure(DwellMode::Select, 0.5);
        timer.tick(1.0);
        assert_eq!(seen.get(), Some(a));
    }

    #[test]
    fn handler_may_unsubscribe_and_restart_during_dispatch() {
        let timer = DwellTimer::new();
        timer.configure(DwellMode::Select, 1.0);
        let hits = Rc::new(Cell::new(0));
        let id_slot = Rc::new(Cell::new(None));

        let t = timer.clone();
        let h = Rc::clone(&hits);
        let slot = Rc::clone(&id_slot);
        let id = timer.subscribe(DwellMode::Select, move |_| {
            h.set(h.get() + 1);
            if let Some(id) = slot.get() {
                t.unsubscribe(DwellMode::Select, id);
            }
            t.start(DwellMode::Teleport).unwrap();
        });
        id_slot.set(Some(id));
        let other = counter(&timer, DwellMode::Select);

        timer.start(DwellMode::Select).unwrap();
        timer.tick(1.0);
        assert_eq!(hits.get(), 1);
        assert_eq!(other.get(), 1);
        assert_eq!(timer.active_mode(), Some(DwellMode::Teleport));
        assert_eq!(timer.completions(DwellMode::Select).len(), 1);
    }

    #[test]
    fn bound_indicator_follows_state() {
        let timer = DwellTimer::new();
        timer.configure(DwellMode::Select, 2.0);
        let indicator = Rc::new(RefCell::new(IndicatorState::default()));
        timer.bind_indicator(Rc::clone(&indicator));

        timer.start(DwellMode::Select).unwrap();
        assert!(indicator.borrow().visible);
        timer.tick(1.0);
        assert!(approx(indicator.borrow().fill, 0.5));

        timer.cancel(DwellMode::Select);
        assert_eq!(*indicator.borrow(), IndicatorState::default());
    }
}
