//! Timer state machine
//!
//! `Idle` (initial) -> `Running` on start, `Running` -> `Stopped` on stop, any
//! state -> `Idle` on reset. There is no terminal state.
//!
//! The controller exclusively owns one [`TickSource`]. Every transition that
//! leaves `Running` disarms it before returning, and every arming gets a fresh
//! [`TickEpoch`] so a tick belonging to an earlier arming is discarded.

use std::time::Duration;

use crate::types::TimerState;

/// Callback invoked by a tick source once per period
pub type TickFn = Box<dyn FnMut()>;

/// Periodic callback driver.
///
/// At most one callback is armed at a time; arming replaces any previous one.
/// `disarm` must be synchronous: once it returns, the callback of the previous
/// arming is never invoked again.
pub trait TickSource {
    fn arm(&mut self, period: Duration, on_tick: TickFn);

    fn disarm(&mut self);

    fn is_armed(&self) -> bool;
}

/// Arming generation a tick belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TickEpoch(u64);

/// Elapsed-time state machine driving one tick source
pub struct TimerController {
    state: TimerState,
    elapsed_seconds: u64,
    period: Duration,
    epoch: TickEpoch,
    ticker: Box<dyn TickSource>,
    disposed: bool,
}

impl TimerController {
    pub fn new(ticker: Box<dyn TickSource>, period: Duration) -> Self {
        Self {
            state: TimerState::Idle,
            elapsed_seconds: 0,
            period,
            epoch: TickEpoch::default(),
            ticker,
            disposed: false,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn epoch(&self) -> TickEpoch {
        self.epoch
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_armed()
    }

    /// Idle/Stopped -> Running. Resumes from the retained elapsed value.
    ///
    /// `make_handler` receives the epoch of this arming and builds the tick
    /// callback, which should route back to [`TimerController::tick`] with
    /// that epoch. Returns `false` (no-op) when already running or disposed.
    pub fn start<F>(&mut self, make_handler: F) -> bool
    where
        F: FnOnce(TickEpoch) -> TickFn,
    {
        if self.disposed || self.state == TimerState::Running {
            return false;
        }

        self.ticker.disarm();
        self.epoch = TickEpoch(self.epoch.0.wrapping_add(1));
        self.ticker.arm(self.period, make_handler(self.epoch));
        self.state = TimerState::Running;
        tracing::debug!(epoch = self.epoch.0, elapsed = self.elapsed_seconds, "timer started");
        true
    }

    /// Running -> Stopped. Elapsed time is retained. Returns `false` (no-op)
    /// from any other state.
    pub fn stop(&mut self) -> bool {
        if self.state != TimerState::Running {
            return false;
        }

        self.ticker.disarm();
        self.state = TimerState::Stopped;
        tracing::debug!(elapsed = self.elapsed_seconds, "timer stopped");
        true
    }

    /// Any state -> Idle with elapsed time zeroed. Always succeeds unless the
    /// controller was disposed.
    pub fn reset(&mut self) -> bool {
        if self.disposed {
            return false;
        }

        self.ticker.disarm();
        self.state = TimerState::Idle;
        self.elapsed_seconds = 0;
        tracing::debug!("timer reset");
        true
    }

    /// Count one elapsed second. Ticks from a stale epoch, or arriving while
    /// not running, are discarded and return `false`.
    pub fn tick(&mut self, epoch: TickEpoch) -> bool {
        if self.disposed || self.state != TimerState::Running || epoch != self.epoch {
            tracing::debug!(epoch = epoch.0, current = self.epoch.0, "discarding stale tick");
            return false;
        }

        self.elapsed_seconds += 1;
        true
    }

    /// Permanently release the tick source. A running timer is frozen as
    /// `Stopped`; later transitions are no-ops and the elapsed value stays
    /// readable.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.ticker.disarm();
        if self.state == TimerState::Running {
            self.state = TimerState::Stopped;
        }
        self.disposed = true;
    }
}

impl Drop for TimerController {
    fn drop(&mut self) {
        self.ticker.disarm();
    }
}
