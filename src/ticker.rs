//! Tick sources
//!
//! - [`IntervalTicker`]: real-time ticks from a tokio interval, spawned on the
//!   current `LocalSet`
//! - [`ManualClock`] / [`ManualTicker`]: a simulated clock advanced explicitly
//!   by the host (FFI hosts driving their own event loop) or by tests

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::timer::{TickFn, TickSource};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Tick source backed by `tokio::time::interval`.
///
/// Arming spawns a local task and must happen inside a `tokio::task::LocalSet`.
/// The first tick fires one full period after arming. Missed ticks are
/// delivered in a burst so no elapsed second is skipped.
#[derive(Default)]
pub struct IntervalTicker {
    task: Option<JoinHandle<()>>,
}

impl IntervalTicker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TickSource for IntervalTicker {
    fn arm(&mut self, period: Duration, mut on_tick: TickFn) {
        self.disarm();

        let period = period.max(MIN_PERIOD);
        let first = Instant::now() + period;
        self.task = Some(tokio::task::spawn_local(async move {
            let mut interval = time::interval_at(first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                interval.tick().await;
                on_tick();
            }
        }));
    }

    fn disarm(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn is_armed(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        self.disarm();
    }
}

type SlotId = u64;

struct Slot {
    id: SlotId,
    period: Duration,
    next_due: Duration,
    // Taken out while the callback runs
    handler: Option<TickFn>,
}

impl Slot {
    // A deadline saturated at `Duration::MAX` is never reached
    fn is_due(&self, target: Duration) -> bool {
        self.next_due <= target && self.next_due != Duration::MAX
    }
}

#[derive(Default)]
struct ClockState {
    now: Duration,
    next_id: SlotId,
    slots: Vec<Slot>,
}

/// Simulated clock shared by the tickers it hands out
#[derive(Clone, Default)]
pub struct ManualClock {
    state: Rc<RefCell<ClockState>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tick source scheduled on this clock
    pub fn ticker(&self) -> ManualTicker {
        ManualTicker {
            clock: Rc::clone(&self.state),
            slot: None,
        }
    }

    /// Simulated time since the clock was created
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Number of currently armed tick sources
    pub fn armed_count(&self) -> usize {
        self.state.borrow().slots.len()
    }

    /// Advance simulated time, firing every due tick in deadline order.
    /// Returns the number of callbacks invoked.
    ///
    /// Work is proportional to the number of ticks due, so callers bound the
    /// span. Simulated time saturates instead of overflowing.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.state.borrow().now.saturating_add(by);
        let mut fired = 0;

        loop {
            let (id, mut handler) = {
                let mut state = self.state.borrow_mut();
                let due = state
                    .slots
                    .iter()
                    .enumerate()
                    .filter(|(_, slot)| slot.handler.is_some() && slot.is_due(target))
                    .min_by_key(|(_, slot)| (slot.next_due, slot.id))
                    .map(|(index, _)| index);

                let Some(index) = due else {
                    state.now = target;
                    break;
                };

                let slot = &mut state.slots[index];
                let deadline = slot.next_due;
                slot.next_due = slot.next_due.saturating_add(slot.period);
                let id = slot.id;
                let handler = slot.handler.take();
                state.now = deadline;
                (id, handler)
            };

            if let Some(callback) = handler.as_mut() {
                callback();
                fired += 1;
            }

            // Put the callback back unless the slot was disarmed meanwhile
            let mut state = self.state.borrow_mut();
            if let Some(slot) = state
                .slots
                .iter_mut()
                .find(|slot| slot.id == id && slot.handler.is_none())
            {
                slot.handler = handler.take();
            }
            // A handler whose slot is gone drops only after the borrow ends
            drop(state);
            drop(handler);
        }

        fired
    }

    pub fn advance_secs(&self, seconds: u64) -> usize {
        self.advance(Duration::from_secs(seconds))
    }
}

/// Tick source scheduled on a [`ManualClock`]
pub struct ManualTicker {
    clock: Rc<RefCell<ClockState>>,
    slot: Option<SlotId>,
}

impl TickSource for ManualTicker {
    fn arm(&mut self, period: Duration, on_tick: TickFn) {
        self.disarm();

        let mut state = self.clock.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        let period = period.max(MIN_PERIOD);
        let next_due = state.now.saturating_add(period);
        state.slots.push(Slot {
            id,
            period,
            next_due,
            handler: Some(on_tick),
        });
        self.slot = Some(id);
    }

    fn disarm(&mut self) {
        if let Some(id) = self.slot.take() {
            self.clock.borrow_mut().slots.retain(|slot| slot.id != id);
        }
    }

    fn is_armed(&self) -> bool {
        self.slot.is_some()
    }
}

impl Drop for ManualTicker {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tokio::task::LocalSet;

    fn counter() -> (Rc<Cell<u32>>, TickFn) {
        let count = Rc::new(Cell::new(0));
        let handle = Rc::clone(&count);
        (count, Box::new(move || handle.set(handle.get() + 1)))
    }

    #[test]
    fn test_manual_ticks_once_per_period() {
        let clock = ManualClock::new();
        let mut ticker = clock.ticker();
        let (count, on_tick) = counter();

        ticker.arm(Duration::from_secs(1), on_tick);
        assert_eq!(clock.advance(Duration::from_millis(999)), 0);
        assert_eq!(clock.advance(Duration::from_millis(1)), 1);
        assert_eq!(clock.advance_secs(4), 4);
        assert_eq!(count.get(), 5);
        assert_eq!(clock.now(), Duration::from_secs(5));
    }

    #[test]
    fn test_manual_disarm_stops_ticks() {
        let clock = ManualClock::new();
        let mut ticker = clock.ticker();
        let (count, on_tick) = counter();

        ticker.arm(Duration::from_secs(1), on_tick);
        clock.advance_secs(2);
        ticker.disarm();
        assert!(!ticker.is_armed());
        assert_eq!(clock.advance_secs(10), 0);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_manual_rearm_replaces_callback() {
        let clock = ManualClock::new();
        let mut ticker = clock.ticker();
        let (first, on_first) = counter();
        let (second, on_second) = counter();

        ticker.arm(Duration::from_secs(1), on_first);
        clock.advance_secs(1);
        ticker.arm(Duration::from_secs(1), on_second);
        assert_eq!(clock.armed_count(), 1);
        clock.advance_secs(3);

        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 3);
    }

    #[test]
    fn test_callback_may_disarm_its_own_ticker() {
        let clock = ManualClock::new();
        let ticker = Rc::new(RefCell::new(clock.ticker()));
        let count = Rc::new(Cell::new(0));

        let handle = Rc::clone(&count);
        let own = Rc::downgrade(&ticker);
        ticker.borrow_mut().arm(
            Duration::from_secs(1),
            Box::new(move || {
                handle.set(handle.get() + 1);
                if handle.get() == 2 {
                    if let Some(ticker) = own.upgrade() {
                        ticker.borrow_mut().disarm();
                    }
                }
            }),
        );

        assert_eq!(clock.advance_secs(10), 2);
        assert_eq!(count.get(), 2);
        assert_eq!(clock.armed_count(), 0);
    }

    #[test]
    fn test_advance_saturates_without_armed_tickers() {
        let clock = ManualClock::new();
        clock.advance_secs(5);
        assert_eq!(clock.advance(Duration::MAX), 0);
        assert_eq!(clock.now(), Duration::MAX);

        // A ticker armed at the end of time never fires
        let mut ticker = clock.ticker();
        let (count, on_tick) = counter();
        ticker.arm(Duration::from_secs(1), on_tick);
        assert_eq!(clock.advance_secs(10), 0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_dropping_ticker_disarms() {
        let clock = ManualClock::new();
        {
            let mut ticker = clock.ticker();
            let (_, on_tick) = counter();
            ticker.arm(Duration::from_secs(1), on_tick);
            assert_eq!(clock.armed_count(), 1);
        }
        assert_eq!(clock.armed_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_ticker_fires_once_per_second() {
        LocalSet::new()
            .run_until(async {
                let mut ticker = IntervalTicker::new();
                let (count, on_tick) = counter();

                ticker.arm(Duration::from_secs(1), on_tick);
                assert!(ticker.is_armed());
                time::sleep(Duration::from_millis(3500)).await;
                assert_eq!(count.get(), 3);

                ticker.disarm();
                assert!(!ticker.is_armed());
                time::sleep(Duration::from_secs(5)).await;
                assert_eq!(count.get(), 3);
            })
            .await;
    }
}
