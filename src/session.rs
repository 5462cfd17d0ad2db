//! Session coordination
//!
//! One [`SessionCoordinator`] owns the estimate and the timer of a displayed
//! document and is the single source of truth for every overlay variant.
//! Each effective transition or tick recomputes the progress view and
//! notifies all observers synchronously before returning.
//!
//! Updates raised while observers are running (an observer dispatching an
//! intent, say) are queued and delivered after the current one, so every
//! observer sees updates in transition order and ends on the latest state.
//!
//! State lives behind `Rc<RefCell<_>>`. Tick callbacks and [`SessionHandle`]s
//! hold only weak references, so nothing can mutate a session once its
//! coordinator has been disposed or dropped.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::config::ReadingConfig;
use crate::error::ReadingError;
use crate::estimator::{precomputed_minutes, EstimateInput, Estimator};
use crate::progress::ProgressCalculator;
use crate::timer::{TickEpoch, TickFn, TickSource, TimerController};
use crate::types::{
    OverlayIntent, ProgressView, ReadingSession, SessionId, SessionSnapshot, SessionUpdate,
    TextMetrics, TimerState, UpdateCause,
};

/// Session observer. Observers are called on the event-loop thread right
/// after each recomputation and may dispatch intents through a
/// [`SessionHandle`].
pub type Observer = Rc<dyn Fn(&SessionUpdate)>;

/// Identifies an observer registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct SessionCore {
    id: SessionId,
    estimator: Estimator,
    text_metrics: Option<TextMetrics>,
    estimated_minutes: u64,
    timer: TimerController,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
    // Updates waiting for the outermost delivery loop
    outbox: VecDeque<SessionUpdate>,
    delivering: bool,
    disposed: bool,
}

impl SessionCore {
    fn session(&self) -> ReadingSession {
        ReadingSession {
            id: self.id,
            estimated_minutes: self.estimated_minutes,
            elapsed_seconds: self.timer.elapsed_seconds(),
            state: self.timer.state(),
        }
    }

    fn progress(&self) -> ProgressView {
        ProgressCalculator::compute(self.estimated_minutes, self.timer.elapsed_seconds())
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session: self.session(),
            progress: self.progress(),
        }
    }

    fn update(&self, cause: UpdateCause) -> SessionUpdate {
        SessionUpdate {
            session: self.session(),
            progress: self.progress(),
            cause,
        }
    }

    fn observer_list(&self) -> Vec<Observer> {
        self.observers
            .iter()
            .map(|(_, observer)| Rc::clone(observer))
            .collect()
    }
}

type SharedCore = Rc<RefCell<SessionCore>>;

/// Coordinator of a single reading session
pub struct SessionCoordinator {
    core: SharedCore,
}

impl SessionCoordinator {
    /// Open a session for the host input.
    ///
    /// The estimate is computed once here. Returns `None` when it is zero, in
    /// which case no overlay should be rendered.
    pub fn open(
        config: &ReadingConfig,
        input: &EstimateInput<'_>,
        ticker: Box<dyn TickSource>,
    ) -> Option<Self> {
        let estimator = Estimator::with_words_per_minute(config.words_per_minute);
        let estimate = estimator.estimate(input);

        if !estimate.should_render() {
            tracing::debug!(origin = ?estimate.origin, "zero estimate, no session opened");
            return None;
        }

        // Keep the text metrics around so a later invalid precomputed value
        // can fall back to them
        let text_metrics = estimate.text_metrics().or_else(|| {
            input
                .content
                .and_then(|source| source.region_text())
                .map(|text| TextMetrics::from_text(&text))
        });

        let id = SessionId::new();
        tracing::info!(
            session_id = %id,
            estimated_minutes = estimate.minutes,
            "reading session opened"
        );

        let core = SessionCore {
            id,
            estimator,
            text_metrics,
            estimated_minutes: estimate.minutes,
            timer: TimerController::new(ticker, config.tick_period()),
            observers: Vec::new(),
            next_subscription: 0,
            outbox: VecDeque::new(),
            delivering: false,
            disposed: false,
        };

        Some(Self {
            core: Rc::new(RefCell::new(core)),
        })
    }

    pub fn id(&self) -> SessionId {
        self.core.borrow().id
    }

    /// Current session state
    pub fn session(&self) -> ReadingSession {
        self.core.borrow().session()
    }

    /// Progress derived from the current state
    pub fn progress(&self) -> ProgressView {
        self.core.borrow().progress()
    }

    /// Session and progress read under one borrow
    pub fn snapshot(&self) -> SessionSnapshot {
        self.core.borrow().snapshot()
    }

    pub fn state(&self) -> TimerState {
        self.core.borrow().timer.state()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.core.borrow().timer.elapsed_seconds()
    }

    pub fn estimated_minutes(&self) -> u64 {
        self.core.borrow().estimated_minutes
    }

    pub fn text_metrics(&self) -> Option<TextMetrics> {
        self.core.borrow().text_metrics
    }

    pub fn is_disposed(&self) -> bool {
        self.core.borrow().disposed
    }

    /// A weak handle for relaying intents from presentation code
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            core: Rc::downgrade(&self.core),
        }
    }

    /// Register an observer called after every recomputation
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&SessionUpdate) + 'static,
    {
        let mut core = self.core.borrow_mut();
        let id = SubscriptionId(core.next_subscription);
        core.next_subscription += 1;
        if !core.disposed {
            let observer: Observer = Rc::new(observer);
            core.observers.push((id, observer));
        }
        id
    }

    /// Remove an observer. An update already being delivered may still reach it.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut core = self.core.borrow_mut();
        let before = core.observers.len();
        core.observers.retain(|(existing, _)| *existing != id);
        core.observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.core.borrow().observers.len()
    }

    /// Idle/Stopped -> Running
    pub fn start(&self) -> bool {
        start(&self.core)
    }

    /// Running -> Stopped
    pub fn stop(&self) -> bool {
        stop(&self.core)
    }

    /// Stop when running, start otherwise
    pub fn toggle(&self) -> bool {
        toggle(&self.core)
    }

    /// Any state -> Idle with elapsed time zeroed
    pub fn reset(&self) -> bool {
        reset(&self.core)
    }

    /// Apply a user intent from an overlay control
    pub fn dispatch(&self, intent: OverlayIntent) -> bool {
        dispatch(&self.core, intent)
    }

    /// Re-derive the estimate from a new precomputed value supplied by the
    /// host. An absent or invalid value falls back to the document's text
    /// metrics. Observers are notified only when the estimate changes.
    pub fn update_estimate(&self, precomputed: Option<f64>) -> bool {
        let pending = {
            let mut core = self.core.borrow_mut();
            if core.disposed {
                return false;
            }

            let minutes = precomputed
                .and_then(precomputed_minutes)
                .or_else(|| {
                    core.text_metrics
                        .map(|metrics| core.estimator.minutes_for_words(metrics.word_count))
                })
                .unwrap_or(0);

            if minutes == core.estimated_minutes {
                return false;
            }

            tracing::debug!(
                session_id = %core.id,
                from = core.estimated_minutes,
                to = minutes,
                "estimate changed"
            );
            core.estimated_minutes = minutes;
            core.update(UpdateCause::EstimateChanged)
        };

        deliver(&self.core, pending);
        true
    }

    /// Cancel any active tick source and detach all observers. Later
    /// transitions are no-ops; the final state stays readable.
    pub fn dispose(&self) {
        let mut core = self.core.borrow_mut();
        if core.disposed {
            return;
        }
        core.disposed = true;
        core.timer.dispose();
        core.observers.clear();
        core.outbox.clear();
        tracing::info!(
            session_id = %core.id,
            elapsed_seconds = core.timer.elapsed_seconds(),
            "reading session disposed"
        );
    }
}

impl Drop for SessionCoordinator {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Weak reference to a session used by presentation code to relay intents.
/// Every call is a no-op once the coordinator is gone.
#[derive(Clone)]
pub struct SessionHandle {
    core: Weak<RefCell<SessionCore>>,
}

impl SessionHandle {
    pub fn dispatch(&self, intent: OverlayIntent) -> bool {
        match self.core.upgrade() {
            Some(core) => dispatch(&core, intent),
            None => false,
        }
    }

    /// Remove an observer registered on the session
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        match self.core.upgrade() {
            Some(core) => {
                let mut inner = core.borrow_mut();
                let before = inner.observers.len();
                inner.observers.retain(|(existing, _)| *existing != id);
                inner.observers.len() != before
            }
            None => false,
        }
    }

    pub fn is_alive(&self) -> bool {
        match self.core.upgrade() {
            Some(core) => {
                let disposed = core.borrow().disposed;
                !disposed
            }
            None => false,
        }
    }
}

fn dispatch(core: &SharedCore, intent: OverlayIntent) -> bool {
    tracing::debug!(?intent, "overlay intent");
    match intent {
        OverlayIntent::Start => start(core),
        OverlayIntent::Stop => stop(core),
        OverlayIntent::Toggle => toggle(core),
        OverlayIntent::Reset => reset(core),
    }
}

fn start(core: &SharedCore) -> bool {
    let weak = Rc::downgrade(core);
    let started = {
        let mut inner = core.borrow_mut();
        if inner.disposed {
            return false;
        }
        inner.timer.start(|epoch| tick_handler(weak, epoch))
    };
    if started {
        publish(core, UpdateCause::Started);
    }
    started
}

fn stop(core: &SharedCore) -> bool {
    let stopped = core.borrow_mut().timer.stop();
    if stopped {
        publish(core, UpdateCause::Stopped);
    }
    stopped
}

fn toggle(core: &SharedCore) -> bool {
    let running = core.borrow().timer.state() == TimerState::Running;
    if running {
        stop(core)
    } else {
        start(core)
    }
}

fn reset(core: &SharedCore) -> bool {
    let reset = {
        let mut inner = core.borrow_mut();
        !inner.disposed && inner.timer.reset()
    };
    if reset {
        publish(core, UpdateCause::Reset);
    }
    reset
}

fn tick_handler(core: Weak<RefCell<SessionCore>>, epoch: TickEpoch) -> TickFn {
    Box::new(move || {
        if let Some(core) = core.upgrade() {
            on_tick(&core, epoch);
        }
    })
}

fn on_tick(core: &SharedCore, epoch: TickEpoch) {
    let pending = {
        let mut inner = core.borrow_mut();
        if inner.disposed || !inner.timer.tick(epoch) {
            return;
        }
        tracing::trace!(
            session_id = %inner.id,
            elapsed = inner.timer.elapsed_seconds(),
            "tick"
        );
        inner.update(UpdateCause::Tick)
    };
    deliver(core, pending);
}

fn publish(core: &SharedCore, cause: UpdateCause) {
    let pending = core.borrow().update(cause);
    deliver(core, pending);
}

/// Queue `update` and, unless a delivery loop is already running further up
/// the stack, drain the queue in FIFO order. Each update goes to the
/// observers registered when it is dequeued.
fn deliver(core: &SharedCore, update: SessionUpdate) {
    {
        let mut inner = core.borrow_mut();
        inner.outbox.push_back(update);
        if inner.delivering {
            return;
        }
        inner.delivering = true;
    }

    loop {
        let next = {
            let mut inner = core.borrow_mut();
            match inner.outbox.pop_front() {
                Some(update) => Some((update, inner.observer_list())),
                None => {
                    inner.delivering = false;
                    None
                }
            }
        };

        let Some((update, observers)) = next else {
            break;
        };
        for observer in observers {
            observer(&update);
        }
    }
}

struct MountedDocument {
    document: String,
    session: Option<SessionCoordinator>,
}

/// Host-side owner guaranteeing at most one live session per displayed
/// document
pub struct SessionHost {
    config: ReadingConfig,
    mounted: Option<MountedDocument>,
}

impl Default for SessionHost {
    fn default() -> Self {
        Self::new(ReadingConfig::default())
    }
}

impl SessionHost {
    pub fn new(config: ReadingConfig) -> Self {
        Self {
            config,
            mounted: None,
        }
    }

    pub fn config(&self) -> &ReadingConfig {
        &self.config
    }

    /// Mount `document` and open its session.
    ///
    /// Mounting the document that is already displayed is a caller error.
    /// Mounting a different document disposes the previous session first.
    /// `Ok(None)` means the document has no estimate and gets no overlay.
    pub fn mount(
        &mut self,
        document: impl Into<String>,
        input: &EstimateInput<'_>,
        ticker: Box<dyn TickSource>,
    ) -> Result<Option<&SessionCoordinator>, ReadingError> {
        let document = document.into();
        if self.document() == Some(document.as_str()) {
            return Err(ReadingError::SessionAlreadyMounted(document));
        }

        self.unmount();
        let session = SessionCoordinator::open(&self.config, input, ticker);
        let mounted = self.mounted.insert(MountedDocument { document, session });
        Ok(mounted.session.as_ref())
    }

    /// Dispose the mounted session, if any
    pub fn unmount(&mut self) -> bool {
        match self.mounted.take() {
            Some(mounted) => {
                if let Some(session) = mounted.session {
                    session.dispose();
                }
                tracing::debug!(document = %mounted.document, "document unmounted");
                true
            }
            None => false,
        }
    }

    pub fn document(&self) -> Option<&str> {
        self.mounted.as_ref().map(|mounted| mounted.document.as_str())
    }

    pub fn session(&self) -> Option<&SessionCoordinator> {
        self.mounted.as_ref().and_then(|mounted| mounted.session.as_ref())
    }
}
