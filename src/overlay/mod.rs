//! Overlay presentation
//!
//! Both presentation variants are pure functions of the same [`OverlayModel`],
//! which is derived from a session update. Labels, thresholds and control
//! visibility live in the model so the variants cannot drift apart; a
//! renderer only decides the markup around them.
//!
//! - [`FloatingCard`]: inline estimate panel plus a progress card mounted at
//!   the page root (for hosts whose layout would clip a fixed element)
//! - [`StickyBar`]: a single bar inside the host's fixed positioning

pub mod bar;
pub mod card;

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

use crate::progress::format_clock;
use crate::session::{SessionCoordinator, SessionHandle, SubscriptionId};
use crate::types::{OverlayIntent, ProgressView, ReadingSession, SessionUpdate, TimerState};

pub use bar::StickyBar;
pub use card::FloatingCard;

/// Presentation variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayVariant {
    FloatingCard,
    StickyBar,
}

impl OverlayVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayVariant::FloatingCard => "floating_card",
            OverlayVariant::StickyBar => "sticky_bar",
        }
    }

    pub fn renderer(&self) -> Box<dyn OverlayRenderer> {
        match self {
            OverlayVariant::FloatingCard => Box::new(FloatingCard),
            OverlayVariant::StickyBar => Box::new(StickyBar),
        }
    }
}

impl OverlayIntent {
    /// Name used in the `data-intent` attribute of rendered controls
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayIntent::Start => "start",
            OverlayIntent::Stop => "stop",
            OverlayIntent::Toggle => "toggle",
            OverlayIntent::Reset => "reset",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "start" => Some(OverlayIntent::Start),
            "stop" => Some(OverlayIntent::Stop),
            "toggle" => Some(OverlayIntent::Toggle),
            "reset" => Some(OverlayIntent::Reset),
            _ => None,
        }
    }
}

/// The combined start/stop button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleControl {
    Start,
    Stop,
}

impl ToggleControl {
    pub fn label(&self) -> &'static str {
        match self {
            ToggleControl::Start => "Start",
            ToggleControl::Stop => "Stop",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ToggleControl::Start => "Start timer",
            ToggleControl::Stop => "Stop timer",
        }
    }
}

/// Progress status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverlayStatus {
    /// Within the estimate
    Remaining { minutes: u64 },
    /// Past the estimate; percent exceeds 100
    DetailedRead { percent: u64 },
}

impl OverlayStatus {
    pub fn label(&self) -> String {
        match self {
            OverlayStatus::Remaining { minutes } => format!("{minutes}m remaining"),
            OverlayStatus::DetailedRead { percent } => format!("Detailed read: {percent}%"),
        }
    }
}

pub const ESTIMATE_HEADING: &str = "Est. Reading Time";
pub const PROGRESS_HEADING: &str = "Reading Progress";
pub const RESET_LABEL: &str = "Reset";
pub const RESET_TITLE: &str = "Reset timer";

/// Everything a renderer may show, shared by both variants
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayModel {
    pub state: TimerState,
    pub estimated_minutes: u64,
    /// "1 minute" / "N minutes", always shown
    pub estimate_label: String,
    /// "Expected: Nm"
    pub expected_label: String,
    /// Elapsed `m:ss`, present while the timer is not idle
    pub clock: Option<String>,
    /// Progress bar fill, 0-100
    pub percent: f64,
    /// Present while the timer is not idle
    pub status: Option<OverlayStatus>,
    pub toggle: ToggleControl,
    pub show_reset: bool,
    pub show_progress: bool,
}

impl OverlayModel {
    /// Derive the model; `None` when there is no estimate to show
    pub fn new(session: &ReadingSession, progress: &ProgressView) -> Option<Self> {
        if session.estimated_minutes == 0 {
            return None;
        }

        let active = session.state != TimerState::Idle;
        let status = match progress.overage_percent {
            Some(percent) => OverlayStatus::DetailedRead { percent },
            None => OverlayStatus::Remaining {
                minutes: progress.remaining_minutes.unwrap_or(0),
            },
        };

        Some(Self {
            state: session.state,
            estimated_minutes: session.estimated_minutes,
            estimate_label: minutes_label(session.estimated_minutes),
            expected_label: format!("Expected: {}m", session.estimated_minutes),
            clock: active.then(|| format_clock(session.elapsed_seconds)),
            percent: progress.percent,
            status: active.then_some(status),
            toggle: if session.state == TimerState::Running {
                ToggleControl::Stop
            } else {
                ToggleControl::Start
            },
            show_reset: active,
            show_progress: active,
        })
    }

    pub fn from_update(update: &SessionUpdate) -> Option<Self> {
        Self::new(&update.session, &update.progress)
    }

    /// Progress bar width as a CSS percentage
    pub fn fill_width(&self) -> String {
        format!("{:.1}%", self.percent.clamp(0.0, 100.0))
    }
}

/// "1 minute" / "N minutes"
pub fn minutes_label(minutes: u64) -> String {
    if minutes == 1 {
        "1 minute".to_string()
    } else {
        format!("{minutes} minutes")
    }
}

/// A presentation variant turning the model into markup
pub trait OverlayRenderer {
    fn variant(&self) -> OverlayVariant;

    fn render(&self, model: &OverlayModel) -> String;
}

/// Render a control button carrying its intent
pub(crate) fn button(class: &str, intent: OverlayIntent, title: &str, label: &str) -> String {
    format!(
        r#"<button type="button" class="{class}" data-intent="{intent}" title="{title}">{label}</button>"#,
        intent = intent.as_str(),
    )
}

#[derive(Default)]
struct Frame {
    model: Option<OverlayModel>,
    markup: Option<String>,
    renders: usize,
}

impl Frame {
    fn paint(&mut self, renderer: &dyn OverlayRenderer, model: Option<OverlayModel>) {
        self.markup = model.as_ref().map(|model| renderer.render(model));
        self.model = model;
        self.renders += 1;
    }
}

/// A renderer subscribed to a session, holding the latest frame and relaying
/// control intents back to the session. Detaches itself on drop.
pub struct OverlayBinding {
    session: SessionHandle,
    subscription: SubscriptionId,
    variant: OverlayVariant,
    frame: Rc<RefCell<Frame>>,
}

impl OverlayBinding {
    pub fn attach(coordinator: &SessionCoordinator, renderer: Box<dyn OverlayRenderer>) -> Self {
        let renderer: Rc<dyn OverlayRenderer> = Rc::from(renderer);
        let variant = renderer.variant();
        let frame = Rc::new(RefCell::new(Frame::default()));

        let initial = OverlayModel::new(&coordinator.session(), &coordinator.progress());
        frame.borrow_mut().paint(&*renderer, initial);

        let sink = Rc::clone(&frame);
        let subscription = coordinator.subscribe(move |update| {
            sink.borrow_mut().paint(&*renderer, OverlayModel::from_update(update));
        });

        Self {
            session: coordinator.handle(),
            subscription,
            variant,
            frame,
        }
    }

    pub fn variant(&self) -> OverlayVariant {
        self.variant
    }

    /// Latest markup; `None` when the overlay should not be shown
    pub fn markup(&self) -> Option<String> {
        self.frame.borrow().markup.clone()
    }

    pub fn model(&self) -> Option<OverlayModel> {
        self.frame.borrow().model.clone()
    }

    /// Number of frames painted so far, including the initial one
    pub fn renders(&self) -> usize {
        self.frame.borrow().renders
    }

    /// Relay a control activation to the session
    pub fn activate(&self, intent: OverlayIntent) -> bool {
        self.session.dispatch(intent)
    }

    /// Relay a control activation by its `data-intent` name
    pub fn activate_named(&self, name: &str) -> bool {
        match OverlayIntent::from_name(name) {
            Some(intent) => self.activate(intent),
            None => {
                tracing::debug!(name, "unknown overlay intent");
                false
            }
        }
    }
}

impl Drop for OverlayBinding {
    fn drop(&mut self) {
        self.session.unsubscribe(self.subscription);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReadingConfig;
    use crate::estimator::EstimateInput;
    use crate::progress::ProgressCalculator;
    use crate::ticker::ManualClock;
    use crate::types::{SessionId, UpdateCause};
    use pretty_assertions::assert_eq;

    fn session(minutes: u64, elapsed: u64, state: TimerState) -> ReadingSession {
        ReadingSession {
            id: SessionId::new(),
            estimated_minutes: minutes,
            elapsed_seconds: elapsed,
            state,
        }
    }

    fn model(minutes: u64, elapsed: u64, state: TimerState) -> Option<OverlayModel> {
        OverlayModel::new(
            &session(minutes, elapsed, state),
            &ProgressCalculator::compute(minutes, elapsed),
        )
    }

    #[test]
    fn test_no_model_without_estimate() {
        assert!(model(0, 0, TimerState::Idle).is_none());
        assert!(model(0, 30, TimerState::Running).is_none());
    }

    #[test]
    fn test_idle_model_hides_secondary_controls() {
        let model = model(1, 0, TimerState::Idle).unwrap();
        assert_eq!(model.estimate_label, "1 minute");
        assert_eq!(model.toggle, ToggleControl::Start);
        assert_eq!(model.clock, None);
        assert_eq!(model.status, None);
        assert!(!model.show_reset);
        assert!(!model.show_progress);
    }

    #[test]
    fn test_running_model() {
        let model = model(2, 75, TimerState::Running).unwrap();
        assert_eq!(model.estimate_label, "2 minutes");
        assert_eq!(model.expected_label, "Expected: 2m");
        assert_eq!(model.clock.as_deref(), Some("1:15"));
        assert_eq!(model.status, Some(OverlayStatus::Remaining { minutes: 1 }));
        assert_eq!(model.toggle, ToggleControl::Stop);
        assert_eq!(model.fill_width(), "62.5%");
        assert!(model.show_reset);
    }

    #[test]
    fn test_stopped_model_keeps_reset_and_frozen_clock() {
        let model = model(2, 30, TimerState::Stopped).unwrap();
        assert_eq!(model.toggle, ToggleControl::Start);
        assert_eq!(model.clock.as_deref(), Some("0:30"));
        assert!(model.show_reset);
    }

    #[test]
    fn test_overage_status() {
        let model = model(2, 150, TimerState::Running).unwrap();
        let status = model.status.unwrap();
        assert_eq!(status, OverlayStatus::DetailedRead { percent: 125 });
        assert_eq!(status.label(), "Detailed read: 125%");
        assert_eq!(model.fill_width(), "100.0%");
    }

    #[test]
    fn test_intent_names_roundtrip() {
        for intent in [
            OverlayIntent::Start,
            OverlayIntent::Stop,
            OverlayIntent::Toggle,
            OverlayIntent::Reset,
        ] {
            assert_eq!(OverlayIntent::from_name(intent.as_str()), Some(intent));
        }
        assert_eq!(OverlayIntent::from_name("pause"), None);
    }

    #[test]
    fn test_variants_share_labels_and_visibility() {
        for state in [TimerState::Idle, TimerState::Running, TimerState::Stopped] {
            let model = model(2, 150, state).unwrap();
            let card = FloatingCard.render(&model);
            let bar = StickyBar.render(&model);

            for markup in [&card, &bar] {
                assert!(markup.contains(ESTIMATE_HEADING));
                assert!(markup.contains("2 minutes"));
                assert!(markup.contains(model.toggle.label()));
                assert_eq!(
                    markup.contains(r#"data-intent="reset""#),
                    state != TimerState::Idle
                );
                assert_eq!(markup.contains("Detailed read: 125%"), state != TimerState::Idle);
                assert_eq!(markup.contains("2:30"), state != TimerState::Idle);
                assert_eq!(
                    markup.contains(&model.expected_label),
                    state != TimerState::Idle
                );
            }
        }
    }

    #[test]
    fn test_binding_follows_session() {
        let clock = ManualClock::new();
        let coordinator = SessionCoordinator::open(
            &ReadingConfig::default(),
            &EstimateInput::precomputed(2.0),
            Box::new(clock.ticker()),
        )
        .unwrap();

        let binding = OverlayBinding::attach(&coordinator, OverlayVariant::StickyBar.renderer());
        assert_eq!(binding.variant(), OverlayVariant::StickyBar);
        assert_eq!(binding.renders(), 1);
        assert!(!binding.markup().unwrap().contains("0:00"));

        assert!(binding.activate_named("toggle"));
        clock.advance_secs(75);
        // initial + started + 75 ticks
        assert_eq!(binding.renders(), 77);
        assert!(binding.markup().unwrap().contains("1:15"));

        assert!(binding.activate(OverlayIntent::Toggle));
        assert_eq!(coordinator.state(), TimerState::Stopped);
        assert_eq!(binding.model().unwrap().toggle, ToggleControl::Start);

        assert!(!binding.activate_named("rewind"));
        assert!(binding.activate(OverlayIntent::Reset));
        assert_eq!(binding.model().unwrap().clock, None);
    }

    #[test]
    fn test_binding_after_auto_stop_observer_shows_stopped_frame() {
        let clock = ManualClock::new();
        let coordinator = SessionCoordinator::open(
            &ReadingConfig::default(),
            &EstimateInput::precomputed(2.0),
            Box::new(clock.ticker()),
        )
        .unwrap();

        let handle = coordinator.handle();
        coordinator.subscribe(move |update| {
            if update.cause == UpdateCause::Tick && update.session.elapsed_seconds == 3 {
                handle.dispatch(OverlayIntent::Stop);
            }
        });
        let binding = OverlayBinding::attach(&coordinator, OverlayVariant::StickyBar.renderer());

        coordinator.start();
        clock.advance_secs(10);

        assert_eq!(coordinator.state(), TimerState::Stopped);
        let model = binding.model().unwrap();
        assert_eq!(model.state, coordinator.state());
        assert_eq!(model.toggle, ToggleControl::Start);
        assert_eq!(model.clock.as_deref(), Some("0:03"));
        assert!(binding.markup().unwrap().contains("btn-start"));
    }

    #[test]
    fn test_two_variants_on_one_session() {
        let clock = ManualClock::new();
        let coordinator = SessionCoordinator::open(
            &ReadingConfig::default(),
            &EstimateInput::precomputed(1.0),
            Box::new(clock.ticker()),
        )
        .unwrap();

        let card = OverlayBinding::attach(&coordinator, Box::new(FloatingCard));
        let bar = OverlayBinding::attach(&coordinator, Box::new(StickyBar));

        card.activate(OverlayIntent::Start);
        clock.advance_secs(10);

        assert_eq!(card.model(), bar.model());
        assert_eq!(coordinator.observer_count(), 2);

        drop(card);
        assert_eq!(coordinator.observer_count(), 1);
    }

    #[test]
    fn test_binding_hides_overlay_when_estimate_drops_to_zero() {
        let clock = ManualClock::new();
        let coordinator = SessionCoordinator::open(
            &ReadingConfig::default(),
            &EstimateInput::precomputed(3.0),
            Box::new(clock.ticker()),
        )
        .unwrap();
        let binding = OverlayBinding::attach(&coordinator, Box::new(FloatingCard));
        assert!(binding.markup().is_some());

        coordinator.update_estimate(Some(0.0));
        assert!(binding.markup().is_none());
    }
}
