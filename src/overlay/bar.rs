//! Sticky bar variant
//!
//! A single element rendered inline within the host's fixed positioning:
//! estimate on the left, clock and progress in the middle, controls on the
//! right.

use super::{
    button, OverlayModel, OverlayRenderer, OverlayVariant, ESTIMATE_HEADING, RESET_LABEL,
    RESET_TITLE,
};
use crate::types::OverlayIntent;

/// Variant B: inline fixed-position bar
#[derive(Debug, Clone, Copy, Default)]
pub struct StickyBar;

impl OverlayRenderer for StickyBar {
    fn variant(&self) -> OverlayVariant {
        OverlayVariant::StickyBar
    }

    fn render(&self, model: &OverlayModel) -> String {
        let mut html = String::new();
        html.push_str(r#"<div class="sticky-reading-time" data-variant="sticky_bar">"#);

        html.push_str(&format!(
            r#"<div class="sticky-reading-time__left"><span class="sticky-reading-time__label">{ESTIMATE_HEADING}:</span> <span class="sticky-reading-time__value">{}</span></div>"#,
            model.estimate_label
        ));

        html.push_str(r#"<div class="sticky-reading-time__middle">"#);
        if model.show_progress {
            if let Some(clock) = &model.clock {
                html.push_str(&format!(
                    r#"<span class="sticky-reading-time__clock">{clock}</span>"#
                ));
            }
            html.push_str(&format!(
                r#"<span class="sticky-reading-time__bar"><span class="sticky-reading-time__fill" style="width: {}"></span></span>"#,
                model.fill_width()
            ));
            if let Some(status) = &model.status {
                html.push_str(&format!(
                    r#"<span class="sticky-reading-time__status">{}</span>"#,
                    status.label()
                ));
            }
            html.push_str(&format!(
                r#"<span class="sticky-reading-time__expected">{}</span>"#,
                model.expected_label
            ));
        }
        html.push_str("</div>");

        html.push_str(r#"<div class="sticky-reading-time__right">"#);
        html.push_str(&button(
            &format!("sticky-timer-btn btn-{}", model.toggle.label().to_lowercase()),
            OverlayIntent::Toggle,
            model.toggle.title(),
            model.toggle.label(),
        ));
        if model.show_reset {
            html.push_str(&button(
                "sticky-timer-btn btn-reset",
                OverlayIntent::Reset,
                RESET_TITLE,
                RESET_LABEL,
            ));
        }
        html.push_str("</div></div>");

        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressCalculator;
    use crate::types::{ReadingSession, SessionId, TimerState};

    fn render(minutes: u64, elapsed: u64, state: TimerState) -> String {
        let session = ReadingSession {
            id: SessionId::new(),
            estimated_minutes: minutes,
            elapsed_seconds: elapsed,
            state,
        };
        let model =
            OverlayModel::new(&session, &ProgressCalculator::compute(minutes, elapsed)).unwrap();
        StickyBar.render(&model)
    }

    #[test]
    fn test_idle_bar() {
        let html = render(1, 0, TimerState::Idle);
        assert!(html.starts_with(r#"<div class="sticky-reading-time""#));
        assert!(html.contains("1 minute"));
        assert!(html.contains("btn-start"));
        assert!(!html.contains("sticky-reading-time__clock"));
        assert!(!html.contains("btn-reset"));
    }

    #[test]
    fn test_stopped_bar_keeps_clock_and_reset() {
        let html = render(4, 61, TimerState::Stopped);
        assert!(html.contains(r#"<span class="sticky-reading-time__clock">1:01</span>"#));
        assert!(html.contains("btn-start"));
        assert!(html.contains("btn-reset"));
        assert!(html.contains("3m remaining"));
        assert!(html.contains(r#"<span class="sticky-reading-time__expected">Expected: 4m</span>"#));
    }
}
