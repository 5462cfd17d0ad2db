//! Floating card variant
//!
//! An inline estimate panel with the timer controls, plus a progress card
//! marked for mounting at the page root (`data-mount="page-root"`) while the
//! timer is active. The host moves the card element to the end of `<body>`.

use super::{
    button, OverlayModel, OverlayRenderer, OverlayVariant, ESTIMATE_HEADING, PROGRESS_HEADING,
    RESET_LABEL, RESET_TITLE,
};
use crate::types::OverlayIntent;

/// Variant A: detached overlay anchored to the page root
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatingCard;

impl OverlayRenderer for FloatingCard {
    fn variant(&self) -> OverlayVariant {
        OverlayVariant::FloatingCard
    }

    fn render(&self, model: &OverlayModel) -> String {
        let mut html = String::new();
        html.push_str(r#"<div class="reading-panel" data-variant="floating_card">"#);
        html.push_str(&format!(
            r#"<div class="reading-panel__estimate"><strong>{ESTIMATE_HEADING}:</strong> {}</div>"#,
            model.estimate_label
        ));

        html.push_str(r#"<div class="reading-panel__controls">"#);
        html.push_str(&button(
            &format!("reading-btn reading-btn--{}", model.toggle.label().to_lowercase()),
            OverlayIntent::Toggle,
            model.toggle.title(),
            model.toggle.label(),
        ));
        if model.show_reset {
            html.push_str(&button(
                "reading-btn reading-btn--reset",
                OverlayIntent::Reset,
                RESET_TITLE,
                RESET_LABEL,
            ));
        }
        html.push_str("</div></div>");

        if model.show_progress {
            html.push_str(&progress_card(model));
        }

        html
    }
}

fn progress_card(model: &OverlayModel) -> String {
    let mut card = String::new();
    card.push_str(r#"<div class="reading-card" data-mount="page-root">"#);
    card.push_str(&format!(
        r#"<div class="reading-card__header">{PROGRESS_HEADING}</div>"#
    ));

    if let Some(clock) = &model.clock {
        card.push_str(&format!(r#"<div class="reading-card__clock">{clock}</div>"#));
    }

    card.push_str(&format!(
        r#"<div class="reading-card__bar"><div class="reading-card__fill" style="width: {}"></div></div>"#,
        model.fill_width()
    ));

    if let Some(status) = &model.status {
        card.push_str(&format!(
            r#"<div class="reading-card__status">{}</div>"#,
            status.label()
        ));
    }

    card.push_str(&format!(
        r#"<div class="reading-card__expected">{}</div>"#,
        model.expected_label
    ));
    card.push_str(&button(
        "reading-card__reset",
        OverlayIntent::Reset,
        RESET_TITLE,
        RESET_LABEL,
    ));
    card.push_str("</div>");
    card
}
