//! Reading-time estimation
//!
//! Converts the host input into an estimate in whole minutes:
//! - A valid precomputed value wins and is rounded up
//! - Otherwise the content region's words are counted at the configured rate
//! - Missing content resolves to zero, which means "render no overlay"

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_WORDS_PER_MINUTE;
use crate::content::ContentSource;
use crate::types::TextMetrics;

/// Host input to the estimator
#[derive(Default)]
pub struct EstimateInput<'a> {
    /// Minutes computed upstream (e.g. at content-generation time)
    pub precomputed: Option<f64>,
    /// Capability yielding the content region text
    pub content: Option<&'a dyn ContentSource>,
}

impl<'a> EstimateInput<'a> {
    pub fn precomputed(minutes: f64) -> Self {
        Self {
            precomputed: Some(minutes),
            content: None,
        }
    }

    pub fn content(source: &'a dyn ContentSource) -> Self {
        Self {
            precomputed: None,
            content: Some(source),
        }
    }

    /// Add a content fallback used when the precomputed value is invalid
    pub fn with_content(mut self, source: &'a dyn ContentSource) -> Self {
        self.content = Some(source);
        self
    }
}

/// Where an estimate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimateOrigin {
    Precomputed,
    Text { metrics: TextMetrics },
    Absent,
}

/// An estimated reading duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estimate {
    pub minutes: u64,
    pub origin: EstimateOrigin,
}

impl Estimate {
    pub fn absent() -> Self {
        Self {
            minutes: 0,
            origin: EstimateOrigin::Absent,
        }
    }

    /// An overlay is only shown for a non-zero estimate
    pub fn should_render(&self) -> bool {
        self.minutes > 0
    }

    pub fn text_metrics(&self) -> Option<TextMetrics> {
        match self.origin {
            EstimateOrigin::Text { metrics } => Some(metrics),
            _ => None,
        }
    }
}

/// Estimator converting text or precomputed values into minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimator {
    words_per_minute: u32,
}

impl Default for Estimator {
    fn default() -> Self {
        Self::new()
    }
}

impl Estimator {
    /// Create an estimator at the default comprehension rate (160 WPM)
    pub fn new() -> Self {
        Self::with_words_per_minute(DEFAULT_WORDS_PER_MINUTE)
    }

    pub fn with_words_per_minute(words_per_minute: u32) -> Self {
        Self {
            words_per_minute: words_per_minute.max(1),
        }
    }

    pub fn words_per_minute(&self) -> u32 {
        self.words_per_minute
    }

    /// Estimate reading time for the host input
    pub fn estimate(&self, input: &EstimateInput<'_>) -> Estimate {
        if let Some(minutes) = input.precomputed.and_then(precomputed_minutes) {
            return Estimate {
                minutes,
                origin: EstimateOrigin::Precomputed,
            };
        }

        if let Some(value) = input.precomputed {
            tracing::debug!(value, "ignoring invalid precomputed estimate");
        }

        match input.content.and_then(|source| source.region_text()) {
            Some(text) => self.from_metrics(TextMetrics::from_text(&text)),
            None => Estimate::absent(),
        }
    }

    /// Estimate from already-counted words
    pub fn from_metrics(&self, metrics: TextMetrics) -> Estimate {
        Estimate {
            minutes: self.minutes_for_words(metrics.word_count),
            origin: EstimateOrigin::Text { metrics },
        }
    }

    /// `ceil(word_count / words_per_minute)`
    pub fn minutes_for_words(&self, word_count: u64) -> u64 {
        word_count.div_ceil(u64::from(self.words_per_minute))
    }

    pub fn estimate_text(&self, text: &str) -> u64 {
        self.minutes_for_words(TextMetrics::from_text(text).word_count)
    }
}

/// Validate and round up a precomputed estimate. Non-finite and negative
/// values are treated as absent.
pub fn precomputed_minutes(value: f64) -> Option<u64> {
    if value.is_finite() && value >= 0.0 {
        Some(value.ceil() as u64)
    } else {
        None
    }
}
