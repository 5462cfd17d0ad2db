//! Core types for the reading-time engine
//!
//! This module defines the data structures that flow between the stages of the
//! engine: text metrics, the live reading session, the derived progress view,
//! and the update record delivered to observers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Word statistics for one document load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextMetrics {
    /// Number of whitespace-separated words
    pub word_count: u64,
}

impl TextMetrics {
    /// Count the words of `text`
    pub fn from_text(text: &str) -> Self {
        Self {
            word_count: count_words(text),
        }
    }
}

/// Count whitespace-separated words. Leading and trailing whitespace is
/// ignored and an empty (or all-whitespace) string has zero words.
pub fn count_words(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

/// Timer state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    #[default]
    Idle,
    Running,
    Stopped,
}

impl TimerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerState::Idle => "idle",
            TimerState::Running => "running",
            TimerState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique identifier of a reading session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The live timer + estimate state for one displayed document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingSession {
    pub id: SessionId,
    /// Expected reading duration (minutes)
    pub estimated_minutes: u64,
    /// Tracked reading duration since start (seconds)
    pub elapsed_seconds: u64,
    pub state: TimerState,
}

/// Display-ready progress derived from a [`ReadingSession`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressView {
    /// Progress percentage, clamped to 0-100
    pub percent: f64,
    /// Seconds left before the estimate is reached (0 in overage)
    pub remaining_seconds: u64,
    /// Remaining time rounded to whole minutes; absent in overage or when
    /// there is no estimate
    pub remaining_minutes: Option<u64>,
    /// Unclamped, rounded percentage once elapsed exceeds the estimate
    pub overage_percent: Option<u64>,
}

impl ProgressView {
    pub fn is_overage(&self) -> bool {
        self.overage_percent.is_some()
    }
}

/// User intent relayed from an overlay control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayIntent {
    Start,
    Stop,
    /// The combined start/stop button
    Toggle,
    Reset,
}

/// What caused a session update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateCause {
    Started,
    Stopped,
    Reset,
    Tick,
    EstimateChanged,
}

/// Point-in-time read of a session and its derived progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session: ReadingSession,
    pub progress: ProgressView,
}

/// Record delivered to session observers after every recomputation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUpdate {
    pub session: ReadingSession,
    pub progress: ProgressView,
    pub cause: UpdateCause,
}
