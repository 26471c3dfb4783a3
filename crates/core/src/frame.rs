//! Frame snapshot type

use chrono::{DateTime, Utc};
use std::time::Duration;

/// One complete snapshot of renderable terminal content
///
/// Only `content` drives rendering; the timestamp and duration are kept for
/// hosts that schedule or inspect frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub duration: Duration,
}

impl Frame {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            created_at: Utc::now(),
            duration: Duration::ZERO,
        }
    }

    pub fn empty() -> Self {
        Self::new(String::new())
    }

    /// Set the intended display duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Content lines; empty content is a single empty line
    pub fn lines(&self) -> Vec<&str> {
        split_lines(&self.content)
    }

    pub fn line_count(&self) -> usize {
        self.content.split('\n').count()
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::empty()
    }
}

/// Split on line feeds without dropping a trailing empty line
pub(crate) fn split_lines(content: &str) -> Vec<&str> {
    content.split('\n').collect()
}
