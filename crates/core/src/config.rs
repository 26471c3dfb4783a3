//! Animation timing configuration
//!
//! Every cadence used by the live widgets is a field here rather than a
//! hard-coded constant, so tests can run with zero delays and hosts can load
//! their own tuning from JSON.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{RenderError, Result};

/// Default Animator redraw rate
pub const DEFAULT_FRAME_RATE: u32 = 30;

/// Default interpolation steps for an animated progress update
pub const DEFAULT_PROGRESS_STEPS: usize = 10;

/// Timing and layout parameters shared by the live widgets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Redraw rate of a standalone Animator (frames per second)
    pub frame_rate: u32,

    /// Redraw rate of the Animator owned by a LiveChart
    pub chart_frame_rate: u32,

    /// Discrete steps in an animated progress update
    pub progress_steps: usize,

    /// Pause between two progress interpolation steps
    pub progress_step_delay: Duration,

    /// Progress bar width in cells
    pub progress_width: usize,

    /// Field width the progress label is padded to
    pub progress_label_width: usize,

    /// Spinner glyph period
    pub spinner_tick: Duration,

    /// Extra blanks written past the label when a spinner is erased
    pub spinner_erase_pad: usize,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            chart_frame_rate: DEFAULT_FRAME_RATE,
            progress_steps: DEFAULT_PROGRESS_STEPS,
            progress_step_delay: Duration::from_millis(50),
            progress_width: 40,
            progress_label_width: 20,
            spinner_tick: Duration::from_millis(100),
            spinner_erase_pad: 10,
        }
    }
}

impl AnimationConfig {
    /// Defaults with every pause removed (progress steps render back to back)
    pub fn immediate() -> Self {
        Self {
            progress_step_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    /// Parse a JSON document; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the standalone Animator rate
    pub fn with_frame_rate(mut self, fps: u32) -> Self {
        self.frame_rate = fps;
        self
    }

    /// Set the LiveChart Animator rate
    pub fn with_chart_frame_rate(mut self, fps: u32) -> Self {
        self.chart_frame_rate = fps;
        self
    }

    /// Set progress interpolation steps and their spacing
    pub fn with_progress_steps(mut self, steps: usize, delay: Duration) -> Self {
        self.progress_steps = steps;
        self.progress_step_delay = delay;
        self
    }

    /// Set the progress bar width in cells
    pub fn with_progress_width(mut self, width: usize) -> Self {
        self.progress_width = width;
        self
    }

    /// Set the spinner period
    pub fn with_spinner_tick(mut self, tick: Duration) -> Self {
        self.spinner_tick = tick;
        self
    }

    /// Reject values that would stall or divide by zero
    pub fn validate(&self) -> Result<()> {
        if self.frame_rate == 0 || self.chart_frame_rate == 0 {
            return Err(RenderError::InvalidConfig("frame rate must be positive".into()));
        }
        self.validate_progress()?;
        self.validate_spinner()
    }

    /// Check only the fields a ProgressBar reads
    pub fn validate_progress(&self) -> Result<()> {
        if self.progress_steps == 0 {
            return Err(RenderError::InvalidConfig("progress steps must be positive".into()));
        }
        if self.progress_width == 0 {
            return Err(RenderError::InvalidConfig("progress width must be positive".into()));
        }
        Ok(())
    }

    /// Check only the fields a Spinner reads
    pub fn validate_spinner(&self) -> Result<()> {
        if self.spinner_tick.is_zero() {
            return Err(RenderError::InvalidConfig("spinner tick must be positive".into()));
        }
        Ok(())
    }
}
