//! Animated progress bar
//!
//! Renders a scalar in `[0, 1]` as a row of block glyphs, rewriting the same
//! line on every render. An animated update walks from the old value to the
//! new one in fixed steps and only returns once the last step has rendered.

use std::sync::Arc;

use crate::config::AnimationConfig;
use crate::sink::{OutputSink, StdoutSink, CARRIAGE_RETURN};
use crate::{RenderError, Result};

const FULL: char = '█';
const EMPTY: char = '░';
/// Partial-cell glyphs indexed by eighths of a cell
const PARTIALS: [char; 8] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉'];

/// Single-line progress bar
pub struct ProgressBar {
    current: f64,
    target: f64,
    label: String,
    animated: bool,
    config: AnimationConfig,
    sink: Arc<dyn OutputSink>,
}

impl ProgressBar {
    /// Animated bar drawing to stdout with default timing
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            current: 0.0,
            target: 0.0,
            label: label.into(),
            animated: true,
            config: AnimationConfig::default(),
            sink: Arc::new(StdoutSink),
        }
    }

    /// Bar drawing to `sink` with the given timing
    pub fn with_output(
        label: impl Into<String>,
        sink: Arc<dyn OutputSink>,
        config: AnimationConfig,
    ) -> Result<Self> {
        config.validate_progress()?;
        Ok(Self {
            config,
            sink,
            ..Self::new(label)
        })
    }

    pub fn set_animated(&mut self, animated: bool) {
        self.animated = animated;
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Move to `value`, rendering each interpolation step when animated
    ///
    /// Values outside `[0, 1]` are clamped. The future completes after the
    /// final render; drive it from a separate task to keep the caller free.
    pub async fn update(&mut self, value: f64) -> Result<()> {
        if value.is_nan() {
            return Err(RenderError::InvalidValue("progress value is NaN".into()));
        }
        self.target = value.clamp(0.0, 1.0);

        if !self.animated {
            self.current = self.target;
            return self.render();
        }

        let start = self.current;
        let steps = self.config.progress_steps;
        for step in 1..=steps {
            self.current = if step == steps {
                self.target
            } else {
                start + (self.target - start) * (step as f64 / steps as f64)
            };
            self.render()?;

            if step < steps && !self.config.progress_step_delay.is_zero() {
                tokio::time::sleep(self.config.progress_step_delay).await;
            }
        }
        Ok(())
    }

    /// Bar, label and percentage for the current value, without line control
    pub fn render_line(&self) -> String {
        let width = self.config.progress_width;
        let scaled = self.current * width as f64;
        let filled = (scaled.floor() as usize).min(width);
        let fraction = scaled - filled as f64;

        let mut bar = String::with_capacity(width * 3);
        bar.extend(std::iter::repeat(FULL).take(filled));

        let mut used = filled;
        if fraction > 0.0 && used < width {
            let eighth = ((fraction * PARTIALS.len() as f64) as usize).min(PARTIALS.len() - 1);
            bar.push(PARTIALS[eighth]);
            used += 1;
        }
        bar.extend(std::iter::repeat(EMPTY).take(width - used));

        format!(
            "{} {:<label_width$} {:5.1}%",
            bar,
            self.label,
            self.current * 100.0,
            label_width = self.config.progress_label_width,
        )
    }

    /// Rewrite the line in place
    pub fn render(&self) -> Result<()> {
        self.sink
            .write_str(&format!("{}{}", CARRIAGE_RETURN, self.render_line()))?;
        Ok(())
    }

    /// End the line so later output starts below the bar
    pub fn finish(&self) -> Result<()> {
        self.sink.write_str("\n")?;
        Ok(())
    }
}
