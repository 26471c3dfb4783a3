//! Simulated floor telemetry for the chart demo
//!
//! Stands in for the building-facing producers: each call renders one
//! temperature bar per floor.

use anyhow::Result;
use std::sync::atomic::{AtomicU64, Ordering};

/// Label column width, e.g. "Floor 12 "
const LABEL_WIDTH: usize = 9;
/// Reading column width, e.g. " 23.4°C"
const READING_WIDTH: usize = 8;
const MIN_TEMP: f64 = 15.0;
const MAX_TEMP: f64 = 30.0;

/// Deterministic temperature generator
pub struct FloorTelemetry {
    floors: usize,
    sample: AtomicU64,
}

impl FloorTelemetry {
    pub fn new(floors: usize) -> Self {
        Self {
            floors: floors.max(1),
            sample: AtomicU64::new(0),
        }
    }

    /// Temperature of `floor` at sample `n`
    fn reading(floor: usize, n: u64) -> f64 {
        let phase = n as f64 * 0.35 + floor as f64 * 1.1;
        22.0 + 4.5 * phase.sin() + 1.5 * (phase * 0.37).cos()
    }

    /// Render the next sample as one bar row per floor
    pub fn render(&self, width: usize) -> Result<String> {
        let n = self.sample.fetch_add(1, Ordering::Relaxed);
        let bar_width = width.saturating_sub(LABEL_WIDTH + READING_WIDTH).max(1);

        let mut rows = Vec::with_capacity(self.floors + 1);
        rows.push(format!("Building telemetry - sample {}", n));
        for floor in 1..=self.floors {
            let temp = Self::reading(floor, n);
            let ratio = ((temp - MIN_TEMP) / (MAX_TEMP - MIN_TEMP)).clamp(0.0, 1.0);
            let filled = (ratio * bar_width as f64).round() as usize;
            rows.push(format!(
                "Floor {:<3}{}{} {:5.1}°C",
                floor,
                "█".repeat(filled),
                "·".repeat(bar_width - filled),
                temp
            ));
        }
        Ok(rows.join("\n"))
    }
}
