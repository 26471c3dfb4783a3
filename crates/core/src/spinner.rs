//! Glyph-cycling spinner with its own tick loop

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use crate::config::AnimationConfig;
use crate::lifecycle::{self, Lifecycle, LoopControl};
use crate::sink::{OutputSink, StdoutSink, CARRIAGE_RETURN};
use crate::Result;

/// Braille frames cycled by the spinner
pub const SPINNER_FRAMES: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

struct SpinnerState {
    index: usize,
    label: String,
    /// Widest label drawn since the last start, in chars
    widest: usize,
    control: LoopControl,
}

type SharedState = Arc<Mutex<SpinnerState>>;

fn lock(shared: &SharedState) -> MutexGuard<'_, SpinnerState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-place spinner
///
/// Tick writes and the erase on stop both happen under the state lock, so
/// once `stop` returns no further glyph frame can reach the sink.
pub struct Spinner {
    shared: SharedState,
    sink: Arc<dyn OutputSink>,
    tick: Duration,
    erase_pad: usize,
}

impl Spinner {
    /// Spinner drawing to stdout at the default tick
    pub fn new(label: impl Into<String>) -> Self {
        let config = AnimationConfig::default();
        Self::build(label.into(), Arc::new(StdoutSink), &config)
    }

    /// Spinner drawing to `sink` with the given timing
    pub fn with_output(
        label: impl Into<String>,
        sink: Arc<dyn OutputSink>,
        config: AnimationConfig,
    ) -> Result<Self> {
        config.validate_spinner()?;
        Ok(Self::build(label.into(), sink, &config))
    }

    fn build(label: String, sink: Arc<dyn OutputSink>, config: &AnimationConfig) -> Self {
        Self {
            shared: Arc::new(Mutex::new(SpinnerState {
                index: 0,
                label,
                widest: 0,
                control: LoopControl::new(),
            })),
            sink,
            tick: config.spinner_tick,
            erase_pad: config.spinner_erase_pad,
        }
    }

    /// Begin cycling; a no-op while already running
    pub fn start(&self) -> Result<()> {
        let handle = lifecycle::runtime()?;

        let mut state = lock(&self.shared);
        let Some(cancel) = state.control.begin()? else {
            return Ok(());
        };
        state.widest = 0;
        drop(state);

        tracing::debug!("Spinner starting every {:?}", self.tick);
        handle.spawn(spin_loop(self.shared.clone(), self.sink.clone(), self.tick, cancel));
        Ok(())
    }

    /// Stop cycling and blank out the line; repeated calls do nothing
    pub fn stop(&self) {
        let mut state = lock(&self.shared);
        if !state.control.end() {
            return;
        }

        let drawn = state.widest.max(state.label.chars().count());
        let blank = " ".repeat(drawn + self.erase_pad);
        if let Err(e) = self
            .sink
            .write_str(&format!("{}{}{}", CARRIAGE_RETURN, blank, CARRIAGE_RETURN))
        {
            tracing::warn!("Failed to erase spinner: {}", e);
        }
        tracing::debug!("Spinner stopped");
    }

    /// Allow a stopped spinner to start again
    pub fn rearm(&self) {
        lock(&self.shared).control.rearm();
    }

    /// Replace the label shown next to the glyph
    pub fn set_label(&self, label: impl Into<String>) {
        lock(&self.shared).label = label.into();
    }

    pub fn label(&self) -> String {
        lock(&self.shared).label.clone()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        lock(&self.shared).control.state()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.shared).control.is_running()
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn spin_loop(
    shared: SharedState,
    sink: Arc<dyn OutputSink>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = interval(period);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let mut state = lock(&shared);
                // stop() cancels while holding this lock
                if cancel.is_cancelled() {
                    break;
                }
                let glyph = SPINNER_FRAMES[state.index];
                state.index = (state.index + 1) % SPINNER_FRAMES.len();
                state.widest = state.widest.max(state.label.chars().count());
                if let Err(e) = sink.write_str(&format!("{}{} {}", CARRIAGE_RETURN, glyph, state.label)) {
                    tracing::warn!("Failed to draw spinner: {}", e);
                }
            }
        }
    }

    tracing::debug!("Spinner loop exited");
}
