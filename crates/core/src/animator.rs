//! Frame animator with a fixed-rate render loop
//!
//! The Animator owns the current and previous frames. `update_frame` runs the
//! transition engine under the state lock; the render loop snapshots the
//! current content under the same lock and writes it after releasing it, so
//! slow terminals never block producers.
//!
//! The loop redraws on every tick whether or not the content changed.
//! Callers that care about bandwidth should skip redundant updates.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use crate::frame::Frame;
use crate::lifecycle::{self, Lifecycle, LoopControl};
use crate::sink::{clear_screen, OutputSink, StdoutSink};
use crate::transition::{self, TransitionKind};
use crate::viewport::{TerminalProbe, Viewport, ViewportProbe};
use crate::{RenderError, Result};

/// Frame fields and loop lifecycle, guarded together
struct AnimatorState {
    current: Frame,
    previous: Frame,
    control: LoopControl,
}

type SharedState = Arc<Mutex<AnimatorState>>;

fn lock(shared: &SharedState) -> MutexGuard<'_, AnimatorState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Continuously redrawn frame with transitions between updates
pub struct Animator {
    shared: SharedState,
    sink: Arc<dyn OutputSink>,
    frame_interval: Duration,
    viewport: Viewport,
}

impl Animator {
    /// Animator drawing to stdout, sized from the controlling terminal
    pub fn new(target_fps: u32) -> Result<Self> {
        Self::with_output(target_fps, Arc::new(StdoutSink), &TerminalProbe)
    }

    /// Animator drawing to `sink`, with the viewport queried once from `probe`
    pub fn with_output(
        target_fps: u32,
        sink: Arc<dyn OutputSink>,
        probe: &dyn ViewportProbe,
    ) -> Result<Self> {
        if target_fps == 0 {
            return Err(RenderError::InvalidConfig("target FPS must be positive".into()));
        }

        Ok(Self {
            shared: Arc::new(Mutex::new(AnimatorState {
                current: Frame::empty(),
                previous: Frame::empty(),
                control: LoopControl::new(),
            })),
            sink,
            frame_interval: Duration::from_nanos(1_000_000_000 / u64::from(target_fps)),
            viewport: Viewport::detect(probe),
        })
    }

    /// Begin the render loop; a no-op while already running
    pub fn start(&self) -> Result<()> {
        let handle = lifecycle::runtime()?;

        let mut state = lock(&self.shared);
        let Some(cancel) = state.control.begin()? else {
            return Ok(());
        };
        drop(state);

        tracing::debug!("Animator render loop starting at {:?}/frame", self.frame_interval);
        handle.spawn(render_loop(
            self.shared.clone(),
            self.sink.clone(),
            self.frame_interval,
            cancel,
        ));
        Ok(())
    }

    /// Signal the render loop to exit without waiting for it
    ///
    /// Safe to call any number of times.
    pub fn stop(&self) {
        if lock(&self.shared).control.end() {
            tracing::debug!("Animator render loop stopped");
        }
    }

    /// Allow a stopped Animator to be started again
    pub fn rearm(&self) {
        lock(&self.shared).control.rearm();
    }

    /// Transition from the previous frame to `content`, then rotate
    /// previous <- current <- result
    pub fn update_frame(&self, content: &str, kind: TransitionKind) {
        let width = usize::from(self.viewport.width);
        let mut state = lock(&self.shared);

        let displayed = transition::apply(kind, &state.previous.content, content, width);
        let next = Frame::new(displayed);
        state.previous = std::mem::replace(&mut state.current, next);
    }

    /// Content the next tick will draw
    pub fn current_content(&self) -> String {
        lock(&self.shared).current.content.clone()
    }

    pub fn previous_content(&self) -> String {
        lock(&self.shared).previous.content.clone()
    }

    pub fn current_frame(&self) -> Frame {
        lock(&self.shared).current.clone()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    pub fn lifecycle(&self) -> Lifecycle {
        lock(&self.shared).control.state()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.shared).control.is_running()
    }
}

impl Drop for Animator {
    fn drop(&mut self) {
        lock(&self.shared).control.end();
    }
}

async fn render_loop(
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
                let snapshot = lock(&shared).current.content.clone();
                let output = format!("{}{}", clear_screen(), snapshot);
                if let Err(e) = sink.write_str(&output) {
                    tracing::warn!("Failed to draw frame: {}", e);
                }
                tracing::trace!("Frame drawn ({} bytes)", snapshot.len());
            }
        }
    }

    tracing::debug!("Animator render loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crate::viewport::FixedProbe;

    fn animator(fps: u32, width: u16) -> (Animator, MemorySink) {
        let sink = MemorySink::new();
        let probe = FixedProbe(Some(Viewport::new(width, 24)));
        let animator = Animator::with_output(fps, Arc::new(sink.clone()), &probe).unwrap();
        (animator, sink)
    }

    #[test]
    fn test_new_computes_interval_and_viewport() {
        let (animator, _) = animator(10, 100);
        assert_eq!(animator.frame_interval(), Duration::from_millis(100));
        assert_eq!(animator.viewport(), Viewport::new(100, 24));
        assert_eq!(animator.lifecycle(), Lifecycle::Idle);
    }

    #[test]
    fn test_zero_fps_rejected() {
        let result = Animator::with_output(0, Arc::new(MemorySink::new()), &FixedProbe(None));
        assert!(matches!(result, Err(RenderError::InvalidConfig(_))));
    }

    #[test]
    fn test_viewport_defaults_when_probe_fails() {
        let animator =
            Animator::with_output(30, Arc::new(MemorySink::new()), &FixedProbe(None)).unwrap();
        assert_eq!(animator.viewport(), Viewport::new(80, 24));
    }

    #[test]
    fn test_update_frame_rotates_frames() {
        let (animator, _) = animator(30, 80);
        animator.update_frame("first", TransitionKind::None);
        animator.update_frame("second", TransitionKind::Smooth);

        assert_eq!(animator.current_content(), "second");
        assert_eq!(animator.previous_content(), "first");
    }

    #[test]
    fn test_update_frame_transitions_from_previous_frame() {
        let (animator, _) = animator(30, 80);
        animator.update_frame("o1\no2\no3\no4", TransitionKind::None);
        animator.update_frame("x", TransitionKind::None);
        assert_eq!(animator.previous_content(), "o1\no2\no3\no4");

        // Wipe reveals one new line over the previous frame, not over "x"
        animator.update_frame("n1\nn2\nn3", TransitionKind::Wipe);
        assert_eq!(animator.current_content(), "n1\no2\no3\no4");
        assert_eq!(animator.previous_content(), "x");
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_render_loop() {
        let (animator, sink) = animator(10, 80);
        animator.start().unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;

        drop(animator);
        tokio::time::sleep(Duration::from_millis(10)).await;
        let drawn = sink.len();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(sink.len(), drawn);
    }

    #[test]
    fn test_start_without_runtime_fails() {
        let (animator, _) = animator(30, 80);
        assert!(matches!(animator.start(), Err(RenderError::NoRuntime)));
        assert_eq!(animator.lifecycle(), Lifecycle::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_loop_draws_current_frame() {
        let (animator, sink) = animator(10, 80);
        animator.update_frame("hello", TransitionKind::None);
        animator.start().unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        let last = sink.last().unwrap();
        assert!(last.starts_with(&clear_screen()));
        assert!(last.ends_with("hello"));
        animator.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_redraws_unchanged_content_every_tick() {
        let (animator, sink) = animator(10, 80);
        animator.update_frame("static", TransitionKind::None);
        animator.start().unwrap();

        tokio::time::sleep(Duration::from_millis(450)).await;
        animator.stop();

        let writes = sink.writes();
        assert_eq!(writes.len(), 5);
        assert!(writes.iter().all(|w| w.ends_with("static")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_keeps_single_cadence() {
        let (animator, sink) = animator(10, 80);
        animator.start().unwrap();
        animator.start().unwrap();
        assert!(animator.is_running());

        tokio::time::sleep(Duration::from_millis(950)).await;
        animator.stop();

        assert_eq!(sink.len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_drawing() {
        let (animator, sink) = animator(10, 80);
        animator.start().unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;

        animator.stop();
        animator.stop();
        assert_eq!(animator.lifecycle(), Lifecycle::Stopped);

        tokio::time::sleep(Duration::from_millis(10)).await;
        let drawn = sink.len();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(sink.len(), drawn);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_requires_rearm() {
        let (animator, sink) = animator(10, 80);
        animator.start().unwrap();
        animator.stop();

        assert!(matches!(animator.start(), Err(RenderError::InvalidState(_))));

        animator.rearm();
        animator.start().unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(sink.len() >= 2);
        animator.stop();
    }

    #[test]
    fn test_concurrent_slide_updates_never_tear() {
        let (animator, _) = animator(30, 40);
        let animator = Arc::new(animator);
        let tall = (0..12).map(|i| format!("tall line {:02} with some padding", i)).collect::<Vec<_>>();
        let short = (0..5).map(|i| format!("short {}", i)).collect::<Vec<_>>();
        let tall = tall.join("\n");
        let short = short.join("\n");

        let handles: Vec<_> = [tall.clone(), short.clone()]
            .into_iter()
            .map(|content| {
                let animator = animator.clone();
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        animator.update_frame(&content, TransitionKind::Slide);
                        let shown = animator.current_content();
                        let lines: Vec<&str> = shown.split('\n').collect();
                        assert!(lines.len() <= 12);
                        assert!(lines.iter().all(|l| l.chars().count() <= 40));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
