//! Periodically refreshed chart on top of an [`Animator`]
//!
//! The chart polls a caller-supplied producer at its own interval and feeds
//! each result to the Animator, whose redraw rate is independent. A slow
//! producer therefore never throttles redraws, and vice versa.
//!
//! Producer failures (errors and panics) skip that tick and are recorded;
//! the refresh loop keeps running.
//!
//! Producers run without any chart lock held, and loop refreshes run on the
//! blocking pool, so a producer may block or query the chart itself.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::animator::Animator;
use crate::config::AnimationConfig;
use crate::lifecycle::{self, Lifecycle, LoopControl};
use crate::transition::TransitionKind;
use crate::{RenderError, Result};

/// Content producer polled by the chart
pub type Producer = Arc<dyn Fn() -> anyhow::Result<String> + Send + Sync>;

/// Refresh bookkeeping shared with the loop task
#[derive(Default)]
struct ChartStats {
    applied: AtomicU64,
    skipped: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl ChartStats {
    fn last_error(&self) -> MutexGuard<'_, Option<String>> {
        self.last_error.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Live chart whose data refresh is decoupled from its redraw cadence
pub struct LiveChart {
    animator: Arc<Animator>,
    producer: Producer,
    interval: Duration,
    transition: TransitionKind,
    control: Mutex<LoopControl>,
    stats: Arc<ChartStats>,
}

impl LiveChart {
    /// Chart drawing to stdout through an Animator at the default chart rate
    pub fn new<F>(producer: F, interval: Duration) -> Result<Self>
    where
        F: Fn() -> anyhow::Result<String> + Send + Sync + 'static,
    {
        let animator = Animator::new(AnimationConfig::default().chart_frame_rate)?;
        Self::with_animator(producer, interval, animator)
    }

    /// Chart driving a caller-built Animator
    pub fn with_animator<F>(producer: F, interval: Duration, animator: Animator) -> Result<Self>
    where
        F: Fn() -> anyhow::Result<String> + Send + Sync + 'static,
    {
        if interval.is_zero() {
            return Err(RenderError::InvalidConfig("refresh interval must be positive".into()));
        }

        Ok(Self {
            animator: Arc::new(animator),
            producer: Arc::new(producer),
            interval,
            transition: TransitionKind::Smooth,
            control: Mutex::new(LoopControl::new()),
            stats: Arc::new(ChartStats::default()),
        })
    }

    /// Transition used when feeding produced content to the Animator
    pub fn with_transition(mut self, kind: TransitionKind) -> Self {
        self.transition = kind;
        self
    }

    fn control(&self) -> MutexGuard<'_, LoopControl> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Produce once synchronously, start the Animator, then start polling
    ///
    /// A no-op while already running.
    pub fn start(&self) -> Result<()> {
        let handle = lifecycle::runtime()?;

        let Some(cancel) = self.control().begin()? else {
            return Ok(());
        };

        apply_refresh(produce(&self.producer), &self.animator, self.transition, &self.stats);
        if let Err(e) = self.animator.start() {
            if !cancel.is_cancelled() {
                self.control().abort();
            }
            return Err(e);
        }
        if cancel.is_cancelled() {
            // stop() ran while the first refresh was in flight
            self.animator.stop();
            return Ok(());
        }

        tracing::debug!("LiveChart refresh loop starting every {:?}", self.interval);
        handle.spawn(refresh_loop(
            self.producer.clone(),
            self.animator.clone(),
            self.transition,
            self.interval,
            self.stats.clone(),
            cancel,
        ));
        Ok(())
    }

    /// Stop polling and stop the owned Animator
    pub fn stop(&self) {
        if self.control().end() {
            tracing::debug!("LiveChart refresh loop stopped");
        }
        self.animator.stop();
    }

    /// Allow a stopped chart (and its Animator) to start again
    pub fn rearm(&self) {
        self.control().rearm();
        self.animator.rearm();
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.control().state()
    }

    pub fn is_running(&self) -> bool {
        self.control().is_running()
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Message of the most recent producer failure
    pub fn last_error(&self) -> Option<String> {
        self.stats.last_error().clone()
    }

    /// Refreshes that reached the Animator
    pub fn applied_ticks(&self) -> u64 {
        self.stats.applied.load(Ordering::Relaxed)
    }

    /// Refreshes dropped because the producer failed
    pub fn skipped_ticks(&self) -> u64 {
        self.stats.skipped.load(Ordering::Relaxed)
    }
}

impl Drop for LiveChart {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Invoke the producer, converting errors and panics into `Producer` errors
fn produce(producer: &Producer) -> Result<String> {
    match catch_unwind(AssertUnwindSafe(|| producer())) {
        Ok(Ok(content)) => Ok(content),
        Ok(Err(e)) => Err(RenderError::Producer(format!("{:#}", e))),
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "producer panicked".to_string());
            Err(RenderError::Producer(message))
        }
    }
}

/// Run the producer on the blocking pool so a slow call never stalls a worker
async fn produce_blocking(producer: &Producer) -> Result<String> {
    let job = producer.clone();
    match tokio::task::spawn_blocking(move || produce(&job)).await {
        Ok(result) => result,
        Err(e) => Err(RenderError::Producer(format!("producer task failed: {}", e))),
    }
}

fn apply_refresh(
    result: Result<String>,
    animator: &Animator,
    kind: TransitionKind,
    stats: &ChartStats,
) {
    match result {
        Ok(content) => {
            animator.update_frame(&content, kind);
            stats.applied.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            tracing::warn!("Skipping chart refresh: {}", e);
            stats.skipped.fetch_add(1, Ordering::Relaxed);
            *stats.last_error() = Some(e.to_string());
        }
    }
}

async fn refresh_loop(
    producer: Producer,
    animator: Arc<Animator>,
    kind: TransitionKind,
    period: Duration,
    stats: Arc<ChartStats>,
    cancel: CancellationToken,
) {
    let mut ticker = interval(period);
    // A producer slower than the period drops ticks instead of bursting
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // First tick completes immediately; start() already refreshed once
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let result = produce_blocking(&producer).await;
                if cancel.is_cancelled() {
                    break;
                }
                apply_refresh(result, &animator, kind, &stats);
            }
        }
    }

    tracing::debug!("LiveChart refresh loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crate::viewport::{FixedProbe, Viewport};
    use std::sync::atomic::AtomicUsize;
    use std::sync::{OnceLock, Weak};

    fn test_animator(sink: &MemorySink) -> Animator {
        let probe = FixedProbe(Some(Viewport::new(80, 24)));
        Animator::with_output(10, Arc::new(sink.clone()), &probe).unwrap()
    }

    fn counting_producer() -> (Arc<AtomicUsize>, impl Fn() -> anyhow::Result<String> + Send + Sync) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let producer = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("reading {}", n))
        };
        (calls, producer)
    }

    #[test]
    fn test_zero_interval_rejected() {
        let sink = MemorySink::new();
        let result = LiveChart::with_animator(|| Ok(String::new()), Duration::ZERO, test_animator(&sink));
        assert!(matches!(result, Err(RenderError::InvalidConfig(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_produces_synchronously() {
        let sink = MemorySink::new();
        let (calls, producer) = counting_producer();
        let chart =
            LiveChart::with_animator(producer, Duration::from_secs(1), test_animator(&sink)).unwrap();

        chart.start().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(chart.animator().current_content(), "reading 1");
        assert!(chart.animator().is_running());
        chart.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_cadence_independent_of_redraw() {
        let sink = MemorySink::new();
        let (calls, producer) = counting_producer();
        let chart =
            LiveChart::with_animator(producer, Duration::from_millis(250), test_animator(&sink)).unwrap();

        chart.start().unwrap();
        chart.start().unwrap();
        tokio::time::sleep(Duration::from_millis(950)).await;
        chart.stop();

        // Produced at 0 (sync), 250, 500, 750; redrawn every 100ms
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(chart.applied_ticks(), 4);
        assert_eq!(sink.len(), 10);
        assert!(sink.last().unwrap().ends_with("reading 4"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_producer_skips_tick_and_continues() {
        let sink = MemorySink::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let producer = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if n == 2 {
                anyhow::bail!("sensor bus timeout");
            }
            if n == 3 {
                panic!("aggregation blew up");
            }
            Ok(format!("tick {}", n))
        };
        let chart =
            LiveChart::with_animator(producer, Duration::from_millis(100), test_animator(&sink)).unwrap();

        chart.start().unwrap();
        tokio::time::sleep(Duration::from_millis(350)).await;
        chart.stop();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(chart.skipped_ticks(), 2);
        assert_eq!(chart.applied_ticks(), 2);
        assert_eq!(chart.last_error().as_deref(), Some("Content producer failed: aggregation blew up"));
        assert_eq!(chart.animator().current_content(), "tick 4");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_stops_animator_and_is_idempotent() {
        let sink = MemorySink::new();
        let (calls, producer) = counting_producer();
        let chart =
            LiveChart::with_animator(producer, Duration::from_millis(100), test_animator(&sink)).unwrap();

        chart.stop();
        assert_eq!(chart.lifecycle(), Lifecycle::Idle);

        chart.start().unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        chart.stop();
        chart.stop();

        assert_eq!(chart.lifecycle(), Lifecycle::Stopped);
        assert_eq!(chart.animator().lifecycle(), Lifecycle::Stopped);

        tokio::time::sleep(Duration::from_millis(10)).await;
        let produced = calls.load(Ordering::SeqCst);
        let drawn = sink.len();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), produced);
        assert_eq!(sink.len(), drawn);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_first_refresh_still_starts() {
        let sink = MemorySink::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let producer = move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                anyhow::bail!("meter offline");
            }
            Ok("recovered".to_string())
        };
        let chart =
            LiveChart::with_animator(producer, Duration::from_millis(100), test_animator(&sink)).unwrap();

        chart.start().unwrap();
        assert!(chart.is_running());
        assert!(chart.animator().is_running());
        assert_eq!(chart.skipped_ticks(), 1);
        assert_eq!(chart.applied_ticks(), 0);
        assert_eq!(chart.last_error().as_deref(), Some("Content producer failed: meter offline"));
        assert_eq!(chart.animator().current_content(), "");

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(chart.applied_ticks(), 1);
        assert_eq!(chart.animator().current_content(), "recovered");
        chart.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_producer_may_query_chart() {
        let sink = MemorySink::new();
        let slot: Arc<OnceLock<Weak<LiveChart>>> = Arc::new(OnceLock::new());
        let reader = slot.clone();
        let producer = move || {
            let running = reader.get().and_then(Weak::upgrade).map(|chart| chart.is_running());
            Ok(format!("running={}", running.unwrap_or(false)))
        };
        let chart = Arc::new(
            LiveChart::with_animator(producer, Duration::from_millis(100), test_animator(&sink)).unwrap(),
        );
        slot.set(Arc::downgrade(&chart)).unwrap();

        chart.start().unwrap();
        assert_eq!(chart.animator().current_content(), "running=true");

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(chart.applied_ticks(), 2);
        chart.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_refresh_and_redraw() {
        let sink = MemorySink::new();
        let (calls, producer) = counting_producer();
        let chart =
            LiveChart::with_animator(producer, Duration::from_millis(100), test_animator(&sink)).unwrap();

        chart.start().unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        drop(chart);

        tokio::time::sleep(Duration::from_millis(10)).await;
        let produced = calls.load(Ordering::SeqCst);
        let drawn = sink.len();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), produced);
        assert_eq!(sink.len(), drawn);
    }

    #[tokio::test]
    async fn test_slow_producer_does_not_stall_redraw() {
        let sink = MemorySink::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let producer = move || {
            if counter.fetch_add(1, Ordering::SeqCst) > 0 {
                std::thread::sleep(Duration::from_millis(300));
            }
            Ok("slow reading".to_string())
        };
        let chart =
            LiveChart::with_animator(producer, Duration::from_millis(100), test_animator(&sink)).unwrap();

        chart.start().unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        chart.stop();

        // 10 FPS for one second on a current-thread runtime
        assert!(sink.len() >= 7, "only {} frames drawn", sink.len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_allows_restart() {
        let sink = MemorySink::new();
        let (calls, producer) = counting_producer();
        let chart =
            LiveChart::with_animator(producer, Duration::from_millis(100), test_animator(&sink)).unwrap();

        chart.start().unwrap();
        chart.stop();
        assert!(chart.start().is_err());

        chart.rearm();
        chart.start().unwrap();
        assert!(chart.is_running());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        chart.stop();
    }
}
