//! End-to-end tick scenarios against scripted collaborators

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;

use memory_optimiser::{
    Collaborators, ExtendedCounters, MemorySampler, MemorySnapshot, Notifier, OptimizationConfig,
    OptimizationLoop, ReclaimInvoker, ReclaimOutcome, SampleError, TickOutcome,
};

const GB: f64 = 1024.0 * 1024.0 * 1024.0;
const TOTAL: u64 = 100 * (1 << 27);

#[derive(Default)]
struct Calls {
    samples: usize,
    reclaims: usize,
    notifications: Vec<String>,
}

struct Scripted {
    readings: Mutex<VecDeque<MemorySnapshot>>,
    reclaim: ReclaimOutcome,
    calls: Arc<Mutex<Calls>>,
}

impl MemorySampler for Scripted {
    fn sample(&self) -> Result<MemorySnapshot, SampleError> {
        self.calls.lock().unwrap().samples += 1;
        self.readings
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| SampleError::Query("script exhausted".to_string()))
    }
}

#[async_trait]
impl ReclaimInvoker for Scripted {
    async fn reclaim(&self) -> ReclaimOutcome {
        self.calls.lock().unwrap().reclaims += 1;
        self.reclaim.clone()
    }
}

#[async_trait]
impl Notifier for Scripted {
    async fn notify(&self, message: &str) {
        self.calls.lock().unwrap().notifications.push(message.to_string());
    }
}

/// Records the level of every event emitted while installed
#[derive(Clone, Default)]
struct LevelRecorder {
    levels: Arc<Mutex<Vec<Level>>>,
}

impl LevelRecorder {
    fn install(&self) -> DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    fn count(&self, level: Level) -> usize {
        self.levels
            .lock()
            .unwrap()
            .iter()
            .filter(|l| **l == level)
            .count()
    }
}

impl<S: Subscriber> Layer<S> for LevelRecorder {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.levels.lock().unwrap().push(*event.metadata().level());
    }
}

fn at_percent(percent: u64) -> MemorySnapshot {
    MemorySnapshot::from_counters(TOTAL, TOTAL / 100 * (100 - percent), ExtendedCounters::default())
}

fn scenario(
    auto: bool,
    readings: Vec<MemorySnapshot>,
    reclaim: ReclaimOutcome,
) -> (OptimizationLoop, Arc<Mutex<Calls>>) {
    let calls = Arc::new(Mutex::new(Calls::default()));
    let scripted = Arc::new(Scripted {
        readings: Mutex::new(readings.into()),
        reclaim,
        calls: calls.clone(),
    });
    let collaborators = Collaborators {
        sampler: scripted.clone(),
        reclaimer: scripted.clone(),
        notifier: scripted,
    };
    let config = OptimizationConfig::new(300, 75.0, auto).unwrap();
    (OptimizationLoop::new(config, collaborators), calls)
}

#[tokio::test]
async fn notify_only_over_threshold() {
    let (optimizer, calls) = scenario(false, vec![at_percent(80)], ReclaimOutcome::success("ok"));

    optimizer.tick().await;

    let calls = calls.lock().unwrap();
    assert_eq!(calls.reclaims, 0);
    assert_eq!(calls.notifications.len(), 1);
    assert!(calls.notifications[0].contains("80.0"));
}

#[tokio::test]
async fn auto_mode_reports_freed_gigabytes() {
    let before = at_percent(90);
    let after = MemorySnapshot::from_counters(
        TOTAL,
        before.free_bytes + (2.34 * GB) as u64,
        ExtendedCounters::default(),
    );
    let (optimizer, calls) = scenario(true, vec![before, after], ReclaimOutcome::success("ok"));

    let outcome = optimizer.tick().await;

    assert!(matches!(outcome, TickOutcome::Reclaimed { freed_bytes: Some(b) } if b > 0));
    let calls = calls.lock().unwrap();
    assert_eq!(calls.samples, 2);
    assert_eq!(calls.reclaims, 1);
    assert_eq!(calls.notifications, vec!["Memory optimised: 2.34GB freed"]);
}

#[tokio::test]
async fn below_threshold_is_silent() {
    let (optimizer, calls) = scenario(true, vec![at_percent(50)], ReclaimOutcome::success("ok"));

    optimizer.tick().await;

    let calls = calls.lock().unwrap();
    assert_eq!(calls.samples, 1);
    assert_eq!(calls.reclaims, 0);
    assert!(calls.notifications.is_empty());
}

#[tokio::test]
async fn reclaim_failure_is_surfaced_once() {
    let (optimizer, calls) = scenario(
        true,
        vec![at_percent(90), at_percent(10)],
        ReclaimOutcome::failure("permission denied"),
    );

    optimizer.tick().await;

    let calls = calls.lock().unwrap();
    assert_eq!(calls.samples, 1);
    assert_eq!(calls.reclaims, 1);
    assert_eq!(calls.notifications.len(), 1);
    assert!(calls.notifications[0].contains("permission denied"));
}

#[tokio::test]
async fn notify_only_breach_logs_one_warning() {
    let (optimizer, _calls) = scenario(false, vec![at_percent(80)], ReclaimOutcome::success("ok"));
    let recorder = LevelRecorder::default();
    let _guard = recorder.install();

    optimizer.tick().await;

    assert_eq!(recorder.count(Level::WARN), 1);
    assert_eq!(recorder.count(Level::ERROR), 0);
    assert!(recorder.count(Level::INFO) >= 1);
}

#[tokio::test]
async fn normal_tick_logs_no_warning() {
    let (optimizer, _calls) = scenario(false, vec![at_percent(50)], ReclaimOutcome::success("ok"));
    let recorder = LevelRecorder::default();
    let _guard = recorder.install();

    optimizer.tick().await;

    assert_eq!(recorder.count(Level::INFO), 1);
    assert_eq!(recorder.count(Level::WARN), 0);
    assert_eq!(recorder.count(Level::ERROR), 0);
}

#[tokio::test]
async fn reclaim_failure_logs_one_error() {
    let (optimizer, _calls) = scenario(
        true,
        vec![at_percent(90)],
        ReclaimOutcome::failure("permission denied"),
    );
    let recorder = LevelRecorder::default();
    let _guard = recorder.install();

    optimizer.tick().await;

    assert_eq!(recorder.count(Level::WARN), 1);
    assert_eq!(recorder.count(Level::ERROR), 1);
}

#[tokio::test]
async fn sample_failure_logs_one_error() {
    let (optimizer, _calls) = scenario(true, Vec::new(), ReclaimOutcome::success("ok"));
    let recorder = LevelRecorder::default();
    let _guard = recorder.install();

    let outcome = optimizer.tick().await;

    assert!(matches!(outcome, TickOutcome::SampleFailed { .. }));
    assert_eq!(recorder.count(Level::ERROR), 1);
    assert_eq!(recorder.count(Level::INFO), 0);
}
