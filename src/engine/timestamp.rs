//! Background-refreshed timestamp for the `time` tag
//!
//! Formatting the current time on every request is wasted work at the
//! resolution access logs need. The cache formats it once per interval on a
//! single background task and hands out the latest complete string.

use crate::config::TimeZone;
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Renders "now" in a zone with a strftime layout.
#[derive(Debug, Clone)]
pub struct Clock {
    zone: TimeZone,
    layout: String,
}

impl Clock {
    pub fn new(zone: TimeZone, layout: impl Into<String>) -> Self {
        Self {
            zone,
            layout: layout.into(),
        }
    }

    pub fn now(&self) -> String {
        self.zone.format_now(&self.layout)
    }
}

enum Refresher {
    Task(JoinHandle<()>),
    Thread(std::thread::JoinHandle<()>),
}

/// Single-writer, many-reader cache of the formatted current time.
///
/// Readers never block and always observe one complete value. The refresh
/// loop stops on [`TimestampCache::shutdown`] or when the cache is dropped.
pub struct TimestampCache {
    current: Arc<ArcSwap<String>>,
    cancel: CancellationToken,
    refresher: Option<Refresher>,
}

impl TimestampCache {
    /// Format the initial value synchronously and, if `refresh` is set, start
    /// the refresh loop.
    ///
    /// The loop runs on the current tokio runtime when there is one and on a
    /// dedicated thread otherwise.
    pub fn new(clock: Clock, interval: Duration, refresh: bool) -> Self {
        let current = Arc::new(ArcSwap::from_pointee(clock.now()));
        let cancel = CancellationToken::new();

        let refresher = if refresh {
            spawn_refresher(clock, interval, Arc::clone(&current), cancel.clone())
        } else {
            None
        };

        Self {
            current,
            cancel,
            refresher,
        }
    }

    /// The most recently stored timestamp.
    pub fn load(&self) -> Arc<String> {
        self.current.load_full()
    }

    /// Whether the refresh loop is still running.
    pub fn is_refreshing(&self) -> bool {
        match &self.refresher {
            Some(Refresher::Task(handle)) => !handle.is_finished(),
            Some(Refresher::Thread(handle)) => !handle.is_finished(),
            None => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn shared_value(&self) -> Arc<ArcSwap<String>> {
        Arc::clone(&self.current)
    }

    /// Stop the refresh loop. The last value stays readable.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for TimestampCache {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn spawn_refresher(
    clock: Clock,
    interval: Duration,
    current: Arc<ArcSwap<String>>,
    cancel: CancellationToken,
) -> Option<Refresher> {
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        let task = handle.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately and the value is already fresh.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => current.store(Arc::new(clock.now())),
                }
            }
            tracing::debug!("timestamp refresh task stopped");
        });
        return Some(Refresher::Task(task));
    }

    let spawned = std::thread::Builder::new()
        .name("reqlog-clock".to_string())
        .spawn(move || {
            while !cancel.is_cancelled() {
                std::thread::sleep(interval);
                current.store(Arc::new(clock.now()));
            }
            tracing::debug!("timestamp refresh thread stopped");
        });

    match spawned {
        Ok(thread) => Some(Refresher::Thread(thread)),
        Err(e) => {
            tracing::warn!(error = %e, "failed to spawn timestamp refresh thread, time will not advance");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn precise_clock() -> Clock {
        Clock::new(TimeZone::Utc, "%H:%M:%S%.9f")
    }

    #[test]
    fn test_initial_value_available_without_refresh() {
        let cache = TimestampCache::new(precise_clock(), Duration::from_millis(500), false);
        assert!(!cache.load().is_empty());
        assert!(!cache.is_refreshing());
    }

    #[test]
    fn test_value_is_stable_without_refresh() {
        let cache = TimestampCache::new(precise_clock(), Duration::from_millis(500), false);
        let first = cache.load();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.load(), first);
    }

    #[tokio::test]
    async fn test_refresh_task_updates_value() {
        let cache = TimestampCache::new(precise_clock(), Duration::from_millis(500), true);
        assert!(cache.is_refreshing());

        let first = cache.load();
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_ne!(cache.load(), first);
    }

    #[tokio::test]
    async fn test_shutdown_stops_task() {
        let cache = TimestampCache::new(precise_clock(), Duration::from_millis(500), true);
        cache.shutdown();

        for _ in 0..50 {
            if !cache.is_refreshing() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!cache.is_refreshing());

        let last = cache.load();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(cache.load(), last);
    }

    #[test]
    fn test_thread_fallback_outside_runtime() {
        let cache = TimestampCache::new(precise_clock(), Duration::from_millis(500), true);
        assert!(cache.is_refreshing());

        let first = cache.load();
        std::thread::sleep(Duration::from_millis(700));
        assert_ne!(cache.load(), first);

        cache.shutdown();
        std::thread::sleep(Duration::from_millis(600));
        assert!(!cache.is_refreshing());
    }
}
