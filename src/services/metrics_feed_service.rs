use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::external::metrics_source::{FetchError, MetricsSource};
use crate::models::{MetricSnapshot, MetricsIdentity};
use crate::services::metrics_window::{MergeOutcome, MetricsWindow};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);
/// Feeds nobody has read for this long are stopped and dropped.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(300);

/// What a consumer sees of a feed at one instant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowView {
    pub identity: Option<MetricsIdentity>,
    pub points: Vec<MetricSnapshot>,
    pub initialized: bool,
    pub is_error: bool,
    pub error: Option<String>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub update_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied(MergeOutcome),
    /// The identity changed while the fetch was in flight; the result was dropped.
    Stale,
}

/// One dashboard view's metrics window plus the background task keeping it
/// fresh. Cloning shares the same feed.
#[derive(Clone)]
pub struct MetricsFeed {
    inner: Arc<FeedInner>,
}

struct FeedInner {
    source: Arc<dyn MetricsSource>,
    refresh_interval: Duration,
    state: Mutex<FeedState>,
    /// Held for the duration of a fetch. Timer ticks only `try_lock` it.
    in_flight: tokio::sync::Mutex<()>,
    last_accessed: Mutex<Instant>,
}

#[derive(Default)]
struct FeedState {
    identity: Option<MetricsIdentity>,
    /// Bumped on every identity change; results carry the generation they were
    /// started under.
    generation: u64,
    window: MetricsWindow,
    last_error: Option<FetchError>,
    last_updated_at: Option<DateTime<Utc>>,
    update_count: u64,
    refresh_task: Option<CancellationToken>,
}

impl MetricsFeed {
    pub fn new(source: Arc<dyn MetricsSource>, refresh_interval: Duration) -> Self {
        Self {
            inner: Arc::new(FeedInner {
                source,
                refresh_interval,
                state: Mutex::new(FeedState::default()),
                in_flight: tokio::sync::Mutex::new(()),
                last_accessed: Mutex::new(Instant::now()),
            }),
        }
    }

    /// Mark the feed as read by its consumer.
    pub fn touch(&self) {
        *self.inner.last_accessed.lock() = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.inner.last_accessed.lock().elapsed()
    }

    /// Point the feed at a query identity.
    ///
    /// Returns `false` when the identity is unchanged. Otherwise the window is
    /// reset before returning, the previous refresh task is cancelled and a new
    /// one is spawned for the new identity. Must be called inside a tokio
    /// runtime.
    pub fn set_identity(&self, identity: MetricsIdentity) -> bool {
        let (token, generation) = {
            let mut state = self.inner.state.lock();
            if state.identity.as_ref() == Some(&identity) {
                return false;
            }
            if let Some(previous) = state.refresh_task.take() {
                previous.cancel();
            }

            info!(
                "📈 Metrics feed now tracking {} / {} ({} → {})",
                identity.email, identity.famille, identity.start_date, identity.end_date
            );

            state.identity = Some(identity);
            state.generation += 1;
            state.window.reset();
            state.last_error = None;
            state.last_updated_at = None;
            state.update_count = 0;

            let token = CancellationToken::new();
            state.refresh_task = Some(token.clone());
            (token, state.generation)
        };

        tokio::spawn(poll(
            Arc::downgrade(&self.inner),
            self.inner.refresh_interval,
            generation,
            token,
        ));
        true
    }

    /// Fetch once for the current identity and merge the result.
    ///
    /// Waits for any fetch already in flight. A fetch error is recorded on the
    /// feed (see [`WindowView::is_error`]) and also returned.
    pub async fn refresh(&self) -> Result<RefreshOutcome, AppError> {
        let _in_flight = self.inner.in_flight.lock().await;
        let generation = self.inner.state.lock().generation;
        self.inner.fetch_and_apply(generation).await
    }

    pub fn view(&self) -> WindowView {
        let state = self.inner.state.lock();
        WindowView {
            identity: state.identity.clone(),
            points: state.window.points().to_vec(),
            initialized: state.window.is_initialized(),
            is_error: state.last_error.is_some(),
            error: state.last_error.as_ref().map(|e| e.to_string()),
            last_updated_at: state.last_updated_at,
            update_count: state.update_count,
        }
    }

    #[allow(dead_code)]
    pub fn is_polling(&self) -> bool {
        self.inner
            .state
            .lock()
            .refresh_task
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    /// Stop background refreshes. The retained window stays readable.
    pub fn shutdown(&self) {
        if let Some(token) = self.inner.state.lock().refresh_task.take() {
            token.cancel();
        }
    }
}

impl FeedInner {
    async fn fetch_and_apply(&self, generation: u64) -> Result<RefreshOutcome, AppError> {
        let identity = {
            let state = self.state.lock();
            if state.generation != generation {
                return Ok(RefreshOutcome::Stale);
            }
            match &state.identity {
                Some(identity) => identity.clone(),
                None => {
                    return Err(AppError::Validation(
                        "metrics feed has no query yet".to_string(),
                    ))
                }
            }
        };

        let result = self.source.fetch_metrics(&identity).await;

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(
                "Discarding metrics for superseded query {} / {}",
                identity.email, identity.famille
            );
            return Ok(RefreshOutcome::Stale);
        }

        match result {
            Ok(points) => {
                let received = points.len();
                let outcome = state.window.merge(points);
                state.last_error = None;
                state.last_updated_at = Some(Utc::now());
                state.update_count += 1;
                debug!(
                    "Merged {} metric points for {} / {}: {:?}",
                    received, identity.email, identity.famille, outcome
                );
                Ok(RefreshOutcome::Applied(outcome))
            }
            Err(e) => {
                warn!(
                    "Failed to fetch metrics for {} / {}: {}. Keeping {} cached points.",
                    identity.email,
                    identity.famille,
                    e,
                    state.window.len()
                );
                state.last_error = Some(e.clone());
                Err(e.into())
            }
        }
    }
}

impl Drop for FeedInner {
    fn drop(&mut self) {
        if let Some(token) = self.state.get_mut().refresh_task.take() {
            token.cancel();
        }
    }
}

async fn poll(
    feed: Weak<FeedInner>,
    period: Duration,
    generation: u64,
    token: CancellationToken,
) {
    let mut interval = time::interval_at(time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = interval.tick() => {}
        }

        let Some(inner) = feed.upgrade() else { break };
        let Ok(_in_flight) = inner.in_flight.try_lock() else {
            debug!("Metrics fetch still in flight, skipping tick");
            continue;
        };

        tokio::select! {
            _ = token.cancelled() => break,
            result = inner.fetch_and_apply(generation) => {
                if let Ok(RefreshOutcome::Stale) = result {
                    break;
                }
            }
        }
    }

    debug!("Metrics refresh task for generation {} stopped", generation);
}

/// Live feeds keyed by the id handed out to the consumer.
///
/// A feed that is not read through [`FeedRegistry::get`] for `idle_ttl` is
/// treated as abandoned: the sweeper stops its refresh task and removes it.
#[derive(Clone)]
pub struct FeedRegistry {
    feeds: Arc<DashMap<Uuid, MetricsFeed>>,
    source: Arc<dyn MetricsSource>,
    refresh_interval: Duration,
    idle_ttl: Duration,
    sweeper: CancellationToken,
}

impl FeedRegistry {
    pub fn new(
        source: Arc<dyn MetricsSource>,
        refresh_interval: Duration,
        idle_ttl: Duration,
    ) -> Self {
        Self {
            feeds: Arc::new(DashMap::new()),
            source,
            refresh_interval,
            idle_ttl,
            sweeper: CancellationToken::new(),
        }
    }

    pub fn create(&self) -> (Uuid, MetricsFeed) {
        let id = Uuid::new_v4();
        let feed = MetricsFeed::new(self.source.clone(), self.refresh_interval);
        self.feeds.insert(id, feed.clone());
        (id, feed)
    }

    /// Look up a feed and reset its idle clock.
    pub fn get(&self, id: &Uuid) -> Option<MetricsFeed> {
        let feed = self.feeds.get(id).map(|entry| entry.value().clone())?;
        feed.touch();
        Some(feed)
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        match self.feeds.remove(id) {
            Some((_, feed)) => {
                feed.shutdown();
                true
            }
            None => false,
        }
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    /// Stop and drop every feed idle for at least `idle_ttl`. Returns how many
    /// were evicted.
    pub fn evict_idle(&self) -> usize {
        let mut evicted = Vec::new();
        self.feeds.retain(|id, feed| {
            if feed.idle_for() >= self.idle_ttl {
                evicted.push((*id, feed.clone()));
                false
            } else {
                true
            }
        });

        for (id, feed) in &evicted {
            feed.shutdown();
            info!("🧹 Evicted metrics feed {} after {:?} idle", id, feed.idle_for());
        }
        evicted.len()
    }

    /// Run [`evict_idle`](Self::evict_idle) every half TTL until
    /// [`shutdown_all`](Self::shutdown_all).
    pub fn spawn_idle_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let registry = self.clone();
        let period = (self.idle_ttl / 2).max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = registry.sweeper.cancelled() => break,
                    _ = interval.tick() => {
                        let evicted = registry.evict_idle();
                        if evicted > 0 {
                            debug!("Idle sweep evicted {} feeds, {} live", evicted, registry.feeds.len());
                        }
                    }
                }
            }
        })
    }

    pub fn shutdown_all(&self) {
        self.sweeper.cancel();
        for entry in self.feeds.iter() {
            entry.value().shutdown();
        }
        info!("🛑 Stopped {} metrics feeds", self.feeds.len());
        self.feeds.clear();
    }
}
