use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::fetch_config::FetchConfiguration;
use crate::models::listing::Listing;
use crate::sources::ListingSource;
use crate::watermark::{Watermark, compute_delta};

/// Paces the cycles of one scheduler.
#[async_trait]
pub trait Ticker: Send {
    /// Suspend until the next cycle is due. Returns `false` once no further
    /// cycles should run.
    async fn tick(&mut self) -> bool;
}

/// Fixed-period ticker backed by the tokio timer.
pub struct IntervalTicker {
    period: Duration,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        tokio::time::sleep(self.period).await;
        true
    }
}

/// Receives the outcome of every steady-state cycle, including empty ones.
#[async_trait]
pub trait CycleHandler: Send + Sync {
    async fn on_new_listings(&self, fetcher: &str, listings: Vec<Listing>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Fetching,
    Processing,
    Waiting,
}

/// Poll loop for a single search. Owns that search's watermark; nothing
/// else reads or writes it.
pub struct PollScheduler<T: Ticker> {
    config: FetchConfiguration,
    source: Arc<dyn ListingSource>,
    ticker: T,
    watermark: Watermark,
    state: SchedulerState,
}

impl<T: Ticker> PollScheduler<T> {
    pub fn new(config: FetchConfiguration, source: Arc<dyn ListingSource>, ticker: T) -> Self {
        Self {
            config,
            source,
            ticker,
            watermark: Watermark::default(),
            state: SchedulerState::Idle,
        }
    }

    pub fn watermark(&self) -> Watermark {
        self.watermark
    }

    #[cfg(test)]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    fn transition(&mut self, next: SchedulerState) {
        tracing::debug!(
            "Fetcher '{}': {:?} -> {next:?}",
            self.config.name,
            self.state
        );
        self.state = next;
    }

    /// First cycle. Sets the baseline watermark and reports nothing.
    /// A fetch error here is returned to the caller.
    pub async fn prime(&mut self) -> Result<(), AppError> {
        tracing::info!(
            "Fetcher '{}': running initial fetch via {}",
            self.config.name,
            self.source.name()
        );
        self.transition(SchedulerState::Fetching);

        let listings = match self.source.fetch(&self.config).await {
            Ok(listings) => listings,
            Err(e) => {
                self.transition(SchedulerState::Idle);
                return Err(e);
            }
        };

        self.transition(SchedulerState::Processing);
        let delta = compute_delta(listings, self.watermark);
        self.watermark = delta.watermark;
        self.transition(SchedulerState::Waiting);

        match self.watermark.most_recent_seen() {
            Some(ts) => tracing::info!(
                "Fetcher '{}': initial run, baseline set to {}. No new projects shown",
                self.config.name,
                format_timestamp(ts)
            ),
            None => tracing::info!(
                "Fetcher '{}': initial run returned no projects, baseline still unset",
                self.config.name
            ),
        }
        Ok(())
    }

    /// One steady-state cycle. A failed fetch is logged and yields an empty
    /// delta; the watermark is left as it was.
    pub async fn poll_once(&mut self) -> Vec<Listing> {
        self.transition(SchedulerState::Fetching);

        let listings = match self.source.fetch(&self.config).await {
            Ok(listings) => listings,
            Err(e) => {
                tracing::error!("Fetcher '{}': fetch failed: {e}", self.config.name);
                self.transition(SchedulerState::Waiting);
                return Vec::new();
            }
        };

        self.transition(SchedulerState::Processing);
        let fetched = listings.len();
        let previous = self.watermark;
        let delta = compute_delta(listings, previous);
        self.watermark = delta.watermark;

        tracing::info!(
            "Fetcher '{}': {fetched} fetched, {} new",
            self.config.name,
            delta.new_listings.len()
        );
        if self.watermark != previous
            && let Some(ts) = self.watermark.most_recent_seen()
        {
            tracing::info!(
                "Fetcher '{}': most recent project timestamp updated to {}",
                self.config.name,
                format_timestamp(ts)
            );
        }

        self.transition(SchedulerState::Waiting);
        delta.new_listings
    }

    /// Steady-state loop: wait for a tick, poll, report. Call after `prime`.
    pub async fn poll_until_stopped(&mut self, handler: &dyn CycleHandler) {
        loop {
            tracing::debug!("Fetcher '{}': waiting for next cycle", self.config.name);
            if !self.ticker.tick().await {
                break;
            }
            let new_listings = self.poll_once().await;
            handler
                .on_new_listings(&self.config.name, new_listings)
                .await;
        }

        tracing::info!(
            "Fetcher '{}': stopped at watermark {:?}",
            self.config.name,
            self.watermark().most_recent_seen()
        );
    }
}

fn format_timestamp(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}
