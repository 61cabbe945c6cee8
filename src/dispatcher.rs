use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::{Id, JoinSet};

use crate::error::AppError;
use crate::models::fetch_config::FetchConfiguration;
use crate::models::listing::Listing;
use crate::notify::Notifier;
use crate::scheduler::{CycleHandler, IntervalTicker, PollScheduler, Ticker};
use crate::sources::ListingSource;

/// Logs each cycle and mails non-empty deltas.
struct DigestHandler {
    notifier: Arc<Notifier>,
}

#[async_trait]
impl CycleHandler for DigestHandler {
    async fn on_new_listings(&self, fetcher: &str, listings: Vec<Listing>) {
        tracing::info!(
            "Fetcher '{fetcher}': cycle complete, {} new project(s)",
            listings.len()
        );
        self.notifier.notify(fetcher, &listings).await;
    }
}

/// Bookkeeping for one spawned scheduler task.
struct FetcherTask {
    name: String,
    /// Set once the initial fetch has succeeded.
    primed: Arc<AtomicBool>,
}

/// Runs one independent scheduler per search.
pub struct Dispatcher {
    source: Arc<dyn ListingSource>,
    notifier: Arc<Notifier>,
    poll_interval: Duration,
}

impl Dispatcher {
    pub fn new(
        source: Arc<dyn ListingSource>,
        notifier: Arc<Notifier>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            notifier,
            poll_interval,
        }
    }

    /// Poll every configuration until Ctrl-C.
    pub async fn run(self, configs: Vec<FetchConfiguration>) -> anyhow::Result<()> {
        let interval = self.poll_interval;
        self.run_with(configs, move || IntervalTicker::new(interval))
            .await
    }

    /// Like [`Dispatcher::run`], with each scheduler paced by a ticker from
    /// `make_ticker`. Returns once every scheduler has stopped; fails if none
    /// of them got past the initial fetch.
    pub async fn run_with<T, F>(
        self,
        configs: Vec<FetchConfiguration>,
        make_ticker: F,
    ) -> anyhow::Result<()>
    where
        T: Ticker + 'static,
        F: Fn() -> T,
    {
        let handler = Arc::new(DigestHandler {
            notifier: self.notifier,
        });

        let total = configs.len();
        let mut tasks = JoinSet::new();
        let mut running: HashMap<Id, FetcherTask> = HashMap::with_capacity(total);
        for config in configs {
            let name = config.name.clone();
            let primed = Arc::new(AtomicBool::new(false));
            let mut scheduler = PollScheduler::new(config, self.source.clone(), make_ticker());
            let handler = handler.clone();
            let task_primed = primed.clone();
            let abort = tasks.spawn(async move {
                scheduler.prime().await?;
                task_primed.store(true, Ordering::SeqCst);
                scheduler.poll_until_stopped(&*handler).await;
                Ok::<(), AppError>(())
            });
            running.insert(abort.id(), FetcherTask { name, primed });
        }

        tracing::info!(
            "Started {total} fetcher(s), polling every {}s",
            self.poll_interval.as_secs()
        );

        let mut failed = 0;
        loop {
            tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping fetchers");
                    tasks.abort_all();
                    return Ok(());
                }
                joined = tasks.join_next_with_id() => {
                    let (id, outcome) = match joined {
                        None => break,
                        Some(Ok((id, result))) => (id, Ok(result)),
                        Some(Err(e)) => (e.id(), Err(e)),
                    };
                    let Some(task) = running.remove(&id) else {
                        tracing::error!("Unknown fetcher task {id} finished");
                        continue;
                    };
                    let name = &task.name;
                    match outcome {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => {
                            failed += 1;
                            tracing::error!("Fetcher '{name}': initial fetch failed, fetcher disabled: {e}");
                        }
                        Err(e) if task.primed.load(Ordering::SeqCst) => {
                            tracing::error!("Fetcher '{name}': task died while polling, fetcher disabled: {e}");
                        }
                        Err(e) => {
                            failed += 1;
                            tracing::error!("Fetcher '{name}': task died during initial fetch, fetcher disabled: {e}");
                        }
                    }
                }
            }
        }

        if failed == total {
            anyhow::bail!("All {total} fetcher(s) failed to start");
        }
        Ok(())
    }
}
