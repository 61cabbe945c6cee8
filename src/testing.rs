// Test doubles for the listing source, mail transport, cycle handler and ticker.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lettre::message::Mailbox;

use crate::error::AppError;
use crate::models::fetch_config::{FetchConfiguration, LocationFilter};
use crate::models::listing::Listing;
use crate::notify::MailSender;
use crate::scheduler::{CycleHandler, Ticker};
use crate::sources::ListingSource;

pub fn fetch_config(name: &str) -> FetchConfiguration {
    FetchConfiguration {
        name: name.to_string(),
        query: "rust".to_string(),
        location: LocationFilter {
            remote: true,
            hybrid: false,
            on_site: false,
        },
        dach: true,
        city: None,
    }
}

// =============================================================================
// Scripted listing source
// =============================================================================

/// One scripted answer to a fetch.
enum Step {
    Listings(Vec<Listing>),
    Failure(String),
    /// The fetch panics, taking the scheduler task down with it.
    Panic,
    /// The fetch never completes.
    Stall,
}

type Script = VecDeque<Step>;

/// Returns queued responses in order, per fetcher name. Responses queued
/// without a fetcher name apply to any fetcher. Once a script runs dry
/// every fetch returns an empty list.
pub struct ScriptedSource {
    shared: Mutex<Script>,
    per_fetcher: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            shared: Mutex::new(VecDeque::new()),
            per_fetcher: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn push_shared(self, step: Step) -> Self {
        self.shared.lock().unwrap().push_back(step);
        self
    }

    fn push_for(self, fetcher: &str, step: Step) -> Self {
        self.per_fetcher
            .lock()
            .unwrap()
            .entry(fetcher.to_string())
            .or_default()
            .push_back(step);
        self
    }

    pub fn with_listings(self, listings: Vec<Listing>) -> Self {
        self.push_shared(Step::Listings(listings))
    }

    pub fn with_failure(self, message: &str) -> Self {
        self.push_shared(Step::Failure(message.to_string()))
    }

    pub fn with_listings_for(self, fetcher: &str, listings: Vec<Listing>) -> Self {
        self.push_for(fetcher, Step::Listings(listings))
    }

    pub fn with_failure_for(self, fetcher: &str, message: &str) -> Self {
        self.push_for(fetcher, Step::Failure(message.to_string()))
    }

    pub fn with_panic_for(self, fetcher: &str) -> Self {
        self.push_for(fetcher, Step::Panic)
    }

    pub fn with_stall_for(self, fetcher: &str) -> Self {
        self.push_for(fetcher, Step::Stall)
    }

    pub fn fetch_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of fetches made on behalf of `fetcher`.
    pub fn fetch_count_for(&self, fetcher: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|name| *name == fetcher)
            .count()
    }

    fn next_step(&self, fetcher: &str) -> Option<Step> {
        self.calls.lock().unwrap().push(fetcher.to_string());

        let scripted = self
            .per_fetcher
            .lock()
            .unwrap()
            .get_mut(fetcher)
            .and_then(|script| script.pop_front());
        scripted.or_else(|| self.shared.lock().unwrap().pop_front())
    }
}

#[async_trait]
impl ListingSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self, config: &FetchConfiguration) -> Result<Vec<Listing>, AppError> {
        match self.next_step(&config.name) {
            Some(Step::Listings(listings)) => Ok(listings),
            Some(Step::Failure(message)) => Err(AppError::Fetch(message)),
            Some(Step::Panic) => panic!("scripted panic for fetcher '{}'", config.name),
            Some(Step::Stall) => std::future::pending().await,
            None => Ok(Vec::new()),
        }
    }
}

// =============================================================================
// Recording mail sender
// =============================================================================

#[derive(Debug, Clone)]
pub struct SentMail {
    pub subject: String,
    pub recipient: String,
    pub html_body: String,
}

#[derive(Clone)]
pub struct RecordingMailSender {
    sent: Arc<Mutex<Vec<SentMail>>>,
    fail_with: Option<String>,
}

impl RecordingMailSender {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    /// Every send attempt is recorded and then fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(message.to_string()),
        }
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailSender for RecordingMailSender {
    async fn send(
        &self,
        subject: &str,
        recipient: &Mailbox,
        html_body: &str,
    ) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(SentMail {
            subject: subject.to_string(),
            recipient: recipient.email.to_string(),
            html_body: html_body.to_string(),
        });
        match &self.fail_with {
            Some(message) => Err(AppError::Mail(message.clone())),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Cycle handler and ticker
// =============================================================================

/// Records (fetcher, listing ids) for every reported cycle.
pub struct RecordingHandler {
    cycles: Mutex<Vec<(String, Vec<i64>)>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self {
            cycles: Mutex::new(Vec::new()),
        }
    }

    pub fn cycles(&self) -> Vec<(String, Vec<i64>)> {
        self.cycles.lock().unwrap().clone()
    }
}

#[async_trait]
impl CycleHandler for RecordingHandler {
    async fn on_new_listings(&self, fetcher: &str, listings: Vec<Listing>) {
        self.cycles
            .lock()
            .unwrap()
            .push((fetcher.to_string(), listings.iter().map(|l| l.id).collect()));
    }
}

/// Allows a fixed number of cycles without waiting, then stops.
pub struct FixedTicker {
    remaining: usize,
}

impl FixedTicker {
    pub fn new(cycles: usize) -> Self {
        Self { remaining: cycles }
    }
}

#[async_trait]
impl Ticker for FixedTicker {
    async fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        tokio::task::yield_now().await;
        true
    }
}
