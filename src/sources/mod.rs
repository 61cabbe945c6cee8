// Listing sources - where the watcher pulls projects from.

pub mod freelancermap;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::fetch_config::FetchConfiguration;
use crate::models::listing::Listing;

/// Trait that all listing sources must implement.
/// A source runs one search and returns the matching listings
/// ordered newest first by `updated`.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Human-readable name used in log records.
    fn name(&self) -> &str;

    /// Run the search described by `config`.
    async fn fetch(&self, config: &FetchConfiguration) -> Result<Vec<Listing>, AppError>;
}
