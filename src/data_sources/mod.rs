//! Review sources for the dashboard.
//!
//! A [`ReviewSource`] pulls every available review for one storefront
//! country. The production implementation is [`PlayStoreClient`]; tests
//! substitute in-memory sources.
//!
//! # Data Sources
//!
//! - [`play_store`]: Google Play storefront reviews, newest first

pub mod play_store;

use async_trait::async_trait;

use crate::countries::Country;
use crate::error::FetchError;
use crate::model::RawReview;

pub use play_store::PlayStoreClient;

/// Something that can fetch the reviews of the configured app for a country.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Fetch all reviews for `country`, unvalidated.
    async fn fetch_reviews(&self, country: &Country) -> Result<Vec<RawReview>, FetchError>;
}
