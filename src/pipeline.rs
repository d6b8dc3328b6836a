//! The fetch step: pull reviews per country, normalize, concatenate.
//!
//! Countries are processed one after another. A failure for one country is
//! reported as a warning and that country is left out; the others still
//! make it into the result.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::cache::ReviewCache;
use crate::countries::{self, Country};
use crate::data_sources::ReviewSource;
use crate::error::FetchError;
use crate::model::Review;

/// Result of fetching a set of countries.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// All retained reviews, newest first.
    pub reviews: Vec<Review>,

    /// Human-readable, non-fatal problems.
    pub warnings: Vec<String>,

    /// Codes of the countries that contributed at least one review.
    pub loaded: Vec<String>,
}

/// Fetch reviews for every code in `codes`, using `cache` where possible.
pub async fn collect_reviews(
    source: &dyn ReviewSource,
    cache: &ReviewCache,
    codes: &[String],
    now: DateTime<Utc>,
) -> FetchOutcome {
    let purged = cache.purge_expired(now);
    if purged > 0 {
        debug!(purged, "Evicted expired cache entries");
    }

    let mut outcome = FetchOutcome::default();
    let mut seen: Vec<&'static str> = Vec::new();

    for code in codes {
        let Some(country) = countries::lookup(code) else {
            warn!(code = %code, "Unknown country code requested");
            outcome
                .warnings
                .push(format!("Unknown country code '{}' was skipped.", code.trim()));
            continue;
        };
        if seen.contains(&country.code) {
            continue;
        }
        seen.push(country.code);

        match reviews_for(source, cache, country, now).await {
            Ok(reviews) => {
                if !reviews.is_empty() {
                    outcome.loaded.push(country.code.to_string());
                }
                outcome.reviews.extend(reviews);
            }
            Err(e) => {
                warn!(country = country.code, error = %e, "Skipping country after failed fetch");
                outcome
                    .warnings
                    .push(format!("Could not fetch reviews for {}: {}", country.name, e));
            }
        }
    }

    outcome
        .reviews
        .sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    info!(
        requested = codes.len(),
        loaded = outcome.loaded.len(),
        reviews = outcome.reviews.len(),
        warnings = outcome.warnings.len(),
        "Fetch run finished"
    );

    outcome
}

async fn reviews_for(
    source: &dyn ReviewSource,
    cache: &ReviewCache,
    country: &Country,
    now: DateTime<Utc>,
) -> Result<Vec<Review>, FetchError> {
    if let Some(cached) = cache.get(country.code, now) {
        debug!(country = country.code, reviews = cached.len(), "Serving reviews from cache");
        return Ok(cached.as_ref().clone());
    }

    let raw = source.fetch_reviews(country).await?;
    let fetched = raw.len();
    let reviews: Vec<Review> = raw
        .into_iter()
        .filter_map(|r| Review::from_raw(r, country))
        .collect();

    info!(
        country = country.code,
        fetched,
        retained = reviews.len(),
        "Fetched reviews"
    );

    Ok(cache.insert(country.code, reviews, now).as_ref().clone())
}
