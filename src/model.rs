//! Data models for reviewdash.
//!
//! A [`RawReview`] is whatever the review source handed back, with every
//! field optional. Normalization turns it into a [`Review`], the one entity
//! the dashboard works with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::countries::Country;

/// Lowest valid star rating.
pub const MIN_RATING: u8 = 1;

/// Highest valid star rating.
pub const MAX_RATING: u8 = 5;

/// A review as returned by the source, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawReview {
    pub username: Option<String>,
    pub content: Option<String>,
    pub score: Option<i64>,
    pub posted_at: Option<DateTime<Utc>>,
}

/// A single user review, validated and tagged with its storefront country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Public display name of the reviewer. Empty when the source omitted it.
    pub username: String,

    /// Review text.
    pub content: String,

    /// Star rating, always within `MIN_RATING..=MAX_RATING`.
    pub rating: u8,

    /// When the review was posted (UTC).
    pub timestamp: DateTime<Utc>,

    /// Display name of the storefront country.
    pub country: String,

    /// Storefront country code.
    pub country_code: String,
}

impl Review {
    /// Normalize a raw record for `country`.
    ///
    /// Returns `None` unless content, rating and timestamp are all present.
    /// A rating outside the valid range counts as missing.
    pub fn from_raw(raw: RawReview, country: &Country) -> Option<Self> {
        let rating = raw.score.and_then(rating_from_score)?;
        let content = raw.content?;
        let timestamp = raw.posted_at?;

        Some(Self {
            username: raw.username.unwrap_or_default(),
            content,
            rating,
            timestamp,
            country: country.name.to_string(),
            country_code: country.code.to_string(),
        })
    }

    pub fn sentiment(&self) -> Sentiment {
        Sentiment::from_rating(self.rating)
    }
}

fn rating_from_score(score: i64) -> Option<u8> {
    u8::try_from(score).ok().filter(|r| is_valid_rating(*r))
}

/// Whether `rating` is a valid star rating.
pub fn is_valid_rating(rating: u8) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}

/// Coarse sentiment bucket derived from the star rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    /// 4 or 5 stars.
    Positive,

    /// 3 stars.
    Neutral,

    /// 1 or 2 stars.
    Negative,
}

impl Sentiment {
    pub fn from_rating(rating: u8) -> Self {
        match rating {
            r if r >= 4 => Sentiment::Positive,
            3 => Sentiment::Neutral,
            _ => Sentiment::Negative,
        }
    }

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive (4-5 stars)",
            Sentiment::Neutral => "Neutral (3 stars)",
            Sentiment::Negative => "Negative (1-2 stars)",
        }
    }
}

/// Request body for `POST /api/sessions/:id/fetch`.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchRequest {
    /// Country codes to pull reviews for.
    #[serde(default)]
    pub countries: Vec<String>,
}

/// Response for `POST /api/sessions/:id/fetch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    /// Codes of the countries that contributed data.
    pub loaded: Vec<String>,

    /// Number of reviews now held by the session.
    pub total: usize,

    /// Non-fatal per-country problems.
    pub warnings: Vec<String>,

    /// Summary line for the user.
    pub message: String,
}

/// Response for `POST /api/sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreated {
    pub id: uuid::Uuid,
}
