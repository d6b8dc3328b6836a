//! Review filters used by the dashboard views.
//!
//! Both the review table and the CSV export go through
//! [`DetailFilter::apply`], so an export always contains exactly the rows
//! the table shows.

use chrono::{Duration, NaiveDate};

use crate::model::{MAX_RATING, MIN_RATING, Review, is_valid_rating};

/// Days shown by the trend view when no range is given.
pub const DEFAULT_TREND_DAYS: i64 = 90;

/// Country selection applied to every view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalFilter {
    selection: Option<Vec<String>>,
}

impl GlobalFilter {
    /// Parse a comma-separated list of country codes.
    ///
    /// An absent parameter selects every country. A present but empty one
    /// also shows every country, but is reported as an empty selection.
    pub fn parse(param: Option<&str>) -> Self {
        Self {
            selection: param.map(split_codes),
        }
    }

    /// Whether the user explicitly selected no countries at all.
    pub fn is_empty_selection(&self) -> bool {
        matches!(&self.selection, Some(codes) if codes.is_empty())
    }

    pub fn apply<'a>(&self, reviews: &'a [Review]) -> Vec<&'a Review> {
        match &self.selection {
            Some(codes) if !codes.is_empty() => reviews
                .iter()
                .filter(|r| codes.iter().any(|c| c.eq_ignore_ascii_case(&r.country_code)))
                .collect(),
            _ => reviews.iter().collect(),
        }
    }
}

/// Rating and country filter for the review table and its export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFilter {
    ratings: Option<Vec<u8>>,
    countries: Option<Vec<String>>,
}

impl DetailFilter {
    /// Parse the `ratings` and `review_countries` parameters.
    ///
    /// An absent parameter matches everything; an empty one matches nothing.
    /// Ratings outside the valid range are rejected.
    pub fn parse(ratings: Option<&str>, countries: Option<&str>) -> Result<Self, String> {
        let ratings = ratings.map(parse_ratings).transpose()?;
        Ok(Self {
            ratings,
            countries: countries.map(split_codes),
        })
    }

    pub fn ratings(&self) -> Option<&[u8]> {
        self.ratings.as_deref()
    }

    pub fn matches(&self, review: &Review) -> bool {
        let rating_ok = self
            .ratings
            .as_ref()
            .is_none_or(|rs| rs.contains(&review.rating));
        let country_ok = self.countries.as_ref().is_none_or(|cs| {
            cs.iter().any(|c| c.eq_ignore_ascii_case(&review.country_code))
        });
        rating_ok && country_ok
    }

    pub fn apply<'a>(&self, reviews: &[&'a Review]) -> Vec<&'a Review> {
        reviews.iter().copied().filter(|r| self.matches(r)).collect()
    }
}

fn parse_ratings(param: &str) -> Result<Vec<u8>, String> {
    let mut ratings = Vec::new();
    for token in param.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let rating = token
            .parse::<u8>()
            .ok()
            .filter(|r| is_valid_rating(*r))
            .ok_or_else(|| {
                format!(
                    "invalid rating '{}': expected a value from {} to {}",
                    token, MIN_RATING, MAX_RATING
                )
            })?;
        if !ratings.contains(&rating) {
            ratings.push(rating);
        }
    }
    ratings.sort_unstable();
    Ok(ratings)
}

fn split_codes(param: &str) -> Vec<String> {
    param
        .split(',')
        .map(|c| c.trim().to_ascii_lowercase())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Inclusive range of UTC calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Resolve a requested range against the data's first and last day.
    ///
    /// A missing end defaults to the last day of data, and a missing start
    /// to [`DEFAULT_TREND_DAYS`] days before the end. Both ends are clamped
    /// into `[first, last]`.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Self, String> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(format!("start date {} is after end date {}", s, e));
            }
        }

        let end = end.unwrap_or(last).clamp(first, last);
        let start = start
            .unwrap_or(end - Duration::days(DEFAULT_TREND_DAYS))
            .clamp(first, last);

        if start > end {
            return Err(format!("start date {} is after end date {}", start, end));
        }

        Ok(Self { start, end })
    }

    pub fn contains(&self, review: &Review) -> bool {
        let day = review.timestamp.date_naive();
        self.start <= day && day <= self.end
    }
}
