//! Aggregate statistics over a filtered set of reviews.
//!
//! Everything here is a pure function of its input slice. Percentages are
//! returned unrounded; formatting is left to the page.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{Review, Sentiment};

/// Trailing window, in observed days, for the trend line.
pub const TREND_WINDOW_DAYS: usize = 7;

/// Headline numbers for the metrics row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    pub mean_rating: f64,
    pub median_rating: f64,
    pub total_reviews: usize,
    pub country_count: usize,
}

/// Count and share of one sentiment bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentShare {
    pub sentiment: Sentiment,
    pub label: &'static str,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentBreakdown {
    pub positive: SentimentShare,
    pub neutral: SentimentShare,
    pub negative: SentimentShare,
    pub total: usize,
}

/// Number of reviews with a given star rating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingCount {
    pub rating: u8,
    pub count: usize,
    pub color: &'static str,
}

/// One day of the trend series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    pub day: NaiveDate,
    pub mean_rating: f64,
    pub rolling_mean: f64,
    pub count: usize,
}

/// Per-country performance row for the comparison table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountrySummary {
    pub country: String,
    pub country_code: String,
    pub total: usize,
    pub mean_rating: f64,
    pub positive_percent: f64,
    pub negative_percent: f64,
}

/// Share of one rating within one country's reviews.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryRatingShare {
    pub country: String,
    pub rating: u8,
    pub count: usize,
    pub percent: f64,
}

/// Fixed bar color for each star rating.
pub fn rating_color(rating: u8) -> &'static str {
    match rating {
        5 => "#2ca02c",
        4 => "#98df8a",
        3 => "#ff7f0e",
        2 => "#d62728",
        _ => "#ff9896",
    }
}

/// `part / total` as a percentage, or 0 when `total` is 0.
pub fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

/// Mean, median and counts. `None` for an empty input.
pub fn headline(reviews: &[&Review]) -> Option<Headline> {
    if reviews.is_empty() {
        return None;
    }

    let mut ratings: Vec<u8> = reviews.iter().map(|r| r.rating).collect();
    ratings.sort_unstable();
    let mid = ratings.len() / 2;
    let median_rating = if ratings.len() % 2 == 0 {
        (f64::from(ratings[mid - 1]) + f64::from(ratings[mid])) / 2.0
    } else {
        f64::from(ratings[mid])
    };

    let countries: HashSet<&str> = reviews.iter().map(|r| r.country.as_str()).collect();

    Some(Headline {
        mean_rating: mean(ratings.iter().map(|r| f64::from(*r))),
        median_rating,
        total_reviews: reviews.len(),
        country_count: countries.len(),
    })
}

/// Positive / neutral / negative counts and shares.
pub fn sentiment(reviews: &[&Review]) -> SentimentBreakdown {
    let total = reviews.len();
    let count = |s: Sentiment| reviews.iter().filter(|r| r.sentiment() == s).count();
    let share = |s: Sentiment| {
        let n = count(s);
        SentimentShare {
            sentiment: s,
            label: s.label(),
            count: n,
            percent: percent(n, total),
        }
    };

    SentimentBreakdown {
        positive: share(Sentiment::Positive),
        neutral: share(Sentiment::Neutral),
        negative: share(Sentiment::Negative),
        total,
    }
}

/// Review count per rating present, in ascending rating order.
pub fn rating_distribution(reviews: &[&Review]) -> Vec<RatingCount> {
    let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
    for review in reviews {
        *counts.entry(review.rating).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(rating, count)| RatingCount {
            rating,
            count,
            color: rating_color(rating),
        })
        .collect()
}

/// Trailing mean over `window` values, with a minimum of one value.
///
/// The first output always equals the first input.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            mean(values[start..=i].iter().copied())
        })
        .collect()
}

/// Daily mean rating and count, oldest day first, with a rolling mean.
pub fn daily_trend(reviews: &[&Review], window: usize) -> Vec<DailyPoint> {
    let mut days: BTreeMap<NaiveDate, (u64, usize)> = BTreeMap::new();
    for review in reviews {
        let entry = days.entry(review.timestamp.date_naive()).or_insert((0, 0));
        entry.0 += u64::from(review.rating);
        entry.1 += 1;
    }

    let means: Vec<f64> = days
        .values()
        .map(|(sum, n)| *sum as f64 / *n as f64)
        .collect();
    let rolling = rolling_mean(&means, window);

    days.into_iter()
        .zip(means.into_iter().zip(rolling))
        .map(|((day, (_, count)), (mean_rating, rolling_mean))| DailyPoint {
            day,
            mean_rating,
            rolling_mean,
            count,
        })
        .collect()
}

fn group_by_country<'a>(reviews: &[&'a Review]) -> BTreeMap<&'a str, Vec<&'a Review>> {
    let mut groups: BTreeMap<&str, Vec<&Review>> = BTreeMap::new();
    for &review in reviews {
        groups.entry(review.country.as_str()).or_default().push(review);
    }
    groups
}

/// One summary row per country, sorted by country name.
pub fn country_summaries(reviews: &[&Review]) -> Vec<CountrySummary> {
    group_by_country(reviews)
        .into_iter()
        .map(|(country, group)| {
            let total = group.len();
            let positive = group
                .iter()
                .filter(|r| r.sentiment() == Sentiment::Positive)
                .count();
            let negative = group
                .iter()
                .filter(|r| r.sentiment() == Sentiment::Negative)
                .count();

            CountrySummary {
                country: country.to_string(),
                country_code: group[0].country_code.clone(),
                total,
                mean_rating: mean(group.iter().map(|r| f64::from(r.rating))),
                positive_percent: percent(positive, total),
                negative_percent: percent(negative, total),
            }
        })
        .collect()
}

/// Per-country share of each rating; shares of one country sum to 100.
pub fn country_rating_shares(reviews: &[&Review]) -> Vec<CountryRatingShare> {
    let mut shares = Vec::new();

    for (country, group) in group_by_country(reviews) {
        let total = group.len();
        for RatingCount { rating, count, .. } in rating_distribution(&group) {
            shares.push(CountryRatingShare {
                country: country.to_string(),
                rating,
                count,
                percent: percent(count, total),
            });
        }
    }

    shares
}
