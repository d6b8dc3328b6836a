//! Dashboard views built from a session's review dataset.
//!
//! Every view answers with a [`Panel`]: either ready data or an empty-state
//! message for the page to show. Running out of data after filtering is a
//! normal outcome, never an error.
//!
//! # Usage
//!
//! ```ignore
//! let global = GlobalFilter::parse(query.countries.as_deref());
//! let panel = dashboard::overview(dataset.as_deref().map(Vec::as_slice), &global);
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::aggregation::{
    self, CountryRatingShare, CountrySummary, DailyPoint, Headline, RatingCount,
    SentimentBreakdown, TREND_WINDOW_DAYS,
};
use crate::filter::{DateRange, DetailFilter, GlobalFilter};
use crate::model::Review;

pub const MSG_NOT_LOADED: &str = "Select countries and fetch reviews to start the analysis.";
pub const MSG_ALL_COUNTRIES: &str =
    "Showing all countries. Select at least one country to filter.";
pub const MSG_NO_DATA: &str = "No data found for the current filters.";
pub const MSG_NO_DATA_IN_RANGE: &str = "No data found in the selected date range.";
pub const MSG_NEED_TWO_COUNTRIES: &str =
    "Select at least two countries in the global filter to see the comparison charts.";
pub const MSG_NO_MATCHING_REVIEWS: &str = "No reviews match the selected ratings and countries.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Warning,
}

/// A message shown alongside a panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn warning(message: &str) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.to_string(),
        }
    }
}

/// Envelope for every dashboard view.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Panel<T> {
    Ready { data: T, notices: Vec<Notice> },
    Empty { message: String, notices: Vec<Notice> },
}

impl<T> Panel<T> {
    fn empty(message: &str, notices: Vec<Notice>) -> Self {
        Panel::Empty {
            message: message.to_string(),
            notices,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Panel::Ready { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Panel::Ready { data, .. } => Some(data),
            Panel::Empty { .. } => None,
        }
    }
}

/// Reviews left after the global filter, plus the notices it produced.
struct Scope<'a> {
    reviews: Vec<&'a Review>,
    notices: Vec<Notice>,
}

fn scope<'a, T>(dataset: Option<&'a [Review]>, global: &GlobalFilter) -> Result<Scope<'a>, Panel<T>> {
    let Some(dataset) = dataset else {
        return Err(Panel::empty(MSG_NOT_LOADED, Vec::new()));
    };

    let mut notices = Vec::new();
    if global.is_empty_selection() {
        notices.push(Notice::warning(MSG_ALL_COUNTRIES));
    }

    let reviews = global.apply(dataset);
    if reviews.is_empty() {
        return Err(Panel::empty(MSG_NO_DATA, notices));
    }

    Ok(Scope { reviews, notices })
}

/// A country present in the dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryOption {
    pub code: String,
    pub name: String,
}

/// What a session currently holds; drives the filter widgets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub total_reviews: usize,
    pub countries: Vec<CountryOption>,
    pub ratings: Vec<u8>,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
}

fn country_options(reviews: &[&Review]) -> Vec<CountryOption> {
    let mut options: Vec<CountryOption> = Vec::new();
    for review in reviews {
        if !options.iter().any(|o| o.code == review.country_code) {
            options.push(CountryOption {
                code: review.country_code.clone(),
                name: review.country.clone(),
            });
        }
    }
    options.sort_by(|a, b| a.name.cmp(&b.name));
    options
}

fn rating_options(reviews: &[&Review]) -> Vec<u8> {
    let mut ratings: Vec<u8> = reviews.iter().map(|r| r.rating).collect();
    ratings.sort_unstable();
    ratings.dedup();
    ratings
}

fn day_bounds(reviews: &[&Review]) -> Option<(NaiveDate, NaiveDate)> {
    let first = reviews.iter().map(|r| r.timestamp).min()?;
    let last = reviews.iter().map(|r| r.timestamp).max()?;
    Some((first.date_naive(), last.date_naive()))
}

pub fn session_view(dataset: Option<&[Review]>) -> Panel<SessionView> {
    let scope = match scope(dataset, &GlobalFilter::default()) {
        Ok(scope) => scope,
        Err(panel) => return panel,
    };
    let Some((first_day, last_day)) = day_bounds(&scope.reviews) else {
        return Panel::empty(MSG_NO_DATA, scope.notices);
    };

    Panel::Ready {
        data: SessionView {
            total_reviews: scope.reviews.len(),
            countries: country_options(&scope.reviews),
            ratings: rating_options(&scope.reviews),
            first_day,
            last_day,
        },
        notices: scope.notices,
    }
}

/// Headline metrics plus sentiment scorecard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsView {
    pub headline: Headline,
    pub sentiment: SentimentBreakdown,
}

pub fn metrics(dataset: Option<&[Review]>, global: &GlobalFilter) -> Panel<MetricsView> {
    let scope = match scope(dataset, global) {
        Ok(scope) => scope,
        Err(panel) => return panel,
    };
    let Some(headline) = aggregation::headline(&scope.reviews) else {
        return Panel::empty(MSG_NO_DATA, scope.notices);
    };

    Panel::Ready {
        data: MetricsView {
            headline,
            sentiment: aggregation::sentiment(&scope.reviews),
        },
        notices: scope.notices,
    }
}

/// Sentiment shares and the rating histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewView {
    pub sentiment: SentimentBreakdown,
    pub distribution: Vec<RatingCount>,
}

pub fn overview(dataset: Option<&[Review]>, global: &GlobalFilter) -> Panel<OverviewView> {
    let scope = match scope(dataset, global) {
        Ok(scope) => scope,
        Err(panel) => return panel,
    };

    Panel::Ready {
        data: OverviewView {
            sentiment: aggregation::sentiment(&scope.reviews),
            distribution: aggregation::rating_distribution(&scope.reviews),
        },
        notices: scope.notices,
    }
}

/// Daily trend within a date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendView {
    pub range: DateRange,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    pub window_days: usize,
    pub points: Vec<DailyPoint>,
}

/// Build the trend view. An inverted date range is a caller error.
pub fn trend(
    dataset: Option<&[Review]>,
    global: &GlobalFilter,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Panel<TrendView>, String> {
    let scope = match scope(dataset, global) {
        Ok(scope) => scope,
        Err(panel) => return Ok(panel),
    };
    let Some((first_day, last_day)) = day_bounds(&scope.reviews) else {
        return Ok(Panel::empty(MSG_NO_DATA, scope.notices));
    };

    let range = DateRange::resolve(start, end, first_day, last_day)?;
    let in_range: Vec<&Review> = scope
        .reviews
        .iter()
        .copied()
        .filter(|r| range.contains(r))
        .collect();
    if in_range.is_empty() {
        return Ok(Panel::empty(MSG_NO_DATA_IN_RANGE, scope.notices));
    }

    Ok(Panel::Ready {
        data: TrendView {
            range,
            first_day,
            last_day,
            window_days: TREND_WINDOW_DAYS,
            points: aggregation::daily_trend(&in_range, TREND_WINDOW_DAYS),
        },
        notices: scope.notices,
    })
}

/// Country-by-country comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonView {
    pub summaries: Vec<CountrySummary>,
    pub rating_shares: Vec<CountryRatingShare>,
}

pub fn comparison(dataset: Option<&[Review]>, global: &GlobalFilter) -> Panel<ComparisonView> {
    let scope = match scope(dataset, global) {
        Ok(scope) => scope,
        Err(panel) => return panel,
    };
    if country_options(&scope.reviews).len() < 2 {
        return Panel::empty(MSG_NEED_TWO_COUNTRIES, scope.notices);
    }

    Panel::Ready {
        data: ComparisonView {
            summaries: aggregation::country_summaries(&scope.reviews),
            rating_shares: aggregation::country_rating_shares(&scope.reviews),
        },
        notices: scope.notices,
    }
}

/// One row of the review table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewRow {
    pub timestamp: DateTime<Utc>,
    pub username: String,
    pub rating: u8,
    pub content: String,
    pub country: String,
}

impl From<&Review> for ReviewRow {
    fn from(review: &Review) -> Self {
        Self {
            timestamp: review.timestamp,
            username: review.username.clone(),
            rating: review.rating,
            content: review.content.clone(),
            country: review.country.clone(),
        }
    }
}

/// The filterable review table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewsView {
    pub total: usize,
    pub rating_options: Vec<u8>,
    pub country_options: Vec<CountryOption>,
    pub rows: Vec<ReviewRow>,
}

/// Rows selected by the global and detail filters, newest first.
///
/// Shared by the table and the CSV export. Returns `None` if nothing has
/// been fetched yet.
pub fn table_rows<'a>(
    dataset: Option<&'a [Review]>,
    global: &GlobalFilter,
    detail: &DetailFilter,
) -> Option<Vec<&'a Review>> {
    let dataset = dataset?;
    Some(detail.apply(&global.apply(dataset)))
}

pub fn reviews(
    dataset: Option<&[Review]>,
    global: &GlobalFilter,
    detail: &DetailFilter,
) -> Panel<ReviewsView> {
    let scope = match scope(dataset, global) {
        Ok(scope) => scope,
        Err(panel) => return panel,
    };

    let rows = detail.apply(&scope.reviews);
    if rows.is_empty() {
        return Panel::empty(MSG_NO_MATCHING_REVIEWS, scope.notices);
    }

    Panel::Ready {
        data: ReviewsView {
            total: rows.len(),
            rating_options: rating_options(&scope.reviews),
            country_options: country_options(&scope.reviews),
            rows: rows.into_iter().map(ReviewRow::from).collect(),
        },
        notices: scope.notices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn review(code: &str, name: &str, rating: u8, day: u32) -> Review {
        Review {
            username: format!("user-{day}"),
            content: "text".to_string(),
            rating,
            timestamp: Utc.with_ymd_and_hms(2024, 7, day, 9, 0, 0).unwrap(),
            country: name.to_string(),
            country_code: code.to_string(),
        }
    }

    fn dataset() -> Vec<Review> {
        vec![
            review("us", "United States", 2, 20),
            review("tr", "Turkey", 5, 18),
            review("tr", "Turkey", 4, 10),
            review("us", "United States", 1, 3),
        ]
    }

    #[test]
    fn test_not_loaded_is_empty_state() {
        let panel = metrics(None, &GlobalFilter::default());

        match panel {
            Panel::Empty { message, notices } => {
                assert_eq!(message, MSG_NOT_LOADED);
                assert!(notices.is_empty());
            }
            Panel::Ready { .. } => panic!("expected empty panel"),
        }
    }

    #[test]
    fn test_filter_without_matches_is_empty_state() {
        let data = dataset();
        let panel = overview(Some(&data[..]), &GlobalFilter::parse(Some("jp")));

        match panel {
            Panel::Empty { message, .. } => assert_eq!(message, MSG_NO_DATA),
            Panel::Ready { .. } => panic!("expected empty panel"),
        }
    }

    #[test]
    fn test_empty_selection_warns_and_shows_all() {
        let data = dataset();
        let panel = metrics(Some(&data[..]), &GlobalFilter::parse(Some("")));

        match panel {
            Panel::Ready { data, notices } => {
                assert_eq!(data.headline.total_reviews, 4);
                assert_eq!(notices, vec![Notice::warning(MSG_ALL_COUNTRIES)]);
            }
            Panel::Empty { .. } => panic!("expected ready panel"),
        }
    }

    #[test]
    fn test_session_view() {
        let data = dataset();
        let view = session_view(Some(&data[..]));
        let view = view.data().unwrap();

        assert_eq!(view.total_reviews, 4);
        assert_eq!(view.ratings, vec![1, 2, 4, 5]);
        assert_eq!(view.countries[0].name, "Turkey");
        assert_eq!(view.first_day, NaiveDate::from_ymd_opt(2024, 7, 3).unwrap());
        assert_eq!(view.last_day, NaiveDate::from_ymd_opt(2024, 7, 20).unwrap());
    }

    #[test]
    fn test_comparison_needs_two_countries() {
        let data = dataset();

        let single = comparison(Some(&data[..]), &GlobalFilter::parse(Some("tr")));
        match single {
            Panel::Empty { message, .. } => assert_eq!(message, MSG_NEED_TWO_COUNTRIES),
            Panel::Ready { .. } => panic!("expected empty panel"),
        }

        let both = comparison(Some(&data[..]), &GlobalFilter::default());
        let view = both.data().unwrap();
        assert_eq!(view.summaries.len(), 2);
    }

    #[test]
    fn test_trend_range_and_empty_range() {
        let data = dataset();
        let global = GlobalFilter::default();
        let day = |d| NaiveDate::from_ymd_opt(2024, 7, d).unwrap();

        let panel = trend(Some(&data[..]), &global, Some(day(10)), Some(day(18))).unwrap();
        let view = panel.data().unwrap();
        assert_eq!(view.points.len(), 2);
        assert_eq!(view.points[0].rolling_mean, view.points[0].mean_rating);

        let gap = trend(Some(&data[..]), &global, Some(day(11)), Some(day(17))).unwrap();
        match gap {
            Panel::Empty { message, .. } => assert_eq!(message, MSG_NO_DATA_IN_RANGE),
            Panel::Ready { .. } => panic!("expected empty panel"),
        }

        assert!(trend(Some(&data[..]), &global, Some(day(18)), Some(day(10))).is_err());
    }

    #[test]
    fn test_reviews_match_table_rows() {
        let data = dataset();
        let global = GlobalFilter::default();
        let detail = DetailFilter::parse(Some("1,2"), None).unwrap();

        let panel = reviews(Some(&data[..]), &global, &detail);
        let view = panel.data().unwrap();
        let rows = table_rows(Some(&data[..]), &global, &detail).unwrap();

        assert_eq!(view.total, 2);
        assert_eq!(rows.len(), view.rows.len());
        for (row, review) in view.rows.iter().zip(&rows) {
            assert_eq!(row, &ReviewRow::from(*review));
        }
    }

    #[test]
    fn test_reviews_no_match_is_empty_state() {
        let data = dataset();
        let detail = DetailFilter::parse(Some("3"), None).unwrap();

        let panel = reviews(Some(&data[..]), &GlobalFilter::default(), &detail);
        assert!(!panel.is_ready());
    }
}
