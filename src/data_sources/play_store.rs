//! Google Play review client.
//!
//! Reviews are served by the Play Store web frontend through its
//! `batchexecute` RPC endpoint. Each call returns one page of reviews plus
//! a continuation token; the client keeps paging until the token runs out.
//!
//! # Wire format
//!
//! The request is a form post with a single `f.req` field holding a doubly
//! encoded JSON array. The response body starts with the `)]}'` anti-XSSI
//! guard, followed by a JSON envelope whose `[0][2]` element is itself a
//! JSON string. Inside that payload, `[0]` is the list of reviews and
//! `[-2][-1]` is the next page token.

use std::ops::RangeInclusive;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use super::ReviewSource;
use crate::countries::Country;
use crate::error::FetchError;
use crate::model::RawReview;

/// Base URL for the Play Store web frontend.
const PLAY_STORE_BASE: &str = "https://play.google.com";

/// RPC id of the review listing call.
const REVIEWS_RPC_ID: &str = "UsvDTd";

/// Sort id for newest-first ordering.
const SORT_NEWEST: u8 = 2;

/// Largest page the endpoint reliably honors.
const PAGE_SIZE: usize = 199;

const RESPONSE_GUARD: &str = ")]}'";

/// Client for the Play Store review endpoint.
#[derive(Clone)]
pub struct PlayStoreClient {
    client: reqwest::Client,
    base_url: String,
    app_id: String,
    max_reviews: Option<usize>,
    page_delay_ms: RangeInclusive<u64>,
}

/// One page of reviews.
#[derive(Debug, Clone, Default)]
pub struct ReviewPage {
    pub reviews: Vec<RawReview>,
    pub next_token: Option<String>,
}

impl PlayStoreClient {
    /// Create a client for `app_id` against the public Play Store.
    pub fn new(app_id: &str) -> Self {
        Self::with_base_url(PLAY_STORE_BASE, app_id)
    }

    /// Create a client with a custom base URL (for testing).
    pub fn with_base_url(base_url: &str, app_id: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            app_id: app_id.to_string(),
            max_reviews: None,
            page_delay_ms: 200..=500,
        }
    }

    /// Stop paging once `max` reviews have been collected for a country.
    pub fn with_max_reviews(mut self, max: Option<usize>) -> Self {
        self.max_reviews = max;
        self
    }

    /// Random pause between page requests, in milliseconds.
    pub fn with_page_delay(mut self, delay_ms: RangeInclusive<u64>) -> Self {
        self.page_delay_ms = delay_ms;
        self
    }

    /// Fetch every review for the app in one storefront, newest first.
    ///
    /// # Arguments
    ///
    /// * `lang` - Review language (`hl`), e.g. "de"
    /// * `country` - Storefront code (`gl`), e.g. "de"
    #[instrument(skip(self), fields(app_id = %self.app_id))]
    pub async fn fetch_all(&self, lang: &str, country: &str) -> Result<Vec<RawReview>, FetchError> {
        let mut reviews = Vec::new();
        let mut token: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let count = match self.max_reviews {
                Some(max) => PAGE_SIZE.min(max.saturating_sub(reviews.len())),
                None => PAGE_SIZE,
            };
            if count == 0 {
                break;
            }

            let page = self.fetch_page(lang, country, count, token.as_deref()).await?;
            pages += 1;
            let fetched = page.reviews.len();
            reviews.extend(page.reviews);

            debug!(page = pages, fetched, total = reviews.len(), "Fetched review page");

            match page.next_token {
                Some(next) if fetched > 0 => token = Some(next),
                _ => break,
            }

            tokio::time::sleep(self.page_delay()).await;
        }

        if let Some(max) = self.max_reviews {
            reviews.truncate(max);
        }

        Ok(reviews)
    }

    /// Fetch a single page of reviews.
    pub async fn fetch_page(
        &self,
        lang: &str,
        country: &str,
        count: usize,
        token: Option<&str>,
    ) -> Result<ReviewPage, FetchError> {
        let url = format!(
            "{}/_/PlayStoreUi/data/batchexecute?hl={}&gl={}",
            self.base_url,
            urlencoding::encode(lang),
            urlencoding::encode(country)
        );
        let body = build_request(&self.app_id, count, token);

        let response = self
            .client
            .post(&url)
            .form(&[("f.req", body)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let text = response.text().await?;
        parse_page(&text)
    }

    fn page_delay(&self) -> Duration {
        let ms = rand::rng().random_range(self.page_delay_ms.clone());
        Duration::from_millis(ms)
    }
}

#[async_trait]
impl ReviewSource for PlayStoreClient {
    async fn fetch_reviews(&self, country: &Country) -> Result<Vec<RawReview>, FetchError> {
        self.fetch_all(country.lang, country.code).await
    }
}

/// Build the `f.req` form value for one page request.
pub fn build_request(app_id: &str, count: usize, token: Option<&str>) -> String {
    let filters = json!([null, null, null, null, null, null, null, null, null]);
    let inner = json!([
        null,
        null,
        [2, SORT_NEWEST, [count, null, token], null, filters],
        [app_id, 7]
    ]);
    json!([[[REVIEWS_RPC_ID, inner.to_string(), null, "generic"]]]).to_string()
}

/// Parse a raw `batchexecute` response body into a page of reviews.
pub fn parse_page(body: &str) -> Result<ReviewPage, FetchError> {
    let payload = body
        .trim_start()
        .strip_prefix(RESPONSE_GUARD)
        .ok_or(FetchError::Malformed("missing response guard"))?;
    let envelope: Value = serde_json::from_str(payload.trim())?;

    let inner = match &envelope[0][2] {
        Value::String(s) => s,
        // The endpoint answers with a null payload once there is nothing left.
        Value::Null if envelope[0].is_array() => return Ok(ReviewPage::default()),
        _ => return Err(FetchError::Malformed("missing review payload")),
    };
    let data: Value = serde_json::from_str(inner)?;

    let reviews = data[0]
        .as_array()
        .map(|items| items.iter().map(parse_review).collect())
        .unwrap_or_default();

    let next_token = data
        .as_array()
        .and_then(|parts| parts.len().checked_sub(2).and_then(|i| parts.get(i)))
        .and_then(|meta| meta.as_array())
        .and_then(|meta| meta.last())
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(ReviewPage {
        reviews,
        next_token,
    })
}

fn parse_review(item: &Value) -> RawReview {
    RawReview {
        username: item[1][0].as_str().map(str::to_string),
        content: item[4].as_str().map(str::to_string),
        score: item[2].as_i64(),
        posted_at: item[5][0]
            .as_i64()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{
        Form, Router,
        extract::State,
        http::StatusCode,
        routing::post,
    };
    use tokio::net::TcpListener;

    fn review_json(name: &str, score: i64, text: &str, secs: i64) -> Value {
        json!([
            "gp:AOqpTO",
            [name, [null, 2, null, [null, 0, "https://example.invalid/a.png"]]],
            score,
            null,
            text,
            [secs, 123000000],
            7,
            null,
            null,
            null,
            "1.2.3"
        ])
    }

    fn wrap(data: Value) -> String {
        let envelope = json!([
            ["wrb.fr", REVIEWS_RPC_ID, data.to_string(), null, null, null, "generic"],
            ["di", 97],
            ["af.httprm", 97, "-1", 12]
        ]);
        format!(")]}}'\n\n{}", envelope)
    }

    #[test]
    fn test_parse_page_with_token() {
        let data = json!([
            [
                review_json("Ayse", 5, "Harika oyun", 1_700_000_000),
                review_json("Bob", 2, "Too many ads", 1_700_100_000)
            ],
            null,
            [null, "next-page-token"],
            null
        ]);

        let page = parse_page(&wrap(data)).unwrap();

        assert_eq!(page.reviews.len(), 2);
        assert_eq!(page.reviews[0].username.as_deref(), Some("Ayse"));
        assert_eq!(page.reviews[0].score, Some(5));
        assert_eq!(page.reviews[1].content.as_deref(), Some("Too many ads"));
        assert_eq!(
            page.reviews[1].posted_at.map(|t| t.timestamp()),
            Some(1_700_100_000)
        );
        assert_eq!(page.next_token.as_deref(), Some("next-page-token"));
    }

    #[test]
    fn test_parse_last_page_has_no_token() {
        let data = json!([[review_json("Cem", 4, "Nice", 1_700_000_000)], null, [null], null]);

        let page = parse_page(&wrap(data)).unwrap();

        assert_eq!(page.reviews.len(), 1);
        assert!(page.next_token.is_none());
    }

    #[test]
    fn test_parse_null_payload_is_empty_page() {
        let body = ")]}'\n\n[[\"wrb.fr\",\"UsvDTd\",null,null,null,[3],\"generic\"]]";

        let page = parse_page(body).unwrap();

        assert!(page.reviews.is_empty());
        assert!(page.next_token.is_none());
    }

    #[test]
    fn test_parse_review_with_missing_fields() {
        let data = json!([[["id-only", null, null, null, null, null]], null, [null], null]);

        let page = parse_page(&wrap(data)).unwrap();
        let review = &page.reviews[0];

        assert!(review.username.is_none());
        assert!(review.content.is_none());
        assert!(review.score.is_none());
        assert!(review.posted_at.is_none());
    }

    #[test]
    fn test_parse_rejects_unguarded_body() {
        let err = parse_page("<html>blocked</html>").unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn test_build_request_first_page() {
        let body = build_request("com.example.app", 199, None);
        let outer: Value = serde_json::from_str(&body).unwrap();

        assert_eq!(outer[0][0][0], REVIEWS_RPC_ID);
        assert_eq!(outer[0][0][3], "generic");

        let inner: Value = serde_json::from_str(outer[0][0][1].as_str().unwrap()).unwrap();
        assert_eq!(inner[2][1], 2);
        assert_eq!(inner[2][2][0], 199);
        assert!(inner[2][2][2].is_null());
        assert_eq!(inner[3][0], "com.example.app");
    }

    /// Local stand-in for the batchexecute endpoint.
    ///
    /// The app id picks the scenario: `paged` serves 2 + 2 + 1 reviews over
    /// three pages, `stalled` answers an empty page that still carries a
    /// token, and `blocked` answers 503.
    async fn serve_page(
        State(calls): State<Arc<AtomicUsize>>,
        Form(form): Form<HashMap<String, String>>,
    ) -> (StatusCode, String) {
        calls.fetch_add(1, Ordering::SeqCst);

        let outer: Value = serde_json::from_str(&form["f.req"]).unwrap();
        let inner: Value = serde_json::from_str(outer[0][0][1].as_str().unwrap()).unwrap();
        let app_id = inner[3][0].as_str().unwrap_or_default();
        let token = inner[2][2][2].as_str();

        let page = |reviews: Vec<Value>, next: Option<&str>| {
            wrap(json!([reviews, null, [null, next], null]))
        };

        let body = match (app_id, token) {
            ("blocked", _) => return (StatusCode::SERVICE_UNAVAILABLE, String::new()),
            ("stalled", _) => page(Vec::new(), Some("again")),
            ("paged", None) => page(
                vec![
                    review_json("a", 5, "one", 1_700_000_500),
                    review_json("b", 4, "two", 1_700_000_400),
                ],
                Some("p2"),
            ),
            ("paged", Some("p2")) => page(
                vec![
                    review_json("c", 3, "three", 1_700_000_300),
                    review_json("d", 2, "four", 1_700_000_200),
                ],
                Some("p3"),
            ),
            ("paged", Some("p3")) => page(vec![review_json("e", 1, "five", 1_700_000_100)], None),
            _ => page(Vec::new(), None),
        };
        (StatusCode::OK, body)
    }

    async fn spawn_store() -> (String, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/_/PlayStoreUi/data/batchexecute", post(serve_page))
            .with_state(Arc::clone(&calls));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), calls)
    }

    fn test_client(base_url: &str, app_id: &str) -> PlayStoreClient {
        PlayStoreClient::with_base_url(base_url, app_id).with_page_delay(0..=0)
    }

    #[tokio::test]
    async fn test_fetch_all_follows_tokens_until_last_page() {
        let (base_url, calls) = spawn_store().await;

        let reviews = test_client(&base_url, "paged").fetch_all("tr", "tr").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let names: Vec<_> = reviews.iter().filter_map(|r| r.username.as_deref()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_fetch_all_stops_at_review_cap() {
        let (base_url, calls) = spawn_store().await;

        let reviews = test_client(&base_url, "paged")
            .with_max_reviews(Some(3))
            .fetch_all("tr", "tr")
            .await
            .unwrap();

        // Two pages reach the cap; the surplus review of the second is dropped.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(reviews.len(), 3);
        assert_eq!(reviews[2].username.as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn test_fetch_all_stops_on_empty_page() {
        let (base_url, calls) = spawn_store().await;

        let reviews = test_client(&base_url, "stalled").fetch_all("en", "us").await.unwrap();

        assert!(reviews.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_all_reports_error_status() {
        let (base_url, _calls) = spawn_store().await;

        let err = test_client(&base_url, "blocked")
            .fetch_all("en", "us")
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Status(s) if s == reqwest::StatusCode::SERVICE_UNAVAILABLE));
    }

    #[test]
    fn test_build_request_carries_token() {
        let body = build_request("com.example.app", 50, Some("tok"));
        let outer: Value = serde_json::from_str(&body).unwrap();
        let inner: Value = serde_json::from_str(outer[0][0][1].as_str().unwrap()).unwrap();

        assert_eq!(inner[2][2][2], "tok");
    }
}
