//! Reviewdash - app-store reviews by country, as an interactive dashboard.
//!
//! # Overview
//!
//! Reviewdash pulls the Google Play reviews of one app for a chosen set of
//! storefront countries, normalizes them into a flat table and serves a
//! browser dashboard with metrics, trend and comparison charts, and a
//! filterable review table that can be exported as CSV.
//!
//! Nothing is persisted. Fetched reviews are cached in memory per country
//! for a fixed time, and each browser session keeps its own dataset until
//! it is cleared.
//!
//! # Modules
//!
//! - [`data_sources`]: The review source trait and the Play Store client
//! - [`pipeline`]: Per-country fetch with skip-and-warn error handling
//! - [`cache`], [`session`]: In-memory state
//! - [`filter`], [`aggregation`]: Filtering and statistics
//! - [`dashboard`]: View building
//! - [`export`]: CSV export
//! - [`api`], [`extract`]: HTTP API handlers and their extractors

pub mod aggregation;
pub mod api;
pub mod cache;
pub mod config;
pub mod countries;
pub mod dashboard;
pub mod data_sources;
pub mod error;
pub mod export;
pub mod extract;
pub mod filter;
pub mod model;
pub mod pipeline;
pub mod session;
