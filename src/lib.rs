//! Market Dashboard Service
//!
//! A real-time stock dashboard: an in-memory market store behind a REST API,
//! a live event stream, and a background refresh coordinator that keeps the
//! rendered panels current.

pub mod api;
pub mod client;
pub mod config;
pub mod feed;
pub mod models;
pub mod portfolio;
pub mod ranking;
pub mod refresh;
pub mod search;
pub mod sector;
pub mod sorting;
pub mod storage;
pub mod trend;
