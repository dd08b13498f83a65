//! TrackFlow: issue and project tracking with dashboard analytics.

pub mod analytics;
pub mod config;
pub mod error;
pub mod markup;
pub mod output;
pub mod store;
pub mod timeline;
pub mod tracking;
pub mod types;
