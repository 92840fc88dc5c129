//! Multi-source job discovery pipeline: query compilation, result
//! acquisition with caching, aggregation/deduplication, and the streaming
//! progress reporter.

pub mod acquisition;
pub mod aggregator;
pub mod cache;
pub mod handlers;
pub mod models;
pub mod provider;
pub mod query;
pub mod stream;
