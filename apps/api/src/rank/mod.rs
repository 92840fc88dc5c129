//! Personalized ranking: profile assembly, term selection, scoring, and the
//! per-user recommendation cache.

pub mod engine;
pub mod handlers;
pub mod profile;
pub mod scoring;
pub mod terms;
