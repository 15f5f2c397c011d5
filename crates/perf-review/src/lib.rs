//! Scoring core for the annual performance review.
//!
//! [`review::scoring`] holds the pure axis calculators and grid mapping, while
//! [`review::ScoringStateManager`] tracks one review's scores as they are entered and
//! persists them through a debounced [`review::ScoreStore`].

pub mod config;
pub mod error;
pub mod review;
pub mod telemetry;
