//! Client-side synchronization and analytics engine for a prediction-market
//! monitoring dashboard.
//!
//! [`poll::PollCoordinator`] owns the session and drives every fetch;
//! [`analytics`] turns raw feed data into heatmaps, ladders, timelines and
//! chart geometry; [`view::DashboardView`] is what a renderer consumes.

pub mod analytics;
pub mod config;
pub mod error;
pub mod market_data;
pub mod metrics;
pub mod poll;
pub mod state;
pub mod view;

pub use error::{FetchError, FetchResult};
pub use poll::{CascadeReport, FetchOutcome, PollCoordinator, PollSettings};
