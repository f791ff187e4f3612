//! MarketCalc forecasting service
//!
//! Stock price projection and next-day return regression behind an HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! DataSource (Yahoo / static) → ForecastService → Api (axum)
//!                                     │
//!            ┌────────────────────────┼──────────────────────┐
//!       Projector               FeatureBuilder          Calculator
//!   (price ~ time index)              ↓               (compound growth)
//!            │                  TrainEvaluator
//!            └──────────→ ModelRegistry ←┘
//!                 (linear, ridge, lasso, elastic, rf)
//! ```

pub mod api;
pub mod calculator;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod models;
pub mod projection;
pub mod service;
pub mod types;

#[cfg(test)]
mod error_tests;
