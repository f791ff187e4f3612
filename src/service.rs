//! Forecasting service
//!
//! Owns the data source and wires the pure pipeline together:
//! - price projection (time-index regression plus uncertainty band)
//! - chronological evaluation of a return model over engineered features
//! - historical close series
//! - compound growth calculation
//!
//! Cheap checks (model id, horizon, feature names, lookback) run before any
//! data is fetched. Fitting runs on the blocking pool.

use crate::calculator::{self, GrowthRequest, GrowthResult};
use crate::config::ForecastConfig;
use crate::data::{DataSource, Lookback};
use crate::error::{ForecastError, Result};
use crate::evaluation::{EvaluationResult, TrainEvaluator};
use crate::features::{FeatureBuilder, FeatureSet};
use crate::models::{ModelKind, ModelRegistry};
use crate::projection::{validate_horizon, ProjectionResult, Projector};
use crate::types::HistoricalSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRequest {
    #[serde(alias = "ticker")]
    pub symbol: String,
    pub horizon: i64,
    /// Falls back to the configured default model
    #[serde(default)]
    pub model: Option<String>,
    /// Also score the return model on the same history
    #[serde(default)]
    pub evaluate: bool,
    #[serde(default)]
    pub features: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectionResponse {
    pub ticker: String,
    #[serde(flatten)]
    pub projection: ProjectionResult,
    #[serde(flatten)]
    pub evaluation: Option<EvaluationResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    #[serde(alias = "ticker")]
    pub symbol: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResponse {
    pub ticker: String,
    pub model: ModelKind,
    pub features: FeatureSet,
    /// Fitted weights by column, linear models only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coefficients: Option<BTreeMap<String, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intercept: Option<f64>,
    #[serde(flatten)]
    pub evaluation: EvaluationResult,
}

/// Entry point for every forecasting operation
pub struct ForecastService<D> {
    source: D,
    config: ForecastConfig,
    registry: ModelRegistry,
}

impl<D: DataSource> ForecastService<D> {
    pub fn new(source: D, config: ForecastConfig) -> Self {
        let registry = ModelRegistry::with_seed(config.forest_seed);
        Self {
            source,
            config,
            registry,
        }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Project the close `horizon` periods ahead
    pub async fn project(&self, request: ProjectionRequest) -> Result<ProjectionResponse> {
        let result = self.project_inner(&request).await;
        log_outcome("projection", &request.symbol, &result);
        result
    }

    async fn project_inner(&self, request: &ProjectionRequest) -> Result<ProjectionResponse> {
        let symbol = normalize_symbol(&request.symbol)?;
        let horizon = validate_horizon(request.horizon)?;
        let kind = self.resolve_model(request.model.as_deref())?;
        let features = if request.evaluate {
            Some(self.feature_set(request.features.as_deref())?)
        } else {
            None
        };
        let lookback = Lookback::period(&self.config.projection_lookback)?;

        info!(symbol = %symbol, model = kind.id(), horizon, %lookback, "Projection requested");
        let series = self.source.fetch(&symbol, lookback).await?;

        let projector = Projector::new(self.registry);
        let registry = self.registry;
        let (projection, evaluation) = run_blocking(move || {
            let projection = projector.project_with(&series.closes(), horizon, kind)?;
            let evaluation = match features {
                Some(features) => {
                    let (x, y) = FeatureBuilder::new(features).build(&series)?;
                    let mut model = registry.build(kind);
                    Some(TrainEvaluator::new().evaluate(&x, &y, model.as_mut())?)
                }
                None => None,
            };
            Ok((projection, evaluation))
        })
        .await?;

        info!(
            symbol = %symbol,
            current = %projection.current_price,
            projected = %projection.projected_price,
            "Projection complete"
        );

        Ok(ProjectionResponse {
            ticker: symbol,
            projection,
            evaluation,
        })
    }

    /// Fit the return model on engineered features and score it out of sample
    pub async fn evaluate(&self, request: EvaluationRequest) -> Result<EvaluationResponse> {
        let result = self.evaluate_inner(&request).await;
        log_outcome("evaluation", &request.symbol, &result);
        result
    }

    async fn evaluate_inner(&self, request: &EvaluationRequest) -> Result<EvaluationResponse> {
        let symbol = normalize_symbol(&request.symbol)?;
        let kind = self.resolve_model(request.model.as_deref())?;
        let features = self.feature_set(request.features.as_deref())?;
        let lookback = Lookback::range(
            request.start.unwrap_or(self.config.evaluation_start),
            request.end.unwrap_or(self.config.evaluation_end),
        )?;

        info!(symbol = %symbol, model = kind.id(), %features, %lookback, "Evaluation requested");
        let series = self.source.fetch(&symbol, lookback).await?;

        let registry = self.registry;
        let feature_set = features.clone();
        let (evaluation, weights) = run_blocking(move || {
            let (x, y) = FeatureBuilder::new(feature_set).build(&series)?;
            let mut model = registry.build(kind);
            let evaluation = TrainEvaluator::new().evaluate(&x, &y, model.as_mut())?;
            let weights = model.linear_fit().map(|fit| {
                let named = x
                    .columns
                    .iter()
                    .cloned()
                    .zip(fit.coefficients.iter().copied())
                    .collect::<BTreeMap<_, _>>();
                (named, fit.intercept)
            });
            Ok((evaluation, weights))
        })
        .await?;

        let (coefficients, intercept) = match weights {
            Some((named, intercept)) => (Some(named), Some(intercept)),
            None => (None, None),
        };

        Ok(EvaluationResponse {
            ticker: symbol,
            model: kind,
            features,
            coefficients,
            intercept,
            evaluation,
        })
    }

    /// Close history for charting
    pub async fn historical(&self, symbol: &str, period: &str) -> Result<HistoricalSeries> {
        let result = self.historical_inner(symbol, period).await;
        log_outcome("historical", symbol, &result);
        result
    }

    async fn historical_inner(&self, symbol: &str, period: &str) -> Result<HistoricalSeries> {
        let symbol = normalize_symbol(symbol)?;
        let lookback = Lookback::period(period)?;

        info!(symbol = %symbol, %lookback, "History requested");
        let series = self.source.fetch(&symbol, lookback).await?;
        Ok(HistoricalSeries::from(&series))
    }

    pub fn compound_growth(&self, request: &GrowthRequest) -> Result<GrowthResult> {
        info!(
            years = request.years,
            frequency = %request.frequency,
            "Compound growth requested"
        );
        let result = calculator::compound_growth(request);
        log_outcome("compound_growth", "-", &result);
        result
    }

    fn resolve_model(&self, model: Option<&str>) -> Result<ModelKind> {
        self.registry
            .resolve(model.unwrap_or(&self.config.default_model))
    }

    fn feature_set(&self, names: Option<&[String]>) -> Result<FeatureSet> {
        FeatureSet::parse(names.unwrap_or(&self.config.default_features))
    }
}

/// Trim and upper-case a ticker
pub fn normalize_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(ForecastError::InvalidInput(
            "symbol must not be empty".to_string(),
        ));
    }
    Ok(symbol.to_ascii_uppercase())
}

async fn run_blocking<T, F>(job: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| ForecastError::Internal(format!("fitting task failed: {}", e)))?
}

fn log_outcome<T>(operation: &'static str, symbol: &str, result: &Result<T>) {
    match result {
        Ok(_) => info!(operation, symbol = symbol.trim(), "Request completed"),
        Err(e) => warn!(
            operation,
            symbol = symbol.trim(),
            kind = e.kind(),
            error = %e,
            "Request failed"
        ),
    }
}
