// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! C3: per-metric forecast (AutoARIMA-class) detector with model caching
//! and multi-horizon projection.
//!
//! The statistical library substitution note in the spec allows any
//! seasonal forecaster that auto-selects its order, predicts an arbitrary
//! horizon, and is stable across calls with appended data. [`ForecastModel`]
//! is a fixed-form seasonal-trend model (ordinary least squares trend plus
//! a centered seasonal component) whose "order selection" is a one-shot
//! comparison between a trend-only and a trend-plus-seasonal fit by
//! in-sample sum of squared error — deliberately simple, in the spirit of
//! the design note that a constrained SARIMA-like fit is an acceptable
//! stand-in for a full AutoARIMA search.

use crate::config::DetectorConfig;
use crate::error::{DetectorError, Result};
use crate::finding::{AnomalyFinding, Engine, HorizonPoint, Severity};
use crate::sample::Metric;
use std::collections::VecDeque;

const DETECTOR_NAME: &str = "forecast";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelKind {
    Drift,
    SeasonalDrift,
}

/// A fitted forecaster: an OLS trend line plus an optional centered
/// seasonal offset indexed by `position % season_length`.
#[derive(Debug, Clone)]
struct ForecastModel {
    kind: ModelKind,
    intercept: f64,
    slope: f64,
    seasonal: Vec<f64>,
    season_length: usize,
    /// Absolute index of the last point the model was fit through.
    last_index: usize,
}

impl ForecastModel {
    fn trend_at(&self, index: f64) -> f64 {
        self.intercept + self.slope * index
    }

    fn seasonal_at(&self, index: usize) -> f64 {
        match self.kind {
            ModelKind::Drift => 0.0,
            ModelKind::SeasonalDrift => {
                self.seasonal[index % self.season_length.max(1)]
            }
        }
    }

    /// Forecast the value `h` steps beyond the last fitted point (h >= 1).
    fn predict(&self, h: usize) -> f64 {
        let index = self.last_index + h;
        self.trend_at(index as f64) + self.seasonal_at(index)
    }
}

fn ols_trend(series: &[f64]) -> (f64, f64) {
    let n = series.len() as f64;
    let xs: Vec<f64> = (0..series.len()).map(|i| i as f64).collect();
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = series.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut den = 0.0;
    for (x, y) in xs.iter().zip(series.iter()) {
        num += (x - x_mean) * (y - y_mean);
        den += (x - x_mean).powi(2);
    }
    let slope = if den.abs() < 1e-12 { 0.0 } else { num / den };
    let intercept = y_mean - slope * x_mean;
    (intercept, slope)
}

fn seasonal_means(series: &[f64], intercept: f64, slope: f64, season_length: usize) -> Vec<f64> {
    let mut sums = vec![0.0; season_length];
    let mut counts = vec![0usize; season_length];
    for (i, &y) in series.iter().enumerate() {
        let detrended = y - (intercept + slope * i as f64);
        let phase = i % season_length;
        sums[phase] += detrended;
        counts[phase] += 1;
    }
    let mut means: Vec<f64> = sums
        .iter()
        .zip(counts.iter())
        .map(|(&s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
        .collect();
    let mean_of_means = means.iter().sum::<f64>() / means.len() as f64;
    for m in &mut means {
        *m -= mean_of_means;
    }
    means
}

fn sse(series: &[f64], intercept: f64, slope: f64, seasonal: &[f64], season_length: usize) -> f64 {
    series
        .iter()
        .enumerate()
        .map(|(i, &y)| {
            let predicted = intercept + slope * i as f64 + seasonal.get(i % season_length.max(1)).copied().unwrap_or(0.0);
            (y - predicted).powi(2)
        })
        .sum()
}

/// Try both candidate forms and keep whichever fits the in-sample data
/// better. Requires at least two full seasonal cycles before the seasonal
/// candidate is even considered.
fn fit_with_selection(series: &[f64], season_length: usize) -> Result<ForecastModel> {
    if series.iter().any(|v| !v.is_finite()) {
        return Err(DetectorError::ModelFailure {
            detector: DETECTOR_NAME,
            reason: "non-finite input to forecaster".to_string(),
        });
    }

    let (intercept, slope) = ols_trend(series);
    let drift_sse = sse(series, intercept, slope, &[], season_length);

    let (kind, seasonal) = if series.len() >= season_length * 2 {
        let seasonal = seasonal_means(series, intercept, slope, season_length);
        let seasonal_sse = sse(series, intercept, slope, &seasonal, season_length);
        if seasonal_sse < drift_sse {
            (ModelKind::SeasonalDrift, seasonal)
        } else {
            (ModelKind::Drift, Vec::new())
        }
    } else {
        (ModelKind::Drift, Vec::new())
    };

    Ok(ForecastModel {
        kind,
        intercept,
        slope,
        seasonal,
        season_length,
        last_index: series.len() - 1,
    })
}

/// Cheaper re-estimation that keeps the previously selected model form and
/// just recomputes its parameters against the current window.
fn refit_params(series: &[f64], kind: ModelKind, season_length: usize) -> Result<ForecastModel> {
    if series.iter().any(|v| !v.is_finite()) {
        return Err(DetectorError::ModelFailure {
            detector: DETECTOR_NAME,
            reason: "non-finite input to forecaster".to_string(),
        });
    }
    let (intercept, slope) = ols_trend(series);
    let seasonal = match kind {
        ModelKind::Drift => Vec::new(),
        ModelKind::SeasonalDrift => seasonal_means(series, intercept, slope, season_length),
    };
    Ok(ForecastModel {
        kind,
        intercept,
        slope,
        seasonal,
        season_length,
        last_index: series.len() - 1,
    })
}

/// Fit a one-off model over an arbitrary series and return point forecasts
/// for steps `1..=horizon` beyond its last point. Used by batch forecasting,
/// which has no per-agent cache to reuse across calls.
pub fn fit_and_project(series: &[f64], season_length: usize, horizon: usize) -> Result<Vec<f64>> {
    let model = fit_with_selection(series, season_length)?;
    Ok((1..=horizon).map(|h| model.predict(h)).collect())
}

/// Per-(agent, metric) forecaster and its residual window — a single
/// compartment, per the design note that the two always travel together.
pub struct FdModelCache {
    model: Option<ForecastModel>,
    residuals: VecDeque<f64>,
    capacity: usize,
}

impl FdModelCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            model: None,
            residuals: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Number of residuals currently held, for tests that check the
    /// window stays capped at the configured capacity.
    pub fn residual_len(&self) -> usize {
        self.residuals.len()
    }

    fn record_residual(&mut self, residual: f64) {
        if self.residuals.len() == self.capacity {
            self.residuals.pop_front();
        }
        self.residuals.push_back(residual);
    }

    fn threshold(&self, k: f64) -> f64 {
        if self.residuals.len() > 5 {
            let mean = self.residuals.iter().sum::<f64>() / self.residuals.len() as f64;
            let variance = self
                .residuals
                .iter()
                .map(|r| (r - mean).powi(2))
                .sum::<f64>()
                / self.residuals.len() as f64;
            (k * variance.sqrt()).max(0.1)
        } else if !self.residuals.is_empty() {
            let mean = self.residuals.iter().sum::<f64>() / self.residuals.len() as f64;
            mean * 2.0
        } else {
            1.0
        }
    }
}

/// Run the forecast detector for one (agent, metric) series. `series` is
/// the rolling-window snapshot, oldest first, latest last.
pub fn run(
    cache: &mut FdModelCache,
    metric: Metric,
    series: &[f64],
    config: &DetectorConfig,
) -> Result<AnomalyFinding> {
    let n = series.len();
    if n < config.min_samples_fd {
        return Err(DetectorError::InsufficientData {
            detector: DETECTOR_NAME,
            have: n,
            need: config.min_samples_fd,
        });
    }

    let needs_full_refit = cache.model.is_none() || n % config.refit_interval == 0;

    let model = if needs_full_refit {
        fit_with_selection(series, config.season_length)?
    } else {
        let kind = cache.model.as_ref().unwrap().kind;
        refit_params(series, kind, config.season_length)?
    };

    let steps = config.horizon_steps();
    let max_h = *steps.iter().max().unwrap();
    let forecast_at = |h: usize| model.predict(h);

    let f1 = forecast_at(1);
    if !f1.is_finite() {
        return Err(DetectorError::ModelFailure {
            detector: DETECTOR_NAME,
            reason: "non-finite forecast".to_string(),
        });
    }

    let actual = series[n - 1];
    let residual = (actual - f1).abs();
    cache.record_residual(residual);
    let threshold = cache.threshold(config.residual_k);
    let score = residual / threshold.max(0.01);

    let (severity, confidence) = if residual > threshold * 1.5 {
        (Severity::Critical, (score / 2.0).min(0.95))
    } else if residual > threshold {
        (Severity::Warning, (score / 2.0).min(0.8))
    } else {
        (Severity::Normal, 1.0 - score.min(0.9))
    };

    let (warn_at, crit_at) = metric.static_thresholds();
    let forecast_horizon: Vec<HorizonPoint> = steps
        .iter()
        .zip(config.horizon_minutes.iter())
        .map(|(&step, &minutes)| {
            let value = forecast_at(step.min(max_h));
            let future_severity = if value >= crit_at {
                Severity::Critical
            } else if value >= warn_at {
                Severity::Warning
            } else {
                Severity::Normal
            };
            HorizonPoint {
                minutes,
                value,
                severity: future_severity,
            }
        })
        .collect();

    cache.model = Some(model);

    Ok(AnomalyFinding {
        engine: Engine::Fd,
        metric: metric.as_str().to_string(),
        value: actual,
        score,
        threshold,
        forecast: Some(f1),
        residual: Some(residual),
        severity,
        confidence,
        details: Some(format!("predicted={f1:.2}, actual={actual:.2}")),
        forecast_horizon: Some(forecast_horizon),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_series(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 30.0 + 5.0 * ((2.0 * std::f64::consts::PI * i as f64) / 12.0).sin())
            .collect()
    }

    #[test]
    fn silent_below_minimum_samples() {
        let mut cache = FdModelCache::new(60);
        let config = DetectorConfig::default();
        let series = sine_series(29);
        let err = run(&mut cache, Metric::Cpu, &series, &config).unwrap_err();
        assert!(matches!(err, DetectorError::InsufficientData { .. }));
    }

    #[test]
    fn flags_a_spike_against_a_seasonal_baseline() {
        let mut cache = FdModelCache::new(60);
        let config = DetectorConfig::default();
        let mut series = sine_series(35);
        series.push(90.0);

        let finding = run(&mut cache, Metric::Cpu, &series, &config).unwrap();
        assert_eq!(finding.engine, Engine::Fd);
        let residual = finding.residual.unwrap();
        let forecast = finding.forecast.unwrap();
        assert!((residual - (90.0 - forecast).abs()).abs() < 1e-9);
        assert_eq!(finding.forecast_horizon.as_ref().unwrap().len(), 3);
        let minutes: Vec<u32> = finding
            .forecast_horizon
            .unwrap()
            .iter()
            .map(|p| p.minutes)
            .collect();
        assert_eq!(minutes, vec![30, 60, 120]);
    }

    #[test]
    fn stable_series_does_not_trip_warning() {
        let mut cache = FdModelCache::new(60);
        let config = DetectorConfig::default();
        let series = vec![20.0; 40];
        let finding = run(&mut cache, Metric::Cpu, &series, &config).unwrap();
        assert_eq!(finding.severity, Severity::Normal);
    }

    #[test]
    fn refit_happens_at_multiples_of_the_interval() {
        let mut cache = FdModelCache::new(60);
        let config = DetectorConfig::default().with_window(200);
        // Drive the series length to exactly 100 (a refit boundary).
        let series = sine_series(99);
        run(&mut cache, Metric::Cpu, &series, &config).unwrap();
        assert!(cache.model.is_some());
        let series = sine_series(100);
        let finding = run(&mut cache, Metric::Cpu, &series, &config).unwrap();
        assert!(finding.forecast.unwrap().is_finite());
    }
}
