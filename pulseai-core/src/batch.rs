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

//! C7: one-shot batch forecast over a complete historical series, separate
//! from the per-sample streaming path and carrying no cache of its own.

use crate::detectors::forecast::fit_and_project;
use crate::finding::{HorizonPoint, Severity};
use crate::sample::{Metric, Sample};
use serde::{Deserialize, Serialize};

const SAMPLE_MINUTES: [u32; 4] = [10, 30, 60, 120];

/// Result of [`batch_forecast`]: a multi-horizon projection for CPU and
/// Memory plus the last observed values, or an error marker if the series
/// was too short or either model failed to fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchForecastResult {
    pub cpu: Vec<HorizonPoint>,
    pub memory: Vec<HorizonPoint>,
    pub current_cpu: f64,
    pub current_memory: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn project_metric(values: &[f64], metric: Metric, horizon: usize, season_length: usize) -> Vec<HorizonPoint> {
    let forecasts = match fit_and_project(values, season_length, horizon) {
        Ok(forecasts) => forecasts,
        Err(_) => return Vec::new(),
    };
    let (warn_at, crit_at) = metric.static_thresholds();

    SAMPLE_MINUTES
        .iter()
        .map(|&minutes| {
            let index = (minutes as usize * 12).saturating_sub(1).min(forecasts.len() - 1);
            let value = (forecasts[index] * 100.0).round() / 100.0;
            let severity = if value >= crit_at {
                Severity::Critical
            } else if value >= warn_at {
                Severity::Warning
            } else {
                Severity::Normal
            };
            HorizonPoint {
                minutes,
                value,
                severity,
            }
        })
        .collect()
}

/// Forecast CPU and Memory `forecast_hours` hours beyond the end of
/// `series`, a complete run of historical samples ordered oldest-first.
/// Requires at least `min_samples` points (the same floor as the
/// per-sample forecast detector); returns an error marker otherwise.
pub fn batch_forecast(
    series: &[Sample],
    forecast_hours: u32,
    min_samples: usize,
    season_length: usize,
) -> BatchForecastResult {
    if series.len() < min_samples {
        tracing::warn!(
            have = series.len(),
            need = min_samples,
            "not enough data for batch forecast"
        );
        return BatchForecastResult {
            cpu: Vec::new(),
            memory: Vec::new(),
            current_cpu: 0.0,
            current_memory: 0.0,
            error: Some("Not enough data".to_string()),
        };
    }

    tracing::info!(records = series.len(), "running batch forecast");

    let cpu_values: Vec<f64> = series.iter().map(|s| s.cpu).collect();
    let memory_values: Vec<f64> = series.iter().map(|s| s.memory).collect();
    let horizon = forecast_hours as usize * 60 * 12;

    let cpu = project_metric(&cpu_values, Metric::Cpu, horizon, season_length);
    let memory = project_metric(&memory_values, Metric::Memory, horizon, season_length);

    let round2 = |v: f64| (v * 100.0).round() / 100.0;

    BatchForecastResult {
        cpu,
        memory,
        current_cpu: cpu_values.last().copied().map(round2).unwrap_or(0.0),
        current_memory: memory_values.last().copied().map(round2).unwrap_or(0.0),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(n: usize) -> Vec<Sample> {
        (0..n)
            .map(|i| Sample {
                cpu: 30.0 + 5.0 * ((2.0 * std::f64::consts::PI * i as f64) / 12.0).sin(),
                memory: 40.0,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn returns_error_marker_when_series_too_short() {
        let result = batch_forecast(&series(29), 2, 30, 12);
        assert!(result.cpu.is_empty());
        assert!(result.memory.is_empty());
        assert_eq!(result.error.as_deref(), Some("Not enough data"));
    }

    #[test]
    fn projects_four_horizon_points_per_metric() {
        let result = batch_forecast(&series(40), 2, 30, 12);
        assert_eq!(result.cpu.len(), 4);
        assert_eq!(result.memory.len(), 4);
        let minutes: Vec<u32> = result.cpu.iter().map(|p| p.minutes).collect();
        assert_eq!(minutes, vec![10, 30, 60, 120]);
        assert!(result.error.is_none());
    }

    #[test]
    fn current_values_are_the_last_observed_point() {
        let mut data = series(35);
        data.last_mut().unwrap().cpu = 77.125;
        let result = batch_forecast(&data, 2, 30, 12);
        assert_eq!(result.current_cpu, 77.13);
    }
}
