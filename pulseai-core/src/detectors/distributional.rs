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

//! C2: multivariate distributional (ECOD-class) detector.
//!
//! For each column, the empirical left- and right-tail probability of
//! every row's value is computed; a row's outlier score is the negative
//! sum of the logs of the smaller tail across columns — points deep in
//! either tail of any correlated dimension score high. The decision
//! threshold is the `(1 - contamination)`-quantile of the training scores,
//! and contamination adapts to how often this agent has recently tripped.

use crate::config::DetectorConfig;
use crate::error::{DetectorError, Result};
use crate::finding::{AnomalyFinding, Engine, Severity};
use std::collections::VecDeque;

const DETECTOR_NAME: &str = "distributional";
const COLUMNS: [&str; 3] = ["CPU", "Memory", "DiskIO"];

/// Per-agent state the distributional detector carries across calls: a
/// rolling history of normalized latest-sample scores, used only to adapt
/// the contamination parameter (the model itself is refit from scratch
/// every call, per the spec's "fit on X" scoring rule).
#[derive(Debug, Clone)]
pub struct DdModelCache {
    score_history: VecDeque<f64>,
    capacity: usize,
}

impl DdModelCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            score_history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn record(&mut self, normalized_score: f64) {
        if self.score_history.len() == self.capacity {
            self.score_history.pop_front();
        }
        self.score_history.push_back(normalized_score);
    }

    /// Adaptive contamination: base 0.05 until 10 samples of history exist;
    /// then tightened if >30% of recent scores were high (>0.7), loosened
    /// if <5% were.
    fn contamination(&self, base: f64) -> f64 {
        if self.score_history.len() < 10 {
            return base;
        }
        let high = self
            .score_history
            .iter()
            .filter(|&&s| s > 0.7)
            .count() as f64;
        let ratio = high / self.score_history.len() as f64;
        if ratio > 0.3 {
            (base - 0.02).max(0.01)
        } else if ratio < 0.05 {
            (base + 0.02).min(0.10)
        } else {
            base
        }
    }
}

/// Empirical CDF with add-one smoothing so neither tail probability is
/// exactly 0 or 1 (which would make the log term undefined).
fn ecdf_left(column: &[f64], x: f64) -> f64 {
    let n = column.len() as f64;
    let count = column.iter().filter(|&&v| v <= x).count() as f64;
    (count + 1.0) / (n + 1.0)
}

fn ecdf_right(column: &[f64], x: f64) -> f64 {
    let n = column.len() as f64;
    let count = column.iter().filter(|&&v| v >= x).count() as f64;
    (count + 1.0) / (n + 1.0)
}

/// Linear-interpolated percentile, matching numpy's default method.
fn percentile(column: &[f64], p: f64) -> f64 {
    let mut sorted: Vec<f64> = column.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

fn ecod_score(columns: &[Vec<f64>], row: usize) -> f64 {
    let mut score = 0.0;
    for column in columns {
        let x = column[row];
        let f_left = ecdf_left(column, x);
        let f_right = ecdf_right(column, x);
        score += -f_left.min(f_right).ln();
    }
    score
}

/// Run the distributional detector for one agent. `cpu`/`memory`/`disk_io`
/// are the rolling-window snapshots (oldest first, latest last).
pub fn run(
    cache: &mut DdModelCache,
    cpu: &[f64],
    memory: &[f64],
    disk_io: &[f64],
    config: &DetectorConfig,
) -> Result<Vec<AnomalyFinding>> {
    let n = cpu.len();
    if n < config.min_samples_dd {
        return Err(DetectorError::InsufficientData {
            detector: DETECTOR_NAME,
            have: n,
            need: config.min_samples_dd,
        });
    }
    if memory.len() != n || disk_io.len() != n {
        return Err(DetectorError::ModelFailure {
            detector: DETECTOR_NAME,
            reason: "misaligned channel lengths".to_string(),
        });
    }
    if [cpu, memory, disk_io]
        .iter()
        .any(|col| col.iter().any(|v| !v.is_finite()))
    {
        return Err(DetectorError::ModelFailure {
            detector: DETECTOR_NAME,
            reason: "non-finite input to ECOD".to_string(),
        });
    }

    let columns = [cpu.to_vec(), memory.to_vec(), disk_io.to_vec()];
    let scores: Vec<f64> = (0..n).map(|i| ecod_score(&columns, i)).collect();

    let min_score = scores.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_score = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !min_score.is_finite() || !max_score.is_finite() {
        return Err(DetectorError::ModelFailure {
            detector: DETECTOR_NAME,
            reason: "non-finite ECOD score".to_string(),
        });
    }

    let contamination = cache.contamination(0.05);
    let decision_threshold = percentile(&scores, (1.0 - contamination) * 100.0);

    let last_score = scores[n - 1];
    let normalized = (last_score - min_score) / (max_score - min_score + 1e-10);
    cache.record(normalized);

    let is_outlier = last_score >= decision_threshold;

    let (severity, confidence) = if is_outlier {
        if normalized > 0.9 {
            (Severity::Critical, 0.9)
        } else if normalized > 0.7 {
            (Severity::Warning, 0.7)
        } else {
            (Severity::Warning, 0.5)
        }
    } else {
        (Severity::Normal, 1.0 - normalized)
    };

    let mut findings = vec![AnomalyFinding {
        engine: Engine::Dd,
        metric: "Multivariate".to_string(),
        value: last_score,
        score: normalized,
        threshold: contamination,
        forecast: None,
        residual: None,
        severity,
        confidence,
        details: Some(format!(
            "CPU={:.1}, Mem={:.1}, Disk={:.2}",
            cpu[n - 1],
            memory[n - 1],
            disk_io[n - 1]
        )),
        forecast_horizon: None,
    }];

    for (idx, name) in COLUMNS.iter().enumerate() {
        let column = &columns[idx];
        let value = column[n - 1];
        let below = column.iter().filter(|&&v| v < value).count() as f64 / n as f64;
        let metric_score = (below - 0.5).abs() * 2.0;

        findings.push(AnomalyFinding {
            engine: Engine::Dd,
            metric: name.to_string(),
            value,
            score: metric_score,
            threshold: percentile(column, 95.0),
            forecast: None,
            residual: None,
            severity: if metric_score > 0.8 {
                Severity::Warning
            } else {
                Severity::Normal
            },
            confidence: confidence * 0.8,
            details: None,
            forecast_horizon: None,
        });
    }

    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stable_window(n: usize, value: f64) -> Vec<f64> {
        vec![value; n]
    }

    #[test]
    fn silent_below_minimum_samples() {
        let mut cache = DdModelCache::new(100);
        let config = DetectorConfig::default();
        let cpu = stable_window(19, 20.0);
        let err = run(&mut cache, &cpu, &cpu, &cpu, &config).unwrap_err();
        assert!(matches!(err, DetectorError::InsufficientData { .. }));
    }

    #[test]
    fn flags_a_clear_multivariate_outlier() {
        let mut cache = DdModelCache::new(100);
        let config = DetectorConfig::default();
        let mut cpu = stable_window(29, 20.0);
        let mut mem = stable_window(29, 30.0);
        let mut disk = stable_window(29, 5.0);
        cpu.push(95.0);
        mem.push(95.0);
        disk.push(80.0);

        let findings = run(&mut cache, &cpu, &mem, &disk, &config).unwrap();
        // multivariate finding + 3 per-metric breakdowns
        assert_eq!(findings.len(), 4);
        let multivariate = &findings[0];
        assert_eq!(multivariate.engine, Engine::Dd);
        assert_ne!(multivariate.severity, Severity::Normal);
        assert!(multivariate.confidence >= 0.5);
        for breakdown in &findings[1..] {
            assert!(COLUMNS.contains(&breakdown.metric.as_str()));
        }
    }

    #[test]
    fn stable_window_yields_no_outlier() {
        let mut cache = DdModelCache::new(100);
        let config = DetectorConfig::default();
        let cpu = stable_window(30, 20.0);
        let mem = stable_window(30, 30.0);
        let disk = stable_window(30, 5.0);
        let findings = run(&mut cache, &cpu, &mem, &disk, &config).unwrap();
        assert_eq!(findings[0].severity, Severity::Normal);
    }

    #[test]
    fn contamination_tightens_after_frequent_high_scores() {
        let mut cache = DdModelCache::new(100);
        for _ in 0..10 {
            cache.record(0.8);
        }
        assert_eq!(cache.contamination(0.05), 0.03);
    }

    #[test]
    fn contamination_loosens_after_quiet_history() {
        let mut cache = DdModelCache::new(100);
        for _ in 0..10 {
            cache.record(0.1);
        }
        assert_eq!(cache.contamination(0.05), 0.07);
    }

    #[test]
    fn non_finite_input_fails_as_model_failure_not_panic() {
        let mut cache = DdModelCache::new(100);
        let config = DetectorConfig::default();
        let mut cpu = stable_window(29, 20.0);
        cpu.push(f64::NAN);
        let mem = stable_window(30, 30.0);
        let disk = stable_window(30, 5.0);
        let err = run(&mut cache, &cpu, &mem, &disk, &config).unwrap_err();
        assert!(matches!(err, DetectorError::ModelFailure { .. }));
    }
}
