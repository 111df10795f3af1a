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

//! C5: ensemble score combination and health score accounting.
//!
//! Both operate over the findings already produced by the other
//! detectors in a sample; neither owns any per-agent state of its own.

use crate::config::DetectorConfig;
use crate::finding::{AnomalyFinding, Engine, Severity};

/// Weighted combination of the distributional and forecast findings'
/// `score * confidence` averages. Falls back to whichever engine produced
/// findings when the other didn't run or produced none, and to 0 when
/// neither did.
pub fn ensemble_score(findings: &[AnomalyFinding], config: &DetectorConfig) -> (f64, Severity) {
    let dd_scores: Vec<f64> = findings
        .iter()
        .filter(|f| f.engine == Engine::Dd)
        .map(AnomalyFinding::weighted_score)
        .collect();
    let fd_scores: Vec<f64> = findings
        .iter()
        .filter(|f| f.engine == Engine::Fd)
        .map(AnomalyFinding::weighted_score)
        .collect();

    let mean = |xs: &[f64]| xs.iter().sum::<f64>() / xs.len() as f64;

    let score = match (dd_scores.is_empty(), fd_scores.is_empty()) {
        (false, false) => config.dd_weight * mean(&dd_scores) + config.fd_weight * mean(&fd_scores),
        (false, true) => mean(&dd_scores),
        (true, false) => mean(&fd_scores),
        (true, true) => 0.0,
    };

    let severity = if score > config.ensemble_critical_threshold {
        Severity::Critical
    } else if score > config.ensemble_warning_threshold {
        Severity::Warning
    } else {
        Severity::Normal
    };

    (score, severity)
}

/// Build the `ENSEMBLE` finding itself, added only when both the
/// distributional and forecast detectors contributed findings this sample.
pub fn ensemble_finding(
    findings: &[AnomalyFinding],
    score: f64,
    severity: Severity,
    config: &DetectorConfig,
) -> Option<AnomalyFinding> {
    let has_dd = findings.iter().any(|f| f.engine == Engine::Dd);
    let has_fd = findings.iter().any(|f| f.engine == Engine::Fd);
    if !(has_dd && has_fd) {
        return None;
    }

    Some(AnomalyFinding {
        engine: Engine::Ensemble,
        metric: "Combined".to_string(),
        value: score,
        score,
        threshold: config.ensemble_warning_threshold,
        forecast: None,
        residual: None,
        severity,
        confidence: if score > 0.7 { 0.9 } else { 0.7 },
        details: Some(format!(
            "DD weight={}, FD weight={}",
            config.dd_weight, config.fd_weight
        )),
        forecast_horizon: None,
    })
}

/// Deduct from a 100-point baseline per finding: 20 points scaled by
/// confidence for a CRITICAL finding, 10 for a WARNING, clamped to [0, 100].
pub fn health_score(findings: &[AnomalyFinding], config: &DetectorConfig) -> u8 {
    let mut score: i32 = 100;
    for finding in findings {
        score -= match finding.severity {
            Severity::Critical => (config.health_deduction_critical * finding.confidence) as i32,
            Severity::Warning => (config.health_deduction_warning * finding.confidence) as i32,
            Severity::Normal => 0,
        };
    }
    score.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(engine: Engine, severity: Severity, score: f64, confidence: f64) -> AnomalyFinding {
        AnomalyFinding {
            engine,
            metric: "CPU".to_string(),
            value: 0.0,
            score,
            threshold: 0.0,
            forecast: None,
            residual: None,
            severity,
            confidence,
            details: None,
            forecast_horizon: None,
        }
    }

    #[test]
    fn combines_dd_and_fd_with_configured_weights() {
        let config = DetectorConfig::default();
        let findings = vec![
            finding(Engine::Dd, Severity::Warning, 0.8, 1.0),
            finding(Engine::Fd, Severity::Warning, 0.4, 1.0),
        ];
        let (score, severity) = ensemble_score(&findings, &config);
        assert!((score - (0.6 * 0.8 + 0.4 * 0.4)).abs() < 1e-9);
        assert_eq!(severity, Severity::Warning);
    }

    #[test]
    fn falls_back_to_whichever_engine_ran() {
        let config = DetectorConfig::default();
        let findings = vec![finding(Engine::Dd, Severity::Normal, 0.2, 1.0)];
        let (score, _) = ensemble_score(&findings, &config);
        assert!((score - 0.2).abs() < 1e-9);
    }

    #[test]
    fn no_findings_yields_zero_and_normal() {
        let config = DetectorConfig::default();
        let (score, severity) = ensemble_score(&[], &config);
        assert_eq!(score, 0.0);
        assert_eq!(severity, Severity::Normal);
    }

    #[test]
    fn ensemble_finding_only_appears_with_both_engines_present() {
        let config = DetectorConfig::default();
        let only_dd = vec![finding(Engine::Dd, Severity::Warning, 0.8, 1.0)];
        assert!(ensemble_finding(&only_dd, 0.8, Severity::Warning, &config).is_none());

        let both = vec![
            finding(Engine::Dd, Severity::Warning, 0.8, 1.0),
            finding(Engine::Fd, Severity::Warning, 0.4, 1.0),
        ];
        let found = ensemble_finding(&both, 0.6, Severity::Warning, &config).unwrap();
        assert_eq!(found.engine, Engine::Ensemble);
        assert_eq!(found.metric, "Combined");
    }

    #[test]
    fn health_score_deducts_and_clamps() {
        let config = DetectorConfig::default();
        let findings = vec![
            finding(Engine::Dd, Severity::Critical, 0.0, 1.0),
            finding(Engine::Fd, Severity::Critical, 0.0, 1.0),
            finding(Engine::Peripheral, Severity::Critical, 0.0, 1.0),
            finding(Engine::Dd, Severity::Critical, 0.0, 1.0),
            finding(Engine::Fd, Severity::Critical, 0.0, 1.0),
            finding(Engine::Peripheral, Severity::Critical, 0.0, 1.0),
        ];
        assert_eq!(health_score(&findings, &config), 0);
    }

    #[test]
    fn no_findings_means_full_health() {
        let config = DetectorConfig::default();
        assert_eq!(health_score(&[], &config), 100);
    }
}
