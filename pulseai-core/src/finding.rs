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

//! Output data model: findings and the per-sample detection result.
//!
//! The source stores heterogeneous findings as a list of loosely-typed
//! dataclasses distinguished by a string `engine` field. Here `Engine` is a
//! proper tagged variant so a finding's origin is checked at compile time;
//! it still serializes to the same uppercase tag the wire contract expects.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which component produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Engine {
    #[serde(rename = "DD")]
    Dd,
    #[serde(rename = "FD")]
    Fd,
    #[serde(rename = "ENSEMBLE")]
    Ensemble,
    #[serde(rename = "PERIPHERAL")]
    Peripheral,
}

/// Severity of a single finding, or of the overall sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "NORMAL")]
    Normal,
    #[serde(rename = "WARNING")]
    Warning,
    #[serde(rename = "CRITICAL")]
    Critical,
}

/// One point on a multi-horizon forecast projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonPoint {
    pub minutes: u32,
    pub value: f64,
    pub severity: Severity,
}

/// A single anomaly verdict from one engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyFinding {
    pub engine: Engine,
    pub metric: String,
    pub value: f64,
    pub score: f64,
    pub threshold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residual: Option<f64>,
    pub severity: Severity,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_horizon: Option<Vec<HorizonPoint>>,
}

impl AnomalyFinding {
    /// `score * confidence`, the quantity the ensemble scorer averages.
    pub fn weighted_score(&self) -> f64 {
        self.score * self.confidence
    }
}

/// Full detection result for one sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub agent_id: String,
    pub timestamp: String,
    pub findings: Vec<AnomalyFinding>,
    pub health_score: u8,
    pub ensemble_score: f64,
    pub raw_metrics: HashMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_result_round_trips_through_json() {
        let mut raw_metrics = HashMap::new();
        raw_metrics.insert("CPU".to_string(), 42.0);

        let result = DetectionResult {
            agent_id: "agent-1".to_string(),
            timestamp: "2026-07-27T00:00:00Z".to_string(),
            findings: vec![AnomalyFinding {
                engine: Engine::Dd,
                metric: "Multivariate".to_string(),
                value: 1.2,
                score: 0.8,
                threshold: 0.05,
                forecast: None,
                residual: None,
                severity: Severity::Warning,
                confidence: 0.7,
                details: Some("CPU=95.0".to_string()),
                forecast_horizon: None,
            }],
            health_score: 90,
            ensemble_score: 0.0,
            raw_metrics,
        };

        let json = serde_json::to_string(&result).unwrap();
        let back: DetectionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.agent_id, result.agent_id);
        assert_eq!(back.findings.len(), 1);
        assert_eq!(back.findings[0].engine, Engine::Dd);
        assert_eq!(back.findings[0].severity, Severity::Warning);
        assert!(back.findings[0].forecast.is_none());
    }

    #[test]
    fn engine_serializes_to_contract_tags() {
        assert_eq!(serde_json::to_string(&Engine::Dd).unwrap(), "\"DD\"");
        assert_eq!(serde_json::to_string(&Engine::Fd).unwrap(), "\"FD\"");
        assert_eq!(
            serde_json::to_string(&Engine::Ensemble).unwrap(),
            "\"ENSEMBLE\""
        );
        assert_eq!(
            serde_json::to_string(&Engine::Peripheral).unwrap(),
            "\"PERIPHERAL\""
        );
    }
}
