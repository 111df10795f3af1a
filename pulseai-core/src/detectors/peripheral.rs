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

//! C4: consecutive-failure state machine over peripheral device logs.
//!
//! Per device this is a small state machine with states
//! `HEALTHY`, `DEGRADED(k)`, `CRITICAL(k)`: `failed` increments `k` and
//! reclassifies by `k`, `connected` resets to `HEALTHY`, anything else
//! leaves the counter untouched.

use crate::config::DetectorConfig;
use crate::finding::{AnomalyFinding, Engine, Severity};
use crate::sample::{LogEntry, PERIPHERAL_CHECK_BODY_TYPE, STATUS_CONNECTED, STATUS_FAILED};
use std::collections::HashMap;

/// Per-agent peripheral tracking: last observed status and consecutive
/// failure count for every device seen so far.
#[derive(Debug, Clone, Default)]
pub struct PeripheralState {
    pub failure_counts: HashMap<String, u32>,
    pub last_status: HashMap<String, String>,
}

/// Run the peripheral monitor over one sample's logs, updating `state` in
/// place and returning findings in input log order (one finding per
/// (device, status) pair that crosses the failure threshold).
pub fn check_peripherals(
    state: &mut PeripheralState,
    logs: &[LogEntry],
    config: &DetectorConfig,
) -> Vec<AnomalyFinding> {
    let mut findings = Vec::new();

    for entry in logs {
        if entry.body_type != PERIPHERAL_CHECK_BODY_TYPE {
            continue;
        }

        for (device, status) in &entry.key_values {
            state.last_status.insert(device.clone(), status.clone());

            if status == STATUS_FAILED {
                let count = state.failure_counts.entry(device.clone()).or_insert(0);
                *count += 1;
                let count = *count;

                if count >= config.peripheral_failure_threshold {
                    findings.push(AnomalyFinding {
                        engine: Engine::Peripheral,
                        metric: device.clone(),
                        value: count as f64,
                        score: (count as f64 / 10.0).min(1.0),
                        threshold: config.peripheral_failure_threshold as f64,
                        forecast: None,
                        residual: None,
                        severity: if count >= config.peripheral_critical_threshold {
                            Severity::Critical
                        } else {
                            Severity::Warning
                        },
                        confidence: 0.95,
                        details: Some(format!("{device} failed {count} consecutive checks")),
                        forecast_horizon: None,
                    });
                }
            } else if status == STATUS_CONNECTED {
                if let Some(prior) = state.failure_counts.get(device).copied() {
                    if prior > 0 {
                        tracing::info!(device, prior_failures = prior, "peripheral recovered");
                    }
                }
                state.failure_counts.insert(device.clone(), 0);
            }
            // Any other status value leaves the counter unchanged.
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn log(device: &str, status: &str) -> LogEntry {
        let mut kv = IndexMap::new();
        kv.insert(device.to_string(), status.to_string());
        LogEntry {
            body_type: PERIPHERAL_CHECK_BODY_TYPE.to_string(),
            key_values: kv,
        }
    }

    #[test]
    fn finding_appears_at_third_consecutive_failure() {
        let config = DetectorConfig::default();
        let mut state = PeripheralState::default();

        assert!(check_peripherals(&mut state, &[log("printer", STATUS_FAILED)], &config).is_empty());
        assert!(check_peripherals(&mut state, &[log("printer", STATUS_FAILED)], &config).is_empty());
        let findings = check_peripherals(&mut state, &[log("printer", STATUS_FAILED)], &config);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].engine, Engine::Peripheral);
    }

    #[test]
    fn connected_resets_counter_and_count_restarts_from_one() {
        let config = DetectorConfig::default();
        let mut state = PeripheralState::default();

        for _ in 0..3 {
            check_peripherals(&mut state, &[log("printer", STATUS_FAILED)], &config);
        }
        assert_eq!(state.failure_counts["printer"], 3);

        check_peripherals(&mut state, &[log("printer", STATUS_CONNECTED)], &config);
        assert_eq!(state.failure_counts["printer"], 0);

        let findings = check_peripherals(&mut state, &[log("printer", STATUS_FAILED)], &config);
        assert_eq!(state.failure_counts["printer"], 1);
        assert!(findings.is_empty());
    }

    #[test]
    fn five_failures_escalate_to_critical() {
        let config = DetectorConfig::default();
        let mut state = PeripheralState::default();
        let mut last = Vec::new();
        for _ in 0..5 {
            last = check_peripherals(&mut state, &[log("scanner", STATUS_FAILED)], &config);
        }
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].severity, Severity::Critical);
    }

    #[test]
    fn multi_device_entry_yields_findings_in_wire_order() {
        let config = DetectorConfig::default();
        let mut state = PeripheralState::default();

        // Warm both devices up to 2 consecutive failures each...
        for _ in 0..2 {
            let mut kv = IndexMap::new();
            kv.insert("scanner".to_string(), STATUS_FAILED.to_string());
            kv.insert("printer".to_string(), STATUS_FAILED.to_string());
            let entry = LogEntry {
                body_type: PERIPHERAL_CHECK_BODY_TYPE.to_string(),
                key_values: kv,
            };
            check_peripherals(&mut state, &[entry], &config);
        }

        // ...then cross the threshold for both in one entry, scanner first.
        let mut kv = IndexMap::new();
        kv.insert("scanner".to_string(), STATUS_FAILED.to_string());
        kv.insert("printer".to_string(), STATUS_FAILED.to_string());
        let entry = LogEntry {
            body_type: PERIPHERAL_CHECK_BODY_TYPE.to_string(),
            key_values: kv,
        };

        let findings = check_peripherals(&mut state, &[entry], &config);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].metric, "scanner");
        assert_eq!(findings[1].metric, "printer");
    }

    #[test]
    fn non_peripheral_logs_are_ignored() {
        let config = DetectorConfig::default();
        let mut state = PeripheralState::default();
        let entry = LogEntry {
            body_type: "other".to_string(),
            key_values: IndexMap::new(),
        };
        assert!(check_peripherals(&mut state, &[entry], &config).is_empty());
        assert!(state.failure_counts.is_empty());
    }
}
