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

//! C6: the public entry point. [`AnomalyEngine::detect`] wires the
//! rolling buffer, both model-backed detectors, the peripheral monitor,
//! and the ensemble scorer into one per-sample call.
//!
//! Finding order within a [`crate::finding::DetectionResult`] is fixed:
//! the multivariate distributional finding, its three per-metric
//! breakdowns (CPU, Memory, DiskIO), the forecast findings (CPU, Memory),
//! the peripheral findings in input log order, and the ensemble finding
//! last if both model-backed detectors contributed this cycle.

use crate::config::DetectorConfig;
use crate::detectors::forecast::FdModelCache;
use crate::detectors::{distributional, forecast, peripheral};
use crate::ensemble;
use crate::error::DetectorError;
use crate::finding::DetectionResult;
use crate::registry::AgentRegistry;
use crate::sample::{Metric, Sample};
use std::collections::HashMap;

/// The detection engine: an [`AgentRegistry`] plus the shared config every
/// detector reads from. Cheap to construct; holds all per-agent state
/// behind interior sharded locking, so it is safe to share across threads
/// via `Arc<AnomalyEngine>`.
pub struct AnomalyEngine {
    registry: AgentRegistry,
}

impl AnomalyEngine {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            registry: AgentRegistry::new(config),
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        self.registry.config()
    }

    /// Run every detector over `sample` for its agent, returning the full
    /// [`DetectionResult`]. Infallible: any detector that cannot run yet
    /// (insufficient history) or fails internally simply contributes no
    /// finding this cycle, logged at `warn` for a genuine model failure.
    pub fn detect(&self, sample: &Sample) -> DetectionResult {
        let config = self.registry.config();

        self.registry.with_agent(&sample.agent_id, |state| {
            state.buffer.append(sample);

            let mut findings = Vec::new();

            match distributional::run(
                &mut state.dd_cache,
                &state.buffer.cpu(),
                &state.buffer.memory(),
                &state.buffer.disk_io(),
                config,
            ) {
                Ok(dd_findings) => findings.extend(dd_findings),
                Err(DetectorError::InsufficientData { .. }) => {}
                Err(DetectorError::ModelFailure { detector, reason }) => {
                    tracing::warn!(detector, reason, "distributional detector failed");
                }
            }

            for metric in [Metric::Cpu, Metric::Memory] {
                let cache = state
                    .fd_caches
                    .entry(metric)
                    .or_insert_with(|| FdModelCache::new(config.window_size));
                let series = state.buffer.channel(metric);
                match forecast::run(cache, metric, &series, config) {
                    Ok(finding) => findings.push(finding),
                    Err(DetectorError::InsufficientData { .. }) => {}
                    Err(DetectorError::ModelFailure { detector, reason }) => {
                        tracing::warn!(detector, reason, "forecast detector failed");
                    }
                }
            }

            findings.extend(peripheral::check_peripherals(
                &mut state.peripheral,
                &sample.logs,
                config,
            ));

            let (ensemble_score, ensemble_severity) = ensemble::ensemble_score(&findings, config);
            if let Some(finding) =
                ensemble::ensemble_finding(&findings, ensemble_score, ensemble_severity, config)
            {
                findings.push(finding);
            }

            let health_score = ensemble::health_score(&findings, config);

            let mut raw_metrics = HashMap::new();
            raw_metrics.insert("CPU".to_string(), sample.cpu);
            raw_metrics.insert("Memory".to_string(), sample.memory);
            raw_metrics.insert("DiskIO".to_string(), sample.disk_io);
            raw_metrics.insert("NetworkSent".to_string(), sample.network_sent);
            raw_metrics.insert("NetworkRecv".to_string(), sample.network_recv);

            DetectionResult {
                agent_id: sample.agent_id.clone(),
                timestamp: sample.timestamp.clone(),
                findings,
                health_score,
                ensemble_score,
                raw_metrics,
            }
        })
    }
}

impl Default for AnomalyEngine {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}
