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

//! Configuration for detector thresholds and window sizes.
//!
//! Externalizes the constants that are part of the detection contract so a
//! host can tune them (e.g. a smaller window in tests) without touching
//! detector logic. `DetectorConfig::default()` reproduces the spec's
//! contract values exactly.

use serde::{Deserialize, Serialize};

/// Tunable parameters shared by every component of the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Rolling buffer capacity per agent (W).
    pub window_size: usize,
    /// Minimum samples before the distributional detector runs.
    pub min_samples_dd: usize,
    /// Minimum samples before the forecast detector runs.
    pub min_samples_fd: usize,
    /// Seasonal period used by the forecast model.
    pub season_length: usize,
    /// Multiplier on residual stdev for the adaptive forecast threshold.
    pub residual_k: f64,
    /// Ensemble weight applied to the distributional detector.
    pub dd_weight: f64,
    /// Ensemble weight applied to the forecast detector.
    pub fd_weight: f64,
    /// Consecutive peripheral failures before a finding is raised.
    pub peripheral_failure_threshold: u32,
    /// Peripheral failure count at and above which severity is CRITICAL.
    pub peripheral_critical_threshold: u32,
    /// Health-score deduction base for a CRITICAL finding (scaled by confidence).
    pub health_deduction_critical: f64,
    /// Health-score deduction base for a WARNING finding (scaled by confidence).
    pub health_deduction_warning: f64,
    /// Ensemble score above which overall severity is WARNING.
    pub ensemble_warning_threshold: f64,
    /// Ensemble score above which overall severity is CRITICAL.
    pub ensemble_critical_threshold: f64,
    /// Forecast horizons to project, in minutes (also determines step counts
    /// assuming a 5-second sample cadence: minutes * 12).
    pub horizon_minutes: [u32; 3],
    /// Re-fit the forecast model every this many samples.
    pub refit_interval: usize,
    /// Length of the rolling normalized-score history used to adapt
    /// contamination for the distributional detector.
    pub score_history_len: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_size: 60,
            min_samples_dd: 20,
            min_samples_fd: 30,
            season_length: 12,
            residual_k: 2.5,
            dd_weight: 0.6,
            fd_weight: 0.4,
            peripheral_failure_threshold: 3,
            peripheral_critical_threshold: 5,
            health_deduction_critical: 20.0,
            health_deduction_warning: 10.0,
            ensemble_warning_threshold: 0.5,
            ensemble_critical_threshold: 0.8,
            horizon_minutes: [30, 60, 120],
            refit_interval: 100,
            score_history_len: 100,
        }
    }
}

impl DetectorConfig {
    /// Horizon steps assuming a 5-second sample cadence (12 samples/minute).
    pub fn horizon_steps(&self) -> [usize; 3] {
        [
            self.horizon_minutes[0] as usize * 12,
            self.horizon_minutes[1] as usize * 12,
            self.horizon_minutes[2] as usize * 12,
        ]
    }

    /// A config with a tiny window, useful for exercising boundary
    /// behavior in tests without feeding hundreds of samples.
    pub fn with_window(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_contract_constants() {
        let c = DetectorConfig::default();
        assert_eq!(c.window_size, 60);
        assert_eq!(c.min_samples_dd, 20);
        assert_eq!(c.min_samples_fd, 30);
        assert_eq!(c.season_length, 12);
        assert_eq!(c.residual_k, 2.5);
        assert_eq!(c.dd_weight, 0.6);
        assert_eq!(c.fd_weight, 0.4);
        assert_eq!(c.peripheral_failure_threshold, 3);
        assert_eq!(c.horizon_steps(), [360, 720, 1440]);
    }
}
