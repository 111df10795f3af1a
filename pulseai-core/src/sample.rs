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

//! Input data model: one telemetry sample from one agent.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Body type marking a peripheral device status-check log entry.
pub const PERIPHERAL_CHECK_BODY_TYPE: &str = "주변장치 체크";
/// Status value meaning a device failed its check.
pub const STATUS_FAILED: &str = "실패";
/// Status value meaning a device is connected/healthy.
pub const STATUS_CONNECTED: &str = "연결";

/// One log line carried alongside a sample. Only entries whose `body_type`
/// is [`PERIPHERAL_CHECK_BODY_TYPE`] are consumed by the peripheral monitor;
/// anything else passes through the core untouched.
///
/// `key_values` preserves wire order (an [`IndexMap`] rather than a
/// [`std::collections::HashMap`]) so a check reporting several devices at
/// once yields peripheral findings in the same order they arrived, per the
/// ordering guarantee in §5.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub body_type: String,
    pub key_values: IndexMap<String, String>,
}

/// A single telemetry sample from one POS agent.
///
/// `agent_id` defaults to `"unknown"` and numeric fields default to `0.0`
/// when absent from the wire payload (see [`crate::error`] module docs and
/// §7 of the spec) — the orchestrator never rejects a sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    #[serde(default = "default_agent_id")]
    pub agent_id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub cpu: f64,
    #[serde(default)]
    pub memory: f64,
    #[serde(default)]
    pub disk_io: f64,
    #[serde(default)]
    pub network_sent: f64,
    #[serde(default)]
    pub network_recv: f64,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

fn default_agent_id() -> String {
    "unknown".to_string()
}

impl Default for Sample {
    fn default() -> Self {
        Self {
            agent_id: default_agent_id(),
            timestamp: String::new(),
            cpu: 0.0,
            memory: 0.0,
            disk_io: 0.0,
            network_sent: 0.0,
            network_recv: 0.0,
            logs: Vec::new(),
        }
    }
}

/// The metric channel a univariate detector (forecast detector, batch
/// forecast) operates on. DD's multivariate path also uses CPU/Memory plus
/// disk I/O, named directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Cpu,
    Memory,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cpu => "CPU",
            Metric::Memory => "Memory",
        }
    }

    /// Static warning/critical thresholds used by future-horizon severity
    /// (§4.3 table) — CPU at 80/90, Memory at 85/95.
    pub fn static_thresholds(&self) -> (f64, f64) {
        match self {
            Metric::Cpu => (80.0, 90.0),
            Metric::Memory => (85.0, 95.0),
        }
    }
}
