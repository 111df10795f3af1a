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

//! PulseAI Lite core: a per-agent streaming anomaly-detection engine.
//!
//! Combines a multivariate distributional detector (C2, ECOD-class), a
//! per-metric seasonal forecaster (C3, AutoARIMA-class), a peripheral
//! device failure monitor (C4), and an ensemble scorer (C5) behind one
//! entry point, [`AnomalyEngine::detect`]. [`batch::batch_forecast`] runs
//! a separate one-shot multi-horizon projection over a complete series.
//!
//! This crate does not initialize logging; see `pulseai-observability`
//! for a `tracing-subscriber` setup a host binary can call into.

pub mod batch;
pub mod buffer;
pub mod config;
pub mod detectors;
pub mod ensemble;
pub mod error;
pub mod finding;
pub mod orchestrator;
pub mod registry;
pub mod sample;

pub use batch::{batch_forecast, BatchForecastResult};
pub use config::DetectorConfig;
pub use error::{DetectorError, Result};
pub use finding::{AnomalyFinding, DetectionResult, Engine, HorizonPoint, Severity};
pub use orchestrator::AnomalyEngine;
pub use registry::AgentRegistry;
pub use sample::{LogEntry, Metric, Sample};
