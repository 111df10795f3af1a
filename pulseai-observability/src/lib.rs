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

//! Structured logging setup for hosts embedding `pulseai-core`.
//!
//! `pulseai-core` only emits `tracing` events; it never installs a
//! subscriber. This crate is the optional integration point a hosting
//! binary reaches for to get a sensible default (env-filtered, optionally
//! JSON-formatted output) without every host reimplementing it.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Subscriber setup knobs. `RUST_LOG` (or [`TracingConfig::default_filter`]
/// when unset) controls verbosity; `json` switches the formatter from
/// human-readable to newline-delimited JSON for log aggregation.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Filter directive used when `RUST_LOG` is not set in the environment.
    pub default_filter: String,
    /// Emit newline-delimited JSON instead of the human-readable formatter.
    pub json: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_filter: "pulseai_core=info".to_string(),
            json: false,
        }
    }
}

/// Install a global `tracing` subscriber built from `config`. Intended to
/// be called once near process start; panics if a subscriber is already
/// installed (mirrors the teacher's `.init()` usage, which has the same
/// behavior).
pub fn init_tracing(config: TracingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_filter.clone()));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::debug!(json = config.json, "tracing initialized");
}
