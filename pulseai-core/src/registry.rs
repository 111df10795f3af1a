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

//! Explicit, injectable per-agent state registry.
//!
//! The source keeps several process-global dictionaries keyed by
//! `agent_id` (buffers, peripheral states, model caches, score history all
//! live in separate hidden maps on the detector instance). Here every
//! per-agent compartment is collected into one [`AgentState`], and the
//! registry is a plain value the host constructs and owns — no hidden
//! globals. [`dashmap::DashMap`] gives per-key (sharded) locking, so
//! concurrent `detect()` calls for different agents proceed independently
//! while two calls racing for the *same* agent are serialized, matching the
//! concurrency model in the spec.

use crate::config::DetectorConfig;
use crate::detectors::distributional::DdModelCache;
use crate::detectors::forecast::FdModelCache;
use crate::detectors::peripheral::PeripheralState;
use crate::buffer::RollingBuffer;
use crate::sample::Metric;
use dashmap::DashMap;
use std::collections::HashMap;

/// Everything the engine tracks for one agent: its rolling window, its
/// peripheral state machine, and both detectors' model caches.
pub struct AgentState {
    pub buffer: RollingBuffer,
    pub peripheral: PeripheralState,
    pub dd_cache: DdModelCache,
    pub fd_caches: HashMap<Metric, FdModelCache>,
}

impl AgentState {
    fn new(config: &DetectorConfig) -> Self {
        Self {
            buffer: RollingBuffer::new(config.window_size),
            peripheral: PeripheralState::default(),
            dd_cache: DdModelCache::new(config.score_history_len),
            fd_caches: HashMap::new(),
        }
    }
}

/// Process-wide registry of per-agent compartments, keyed by `agent_id`.
/// Lives for the process lifetime; agents are created lazily on first
/// sample and are never evicted (eviction of idle agents is a permitted
/// extension, not implemented here).
pub struct AgentRegistry {
    agents: DashMap<String, AgentState>,
    config: DetectorConfig,
}

impl AgentRegistry {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            agents: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Run `f` against the named agent's state, creating it first if this
    /// is the agent's first sample.
    pub fn with_agent<R>(&self, agent_id: &str, f: impl FnOnce(&mut AgentState) -> R) -> R {
        let mut entry = self
            .agents
            .entry(agent_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(agent_id, "creating new agent compartment");
                AgentState::new(&self.config)
            });
        f(&mut entry)
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}
