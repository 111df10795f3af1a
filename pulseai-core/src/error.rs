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

//! Error taxonomy for the detection engine.
//!
//! Every detector is isolated: a `DetectorError` never reaches the
//! orchestrator's caller. `EInsufficientData` and `EModelFailure` are caught
//! locally by whichever detector produced them and folded into "no finding
//! this cycle" (see the orchestrator).

use thiserror::Error;

/// Errors a single detector invocation can fail with.
///
/// Both variants are recovered locally by the caller; neither propagates
/// out of [`crate::orchestrator::AnomalyEngine::detect`].
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("{detector}: insufficient data (have {have}, need {need})")]
    InsufficientData {
        detector: &'static str,
        have: usize,
        need: usize,
    },

    #[error("{detector}: model failure: {reason}")]
    ModelFailure {
        detector: &'static str,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, DetectorError>;
