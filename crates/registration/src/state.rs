//! Saga checkpoint state machine.
//!
//! Checkpoints live only for the duration of a single saga run; they are
//! never persisted. They exist to give spans and log events a precise
//! notion of how far the saga progressed.

use serde::{Deserialize, Serialize};

/// Checkpoints within a single registration saga run.
///
/// ```text
/// Start ──► Validated ──► UniquenessChecked ──► IdentityCreated
///       ──► ProfileCreated ──► Committed
/// ```
///
/// The two best-effort steps (address enrichment, billing) run between
/// `IdentityCreated` and `ProfileCreated` and do not have checkpoints of
/// their own since their failure never changes the saga's course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaPhase {
    /// Saga has not performed any work yet.
    #[default]
    Start,

    /// Inputs normalized and all mandatory fields verified non-empty.
    Validated,

    /// Email and tax id confirmed unused by any non-deleted profile.
    UniquenessChecked,

    /// The external identity exists; from here on, failure requires
    /// compensation.
    IdentityCreated,

    /// All mandatory rows inserted.
    ProfileCreated,

    /// Saga finished successfully (terminal).
    Committed,
}

impl SagaPhase {
    /// Returns true if a failure at this checkpoint requires unwinding
    /// previously committed steps.
    pub fn requires_compensation(&self) -> bool {
        matches!(self, SagaPhase::IdentityCreated | SagaPhase::ProfileCreated)
    }

    /// Returns true if this is the terminal success checkpoint.
    pub fn is_committed(&self) -> bool {
        matches!(self, SagaPhase::Committed)
    }

    /// Returns the checkpoint name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaPhase::Start => "Start",
            SagaPhase::Validated => "Validated",
            SagaPhase::UniquenessChecked => "UniquenessChecked",
            SagaPhase::IdentityCreated => "IdentityCreated",
            SagaPhase::ProfileCreated => "ProfileCreated",
            SagaPhase::Committed => "Committed",
        }
    }
}

impl std::fmt::Display for SagaPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
