//! Reduction of result records into one coarse project state.

use crate::error::{ObsError, Result};
use crate::report::ResultRecord;
use serde::{Deserialize, Serialize};

/// Status codes that mean a package is still moving through the build
/// pipeline.
pub const BUILDING_CODES: [&str; 7] = [
    "scheduled",
    "building",
    "dispatching",
    "blocked",
    "signing",
    "finished",
    "unknown",
];

/// Status codes that mean a package can no longer succeed in this run.
pub const FAILURE_CODES: [&str; 3] = ["failed", "unresolvable", "broken"];

/// Coarse project build state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildState {
    /// Every repository is published and no package failed.
    Ok,
    /// At least one package failed, is unresolvable, or is broken.
    Failed,
    /// Packages are still building or a repository is still publishing.
    Building,
}

/// Result of reducing one poll's records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateStatus {
    pub state: BuildState,

    /// Accumulated human-readable explanation; empty when `state` is
    /// [`BuildState::Ok`].
    pub reason: String,
}

impl AggregateStatus {
    /// Whether the polling loop should stop at this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, BuildState::Ok | BuildState::Failed)
    }
}

/// Reduce parsed result records into an aggregate verdict.
///
/// Three passes over the records, in order: repositories whose publish
/// state is neither `published` nor `building`, then positive counts for
/// the building codes, then positive counts for the failure codes. The
/// failure pass runs last so a failure verdict wins over building notes.
///
/// An empty record slice means the project has nothing configured and is
/// an error, not an OK verdict.
pub fn reduce(records: &[ResultRecord]) -> Result<AggregateStatus> {
    if records.is_empty() {
        return Err(ObsError::EmptyProject);
    }

    let mut state = BuildState::Ok;
    let mut reason = String::new();

    for record in records {
        if record.state != "published" && record.state != "building" {
            state = BuildState::Building;
            reason.push_str(&format!(
                "{} {} repo is publishing. ",
                record.repository, record.arch
            ));
        }
    }

    for record in records {
        for code in BUILDING_CODES {
            if let Some(&count) = record.status_counts.get(code) {
                if count > 0 {
                    state = BuildState::Building;
                    reason.push_str(&format!(
                        "{} {} has {} packages in {} state. ",
                        record.repository, record.arch, count, code
                    ));
                }
            }
        }
    }

    for record in records {
        for code in FAILURE_CODES {
            if let Some(&count) = record.status_counts.get(code) {
                if count > 0 {
                    state = BuildState::Failed;
                    reason.push_str(&format!(
                        "{} {} has {} packages in {} state. ",
                        record.repository, record.arch, count, code
                    ));
                }
            }
        }
    }

    Ok(AggregateStatus {
        state,
        reason: reason.trim_end().to_string(),
    })
}
