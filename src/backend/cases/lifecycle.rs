/**
 * Case Lifecycle
 *
 * PENDING → IN_PROGRESS → AWAITING_CLIENT → RESOLVED → CLOSED
 *
 * Two policies are available through `CASE_STATUS_POLICY`:
 *
 * - `open` (default): any enumerated status may be set. Moves the strict
 *   table would refuse are accepted and logged.
 * - `strict`: only the moves in `allowed_targets` are accepted; the rest
 *   answer 409. Setting the current status again is always accepted.
 */

use crate::backend::error::BackendError;
use crate::shared::{CaseStatus, SharedError};
use std::fmt;
use std::str::FromStr;

/// How status changes are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    #[default]
    Open,
    Strict,
}

impl FromStr for StatusPolicy {
    type Err = SharedError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(StatusPolicy::Open),
            "strict" => Ok(StatusPolicy::Strict),
            other => Err(SharedError::validation(
                "case_status_policy",
                format!("'{}' is not one of open, strict", other),
            )),
        }
    }
}

impl fmt::Display for StatusPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusPolicy::Open => f.write_str("open"),
            StatusPolicy::Strict => f.write_str("strict"),
        }
    }
}

/// Statuses reachable from `from` under the strict table
pub fn allowed_targets(from: CaseStatus) -> &'static [CaseStatus] {
    use CaseStatus::*;
    match from {
        Pending => &[InProgress, AwaitingClient, Resolved, Closed],
        InProgress => &[AwaitingClient, Resolved, Closed],
        AwaitingClient => &[InProgress, Resolved, Closed],
        Resolved => &[InProgress, Closed],
        Closed => &[],
    }
}

/// Would the strict table accept this move?
pub fn is_strict_transition(from: CaseStatus, to: CaseStatus) -> bool {
    from == to || allowed_targets(from).contains(&to)
}

impl StatusPolicy {
    /// Check a status change for case `case_id`
    ///
    /// # Errors
    ///
    /// `Conflict` when the policy is strict and the move is not in the
    /// table.
    pub fn check(self, case_id: i64, from: CaseStatus, to: CaseStatus) -> Result<(), BackendError> {
        if is_strict_transition(from, to) {
            return Ok(());
        }
        match self {
            StatusPolicy::Open => {
                tracing::warn!("Case {} moved {} → {} outside the usual lifecycle", case_id, from, to);
                Ok(())
            }
            StatusPolicy::Strict => {
                tracing::warn!("Refused case {} transition {} → {}", case_id, from, to);
                Err(BackendError::conflict(format!("Cannot move a case from {} to {}", from, to)))
            }
        }
    }
}
