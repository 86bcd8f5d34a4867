//! Version lifecycle rules.
//!
//! Pure transition checks; the service applies the resulting status.

use super::error::VersionError;
use super::types::{BudgetVersion, VersionStatus};

/// Stateless rules for version status transitions.
pub struct LifecycleRules;

impl LifecycleRules {
    /// Check that a version may be created with `status`.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::InvalidInitialStatus` unless the status is draft
    /// or simulation.
    pub fn ensure_creatable(status: VersionStatus) -> Result<(), VersionError> {
        if status.is_initial() {
            Ok(())
        } else {
            Err(VersionError::InvalidInitialStatus(status))
        }
    }

    /// Approve a draft or simulation version.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::InvalidTransition` from any other status.
    pub fn approve(current: VersionStatus) -> Result<VersionStatus, VersionError> {
        Self::transition(current, VersionStatus::Approved)
    }

    /// Activate an approved version.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::InvalidTransition` from any other status.
    pub fn activate(current: VersionStatus) -> Result<VersionStatus, VersionError> {
        Self::transition(current, VersionStatus::Active)
    }

    /// Archive an active version that is being superseded.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::InvalidTransition` from any other status.
    pub fn archive(current: VersionStatus) -> Result<VersionStatus, VersionError> {
        Self::transition(current, VersionStatus::Archived)
    }

    /// Check that a version may be deleted.
    ///
    /// # Errors
    ///
    /// - `VersionError::BaselineProtected` for the baseline
    /// - `VersionError::ActiveProtected` for the active version
    /// - `VersionError::NotDeletable` for approved or archived versions
    pub fn ensure_deletable(version: &BudgetVersion) -> Result<(), VersionError> {
        if version.is_baseline {
            return Err(VersionError::BaselineProtected(version.id));
        }

        match version.status {
            VersionStatus::Draft | VersionStatus::Simulation => Ok(()),
            VersionStatus::Active => Err(VersionError::ActiveProtected(version.id)),
            status @ (VersionStatus::Approved | VersionStatus::Archived) => {
                Err(VersionError::NotDeletable(status))
            }
        }
    }

    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Draft → Approved
    /// - Simulation → Approved
    /// - Approved → Active
    /// - Active → Archived
    #[must_use]
    pub fn is_valid_transition(from: VersionStatus, to: VersionStatus) -> bool {
        matches!(
            (from, to),
            (
                VersionStatus::Draft | VersionStatus::Simulation,
                VersionStatus::Approved
            ) | (VersionStatus::Approved, VersionStatus::Active)
                | (VersionStatus::Active, VersionStatus::Archived)
        )
    }

    fn transition(from: VersionStatus, to: VersionStatus) -> Result<VersionStatus, VersionError> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(VersionError::InvalidTransition { from, to })
        }
    }
}
