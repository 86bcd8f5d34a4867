//! Version total aggregation.
//!
//! Once a version holds items, [`TotalAggregator::recompute_total`] is the
//! only code path that writes `BudgetVersion::total_budget`. Before that, a
//! root version carries the provisional fiscal year sum it was created with.

use chrono::Utc;
use rust_decimal::Decimal;
use scenaria_shared::types::VersionId;
use tracing::debug;

use super::error::VersionError;
use super::repository::VersionRepository;
use super::types::{BudgetItem, BudgetVersionItem};

/// Computes and stores version totals.
pub struct TotalAggregator;

impl TotalAggregator {
    /// Sum of adjusted amounts.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::AmountOverflow` when the sum does not fit in a
    /// decimal.
    pub fn sum_items(items: &[BudgetVersionItem]) -> Result<Decimal, VersionError> {
        checked_sum(items.iter().map(|item| item.adjusted_amount))
    }

    /// Sum of a fiscal year's budgeted amounts.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::AmountOverflow` when the sum does not fit in a
    /// decimal.
    pub fn sum_budget_items(items: &[BudgetItem]) -> Result<Decimal, VersionError> {
        checked_sum(items.iter().map(|item| item.budgeted_amount))
    }

    /// Recompute and store the total of a version from its items.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::VersionNotFound` if the version does not exist,
    /// or `VersionError::AmountOverflow` when its items cannot be summed.
    pub fn recompute_total(
        repo: &mut dyn VersionRepository,
        version_id: VersionId,
    ) -> Result<Decimal, VersionError> {
        let mut version = repo
            .find_version(version_id)
            .ok_or(VersionError::VersionNotFound(version_id))?;

        let items = repo.items_for_version(version_id);
        let total = Self::sum_items(&items)?;

        debug!(
            version_id = %version_id,
            items = items.len(),
            previous = %version.total_budget,
            total = %total,
            "Version total recomputed"
        );

        version.total_budget = total;
        version.updated_at = Utc::now();
        repo.save_version(version);

        Ok(total)
    }
}

fn checked_sum(mut amounts: impl Iterator<Item = Decimal>) -> Result<Decimal, VersionError> {
    amounts
        .try_fold(Decimal::ZERO, Decimal::checked_add)
        .ok_or(VersionError::AmountOverflow("version total"))
}
