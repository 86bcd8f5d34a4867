//! Version derivation.
//!
//! A derived version copies its parent's items. Each parent item's adjusted
//! amount becomes the child's original amount, so every generation builds on
//! the previous one. When the parent has no materialized items, the fiscal
//! year's budget lines are used instead.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use scenaria_shared::types::{BudgetItemId, VersionId, VersionItemId};

use super::adjustment::AdjustmentCalculator;
use super::error::VersionError;
use super::repository::{ReferenceCatalog, VersionRepository};
use super::types::{AdjustmentType, BudgetItem, BudgetVersionItem};

/// Builds item sets for derived versions.
pub struct DerivationEngine;

impl DerivationEngine {
    /// Derive and store the items of `new_version_id` from `source_version_id`.
    ///
    /// `new_version_id` must not own any items yet. The caller is responsible
    /// for recomputing the new version's total afterwards.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::VersionNotFound` if the source does not exist,
    /// or `VersionError::PercentageBelowFloor` if the factor is negative.
    pub fn derive_items(
        repo: &mut dyn VersionRepository,
        catalog: &dyn ReferenceCatalog,
        new_version_id: VersionId,
        source_version_id: VersionId,
        adjustment_factor: Decimal,
    ) -> Result<Vec<BudgetVersionItem>, VersionError> {
        let source = repo
            .find_version(source_version_id)
            .ok_or(VersionError::VersionNotFound(source_version_id))?;

        let source_items = repo.items_for_version(source_version_id);
        let items = if source_items.is_empty() {
            let lines = catalog.budget_items(source.fiscal_year_id);
            Self::from_budget_items(new_version_id, &lines, adjustment_factor, Utc::now())?
        } else {
            Self::from_version_items(new_version_id, &source_items, adjustment_factor, Utc::now())?
        };

        for item in &items {
            repo.save_item(item.clone());
        }

        Ok(items)
    }

    /// Build items chained from a parent's items.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::PercentageBelowFloor` if the factor is negative.
    pub fn from_version_items(
        new_version_id: VersionId,
        source: &[BudgetVersionItem],
        adjustment_factor: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Vec<BudgetVersionItem>, VersionError> {
        let lines = source
            .iter()
            .map(|item| (item.budget_item_id, item.adjusted_amount));
        Self::build(new_version_id, lines, adjustment_factor, now)
    }

    /// Build items from a fiscal year's budget lines.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::PercentageBelowFloor` if the factor is negative.
    pub fn from_budget_items(
        new_version_id: VersionId,
        lines: &[BudgetItem],
        adjustment_factor: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Vec<BudgetVersionItem>, VersionError> {
        let lines = lines.iter().map(|line| (line.id, line.budgeted_amount));
        Self::build(new_version_id, lines, adjustment_factor, now)
    }

    fn build(
        new_version_id: VersionId,
        lines: impl Iterator<Item = (BudgetItemId, Decimal)>,
        adjustment_factor: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Vec<BudgetVersionItem>, VersionError> {
        let adjustment_value = AdjustmentCalculator::factor_to_percentage(adjustment_factor)?;
        AdjustmentCalculator::validate(AdjustmentType::Percentage, adjustment_value)?;

        // First occurrence of a budget line wins.
        let mut seen = HashSet::new();
        let mut items = Vec::new();

        for (budget_item_id, original_amount) in lines {
            if !seen.insert(budget_item_id) {
                continue;
            }

            let adjusted_amount = AdjustmentCalculator::compute_adjusted_amount(
                original_amount,
                AdjustmentType::Percentage,
                adjustment_value,
            )?;

            items.push(BudgetVersionItem {
                id: VersionItemId::new(),
                version_id: new_version_id,
                budget_item_id,
                original_amount,
                adjusted_amount,
                adjustment_type: AdjustmentType::Percentage,
                adjustment_value,
                notes: None,
                created_at: now,
                updated_at: now,
            });
        }

        Ok(items)
    }
}
