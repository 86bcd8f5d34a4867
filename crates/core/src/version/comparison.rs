//! Version comparison.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use scenaria_shared::types::BudgetItemId;

use super::aggregate::TotalAggregator;
use super::error::VersionError;
use super::types::{BudgetVersion, BudgetVersionItem, ItemComparison, VersionComparison};

/// Computes line-by-line diffs between versions.
pub struct ComparisonEngine;

impl ComparisonEngine {
    /// Compare version A against version B.
    ///
    /// Covers the union of both versions' budget lines; a line missing from
    /// one side counts as zero there. Totals are the sums of each version's
    /// own items. Items are ordered by budget item id.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::AmountOverflow` when a difference or total does
    /// not fit in a decimal.
    pub fn compare(
        version_a: &BudgetVersion,
        items_a: &[BudgetVersionItem],
        version_b: &BudgetVersion,
        items_b: &[BudgetVersionItem],
    ) -> Result<VersionComparison, VersionError> {
        let amounts_a = Self::amounts_by_line(items_a);
        let amounts_b = Self::amounts_by_line(items_b);

        let lines: BTreeSet<BudgetItemId> =
            amounts_a.keys().chain(amounts_b.keys()).copied().collect();

        let items = lines
            .into_iter()
            .map(|budget_item_id| {
                let amount_a = amounts_a.get(&budget_item_id).copied().unwrap_or_default();
                let amount_b = amounts_b.get(&budget_item_id).copied().unwrap_or_default();
                Ok(ItemComparison {
                    budget_item_id,
                    amount_a,
                    amount_b,
                    difference: Self::difference(amount_a, amount_b)?,
                    percentage_difference: Self::percentage_difference(amount_a, amount_b)?,
                })
            })
            .collect::<Result<Vec<_>, VersionError>>()?;

        let total_a = TotalAggregator::sum_items(items_a)?;
        let total_b = TotalAggregator::sum_items(items_b)?;

        Ok(VersionComparison {
            version_a: version_a.id,
            version_b: version_b.id,
            items,
            total_a,
            total_b,
            total_difference: Self::difference(total_a, total_b)?,
            total_percentage_difference: Self::percentage_difference(total_a, total_b)?,
        })
    }

    /// Percentage change from `a` to `b`.
    ///
    /// With a zero base: 100 when `b` is positive (growth from nothing),
    /// otherwise 0.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::AmountOverflow` when the change is too large to
    /// represent, e.g. a tiny base against a huge amount.
    pub fn percentage_difference(a: Decimal, b: Decimal) -> Result<Decimal, VersionError> {
        if a > Decimal::ZERO {
            Self::difference(a, b)?
                .checked_div(a)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .ok_or(VersionError::AmountOverflow("percentage difference"))
        } else if b > Decimal::ZERO {
            Ok(Decimal::ONE_HUNDRED)
        } else {
            Ok(Decimal::ZERO)
        }
    }

    fn difference(a: Decimal, b: Decimal) -> Result<Decimal, VersionError> {
        b.checked_sub(a)
            .ok_or(VersionError::AmountOverflow("difference"))
    }

    fn amounts_by_line(items: &[BudgetVersionItem]) -> BTreeMap<BudgetItemId, Decimal> {
        items
            .iter()
            .map(|item| (item.budget_item_id, item.adjusted_amount))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::types::{AdjustmentType, VersionMetadata, VersionStatus};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use scenaria_shared::types::{
        CompanyId, FiscalYearId, UserId, VersionId, VersionItemId,
    };

    fn version() -> BudgetVersion {
        BudgetVersion {
            id: VersionId::new(),
            name: "Plan".to_string(),
            description: None,
            fiscal_year_id: FiscalYearId::new(),
            cost_center_id: None,
            version_number: 1,
            status: VersionStatus::Draft,
            is_baseline: false,
            parent_version_id: None,
            total_budget: Decimal::ZERO,
            metadata: VersionMetadata::default(),
            company_id: CompanyId::new(),
            created_by: UserId::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn item(version: &BudgetVersion, line: BudgetItemId, amount: Decimal) -> BudgetVersionItem {
        BudgetVersionItem {
            id: VersionItemId::new(),
            version_id: version.id,
            budget_item_id: line,
            original_amount: amount,
            adjusted_amount: amount,
            adjustment_type: AdjustmentType::Absolute,
            adjustment_value: Decimal::ZERO,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_parent_child_scenario() {
        let (parent, child) = (version(), version());
        let (revenue, expense) = (BudgetItemId::new(), BudgetItemId::new());

        let parent_items = vec![
            item(&parent, revenue, dec!(500000)),
            item(&parent, expense, dec!(120000)),
        ];
        let child_items = vec![
            item(&child, revenue, dec!(450000)),
            item(&child, expense, dec!(108000)),
        ];

        let result =
            ComparisonEngine::compare(&parent, &parent_items, &child, &child_items).unwrap();

        assert_eq!(result.total_a, dec!(620000));
        assert_eq!(result.total_b, dec!(558000));
        assert_eq!(result.total_difference, dec!(-62000));
        assert_eq!(result.total_percentage_difference, dec!(-10));
        assert_eq!(result.items.len(), 2);
        assert!(result.items.iter().all(|line| line.percentage_difference == dec!(-10)));
    }

    #[test]
    fn test_one_sided_lines_use_zero_base() {
        let (a, b) = (version(), version());
        let (only_a, only_b) = (BudgetItemId::new(), BudgetItemId::new());

        let result = ComparisonEngine::compare(
            &a,
            &[item(&a, only_a, dec!(300))],
            &b,
            &[item(&b, only_b, dec!(200))],
        )
        .unwrap();

        let removed = result.items.iter().find(|l| l.budget_item_id == only_a).unwrap();
        assert_eq!(removed.amount_b, Decimal::ZERO);
        assert_eq!(removed.difference, dec!(-300));
        assert_eq!(removed.percentage_difference, dec!(-100));

        let added = result.items.iter().find(|l| l.budget_item_id == only_b).unwrap();
        assert_eq!(added.amount_a, Decimal::ZERO);
        assert_eq!(added.difference, dec!(200));
        assert_eq!(added.percentage_difference, dec!(100));
    }

    #[test]
    fn test_zero_on_both_sides() {
        let (a, b) = (version(), version());
        let line = BudgetItemId::new();

        let result = ComparisonEngine::compare(
            &a,
            &[item(&a, line, Decimal::ZERO)],
            &b,
            &[item(&b, line, Decimal::ZERO)],
        )
        .unwrap();

        assert_eq!(result.items[0].percentage_difference, Decimal::ZERO);
        assert_eq!(result.total_percentage_difference, Decimal::ZERO);
    }

    #[test]
    fn test_empty_versions() {
        let (a, b) = (version(), version());
        let result = ComparisonEngine::compare(&a, &[], &b, &[]).unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.total_difference, Decimal::ZERO);
        assert_eq!(result.version_a, a.id);
        assert_eq!(result.version_b, b.id);
    }

    #[test]
    fn test_tiny_base_against_huge_amount_overflows() {
        let (a, b) = (version(), version());
        let line = BudgetItemId::new();

        let result = ComparisonEngine::compare(
            &a,
            &[item(&a, line, dec!(0.01))],
            &b,
            &[item(&b, line, Decimal::MAX)],
        );

        assert!(matches!(result, Err(VersionError::AmountOverflow(_))));
    }
}
