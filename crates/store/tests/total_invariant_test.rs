//! Property-based tests for version totals under arbitrary item mutations.

mod common;

use proptest::prelude::*;
use rust_decimal::Decimal;
use scenaria_core::version::{
    AddVersionItemInput, AdjustmentType, UpdateVersionItemInput, VersionError,
};
use scenaria_shared::types::BudgetItemId;

use common::{add_line, fixture};

#[derive(Debug, Clone)]
enum Op {
    Add { line: usize, absolute: bool, value: i64 },
    Update { line: usize, absolute: Option<bool>, value: Option<i64> },
    Delete { line: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..4, any::<bool>(), -100i64..200)
            .prop_map(|(line, absolute, value)| Op::Add { line, absolute, value }),
        (0usize..4, proptest::option::of(any::<bool>()), proptest::option::of(-100i64..200))
            .prop_map(|(line, absolute, value)| Op::Update { line, absolute, value }),
        (0usize..4).prop_map(|line| Op::Delete { line }),
    ]
}

fn adjustment_type(absolute: bool) -> AdjustmentType {
    if absolute {
        AdjustmentType::Absolute
    } else {
        AdjustmentType::Percentage
    }
}

proptest! {
    /// After every successful or rejected mutation the stored total equals
    /// the sum of the version's items.
    #[test]
    fn test_total_tracks_items(ops in prop::collection::vec(op_strategy(), 1..24)) {
        let f = fixture();
        let extra: Vec<BudgetItemId> = [dec(3000), dec(45)]
            .into_iter()
            .enumerate()
            .map(|(n, amount)| {
                add_line(f.service.catalog(), f.fiscal_year_id, &format!("Extra {n}"), amount)
            })
            .collect();
        let lines = [f.revenue, f.expense, extra[0], extra[1]];
        let version = f.create("Plan");
        let mut touched = false;

        for op in ops {
            let result = match op {
                Op::Add { line, absolute, value } => f
                    .service
                    .add_version_item(
                        version,
                        AddVersionItemInput {
                            budget_item_id: lines[line],
                            adjustment_type: adjustment_type(absolute),
                            adjustment_value: Decimal::from(value),
                            notes: None,
                            original_amount: None,
                        },
                    )
                    .map(|_| ()),
                Op::Update { line, absolute, value } => {
                    match find_item(&f, version, lines[line]) {
                        Some(item_id) => f
                            .service
                            .update_version_item(
                                item_id,
                                UpdateVersionItemInput {
                                    adjustment_type: absolute.map(adjustment_type),
                                    adjustment_value: value.map(Decimal::from),
                                    notes: None,
                                },
                            )
                            .map(|_| ()),
                        None => continue,
                    }
                }
                Op::Delete { line } => match find_item(&f, version, lines[line]) {
                    Some(item_id) => f.service.delete_version_item(item_id),
                    None => continue,
                },
            };

            match result {
                Ok(()) => touched = true,
                Err(VersionError::DuplicateItem { .. }) => {}
                Err(e) => prop_assert!(false, "unexpected error: {e}"),
            }

            if touched {
                f.assert_total_consistent(version);
            }
            let items = f.service.get_version_items(version).unwrap();
            prop_assert!(items.iter().all(|item| item.adjusted_amount >= Decimal::ZERO));
        }
    }
}

fn dec(amount: i64) -> Decimal {
    Decimal::from(amount)
}

fn find_item(
    f: &common::Fixture,
    version: scenaria_shared::types::VersionId,
    budget_item_id: BudgetItemId,
) -> Option<scenaria_shared::types::VersionItemId> {
    f.service
        .get_version_items(version)
        .unwrap()
        .into_iter()
        .find(|item| item.budget_item_id == budget_item_id)
        .map(|item| item.id)
}
