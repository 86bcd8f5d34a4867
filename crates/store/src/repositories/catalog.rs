//! In-memory reference catalog.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use scenaria_core::version::{BudgetItem, CostCenter, FiscalYear, ReferenceCatalog};
use scenaria_shared::types::{BudgetItemId, CostCenterId, FiscalYearId};

#[derive(Debug, Default)]
struct Entries {
    fiscal_years: HashMap<FiscalYearId, FiscalYear>,
    // Insertion order is kept so derived versions list lines predictably.
    budget_items: Vec<BudgetItem>,
    cost_centers: HashMap<CostCenterId, CostCenter>,
}

/// Fiscal years, budget lines and cost centers held in memory.
///
/// Entries only replace or append whole values, so a poisoned lock still
/// guards consistent data and is recovered from.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    entries: RwLock<Entries>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a fiscal year.
    pub fn insert_fiscal_year(&self, fiscal_year: FiscalYear) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fiscal_years
            .insert(fiscal_year.id, fiscal_year);
    }

    /// Inserts or replaces a budget line.
    pub fn insert_budget_item(&self, item: BudgetItem) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.budget_items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => entries.budget_items.push(item),
        }
    }

    /// Inserts or replaces a cost center.
    pub fn insert_cost_center(&self, cost_center: CostCenter) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .cost_centers
            .insert(cost_center.id, cost_center);
    }
}

impl ReferenceCatalog for InMemoryCatalog {
    fn fiscal_year(&self, id: FiscalYearId) -> Option<FiscalYear> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .fiscal_years
            .get(&id)
            .cloned()
    }

    fn budget_item(&self, id: BudgetItemId) -> Option<BudgetItem> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .budget_items
            .iter()
            .find(|item| item.id == id)
            .cloned()
    }

    fn budget_items(&self, fiscal_year_id: FiscalYearId) -> Vec<BudgetItem> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .budget_items
            .iter()
            .filter(|item| item.fiscal_year_id == fiscal_year_id)
            .cloned()
            .collect()
    }

    fn cost_center(&self, id: CostCenterId) -> Option<CostCenter> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cost_centers
            .get(&id)
            .cloned()
    }
}
