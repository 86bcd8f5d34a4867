//! Storage seams for the version engine.
//!
//! The engine never talks to a database directly. Versions and their items
//! are read and written through [`VersionStore`], which hands out a
//! [`VersionReader`] for snapshot reads and a [`VersionRepository`] for
//! atomic units of work. External entities owned by the surrounding
//! application are looked up through [`ReferenceCatalog`].

use scenaria_shared::types::{
    BudgetItemId, CostCenterId, FiscalYearId, VersionId, VersionItemId,
};

use super::error::VersionError;
use super::types::{BudgetItem, BudgetVersion, BudgetVersionItem, CostCenter, FiscalYear};

/// Read access to versions and items.
pub trait VersionReader {
    /// Looks up a version by id.
    fn find_version(&self, id: VersionId) -> Option<BudgetVersion>;

    /// All versions of a fiscal year, in no particular order.
    fn versions_for_fiscal_year(&self, fiscal_year_id: FiscalYearId) -> Vec<BudgetVersion>;

    /// Versions whose parent is `parent_id`.
    fn children_of(&self, parent_id: VersionId) -> Vec<BudgetVersion>;

    /// Looks up an item by id.
    fn find_item(&self, id: VersionItemId) -> Option<BudgetVersionItem>;

    /// Looks up the item a version holds for a budget line.
    fn find_item_for_budget_item(
        &self,
        version_id: VersionId,
        budget_item_id: BudgetItemId,
    ) -> Option<BudgetVersionItem>;

    /// All items owned by a version, in no particular order.
    fn items_for_version(&self, version_id: VersionId) -> Vec<BudgetVersionItem>;
}

/// Write access used inside a unit of work.
pub trait VersionRepository: VersionReader {
    /// Inserts or replaces a version.
    fn save_version(&mut self, version: BudgetVersion);

    /// Removes a version, returning it if it existed. Items are not touched.
    fn delete_version(&mut self, id: VersionId) -> Option<BudgetVersion>;

    /// Inserts or replaces an item.
    fn save_item(&mut self, item: BudgetVersionItem);

    /// Removes an item, returning it if it existed.
    fn delete_item(&mut self, id: VersionItemId) -> Option<BudgetVersionItem>;

    /// Removes every item owned by a version, returning how many were removed.
    fn delete_items_for_version(&mut self, version_id: VersionId) -> usize;

    /// Reserves the next version number of a fiscal year.
    ///
    /// Numbers start at 1, strictly increase, and are never handed out twice,
    /// even after the version holding the highest number is deleted.
    fn next_version_number(&mut self, fiscal_year_id: FiscalYearId) -> u32;
}

/// Transactional access to version storage.
pub trait VersionStore {
    /// Runs `f` against a consistent snapshot.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or `VersionError::Storage` if the snapshot
    /// cannot be taken.
    fn read<T, F>(&self, f: F) -> Result<T, VersionError>
    where
        F: FnOnce(&dyn VersionReader) -> Result<T, VersionError>;

    /// Runs `f` as one atomic unit of work.
    ///
    /// Writers are serialized. When `f` returns `Err`, none of its writes
    /// become visible.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or `VersionError::Storage` if the unit of
    /// work cannot be started or committed.
    fn write<T, F>(&self, f: F) -> Result<T, VersionError>
    where
        F: FnOnce(&mut dyn VersionRepository) -> Result<T, VersionError>;
}

/// Read-only lookup of entities owned by the surrounding application.
pub trait ReferenceCatalog {
    /// Looks up a fiscal year.
    fn fiscal_year(&self, id: FiscalYearId) -> Option<FiscalYear>;

    /// Looks up a budget line.
    fn budget_item(&self, id: BudgetItemId) -> Option<BudgetItem>;

    /// All budget lines of a fiscal year.
    fn budget_items(&self, fiscal_year_id: FiscalYearId) -> Vec<BudgetItem>;

    /// Looks up a cost center.
    fn cost_center(&self, id: CostCenterId) -> Option<CostCenter>;
}
