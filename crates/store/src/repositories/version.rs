//! In-memory version store.
//!
//! Writers take an exclusive lock and stage their changes in a
//! [`UnitOfWork`] on top of the committed state. The staged changes are
//! applied only when the unit of work returns `Ok`, so a failed operation
//! leaves nothing behind.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use scenaria_core::version::{
    BudgetVersion, BudgetVersionItem, VersionError, VersionReader, VersionRepository,
    VersionStore,
};
use scenaria_shared::types::{BudgetItemId, FiscalYearId, VersionId, VersionItemId};
use tracing::debug;

#[derive(Debug, Default)]
struct State {
    versions: HashMap<VersionId, BudgetVersion>,
    items: HashMap<VersionItemId, BudgetVersionItem>,
    // High-water marks; never decremented on delete.
    version_numbers: HashMap<FiscalYearId, u32>,
}

impl State {
    fn apply(&mut self, changes: Changes) {
        for (id, version) in changes.versions {
            match version {
                Some(version) => self.versions.insert(id, version),
                None => self.versions.remove(&id),
            };
        }
        for (id, item) in changes.items {
            match item {
                Some(item) => self.items.insert(id, item),
                None => self.items.remove(&id),
            };
        }
        self.version_numbers.extend(changes.version_numbers);
    }
}

impl VersionReader for State {
    fn find_version(&self, id: VersionId) -> Option<BudgetVersion> {
        self.versions.get(&id).cloned()
    }

    fn versions_for_fiscal_year(&self, fiscal_year_id: FiscalYearId) -> Vec<BudgetVersion> {
        self.versions
            .values()
            .filter(|v| v.fiscal_year_id == fiscal_year_id)
            .cloned()
            .collect()
    }

    fn children_of(&self, parent_id: VersionId) -> Vec<BudgetVersion> {
        self.versions
            .values()
            .filter(|v| v.parent_version_id == Some(parent_id))
            .cloned()
            .collect()
    }

    fn find_item(&self, id: VersionItemId) -> Option<BudgetVersionItem> {
        self.items.get(&id).cloned()
    }

    fn find_item_for_budget_item(
        &self,
        version_id: VersionId,
        budget_item_id: BudgetItemId,
    ) -> Option<BudgetVersionItem> {
        self.items
            .values()
            .find(|item| item.version_id == version_id && item.budget_item_id == budget_item_id)
            .cloned()
    }

    fn items_for_version(&self, version_id: VersionId) -> Vec<BudgetVersionItem> {
        self.items
            .values()
            .filter(|item| item.version_id == version_id)
            .cloned()
            .collect()
    }
}

/// Rows written by a unit of work. `None` marks a staged delete.
#[derive(Debug, Default)]
struct Changes {
    versions: HashMap<VersionId, Option<BudgetVersion>>,
    items: HashMap<VersionItemId, Option<BudgetVersionItem>>,
    version_numbers: HashMap<FiscalYearId, u32>,
}

/// Staged changes layered over the committed state.
///
/// Starting a unit of work copies nothing. Each save or delete stages one
/// row, and reads merge the staged rows over the committed ones. Scans such
/// as [`VersionReader::items_for_version`] still walk the whole committed
/// map, as they do outside a unit of work.
struct UnitOfWork<'a> {
    base: &'a State,
    changes: Changes,
}

impl<'a> UnitOfWork<'a> {
    fn new(base: &'a State) -> Self {
        Self {
            base,
            changes: Changes::default(),
        }
    }

    fn versions(&self) -> impl Iterator<Item = &BudgetVersion> {
        self.base
            .versions
            .values()
            .filter(|v| !self.changes.versions.contains_key(&v.id))
            .chain(self.changes.versions.values().flatten())
    }

    fn items(&self) -> impl Iterator<Item = &BudgetVersionItem> {
        self.base
            .items
            .values()
            .filter(|item| !self.changes.items.contains_key(&item.id))
            .chain(self.changes.items.values().flatten())
    }

    fn version_number_mark(&self, fiscal_year_id: FiscalYearId) -> u32 {
        self.changes
            .version_numbers
            .get(&fiscal_year_id)
            .or_else(|| self.base.version_numbers.get(&fiscal_year_id))
            .copied()
            .unwrap_or_default()
    }
}

impl VersionReader for UnitOfWork<'_> {
    fn find_version(&self, id: VersionId) -> Option<BudgetVersion> {
        match self.changes.versions.get(&id) {
            Some(staged) => staged.clone(),
            None => self.base.find_version(id),
        }
    }

    fn versions_for_fiscal_year(&self, fiscal_year_id: FiscalYearId) -> Vec<BudgetVersion> {
        self.versions()
            .filter(|v| v.fiscal_year_id == fiscal_year_id)
            .cloned()
            .collect()
    }

    fn children_of(&self, parent_id: VersionId) -> Vec<BudgetVersion> {
        self.versions()
            .filter(|v| v.parent_version_id == Some(parent_id))
            .cloned()
            .collect()
    }

    fn find_item(&self, id: VersionItemId) -> Option<BudgetVersionItem> {
        match self.changes.items.get(&id) {
            Some(staged) => staged.clone(),
            None => self.base.find_item(id),
        }
    }

    fn find_item_for_budget_item(
        &self,
        version_id: VersionId,
        budget_item_id: BudgetItemId,
    ) -> Option<BudgetVersionItem> {
        self.items()
            .find(|item| item.version_id == version_id && item.budget_item_id == budget_item_id)
            .cloned()
    }

    fn items_for_version(&self, version_id: VersionId) -> Vec<BudgetVersionItem> {
        self.items()
            .filter(|item| item.version_id == version_id)
            .cloned()
            .collect()
    }
}

impl VersionRepository for UnitOfWork<'_> {
    fn save_version(&mut self, version: BudgetVersion) {
        let mark = self
            .version_number_mark(version.fiscal_year_id)
            .max(version.version_number);
        self.changes.version_numbers.insert(version.fiscal_year_id, mark);
        self.changes.versions.insert(version.id, Some(version));
    }

    fn delete_version(&mut self, id: VersionId) -> Option<BudgetVersion> {
        let existing = self.find_version(id)?;
        self.changes.versions.insert(id, None);
        Some(existing)
    }

    fn save_item(&mut self, item: BudgetVersionItem) {
        self.changes.items.insert(item.id, Some(item));
    }

    fn delete_item(&mut self, id: VersionItemId) -> Option<BudgetVersionItem> {
        let existing = self.find_item(id)?;
        self.changes.items.insert(id, None);
        Some(existing)
    }

    fn delete_items_for_version(&mut self, version_id: VersionId) -> usize {
        let doomed: Vec<VersionItemId> = self
            .items()
            .filter(|item| item.version_id == version_id)
            .map(|item| item.id)
            .collect();
        for id in &doomed {
            self.changes.items.insert(*id, None);
        }
        doomed.len()
    }

    fn next_version_number(&mut self, fiscal_year_id: FiscalYearId) -> u32 {
        let number = self.version_number_mark(fiscal_year_id) + 1;
        self.changes.version_numbers.insert(fiscal_year_id, number);
        number
    }
}

/// Thread-safe in-memory [`VersionStore`].
#[derive(Debug, Default)]
pub struct MemoryVersionStore {
    state: RwLock<State>,
}

impl MemoryVersionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored versions.
    #[must_use]
    pub fn version_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .versions
            .len()
    }

    /// Number of stored items across all versions.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .len()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> VersionError {
    VersionError::Storage("version store lock poisoned".to_string())
}

impl VersionStore for MemoryVersionStore {
    fn read<T, F>(&self, f: F) -> Result<T, VersionError>
    where
        F: FnOnce(&dyn VersionReader) -> Result<T, VersionError>,
    {
        let state = self.state.read().map_err(poisoned)?;
        f(&*state)
    }

    fn write<T, F>(&self, f: F) -> Result<T, VersionError>
    where
        F: FnOnce(&mut dyn VersionRepository) -> Result<T, VersionError>,
    {
        let mut state = self.state.write().map_err(poisoned)?;
        let mut unit = UnitOfWork::new(&state);

        match f(&mut unit) {
            Ok(value) => {
                let changes = unit.changes;
                debug!(
                    versions = changes.versions.len(),
                    items = changes.items.len(),
                    "Unit of work committed"
                );
                state.apply(changes);
                Ok(value)
            }
            Err(e) => {
                debug!(error = %e, kind = ?e.kind(), "Unit of work rolled back");
                Err(e)
            }
        }
    }
}
