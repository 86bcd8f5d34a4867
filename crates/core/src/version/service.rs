//! Budget version service.
//!
//! Orchestrates creation, update, deletion, lifecycle transitions and item
//! mutations. Every mutating operation runs as a single
//! [`VersionStore::write`] unit of work, so a failure at any step leaves no
//! partial effects behind.

use std::collections::HashSet;

use chrono::Utc;
use rust_decimal::Decimal;
use scenaria_shared::EngineConfig;
use scenaria_shared::types::{CompanyId, CostCenterId, FiscalYearId, VersionId, VersionItemId};
use tracing::{debug, info, warn};

use super::adjustment::{AdjustmentCalculator, PERCENTAGE_FLOOR};
use super::aggregate::TotalAggregator;
use super::comparison::ComparisonEngine;
use super::derivation::DerivationEngine;
use super::error::VersionError;
use super::lifecycle::LifecycleRules;
use super::repository::{ReferenceCatalog, VersionReader, VersionStore};
use super::types::{
    AddVersionItemInput, AdjustmentType, BudgetVersion, BudgetVersionItem, CreateVersionInput,
    UpdateVersionInput, UpdateVersionItemInput, VersionComparison, VersionMetadata,
    VersionStatus,
};

/// Budget version lifecycle manager.
pub struct VersionService<S, C> {
    store: S,
    catalog: C,
    config: EngineConfig,
}

impl<S, C> VersionService<S, C>
where
    S: VersionStore,
    C: ReferenceCatalog,
{
    /// Creates a new version service.
    #[must_use]
    pub fn new(store: S, catalog: C, config: EngineConfig) -> Self {
        Self {
            store,
            catalog,
            config,
        }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the reference catalog.
    #[must_use]
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    // ========================================================================
    // Version operations
    // ========================================================================

    /// Creates a new budget version.
    ///
    /// Root versions start from the fiscal year's budget lines as their total.
    /// Versions with a parent get the parent's items, scaled by the metadata's
    /// adjustment factor, and a total recomputed from those items.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The status is not draft or simulation
    /// - The fiscal year, cost center or parent does not exist
    /// - A baseline already exists for the company and fiscal year
    /// - The parent belongs to another fiscal year or company
    /// - The metadata exceeds the configured bounds
    pub fn create_version(&self, input: CreateVersionInput) -> Result<BudgetVersion, VersionError> {
        LifecycleRules::ensure_creatable(input.status)?;
        Self::validate_name(&input.name)?;
        self.validate_metadata(&input.metadata)?;

        let fiscal_year = self
            .catalog
            .fiscal_year(input.fiscal_year_id)
            .ok_or(VersionError::FiscalYearNotFound(input.fiscal_year_id))?;
        if fiscal_year.company_id != input.company_id {
            return Err(VersionError::CompanyMismatch {
                expected: input.company_id,
                got: fiscal_year.company_id,
            });
        }
        if let Some(cost_center_id) = input.cost_center_id {
            self.ensure_cost_center(input.company_id, cost_center_id)?;
        }

        let catalog: &dyn ReferenceCatalog = &self.catalog;

        let version = self.store.write(|repo| {
            if input.is_baseline {
                Self::ensure_baseline_available(
                    &*repo,
                    input.company_id,
                    input.fiscal_year_id,
                    None,
                )?;
            }

            let parent = match input.parent_version_id {
                Some(parent_id) => Some(self.resolve_parent(&*repo, parent_id, &input)?),
                None => None,
            };

            let version_number = repo.next_version_number(input.fiscal_year_id);
            if repo
                .versions_for_fiscal_year(input.fiscal_year_id)
                .iter()
                .any(|v| v.version_number == version_number)
            {
                return Err(VersionError::DuplicateVersionNumber {
                    fiscal_year_id: input.fiscal_year_id,
                    version_number,
                });
            }

            // Provisional for roots until the first item mutation recomputes it.
            let total_budget = match parent {
                Some(_) => Decimal::ZERO,
                None => TotalAggregator::sum_budget_items(
                    &catalog.budget_items(input.fiscal_year_id),
                )?,
            };

            let now = Utc::now();
            let version = BudgetVersion {
                id: VersionId::new(),
                name: input.name.clone(),
                description: input.description.clone(),
                fiscal_year_id: input.fiscal_year_id,
                cost_center_id: input.cost_center_id,
                version_number,
                status: input.status,
                is_baseline: input.is_baseline,
                parent_version_id: input.parent_version_id,
                total_budget,
                metadata: input.metadata.clone(),
                company_id: input.company_id,
                created_by: input.created_by,
                created_at: now,
                updated_at: now,
            };
            let version_id = version.id;
            repo.save_version(version);

            if let Some(parent) = parent {
                let items = DerivationEngine::derive_items(
                    repo,
                    catalog,
                    version_id,
                    parent.id,
                    input.metadata.adjustment_factor,
                )?;
                debug!(
                    version_id = %version_id,
                    parent_version_id = %parent.id,
                    items = items.len(),
                    "Derived version items"
                );
                TotalAggregator::recompute_total(repo, version_id)?;
            }

            repo.find_version(version_id)
                .ok_or(VersionError::VersionNotFound(version_id))
        })?;

        info!(
            version_id = %version.id,
            fiscal_year_id = %version.fiscal_year_id,
            version_number = version.version_number,
            status = %version.status,
            is_baseline = version.is_baseline,
            total_budget = %version.total_budget,
            "Budget version created"
        );

        Ok(version)
    }

    /// Updates a budget version's descriptive fields, scope and baseline flag.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The version or cost center does not exist
    /// - Promoting to baseline collides with an existing baseline
    /// - The update tries to clear the baseline flag
    pub fn update_version(
        &self,
        id: VersionId,
        input: UpdateVersionInput,
    ) -> Result<BudgetVersion, VersionError> {
        if let Some(name) = &input.name {
            Self::validate_name(name)?;
        }
        if let Some(metadata) = &input.metadata {
            self.validate_metadata(metadata)?;
        }

        let version = self.store.write(|repo| {
            let mut version = repo
                .find_version(id)
                .ok_or(VersionError::VersionNotFound(id))?;

            match input.is_baseline {
                Some(true) if !version.is_baseline => {
                    Self::ensure_baseline_available(
                        &*repo,
                        version.company_id,
                        version.fiscal_year_id,
                        Some(version.id),
                    )?;
                    version.is_baseline = true;
                }
                Some(false) if version.is_baseline => {
                    return Err(VersionError::BaselineCannotBeCleared(version.id));
                }
                _ => {}
            }

            if let Some(Some(cost_center_id)) = input.cost_center_id {
                self.ensure_cost_center(version.company_id, cost_center_id)?;
            }

            if let Some(name) = input.name {
                version.name = name;
            }
            if let Some(description) = input.description {
                version.description = description;
            }
            if let Some(cost_center_id) = input.cost_center_id {
                version.cost_center_id = cost_center_id;
            }
            if let Some(metadata) = input.metadata {
                version.metadata = metadata;
            }
            version.updated_at = Utc::now();

            repo.save_version(version.clone());
            Ok(version)
        })?;

        info!(version_id = %version.id, "Budget version updated");
        Ok(version)
    }

    /// Deletes a version and all of its items.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The version does not exist
    /// - The version is the baseline or active
    /// - The version is approved or archived
    /// - Other versions were derived from it
    pub fn delete_version(&self, id: VersionId) -> Result<(), VersionError> {
        let removed_items = self.store.write(|repo| {
            let version = repo
                .find_version(id)
                .ok_or(VersionError::VersionNotFound(id))?;
            LifecycleRules::ensure_deletable(&version)?;

            let children = repo.children_of(id);
            if !children.is_empty() {
                return Err(VersionError::HasDependents {
                    version_id: id,
                    count: children.len(),
                });
            }

            let removed = repo.delete_items_for_version(id);
            repo.delete_version(id);
            Ok(removed)
        })?;

        info!(version_id = %id, removed_items, "Budget version deleted");
        Ok(())
    }

    /// Approves a draft or simulation version.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::VersionNotFound` for unknown ids and
    /// `VersionError::InvalidTransition` from any other status.
    pub fn approve_version(&self, id: VersionId) -> Result<BudgetVersion, VersionError> {
        let version = self.store.write(|repo| {
            let mut version = repo
                .find_version(id)
                .ok_or(VersionError::VersionNotFound(id))?;
            version.status = LifecycleRules::approve(version.status)?;
            version.updated_at = Utc::now();
            repo.save_version(version.clone());
            Ok(version)
        })?;

        info!(version_id = %id, "Budget version approved");
        Ok(version)
    }

    /// Activates an approved version.
    ///
    /// Any other active version of the same fiscal year is archived in the
    /// same unit of work.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::VersionNotFound` for unknown ids and
    /// `VersionError::InvalidTransition` unless the version is approved.
    pub fn activate_version(&self, id: VersionId) -> Result<BudgetVersion, VersionError> {
        let (version, archived) = self.store.write(|repo| {
            let mut version = repo
                .find_version(id)
                .ok_or(VersionError::VersionNotFound(id))?;
            version.status = LifecycleRules::activate(version.status)?;

            let now = Utc::now();
            let mut archived = Vec::new();
            for mut other in repo.versions_for_fiscal_year(version.fiscal_year_id) {
                if other.id == version.id || other.status != VersionStatus::Active {
                    continue;
                }
                other.status = LifecycleRules::archive(other.status)?;
                other.updated_at = now;
                archived.push(other.id);
                repo.save_version(other);
            }

            version.updated_at = now;
            repo.save_version(version.clone());
            Ok((version, archived))
        })?;

        for archived_id in &archived {
            warn!(
                version_id = %archived_id,
                superseded_by = %version.id,
                fiscal_year_id = %version.fiscal_year_id,
                "Active budget version archived"
            );
        }
        info!(
            version_id = %version.id,
            fiscal_year_id = %version.fiscal_year_id,
            "Budget version activated"
        );

        Ok(version)
    }

    // ========================================================================
    // Item operations
    // ========================================================================

    /// Adds an item to a version and recomputes the version total.
    ///
    /// Without an explicit original amount, the parent version's adjusted
    /// amount for the same budget line is used, falling back to the line's
    /// budgeted amount.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The version or budget item does not exist
    /// - The budget item belongs to another fiscal year
    /// - The version already has an item for the budget item
    /// - The adjustment or original amount is out of range
    /// - The adjusted amount or the new total does not fit in a decimal
    pub fn add_version_item(
        &self,
        version_id: VersionId,
        input: AddVersionItemInput,
    ) -> Result<BudgetVersionItem, VersionError> {
        let line = self
            .catalog
            .budget_item(input.budget_item_id)
            .ok_or(VersionError::BudgetItemNotFound(input.budget_item_id))?;
        if let Some(original) = input.original_amount
            && original < Decimal::ZERO
        {
            return Err(VersionError::NegativeOriginalAmount(original));
        }
        AdjustmentCalculator::validate(input.adjustment_type, input.adjustment_value)?;

        let item = self.store.write(|repo| {
            let version = repo
                .find_version(version_id)
                .ok_or(VersionError::VersionNotFound(version_id))?;
            if line.fiscal_year_id != version.fiscal_year_id {
                return Err(VersionError::FiscalYearMismatch {
                    expected: version.fiscal_year_id,
                    got: line.fiscal_year_id,
                });
            }
            if repo.find_item_for_budget_item(version_id, line.id).is_some() {
                return Err(VersionError::DuplicateItem {
                    version_id,
                    budget_item_id: line.id,
                });
            }

            let original_amount = match input.original_amount {
                Some(amount) => amount,
                None => version
                    .parent_version_id
                    .and_then(|parent_id| repo.find_item_for_budget_item(parent_id, line.id))
                    .map_or(line.budgeted_amount, |parent_item| parent_item.adjusted_amount),
            };
            let adjusted_amount = AdjustmentCalculator::compute_adjusted_amount(
                original_amount,
                input.adjustment_type,
                input.adjustment_value,
            )?;

            let now = Utc::now();
            let item = BudgetVersionItem {
                id: VersionItemId::new(),
                version_id,
                budget_item_id: line.id,
                original_amount,
                adjusted_amount,
                adjustment_type: input.adjustment_type,
                adjustment_value: input.adjustment_value,
                notes: input.notes.clone(),
                created_at: now,
                updated_at: now,
            };
            repo.save_item(item.clone());
            TotalAggregator::recompute_total(repo, version_id)?;
            Ok(item)
        })?;

        debug!(
            version_id = %version_id,
            item_id = %item.id,
            budget_item_id = %item.budget_item_id,
            adjusted_amount = %item.adjusted_amount,
            "Version item added"
        );
        Ok(item)
    }

    /// Updates an item's adjustment or notes and recomputes the version total.
    ///
    /// Changing only the adjustment type converts the existing value so the
    /// adjusted amount is preserved.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::ItemNotFound` for unknown ids,
    /// `VersionError::PercentageBelowFloor` for out-of-range percentages and
    /// `VersionError::AmountOverflow` when the new amount or total does not
    /// fit in a decimal.
    pub fn update_version_item(
        &self,
        item_id: VersionItemId,
        input: UpdateVersionItemInput,
    ) -> Result<BudgetVersionItem, VersionError> {
        let item = self.store.write(|repo| {
            let mut item = repo
                .find_item(item_id)
                .ok_or(VersionError::ItemNotFound(item_id))?;

            let adjustment_type = input.adjustment_type.unwrap_or(item.adjustment_type);
            let adjustment_value = match input.adjustment_value {
                Some(value) => value,
                None if adjustment_type != item.adjustment_type => {
                    Self::converted_value(&item, adjustment_type)?
                }
                None => item.adjustment_value,
            };

            item.adjusted_amount = AdjustmentCalculator::compute_adjusted_amount(
                item.original_amount,
                adjustment_type,
                adjustment_value,
            )?;
            item.adjustment_type = adjustment_type;
            item.adjustment_value = adjustment_value;
            if let Some(notes) = input.notes {
                item.notes = notes;
            }
            item.updated_at = Utc::now();

            repo.save_item(item.clone());
            TotalAggregator::recompute_total(repo, item.version_id)?;
            Ok(item)
        })?;

        debug!(
            version_id = %item.version_id,
            item_id = %item.id,
            adjusted_amount = %item.adjusted_amount,
            "Version item updated"
        );
        Ok(item)
    }

    /// Removes an item and recomputes the version total.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::ItemNotFound` for unknown ids.
    pub fn delete_version_item(&self, item_id: VersionItemId) -> Result<(), VersionError> {
        let version_id = self.store.write(|repo| {
            let item = repo
                .delete_item(item_id)
                .ok_or(VersionError::ItemNotFound(item_id))?;
            TotalAggregator::recompute_total(repo, item.version_id)?;
            Ok(item.version_id)
        })?;

        debug!(version_id = %version_id, item_id = %item_id, "Version item deleted");
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Compares two versions line by line.
    ///
    /// Both item sets are read from the same snapshot.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::VersionNotFound` if either version is unknown.
    pub fn compare_versions(
        &self,
        version_a: VersionId,
        version_b: VersionId,
    ) -> Result<VersionComparison, VersionError> {
        self.store.read(|reader| {
            let a = reader
                .find_version(version_a)
                .ok_or(VersionError::VersionNotFound(version_a))?;
            let b = reader
                .find_version(version_b)
                .ok_or(VersionError::VersionNotFound(version_b))?;
            let items_a = reader.items_for_version(version_a);
            let items_b = reader.items_for_version(version_b);
            ComparisonEngine::compare(&a, &items_a, &b, &items_b)
        })
    }

    /// Gets a version by id.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::VersionNotFound` for unknown ids.
    pub fn get_version(&self, id: VersionId) -> Result<BudgetVersion, VersionError> {
        self.store.read(|reader| {
            reader
                .find_version(id)
                .ok_or(VersionError::VersionNotFound(id))
        })
    }

    /// Lists a fiscal year's versions ordered by version number.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::Storage` if the store cannot be read.
    pub fn list_versions_by_fiscal_year(
        &self,
        fiscal_year_id: FiscalYearId,
    ) -> Result<Vec<BudgetVersion>, VersionError> {
        self.store.read(|reader| {
            let mut versions = reader.versions_for_fiscal_year(fiscal_year_id);
            versions.sort_by_key(|v| v.version_number);
            Ok(versions)
        })
    }

    /// Gets the baseline of a company's fiscal year, if one exists.
    pub fn get_baseline_version(
        &self,
        company_id: CompanyId,
        fiscal_year_id: FiscalYearId,
    ) -> Result<Option<BudgetVersion>, VersionError> {
        self.store.read(|reader| {
            Ok(reader
                .versions_for_fiscal_year(fiscal_year_id)
                .into_iter()
                .find(|v| v.is_baseline && v.company_id == company_id))
        })
    }

    /// Gets the active version of a fiscal year, if one exists.
    pub fn get_active_version(
        &self,
        fiscal_year_id: FiscalYearId,
    ) -> Result<Option<BudgetVersion>, VersionError> {
        self.store.read(|reader| {
            Ok(reader
                .versions_for_fiscal_year(fiscal_year_id)
                .into_iter()
                .find(|v| v.status == VersionStatus::Active))
        })
    }

    /// Gets a version's items in creation order.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::VersionNotFound` for unknown ids.
    pub fn get_version_items(
        &self,
        version_id: VersionId,
    ) -> Result<Vec<BudgetVersionItem>, VersionError> {
        self.store.read(|reader| {
            reader
                .find_version(version_id)
                .ok_or(VersionError::VersionNotFound(version_id))?;
            let mut items = reader.items_for_version(version_id);
            items.sort_by_key(|item| (item.created_at, item.id));
            Ok(items)
        })
    }

    /// Gets a version followed by its ancestors up to the root.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::VersionNotFound` for unknown ids.
    pub fn get_version_lineage(&self, id: VersionId) -> Result<Vec<BudgetVersion>, VersionError> {
        self.store
            .read(|reader| Self::walk_lineage(reader, id, usize::MAX))
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn validate_name(name: &str) -> Result<(), VersionError> {
        if name.trim().is_empty() {
            return Err(VersionError::EmptyName);
        }
        Ok(())
    }

    fn validate_metadata(&self, metadata: &VersionMetadata) -> Result<(), VersionError> {
        let max = self.config.max_metadata_extensions;
        if metadata.extensions.len() > max {
            return Err(VersionError::TooManyMetadataExtensions {
                count: metadata.extensions.len(),
                max,
            });
        }

        if let Some(key) = metadata
            .extensions
            .keys()
            .find(|key| key.trim().is_empty() || key.len() > self.config.max_extension_key_len)
        {
            return Err(VersionError::InvalidMetadataKey(key.clone()));
        }

        AdjustmentCalculator::validate(
            AdjustmentType::Percentage,
            AdjustmentCalculator::factor_to_percentage(metadata.adjustment_factor)?,
        )
    }

    fn ensure_cost_center(
        &self,
        company_id: CompanyId,
        cost_center_id: CostCenterId,
    ) -> Result<(), VersionError> {
        let cost_center = self
            .catalog
            .cost_center(cost_center_id)
            .ok_or(VersionError::CostCenterNotFound(cost_center_id))?;
        if cost_center.company_id != company_id {
            return Err(VersionError::CompanyMismatch {
                expected: company_id,
                got: cost_center.company_id,
            });
        }
        Ok(())
    }

    fn ensure_baseline_available<R>(
        reader: &R,
        company_id: CompanyId,
        fiscal_year_id: FiscalYearId,
        except: Option<VersionId>,
    ) -> Result<(), VersionError>
    where
        R: VersionReader + ?Sized,
    {
        let existing = reader
            .versions_for_fiscal_year(fiscal_year_id)
            .into_iter()
            .find(|v| v.is_baseline && v.company_id == company_id && Some(v.id) != except);

        match existing {
            Some(existing) => Err(VersionError::BaselineExists {
                fiscal_year_id,
                existing: existing.id,
            }),
            None => Ok(()),
        }
    }

    fn resolve_parent<R>(
        &self,
        reader: &R,
        parent_id: VersionId,
        input: &CreateVersionInput,
    ) -> Result<BudgetVersion, VersionError>
    where
        R: VersionReader + ?Sized,
    {
        let parent = Self::walk_lineage(reader, parent_id, self.config.max_lineage_depth)?
            .into_iter()
            .next()
            .ok_or(VersionError::VersionNotFound(parent_id))?;

        if parent.fiscal_year_id != input.fiscal_year_id {
            return Err(VersionError::FiscalYearMismatch {
                expected: input.fiscal_year_id,
                got: parent.fiscal_year_id,
            });
        }
        if parent.company_id != input.company_id {
            return Err(VersionError::CompanyMismatch {
                expected: input.company_id,
                got: parent.company_id,
            });
        }

        Ok(parent)
    }

    /// Collects `start` and its ancestors, failing on cycles or chains longer
    /// than `limit`.
    fn walk_lineage<R>(
        reader: &R,
        start: VersionId,
        limit: usize,
    ) -> Result<Vec<BudgetVersion>, VersionError>
    where
        R: VersionReader + ?Sized,
    {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(start);

        while let Some(id) = next {
            if !seen.insert(id) {
                return Err(VersionError::LineageCycle(start));
            }
            let version = reader
                .find_version(id)
                .ok_or(VersionError::VersionNotFound(id))?;
            next = version.parent_version_id;
            chain.push(version);

            if chain.len() > limit {
                return Err(VersionError::LineageTooDeep { max: limit });
            }
        }

        Ok(chain)
    }

    fn converted_value(
        item: &BudgetVersionItem,
        to: AdjustmentType,
    ) -> Result<Decimal, VersionError> {
        let value = AdjustmentCalculator::convert_adjustment_type(
            item.original_amount,
            item.adjustment_type,
            to,
            item.adjustment_value,
        )?;
        // A cut larger than the original lands below -100%; both zero the amount.
        Ok(if to == AdjustmentType::Percentage {
            value.max(PERCENTAGE_FLOOR)
        } else {
            value
        })
    }
}
