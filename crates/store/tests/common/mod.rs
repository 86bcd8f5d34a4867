//! Shared fixtures for store integration tests.

#![allow(dead_code)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use scenaria_core::version::{
    BudgetItem, BudgetItemType, CostCenter, CreateVersionInput, FiscalYear, FiscalYearStatus,
    VersionMetadata, VersionService, VersionStatus,
};
use scenaria_shared::EngineConfig;
use scenaria_shared::types::{
    BudgetItemId, CompanyId, CostCenterId, FiscalYearId, UserId, VersionId,
};
use scenaria_store::{InMemoryCatalog, MemoryVersionStore};

pub type Service = VersionService<MemoryVersionStore, InMemoryCatalog>;

/// One company, one fiscal year with a 500 000 revenue line and a
/// 120 000 expense line.
pub struct Fixture {
    pub service: Service,
    pub company_id: CompanyId,
    pub fiscal_year_id: FiscalYearId,
    pub user_id: UserId,
    pub revenue: BudgetItemId,
    pub expense: BudgetItemId,
}

pub fn fixture() -> Fixture {
    fixture_with_config(EngineConfig::default())
}

pub fn fixture_with_config(config: EngineConfig) -> Fixture {
    let catalog = InMemoryCatalog::new();
    let company_id = CompanyId::new();
    let fiscal_year_id = add_fiscal_year(&catalog, company_id, "FY 2025");

    let revenue = add_line(&catalog, fiscal_year_id, "Product revenue", dec!(500000));
    let expense = add_line(&catalog, fiscal_year_id, "Operating expense", dec!(120000));

    Fixture {
        service: VersionService::new(MemoryVersionStore::new(), catalog, config),
        company_id,
        fiscal_year_id,
        user_id: UserId::new(),
        revenue,
        expense,
    }
}

pub fn add_fiscal_year(
    catalog: &InMemoryCatalog,
    company_id: CompanyId,
    name: &str,
) -> FiscalYearId {
    let id = FiscalYearId::new();
    catalog.insert_fiscal_year(FiscalYear {
        id,
        company_id,
        name: name.to_string(),
        status: FiscalYearStatus::Planning,
        total_budget: dec!(620000),
    });
    id
}

pub fn add_cost_center(
    catalog: &InMemoryCatalog,
    company_id: CompanyId,
    name: &str,
) -> CostCenterId {
    let id = CostCenterId::new();
    catalog.insert_cost_center(CostCenter {
        id,
        company_id,
        name: name.to_string(),
    });
    id
}

pub fn add_line(
    catalog: &InMemoryCatalog,
    fiscal_year_id: FiscalYearId,
    name: &str,
    amount: Decimal,
) -> BudgetItemId {
    let id = BudgetItemId::new();
    catalog.insert_budget_item(BudgetItem {
        id,
        fiscal_year_id,
        name: name.to_string(),
        budgeted_amount: amount,
        item_type: BudgetItemType::Expense,
    });
    id
}

impl Fixture {
    pub fn input(&self, name: &str) -> CreateVersionInput {
        CreateVersionInput {
            company_id: self.company_id,
            fiscal_year_id: self.fiscal_year_id,
            cost_center_id: None,
            name: name.to_string(),
            description: None,
            status: VersionStatus::Draft,
            is_baseline: false,
            parent_version_id: None,
            metadata: VersionMetadata::default(),
            created_by: self.user_id,
        }
    }

    pub fn derived_input(&self, name: &str, parent: VersionId, factor: Decimal) -> CreateVersionInput {
        CreateVersionInput {
            status: VersionStatus::Simulation,
            parent_version_id: Some(parent),
            metadata: VersionMetadata {
                adjustment_factor: factor,
                ..VersionMetadata::default()
            },
            ..self.input(name)
        }
    }

    pub fn create(&self, name: &str) -> VersionId {
        self.service.create_version(self.input(name)).unwrap().id
    }

    pub fn create_approved(&self, name: &str) -> VersionId {
        let id = self.create(name);
        self.service.approve_version(id).unwrap();
        id
    }

    /// Stored total must equal the sum of the version's items.
    pub fn assert_total_consistent(&self, version_id: VersionId) {
        let version = self.service.get_version(version_id).unwrap();
        let items = self.service.get_version_items(version_id).unwrap();
        let sum: Decimal = items.iter().map(|item| item.adjusted_amount).sum();
        assert_eq!(version.total_budget, sum, "total of {version_id} drifted");
    }
}
