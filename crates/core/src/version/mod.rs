//! Budget versions: lifecycle, derivation and comparison.

pub mod adjustment;
pub mod aggregate;
pub mod comparison;
pub mod derivation;
pub mod error;
pub mod lifecycle;
pub mod repository;
pub mod service;
pub mod types;


pub use adjustment::{AdjustmentCalculator, PERCENTAGE_FLOOR};
pub use aggregate::TotalAggregator;
pub use comparison::ComparisonEngine;
pub use derivation::DerivationEngine;
pub use error::{ErrorKind, VersionError};
pub use lifecycle::LifecycleRules;
pub use repository::{ReferenceCatalog, VersionReader, VersionRepository, VersionStore};
pub use service::VersionService;
pub use types::{
    AddVersionItemInput, AdjustmentType, BudgetItem, BudgetItemType, BudgetVersion,
    BudgetVersionItem, CostCenter, CreateVersionInput, FiscalYear, FiscalYearStatus,
    ItemComparison, ScenarioType, UpdateVersionInput, UpdateVersionItemInput, VersionComparison,
    VersionMetadata, VersionStatus,
};
