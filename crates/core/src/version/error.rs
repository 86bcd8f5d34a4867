//! Budget version error types.
//!
//! Every variant belongs to one [`ErrorKind`], which gives callers a stable
//! classification independent of the individual failure.

use rust_decimal::Decimal;
use scenaria_shared::AppError;
use scenaria_shared::types::{
    BudgetItemId, CompanyId, CostCenterId, FiscalYearId, VersionId, VersionItemId,
};
use thiserror::Error;

use super::types::VersionStatus;

/// Classification of a [`VersionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range input.
    Validation,
    /// Uniqueness violation.
    Conflict,
    /// Unknown id reference.
    NotFound,
    /// Illegal lifecycle transition or protected entity.
    BusinessRule,
    /// The backing store failed.
    Storage,
}

/// Errors that can occur during budget version operations.
#[derive(Debug, Error)]
pub enum VersionError {
    /// Percentage adjustment below -100%.
    #[error("Percentage adjustment {value} is below -100")]
    PercentageBelowFloor {
        /// The rejected value.
        value: Decimal,
    },

    /// Original amount snapshot must not be negative.
    #[error("Original amount {0} cannot be negative")]
    NegativeOriginalAmount(Decimal),

    /// A computed amount left the representable decimal range.
    #[error("Amount overflow while computing {0}")]
    AmountOverflow(&'static str),

    /// Versions can only be created as draft or simulation.
    #[error("Versions cannot be created with status {0}")]
    InvalidInitialStatus(VersionStatus),

    /// Version name is blank.
    #[error("Version name cannot be empty")]
    EmptyName,

    /// Entity belongs to a different fiscal year than required.
    #[error("Fiscal year mismatch: expected {expected}, got {got}")]
    FiscalYearMismatch {
        /// Fiscal year of the version.
        expected: FiscalYearId,
        /// Fiscal year of the referenced entity.
        got: FiscalYearId,
    },

    /// Entity belongs to a different company than required.
    #[error("Company mismatch: expected {expected}, got {got}")]
    CompanyMismatch {
        /// Company of the version.
        expected: CompanyId,
        /// Company of the referenced entity.
        got: CompanyId,
    },

    /// Ancestor chain longer than the configured maximum.
    #[error("Version lineage exceeds the maximum depth of {max}")]
    LineageTooDeep {
        /// Configured maximum.
        max: usize,
    },

    /// Metadata extension map exceeds the configured bound.
    #[error("Metadata has {count} extensions, at most {max} allowed")]
    TooManyMetadataExtensions {
        /// Number of extensions supplied.
        count: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Metadata extension key is empty or too long.
    #[error("Invalid metadata extension key: {0:?}")]
    InvalidMetadataKey(String),

    /// A baseline already exists for the company and fiscal year.
    #[error("Fiscal year {fiscal_year_id} already has baseline version {existing}")]
    BaselineExists {
        /// Fiscal year ID.
        fiscal_year_id: FiscalYearId,
        /// The existing baseline.
        existing: VersionId,
    },

    /// The version already has an item for this budget line.
    #[error("Version {version_id} already has an item for budget item {budget_item_id}")]
    DuplicateItem {
        /// Version ID.
        version_id: VersionId,
        /// Budget item ID.
        budget_item_id: BudgetItemId,
    },

    /// The version number is already taken in the fiscal year.
    #[error("Version number {version_number} already exists for fiscal year {fiscal_year_id}")]
    DuplicateVersionNumber {
        /// Fiscal year ID.
        fiscal_year_id: FiscalYearId,
        /// Colliding number.
        version_number: u32,
    },

    /// Budget version not found.
    #[error("Budget version not found: {0}")]
    VersionNotFound(VersionId),

    /// Version item not found.
    #[error("Version item not found: {0}")]
    ItemNotFound(VersionItemId),

    /// Fiscal year not found.
    #[error("Fiscal year not found: {0}")]
    FiscalYearNotFound(FiscalYearId),

    /// Budget item not found.
    #[error("Budget item not found: {0}")]
    BudgetItemNotFound(BudgetItemId),

    /// Cost center not found.
    #[error("Cost center not found: {0}")]
    CostCenterNotFound(CostCenterId),

    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: VersionStatus,
        /// The attempted target status.
        to: VersionStatus,
    },

    /// Baseline versions cannot be deleted.
    #[error("Baseline version {0} cannot be deleted")]
    BaselineProtected(VersionId),

    /// Active versions cannot be deleted.
    #[error("Active version {0} cannot be deleted")]
    ActiveProtected(VersionId),

    /// Only draft and simulation versions can be deleted.
    #[error("Version in status {0} cannot be deleted")]
    NotDeletable(VersionStatus),

    /// The baseline flag is permanent.
    #[error("Baseline flag cannot be cleared on version {0}")]
    BaselineCannotBeCleared(VersionId),

    /// Other versions were derived from this one.
    #[error("Version {version_id} has {count} derived versions")]
    HasDependents {
        /// Version ID.
        version_id: VersionId,
        /// Number of direct children.
        count: usize,
    },

    /// The parent chain loops back on itself.
    #[error("Version lineage of {0} contains a cycle")]
    LineageCycle(VersionId),

    /// Storage failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl VersionError {
    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PercentageBelowFloor { .. }
            | Self::NegativeOriginalAmount(_)
            | Self::AmountOverflow(_)
            | Self::InvalidInitialStatus(_)
            | Self::EmptyName
            | Self::FiscalYearMismatch { .. }
            | Self::CompanyMismatch { .. }
            | Self::LineageTooDeep { .. }
            | Self::TooManyMetadataExtensions { .. }
            | Self::InvalidMetadataKey(_) => ErrorKind::Validation,

            Self::BaselineExists { .. }
            | Self::DuplicateItem { .. }
            | Self::DuplicateVersionNumber { .. } => ErrorKind::Conflict,

            Self::VersionNotFound(_)
            | Self::ItemNotFound(_)
            | Self::FiscalYearNotFound(_)
            | Self::BudgetItemNotFound(_)
            | Self::CostCenterNotFound(_) => ErrorKind::NotFound,

            Self::InvalidTransition { .. }
            | Self::BaselineProtected(_)
            | Self::ActiveProtected(_)
            | Self::NotDeletable(_)
            | Self::BaselineCannotBeCleared(_)
            | Self::HasDependents { .. }
            | Self::LineageCycle(_) => ErrorKind::BusinessRule,

            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Returns the HTTP-style status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::BusinessRule => 422,
            ErrorKind::Storage => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PercentageBelowFloor { .. } => "PERCENTAGE_BELOW_FLOOR",
            Self::NegativeOriginalAmount(_) => "NEGATIVE_ORIGINAL_AMOUNT",
            Self::AmountOverflow(_) => "AMOUNT_OVERFLOW",
            Self::InvalidInitialStatus(_) => "INVALID_INITIAL_STATUS",
            Self::EmptyName => "EMPTY_NAME",
            Self::FiscalYearMismatch { .. } => "FISCAL_YEAR_MISMATCH",
            Self::CompanyMismatch { .. } => "COMPANY_MISMATCH",
            Self::LineageTooDeep { .. } => "LINEAGE_TOO_DEEP",
            Self::TooManyMetadataExtensions { .. } => "TOO_MANY_METADATA_EXTENSIONS",
            Self::InvalidMetadataKey(_) => "INVALID_METADATA_KEY",
            Self::BaselineExists { .. } => "BASELINE_EXISTS",
            Self::DuplicateItem { .. } => "DUPLICATE_VERSION_ITEM",
            Self::DuplicateVersionNumber { .. } => "DUPLICATE_VERSION_NUMBER",
            Self::VersionNotFound(_) => "VERSION_NOT_FOUND",
            Self::ItemNotFound(_) => "VERSION_ITEM_NOT_FOUND",
            Self::FiscalYearNotFound(_) => "FISCAL_YEAR_NOT_FOUND",
            Self::BudgetItemNotFound(_) => "BUDGET_ITEM_NOT_FOUND",
            Self::CostCenterNotFound(_) => "COST_CENTER_NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::BaselineProtected(_) => "BASELINE_PROTECTED",
            Self::ActiveProtected(_) => "ACTIVE_PROTECTED",
            Self::NotDeletable(_) => "NOT_DELETABLE",
            Self::BaselineCannotBeCleared(_) => "BASELINE_CANNOT_BE_CLEARED",
            Self::HasDependents { .. } => "HAS_DEPENDENTS",
            Self::LineageCycle(_) => "LINEAGE_CYCLE",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<VersionError> for AppError {
    fn from(err: VersionError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::BusinessRule => Self::BusinessRule(message),
            ErrorKind::Storage => Self::Internal(message),
        }
    }
}
