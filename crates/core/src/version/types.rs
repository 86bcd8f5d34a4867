//! Budget version data types.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use scenaria_shared::types::{
    BudgetItemId, CompanyId, CostCenterId, FiscalYearId, UserId, VersionId, VersionItemId,
};

/// Lifecycle status of a budget version.
///
/// The valid transitions are:
/// - Draft → Approved (approve)
/// - Simulation → Approved (approve)
/// - Approved → Active (activate)
/// - Active → Archived (another version of the fiscal year is activated)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    /// Working copy, freely editable.
    Draft,
    /// What-if scenario, freely editable.
    Simulation,
    /// Signed off and ready to become the operating budget.
    Approved,
    /// The fiscal year's operating budget.
    Active,
    /// Superseded by a later activation.
    Archived,
}

impl VersionStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Simulation => "simulation",
            Self::Approved => "approved",
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "simulation" => Some(Self::Simulation),
            "approved" => Some(Self::Approved),
            "active" => Some(Self::Active),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    /// Returns true for the states a version may be created in.
    #[must_use]
    pub fn is_initial(&self) -> bool {
        matches!(self, Self::Draft | Self::Simulation)
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a version item's adjustment value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentType {
    /// Value is a signed percentage of the original amount.
    Percentage,
    /// Value is a signed amount added to the original amount.
    Absolute,
}

impl AdjustmentType {
    /// Returns the string representation of the adjustment type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Absolute => "absolute",
        }
    }

    /// Parses an adjustment type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "percentage" => Some(Self::Percentage),
            "absolute" => Some(Self::Absolute),
            _ => None,
        }
    }
}

impl fmt::Display for AdjustmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scenario classification carried in version metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioType {
    /// Favorable assumptions.
    Optimistic,
    /// Expected assumptions.
    Realistic,
    /// Unfavorable assumptions.
    Pessimistic,
}

impl ScenarioType {
    /// Returns the string representation of the scenario type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Optimistic => "optimistic",
            Self::Realistic => "realistic",
            Self::Pessimistic => "pessimistic",
        }
    }
}

/// Typed metadata attached to a budget version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionMetadata {
    /// Free-text planning assumptions.
    #[serde(default)]
    pub assumptions: Vec<String>,
    /// Scenario classification.
    #[serde(default)]
    pub scenario_type: Option<ScenarioType>,
    /// Multiplier applied to every item when deriving from a parent.
    #[serde(default = "default_adjustment_factor")]
    pub adjustment_factor: Decimal,
    /// Free-form labels.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Bounded extension point for caller-defined keys.
    #[serde(default)]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

fn default_adjustment_factor() -> Decimal {
    Decimal::ONE
}

impl Default for VersionMetadata {
    fn default() -> Self {
        Self {
            assumptions: Vec::new(),
            scenario_type: None,
            adjustment_factor: default_adjustment_factor(),
            tags: Vec::new(),
            extensions: BTreeMap::new(),
        }
    }
}

impl VersionMetadata {
    /// Metadata for a scenario derived with the given factor.
    #[must_use]
    pub fn scenario(scenario_type: ScenarioType, adjustment_factor: Decimal) -> Self {
        Self {
            scenario_type: Some(scenario_type),
            adjustment_factor,
            ..Self::default()
        }
    }
}

/// A budget version (scenario) of a fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetVersion {
    /// Version ID.
    pub id: VersionId,
    /// Version name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Fiscal year this version plans.
    pub fiscal_year_id: FiscalYearId,
    /// Cost center scope; `None` covers the whole company.
    pub cost_center_id: Option<CostCenterId>,
    /// Sequential number, unique per fiscal year and never reused.
    pub version_number: u32,
    /// Lifecycle status.
    pub status: VersionStatus,
    /// Whether this is the fiscal year's official baseline.
    pub is_baseline: bool,
    /// Version this one was derived from.
    pub parent_version_id: Option<VersionId>,
    /// Cached sum of the items' adjusted amounts.
    ///
    /// A root version is created without items and starts with a provisional
    /// total: the sum of its fiscal year's budgeted amounts. The first item
    /// added, updated or deleted replaces it with the sum of the version's
    /// own items, which it stays from then on.
    pub total_budget: Decimal,
    /// Typed metadata.
    pub metadata: VersionMetadata,
    /// Owning company.
    pub company_id: CompanyId,
    /// User who created the version.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A per-budget-line adjustment owned by exactly one version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetVersionItem {
    /// Item ID.
    pub id: VersionItemId,
    /// Owning version.
    pub version_id: VersionId,
    /// External budget line this item adjusts.
    pub budget_item_id: BudgetItemId,
    /// Snapshot taken at creation, never mutated.
    pub original_amount: Decimal,
    /// Derived from the original amount and the adjustment.
    pub adjusted_amount: Decimal,
    /// Adjustment interpretation.
    pub adjustment_type: AdjustmentType,
    /// Signed adjustment value.
    pub adjustment_value: Decimal,
    /// Optional notes.
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Fiscal year status as reported by the fiscal calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FiscalYearStatus {
    /// Budgets are being prepared.
    Planning,
    /// The year is running.
    Open,
    /// The year is closed.
    Closed,
}

/// Read model of an external fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalYear {
    /// Fiscal year ID.
    pub id: FiscalYearId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Display name (e.g., "FY 2025").
    pub name: String,
    /// Calendar status.
    pub status: FiscalYearStatus,
    /// Planned total, informational only.
    pub total_budget: Decimal,
}

/// Budget line classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetItemType {
    /// Planned revenue.
    Revenue,
    /// Planned expense.
    Expense,
    /// Planned capital investment.
    Investment,
}

/// Read model of an external fiscal year budget line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetItem {
    /// Budget item ID.
    pub id: BudgetItemId,
    /// Fiscal year the line belongs to.
    pub fiscal_year_id: FiscalYearId,
    /// Line name.
    pub name: String,
    /// Budgeted amount.
    pub budgeted_amount: Decimal,
    /// Line classification.
    pub item_type: BudgetItemType,
}

/// Read model of an external cost center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostCenter {
    /// Cost center ID.
    pub id: CostCenterId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Cost center name.
    pub name: String,
}

/// Input for creating a new budget version.
#[derive(Debug, Clone)]
pub struct CreateVersionInput {
    /// Owning company.
    pub company_id: CompanyId,
    /// Fiscal year ID.
    pub fiscal_year_id: FiscalYearId,
    /// Optional cost center scope.
    pub cost_center_id: Option<CostCenterId>,
    /// Version name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Initial status, draft or simulation.
    pub status: VersionStatus,
    /// Whether the version is the fiscal year's baseline.
    pub is_baseline: bool,
    /// Version to derive items from.
    pub parent_version_id: Option<VersionId>,
    /// Typed metadata; its adjustment factor drives derivation.
    pub metadata: VersionMetadata,
    /// User creating the version.
    pub created_by: UserId,
}

/// Input for updating a budget version.
#[derive(Debug, Clone, Default)]
pub struct UpdateVersionInput {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New cost center scope.
    pub cost_center_id: Option<Option<CostCenterId>>,
    /// Promote to baseline. Clearing an existing baseline is rejected.
    pub is_baseline: Option<bool>,
    /// Replacement metadata.
    pub metadata: Option<VersionMetadata>,
}

/// Input for adding an item to a version.
#[derive(Debug, Clone)]
pub struct AddVersionItemInput {
    /// External budget line to adjust.
    pub budget_item_id: BudgetItemId,
    /// Adjustment interpretation.
    pub adjustment_type: AdjustmentType,
    /// Signed adjustment value.
    pub adjustment_value: Decimal,
    /// Optional notes.
    pub notes: Option<String>,
    /// Explicit original amount. Resolved from the parent version or the
    /// budget line when absent.
    pub original_amount: Option<Decimal>,
}

/// Input for updating a version item.
#[derive(Debug, Clone, Default)]
pub struct UpdateVersionItemInput {
    /// New adjustment interpretation.
    pub adjustment_type: Option<AdjustmentType>,
    /// New adjustment value.
    pub adjustment_value: Option<Decimal>,
    /// New notes.
    pub notes: Option<Option<String>>,
}

/// Line-level comparison between two versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemComparison {
    /// Budget line compared.
    pub budget_item_id: BudgetItemId,
    /// Adjusted amount in version A, zero when absent.
    pub amount_a: Decimal,
    /// Adjusted amount in version B, zero when absent.
    pub amount_b: Decimal,
    /// `amount_b - amount_a`.
    pub difference: Decimal,
    /// Difference relative to version A.
    pub percentage_difference: Decimal,
}

/// Structured diff between two versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionComparison {
    /// Version A.
    pub version_a: VersionId,
    /// Version B.
    pub version_b: VersionId,
    /// Per-line differences over the union of both item sets.
    pub items: Vec<ItemComparison>,
    /// Sum of version A's items.
    pub total_a: Decimal,
    /// Sum of version B's items.
    pub total_b: Decimal,
    /// `total_b - total_a`.
    pub total_difference: Decimal,
    /// Total difference relative to version A.
    pub total_percentage_difference: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            VersionStatus::Draft,
            VersionStatus::Simulation,
            VersionStatus::Approved,
            VersionStatus::Active,
            VersionStatus::Archived,
        ] {
            assert_eq!(VersionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(VersionStatus::parse("ACTIVE"), Some(VersionStatus::Active));
        assert_eq!(VersionStatus::parse("published"), None);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(format!("{}", VersionStatus::Simulation), "simulation");
        assert_eq!(format!("{}", AdjustmentType::Absolute), "absolute");
    }

    #[test]
    fn test_initial_statuses() {
        assert!(VersionStatus::Draft.is_initial());
        assert!(VersionStatus::Simulation.is_initial());
        assert!(!VersionStatus::Approved.is_initial());
        assert!(!VersionStatus::Active.is_initial());
        assert!(!VersionStatus::Archived.is_initial());
    }

    #[test]
    fn test_metadata_defaults_to_unit_factor() {
        let metadata: VersionMetadata = serde_json::from_str("{}").unwrap();
        assert_eq!(metadata.adjustment_factor, Decimal::ONE);
        assert!(metadata.extensions.is_empty());
        assert_eq!(metadata, VersionMetadata::default());
    }

    #[test]
    fn test_metadata_serde_names() {
        let metadata = VersionMetadata::scenario(ScenarioType::Pessimistic, Decimal::new(9, 1));
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["scenario_type"], "pessimistic");
        assert_eq!(AdjustmentType::parse("Percentage"), Some(AdjustmentType::Percentage));
    }
}
