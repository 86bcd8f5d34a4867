//! Scenario report.
//!
//! Seeds a fiscal year, builds a baseline version plus optimistic, realistic
//! and pessimistic scenarios derived from it, and prints each scenario's
//! comparison against the baseline as JSON.
//!
//! Usage: cargo run --bin scenario-report [fixture.json]

use std::fs;
use std::path::Path;

use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use scenaria_core::version::{
    AddVersionItemInput, AdjustmentType, BudgetItem, BudgetItemType, CreateVersionInput,
    FiscalYear, FiscalYearStatus, ScenarioType, VersionComparison, VersionMetadata, VersionService,
    VersionStatus,
};
use scenaria_shared::types::{BudgetItemId, CompanyId, FiscalYearId, UserId, VersionId};
use scenaria_shared::{AppConfig, LogConfig};
use scenaria_store::{InMemoryCatalog, MemoryVersionStore};

/// Reference data the report runs against.
#[derive(Debug, Deserialize)]
struct Fixture {
    fiscal_year: FiscalYear,
    budget_items: Vec<BudgetItem>,
}

#[derive(Debug, Serialize)]
struct ScenarioReport {
    scenario: ScenarioType,
    version_id: VersionId,
    version_number: u32,
    total_budget: Decimal,
    comparison: VersionComparison,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.log);

    let fixture = match std::env::args().nth(1) {
        Some(path) => load_fixture(Path::new(&path))?,
        None => sample_fixture(),
    };
    let fiscal_year_id = fixture.fiscal_year.id;
    let company_id = fixture.fiscal_year.company_id;

    let catalog = InMemoryCatalog::new();
    catalog.insert_fiscal_year(fixture.fiscal_year);
    for line in &fixture.budget_items {
        catalog.insert_budget_item(line.clone());
    }
    info!(
        fiscal_year_id = %fiscal_year_id,
        budget_items = fixture.budget_items.len(),
        "Catalog seeded"
    );

    let service = VersionService::new(MemoryVersionStore::new(), catalog, config.engine);
    let created_by = UserId::new();

    let baseline = service.create_version(CreateVersionInput {
        company_id,
        fiscal_year_id,
        cost_center_id: None,
        name: "Baseline".to_string(),
        description: Some("Budget as planned".to_string()),
        status: VersionStatus::Draft,
        is_baseline: true,
        parent_version_id: None,
        metadata: VersionMetadata::default(),
        created_by,
    })?;

    // Materialize the baseline so comparisons see each line on both sides.
    for line in &fixture.budget_items {
        service.add_version_item(
            baseline.id,
            AddVersionItemInput {
                budget_item_id: line.id,
                adjustment_type: AdjustmentType::Percentage,
                adjustment_value: Decimal::ZERO,
                notes: None,
                original_amount: None,
            },
        )?;
    }

    let scenarios = [
        (ScenarioType::Optimistic, Decimal::new(11, 1)),
        (ScenarioType::Realistic, Decimal::ONE),
        (ScenarioType::Pessimistic, Decimal::new(9, 1)),
    ];

    let mut reports = Vec::with_capacity(scenarios.len());
    for (scenario, factor) in scenarios {
        let version = service.create_version(CreateVersionInput {
            company_id,
            fiscal_year_id,
            cost_center_id: None,
            name: format!("{} scenario", scenario.as_str()),
            description: None,
            status: VersionStatus::Simulation,
            is_baseline: false,
            parent_version_id: Some(baseline.id),
            metadata: VersionMetadata::scenario(scenario, factor),
            created_by,
        })?;

        let comparison = service.compare_versions(baseline.id, version.id)?;
        info!(
            scenario = scenario.as_str(),
            total_difference = %comparison.total_difference,
            total_percentage_difference = %comparison.total_percentage_difference,
            "Scenario compared against baseline"
        );

        reports.push(ScenarioReport {
            scenario,
            version_id: version.id,
            version_number: version.version_number,
            total_budget: version.total_budget,
            comparison,
        });
    }

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

/// Logs go to stderr so stdout carries only the report.
fn init_tracing(log: &LogConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let registry = tracing_subscriber::registry().with(filter);

    if log.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn load_fixture(path: &Path) -> anyhow::Result<Fixture> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid fixture {}", path.display()))
}

fn sample_fixture() -> Fixture {
    let fiscal_year = FiscalYear {
        id: FiscalYearId::new(),
        company_id: CompanyId::new(),
        name: "FY 2025".to_string(),
        status: FiscalYearStatus::Planning,
        total_budget: Decimal::new(620_000, 0),
    };

    let lines = [
        ("Product revenue", 500_000, BudgetItemType::Revenue),
        ("Operating expense", 120_000, BudgetItemType::Expense),
    ];
    let budget_items = lines
        .into_iter()
        .map(|(name, amount, item_type)| BudgetItem {
            id: BudgetItemId::new(),
            fiscal_year_id: fiscal_year.id,
            name: name.to_string(),
            budgeted_amount: Decimal::new(amount, 0),
            item_type,
        })
        .collect();

    Fixture {
        fiscal_year,
        budget_items,
    }
}
