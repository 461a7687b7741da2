//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use std::collections::BTreeMap;

use crate::catalog::*;
use crate::clock::Duration;
use crate::fixed::qty;
use crate::inventory::Inventory;
use crate::line::{LineSpec, QueueEntry, Sourcing};
use crate::market::{Market, Price};
use crate::stream::{RunConfig, StreamSpec};

// ===========================================================================
// Names
// ===========================================================================

/// Site whose workers have no needs.
pub const PLAIN_SITE: &str = "PLAIN";
/// Site whose pioneers need RAT (essential) and DW (non-essential).
pub const FED_SITE: &str = "FED";
/// Fabricator building: 10 pioneers, no expertise.
pub const FAB: &str = "FAB";
/// Farm building: 20 pioneers, agriculture.
pub const FRM: &str = "FRM";

/// 10 RAW -> 1 FIN in 24h.
pub const FIN_RECIPE: &str = "FIN.1";
/// 2 RAW -> 1 BIT in 12h.
pub const BIT_RECIPE: &str = "BIT.1";
/// 4 H2O -> 6 GRN in 18h.
pub const GRN_RECIPE: &str = "GRN.1";

// ===========================================================================
// Time
// ===========================================================================

pub fn days(n: u64) -> Duration {
    Duration::from_components(n, 0, 0, 0)
}

pub fn hours(n: u64) -> Duration {
    Duration::from_components(0, n, 0, 0)
}

// ===========================================================================
// Catalog
// ===========================================================================

pub fn recipe(id: &str, line: &str, inputs: &[(&str, f64)], outputs: &[(&str, f64)], time: Duration) -> RecipeDef {
    fn counts(items: &[(&str, f64)]) -> Vec<MaterialCount> {
        items
            .iter()
            .map(|&(ticker, count)| MaterialCount::new(ticker, qty(count)))
            .collect()
    }
    RecipeDef {
        id: id.to_string(),
        line: line.to_string(),
        inputs: counts(inputs),
        outputs: counts(outputs),
        time,
    }
}

pub fn building(ticker: &str, expertise: Option<&str>, pioneers: u32) -> BuildingDef {
    BuildingDef {
        ticker: ticker.to_string(),
        kind: "PRODUCTION".to_string(),
        area: 25,
        expertise: expertise.map(str::to_string),
        workers: vec![WorkerSlot {
            worker_type: "PIONEER".to_string(),
            count: pioneers,
        }],
        reclaimable: BTreeMap::new(),
    }
}

pub fn site(name: &str, pioneer_needs: Vec<Need>) -> SiteDef {
    SiteDef {
        name: name.to_string(),
        workers: BTreeMap::from([(
            "PIONEER".to_string(),
            WorkerProfile {
                efficiency: 0.7,
                needs: pioneer_needs,
            },
        )]),
        experts: BTreeMap::new(),
        soil_fertility: 0.0,
        cogc_program: None,
    }
}

/// Needs per 100 pioneers per day.
pub fn pioneer_needs() -> Vec<Need> {
    vec![
        Need {
            ticker: "RAT".to_string(),
            rate: 4.0,
            basis: 100.0,
            essential: true,
        },
        Need {
            ticker: "DW".to_string(),
            rate: 4.0,
            basis: 100.0,
            essential: false,
        },
    ]
}

/// Catalog with the FAB/FRM buildings, three recipes and both test sites.
pub fn test_catalog() -> Catalog {
    let mut builder = CatalogBuilder::new();
    builder
        .register_building(building(FAB, None, 10))
        .register_building(building(FRM, Some("AGRICULTURE"), 20))
        .register_recipe(recipe(FIN_RECIPE, FAB, &[("RAW", 10.0)], &[("FIN", 1.0)], hours(24)))
        .register_recipe(recipe(BIT_RECIPE, FAB, &[("RAW", 2.0)], &[("BIT", 1.0)], hours(12)))
        .register_recipe(recipe(GRN_RECIPE, FRM, &[("H2O", 4.0)], &[("GRN", 6.0)], hours(18)))
        .register_site(site(PLAIN_SITE, vec![]))
        .register_site(site(FED_SITE, pioneer_needs()));
    match builder.build() {
        Ok(catalog) => catalog,
        Err(e) => panic!("test catalog is invalid: {e}"),
    }
}

// ===========================================================================
// Market
// ===========================================================================

pub fn test_market() -> Market {
    Market::from_prices(
        "CI1",
        [
            ("RAW".to_string(), Price::new(1.0, 1.1, 0.9, 1.0)),
            ("FIN".to_string(), Price::new(15.0, 16.0, 14.0, 15.0)),
            ("BIT".to_string(), Price::new(3.0, 3.0, 3.0, 3.0)),
            ("H2O".to_string(), Price::new(0.5, 0.5, 0.5, 0.5)),
            ("GRN".to_string(), Price::new(1.5, 1.5, 1.5, 1.5)),
            ("RAT".to_string(), Price::new(2.0, 2.0, 2.0, 2.0)),
            ("DW".to_string(), Price::new(1.0, 1.0, 1.0, 1.0)),
        ],
    )
}

// ===========================================================================
// Streams
// ===========================================================================

pub fn line_spec(id: &str, line_type: &str, site: &str, building_count: u32, queue: &[(&str, u32)]) -> LineSpec {
    LineSpec {
        id: id.to_string(),
        line_type: line_type.to_string(),
        site: site.to_string(),
        building_count,
        condition: 1.0,
        queue: queue
            .iter()
            .map(|&(recipe, count)| QueueEntry {
                recipe: recipe.to_string(),
                count,
            })
            .collect(),
    }
}

/// One FAB making FIN at the plain site.
pub fn fin_stream() -> StreamSpec {
    StreamSpec {
        description: "single fabricator".to_string(),
        lines: vec![line_spec("FIN", FAB, PLAIN_SITE, 1, &[(FIN_RECIPE, 1)])],
    }
}

pub fn raw_inventory(count: f64) -> Inventory {
    Inventory::from_counts([("RAW", qty(count))])
}

pub fn run_config(duration: Duration, sourcing: Sourcing) -> RunConfig {
    RunConfig::new("TEST.RUN", duration)
        .with_sourcing(sourcing)
        .with_config_date("2026-10-16")
}
