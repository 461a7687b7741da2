//! Integration tests for the valstream simulation core.
//!
//! These tests run whole value streams through `ValueStream::run` and check
//! inventories, ledgers, summaries and the run record together.

use valstream_core::catalog::{CatalogBuilder, CatalogError};
use valstream_core::fixed::{Quantity, qty};
use valstream_core::inventory::Inventory;
use valstream_core::ledger::{EntryKind, LedgerEvent};
use valstream_core::line::{LineError, Sourcing, SourcingStrategy};
use valstream_core::market::{Market, MarketError, Price};
use valstream_core::stream::{RunReport, StreamError, StreamSpec, ValueStream};
use valstream_core::test_utils::*;
use valstream_core::workforce::MIN_EFFICIENCY;

fn run(spec: StreamSpec, inventory: Inventory, run_days: u64, sourcing: Sourcing) -> RunReport {
    let catalog = test_catalog();
    ValueStream::new(&catalog, spec, inventory, test_market(), run_config(days(run_days), sourcing))
        .unwrap()
        .run()
        .unwrap()
}

fn input_market() -> Sourcing {
    Sourcing {
        inputs: SourcingStrategy::Market,
        ..Sourcing::default()
    }
}

// ===========================================================================
// End to end
// ===========================================================================
//
// 10 RAW -> 1 FIN in 24h, RAW 100, two days. The batch started at
// construction finishes at minute 1440 and the next one starts at once; that
// one finishes on the flush tick, which starts nothing.

#[test]
fn two_day_run_produces_two_batches() {
    let report = run(fin_stream(), raw_inventory(100.0), 2, Sourcing::default());

    assert_eq!(report.end_inventory.count("FIN"), qty(2.0));
    assert_eq!(report.end_inventory.count("RAW"), qty(80.0));
    assert_eq!(report.net_inventory.change("RAW"), qty(-20.0));
    assert_eq!(report.net_inventory.change("FIN"), qty(2.0));
    assert_eq!(report.start_inventory.count("RAW"), qty(100.0));

    assert_eq!(report.summary.production["FIN"].count, qty(2.0));
    assert_eq!(report.summary.consumption["RAW"].count, qty(-20.0));
    assert_eq!(report.summary.total_cycles, 2880);
    assert_eq!(report.summary.active_cycles, 2879);
}

#[test]
fn run_record_fingerprints_lines() {
    let mut spec = fin_stream();
    spec.lines.push(line_spec("BIT", FAB, PLAIN_SITE, 3, &[(BIT_RECIPE, 1)]));
    let report = run(spec, raw_inventory(500.0), 1, Sourcing::default());

    assert_eq!(report.record.fingerprint, "1xFAB-3xFAB");
    assert_eq!(report.record.stream_id, "TEST.RUN");
    assert_eq!(report.record.config_date, "2026-10-16");
    assert_eq!(report.lines.len(), 2);
    assert_eq!(report.lines[1].identity, "3xFAB");
}

#[test]
fn run_record_net_is_average_gain() {
    let report = run(fin_stream(), raw_inventory(100.0), 2, Sourcing::default());
    // 2 FIN at 15.0 less 20 RAW at 1.0.
    assert_eq!(report.record.net, 10.0);
    assert_eq!(report.record.e_start, 1.0);
    assert_eq!(report.record.e_delta, 0.0);
}

#[test]
fn inventory_valuations_cover_start_end_and_net() {
    let report = run(fin_stream(), raw_inventory(100.0), 2, Sourcing::default());
    assert_eq!(report.start_value.total.avg, Some(100.0));
    assert_eq!(report.end_value.total.avg, Some(110.0));
    assert_eq!(report.net_value.total.avg, Some(10.0));
}

// ===========================================================================
// Input sourcing
// ===========================================================================

#[test]
fn market_sourcing_buys_shortfall_on_first_start() {
    let report = run(fin_stream(), raw_inventory(5.0), 2, input_market());

    let purchases: Vec<_> = report
        .ledger
        .entries()
        .iter()
        .filter(|e| e.kind() == EntryKind::PurchaseInput)
        .collect();
    assert_eq!(purchases[0].minute, 0);
    assert_eq!(
        purchases[0].event,
        LedgerEvent::PurchaseInput {
            product: "RAW".into(),
            count: qty(5.0),
            need: qty(10.0),
            available: qty(5.0),
            bnum: 0,
        }
    );
    assert_eq!(report.summary.purchases["RAW"].count, qty(15.0));
    assert_eq!(report.end_inventory.count("FIN"), qty(2.0));
    assert_eq!(report.end_inventory.count("RAW"), Quantity::ZERO);
}

#[test]
fn inventory_only_reports_starvation_at_construction_once() {
    let report = run(fin_stream(), raw_inventory(5.0), 3, Sourcing::default());

    assert_eq!(report.ledger.count_of(EntryKind::MissingInput), 1);
    assert_eq!(report.summary.active_cycles, 0);
    assert_eq!(report.end_inventory.count("RAW"), qty(5.0));
    assert_eq!(
        report.summary.missing_inputs,
        vec!["00 00:00:00 FIN.0 missing 5.00 RAW (need 10.00 have 5.00)".to_string()]
    );
}

#[test]
fn inventory_only_reports_starvation_after_last_batch() {
    let report = run(fin_stream(), raw_inventory(15.0), 3, Sourcing::default());

    let missing: Vec<_> = report
        .ledger
        .entries()
        .iter()
        .filter(|e| e.kind() == EntryKind::MissingInput)
        .collect();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].minute, 1440);
    assert_eq!(report.end_inventory.count("FIN"), qty(1.0));
}

// MINE turns 4 H2O into 10 RAW every 36h; FIN needs 10 RAW a day. FIN runs
// 0..1440, starves, restarts when MINE delivers at 2160, and starves again
// at 3600. MINE's last batch completes on the flush tick, so it never starves.
#[test]
fn inventory_only_reports_each_starvation_transition() {
    let mut builder = CatalogBuilder::new();
    builder
        .register_building(building(FAB, None, 10))
        .register_recipe(recipe("RAW.1", FAB, &[("H2O", 4.0)], &[("RAW", 10.0)], hours(36)))
        .register_recipe(recipe(FIN_RECIPE, FAB, &[("RAW", 10.0)], &[("FIN", 1.0)], hours(24)))
        .register_site(site(PLAIN_SITE, vec![]));
    let catalog = builder.build().unwrap();

    let spec = StreamSpec {
        description: "bursty supply".into(),
        lines: vec![
            line_spec("MINE", FAB, PLAIN_SITE, 1, &[("RAW.1", 1)]),
            line_spec("FIN", FAB, PLAIN_SITE, 1, &[(FIN_RECIPE, 1)]),
        ],
    };
    let inventory = Inventory::from_counts([("RAW", qty(10.0)), ("H2O", qty(8.0))]);
    let report = ValueStream::new(&catalog, spec, inventory, test_market(), run_config(days(3), Sourcing::default()))
        .unwrap()
        .run()
        .unwrap();

    let minutes: Vec<u64> = report.lines[1]
        .ledger
        .entries()
        .iter()
        .filter(|e| e.kind() == EntryKind::MissingInput)
        .map(|e| e.minute)
        .collect();
    assert_eq!(minutes, vec![1440, 3600]);
    assert_eq!(report.lines[0].ledger.count_of(EntryKind::MissingInput), 0);
    assert_eq!(report.ledger.count_of(EntryKind::MissingInput), 2);
    assert_eq!(report.summary.missing_inputs.len(), 2);

    assert_eq!(report.end_inventory.count("FIN"), qty(2.0));
    assert_eq!(report.end_inventory.count("RAW"), qty(10.0));
    assert_eq!(report.end_inventory.count("H2O"), Quantity::ZERO);
}

#[test]
fn earlier_lines_win_contention() {
    let spec = StreamSpec {
        description: "contention".into(),
        lines: vec![
            line_spec("A", FAB, PLAIN_SITE, 1, &[(FIN_RECIPE, 1)]),
            line_spec("B", FAB, PLAIN_SITE, 1, &[(FIN_RECIPE, 1)]),
        ],
    };
    let report = run(spec, raw_inventory(15.0), 1, Sourcing::default());

    assert_eq!(report.lines[0].summary.production["FIN"].count, qty(1.0));
    assert!(report.lines[1].summary.production.is_empty());
    assert_eq!(report.lines[1].ledger.count_of(EntryKind::MissingInput), 1);
}

// ===========================================================================
// Workers
// ===========================================================================

#[test]
fn unsupplied_workers_run_at_the_floor() {
    let mut spec = fin_stream();
    spec.lines[0].site = FED_SITE.into();
    let report = run(spec, raw_inventory(100.0), 2, Sourcing::default());

    let efficiency = report.summary.efficiency.unwrap();
    assert_eq!(efficiency.start, MIN_EFFICIENCY);
    assert_eq!(efficiency.min, MIN_EFFICIENCY);
    // 24h at 0.33 takes longer than the run.
    assert!(report.summary.production.is_empty());
    assert_eq!(report.summary.missing_supplies.len(), 4);
}

#[test]
fn workers_are_resupplied_daily() {
    let mut spec = fin_stream();
    spec.lines[0].site = FED_SITE.into();
    let inventory = Inventory::from_counts([("RAW", qty(100.0)), ("RAT", qty(10.0)), ("DW", qty(10.0))]);
    let report = run(spec, inventory, 2, Sourcing::default());

    // 10 pioneers need 0.4 RAT a day; resupply at construction and minute 1440.
    let daily = qty(4.0 / 100.0 * 10.0);
    assert_eq!(report.end_inventory.count("RAT"), qty(10.0) - daily - daily);
    assert_eq!(report.ledger.count_of(EntryKind::Efficiency), 2);
    assert_eq!(report.summary.efficiency.unwrap().mean, 1.0);
    assert_eq!(report.end_inventory.count("FIN"), qty(2.0));
}

#[test]
fn supply_purchases_feed_workers() {
    let mut spec = fin_stream();
    spec.lines[0].site = FED_SITE.into();
    let report = run(spec, raw_inventory(100.0), 1, Sourcing::uniform(SourcingStrategy::Market));

    assert_eq!(report.ledger.count_of(EntryKind::PurchaseSupply), 2);
    assert_eq!(report.summary.efficiency.unwrap().start, 1.0);
    assert!(report.summary.missing_supplies[0].contains("purchased 0.40 RAT"));
}

// ===========================================================================
// Summaries
// ===========================================================================

#[test]
fn summarize_is_idempotent() {
    let report = run(fin_stream(), raw_inventory(100.0), 2, Sourcing::default());
    let market = test_market();
    let first = report.ledger.summarize(&market).unwrap();
    let second = report.ledger.summarize(&market).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, report.summary);
}

/// Flows are valued at the prices handed to `summarize`, not at the prices
/// in force when the flow happened.
#[test]
fn ledger_values_flows_at_report_time_prices() {
    let report = run(fin_stream(), raw_inventory(100.0), 2, Sourcing::default());
    assert_eq!(report.summary.production_value.avg, Some(30.0));

    let repriced = Market::from_prices(
        "CI1",
        [
            ("RAW".to_string(), Price::new(1.0, 1.0, 1.0, 1.0)),
            ("FIN".to_string(), Price::new(30.0, 30.0, 30.0, 30.0)),
        ],
    );
    let later = report.ledger.summarize(&repriced).unwrap();
    assert_eq!(later.production_value.avg, Some(60.0));
    assert_eq!(later.gain_loss.avg, Some(40.0));
}

// ===========================================================================
// Construction errors
// ===========================================================================

#[test]
fn missing_price_rejected_before_running() {
    let catalog = test_catalog();
    let market = Market::from_prices("CI1", [("RAW".to_string(), Price::new(1.0, 1.0, 1.0, 1.0))]);
    let err = ValueStream::new(
        &catalog,
        fin_stream(),
        raw_inventory(100.0),
        market,
        run_config(days(1), Sourcing::default()),
    )
    .err()
    .unwrap();
    assert_eq!(err, StreamError::Market(MarketError::PriceNotFound("FIN".into())));
}

#[test]
fn unknown_recipe_fails_the_run() {
    let catalog = test_catalog();
    let mut spec = fin_stream();
    spec.lines[0].queue[0].recipe = "NOPE".into();
    let stream = ValueStream::new(
        &catalog,
        spec,
        raw_inventory(100.0),
        test_market(),
        run_config(days(1), Sourcing::default()),
    )
    .unwrap();
    assert_eq!(
        stream.run().unwrap_err(),
        StreamError::Line(LineError::Catalog(CatalogError::UnknownRecipe("NOPE".into())))
    );
}
