//! The value stream: every production line of a run sharing one inventory
//! and one market, driven by a single master clock.
//!
//! # Run order
//!
//! 1. Snapshot the starting inventory.
//! 2. Construct each line in declaration order (this may already consume
//!    worker supplies and batch inputs).
//! 3. `while clock.step()` step every line in declaration order. Earlier
//!    lines win contention for inventory within a tick.
//! 4. One flush tick that finishes batches but starts nothing.
//! 5. Merge the line ledgers and summarize everything against the market.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::info;

use crate::catalog::Catalog;
use crate::clock::{Duration, IncrClock};
use crate::inventory::{Inventory, InventoryDiff, Valuation};
use crate::ledger::{Ledger, LedgerSummary, RunRecord};
use crate::line::{LineError, LineSpec, ProductionLine, Sourcing};
use crate::market::{Market, MarketError};

/// Line id of the merged ledger.
pub const TOTALS_LINE_ID: &str = "RUN.TOTALS";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StreamError {
    #[error(transparent)]
    Line(#[from] LineError),
    #[error(transparent)]
    Market(#[from] MarketError),
}

/// The set of production lines making up a value stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamSpec {
    pub description: String,
    pub lines: Vec<LineSpec>,
}

/// Per-run settings that are not part of the stream itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub stream_id: String,
    pub duration: Duration,
    pub sourcing: Sourcing,
    /// Date the run's input files were resolved for, recorded in the run log.
    pub config_date: String,
}

impl RunConfig {
    pub fn new(stream_id: impl Into<String>, duration: Duration) -> Self {
        Self {
            stream_id: stream_id.into(),
            duration,
            sourcing: Sourcing::default(),
            config_date: String::new(),
        }
    }

    pub fn with_sourcing(mut self, sourcing: Sourcing) -> Self {
        self.sourcing = sourcing;
        self
    }

    pub fn with_config_date(mut self, date: impl Into<String>) -> Self {
        self.config_date = date.into();
        self
    }
}

/// Summary of one line after the run.
#[derive(Debug, Clone, Serialize)]
pub struct LineReport {
    pub id: String,
    pub identity: String,
    pub summary: LedgerSummary,
    #[serde(skip)]
    pub ledger: Ledger,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub stream_id: String,
    pub description: String,
    pub duration: String,
    pub summary: LedgerSummary,
    pub lines: Vec<LineReport>,
    pub start_inventory: Inventory,
    pub end_inventory: Inventory,
    pub net_inventory: InventoryDiff,
    pub start_value: Valuation,
    pub end_value: Valuation,
    pub net_value: Valuation,
    pub record: RunRecord,
    #[serde(skip)]
    pub ledger: Ledger,
}

pub struct ValueStream<'a> {
    catalog: &'a Catalog,
    spec: StreamSpec,
    inventory: Inventory,
    market: Market,
    config: RunConfig,
}

impl<'a> ValueStream<'a> {
    /// Set up a run. Fails if any material the run can touch has no price,
    /// so a long simulation never dies at report time.
    pub fn new(
        catalog: &'a Catalog,
        spec: StreamSpec,
        inventory: Inventory,
        market: Market,
        config: RunConfig,
    ) -> Result<Self, StreamError> {
        for ticker in referenced_tickers(catalog, &spec, &inventory) {
            market.price(&ticker)?;
        }
        Ok(Self {
            catalog,
            spec,
            inventory,
            market,
            config,
        })
    }

    /// Run the simulation to completion and summarize it.
    pub fn run(mut self) -> Result<RunReport, StreamError> {
        let stream_id = self.config.stream_id.clone();
        let mut clock = IncrClock::new(self.config.duration);
        let start_inventory = self.inventory.clone();

        let mut lines = Vec::with_capacity(self.spec.lines.len());
        for spec in &self.spec.lines {
            lines.push(ProductionLine::new(
                self.catalog,
                spec,
                &stream_id,
                self.config.sourcing,
                &clock,
                &mut self.inventory,
            )?);
        }

        info!(
            stream_id = %stream_id,
            description = %self.spec.description,
            lines = lines.len(),
            duration = %self.config.duration,
            "value stream run started"
        );

        while clock.step() {
            for line in &mut lines {
                line.step(&clock, &mut self.inventory)?;
            }
        }
        for line in &mut lines {
            line.flush(&clock, &mut self.inventory);
        }

        info!(stream_id = %stream_id, clock = %clock, "value stream run complete");
        self.report(lines, start_inventory)
    }

    fn report(self, lines: Vec<ProductionLine>, start_inventory: Inventory) -> Result<RunReport, StreamError> {
        let mut ledger = Ledger::aggregate(&self.config.stream_id, TOTALS_LINE_ID);
        let mut identities = Vec::with_capacity(lines.len());
        let mut line_reports = Vec::with_capacity(lines.len());

        for line in lines {
            ledger.add_ledger(line.ledger());
            identities.push(line.identity());
            let summary = line.ledger().summarize(&self.market)?;
            line_reports.push(LineReport {
                id: line.id().to_string(),
                identity: line.identity(),
                summary,
                ledger: line.into_ledger(),
            });
        }

        let summary = ledger.summarize(&self.market)?;
        let fingerprint = identities.join("-");
        let record = ledger.run_record(&summary, &fingerprint, &self.config.config_date);

        let end_inventory = self.inventory;
        let net_inventory = end_inventory.diff(&start_inventory);
        let start_value = start_inventory.valuate(&self.market)?;
        let end_value = end_inventory.valuate(&self.market)?;
        let net_value = net_inventory.valuate(&self.market)?;

        info!(
            stream_id = %self.config.stream_id,
            net = record.net,
            uptime = record.uptime,
            fingerprint = %fingerprint,
            "value stream summarized"
        );

        Ok(RunReport {
            stream_id: self.config.stream_id,
            description: self.spec.description,
            duration: self.config.duration.to_string(),
            summary,
            lines: line_reports,
            start_inventory,
            end_inventory,
            net_inventory,
            start_value,
            end_value,
            net_value,
            record,
            ledger,
        })
    }
}

/// Every ticker a run may value: recipe inputs and outputs, worker needs of
/// the lines' buildings at their sites, and the starting inventory. Entries
/// the catalog cannot resolve are skipped here and rejected when the line is
/// constructed.
fn referenced_tickers(catalog: &Catalog, spec: &StreamSpec, inventory: &Inventory) -> BTreeSet<String> {
    let mut tickers: BTreeSet<String> = inventory.tickers().map(str::to_string).collect();
    for line in &spec.lines {
        for entry in &line.queue {
            if let Ok(recipe) = catalog.recipe(&entry.recipe) {
                let flows = recipe.inputs.iter().chain(&recipe.outputs);
                tickers.extend(flows.map(|m| m.ticker.clone()));
            }
        }
        if let Ok(building) = catalog.building(&line.line_type) {
            for slot in &building.workers {
                if let Ok(profile) = catalog.worker_profile(&line.site, &slot.worker_type) {
                    tickers.extend(profile.needs.iter().map(|n| n.ticker.clone()));
                }
            }
        }
    }
    tickers
}
