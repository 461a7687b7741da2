//! Append-only production ledgers and their summaries.
//!
//! Every production line writes its own [`Ledger`]. At the end of a run the
//! line ledgers are merged into one aggregate with [`Ledger::add_ledger`] and
//! each ledger is reduced to a [`LedgerSummary`] in a single pass.
//!
//! Material flows are valued at the market prices passed to
//! [`Ledger::summarize`], not at the prices in force when the flow happened.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::clock::IncrClock;
use crate::fixed::{Quantity, qty_to_f64, serde_qty};
use crate::inventory::MaterialValue;
use crate::market::{Market, MarketError, Price};

// ---------------------------------------------------------------------------
// Entry types
// ---------------------------------------------------------------------------

/// Typed payload of a ledger entry, one variant per entry kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEvent {
    /// Material consumed from inventory, by a batch (`bnum` set) or by
    /// worker resupply (`bnum` absent).
    Input {
        product: String,
        #[serde(serialize_with = "serde_qty::serialize")]
        count: Quantity,
        #[serde(skip_serializing_if = "Option::is_none")]
        bnum: Option<usize>,
    },
    Output {
        product: String,
        #[serde(serialize_with = "serde_qty::serialize")]
        count: Quantity,
        bnum: usize,
    },
    Status {
        active: bool,
    },
    Efficiency {
        value: f64,
    },
    MissingInput {
        ticker: String,
        #[serde(serialize_with = "serde_qty::serialize")]
        count: Quantity,
        #[serde(serialize_with = "serde_qty::serialize")]
        need: Quantity,
        #[serde(serialize_with = "serde_qty::serialize")]
        available: Quantity,
        bnum: usize,
    },
    MissingSupply {
        ticker: String,
        #[serde(serialize_with = "serde_qty::serialize")]
        count: Quantity,
        #[serde(serialize_with = "serde_qty::serialize")]
        need: Quantity,
        #[serde(serialize_with = "serde_qty::serialize")]
        available: Quantity,
    },
    PurchaseInput {
        product: String,
        #[serde(serialize_with = "serde_qty::serialize")]
        count: Quantity,
        #[serde(serialize_with = "serde_qty::serialize")]
        need: Quantity,
        #[serde(serialize_with = "serde_qty::serialize")]
        available: Quantity,
        bnum: usize,
    },
    PurchaseSupply {
        product: String,
        #[serde(serialize_with = "serde_qty::serialize")]
        count: Quantity,
        #[serde(serialize_with = "serde_qty::serialize")]
        need: Quantity,
        #[serde(serialize_with = "serde_qty::serialize")]
        available: Quantity,
    },
}

/// Discriminant tag for ledger events, used for filtering and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryKind {
    Input,
    Output,
    Status,
    Efficiency,
    MissingInput,
    MissingSupply,
    PurchaseInput,
    PurchaseSupply,
}

impl LedgerEvent {
    pub fn kind(&self) -> EntryKind {
        match self {
            LedgerEvent::Input { .. } => EntryKind::Input,
            LedgerEvent::Output { .. } => EntryKind::Output,
            LedgerEvent::Status { .. } => EntryKind::Status,
            LedgerEvent::Efficiency { .. } => EntryKind::Efficiency,
            LedgerEvent::MissingInput { .. } => EntryKind::MissingInput,
            LedgerEvent::MissingSupply { .. } => EntryKind::MissingSupply,
            LedgerEvent::PurchaseInput { .. } => EntryKind::PurchaseInput,
            LedgerEvent::PurchaseSupply { .. } => EntryKind::PurchaseSupply,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::Input => "INPUT",
            EntryKind::Output => "OUTPUT",
            EntryKind::Status => "STATUS",
            EntryKind::Efficiency => "EFFICIENCY",
            EntryKind::MissingInput => "MISSING_INPUT",
            EntryKind::MissingSupply => "MISSING_SUPPLY",
            EntryKind::PurchaseInput => "PURCHASE_INPUT",
            EntryKind::PurchaseSupply => "PURCHASE_SUPPLY",
        };
        f.write_str(name)
    }
}

/// One ledger record. `minute` orders entries; `clock` is for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub minute: u64,
    pub clock: String,
    pub line: String,
    pub description: String,
    #[serde(flatten)]
    pub event: LedgerEvent,
}

impl LedgerEntry {
    pub fn kind(&self) -> EntryKind {
        self.event.kind()
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ledger {
    stream_id: String,
    line_id: String,
    line_type: Option<String>,
    building_count: Option<u32>,
    entries: Vec<LedgerEntry>,
    start_efficiency: Option<f64>,
    end_efficiency: Option<f64>,
}

impl Ledger {
    /// Ledger for a single production line.
    pub fn for_line(stream_id: &str, line_id: &str, line_type: &str, building_count: u32) -> Self {
        Self {
            stream_id: stream_id.to_string(),
            line_id: line_id.to_string(),
            line_type: Some(line_type.to_string()),
            building_count: Some(building_count),
            entries: Vec::new(),
            start_efficiency: None,
            end_efficiency: None,
        }
    }

    /// Empty aggregate ledger that line ledgers are merged into.
    pub fn aggregate(stream_id: &str, line_id: &str) -> Self {
        Self {
            stream_id: stream_id.to_string(),
            line_id: line_id.to_string(),
            line_type: None,
            building_count: None,
            entries: Vec::new(),
            start_efficiency: None,
            end_efficiency: None,
        }
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn line_id(&self) -> &str {
        &self.line_id
    }

    pub fn line_type(&self) -> Option<&str> {
        self.line_type.as_deref()
    }

    pub fn building_count(&self) -> Option<u32> {
        self.building_count
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn start_efficiency(&self) -> Option<f64> {
        self.start_efficiency
    }

    pub fn end_efficiency(&self) -> Option<f64> {
        self.end_efficiency
    }

    /// Number of entries of the given kind.
    pub fn count_of(&self, kind: EntryKind) -> usize {
        self.entries.iter().filter(|e| e.kind() == kind).count()
    }

    /// Append an entry stamped with the clock's current minute.
    pub fn add(&mut self, clock: &IncrClock, event: LedgerEvent, description: impl Into<String>) {
        if let LedgerEvent::Efficiency { value } = event {
            if self.start_efficiency.is_none() {
                self.start_efficiency = Some(value);
            }
            self.end_efficiency = Some(value);
        }
        self.entries.push(LedgerEntry {
            minute: clock.to_minutes(),
            clock: clock.to_string(),
            line: self.line_id.clone(),
            description: description.into(),
            event,
        });
    }

    /// Append all of `other`'s entries. Efficiency bookends are kept when
    /// only one side has them and averaged when both do.
    pub fn add_ledger(&mut self, other: &Ledger) {
        self.start_efficiency = merge_bookend(self.start_efficiency, other.start_efficiency);
        self.end_efficiency = merge_bookend(self.end_efficiency, other.end_efficiency);
        self.entries.extend(other.entries.iter().cloned());
    }

    /// Reduce the ledger to aggregate figures in one pass over its entries.
    ///
    /// Fails if a flow references a ticker the market cannot price.
    pub fn summarize(&self, market: &Market) -> Result<LedgerSummary, MarketError> {
        let mut summary = LedgerSummary::default();
        let mut efficiencies = Vec::new();

        for entry in &self.entries {
            match &entry.event {
                LedgerEvent::Status { active } => {
                    summary.total_cycles += 1;
                    if *active {
                        summary.active_cycles += 1;
                    }
                }
                LedgerEvent::Efficiency { value } => efficiencies.push(*value),
                LedgerEvent::Output { product, count, .. } => {
                    let value = market.value_of(product, qty_to_f64(*count))?;
                    summary.production_value = summary.production_value.add(&value);
                    accumulate(&mut summary.production, product, *count, &value);
                    accumulate(&mut summary.net_production, product, *count, &value);
                }
                LedgerEvent::Input { product, count, .. } => {
                    let consumed = -*count;
                    let value = market.value_of(product, qty_to_f64(consumed))?;
                    summary.production_cost = summary.production_cost.add(&value);
                    accumulate(&mut summary.consumption, product, consumed, &value);
                    accumulate(&mut summary.net_production, product, consumed, &value);
                }
                LedgerEvent::PurchaseInput {
                    product,
                    count,
                    need,
                    available,
                    bnum,
                } => {
                    let value = market.value_of(product, qty_to_f64(*count))?;
                    summary.purchase_cost = summary.purchase_cost.add(&value);
                    accumulate(&mut summary.purchases, product, *count, &value);
                    summary.missing_inputs.push(format!(
                        "{} {}.{} purchased {:.2} {} (need {:.2} have {:.2})",
                        entry.clock,
                        entry.line,
                        bnum,
                        qty_to_f64(*count),
                        product,
                        qty_to_f64(*need),
                        qty_to_f64(*available),
                    ));
                }
                LedgerEvent::PurchaseSupply {
                    product,
                    count,
                    need,
                    available,
                } => {
                    let value = market.value_of(product, qty_to_f64(*count))?;
                    summary.purchase_cost = summary.purchase_cost.add(&value);
                    accumulate(&mut summary.purchases, product, *count, &value);
                    summary.missing_supplies.push(format!(
                        "{} {} purchased {:.2} {} (need {:.2} have {:.2})",
                        entry.clock,
                        entry.line,
                        qty_to_f64(*count),
                        product,
                        qty_to_f64(*need),
                        qty_to_f64(*available),
                    ));
                }
                LedgerEvent::MissingInput {
                    ticker,
                    count,
                    need,
                    available,
                    bnum,
                } => {
                    summary.missing_inputs.push(format!(
                        "{} {}.{} missing {:.2} {} (need {:.2} have {:.2})",
                        entry.clock,
                        entry.line,
                        bnum,
                        qty_to_f64(*count),
                        ticker,
                        qty_to_f64(*need),
                        qty_to_f64(*available),
                    ));
                }
                LedgerEvent::MissingSupply {
                    ticker,
                    count,
                    need,
                    available,
                } => {
                    summary.missing_supplies.push(format!(
                        "{} {} missing {:.2} {} (need {:.2} have {:.2})",
                        entry.clock,
                        entry.line,
                        qty_to_f64(*count),
                        ticker,
                        qty_to_f64(*need),
                        qty_to_f64(*available),
                    ));
                }
            }
        }

        summary.uptime = if summary.total_cycles == 0 {
            0.0
        } else {
            summary.active_cycles as f64 / summary.total_cycles as f64
        };
        summary.efficiency = self.efficiency_stats(&efficiencies);
        summary.gain_loss = summary.production_value.add(&summary.production_cost);
        Ok(summary)
    }

    fn efficiency_stats(&self, values: &[f64]) -> Option<EfficiencyStats> {
        let (&first, &last) = (values.first()?, values.last()?);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let start = self.start_efficiency.unwrap_or(first);
        let end = self.end_efficiency.unwrap_or(last);
        Some(EfficiencyStats {
            min,
            mean,
            max,
            start,
            end,
            delta: end - start,
        })
    }

    /// Compact record of a summarized run for the append-only run log.
    pub fn run_record(&self, summary: &LedgerSummary, fingerprint: &str, config_date: &str) -> RunRecord {
        let (e_start, e_end, e_delta) = summary
            .efficiency
            .as_ref()
            .map(|e| (e.start, e.end, e.delta))
            .unwrap_or((0.0, 0.0, 0.0));
        RunRecord {
            net: summary.gain_loss.avg_or_zero(),
            uptime: summary.uptime,
            e_start,
            e_end,
            e_delta,
            fingerprint: fingerprint.to_string(),
            config_date: config_date.to_string(),
            stream_id: self.stream_id.clone(),
        }
    }
}

fn merge_bookend(ours: Option<f64>, theirs: Option<f64>) -> Option<f64> {
    match (ours, theirs) {
        (Some(a), Some(b)) => Some((a + b) / 2.0),
        (a, b) => a.or(b),
    }
}

fn accumulate(
    table: &mut BTreeMap<String, MaterialValue>,
    ticker: &str,
    count: Quantity,
    value: &Price,
) {
    table
        .entry(ticker.to_string())
        .and_modify(|m| {
            m.count += count;
            m.value = m.value.add(value);
        })
        .or_insert(MaterialValue {
            count,
            value: *value,
        });
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EfficiencyStats {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
    pub start: f64,
    pub end: f64,
    pub delta: f64,
}

/// Aggregate figures for one ledger.
///
/// Consumption counts and values are negative so that `net_production` is
/// the plain sum of production and consumption. `gain_loss` is production
/// value plus (negative) production cost; purchases are reported separately.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedgerSummary {
    pub total_cycles: u64,
    pub active_cycles: u64,
    pub uptime: f64,
    pub efficiency: Option<EfficiencyStats>,
    pub production: BTreeMap<String, MaterialValue>,
    pub consumption: BTreeMap<String, MaterialValue>,
    pub net_production: BTreeMap<String, MaterialValue>,
    pub purchases: BTreeMap<String, MaterialValue>,
    pub production_value: Price,
    pub production_cost: Price,
    pub purchase_cost: Price,
    pub gain_loss: Price,
    pub missing_inputs: Vec<String>,
    pub missing_supplies: Vec<String>,
}

/// One line of the run log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub net: f64,
    pub uptime: f64,
    pub e_start: f64,
    pub e_end: f64,
    pub e_delta: f64,
    pub fingerprint: String,
    pub config_date: String,
    pub stream_id: String,
}
