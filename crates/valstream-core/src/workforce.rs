//! Worker rosters, daily resupply and the line efficiency they produce.

use tracing::{debug, warn};

use crate::catalog::{BonusTables, BuildingDef, SiteDef, WorkerProfile};
use crate::clock::{DecrClock, Duration, IncrClock};
use crate::fixed::{Quantity, qty_to_f64};
use crate::inventory::{Inventory, InventoryError};
use crate::ledger::{Ledger, LedgerEvent};
use crate::line::SourcingStrategy;

/// Lowest efficiency a line can run at, however starved its workers are.
pub const MIN_EFFICIENCY: f64 = 0.33;

const AGRICULTURE: &str = "AGRICULTURE";

/// Fraction of a requirement that was met. A zero requirement is fully met.
pub fn category_ratio(acquired: f64, required: f64) -> f64 {
    if required <= 0.0 {
        1.0
    } else {
        acquired / required
    }
}

/// Efficiency of one worker type from its essential and non-essential supply
/// ratios. Non-essentials only count once essentials provide something.
pub fn worker_type_efficiency(base: f64, essential_ratio: f64, non_essential_ratio: f64) -> f64 {
    let essential = base * essential_ratio;
    if essential > 0.0 {
        essential + (1.0 - base) * non_essential_ratio
    } else {
        essential
    }
}

// ---------------------------------------------------------------------------
// Site bonuses
// ---------------------------------------------------------------------------

/// Multiplicative modifiers a site applies to a line's worker efficiency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiteBonuses {
    pub condition: f64,
    pub expert: f64,
    pub soil: f64,
    pub cogc: f64,
}

impl Default for SiteBonuses {
    fn default() -> Self {
        Self {
            condition: 1.0,
            expert: 0.0,
            soil: 0.0,
            cogc: 0.0,
        }
    }
}

impl SiteBonuses {
    /// Bonuses for `building` operating at `site`.
    pub fn resolve(tables: &BonusTables, site: &SiteDef, building: &BuildingDef, condition: f64) -> Self {
        let expertise = building.expertise.as_deref();

        let expert = match (expertise, tables.expert_factors.last()) {
            (Some(category), Some(_)) => {
                let experts = site.experts.get(category).copied().unwrap_or(0) as usize;
                let index = experts.min(tables.expert_factors.len() - 1);
                tables.expert_factors[index]
            }
            _ => 0.0,
        };

        let soil = if expertise == Some(AGRICULTURE) {
            site.soil_fertility
        } else {
            0.0
        };

        let cogc = site
            .cogc_program
            .as_deref()
            .and_then(|program| {
                if expertise == Some(program) {
                    tables.cogc_industry_bonus.get(program).copied()
                } else if building.workers.iter().any(|w| w.worker_type == program) {
                    tables.cogc_worker_bonus.get(program).copied()
                } else {
                    None
                }
            })
            .unwrap_or(0.0);

        Self {
            condition,
            expert,
            soil,
            cogc,
        }
    }

    pub fn multiplier(&self) -> f64 {
        self.condition * (1.0 + self.expert) * (1.0 + self.soil) * (1.0 + self.cogc)
    }
}

// ---------------------------------------------------------------------------
// Workforce
// ---------------------------------------------------------------------------

/// All workers of one type across every building of a line.
#[derive(Debug, Clone)]
pub struct WorkerGroup {
    pub worker_type: String,
    pub headcount: u32,
    pub profile: WorkerProfile,
}

/// How the essential and non-essential needs of a workforce are sourced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupplyStrategy {
    pub essentials: SourcingStrategy,
    pub non_essentials: SourcingStrategy,
}

#[derive(Debug, Default)]
struct CategoryTally {
    required: f64,
    acquired: f64,
}

impl CategoryTally {
    fn ratio(&self) -> f64 {
        category_ratio(self.acquired, self.required)
    }
}

/// The roster of a production line and the efficiency it currently earns.
#[derive(Debug, Clone)]
pub struct Workforce {
    groups: Vec<WorkerGroup>,
    bonuses: SiteBonuses,
    strategy: SupplyStrategy,
    resupply: DecrClock,
    efficiency: f64,
}

impl Workforce {
    /// Interval between worker resupplies.
    pub fn resupply_interval() -> Duration {
        Duration::from_components(0, 24, 0, 0)
    }

    pub fn new(groups: Vec<WorkerGroup>, bonuses: SiteBonuses, strategy: SupplyStrategy) -> Self {
        Self {
            groups,
            bonuses,
            strategy,
            resupply: DecrClock::new(Self::resupply_interval()),
            efficiency: MIN_EFFICIENCY,
        }
    }

    pub fn headcount(&self) -> u32 {
        self.groups.iter().map(|g| g.headcount).sum()
    }

    /// Efficiency established by the most recent resupply.
    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    /// Advance the resupply countdown. Returns `true` when a resupply is due,
    /// after rearming the countdown for the next interval.
    pub fn tick(&mut self) -> bool {
        if self.resupply.step() {
            return false;
        }
        self.resupply = DecrClock::new(Self::resupply_interval());
        true
    }

    /// Feed every worker group for one interval and recompute line efficiency.
    pub fn resupply(
        &mut self,
        clock: &IncrClock,
        inventory: &mut Inventory,
        ledger: &mut Ledger,
    ) -> Result<f64, InventoryError> {
        let mut total = 0.0;
        for group in &self.groups {
            total += supply_group(group, self.strategy, clock, inventory, ledger)?;
        }
        let worker_efficiency = if self.groups.is_empty() {
            0.0
        } else {
            total / self.groups.len() as f64
        };

        self.efficiency = (worker_efficiency * self.bonuses.multiplier()).max(MIN_EFFICIENCY);
        debug!(
            line = ledger.line_id(),
            worker_efficiency,
            efficiency = self.efficiency,
            "efficiency recomputed"
        );
        ledger.add(
            clock,
            LedgerEvent::Efficiency {
                value: self.efficiency,
            },
            format!("efficiency {:.2}%", self.efficiency * 100.0),
        );
        Ok(self.efficiency)
    }
}

fn supply_group(
    group: &WorkerGroup,
    strategy: SupplyStrategy,
    clock: &IncrClock,
    inventory: &mut Inventory,
    ledger: &mut Ledger,
) -> Result<f64, InventoryError> {
    let mut essentials = CategoryTally::default();
    let mut non_essentials = CategoryTally::default();

    for need in &group.profile.needs {
        let per_worker = need.rate / need.basis;
        if need.basis <= 0.0 || !per_worker.is_finite() {
            continue;
        }
        let required = Quantity::saturating_from_num(per_worker * f64::from(group.headcount));
        let sourcing = if need.essential {
            strategy.essentials
        } else {
            strategy.non_essentials
        };

        let mut available = inventory.count(&need.ticker);
        if available < required && sourcing == SourcingStrategy::Market {
            let purchased = required - available;
            inventory.add(need.ticker.as_str(), purchased);
            ledger.add(
                clock,
                LedgerEvent::PurchaseSupply {
                    product: need.ticker.clone(),
                    count: purchased,
                    need: required,
                    available,
                },
                format!("purchased {} {}", purchased, need.ticker),
            );
            available = required;
        }

        let consumed = required.min(available);
        if consumed > Quantity::ZERO {
            inventory.take(&need.ticker, consumed)?;
            ledger.add(
                clock,
                LedgerEvent::Input {
                    product: need.ticker.clone(),
                    count: consumed,
                    bnum: None,
                },
                format!("{} consumed {} {}", group.worker_type, consumed, need.ticker),
            );
        }
        if consumed < required {
            warn!(
                line = ledger.line_id(),
                ticker = %need.ticker,
                need = qty_to_f64(required),
                available = qty_to_f64(available),
                "worker supply short"
            );
            ledger.add(
                clock,
                LedgerEvent::MissingSupply {
                    ticker: need.ticker.clone(),
                    count: required - consumed,
                    need: required,
                    available,
                },
                format!("{} missing {} {}", group.worker_type, required - consumed, need.ticker),
            );
        }

        let tally = if need.essential {
            &mut essentials
        } else {
            &mut non_essentials
        };
        tally.required += qty_to_f64(required);
        tally.acquired += qty_to_f64(consumed);
    }

    Ok(worker_type_efficiency(
        group.profile.efficiency,
        essentials.ratio(),
        non_essentials.ratio(),
    ))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::catalog::{Need, WorkerSlot};
    use crate::fixed::qty;
    use crate::ledger::EntryKind;

    fn pioneers(needs: Vec<Need>) -> WorkerGroup {
        WorkerGroup {
            worker_type: "PIONEER".into(),
            headcount: 100,
            profile: WorkerProfile {
                efficiency: 0.7,
                needs,
            },
        }
    }

    fn need(ticker: &str, rate: f64, essential: bool) -> Need {
        Need {
            ticker: ticker.into(),
            rate,
            basis: 100.0,
            essential,
        }
    }

    fn building(expertise: Option<&str>) -> BuildingDef {
        BuildingDef {
            ticker: "FRM".into(),
            kind: "PRODUCTION".into(),
            area: 30,
            expertise: expertise.map(str::to_string),
            workers: vec![WorkerSlot {
                worker_type: "PIONEER".into(),
                count: 50,
            }],
            reclaimable: BTreeMap::new(),
        }
    }

    #[test]
    fn zero_requirement_counts_as_full_supply() {
        assert_eq!(category_ratio(0.0, 0.0), 1.0);
        assert_eq!(category_ratio(2.0, 4.0), 0.5);
    }

    #[test]
    fn non_essentials_need_essentials_first() {
        assert_eq!(worker_type_efficiency(0.7, 0.0, 1.0), 0.0);
        assert!((worker_type_efficiency(0.7, 1.0, 0.5) - 0.85).abs() < 1e-12);
        assert_eq!(worker_type_efficiency(0.7, 1.0, 1.0), 1.0);
    }

    #[test]
    fn starved_workers_hit_the_floor() {
        let mut workforce = Workforce::new(
            vec![pioneers(vec![need("RAT", 4.0, true)])],
            SiteBonuses::default(),
            SupplyStrategy::default(),
        );
        let clock = IncrClock::new(Duration::from_minutes(10));
        let mut inventory = Inventory::new();
        let mut ledger = Ledger::for_line("S1", "L1", "FRM", 2);

        let efficiency = workforce.resupply(&clock, &mut inventory, &mut ledger).unwrap();
        assert_eq!(efficiency, MIN_EFFICIENCY);
        assert_eq!(ledger.count_of(EntryKind::MissingSupply), 1);
        assert_eq!(ledger.count_of(EntryKind::Efficiency), 1);
    }

    #[test]
    fn oversized_requirement_saturates() {
        let mut workforce = Workforce::new(
            vec![pioneers(vec![need("RAT", 1e12, true)])],
            SiteBonuses::default(),
            SupplyStrategy::default(),
        );
        let clock = IncrClock::new(Duration::from_minutes(10));
        let mut inventory = Inventory::from_counts([("RAT", qty(10.0))]);
        let mut ledger = Ledger::for_line("S1", "L1", "FRM", 2);

        let efficiency = workforce.resupply(&clock, &mut inventory, &mut ledger).unwrap();
        assert_eq!(efficiency, MIN_EFFICIENCY);
        assert_eq!(inventory.count("RAT"), Quantity::ZERO);
        assert_eq!(ledger.count_of(EntryKind::MissingSupply), 1);
    }

    #[test]
    fn full_supply_consumes_and_reaches_full_efficiency() {
        let mut workforce = Workforce::new(
            vec![pioneers(vec![need("RAT", 4.0, true), need("DW", 4.0, false)])],
            SiteBonuses::default(),
            SupplyStrategy::default(),
        );
        let clock = IncrClock::new(Duration::from_minutes(10));
        let mut inventory = Inventory::from_counts([("RAT", qty(10.0)), ("DW", qty(10.0))]);
        let mut ledger = Ledger::for_line("S1", "L1", "FRM", 2);

        let efficiency = workforce.resupply(&clock, &mut inventory, &mut ledger).unwrap();
        assert_eq!(efficiency, 1.0);
        assert_eq!(inventory.count("RAT"), qty(6.0));
        assert_eq!(inventory.count("DW"), qty(6.0));
        assert_eq!(ledger.count_of(EntryKind::Input), 2);
    }

    #[test]
    fn market_strategy_buys_essential_shortfall() {
        let strategy = SupplyStrategy {
            essentials: SourcingStrategy::Market,
            non_essentials: SourcingStrategy::InventoryOnly,
        };
        let mut workforce = Workforce::new(
            vec![pioneers(vec![need("RAT", 4.0, true), need("DW", 4.0, false)])],
            SiteBonuses::default(),
            strategy,
        );
        let clock = IncrClock::new(Duration::from_minutes(10));
        let mut inventory = Inventory::from_counts([("RAT", qty(1.0))]);
        let mut ledger = Ledger::for_line("S1", "L1", "FRM", 2);

        let efficiency = workforce.resupply(&clock, &mut inventory, &mut ledger).unwrap();
        assert!((efficiency - 0.7).abs() < 1e-12);
        assert_eq!(inventory.count("RAT"), Quantity::ZERO);
        assert_eq!(ledger.count_of(EntryKind::PurchaseSupply), 1);
        assert_eq!(ledger.count_of(EntryKind::MissingSupply), 1);
    }

    #[test]
    fn tick_fires_once_per_day() {
        let mut workforce = Workforce::new(vec![], SiteBonuses::default(), SupplyStrategy::default());
        let fired = (0..3 * 1440).filter(|_| workforce.tick()).count();
        assert_eq!(fired, 3);
    }

    #[test]
    fn agriculture_bonuses_resolve() {
        let tables = BonusTables {
            expert_factors: vec![0.0, 0.0306, 0.0696],
            cogc_worker_bonus: BTreeMap::new(),
            cogc_industry_bonus: BTreeMap::from([("AGRICULTURE".to_string(), 0.25)]),
        };
        let site = SiteDef {
            name: "Promitor".into(),
            experts: BTreeMap::from([("AGRICULTURE".to_string(), 5)]),
            soil_fertility: 0.1,
            cogc_program: Some("AGRICULTURE".into()),
            ..Default::default()
        };

        let bonuses = SiteBonuses::resolve(&tables, &site, &building(Some("AGRICULTURE")), 1.0);
        assert_eq!(bonuses.expert, 0.0696);
        assert_eq!(bonuses.soil, 0.1);
        assert_eq!(bonuses.cogc, 0.25);

        let plain = SiteBonuses::resolve(&tables, &site, &building(Some("METALLURGY")), 0.9);
        assert_eq!(plain.expert, 0.0);
        assert_eq!(plain.soil, 0.0);
        assert_eq!(plain.cogc, 0.0);
        assert_eq!(plain.multiplier(), 0.9);
    }

    #[test]
    fn worker_program_matches_roster() {
        let tables = BonusTables {
            cogc_worker_bonus: BTreeMap::from([("PIONEER".to_string(), 0.1)]),
            ..Default::default()
        };
        let site = SiteDef {
            cogc_program: Some("PIONEER".into()),
            ..Default::default()
        };
        let bonuses = SiteBonuses::resolve(&tables, &site, &building(None), 1.0);
        assert_eq!(bonuses.cogc, 0.1);
    }
}
