//! Production lines: one or more identical buildings working a shared
//! recipe queue.
//!
//! Each building is a slot with its own batch countdown. A slot is either
//! idle or producing; when its countdown reaches zero it emits the batch
//! outputs, rotates the queue and tries to start the next batch at once.
//! Inputs come from the shared [`Inventory`]; when they are short the line's
//! [`SourcingStrategy`] decides whether the shortfall is bought from the
//! market or the slot stays idle.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::{Catalog, CatalogError, RecipeDef};
use crate::clock::{DecrClock, Duration, DurationError, IncrClock};
use crate::fixed::Quantity;
use crate::inventory::{Inventory, InventoryError};
use crate::ledger::{Ledger, LedgerEvent};
use crate::workforce::{SiteBonuses, SupplyStrategy, WorkerGroup, Workforce};

// ---------------------------------------------------------------------------
// Configuration types
// ---------------------------------------------------------------------------

/// What a line does when inventory cannot cover a requirement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourcingStrategy {
    /// Log the shortfall and go without.
    #[default]
    InventoryOnly,
    /// Buy the shortfall into inventory and carry on.
    Market,
}

/// Sourcing strategy per requirement category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sourcing {
    pub inputs: SourcingStrategy,
    pub essentials: SourcingStrategy,
    pub non_essentials: SourcingStrategy,
}

impl Sourcing {
    /// The same strategy for every category.
    pub fn uniform(strategy: SourcingStrategy) -> Self {
        Self {
            inputs: strategy,
            essentials: strategy,
            non_essentials: strategy,
        }
    }

    fn supplies(&self) -> SupplyStrategy {
        SupplyStrategy {
            essentials: self.essentials,
            non_essentials: self.non_essentials,
        }
    }
}

/// A recipe and how many runs of it to batch together.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub recipe: String,
    pub count: u32,
}

/// Declaration of one production line in a value stream.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSpec {
    pub id: String,
    /// Building ticker every slot of the line uses.
    pub line_type: String,
    pub site: String,
    pub building_count: u32,
    pub condition: f64,
    pub queue: Vec<QueueEntry>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LineError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Duration(#[from] DurationError),
    #[error("line {line}: {source}")]
    Inventory {
        line: String,
        #[source]
        source: InventoryError,
    },
    #[error("line {0} has an empty recipe queue")]
    EmptyQueue(String),
    #[error("line {0} has no buildings")]
    NoBuildings(String),
    #[error("line {line} has no workers for building {building}")]
    NoWorkers { line: String, building: String },
    #[error("line {line}: recipe {recipe} runs on {expected}, not {found}")]
    WrongLineType {
        line: String,
        recipe: String,
        expected: String,
        found: String,
    },
    #[error("line {line}: recipe {recipe} queued with zero runs")]
    ZeroRuns { line: String, recipe: String },
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Batch {
    recipe: RecipeDef,
    runs: u32,
}

/// Observable state of one building slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    Idle { recipe: String },
    Producing { recipe: String, remaining: u64 },
}

#[derive(Debug, Clone)]
struct Slot {
    batch: Batch,
    countdown: DecrClock,
    producing: bool,
    /// Producing as of the end of the previous tick. Starts `true` so a
    /// slot that cannot start at construction reports it once.
    was_producing: bool,
}

impl Slot {
    fn state(&self) -> SlotState {
        let recipe = self.batch.recipe.id.clone();
        if self.producing {
            SlotState::Producing {
                recipe,
                remaining: self.countdown.to_minutes(),
            }
        } else {
            SlotState::Idle { recipe }
        }
    }
}

/// Pop the head of the queue and push it to the back.
fn next_batch(queue: &mut VecDeque<Batch>) -> Option<Batch> {
    let batch = queue.pop_front()?;
    queue.push_back(batch.clone());
    Some(batch)
}

// ---------------------------------------------------------------------------
// ProductionLine
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ProductionLine {
    id: String,
    line_type: String,
    building_count: u32,
    input_sourcing: SourcingStrategy,
    queue: VecDeque<Batch>,
    slots: Vec<Slot>,
    workforce: Workforce,
    ledger: Ledger,
}

impl ProductionLine {
    /// Validate `spec` against the catalog, staff and supply the workforce,
    /// then try to start a batch in every slot.
    pub fn new(
        catalog: &Catalog,
        spec: &LineSpec,
        stream_id: &str,
        sourcing: Sourcing,
        clock: &IncrClock,
        inventory: &mut Inventory,
    ) -> Result<Self, LineError> {
        let building = catalog.building(&spec.line_type)?;
        let site = catalog.site(&spec.site)?;

        if spec.building_count == 0 {
            return Err(LineError::NoBuildings(spec.id.clone()));
        }
        if spec.queue.is_empty() {
            return Err(LineError::EmptyQueue(spec.id.clone()));
        }

        let mut queue = VecDeque::with_capacity(spec.queue.len());
        for entry in &spec.queue {
            let recipe = catalog.recipe(&entry.recipe)?;
            if recipe.line != spec.line_type {
                return Err(LineError::WrongLineType {
                    line: spec.id.clone(),
                    recipe: recipe.id.clone(),
                    expected: recipe.line.clone(),
                    found: spec.line_type.clone(),
                });
            }
            if entry.count == 0 {
                return Err(LineError::ZeroRuns {
                    line: spec.id.clone(),
                    recipe: recipe.id.clone(),
                });
            }
            queue.push_back(Batch {
                recipe: recipe.clone(),
                runs: entry.count,
            });
        }

        let mut groups = Vec::new();
        for slot in &building.workers {
            let profile = catalog.worker_profile(&spec.site, &slot.worker_type)?;
            let headcount = slot.count * spec.building_count;
            if headcount > 0 {
                groups.push(WorkerGroup {
                    worker_type: slot.worker_type.clone(),
                    headcount,
                    profile: profile.clone(),
                });
            }
        }
        if groups.is_empty() {
            return Err(LineError::NoWorkers {
                line: spec.id.clone(),
                building: building.ticker.clone(),
            });
        }

        let bonuses = SiteBonuses::resolve(catalog.bonuses(), site, building, spec.condition);
        let mut workforce = Workforce::new(groups, bonuses, sourcing.supplies());
        let mut ledger = Ledger::for_line(stream_id, &spec.id, &spec.line_type, spec.building_count);
        workforce
            .resupply(clock, inventory, &mut ledger)
            .map_err(|source| LineError::Inventory {
                line: spec.id.clone(),
                source,
            })?;

        let mut line = Self {
            id: spec.id.clone(),
            line_type: spec.line_type.clone(),
            building_count: spec.building_count,
            input_sourcing: sourcing.inputs,
            queue,
            slots: Vec::with_capacity(spec.building_count as usize),
            workforce,
            ledger,
        };

        for bnum in 0..spec.building_count as usize {
            let Some(batch) = next_batch(&mut line.queue) else {
                return Err(LineError::EmptyQueue(spec.id.clone()));
            };
            line.slots.push(Slot {
                batch,
                countdown: DecrClock::new(Duration::ZERO),
                producing: false,
                was_producing: true,
            });
            line.try_start(bnum, clock, inventory)?;
            line.slots[bnum].was_producing = line.slots[bnum].producing;
        }

        debug!(
            line = %line.id,
            identity = %line.identity(),
            site = %spec.site,
            efficiency = line.workforce.efficiency(),
            "line constructed"
        );
        Ok(line)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn building_count(&self) -> u32 {
        self.building_count
    }

    /// Short fingerprint of the line, e.g. `3xFRM`.
    pub fn identity(&self) -> String {
        format!("{}x{}", self.building_count, self.line_type)
    }

    pub fn efficiency(&self) -> f64 {
        self.workforce.efficiency()
    }

    pub fn workforce(&self) -> &Workforce {
        &self.workforce
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }

    pub fn slot_states(&self) -> Vec<SlotState> {
        self.slots.iter().map(Slot::state).collect()
    }

    /// True when every slot is producing.
    pub fn is_active(&self) -> bool {
        self.slots.iter().all(|s| s.producing)
    }

    /// Advance the line by one simulated minute.
    pub fn step(&mut self, clock: &IncrClock, inventory: &mut Inventory) -> Result<(), LineError> {
        for bnum in 0..self.slots.len() {
            if !self.slots[bnum].producing {
                self.try_start(bnum, clock, inventory)?;
            } else if !self.slots[bnum].countdown.step() {
                self.complete(bnum, clock, inventory);
                self.try_start(bnum, clock, inventory)?;
            }
            let slot = &mut self.slots[bnum];
            slot.was_producing = slot.producing;
        }

        if self.workforce.tick() {
            self.workforce
                .resupply(clock, inventory, &mut self.ledger)
                .map_err(|source| LineError::Inventory {
                    line: self.id.clone(),
                    source,
                })?;
        }

        self.record_status(clock);
        Ok(())
    }

    /// Final tick of a run: finish batches that complete now, but start
    /// nothing new and skip worker resupply.
    pub fn flush(&mut self, clock: &IncrClock, inventory: &mut Inventory) {
        for bnum in 0..self.slots.len() {
            if self.slots[bnum].producing && !self.slots[bnum].countdown.step() {
                self.complete(bnum, clock, inventory);
            }
        }
        self.record_status(clock);
    }

    fn record_status(&mut self, clock: &IncrClock) {
        let active = self.is_active();
        let description = if active { "ACTIVE" } else { "INACTIVE" };
        self.ledger.add(clock, LedgerEvent::Status { active }, description);
    }

    /// Emit the outputs of the slot's finished batch and hand it the next
    /// queued batch.
    fn complete(&mut self, bnum: usize, clock: &IncrClock, inventory: &mut Inventory) {
        let slot = &mut self.slots[bnum];
        let runs = Quantity::from_num(slot.batch.runs);
        for output in &slot.batch.recipe.outputs {
            let count = output.count * runs;
            inventory.add(output.ticker.as_str(), count);
            self.ledger.add(
                clock,
                LedgerEvent::Output {
                    product: output.ticker.clone(),
                    count,
                    bnum,
                },
                format!("produced {} {}", count, output.ticker),
            );
        }
        slot.producing = false;
        debug!(
            line = %self.id,
            bnum,
            recipe = %slot.batch.recipe.id,
            clock = %clock,
            "batch completed"
        );

        if let Some(batch) = next_batch(&mut self.queue) {
            slot.batch = batch;
        }
    }

    /// Try to start the slot's assigned batch. An idle slot keeps its batch
    /// and retries on the next tick.
    fn try_start(&mut self, bnum: usize, clock: &IncrClock, inventory: &mut Inventory) -> Result<bool, LineError> {
        let slot = &mut self.slots[bnum];
        let runs = Quantity::from_num(slot.batch.runs);

        let shortfalls: Vec<(&str, Quantity, Quantity)> = slot
            .batch
            .recipe
            .inputs
            .iter()
            .filter_map(|input| {
                let need = input.count * runs;
                let available = inventory.count(&input.ticker);
                (available < need).then_some((input.ticker.as_str(), need, available))
            })
            .collect();

        if !shortfalls.is_empty() {
            match self.input_sourcing {
                SourcingStrategy::Market => {
                    for &(ticker, need, available) in &shortfalls {
                        let purchased = need - available;
                        inventory.add(ticker, purchased);
                        self.ledger.add(
                            clock,
                            LedgerEvent::PurchaseInput {
                                product: ticker.to_string(),
                                count: purchased,
                                need,
                                available,
                                bnum,
                            },
                            format!("purchased {} {}", purchased, ticker),
                        );
                    }
                }
                SourcingStrategy::InventoryOnly => {
                    if slot.was_producing {
                        warn!(
                            line = %self.id,
                            bnum,
                            recipe = %slot.batch.recipe.id,
                            clock = %clock,
                            "production starved"
                        );
                        for &(ticker, need, available) in &shortfalls {
                            self.ledger.add(
                                clock,
                                LedgerEvent::MissingInput {
                                    ticker: ticker.to_string(),
                                    count: need - available,
                                    need,
                                    available,
                                    bnum,
                                },
                                format!("missing {} {}", need - available, ticker),
                            );
                        }
                    }
                    return Ok(false);
                }
            }
        }

        for input in &slot.batch.recipe.inputs {
            let need = input.count * runs;
            inventory
                .take(&input.ticker, need)
                .map_err(|source| LineError::Inventory {
                    line: self.id.clone(),
                    source,
                })?;
            self.ledger.add(
                clock,
                LedgerEvent::Input {
                    product: input.ticker.clone(),
                    count: need,
                    bnum: Some(bnum),
                },
                format!("consumed {} {}", need, input.ticker),
            );
        }

        let mut duration = slot.batch.recipe.time;
        duration.apply_multiplier(u64::from(slot.batch.runs));
        duration.apply_efficiency(self.workforce.efficiency())?;
        if duration.is_zero() {
            duration = Duration::from_minutes(1);
        }
        slot.countdown = DecrClock::new(duration);
        slot.producing = true;

        debug!(
            line = %self.id,
            bnum,
            recipe = %slot.batch.recipe.id,
            runs = slot.batch.runs,
            minutes = duration.to_minutes(),
            "batch started"
        );
        Ok(true)
    }
}
