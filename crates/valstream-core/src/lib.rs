//! Valstream Core -- a minute-resolution simulator for production value
//! streams.
//!
//! Raw materials flow through production lines housed in buildings, staffed
//! by workers with their own supply needs, and come out as higher-value
//! goods. Every flow is written to a per-line ledger and valued against a
//! market price snapshot when the run is summarized.
//!
//! # Tick Pipeline
//!
//! [`stream::ValueStream::run`] advances one master [`clock::IncrClock`]
//! minute by minute. On each tick every [`line::ProductionLine`], in
//! declaration order:
//!
//! 1. **Slots** -- idle slots try to start their batch; producing slots count
//!    down and, at zero, emit outputs, rotate the queue and start the next
//!    batch.
//! 2. **Workforce** -- every 24 simulated hours workers are resupplied from
//!    inventory and line efficiency is recomputed.
//! 3. **Status** -- one STATUS entry records whether every slot is busy.
//!
//! When the clock reaches the run length each line gets one flush tick that
//! completes batches but starts nothing.
//!
//! # Key Types
//!
//! - [`catalog::Catalog`] -- Immutable recipes, buildings, sites and bonus
//!   tables (frozen at startup).
//! - [`inventory::Inventory`] -- The single shared, never-negative material
//!   pool of a run.
//! - [`market::Market`] -- Read-only ticker to [`market::Price`] lookup.
//! - [`ledger::Ledger`] -- Append-only typed entries and their summaries.
//! - [`fixed::Quantity`] -- Q32.32 fixed-point type for exact material counts.

pub mod catalog;
pub mod clock;
pub mod fixed;
pub mod inventory;
pub mod ledger;
pub mod line;
pub mod market;
pub mod stream;
pub mod workforce;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
