use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::fixed::{Quantity, qty_to_f64, serde_qty};
use crate::market::{Market, MarketError, Price};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InventoryError {
    #[error("removing {requested} {ticker} from inventory failed: only {available} on hand")]
    InsufficientStock {
        ticker: String,
        requested: Quantity,
        available: Quantity,
    },
}

/// A count of one material together with its market value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MaterialValue {
    #[serde(with = "serde_qty")]
    pub count: Quantity,
    pub value: Price,
}

/// Per-ticker market values plus their total.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Valuation {
    pub items: BTreeMap<String, MaterialValue>,
    pub total: Price,
}

fn valuate<'a>(
    counts: impl Iterator<Item = (&'a String, &'a Quantity)>,
    market: &Market,
) -> Result<Valuation, MarketError> {
    let mut valuation = Valuation {
        items: BTreeMap::new(),
        total: Price::zero(),
    };
    for (ticker, &count) in counts {
        let value = market.value_of(ticker, qty_to_f64(count))?;
        valuation.total = valuation.total.add(&value);
        valuation
            .items
            .insert(ticker.clone(), MaterialValue { count, value });
    }
    Ok(valuation)
}

/// The shared pool of materials for a run.
///
/// Counts are never negative: [`remove`](Self::remove) refuses to take more
/// than is on hand and leaves the inventory untouched when it refuses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    items: BTreeMap<String, Quantity>,
}

impl Serialize for Inventory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_qty::map::serialize(&self.items, serializer)
    }
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an inventory from starting counts. Negative counts are clamped
    /// to zero.
    pub fn from_counts<S: Into<String>>(counts: impl IntoIterator<Item = (S, Quantity)>) -> Self {
        let mut inventory = Self::new();
        for (ticker, count) in counts {
            inventory.add(ticker, count.max(Quantity::ZERO));
        }
        inventory
    }

    /// Quantity on hand, zero if the ticker has never been stocked.
    pub fn count(&self, ticker: &str) -> Quantity {
        self.items.get(ticker).copied().unwrap_or(Quantity::ZERO)
    }

    pub fn has(&self, ticker: &str, amount: Quantity) -> bool {
        self.count(ticker) >= amount
    }

    /// Add stock, creating the entry if needed.
    pub fn add(&mut self, ticker: impl Into<String>, amount: Quantity) {
        debug_assert!(amount >= Quantity::ZERO, "negative add");
        let amount = amount.max(Quantity::ZERO);
        *self.items.entry(ticker.into()).or_insert(Quantity::ZERO) += amount;
    }

    /// Remove stock if enough is on hand. Returns `false`, without mutating,
    /// when it is not.
    #[must_use = "a false return means nothing was removed"]
    pub fn remove(&mut self, ticker: &str, amount: Quantity) -> bool {
        if amount < Quantity::ZERO {
            return false;
        }
        match self.items.get_mut(ticker) {
            Some(on_hand) if *on_hand >= amount => {
                *on_hand -= amount;
                true
            }
            _ => amount == Quantity::ZERO,
        }
    }

    /// Remove stock that a prior availability check has already confirmed.
    /// Failure here means that check was wrong.
    pub fn take(&mut self, ticker: &str, amount: Quantity) -> Result<(), InventoryError> {
        if self.remove(ticker, amount) {
            Ok(())
        } else {
            Err(InventoryError::InsufficientStock {
                ticker: ticker.to_string(),
                requested: amount,
                available: self.count(ticker),
            })
        }
    }

    /// Per-ticker `self - other` over the union of both inventories.
    pub fn diff(&self, other: &Inventory) -> InventoryDiff {
        let mut changes = BTreeMap::new();
        for ticker in self.items.keys().chain(other.items.keys()) {
            changes
                .entry(ticker.clone())
                .or_insert_with(|| self.count(ticker) - other.count(ticker));
        }
        InventoryDiff { changes }
    }

    /// Iterate tickers and counts in ticker order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Quantity)> {
        self.items.iter().map(|(t, q)| (t.as_str(), *q))
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Value every stocked ticker at current market prices.
    pub fn valuate(&self, market: &Market) -> Result<Valuation, MarketError> {
        valuate(self.items.iter(), market)
    }
}

/// Signed per-ticker change between two inventory snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventoryDiff {
    #[serde(serialize_with = "serde_qty::map::serialize")]
    changes: BTreeMap<String, Quantity>,
}

impl InventoryDiff {
    pub fn change(&self, ticker: &str) -> Quantity {
        self.changes.get(ticker).copied().unwrap_or(Quantity::ZERO)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Quantity)> {
        self.changes.iter().map(|(t, q)| (t.as_str(), *q))
    }

    pub fn valuate(&self, market: &Market) -> Result<Valuation, MarketError> {
        valuate(self.changes.iter(), market)
    }
}
