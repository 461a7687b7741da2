//! Read-only market prices used to value ledger flows and inventories.
//!
//! A [`Market`] is built once per run from a price-feed snapshot for a single
//! exchange. Lookups of unknown tickers fail with
//! [`MarketError::PriceNotFound`]; there is no silent default price.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarketError {
    #[error("price for {0} not found in market")]
    PriceNotFound(String),
    #[error("exchange {0} not found in price feed")]
    ExchangeNotFound(String),
}

// ---------------------------------------------------------------------------
// Price
// ---------------------------------------------------------------------------

/// Price statistics for one ticker on one exchange.
///
/// Any statistic may be missing in the feed. Arithmetic treats a missing
/// component as 0.0 and the result records 0.0, so "unknown" and "zero" are
/// not distinguished after scaling or summing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Price {
    #[serde(default)]
    pub last: Option<f64>,
    #[serde(default)]
    pub ask: Option<f64>,
    #[serde(default)]
    pub bid: Option<f64>,
    #[serde(default)]
    pub avg: Option<f64>,
    #[serde(default)]
    pub supply: Option<f64>,
    #[serde(default)]
    pub demand: Option<f64>,
}

impl Price {
    /// A price with every statistic known and zero. Identity for [`add`](Self::add).
    pub fn zero() -> Self {
        Self {
            last: Some(0.0),
            ask: Some(0.0),
            bid: Some(0.0),
            avg: Some(0.0),
            supply: None,
            demand: None,
        }
    }

    pub fn new(last: f64, ask: f64, bid: f64, avg: f64) -> Self {
        Self {
            last: Some(last),
            ask: Some(ask),
            bid: Some(bid),
            avg: Some(avg),
            supply: None,
            demand: None,
        }
    }

    /// Scale every statistic by `factor`.
    pub fn multiply(&self, factor: f64) -> Price {
        Price {
            last: Some(self.last.unwrap_or(0.0) * factor),
            ask: Some(self.ask.unwrap_or(0.0) * factor),
            bid: Some(self.bid.unwrap_or(0.0) * factor),
            avg: Some(self.avg.unwrap_or(0.0) * factor),
            supply: self.supply,
            demand: self.demand,
        }
    }

    /// Field-wise sum. Supply and demand are carried from `self`.
    pub fn add(&self, other: &Price) -> Price {
        Price {
            last: Some(self.last.unwrap_or(0.0) + other.last.unwrap_or(0.0)),
            ask: Some(self.ask.unwrap_or(0.0) + other.ask.unwrap_or(0.0)),
            bid: Some(self.bid.unwrap_or(0.0) + other.bid.unwrap_or(0.0)),
            avg: Some(self.avg.unwrap_or(0.0) + other.avg.unwrap_or(0.0)),
            supply: self.supply,
            demand: self.demand,
        }
    }

    /// Average price with a missing value read as zero. This is the figure
    /// the run log records as net value.
    pub fn avg_or_zero(&self) -> f64 {
        self.avg.unwrap_or(0.0)
    }
}

// ---------------------------------------------------------------------------
// Price feed snapshot
// ---------------------------------------------------------------------------

/// Prices published by one exchange.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeSnapshot {
    #[serde(default)]
    pub prices: BTreeMap<String, Price>,
}

/// A full price-feed dump keyed by exchange code.
pub type PriceFeed = BTreeMap<String, ExchangeSnapshot>;

// ---------------------------------------------------------------------------
// Market
// ---------------------------------------------------------------------------

/// Ticker to price lookup for a single exchange.
#[derive(Debug, Clone, Default)]
pub struct Market {
    exchange: String,
    prices: BTreeMap<String, Price>,
}

impl Market {
    /// Build a market from one exchange of a price-feed snapshot.
    pub fn from_feed(feed: &PriceFeed, exchange: &str) -> Result<Self, MarketError> {
        let snapshot = feed
            .get(exchange)
            .ok_or_else(|| MarketError::ExchangeNotFound(exchange.to_string()))?;
        Ok(Self {
            exchange: exchange.to_string(),
            prices: snapshot.prices.clone(),
        })
    }

    /// Build a market directly from a ticker to price table.
    pub fn from_prices(
        exchange: &str,
        prices: impl IntoIterator<Item = (String, Price)>,
    ) -> Self {
        Self {
            exchange: exchange.to_string(),
            prices: prices.into_iter().collect(),
        }
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn price(&self, ticker: &str) -> Result<&Price, MarketError> {
        self.prices
            .get(ticker)
            .ok_or_else(|| MarketError::PriceNotFound(ticker.to_string()))
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.prices.contains_key(ticker)
    }

    /// Market value of `count` units of `ticker`.
    pub fn value_of(&self, ticker: &str, count: f64) -> Result<Price, MarketError> {
        Ok(self.price(ticker)?.multiply(count))
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiply_scales_all_fields() {
        let p = Price::new(1.0, 2.0, 3.0, 4.0).multiply(3.0);
        assert_eq!(p, Price::new(3.0, 6.0, 9.0, 12.0));
    }

    #[test]
    fn add_sums_field_wise() {
        let a = Price::new(1.0, 2.0, 3.0, 4.0);
        let b = Price::new(1.0, 2.0, 4.0, 8.0);
        assert_eq!(a.add(&b), Price::new(2.0, 4.0, 7.0, 12.0));
    }

    #[test]
    fn missing_components_become_zero() {
        let partial = Price {
            last: Some(5.0),
            ask: None,
            bid: None,
            avg: Some(4.0),
            supply: Some(100.0),
            demand: None,
        };
        let scaled = partial.multiply(2.0);
        assert_eq!(scaled.ask, Some(0.0));
        assert_eq!(scaled.bid, Some(0.0));
        assert_eq!(scaled.avg, Some(8.0));
        assert_eq!(scaled.supply, Some(100.0));

        let summed = Price::default().add(&partial);
        assert_eq!(summed.last, Some(5.0));
        assert_eq!(summed.ask, Some(0.0));
    }

    #[test]
    fn market_from_feed_selects_exchange() {
        let mut feed = PriceFeed::new();
        let mut ci1 = ExchangeSnapshot::default();
        ci1.prices.insert("RAT".into(), Price::new(10.0, 11.0, 9.0, 10.5));
        feed.insert("CI1".into(), ci1);
        feed.insert("NC1".into(), ExchangeSnapshot::default());

        let market = Market::from_feed(&feed, "CI1").unwrap();
        assert_eq!(market.exchange(), "CI1");
        assert_eq!(market.price("RAT").unwrap().avg, Some(10.5));

        let empty = Market::from_feed(&feed, "NC1").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn unknown_exchange_is_an_error() {
        let feed = PriceFeed::new();
        assert_eq!(
            Market::from_feed(&feed, "XX1").unwrap_err(),
            MarketError::ExchangeNotFound("XX1".into())
        );
    }

    #[test]
    fn unknown_ticker_is_an_error() {
        let market = Market::from_prices("CI1", [("H2O".to_string(), Price::zero())]);
        assert!(market.price("H2O").is_ok());
        assert_eq!(
            market.price("FE").unwrap_err(),
            MarketError::PriceNotFound("FE".into())
        );
    }

    #[test]
    fn value_of_multiplies_count() {
        let market = Market::from_prices("CI1", [("FE".to_string(), Price::new(1.0, 1.0, 1.0, 2.5))]);
        assert_eq!(market.value_of("FE", 4.0).unwrap().avg, Some(10.0));
    }
}
