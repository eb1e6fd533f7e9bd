//! Quoted rate records as published by sources.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::currency::Currency;
use crate::time::Timestamp;

/// The cash and remit prices quoted on one side (buy or sell).
///
/// Sources differ in which sub-rates they publish, so both fields are
/// optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SidePrices {
    /// Physical-currency (banknote) price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash: Option<Decimal>,
    /// Wire/telegraphic-transfer price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remit: Option<Decimal>,
}

impl SidePrices {
    /// Create side prices with both sub-rates present.
    pub fn new(cash: Decimal, remit: Decimal) -> Self {
        Self {
            cash: Some(cash),
            remit: Some(remit),
        }
    }

    /// Whether either sub-rate is present.
    pub fn is_quoted(&self) -> bool {
        self.cash.is_some() || self.remit.is_some()
    }
}

/// The quoted price quad for one currency pair from one source.
///
/// `buy.* <= sell.*` is not guaranteed; sources occasionally report
/// anomalies and the quad only carries what was published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateQuad {
    /// Currency being converted from.
    pub from: Currency,
    /// Currency being converted to; may be a code the service does not
    /// otherwise recognize.
    pub to: Currency,
    /// Prices at which the source buys.
    pub buy: SidePrices,
    /// Prices at which the source sells.
    pub sell: SidePrices,
    /// Number of `to`-currency units the prices apply to (commonly 1,
    /// sometimes 100).
    pub unit: u32,
    /// When the source observed or published the quote.
    pub observed_at: Timestamp,
}

impl RateQuad {
    /// Create a quad with no prices set and unit 1.
    pub fn new(from: Currency, to: Currency, observed_at: Timestamp) -> Self {
        Self {
            from,
            to,
            buy: SidePrices::default(),
            sell: SidePrices::default(),
            unit: 1,
            observed_at,
        }
    }

    /// Set the quoting unit.
    pub fn with_unit(mut self, unit: u32) -> Self {
        self.unit = unit;
        self
    }

    /// Set the buy-side prices.
    pub fn with_buy(mut self, buy: SidePrices) -> Self {
        self.buy = buy;
        self
    }

    /// Set the sell-side prices.
    pub fn with_sell(mut self, sell: SidePrices) -> Self {
        self.sell = sell;
        self
    }

    /// Whether any of the four prices is present.
    pub fn is_quoted(&self) -> bool {
        self.buy.is_quoted() || self.sell.is_quoted()
    }

    /// The ordered pair this quad is keyed by.
    pub fn pair(&self) -> (Currency, Currency) {
        (self.from, self.to)
    }
}

impl fmt::Display for RateQuad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} (unit {})", self.from, self.to, self.unit)
    }
}

/// Which published sub-rate a conversion should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateKind {
    /// Physical-currency rate.
    Cash,
    /// Wire-transfer rate.
    Remit,
    /// No-spread reference rate, the mean of buy and sell.
    Middle,
}

impl RateKind {
    /// All kinds, in the order aggregate responses report them.
    pub const ALL: [RateKind; 3] = [RateKind::Cash, RateKind::Remit, RateKind::Middle];
}

impl fmt::Display for RateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RateKind::Cash => "cash",
            RateKind::Remit => "remit",
            RateKind::Middle => "middle",
        };
        write!(f, "{}", s)
    }
}

/// Error for an unrecognized rate kind.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown rate kind: {0:?}")]
pub struct InvalidRateKind(pub String);

impl FromStr for RateKind {
    type Err = InvalidRateKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(RateKind::Cash),
            "remit" => Ok(RateKind::Remit),
            "middle" => Ok(RateKind::Middle),
            other => Err(InvalidRateKind(other.to_string())),
        }
    }
}

/// Which way a conversion query applies the resolved rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversionDirection {
    /// How many units of `to` the given amount of `from` converts to.
    #[default]
    Forward,
    /// How many units of `from` are needed to obtain the given amount
    /// of `to`.
    Reverse,
}
