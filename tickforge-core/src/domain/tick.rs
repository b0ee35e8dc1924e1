//! Tick and quote events — the unit the engine event surface consumes.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::product::Product;

/// Where a quote came from. The engine drops live quotes while a replay is
/// active so a backtest can never be contaminated by the network feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteSource {
    Network,
    Replay,
}

/// Which field of the quote board a `QuoteUpdate` carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteField {
    /// Last traded price.
    Last,
    /// Traded volume of the tick that follows.
    Volume,
}

/// A single quote-board update for one contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteUpdate {
    pub product: Product,
    pub field: QuoteField,
    pub contract_year: i32,
    pub contract_month: u32,
    pub value: Decimal,
    pub time: NaiveDateTime,
    pub source: QuoteSource,
}

impl QuoteUpdate {
    pub fn last(product: Product, price: Decimal, time: NaiveDateTime, source: QuoteSource) -> Self {
        Self {
            product,
            field: QuoteField::Last,
            contract_year: 0,
            contract_month: 0,
            value: price,
            time,
            source,
        }
    }

    pub fn volume(product: Product, volume: u32, time: NaiveDateTime, source: QuoteSource) -> Self {
        Self {
            product,
            field: QuoteField::Volume,
            contract_year: 0,
            contract_month: 0,
            value: Decimal::from(volume),
            time,
            source,
        }
    }
}

/// A trade event as stored in history: price, volume, exchange-local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    pub time: NaiveDateTime,
    pub price: Decimal,
    pub volume: u32,
    pub source: QuoteSource,
}
