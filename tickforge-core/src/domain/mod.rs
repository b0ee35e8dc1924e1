//! Domain types: bars, ticks, quote updates, products, sides.

pub mod bar;
pub mod product;
pub mod tick;

pub use bar::Bar;
pub use product::{Product, ProductInfo, PRODUCT_TABLE};
pub use tick::{QuoteField, QuoteSource, QuoteUpdate, Tick};

use serde::{Deserialize, Serialize};

/// Direction of a position or entry signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    /// Signed unit: +1 for long, -1 for short.
    pub fn sign(self) -> i32 {
        match self {
            Side::Long => 1,
            Side::Short => -1,
        }
    }
}
