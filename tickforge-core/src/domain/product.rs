//! Product codes and the process-wide product table.

use serde::{Deserialize, Serialize};

/// Index-futures products recognized by the historical store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Product {
    /// Full-size index futures.
    Tx,
    /// Mini index futures.
    Mtx,
    /// Micro index futures.
    Tmf,
}

/// One row of the immutable product table.
#[derive(Debug, Clone, Copy)]
pub struct ProductInfo {
    pub product: Product,
    pub code: u8,
    pub name: &'static str,
}

/// Read-only product table, fixed at compile time.
pub const PRODUCT_TABLE: &[ProductInfo] = &[
    ProductInfo { product: Product::Tx, code: 1, name: "TX index futures" },
    ProductInfo { product: Product::Mtx, code: 2, name: "MTX mini futures" },
    ProductInfo { product: Product::Tmf, code: 3, name: "TMF micro futures" },
];

impl Product {
    pub fn code(self) -> u8 {
        PRODUCT_TABLE
            .iter()
            .find(|info| info.product == self)
            .map(|info| info.code)
            .unwrap_or(0)
    }

    pub fn name(self) -> &'static str {
        PRODUCT_TABLE
            .iter()
            .find(|info| info.product == self)
            .map(|info| info.name)
            .unwrap_or("unknown")
    }

    pub fn from_code(code: u8) -> Option<Self> {
        PRODUCT_TABLE
            .iter()
            .find(|info| info.code == code)
            .map(|info| info.product)
    }
}
