//! Read-only cart views, computed live from lines and catalog data.

use common::{LineId, Money, ProductId};
use serde::{Deserialize, Serialize};

/// One cart line joined with current catalog data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartViewLine {
    pub line_id: LineId,
    pub product_id: ProductId,
    pub name: String,
    /// Current catalog price, not the price at add time.
    pub unit_price: Money,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
    pub line_total: Money,
}

/// A user's cart as of this read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartView {
    pub lines: Vec<CartViewLine>,
    pub total: Money,
    pub item_count: u32,
}
