//! Cart line records.

use chrono::{DateTime, Utc};
use common::{LineId, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// A single line in a user's cart.
///
/// The natural key is (user, product, size, color), with a null size or
/// color being a distinct key value. The store guarantees at most one
/// line per natural key; a repeat add merges quantities into the
/// existing line instead of creating a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: LineId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub size: Option<String>,
    pub color: Option<String>,
    /// Always positive; a line that would drop to zero is deleted instead.
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Creates a fresh line with a new id, stamped now.
    pub fn new(
        user_id: UserId,
        product_id: ProductId,
        size: Option<String>,
        color: Option<String>,
        quantity: u32,
    ) -> Self {
        Self {
            id: LineId::new(),
            user_id,
            product_id,
            size,
            color,
            quantity,
            added_at: Utc::now(),
        }
    }

    /// Returns true if this line is identified by the given natural key.
    ///
    /// Null-aware: `None` only matches `None`.
    pub fn key_matches(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size: Option<&str>,
        color: Option<&str>,
    ) -> bool {
        self.user_id == user_id
            && self.product_id == product_id
            && self.size.as_deref() == size
            && self.color.as_deref() == color
    }
}
