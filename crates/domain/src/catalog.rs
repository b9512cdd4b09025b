//! Catalog records: products and their variants.
//!
//! The catalog itself is owned elsewhere (admin CRUD is out of scope);
//! the engine reads these records and, at order confirmation, decrements
//! stock through the store's atomic hook.

use chrono::{DateTime, Utc};
use common::{Money, ProductId, VariantId};
use serde::{Deserialize, Serialize};

/// A sellable product.
///
/// A product is either in flat-stock mode (`stock` set, no variants) or
/// variant-stock mode (one or more [`Variant`] rows); never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Inactive products are treated as sold out regardless of stock.
    pub active: bool,
    /// Flat stock, used only when the product has no variants. Absent
    /// means "never recorded" and resolves as zero.
    pub stock: Option<u32>,
    /// Declared size options. A non-empty list forces the caller to pick
    /// a size even before variants are consulted.
    pub sizes: Vec<String>,
    /// Declared color options, same rule as `sizes`.
    pub colors: Vec<String>,
    /// Current selling price.
    pub price: Money,
    /// Pre-discount price, when the product is on sale.
    pub original_price: Option<Money>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Returns the flat stock, treating an unrecorded value as zero.
    pub fn flat_stock(&self) -> u32 {
        self.stock.unwrap_or(0)
    }
}

/// A concrete (size, color) stock-keeping unit beneath a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub size: Option<String>,
    pub color: Option<String>,
    pub stock: u32,
}

impl Variant {
    /// Returns true if this variant matches the requested selection.
    ///
    /// An unset variant field matches any requested value for that field;
    /// a set field must equal the requested value exactly.
    pub fn matches_selection(&self, size: Option<&str>, color: Option<&str>) -> bool {
        let size_ok = match self.size.as_deref() {
            None => true,
            Some(s) => size == Some(s),
        };
        let color_ok = match self.color.as_deref() {
            None => true,
            Some(c) => color == Some(c),
        };
        size_ok && color_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(size: Option<&str>, color: Option<&str>) -> Variant {
        Variant {
            id: VariantId::new(),
            product_id: ProductId::new(),
            size: size.map(String::from),
            color: color.map(String::from),
            stock: 10,
        }
    }

    #[test]
    fn set_fields_must_match_exactly() {
        let v = variant(Some("M"), Some("black"));
        assert!(v.matches_selection(Some("M"), Some("black")));
        assert!(!v.matches_selection(Some("L"), Some("black")));
        assert!(!v.matches_selection(Some("M"), Some("white")));
        assert!(!v.matches_selection(None, Some("black")));
    }

    #[test]
    fn unset_fields_match_anything() {
        let v = variant(None, Some("black"));
        assert!(v.matches_selection(Some("M"), Some("black")));
        assert!(v.matches_selection(None, Some("black")));
        assert!(!v.matches_selection(Some("M"), Some("white")));

        let v = variant(None, None);
        assert!(v.matches_selection(Some("XL"), Some("red")));
        assert!(v.matches_selection(None, None));
    }

    #[test]
    fn flat_stock_defaults_to_zero() {
        let product = Product {
            id: ProductId::new(),
            name: "Tee".to_string(),
            active: true,
            stock: None,
            sizes: vec![],
            colors: vec![],
            price: Money::from_cents(5000),
            original_price: None,
            created_at: Utc::now(),
        };
        assert_eq!(product.flat_stock(), 0);
    }
}
