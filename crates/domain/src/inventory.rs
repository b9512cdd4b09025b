//! Inventory resolver.
//!
//! Pure function over catalog data: given a product, its variants and an
//! optional (size, color) selection, determine which stock unit applies
//! and how many units are available. All cart writes and the final
//! confirmation decrement go through the unit identified here.

use common::{ProductId, VariantId};
use serde::{Deserialize, Serialize};

use crate::catalog::{Product, Variant};
use crate::error::EngineError;

/// The stock unit a selection resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockUnit {
    /// Flat product-level stock (product has no variants).
    Product(ProductId),
    /// Variant-level stock.
    Variant(VariantId),
}

/// Result of resolving a selection against the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub unit: StockUnit,
    /// Units available right now. Zero for inactive products regardless
    /// of recorded stock.
    pub available: u32,
}

/// Resolves a (size, color) selection to a stock unit and its available
/// quantity.
///
/// Selection is required per attribute when the product declares options
/// for it or any variant sets it; a missing required attribute is
/// [`EngineError::SelectionRequired`]. With variants present, exactly one
/// variant must match the selection under the wildcard rule (an unset
/// variant field matches anything, a set field must match exactly);
/// otherwise [`EngineError::SelectionAmbiguous`] carries the match count.
/// There is never a silent fallback from variant stock to flat stock.
pub fn resolve(
    product: &Product,
    variants: &[Variant],
    size: Option<&str>,
    color: Option<&str>,
) -> Result<Resolution, EngineError> {
    let size_required =
        !product.sizes.is_empty() || variants.iter().any(|v| v.size.is_some());
    if size_required && size.is_none() {
        return Err(EngineError::SelectionRequired { attribute: "size" });
    }

    let color_required =
        !product.colors.is_empty() || variants.iter().any(|v| v.color.is_some());
    if color_required && color.is_none() {
        return Err(EngineError::SelectionRequired { attribute: "color" });
    }

    if variants.is_empty() {
        let available = if product.active { product.flat_stock() } else { 0 };
        return Ok(Resolution {
            unit: StockUnit::Product(product.id),
            available,
        });
    }

    let matches: Vec<&Variant> = variants
        .iter()
        .filter(|v| v.matches_selection(size, color))
        .collect();
    let [variant] = matches.as_slice() else {
        return Err(EngineError::SelectionAmbiguous {
            matches: matches.len(),
        });
    };

    let available = if product.active { variant.stock } else { 0 };
    Ok(Resolution {
        unit: StockUnit::Variant(variant.id),
        available,
    })
}
