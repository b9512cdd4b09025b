use async_trait::async_trait;
use common::ProductId;
use domain::{Product, StockUnit, Variant};

use crate::Result;

/// Read access to the catalog plus the stock-decrement hook.
///
/// The catalog is owned by admin tooling outside this engine; cart
/// validation only reads it. The one write, [`decrement_stock_if_sufficient`],
/// is the atomic check-and-decrement that order confirmation relies on as
/// the true oversell boundary (cart-time checks are best effort).
///
/// [`decrement_stock_if_sufficient`]: CatalogStore::decrement_stock_if_sufficient
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Loads a product by id.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Loads all variants of a product. Empty means flat-stock mode.
    async fn variants_for_product(&self, product_id: ProductId) -> Result<Vec<Variant>>;

    /// Atomically decrements stock for a unit if at least `quantity`
    /// units remain.
    ///
    /// Returns false (and decrements nothing) when stock is short. This
    /// must be a single conditional write, never read-then-write.
    async fn decrement_stock_if_sufficient(&self, unit: &StockUnit, quantity: u32)
    -> Result<bool>;
}
