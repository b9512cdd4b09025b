//! Cart ledger engine.

use common::{LineId, Money, ProductId, UserId};
use domain::{CartLine, EngineError, resolve};
use store::{CartStore, CatalogStore};

use crate::view::{CartView, CartViewLine};

/// Outcome of a quantity update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The line now holds the requested quantity.
    Updated(CartLine),
    /// The requested quantity was zero, so the line was deleted.
    Removed,
}

/// Owns cart-line lifecycle and the stock-sufficiency check.
///
/// Every mutation validates against the quantity the inventory resolver
/// reports at that moment. The check is optimistic: two concurrent
/// writers may both pass it, and the store's natural-key constraint
/// merges their lines rather than duplicating them. The hard oversell
/// boundary is the atomic decrement at order confirmation, not here.
pub struct CartLedger<C, S>
where
    C: CatalogStore,
    S: CartStore,
{
    catalog: C,
    cart: S,
}

impl<C, S> CartLedger<C, S>
where
    C: CatalogStore,
    S: CartStore,
{
    /// Creates a new cart ledger.
    pub fn new(catalog: C, cart: S) -> Self {
        Self { catalog, cart }
    }

    /// Adds `quantity` units of a product to the user's cart, merging
    /// with any existing line for the same (product, size, color).
    ///
    /// `quantity` must be at least 1; the HTTP layer rejects zero before
    /// it reaches the ledger.
    #[tracing::instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
        size: Option<String>,
        color: Option<String>,
    ) -> Result<CartLine, EngineError> {
        metrics::counter!("cart_adds_total").increment(1);

        // 1. Resolve the stock unit for the requested selection
        let product = self
            .catalog
            .get_product(product_id)
            .await?
            .ok_or_else(|| EngineError::not_found("product", product_id))?;
        let variants = self.catalog.variants_for_product(product_id).await?;
        let resolution = resolve(&product, &variants, size.as_deref(), color.as_deref())?;

        if resolution.available == 0 {
            metrics::counter!("cart_rejections_total").increment(1);
            return Err(EngineError::OutOfStock);
        }

        // 2. Merge with whatever the user already holds for this key
        let existing = self
            .cart
            .find_line(user_id, product_id, size.as_deref(), color.as_deref())
            .await?;
        let held = existing.map(|line| line.quantity).unwrap_or(0);
        let desired = held + quantity;
        if desired > resolution.available {
            metrics::counter!("cart_rejections_total").increment(1);
            return Err(EngineError::InsufficientStock {
                available: resolution.available,
            });
        }

        // 3. Single atomic upsert; the store merges on the natural key
        let line = self
            .cart
            .upsert_line(CartLine::new(user_id, product_id, size, color, quantity))
            .await?;

        tracing::info!(
            %user_id,
            %product_id,
            quantity = line.quantity,
            "cart line upserted"
        );
        Ok(line)
    }

    /// Sets a line to a new quantity, re-validating against current
    /// stock. Zero deletes the line; this path never consults the
    /// catalog, so a line whose product has vanished can still be
    /// removed.
    #[tracing::instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        line_id: LineId,
        quantity: u32,
    ) -> Result<UpdateOutcome, EngineError> {
        if quantity == 0 {
            self.cart.delete_line(user_id, line_id).await?;
            return Ok(UpdateOutcome::Removed);
        }

        let line = self
            .cart
            .get_line(user_id, line_id)
            .await?
            .ok_or_else(|| EngineError::not_found("cart line", line_id))?;

        // Stock may have moved since the line was created; re-resolve.
        let product = self
            .catalog
            .get_product(line.product_id)
            .await?
            .ok_or_else(|| EngineError::not_found("product", line.product_id))?;
        let variants = self.catalog.variants_for_product(line.product_id).await?;
        let resolution = resolve(&product, &variants, line.size.as_deref(), line.color.as_deref())?;

        if resolution.available == 0 {
            metrics::counter!("cart_rejections_total").increment(1);
            return Err(EngineError::OutOfStock);
        }
        if quantity > resolution.available {
            metrics::counter!("cart_rejections_total").increment(1);
            return Err(EngineError::InsufficientStock {
                available: resolution.available,
            });
        }

        if !self.cart.set_quantity(user_id, line_id, quantity).await? {
            // The line was deleted between our read and this write.
            return Err(EngineError::not_found("cart line", line_id));
        }

        let mut line = line;
        line.quantity = quantity;
        Ok(UpdateOutcome::Updated(line))
    }

    /// Deletes a line. Removing an absent line is not an error.
    #[tracing::instrument(skip(self))]
    pub async fn remove_from_cart(
        &self,
        user_id: UserId,
        line_id: LineId,
    ) -> Result<(), EngineError> {
        self.cart.delete_line(user_id, line_id).await?;
        Ok(())
    }

    /// Deletes every line the user holds. A no-op on an empty cart.
    #[tracing::instrument(skip(self))]
    pub async fn clear_cart(&self, user_id: UserId) -> Result<(), EngineError> {
        self.cart.clear_user(user_id).await?;
        Ok(())
    }

    /// Returns the cart joined with current catalog names and prices.
    ///
    /// Lines whose product no longer exists carry no price and are
    /// dropped from the view (and logged).
    pub async fn view_cart(&self, user_id: UserId) -> Result<CartView, EngineError> {
        let lines = self.cart.lines_for_user(user_id).await?;

        let mut view_lines = Vec::with_capacity(lines.len());
        let mut total = Money::zero();
        let mut item_count = 0u32;
        for line in lines {
            let Some(product) = self.catalog.get_product(line.product_id).await? else {
                tracing::warn!(
                    line_id = %line.id,
                    product_id = %line.product_id,
                    "cart line references a missing product"
                );
                continue;
            };
            let line_total = product.price.multiply(line.quantity);
            total += line_total;
            item_count += line.quantity;
            view_lines.push(CartViewLine {
                line_id: line.id,
                product_id: line.product_id,
                name: product.name,
                unit_price: product.price,
                quantity: line.quantity,
                size: line.size,
                color: line.color,
                line_total,
            });
        }

        Ok(CartView {
            lines: view_lines,
            total,
            item_count,
        })
    }

    /// Sum of quantity times current price across the cart.
    pub async fn cart_total(&self, user_id: UserId) -> Result<Money, EngineError> {
        Ok(self.view_cart(user_id).await?.total)
    }

    /// Total number of units in the cart. Never consults the catalog.
    pub async fn cart_count(&self, user_id: UserId) -> Result<u32, EngineError> {
        let lines = self.cart.lines_for_user(user_id).await?;
        Ok(lines.iter().map(|line| line.quantity).sum())
    }
}
