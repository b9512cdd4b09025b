//! In-memory store implementations for testing and local runs.
//!
//! Every implementation keeps its state behind a single async `RwLock`,
//! so each trait method is one atomic critical section. That gives the
//! same guarantees the PostgreSQL implementations get from conditional
//! statements: merged upserts, sticky paid status, decrement-if-sufficient.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{LineId, OrderId, ProductId, UserId, VariantId};
use domain::{
    CartLine, FulfillmentStatus, Order, PaymentStatus, Product, ShipmentLogEntry, StockUnit,
    Variant,
};
use tokio::sync::RwLock;

use crate::cart::CartStore;
use crate::catalog::CatalogStore;
use crate::order::{OrderStore, PaymentTransition};
use crate::shipment_log::ShipmentLogStore;
use crate::Result;

/// In-memory catalog store.
#[derive(Clone, Default)]
pub struct InMemoryCatalogStore {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
    variants: Arc<RwLock<HashMap<VariantId, Variant>>>,
}

impl InMemoryCatalogStore {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a product.
    pub async fn insert_product(&self, product: Product) {
        self.products.write().await.insert(product.id, product);
    }

    /// Seeds a variant.
    pub async fn insert_variant(&self, variant: Variant) {
        self.variants.write().await.insert(variant.id, variant);
    }

    /// Deletes a product, leaving any cart lines pointing at it behind.
    pub async fn remove_product(&self, id: ProductId) {
        self.products.write().await.remove(&id);
    }

    /// Returns the current stock of a unit, for assertions.
    pub async fn stock_of(&self, unit: &StockUnit) -> Option<u32> {
        match unit {
            StockUnit::Product(id) => self.products.read().await.get(id).and_then(|p| p.stock),
            StockUnit::Variant(id) => self.variants.read().await.get(id).map(|v| v.stock),
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn variants_for_product(&self, product_id: ProductId) -> Result<Vec<Variant>> {
        let variants = self.variants.read().await;
        let mut out: Vec<Variant> = variants
            .values()
            .filter(|v| v.product_id == product_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| (&a.size, &a.color).cmp(&(&b.size, &b.color)));
        Ok(out)
    }

    async fn decrement_stock_if_sufficient(
        &self,
        unit: &StockUnit,
        quantity: u32,
    ) -> Result<bool> {
        match unit {
            StockUnit::Product(id) => {
                let mut products = self.products.write().await;
                let Some(product) = products.get_mut(id) else {
                    return Ok(false);
                };
                match product.stock {
                    Some(stock) if stock >= quantity => {
                        product.stock = Some(stock - quantity);
                        Ok(true)
                    }
                    _ => Ok(false),
                }
            }
            StockUnit::Variant(id) => {
                let mut variants = self.variants.write().await;
                let Some(variant) = variants.get_mut(id) else {
                    return Ok(false);
                };
                if variant.stock >= quantity {
                    variant.stock -= quantity;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
        }
    }
}

/// In-memory cart store.
#[derive(Clone, Default)]
pub struct InMemoryCartStore {
    lines: Arc<RwLock<HashMap<LineId, CartLine>>>,
}

impl InMemoryCartStore {
    /// Creates an empty cart store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of lines across all users, for assertions.
    pub async fn line_count(&self) -> usize {
        self.lines.read().await.len()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn find_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size: Option<&str>,
        color: Option<&str>,
    ) -> Result<Option<CartLine>> {
        let lines = self.lines.read().await;
        Ok(lines
            .values()
            .find(|l| l.key_matches(user_id, product_id, size, color))
            .cloned())
    }

    async fn get_line(&self, user_id: UserId, line_id: LineId) -> Result<Option<CartLine>> {
        let lines = self.lines.read().await;
        Ok(lines
            .get(&line_id)
            .filter(|l| l.user_id == user_id)
            .cloned())
    }

    async fn upsert_line(&self, line: CartLine) -> Result<CartLine> {
        let mut lines = self.lines.write().await;
        // Natural-key scan inside the write lock stands in for the
        // database's unique constraint.
        let existing = lines
            .values_mut()
            .find(|l| {
                l.key_matches(
                    line.user_id,
                    line.product_id,
                    line.size.as_deref(),
                    line.color.as_deref(),
                )
            });
        match existing {
            Some(found) => {
                found.quantity += line.quantity;
                Ok(found.clone())
            }
            None => {
                lines.insert(line.id, line.clone());
                Ok(line)
            }
        }
    }

    async fn set_quantity(&self, user_id: UserId, line_id: LineId, quantity: u32) -> Result<bool> {
        let mut lines = self.lines.write().await;
        match lines.get_mut(&line_id) {
            Some(line) if line.user_id == user_id => {
                line.quantity = quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_line(&self, user_id: UserId, line_id: LineId) -> Result<()> {
        let mut lines = self.lines.write().await;
        if lines.get(&line_id).is_some_and(|l| l.user_id == user_id) {
            lines.remove(&line_id);
        }
        Ok(())
    }

    async fn clear_user(&self, user_id: UserId) -> Result<()> {
        self.lines.write().await.retain(|_, l| l.user_id != user_id);
        Ok(())
    }

    async fn lines_for_user(&self, user_id: UserId) -> Result<Vec<CartLine>> {
        let lines = self.lines.read().await;
        let mut out: Vec<CartLine> = lines
            .values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by_key(|l| l.added_at);
        Ok(out)
    }
}

/// In-memory order store.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates an empty order store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn insert_order(&self, order: &Order) -> Result<()> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn transition_payment(
        &self,
        id: OrderId,
        target: PaymentStatus,
    ) -> Result<PaymentTransition> {
        let mut orders = self.orders.write().await;
        let Some(order) = orders.get_mut(&id) else {
            return Ok(PaymentTransition::NotFound);
        };

        if order.payment_status.is_paid() {
            return Ok(if target.is_paid() {
                PaymentTransition::AlreadyPaid
            } else {
                PaymentTransition::Superseded
            });
        }

        order.payment_status = target;
        let confirmed = target.is_paid();
        if confirmed {
            order.fulfillment_status = FulfillmentStatus::Confirmed;
        }
        Ok(PaymentTransition::Applied { confirmed })
    }

    async fn update_fulfillment(
        &self,
        id: OrderId,
        status: FulfillmentStatus,
        tracking_code: Option<&str>,
    ) -> Result<bool> {
        let mut orders = self.orders.write().await;
        let Some(order) = orders.get_mut(&id) else {
            return Ok(false);
        };
        order.fulfillment_status = status;
        if let Some(code) = tracking_code {
            order.tracking_code = Some(code.to_string());
        }
        Ok(true)
    }
}

/// In-memory shipment log store.
#[derive(Clone, Default)]
pub struct InMemoryShipmentLogStore {
    entries: Arc<RwLock<Vec<ShipmentLogEntry>>>,
}

impl InMemoryShipmentLogStore {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of entries across all orders, for assertions.
    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl ShipmentLogStore for InMemoryShipmentLogStore {
    async fn append(&self, entry: &ShipmentLogEntry) -> Result<()> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn entries_for_order(&self, order_id: OrderId) -> Result<Vec<ShipmentLogEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| e.order_id == order_id)
            .cloned()
            .collect())
    }
}
