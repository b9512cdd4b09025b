use async_trait::async_trait;
use common::OrderId;
use domain::ShipmentLogEntry;

use crate::Result;

/// Append-only log of shipment label steps, per order.
///
/// The orchestrator appends an entry after every step, before starting
/// the next one. A failed or crashed run therefore always leaves behind
/// the provider-side shipment id of anything it purchased.
#[async_trait]
pub trait ShipmentLogStore: Send + Sync {
    /// Appends one step record.
    async fn append(&self, entry: &ShipmentLogEntry) -> Result<()>;

    /// Returns all recorded steps for an order, in append order.
    async fn entries_for_order(&self, order_id: OrderId) -> Result<Vec<ShipmentLogEntry>>;
}
