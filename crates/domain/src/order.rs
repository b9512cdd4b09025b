//! Order records.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::status::{FulfillmentStatus, PaymentStatus};

/// A line captured on an order at checkout time.
///
/// Name, price and selection are frozen snapshots; they are never
/// recomputed from live catalog data. This is the opposite of cart
/// views, which always read current prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl OrderLine {
    /// Returns the total for this line (quantity x frozen unit price).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A postal address, used both as the shipment origin (operator-supplied)
/// and destination (captured on the order at checkout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub name: String,
    pub phone: String,
    pub email: String,
    /// National identity document required by the shipping provider.
    pub document: String,
    pub address: String,
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    pub district: String,
    pub city: String,
    pub state_abbr: String,
    pub postal_code: String,
}

/// A customer order.
///
/// Created at checkout (outside this engine). The payment reconciler
/// owns `payment_status`, the shipment orchestrator owns
/// `fulfillment_status` and `tracking_code`; nothing else mutates an
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub payment_status: PaymentStatus,
    pub fulfillment_status: FulfillmentStatus,
    /// Set together with the transition to `Shipped`, never before.
    pub tracking_code: Option<String>,
    pub subtotal: Money,
    pub shipping_address: Option<Address>,
    pub lines: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Creates a freshly placed, unpaid order.
    pub fn place(
        user_id: UserId,
        subtotal: Money,
        shipping_address: Option<Address>,
        lines: Vec<OrderLine>,
    ) -> Self {
        Self {
            id: OrderId::new(),
            user_id,
            payment_status: PaymentStatus::Unset,
            fulfillment_status: FulfillmentStatus::Placed,
            tracking_code: None,
            subtotal,
            shipping_address,
            lines,
            created_at: Utc::now(),
        }
    }

    /// Total number of physical items across all lines, which feeds the
    /// package dimension heuristic.
    pub fn total_items(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: u32) -> OrderLine {
        OrderLine {
            product_id: ProductId::new(),
            name: "Widget".to_string(),
            unit_price: Money::from_cents(1000),
            quantity,
            size: None,
            color: None,
        }
    }

    #[test]
    fn placed_order_starts_unpaid() {
        let order = Order::place(UserId::new(), Money::from_cents(3000), None, vec![line(3)]);
        assert_eq!(order.payment_status, PaymentStatus::Unset);
        assert_eq!(order.fulfillment_status, FulfillmentStatus::Placed);
        assert!(order.tracking_code.is_none());
    }

    #[test]
    fn total_items_sums_quantities() {
        let order = Order::place(
            UserId::new(),
            Money::from_cents(5000),
            None,
            vec![line(2), line(3)],
        );
        assert_eq!(order.total_items(), 5);
    }

    #[test]
    fn line_total_uses_frozen_price() {
        assert_eq!(line(4).line_total().cents(), 4000);
    }

    #[test]
    fn address_complement_is_optional_in_json() {
        let addr = Address {
            name: "Ana Souza".to_string(),
            phone: "11999990000".to_string(),
            email: "ana@example.com".to_string(),
            document: "12345678900".to_string(),
            address: "Rua das Flores".to_string(),
            number: "42".to_string(),
            complement: None,
            district: "Centro".to_string(),
            city: "Sao Paulo".to_string(),
            state_abbr: "SP".to_string(),
            postal_code: "01001-000".to_string(),
        };
        let json = serde_json::to_value(&addr).unwrap();
        assert!(json.get("complement").is_none());
    }
}
