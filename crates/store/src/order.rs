use async_trait::async_trait;
use common::OrderId;
use domain::{FulfillmentStatus, Order, PaymentStatus};

use crate::Result;

/// Result of a conditional payment-status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentTransition {
    /// The status was written. `confirmed` is true when the write was the
    /// paid cross-transition that also advanced fulfillment.
    Applied { confirmed: bool },

    /// The order was already paid and the target was `paid` again; the
    /// duplicate delivery is a harmless no-op.
    AlreadyPaid,

    /// The order was already paid and the target would downgrade it;
    /// monotonicity rejected the write.
    Superseded,

    /// No order with this id exists.
    NotFound,
}

/// Order persistence.
///
/// Orders are created at checkout, outside this engine; here they are
/// read and conditionally updated. [`transition_payment`] is the single
/// write the reconciler uses: one conditional statement per notification,
/// so concurrent duplicate or out-of-order deliveries cannot race past
/// the paid-stickiness rule.
///
/// [`transition_payment`]: OrderStore::transition_payment
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Loads an order with its frozen lines.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Persists a new order. Used by the checkout collaborator and tests.
    async fn insert_order(&self, order: &Order) -> Result<()>;

    /// Applies a payment-status transition as one conditional write.
    ///
    /// A `Paid` target also sets fulfillment to `confirmed`, but only
    /// when the order was not already paid; a repeat `Paid` leaves
    /// fulfillment untouched (it may have moved on to `shipped`).
    /// `Pending`/`Failed` targets are refused once the order is paid.
    async fn transition_payment(
        &self,
        id: OrderId,
        target: PaymentStatus,
    ) -> Result<PaymentTransition>;

    /// Updates fulfillment status, and the tracking code when one is
    /// supplied (a `None` tracking code leaves any stored value alone).
    /// Returns false if the order does not exist.
    async fn update_fulfillment(
        &self,
        id: OrderId,
        status: FulfillmentStatus,
        tracking_code: Option<&str>,
    ) -> Result<bool>;
}
