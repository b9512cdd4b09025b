//! Payment and fulfillment state machines.
//!
//! An order carries two independent statuses. They touch in exactly one
//! place: the transition to [`PaymentStatus::Paid`] also advances
//! fulfillment to [`FulfillmentStatus::Confirmed`] (when not already
//! paid). That cross-transition is applied by the reconciler through the
//! order store's conditional update; nothing else couples the two.

use serde::{Deserialize, Serialize};

/// Payment status of an order, driven by gateway notifications.
///
/// State transitions:
/// ```text
/// Unset ──┬──► Pending ──► Paid
///         │       │         ▲
///         └──► Failed ──────┘
/// ```
///
/// Notifications arrive out of order, so every state may move to every
/// other with one exception: `Paid` is sticky. Once reached, `Pending`
/// and `Failed` notifications are rejected (monotonicity). Re-applying
/// `Paid` is a no-op, which is what makes duplicated gateway deliveries
/// harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// No notification has been reconciled yet.
    #[default]
    Unset,

    /// The gateway reported the payment as in flight.
    Pending,

    /// The gateway approved the payment (sticky).
    Paid,

    /// The gateway rejected or cancelled the payment.
    Failed,
}

impl PaymentStatus {
    /// Returns true if a transition to `target` is allowed from this
    /// status.
    ///
    /// Everything is allowed except downgrading away from `Paid`.
    pub fn can_become(&self, target: PaymentStatus) -> bool {
        !matches!(
            (self, target),
            (PaymentStatus::Paid, PaymentStatus::Pending | PaymentStatus::Failed)
        )
    }

    /// Returns true if the order's payment is settled.
    pub fn is_paid(&self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }

    /// Returns the status name as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unset => "unset",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }

    /// Parses a stored status string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unset" => Some(PaymentStatus::Unset),
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fulfillment status of an order.
///
/// State transitions:
/// ```text
/// Placed ──► Confirmed ──► Shipped
/// ```
///
/// `Confirmed` is reached through the payment cross-transition; `Shipped`
/// is written by the shipment orchestrator once a tracking code exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    /// Order exists but payment has not been confirmed.
    #[default]
    Placed,

    /// Payment confirmed; the order is eligible for label generation.
    Confirmed,

    /// A label was purchased and a tracking code recorded (terminal).
    Shipped,
}

impl FulfillmentStatus {
    /// Returns true if the shipment orchestrator may run for this order.
    pub fn can_ship(&self) -> bool {
        matches!(self, FulfillmentStatus::Confirmed)
    }

    /// Returns true if this is the terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FulfillmentStatus::Shipped)
    }

    /// Returns the status name as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStatus::Placed => "placed",
            FulfillmentStatus::Confirmed => "confirmed",
            FulfillmentStatus::Shipped => "shipped",
        }
    }

    /// Parses a stored status string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "placed" => Some(FulfillmentStatus::Placed),
            "confirmed" => Some(FulfillmentStatus::Confirmed),
            "shipped" => Some(FulfillmentStatus::Shipped),
            _ => None,
        }
    }
}

impl std::fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_statuses() {
        assert_eq!(PaymentStatus::default(), PaymentStatus::Unset);
        assert_eq!(FulfillmentStatus::default(), FulfillmentStatus::Placed);
    }

    #[test]
    fn paid_is_sticky() {
        assert!(!PaymentStatus::Paid.can_become(PaymentStatus::Pending));
        assert!(!PaymentStatus::Paid.can_become(PaymentStatus::Failed));
        assert!(PaymentStatus::Paid.can_become(PaymentStatus::Paid));
    }

    #[test]
    fn non_paid_states_accept_anything() {
        for from in [PaymentStatus::Unset, PaymentStatus::Pending, PaymentStatus::Failed] {
            for to in [
                PaymentStatus::Unset,
                PaymentStatus::Pending,
                PaymentStatus::Paid,
                PaymentStatus::Failed,
            ] {
                assert!(from.can_become(to), "{from} -> {to} should be allowed");
            }
        }
    }

    #[test]
    fn only_confirmed_can_ship() {
        assert!(!FulfillmentStatus::Placed.can_ship());
        assert!(FulfillmentStatus::Confirmed.can_ship());
        assert!(!FulfillmentStatus::Shipped.can_ship());
    }

    #[test]
    fn shipped_is_terminal() {
        assert!(!FulfillmentStatus::Placed.is_terminal());
        assert!(!FulfillmentStatus::Confirmed.is_terminal());
        assert!(FulfillmentStatus::Shipped.is_terminal());
    }

    #[test]
    fn parse_roundtrips_as_str() {
        for status in [
            PaymentStatus::Unset,
            PaymentStatus::Pending,
            PaymentStatus::Paid,
            PaymentStatus::Failed,
        ] {
            assert_eq!(PaymentStatus::parse(status.as_str()), Some(status));
        }
        for status in [
            FulfillmentStatus::Placed,
            FulfillmentStatus::Confirmed,
            FulfillmentStatus::Shipped,
        ] {
            assert_eq!(FulfillmentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PaymentStatus::parse("refunded"), None);
    }

    #[test]
    fn serde_uses_snake_case_strings() {
        assert_eq!(serde_json::to_string(&PaymentStatus::Paid).unwrap(), "\"paid\"");
        assert_eq!(
            serde_json::to_string(&FulfillmentStatus::Confirmed).unwrap(),
            "\"confirmed\""
        );
    }
}
