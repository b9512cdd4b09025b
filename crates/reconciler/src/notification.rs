//! Notification normalization.
//!
//! Two vendor topics reach the webhook: direct payment events and
//! merchant-order events that embed a list of payments. Both reduce to
//! the same `(external_reference, vendor_status)` pair here, so the
//! transition logic in [`crate::reconciler`] never sees a topic.

use domain::PaymentStatus;

use crate::gateway::{MerchantOrderRecord, PaymentRecord};

/// Notification topics this engine consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Payment,
    MerchantOrder,
}

impl Topic {
    /// Parses a topic string from the webhook query.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "payment" => Some(Self::Payment),
            "merchant_order" => Some(Self::MerchantOrder),
            _ => None,
        }
    }
}

/// A notification reduced to the two fields the state machine needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedNotification {
    pub external_reference: Option<String>,
    pub vendor_status: Option<String>,
}

impl NormalizedNotification {
    pub fn from_payment(record: PaymentRecord) -> Self {
        Self {
            external_reference: record.external_reference,
            vendor_status: record.status,
        }
    }

    /// The last embedded payment's status wins; earlier attempts on the
    /// same merchant order are superseded by it.
    pub fn from_merchant_order(record: MerchantOrderRecord) -> Self {
        Self {
            external_reference: record.external_reference,
            vendor_status: record.payment_statuses.last().cloned(),
        }
    }
}

/// Maps a vendor status word to the internal target status.
///
/// Unrecognized words map to `None` and are ignored upstream; new vendor
/// vocabulary must never make the webhook error out.
pub fn map_vendor_status(status: &str) -> Option<PaymentStatus> {
    match status {
        "approved" => Some(PaymentStatus::Paid),
        "pending" => Some(PaymentStatus::Pending),
        "rejected" | "cancelled" => Some(PaymentStatus::Failed),
        _ => None,
    }
}
