//! Payment reconciliation for asynchronous gateway notifications.
//!
//! The payment gateway delivers notifications that are retried,
//! duplicated and reordered in transit. This crate folds them into a
//! single authoritative payment status per order:
//!
//! 1. A notification names a `(topic, resource_id)` pair. The resource
//!    is fetched back from the gateway and normalized to an
//!    `(external_reference, vendor_status)` pair, regardless of topic.
//! 2. The vendor status is mapped onto the internal state machine and
//!    applied through a single conditional store update, so replays
//!    collapse into no-ops and nothing can downgrade a paid order.
//!
//! A notification never produces an error outcome for gateway-side
//! problems: the gateway treats any error response as "retry forever",
//! so unknown topics, unknown orders and unreachable gateways are all
//! reported as distinct no-op outcomes and logged.

pub mod gateway;
pub mod notification;
pub mod reconciler;

pub use gateway::{
    GatewayError, InMemoryPaymentGateway, MerchantOrderRecord, PaymentGateway, PaymentRecord,
};
pub use notification::{NormalizedNotification, Topic, map_vendor_status};
pub use reconciler::{Outcome, PaymentReconciler};
