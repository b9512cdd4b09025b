//! Payment reconciler engine.

use std::time::Duration;

use common::OrderId;
use domain::{EngineError, PaymentStatus};
use store::{OrderStore, PaymentTransition};
use tokio::time::timeout;

use crate::gateway::PaymentGateway;
use crate::notification::{NormalizedNotification, Topic, map_vendor_status};

/// What processing a notification amounted to.
///
/// Only store failures surface as errors; every gateway-side problem is
/// a distinct no-op outcome, because the gateway interprets an error
/// response as "retry forever".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The order's payment status was set to the mapped target.
    Applied(PaymentStatus),
    /// The order is already paid; a replayed `approved` changes nothing.
    AlreadyPaid,
    /// A pending/failed target arrived after paid and was refused.
    Superseded,
    /// The external reference did not match any order.
    UnknownOrder,
    /// The gateway record carried no external reference.
    MissingReference,
    /// The vendor status word maps to nothing we track.
    UnrecognizedStatus,
    /// The topic is not one we consume.
    UnknownTopic,
    /// The gateway answered but knows no such resource.
    UnknownResource,
    /// The gateway could not be reached; nothing was applied.
    GatewayUnavailable,
    /// The gateway did not answer within the configured timeout.
    GatewayTimeout,
}

impl Outcome {
    /// Short machine-readable name, used in the webhook response body.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Applied(_) => "applied",
            Outcome::AlreadyPaid => "already_paid",
            Outcome::Superseded => "superseded",
            Outcome::UnknownOrder => "unknown_order",
            Outcome::MissingReference => "missing_reference",
            Outcome::UnrecognizedStatus => "unrecognized_status",
            Outcome::UnknownTopic => "unknown_topic",
            Outcome::UnknownResource => "unknown_resource",
            Outcome::GatewayUnavailable => "gateway_unavailable",
            Outcome::GatewayTimeout => "gateway_timeout",
        }
    }
}

/// Folds gateway notifications into order payment status.
pub struct PaymentReconciler<G, O>
where
    G: PaymentGateway,
    O: OrderStore,
{
    gateway: G,
    orders: O,
    /// Bound on each gateway fetch. Never retried here; retry policy
    /// belongs to the gateway's own redelivery.
    gateway_timeout: Duration,
}

impl<G, O> PaymentReconciler<G, O>
where
    G: PaymentGateway,
    O: OrderStore,
{
    /// Creates a new reconciler.
    pub fn new(gateway: G, orders: O, gateway_timeout: Duration) -> Self {
        Self {
            gateway,
            orders,
            gateway_timeout,
        }
    }

    /// Processes one `(topic, resource_id)` notification.
    #[tracing::instrument(skip(self))]
    pub async fn process(&self, topic: &str, resource_id: &str) -> Result<Outcome, EngineError> {
        metrics::counter!("payment_notifications_total").increment(1);

        // 1. Fetch the resource back and normalize it
        let Some(topic) = Topic::parse(topic) else {
            tracing::info!(resource_id, "unrecognized notification topic; ignoring");
            return Ok(Outcome::UnknownTopic);
        };

        let normalized = match topic {
            Topic::Payment => {
                match timeout(self.gateway_timeout, self.gateway.fetch_payment(resource_id)).await {
                    Err(_) => {
                        tracing::warn!(resource_id, "gateway fetch timed out");
                        return Ok(Outcome::GatewayTimeout);
                    }
                    Ok(Err(err)) => {
                        tracing::warn!(resource_id, error = %err, "gateway fetch failed");
                        return Ok(Outcome::GatewayUnavailable);
                    }
                    Ok(Ok(None)) => {
                        tracing::warn!(resource_id, "gateway knows no such payment");
                        return Ok(Outcome::UnknownResource);
                    }
                    Ok(Ok(Some(record))) => NormalizedNotification::from_payment(record),
                }
            }
            Topic::MerchantOrder => {
                match timeout(
                    self.gateway_timeout,
                    self.gateway.fetch_merchant_order(resource_id),
                )
                .await
                {
                    Err(_) => {
                        tracing::warn!(resource_id, "gateway fetch timed out");
                        return Ok(Outcome::GatewayTimeout);
                    }
                    Ok(Err(err)) => {
                        tracing::warn!(resource_id, error = %err, "gateway fetch failed");
                        return Ok(Outcome::GatewayUnavailable);
                    }
                    Ok(Ok(None)) => {
                        tracing::warn!(resource_id, "gateway knows no such merchant order");
                        return Ok(Outcome::UnknownResource);
                    }
                    Ok(Ok(Some(record))) => NormalizedNotification::from_merchant_order(record),
                }
            }
        };

        // 2. Correlate back to an order
        let Some(reference) = normalized.external_reference else {
            tracing::warn!(resource_id, "notification carries no external reference");
            return Ok(Outcome::MissingReference);
        };
        let Ok(order_id) = OrderId::parse(&reference) else {
            tracing::warn!(resource_id, reference, "external reference is not an order id");
            return Ok(Outcome::UnknownOrder);
        };

        let Some(status_word) = normalized.vendor_status else {
            tracing::info!(resource_id, %order_id, "notification carries no payment status");
            return Ok(Outcome::UnrecognizedStatus);
        };
        let Some(target) = map_vendor_status(&status_word) else {
            tracing::info!(
                resource_id,
                %order_id,
                status = %status_word,
                "vendor status maps to nothing we track; ignoring"
            );
            return Ok(Outcome::UnrecognizedStatus);
        };

        // 3. Apply through a single conditional update. Replays and
        //    out-of-order deliveries are decided at the store, not here,
        //    so concurrent notifications for one order cannot interleave
        //    between a read and a write.
        let transition = self.orders.transition_payment(order_id, target).await?;
        let outcome = match transition {
            PaymentTransition::Applied { confirmed } => {
                metrics::counter!("payment_transitions_applied_total").increment(1);
                tracing::info!(%order_id, status = %target, confirmed, "payment status applied");
                Outcome::Applied(target)
            }
            PaymentTransition::AlreadyPaid => {
                tracing::info!(%order_id, "order already paid; replay ignored");
                Outcome::AlreadyPaid
            }
            PaymentTransition::Superseded => {
                metrics::counter!("payment_downgrades_refused_total").increment(1);
                tracing::warn!(
                    %order_id,
                    attempted = %target,
                    "refusing downgrade of a paid order"
                );
                Outcome::Superseded
            }
            PaymentTransition::NotFound => {
                tracing::warn!(%order_id, resource_id, "notification references unknown order");
                Outcome::UnknownOrder
            }
        };
        Ok(outcome)
    }
}
