//! Shipment label orchestrator.

use std::future::Future;
use std::time::Duration;

use common::OrderId;
use domain::{
    EngineError, FulfillmentStatus, LabelStep, Order, PackageDimensions, ShipmentLogEntry,
};
use serde::Serialize;
use store::{OrderStore, ShipmentLogStore};
use tokio::time::timeout;

use crate::provider::{
    CartAddRequest, DeclaredProduct, ProviderFailure, ShipmentOptions, ShippingProvider,
};

/// Input for one label generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRequest {
    pub order_id: OrderId,
    /// Provider carrier/service selector.
    pub service_id: u32,
    /// Shipment origin, supplied by the operator.
    pub from: domain::Address,
}

/// Result of a run that got at least as far as a printed label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelOutcome {
    pub shipment_id: String,
    pub label_url: String,
    /// `None` when the provider had no tracking code yet. The label is
    /// still usable; the order stays at confirmed.
    pub tracking_code: Option<String>,
}

/// Drives the five-step label sequence against the shipping provider.
///
/// Steps run strictly in order and there is no rollback: a failure at
/// step k aborts the rest and surfaces the provider's payload, with
/// steps 1..k-1 left standing on the provider side. Every attempt is
/// persisted to the shipment log before the next call, so the
/// provider-side shipment id survives a crash.
///
/// Concurrent runs for one order are the caller's problem: dispatch
/// must keep a single active run per order or risk buying two labels.
pub struct ShipmentOrchestrator<P, O, L>
where
    P: ShippingProvider,
    O: OrderStore,
    L: ShipmentLogStore,
{
    provider: P,
    orders: O,
    log: L,
    /// Bound on each individual provider call.
    step_timeout: Duration,
}

impl<P, O, L> ShipmentOrchestrator<P, O, L>
where
    P: ShippingProvider,
    O: OrderStore,
    L: ShipmentLogStore,
{
    /// Creates a new orchestrator.
    pub fn new(provider: P, orders: O, log: L, step_timeout: Duration) -> Self {
        Self {
            provider,
            orders,
            log,
            step_timeout,
        }
    }

    /// Runs the full label sequence for a confirmed order.
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn generate_label(&self, request: LabelRequest) -> Result<LabelOutcome, EngineError> {
        metrics::counter!("label_runs_total").increment(1);
        let run_start = std::time::Instant::now();

        // 1. Load and gate the order
        let order = self
            .orders
            .get_order(request.order_id)
            .await?
            .ok_or_else(|| EngineError::not_found("order", request.order_id))?;

        if !order.fulfillment_status.can_ship() {
            return Err(EngineError::OrderNotReady(format!(
                "order is {}, expected confirmed",
                order.fulfillment_status
            )));
        }
        let cart_request = build_cart_request(&order, &request)?;

        // 2. CartAdd produces the provider-side shipment id
        tracing::info!(step = LabelStep::CartAdd.as_str(), "label step started");
        let shipment_id = match timeout(
            self.step_timeout,
            self.provider.add_to_cart(&cart_request),
        )
        .await
        {
            Err(_) => {
                self.record_failure(order.id, LabelStep::CartAdd, None, timeout_payload())
                    .await?;
                return Err(EngineError::Timeout {
                    step: LabelStep::CartAdd.as_str(),
                });
            }
            Ok(Err(failure)) => {
                self.record_failure(order.id, LabelStep::CartAdd, None, failure.payload.clone())
                    .await?;
                return Err(EngineError::Upstream {
                    step: LabelStep::CartAdd.as_str(),
                    payload: failure.payload,
                });
            }
            Ok(Ok(id)) => id,
        };

        // The shipment id hits the log before any further call, so a
        // crash from here on cannot orphan a purchased label.
        self.log
            .append(&ShipmentLogEntry::completed(
                order.id,
                LabelStep::CartAdd,
                Some(shipment_id.clone()),
            ))
            .await?;

        // 3. Checkout purchases the label, Generate and Print make it
        //    retrievable. Any failure aborts the rest.
        self.run_step(
            order.id,
            LabelStep::Checkout,
            &shipment_id,
            self.provider.checkout(&shipment_id),
        )
        .await?;
        self.run_step(
            order.id,
            LabelStep::Generate,
            &shipment_id,
            self.provider.generate(&shipment_id),
        )
        .await?;
        let label_url = self
            .run_step(
                order.id,
                LabelStep::Print,
                &shipment_id,
                self.provider.print_label(&shipment_id),
            )
            .await?;

        // 4. Track is best effort: the label is already purchased and
        //    printed, so a tracking failure downgrades to a partial
        //    success instead of aborting the run.
        tracing::info!(step = LabelStep::Track.as_str(), "label step started");
        let tracking_code = match timeout(self.step_timeout, self.provider.track(&shipment_id))
            .await
        {
            Err(_) => {
                self.record_failure(
                    order.id,
                    LabelStep::Track,
                    Some(&shipment_id),
                    timeout_payload(),
                )
                .await?;
                None
            }
            Ok(Err(failure)) => {
                self.record_failure(
                    order.id,
                    LabelStep::Track,
                    Some(&shipment_id),
                    failure.payload,
                )
                .await?;
                None
            }
            Ok(Ok(code)) => {
                self.log
                    .append(&ShipmentLogEntry::completed(
                        order.id,
                        LabelStep::Track,
                        Some(shipment_id.clone()),
                    ))
                    .await?;
                code
            }
        };

        // 5. Write back only with a tracking code in hand; without one
        //    the order stays at confirmed for a later sweep.
        if let Some(code) = &tracking_code {
            let updated = self
                .orders
                .update_fulfillment(order.id, FulfillmentStatus::Shipped, Some(code))
                .await?;
            if !updated {
                tracing::warn!(order_id = %order.id, "order vanished before fulfillment write-back");
            }
            metrics::counter!("orders_shipped_total").increment(1);
        } else {
            tracing::warn!(
                order_id = %order.id,
                %shipment_id,
                "label purchased without a tracking code"
            );
        }

        metrics::histogram!("label_run_duration_seconds").record(run_start.elapsed().as_secs_f64());
        tracing::info!(
            order_id = %order.id,
            %shipment_id,
            tracked = tracking_code.is_some(),
            "label run finished"
        );

        Ok(LabelOutcome {
            shipment_id,
            label_url,
            tracking_code,
        })
    }

    /// Runs one mid-sequence step: bounded call, persisted outcome,
    /// abort on failure.
    async fn run_step<T>(
        &self,
        order_id: OrderId,
        step: LabelStep,
        shipment_id: &str,
        call: impl Future<Output = Result<T, ProviderFailure>> + Send,
    ) -> Result<T, EngineError> {
        tracing::info!(step = step.as_str(), "label step started");
        match timeout(self.step_timeout, call).await {
            Err(_) => {
                self.record_failure(order_id, step, Some(shipment_id), timeout_payload())
                    .await?;
                Err(EngineError::Timeout {
                    step: step.as_str(),
                })
            }
            Ok(Err(failure)) => {
                self.record_failure(order_id, step, Some(shipment_id), failure.payload.clone())
                    .await?;
                Err(EngineError::Upstream {
                    step: step.as_str(),
                    payload: failure.payload,
                })
            }
            Ok(Ok(value)) => {
                self.log
                    .append(&ShipmentLogEntry::completed(
                        order_id,
                        step,
                        Some(shipment_id.to_string()),
                    ))
                    .await?;
                Ok(value)
            }
        }
    }

    async fn record_failure(
        &self,
        order_id: OrderId,
        step: LabelStep,
        shipment_id: Option<&str>,
        payload: serde_json::Value,
    ) -> Result<(), EngineError> {
        metrics::counter!("label_step_failures_total").increment(1);
        tracing::warn!(%order_id, step = step.as_str(), "label step failed");
        self.log
            .append(&ShipmentLogEntry::failed(
                order_id,
                step,
                shipment_id.map(String::from),
                payload,
            ))
            .await?;
        Ok(())
    }
}

fn timeout_payload() -> serde_json::Value {
    serde_json::json!({"error": "timed out"})
}

/// Builds the provider cart payload from the order and operator input.
///
/// The whole order ships as a single declared bundle valued at the
/// subtotal; the provider never sees individual line items.
fn build_cart_request(order: &Order, request: &LabelRequest) -> Result<CartAddRequest, EngineError> {
    let Some(to) = order.shipping_address.clone() else {
        return Err(EngineError::OrderNotReady(
            "order has no shipping address".to_string(),
        ));
    };

    let declared_value = order.subtotal.to_decimal_string();
    Ok(CartAddRequest {
        service_id: request.service_id,
        from: request.from.clone(),
        to,
        declared_products: vec![DeclaredProduct {
            name: format!("Order {}", order.id.short()),
            quantity: 1,
            unitary_value: declared_value.clone(),
        }],
        package: PackageDimensions::for_item_count(order.total_items()),
        options: ShipmentOptions {
            insurance_value: declared_value,
            receipt: false,
            own_hand: false,
            collect: false,
        },
    })
}
