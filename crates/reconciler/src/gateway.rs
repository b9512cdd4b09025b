//! Payment gateway trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

/// Raised when the gateway cannot be reached or answers with an error.
#[derive(Debug, Clone, thiserror::Error)]
#[error("gateway request failed: {0}")]
pub struct GatewayError(pub String);

/// A payment event fetched back from the gateway.
///
/// Only the fields this engine extracts are modeled; everything else in
/// the vendor payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRecord {
    /// The order id as the gateway knows it.
    pub external_reference: Option<String>,
    /// The vendor's status word, e.g. "approved".
    pub status: Option<String>,
}

/// A merchant order fetched back from the gateway, embedding the status
/// words of its payments in vendor order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerchantOrderRecord {
    pub external_reference: Option<String>,
    pub payment_statuses: Vec<String>,
}

/// Trait for fetching notification resources back from the gateway.
///
/// `Ok(None)` means the gateway answered but knows no such resource.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Fetches a payment event by its gateway resource id.
    async fn fetch_payment(&self, resource_id: &str)
    -> Result<Option<PaymentRecord>, GatewayError>;

    /// Fetches a merchant order by its gateway resource id.
    async fn fetch_merchant_order(
        &self,
        resource_id: &str,
    ) -> Result<Option<MerchantOrderRecord>, GatewayError>;
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    payments: HashMap<String, PaymentRecord>,
    merchant_orders: HashMap<String, MerchantOrderRecord>,
    fail_on_fetch: bool,
    fetch_count: u32,
}

/// In-memory payment gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a payment resource under the given id.
    pub fn insert_payment(&self, resource_id: &str, record: PaymentRecord) {
        self.state
            .write()
            .unwrap()
            .payments
            .insert(resource_id.to_string(), record);
    }

    /// Registers a merchant order resource under the given id.
    pub fn insert_merchant_order(&self, resource_id: &str, record: MerchantOrderRecord) {
        self.state
            .write()
            .unwrap()
            .merchant_orders
            .insert(resource_id.to_string(), record);
    }

    /// Configures the gateway to fail every fetch.
    pub fn set_fail_on_fetch(&self, fail: bool) {
        self.state.write().unwrap().fail_on_fetch = fail;
    }

    /// Returns how many fetches have been served or refused.
    pub fn fetch_count(&self) -> u32 {
        self.state.read().unwrap().fetch_count
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn fetch_payment(
        &self,
        resource_id: &str,
    ) -> Result<Option<PaymentRecord>, GatewayError> {
        let mut state = self.state.write().unwrap();
        state.fetch_count += 1;
        if state.fail_on_fetch {
            return Err(GatewayError("connection refused".to_string()));
        }
        Ok(state.payments.get(resource_id).cloned())
    }

    async fn fetch_merchant_order(
        &self,
        resource_id: &str,
    ) -> Result<Option<MerchantOrderRecord>, GatewayError> {
        let mut state = self.state.write().unwrap();
        state.fetch_count += 1;
        if state.fail_on_fetch {
            return Err(GatewayError("connection refused".to_string()));
        }
        Ok(state.merchant_orders.get(resource_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_round_trip() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.insert_payment(
            "123",
            PaymentRecord {
                external_reference: Some("order-1".to_string()),
                status: Some("approved".to_string()),
            },
        );

        let record = gateway.fetch_payment("123").await.unwrap().unwrap();
        assert_eq!(record.status.as_deref(), Some("approved"));
        assert!(gateway.fetch_payment("999").await.unwrap().is_none());
        assert_eq!(gateway.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_fail_on_fetch() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.set_fail_on_fetch(true);

        assert!(gateway.fetch_payment("123").await.is_err());
        assert!(gateway.fetch_merchant_order("123").await.is_err());
    }
}
