//! Shipping provider trait and in-memory implementation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::{Address, PackageDimensions};
use serde::Serialize;

/// Raised when the provider refuses a call. Carries the provider's raw
/// response body for the step log.
#[derive(Debug, Clone, thiserror::Error)]
#[error("provider call failed: {payload}")]
pub struct ProviderFailure {
    pub payload: serde_json::Value,
}

impl ProviderFailure {
    pub fn new(payload: serde_json::Value) -> Self {
        Self { payload }
    }
}

/// A product line as declared to the provider for customs/insurance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeclaredProduct {
    pub name: String,
    pub quantity: u32,
    /// Declared unit value in the provider's decimal format, e.g. "123.45".
    pub unitary_value: String,
}

/// Provider-side shipment options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipmentOptions {
    pub insurance_value: String,
    pub receipt: bool,
    pub own_hand: bool,
    pub collect: bool,
}

/// Payload for the provider's cart-add call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartAddRequest {
    pub service_id: u32,
    pub from: Address,
    pub to: Address,
    pub declared_products: Vec<DeclaredProduct>,
    pub package: PackageDimensions,
    pub options: ShipmentOptions,
}

/// Trait for the external shipping provider.
///
/// Each method is one remote call. None of them are idempotent on the
/// provider side; the orchestrator never retries them.
#[async_trait]
pub trait ShippingProvider: Send + Sync {
    /// Registers the shipment; returns the provider-side shipment id.
    async fn add_to_cart(&self, request: &CartAddRequest) -> Result<String, ProviderFailure>;

    /// Purchases the label. This is the step that charges the account.
    async fn checkout(&self, shipment_id: &str) -> Result<(), ProviderFailure>;

    /// Requests label artifact generation.
    async fn generate(&self, shipment_id: &str) -> Result<(), ProviderFailure>;

    /// Requests a retrievable document URL for the generated label.
    async fn print_label(&self, shipment_id: &str) -> Result<String, ProviderFailure>;

    /// Fetches the tracking code. `Ok(None)` means the provider has not
    /// assigned one yet.
    async fn track(&self, shipment_id: &str) -> Result<Option<String>, ProviderFailure>;
}

#[derive(Debug, Default)]
struct InMemoryProviderState {
    shipments: HashMap<String, CartAddRequest>,
    purchased: HashSet<String>,
    tracking: HashMap<String, String>,
    last_request: Option<CartAddRequest>,
    next_id: u32,
    fail_on_cart_add: bool,
    fail_on_checkout: bool,
    fail_on_generate: bool,
    fail_on_print: bool,
    fail_on_track: bool,
    tracking_unavailable: bool,
}

/// In-memory shipping provider for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryShippingProvider {
    state: Arc<RwLock<InMemoryProviderState>>,
}

impl InMemoryShippingProvider {
    /// Creates a new in-memory provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the provider to refuse cart-add calls.
    pub fn set_fail_on_cart_add(&self, fail: bool) {
        self.state.write().unwrap().fail_on_cart_add = fail;
    }

    /// Configures the provider to refuse checkout calls.
    pub fn set_fail_on_checkout(&self, fail: bool) {
        self.state.write().unwrap().fail_on_checkout = fail;
    }

    /// Configures the provider to refuse generate calls.
    pub fn set_fail_on_generate(&self, fail: bool) {
        self.state.write().unwrap().fail_on_generate = fail;
    }

    /// Configures the provider to refuse print calls.
    pub fn set_fail_on_print(&self, fail: bool) {
        self.state.write().unwrap().fail_on_print = fail;
    }

    /// Configures the provider to refuse track calls.
    pub fn set_fail_on_track(&self, fail: bool) {
        self.state.write().unwrap().fail_on_track = fail;
    }

    /// Configures the provider to answer track calls with "no code yet".
    pub fn set_tracking_unavailable(&self, unavailable: bool) {
        self.state.write().unwrap().tracking_unavailable = unavailable;
    }

    /// Returns the number of registered shipments.
    pub fn shipment_count(&self) -> usize {
        self.state.read().unwrap().shipments.len()
    }

    /// Returns the number of purchased labels. Never decremented; the
    /// provider has no refund call.
    pub fn purchased_count(&self) -> usize {
        self.state.read().unwrap().purchased.len()
    }

    /// Returns the most recent cart-add payload, for assertions.
    pub fn last_request(&self) -> Option<CartAddRequest> {
        self.state.read().unwrap().last_request.clone()
    }
}

#[async_trait]
impl ShippingProvider for InMemoryShippingProvider {
    async fn add_to_cart(&self, request: &CartAddRequest) -> Result<String, ProviderFailure> {
        let mut state = self.state.write().unwrap();
        state.last_request = Some(request.clone());

        if state.fail_on_cart_add {
            return Err(ProviderFailure::new(
                serde_json::json!({"error": "cart add rejected"}),
            ));
        }

        state.next_id += 1;
        let shipment_id = format!("SHIP-{:04}", state.next_id);
        let tracking_code = format!("TRACK-{:04}", state.next_id);
        state.shipments.insert(shipment_id.clone(), request.clone());
        state.tracking.insert(shipment_id.clone(), tracking_code);
        Ok(shipment_id)
    }

    async fn checkout(&self, shipment_id: &str) -> Result<(), ProviderFailure> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_checkout {
            return Err(ProviderFailure::new(
                serde_json::json!({"error": "payment required"}),
            ));
        }
        if !state.shipments.contains_key(shipment_id) {
            return Err(ProviderFailure::new(
                serde_json::json!({"error": "unknown shipment", "shipment_id": shipment_id}),
            ));
        }
        state.purchased.insert(shipment_id.to_string());
        Ok(())
    }

    async fn generate(&self, shipment_id: &str) -> Result<(), ProviderFailure> {
        let state = self.state.read().unwrap();
        if state.fail_on_generate {
            return Err(ProviderFailure::new(
                serde_json::json!({"error": "generation failed", "shipment_id": shipment_id}),
            ));
        }
        Ok(())
    }

    async fn print_label(&self, shipment_id: &str) -> Result<String, ProviderFailure> {
        let state = self.state.read().unwrap();
        if state.fail_on_print {
            return Err(ProviderFailure::new(
                serde_json::json!({"error": "print failed"}),
            ));
        }
        Ok(format!("https://labels.example/{shipment_id}.pdf"))
    }

    async fn track(&self, shipment_id: &str) -> Result<Option<String>, ProviderFailure> {
        let state = self.state.read().unwrap();
        if state.fail_on_track {
            return Err(ProviderFailure::new(
                serde_json::json!({"error": "tracking service down"}),
            ));
        }
        if state.tracking_unavailable {
            return Ok(None);
        }
        Ok(state.tracking.get(shipment_id).cloned())
    }
}
