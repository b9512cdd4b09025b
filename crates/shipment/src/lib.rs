//! Shipment label orchestration.
//!
//! Converting a confirmed order into a purchased, printed, tracked
//! label takes five strictly ordered provider calls:
//!
//! ```text
//! CartAdd ──► Checkout ──► Generate ──► Print ──► Track
//! ```
//!
//! The provider offers no rollback: a purchased label stays purchased.
//! Instead of compensating, every step attempt is persisted to the
//! shipment log before the next step starts, so a failed run is
//! diagnosable (which step, which provider payload, which shipment id)
//! and an operator can follow up rather than re-running from step one
//! and buying a second label.
//!
//! A failed `Track` is the one soft spot: the label is already usable,
//! so the run reports success with no tracking code and leaves the
//! order at confirmed.

pub mod orchestrator;
pub mod provider;

pub use orchestrator::{LabelOutcome, LabelRequest, ShipmentOrchestrator};
pub use provider::{
    CartAddRequest, DeclaredProduct, InMemoryShippingProvider, ProviderFailure, ShipmentOptions,
    ShippingProvider,
};
