//! Domain layer for the order lifecycle and inventory engine.
//!
//! This crate provides the core domain model:
//! - Catalog records (product, variant) and the inventory resolver
//! - Cart line records keyed by their natural key
//! - Order records with the payment and fulfillment state machines
//! - Shipment label steps and the persisted step log entry
//! - The engine-wide error taxonomy
//!
//! Everything here is pure: no I/O, no async. Services in the `cart`,
//! `reconciler` and `shipment` crates drive these types through the
//! persistence traits in `store`.

pub mod cart;
pub mod catalog;
pub mod error;
pub mod inventory;
pub mod order;
pub mod shipping;
pub mod status;

pub use cart::CartLine;
pub use catalog::{Product, Variant};
pub use error::EngineError;
pub use inventory::{Resolution, StockUnit, resolve};
pub use order::{Address, Order, OrderLine};
pub use shipping::{LabelStep, PackageDimensions, ShipmentLogEntry, StepStatus};
pub use status::{FulfillmentStatus, PaymentStatus};
