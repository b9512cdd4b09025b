//! Persistence boundary of the order engine.
//!
//! Four narrow store traits cover everything the engine reads or writes:
//! - [`CatalogStore`] — products, variants and the atomic stock decrement
//! - [`CartStore`] — cart lines keyed by their natural key
//! - [`OrderStore`] — orders plus the conditional payment transition
//! - [`ShipmentLogStore`] — the per-order label step log
//!
//! Each trait ships an in-memory implementation (tests, local runs) and a
//! PostgreSQL implementation. Concurrency control lives here, not in the
//! services: natural-key upserts merge instead of duplicating, payment
//! transitions are single conditional updates, and the stock decrement is
//! decrement-if-sufficient in one statement.

pub mod cart;
pub mod catalog;
pub mod error;
pub mod memory;
pub mod order;
pub mod postgres;
pub mod shipment_log;

pub use cart::CartStore;
pub use catalog::CatalogStore;
pub use error::{Result, StoreError};
pub use memory::{
    InMemoryCartStore, InMemoryCatalogStore, InMemoryOrderStore, InMemoryShipmentLogStore,
};
pub use order::{OrderStore, PaymentTransition};
pub use postgres::{
    PostgresCartStore, PostgresCatalogStore, PostgresOrderStore, PostgresShipmentLogStore,
    run_migrations,
};
pub use shipment_log::ShipmentLogStore;
