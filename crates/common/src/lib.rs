//! Shared types for the order lifecycle engine.
//!
//! Provides the strongly-typed identifiers used across all crates and the
//! [`Money`] value object (integer cents, no floating point).

pub mod ids;
pub mod money;

pub use ids::{LineId, OrderId, ProductId, UserId, VariantId};
pub use money::Money;
