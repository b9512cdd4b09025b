//! Cart ledger for user shopping carts.
//!
//! This crate owns the cart-line lifecycle (create/merge/update/delete)
//! and enforces the stock-sufficiency rule at every write: the requested
//! quantity, merged with whatever the user already holds for the same
//! (product, size, color) selection, must not exceed the quantity the
//! inventory resolver reports as available.
//!
//! Reads are live: cart views join current catalog names and prices at
//! read time, unlike orders, which freeze prices at checkout.

pub mod ledger;
pub mod view;

pub use ledger::{CartLedger, UpdateOutcome};
pub use view::{CartView, CartViewLine};
