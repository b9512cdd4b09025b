//! Engine-wide error taxonomy.

use thiserror::Error;

/// Errors produced by the engine.
///
/// Every failure in the engine is a value of this type; nothing panics
/// across a component boundary. Cart and shipment failures are returned
/// synchronously to the caller. The payment reconciler converts most of
/// its failures into logged no-op outcomes instead (a gateway treats any
/// error response as "retry forever"), so only storage failures surface
/// from it as errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The product requires the caller to pick a size or color and the
    /// request did not provide one.
    #[error("selection required: {attribute} must be chosen for this product")]
    SelectionRequired {
        /// Which attribute is missing ("size" or "color").
        attribute: &'static str,
    },

    /// The requested (size, color) selection did not identify exactly one
    /// variant.
    #[error("selection is ambiguous: {matches} variants match the requested size/color")]
    SelectionAmbiguous {
        /// How many variants matched (zero or more than one).
        matches: usize,
    },

    /// The resolved stock unit has no available quantity.
    #[error("out of stock")]
    OutOfStock,

    /// The requested quantity exceeds what is available right now.
    ///
    /// Carries the exact available quantity so the caller can clamp.
    #[error("insufficient stock: only {available} unit(s) available")]
    InsufficientStock {
        /// Units currently available for the resolved stock unit.
        available: u32,
    },

    /// A referenced product, order or cart line does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// What kind of record was looked up ("product", "order", "line").
        kind: &'static str,
        /// The identifier that failed to resolve.
        id: String,
    },

    /// The caller did not identify a user.
    #[error("unauthenticated: a user id is required")]
    Unauthenticated,

    /// The order is not in a state that permits the requested operation.
    #[error("order not ready: {0}")]
    OrderNotReady(String),

    /// An external provider call failed.
    ///
    /// Carries the step that failed and the provider's raw payload so an
    /// operator can follow up; completed prior steps are never rolled back.
    #[error("upstream failure at step {step}")]
    Upstream {
        /// Name of the failing step (e.g. "Generate").
        step: &'static str,
        /// Raw provider error payload.
        payload: serde_json::Value,
    },

    /// An external call exceeded its configured time bound.
    ///
    /// Never retried inside the engine; retry policy belongs to the caller.
    #[error("timed out at step {step}")]
    Timeout {
        /// Name of the step that timed out.
        step: &'static str,
    },

    /// A persistence-layer failure.
    #[error("storage failure: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl EngineError {
    /// Convenience constructor for [`EngineError::NotFound`].
    pub fn not_found(kind: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_reports_exact_quantity() {
        let err = EngineError::InsufficientStock { available: 3 };
        assert_eq!(err.to_string(), "insufficient stock: only 3 unit(s) available");
    }

    #[test]
    fn selection_errors_name_the_attribute() {
        let err = EngineError::SelectionRequired { attribute: "size" };
        assert!(err.to_string().contains("size"));
        let err = EngineError::SelectionAmbiguous { matches: 0 };
        assert!(err.to_string().contains("0 variants"));
    }

    #[test]
    fn upstream_names_the_step() {
        let err = EngineError::Upstream {
            step: "Generate",
            payload: serde_json::json!({"error": "label generation failed"}),
        };
        assert_eq!(err.to_string(), "upstream failure at step Generate");
    }

    #[test]
    fn not_found_constructor() {
        let err = EngineError::not_found("product", "abc");
        assert_eq!(err.to_string(), "product not found: abc");
    }
}
