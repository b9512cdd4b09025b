//! Shipment label workflow types.
//!
//! The orchestrator in the `shipment` crate drives five strictly ordered
//! provider calls. Each attempt is recorded as a [`ShipmentLogEntry`]
//! before the next step runs, so a failure (or crash) mid-sequence never
//! loses the provider-side shipment id of an already-purchased label.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

/// The five steps of the label workflow, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabelStep {
    /// Register addresses, package and insurance; yields the shipment id.
    CartAdd,
    /// Purchase the label (charges the shipping account).
    Checkout,
    /// Request label artifact generation.
    Generate,
    /// Request the retrievable document URL.
    Print,
    /// Request the tracking code.
    Track,
}

impl LabelStep {
    /// All steps in execution order.
    pub const ALL: [LabelStep; 5] = [
        LabelStep::CartAdd,
        LabelStep::Checkout,
        LabelStep::Generate,
        LabelStep::Print,
        LabelStep::Track,
    ];

    /// Returns the step name used in errors, logs and persisted entries.
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelStep::CartAdd => "CartAdd",
            LabelStep::Checkout => "Checkout",
            LabelStep::Generate => "Generate",
            LabelStep::Print => "Print",
            LabelStep::Track => "Track",
        }
    }

    /// Parses a stored step name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CartAdd" => Some(LabelStep::CartAdd),
            "Checkout" => Some(LabelStep::Checkout),
            "Generate" => Some(LabelStep::Generate),
            "Print" => Some(LabelStep::Print),
            "Track" => Some(LabelStep::Track),
            _ => None,
        }
    }

    /// One-based position of this step in the sequence.
    pub fn ordinal(&self) -> u8 {
        match self {
            LabelStep::CartAdd => 1,
            LabelStep::Checkout => 2,
            LabelStep::Generate => 3,
            LabelStep::Print => 4,
            LabelStep::Track => 5,
        }
    }
}

impl std::fmt::Display for LabelStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a single recorded step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(StepStatus::Completed),
            "failed" => Some(StepStatus::Failed),
            _ => None,
        }
    }
}

/// One persisted record of a step attempt for an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentLogEntry {
    pub order_id: OrderId,
    pub step: LabelStep,
    pub status: StepStatus,
    /// Provider-side shipment id, present from CartAdd onwards.
    pub shipment_id: Option<String>,
    /// Raw provider payload for failed steps (operator follow-up).
    pub detail: Option<serde_json::Value>,
    pub recorded_at: DateTime<Utc>,
}

impl ShipmentLogEntry {
    /// Records a completed step.
    pub fn completed(order_id: OrderId, step: LabelStep, shipment_id: Option<String>) -> Self {
        Self {
            order_id,
            step,
            status: StepStatus::Completed,
            shipment_id,
            detail: None,
            recorded_at: Utc::now(),
        }
    }

    /// Records a failed step with the provider's raw payload.
    pub fn failed(
        order_id: OrderId,
        step: LabelStep,
        shipment_id: Option<String>,
        detail: serde_json::Value,
    ) -> Self {
        Self {
            order_id,
            step,
            status: StepStatus::Failed,
            shipment_id,
            detail: Some(detail),
            recorded_at: Utc::now(),
        }
    }
}

/// Package dimensions computed from the total item count.
///
/// Width and length are fixed; height stacks 5 units per item and caps
/// at 100; weight is 0.3 per item. The provider's units (cm and kg) are
/// assumed. These exact constants are part of the provider contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PackageDimensions {
    pub width: u32,
    pub length: u32,
    pub height: u32,
    pub weight: f64,
}

impl PackageDimensions {
    /// Derives package dimensions for a shipment of `items` units.
    pub fn for_item_count(items: u32) -> Self {
        Self {
            width: 20,
            length: 30,
            height: (5 * items).min(100),
            weight: 0.3 * items as f64,
        }
    }
}
