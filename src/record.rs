use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A sale record as loaded, before any cleaning. Fields that were empty,
/// null-marked, or unparseable in the source arrive as `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSaleRecord {
    pub id: u64,
    pub date: Option<NaiveDate>,
    pub product: Option<String>,
    pub salesperson: Option<String>,
    pub boxes_shipped: Option<u32>,
    pub amount: Option<f64>,
    pub country: Option<String>,
}

/// A cleaned record: text trimmed and title-cased, boxes zero-filled,
/// calendar fields and value tier derived. Only records with a date,
/// amount, and country make it this far.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedSaleRecord {
    pub id: u64,
    pub date: NaiveDate,
    pub product: String,
    pub salesperson: String,
    pub boxes_shipped: u32,
    pub amount: f64,
    pub country: String,
    pub year: i32,
    pub month: u32,
    pub month_label: String,
    pub tier: ValueTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValueTier {
    #[serde(rename = "High Value")]
    High,
    #[serde(rename = "Medium Value")]
    Medium,
    #[serde(rename = "Low Value")]
    Low,
    #[serde(rename = "Small Value")]
    Small,
}

impl ValueTier {
    /// Bucket an amount. Branches are checked top-down and the first match
    /// wins, so each boundary value lands in the higher tier.
    pub fn of(amount: f64) -> ValueTier {
        if amount >= 1000.0 {
            ValueTier::High
        } else if amount >= 500.0 {
            ValueTier::Medium
        } else if amount >= 100.0 {
            ValueTier::Low
        } else {
            ValueTier::Small
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueTier::High => "High Value",
            ValueTier::Medium => "Medium Value",
            ValueTier::Low => "Low Value",
            ValueTier::Small => "Small Value",
        }
    }
}

impl fmt::Display for ValueTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
