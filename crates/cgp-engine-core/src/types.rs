use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CgpError;
use crate::CgpResult;

/// Monetary amounts in the contract currency.
pub type Money = Decimal;

/// Percentages in percent units (2 = 2%), the way the stored metadata holds them.
pub type Percent = Decimal;

/// Largest amount or percentage accepted on input; keeps every product
/// of two inputs well inside `Decimal` range.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000);

/// Reject negative values and values above [`MAX_AMOUNT`].
pub(crate) fn check_amount(field: &str, value: Decimal) -> CgpResult<()> {
    if value < Decimal::ZERO {
        return Err(CgpError::InvalidInput {
            field: field.into(),
            reason: "Amount cannot be negative".into(),
        });
    }
    if value > MAX_AMOUNT {
        return Err(CgpError::InvalidInput {
            field: field.into(),
            reason: format!("Amount {value} exceeds the maximum of {MAX_AMOUNT}"),
        });
    }
    Ok(())
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
