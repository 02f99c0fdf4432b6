use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::CgpError;
use crate::risk::basket::{
    uninvested_remainder, HeldPosition, InvestmentPosition, MAX_RISK_INDICATOR,
    MIN_RISK_INDICATOR,
};
use crate::rounding::{round2, round_half_up};
use crate::types::{check_amount, with_metadata, ComputationOutput, Money};
use crate::CgpResult;

/// Rendering of an undefined SRI.
pub const NO_SRI: &str = "-";

/// Risk indicator given to money left uninvested.
const REMAINDER_RISK: u8 = MIN_RISK_INDICATOR;

/// Portfolio after an arbitrage or redemption, as seen by the SRI widget.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SriInput {
    /// Positions already on the contract, with their divestment
    pub held_positions: Vec<HeldPosition>,
    /// Lines of the reinvestment basket
    pub reinvestments: Vec<InvestmentPosition>,
    /// Money freed by the divestments
    pub deinvested_amount: Money,
    /// Fresh money paid in, liquidity excluded
    pub transfer_amount_without_liquidity: Money,
    /// Fees taken out of the operation
    pub fees: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SriOutput {
    /// `None` when nothing carries value.
    pub sri: Option<u8>,
    /// Weighted indicator on the 1-7 scale before the conservative rounding.
    pub weighted_sri: Option<Decimal>,
    /// Value of the portfolio after the operation
    pub total_value: Money,
    /// Money left uninvested, negative when the basket is overspent
    pub remainder: Money,
    /// SRI digit, or "-" when undefined
    pub sri_display: String,
}

/// Round an indicator to an integer band, never below the weighted value.
///
/// `r = round(x)`, bumped by one when it landed under `x`: 4.3 gives 5,
/// 4.6 gives 5, 4.0 stays 4.
pub fn conservative_round(weighted: Decimal) -> u8 {
    let mut rounded = round_half_up(weighted);
    if rounded < weighted {
        rounded += Decimal::ONE;
    }
    rounded
        .to_u8()
        .unwrap_or(MAX_RISK_INDICATOR)
        .clamp(MIN_RISK_INDICATOR, MAX_RISK_INDICATOR)
}

/// Value-weighted indicator of `(value, risk)` components on the 1-7 scale,
/// `None` when the components carry no positive value.
///
/// Components may be negative (an overspent remainder); they still weigh
/// against the total.
pub fn weighted_risk(components: &[(Money, u8)]) -> Option<Decimal> {
    let total: Money = components.iter().map(|(value, _)| *value).sum();
    if total <= Decimal::ZERO {
        return None;
    }
    let total_sri: Decimal = components
        .iter()
        .map(|(value, risk)| *value / total * dec!(100) * Decimal::from(*risk))
        .sum();
    Some(round2(total_sri) / dec!(100))
}

pub fn format_sri(sri: Option<u8>) -> String {
    match sri {
        Some(value) => value.to_string(),
        None => NO_SRI.to_string(),
    }
}

fn validate(input: &SriInput) -> CgpResult<()> {
    for (i, held) in input.held_positions.iter().enumerate() {
        held.validate(&format!("heldPositions[{i}]"))?;
    }
    for (i, position) in input.reinvestments.iter().enumerate() {
        position.validate(&format!("reinvestments[{i}]"))?;
    }
    let amounts = [
        ("deinvestedAmount", input.deinvested_amount),
        (
            "transferAmountWithoutLiquidity",
            input.transfer_amount_without_liquidity,
        ),
        ("fees", input.fees),
    ];
    for (field, value) in amounts {
        check_amount(field, value)?;
    }
    Ok(())
}

struct Weighing {
    components: Vec<(Money, u8)>,
    remainder: Money,
    warnings: Vec<String>,
}

fn weigh(input: &SriInput) -> Weighing {
    let mut warnings = Vec::new();
    let invested: Money = input.reinvestments.iter().map(|p| p.amount).sum();
    let remainder = uninvested_remainder(
        input.deinvested_amount,
        input.transfer_amount_without_liquidity,
        invested,
        input.fees,
    );
    if remainder < Decimal::ZERO {
        warn!(remainder = %remainder, "reinvestments exceed the available amount");
        warnings.push(format!(
            "Reinvestments and fees exceed the available amount by {}; the shortfall is weighted as a negative remainder",
            -remainder
        ));
    }

    let mut components: Vec<(Money, u8)> = input
        .held_positions
        .iter()
        .map(|h| (h.remaining_value(), h.position.effective_risk_indicator()))
        .collect();
    components.extend(
        input
            .reinvestments
            .iter()
            .map(|p| (p.amount, p.effective_risk_indicator())),
    );
    components.push((remainder, REMAINDER_RISK));

    Weighing {
        components,
        remainder,
        warnings,
    }
}

/// SRI of the portfolio once divestments and reinvestments are executed.
pub fn compute_sri(input: &SriInput) -> CgpResult<ComputationOutput<SriOutput>> {
    let start = Instant::now();
    validate(input)?;

    let Weighing {
        components,
        remainder,
        mut warnings,
    } = weigh(input);
    let total_value: Money = components.iter().map(|(value, _)| *value).sum();
    if total_value < Decimal::ZERO {
        warn!(total_value = %total_value, "portfolio value is negative");
        warnings.push(format!(
            "Portfolio value after the operation is negative ({total_value}); no SRI"
        ));
    }
    let weighted_sri = weighted_risk(&components);
    let sri = weighted_sri.map(conservative_round);

    debug!(total_value = %total_value, sri = ?sri, "computed portfolio SRI");

    let output = SriOutput {
        sri,
        weighted_sri,
        total_value: round2(total_value),
        remainder: round2(remainder),
        sri_display: format_sri(sri),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "unratedRiskIndicator": MAX_RISK_INDICATOR,
        "liquidityRiskIndicator": MIN_RISK_INDICATOR,
        "remainderRiskIndicator": REMAINDER_RISK,
    });
    Ok(with_metadata(
        "Value-weighted SRI of remaining, reinvested and uninvested money, rounded up to the next band",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Before / after / tolerated
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskComparisonInput {
    #[serde(flatten)]
    pub basket: SriInput,
    /// Highest SRI the client accepts, from the suitability questionnaire.
    #[serde(default)]
    pub tolerated: Option<u8>,
}

/// The three indicators the advisor signs off on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskComparison {
    /// SRI of the portfolio as it stands today
    pub before: Option<u8>,
    /// SRI once the operation is executed
    pub after: Option<u8>,
    /// Highest SRI the client accepts
    pub tolerated: Option<u8>,
    /// `after` is above `tolerated`
    pub exceeds_tolerance: bool,
    /// `before` rendered for display
    pub before_display: String,
    /// `after` rendered for display
    pub after_display: String,
    /// `tolerated` rendered for display
    pub tolerated_display: String,
}

pub fn compare_risk(
    input: &RiskComparisonInput,
) -> CgpResult<ComputationOutput<RiskComparison>> {
    let start = Instant::now();
    if let Some(tolerated) = input.tolerated {
        if !(MIN_RISK_INDICATOR..=MAX_RISK_INDICATOR).contains(&tolerated) {
            return Err(CgpError::InvalidInput {
                field: "tolerated".into(),
                reason: format!("Tolerated SRI must be between 1 and 7, got {tolerated}"),
            });
        }
    }

    let after_output = compute_sri(&input.basket)?;
    let after = after_output.result.sri;

    // Portfolio as it stands today: held positions at full value only.
    let current: Vec<(Money, u8)> = input
        .basket
        .held_positions
        .iter()
        .map(|h| (h.position.amount, h.position.effective_risk_indicator()))
        .collect();
    let before = weighted_risk(&current).map(conservative_round);

    let exceeds_tolerance = matches!((after, input.tolerated), (Some(a), Some(t)) if a > t);
    let mut warnings = after_output.warnings;
    if exceeds_tolerance {
        warnings.push(format!(
            "SRI after the operation ({}) exceeds the client's tolerated SRI ({})",
            format_sri(after),
            format_sri(input.tolerated)
        ));
    }

    let output = RiskComparison {
        before,
        after,
        tolerated: input.tolerated,
        exceeds_tolerance,
        before_display: format_sri(before),
        after_display: format_sri(after),
        tolerated_display: format_sri(input.tolerated),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "SRI before the operation, after it, and tolerated by the client",
        &serde_json::json!({ "tolerated": input.tolerated }),
        warnings,
        elapsed,
        output,
    ))
}
