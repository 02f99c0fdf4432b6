use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CgpError;
use crate::rounding::{round2, share_of};
use crate::types::{check_amount, Money, Percent};
use crate::CgpResult;

/// Instrument code of the cash line of a contract.
pub const LIQUIDITY_CODE: &str = "XXliquidity";

pub const MIN_RISK_INDICATOR: u8 = 1;
pub const MAX_RISK_INDICATOR: u8 = 7;

/// A financial instrument line of a portfolio or reinvestment basket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentPosition {
    /// Instrument code (ISIN, or the liquidity code)
    pub code: String,
    /// Instrument name
    #[serde(default)]
    pub label: String,
    /// SRI of the instrument (1-7) when the provider publishes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_indicator: Option<u8>,
    /// Value of the line
    #[serde(default)]
    pub amount: Money,
    /// Units held or bought
    #[serde(default)]
    pub quantity: Decimal,
    /// Share of the available money
    #[serde(default)]
    pub percent: Percent,
}

impl InvestmentPosition {
    pub fn new(code: &str, risk_indicator: Option<u8>, amount: Money) -> Self {
        InvestmentPosition {
            code: code.to_string(),
            label: String::new(),
            risk_indicator,
            amount,
            quantity: Decimal::ZERO,
            percent: Decimal::ZERO,
        }
    }

    /// Published indicator, else 1 for liquidity and 7 for anything unrated.
    pub fn effective_risk_indicator(&self) -> u8 {
        match self.risk_indicator {
            Some(risk) => risk,
            None if self.code == LIQUIDITY_CODE => MIN_RISK_INDICATOR,
            None => MAX_RISK_INDICATOR,
        }
    }

    pub(crate) fn validate(&self, field: &str) -> CgpResult<()> {
        if let Some(risk) = self.risk_indicator {
            if !(MIN_RISK_INDICATOR..=MAX_RISK_INDICATOR).contains(&risk) {
                return Err(CgpError::InvalidInput {
                    field: format!("{field}.riskIndicator"),
                    reason: format!("Risk indicator of '{}' must be between 1 and 7, got {risk}", self.code),
                });
            }
        }
        check_amount(&format!("{field}.amount"), self.amount)?;
        check_amount(&format!("{field}.quantity"), self.quantity)
    }
}

/// A position already held on the contract, possibly partly sold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeldPosition {
    #[serde(flatten)]
    pub position: InvestmentPosition,
    /// Part of the position sold, 0-100
    #[serde(default)]
    pub divestment_percent: Percent,
}

impl HeldPosition {
    pub fn new(position: InvestmentPosition, divestment_percent: Percent) -> Self {
        HeldPosition {
            position,
            divestment_percent,
        }
    }

    /// Value left on the position once the divestment is executed.
    pub fn remaining_value(&self) -> Money {
        self.position.amount * (Decimal::ONE - self.divestment_percent / dec!(100))
    }

    pub(crate) fn validate(&self, field: &str) -> CgpResult<()> {
        self.position.validate(field)?;
        if self.divestment_percent < Decimal::ZERO || self.divestment_percent > dec!(100) {
            return Err(CgpError::InvalidInput {
                field: format!("{field}.divestmentPercent"),
                reason: "Divestment must be between 0 and 100%".into(),
            });
        }
        Ok(())
    }
}

/// Money left uninvested: `deinvested + fresh money - reinvested - fees`.
pub fn uninvested_remainder(
    deinvested_amount: Money,
    transfer_amount_without_liquidity: Money,
    invested_amount: Money,
    fees: Money,
) -> Money {
    deinvested_amount + transfer_amount_without_liquidity - invested_amount - fees
}

/// Reinvestment basket with each line's share of the available money.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasketAllocation {
    /// Basket lines with `percent` filled in
    pub positions: Vec<InvestmentPosition>,
    /// Money available for reinvestment
    pub available: Money,
    /// Sum of the line amounts
    pub invested_amount: Money,
    /// Available money not allocated to any line
    pub remainder: Money,
    /// Remainder in percent of the available money
    pub remainder_percent: Percent,
}

pub fn allocate_basket(
    positions: &[InvestmentPosition],
    available: Money,
) -> CgpResult<BasketAllocation> {
    check_amount("available", available)?;
    let mut allocated = Vec::with_capacity(positions.len());
    for (i, position) in positions.iter().enumerate() {
        position.validate(&format!("positions[{i}]"))?;
        let mut position = position.clone();
        position.percent = round2(share_of(position.amount, available));
        allocated.push(position);
    }
    let invested_amount: Money = allocated.iter().map(|p| p.amount).sum();
    let remainder = round2(available - invested_amount);

    Ok(BasketAllocation {
        positions: allocated,
        available,
        invested_amount: round2(invested_amount),
        remainder,
        remainder_percent: round2(share_of(remainder, available)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_risk_indicators() {
        assert_eq!(
            InvestmentPosition::new(LIQUIDITY_CODE, None, dec!(10)).effective_risk_indicator(),
            1
        );
        assert_eq!(
            InvestmentPosition::new("FR0010315770", None, dec!(10)).effective_risk_indicator(),
            7
        );
        assert_eq!(
            InvestmentPosition::new(LIQUIDITY_CODE, Some(3), dec!(10)).effective_risk_indicator(),
            3
        );
    }

    #[test]
    fn test_remaining_value() {
        let held = HeldPosition::new(InvestmentPosition::new("A", Some(4), dec!(8000)), dec!(25));
        assert_eq!(held.remaining_value(), dec!(6000));
    }

    #[test]
    fn test_validation() {
        let bad_risk = InvestmentPosition::new("A", Some(8), dec!(10));
        assert!(bad_risk.validate("p").is_err());
        let bad_divest = HeldPosition::new(InvestmentPosition::new("A", Some(2), dec!(10)), dec!(101));
        assert!(bad_divest.validate("h").is_err());
    }

    #[test]
    fn test_huge_amounts_are_rejected() {
        let huge = dec!(790000000000000000000000000);
        let position = InvestmentPosition::new("A", Some(3), huge);
        assert!(position.validate("p").is_err());
        assert!(allocate_basket(&[], huge).is_err());
        assert!(allocate_basket(&[position], dec!(1000)).is_err());
    }

    #[test]
    fn test_allocate_basket() {
        let positions = vec![
            InvestmentPosition::new("A", Some(3), dec!(2500)),
            InvestmentPosition::new("B", Some(5), dec!(5000)),
        ];
        let basket = allocate_basket(&positions, dec!(10000)).unwrap();
        assert_eq!(basket.positions[0].percent, dec!(25));
        assert_eq!(basket.positions[1].percent, dec!(50));
        assert_eq!(basket.invested_amount, dec!(7500));
        assert_eq!(basket.remainder, dec!(2500));
        assert_eq!(basket.remainder_percent, dec!(25));
    }

    #[test]
    fn test_allocate_with_nothing_available() {
        let positions = vec![InvestmentPosition::new("A", Some(3), dec!(0))];
        let basket = allocate_basket(&positions, Decimal::ZERO).unwrap();
        assert_eq!(basket.positions[0].percent, Decimal::ZERO);
        assert_eq!(basket.remainder_percent, Decimal::ZERO);
    }

    #[test]
    fn test_uninvested_remainder() {
        assert_eq!(
            uninvested_remainder(dec!(6000), dec!(4000), dec!(7000), dec!(150)),
            dec!(2850)
        );
    }
}
