use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::fees::totals::FeeTotals;
use crate::rounding::round2;
use crate::types::{Money, Percent};

/// Holding horizon of the projection, in years.
pub const PROJECTION_YEARS: u32 = 5;

/// Effective annual fee rate if the position is held `year` years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionPoint {
    /// Holding period in years (1-5)
    pub year: u32,
    /// Recurring rate plus the entry rate spread over `year` years
    pub evolution_percentage: Percent,
    /// That rate applied to the projection base
    pub evolution_amount: Money,
}

/// Spread the one-time entry fee over 1..=5 years on top of the recurring rate.
pub fn project_fee_evolution(
    enter_percent: Percent,
    variable_percent: Percent,
    base: Money,
) -> Vec<EvolutionPoint> {
    (1..=PROJECTION_YEARS)
        .map(|year| {
            let evolution_percentage =
                round2(variable_percent + enter_percent / Decimal::from(year));
            EvolutionPoint {
                year,
                evolution_percentage,
                evolution_amount: round2(base * evolution_percentage / dec!(100)),
            }
        })
        .collect()
}

pub fn project_from_totals(totals: &FeeTotals, base: Money) -> Vec<EvolutionPoint> {
    project_fee_evolution(totals.enter_percent, totals.variable_percent, base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_fee_amortises() {
        let points = project_fee_evolution(dec!(2), dec!(1), dec!(10000));
        assert_eq!(points.len(), 5);
        assert_eq!(points[0].evolution_percentage, dec!(3));
        assert_eq!(points[0].evolution_amount, dec!(300));
        assert_eq!(points[4].year, 5);
        assert_eq!(points[4].evolution_percentage, dec!(1.4));
        assert_eq!(points[4].evolution_amount, dec!(140));
    }

    #[test]
    fn test_thirds_are_rounded() {
        // 1 / 3 = 0.333.. -> 0.33 then 0.33% of 1,000 = 3.30
        let points = project_fee_evolution(dec!(1), Decimal::ZERO, dec!(1000));
        assert_eq!(points[2].evolution_percentage, dec!(0.33));
        assert_eq!(points[2].evolution_amount, dec!(3.3));
    }

    #[test]
    fn test_rate_decreases_with_horizon() {
        let points = project_fee_evolution(dec!(4.5), dec!(0.85), dec!(25000));
        for pair in points.windows(2) {
            assert!(pair[0].evolution_percentage > pair[1].evolution_percentage);
        }
    }
}
