use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::fees::flow::{FeeBases, FlowProfile, PercentMode};
use crate::fees::schedule::{FeeSchedule, FeeType};
use crate::rounding::{round2, share_of};
use crate::types::{Money, Percent};

/// Entry vs. recurring fee totals of a schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeTotals {
    /// Sum of the one-time fee amounts
    pub enter_fees_amount: Money,
    /// Sum of the recurring fee amounts
    pub variable_fees_amount: Money,
    /// One-time fees in percent of the base
    pub enter_percent: Percent,
    /// Recurring fees in percent of the base
    pub variable_percent: Percent,
    /// Entry plus recurring amounts
    pub total_value: Money,
    /// Entry plus recurring percentages
    pub total_percentage: Percent,
}

#[derive(Default)]
struct Bucket {
    amount: Money,
    percentage: Percent,
}

impl Bucket {
    fn add(&mut self, amount: Money, percentage: Percent) {
        self.amount += amount;
        self.percentage += percentage;
    }
}

/// Partition every row into entry and recurring fees and total them.
///
/// Fixed rows are classified by key through the flow's name sets, custom
/// fees by their own `feesType`. Keys in neither set do not count.
pub fn compute_fee_totals(
    schedule: &FeeSchedule,
    profile: &FlowProfile,
    bases: &FeeBases,
) -> FeeTotals {
    let mut enter = Bucket::default();
    let mut variable = Bucket::default();

    let fixed = schedule
        .table
        .fixed_rows()
        .filter_map(|(_, key, item)| profile.fee_type(key).map(|t| (t, item)));
    let custom = schedule.custom_fees.iter().map(|c| (c.fees_type, &c.fee));

    for (fee_type, item) in fixed.chain(custom) {
        match fee_type {
            FeeType::Enter => enter.add(item.amount, item.percentage),
            FeeType::Variable => variable.add(item.amount, item.percentage),
        }
    }

    let enter_fees_amount = round2(enter.amount);
    let variable_fees_amount = round2(variable.amount);

    let (enter_percent, variable_percent) = match profile.percent_mode {
        PercentMode::Summed => (round2(enter.percentage), round2(variable.percentage)),
        PercentMode::FromAmounts => (
            round2(share_of(enter_fees_amount, bases.transfer_amount)),
            round2(share_of(variable_fees_amount, bases.transfer_amount)),
        ),
    };

    FeeTotals {
        enter_fees_amount,
        variable_fees_amount,
        enter_percent,
        variable_percent,
        total_value: round2(enter_fees_amount + variable_fees_amount),
        total_percentage: round2(enter_percent + variable_percent),
    }
}

/// Fixed fee keys the flow does not classify.
pub fn unclassified_fees(schedule: &FeeSchedule, profile: &FlowProfile) -> Vec<String> {
    schedule
        .table
        .fixed_rows()
        .filter(|(_, key, _)| profile.fee_type(key).is_none())
        .map(|(category, key, _)| format!("{category}.{key}"))
        .collect()
}

impl FeeTotals {
    pub fn is_zero(&self) -> bool {
        self.total_value == Decimal::ZERO && self.total_percentage == Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::flow::FlowKind;
    use crate::fees::schedule::{CustomFee, FeeCategory, FeeLineItem};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn row(percentage: Decimal, amount: Decimal) -> FeeLineItem {
        FeeLineItem {
            percentage,
            amount,
            ..Default::default()
        }
    }

    fn schedule() -> FeeSchedule {
        let mut s = FeeSchedule::cif();
        s.insert_fee(FeeCategory::Services, "opening", row(dec!(1), dec!(40)))
            .unwrap();
        s.insert_fee(FeeCategory::Services, "arbitration", row(dec!(0.5), dec!(30)))
            .unwrap();
        s.insert_fee(FeeCategory::Tiers, "transfer", row(dec!(0.25), dec!(25)))
            .unwrap();
        s.insert_fee(FeeCategory::Products, "gestion", row(dec!(0.8), dec!(80)))
            .unwrap();
        s
    }

    #[test]
    fn test_subscription_sums_percentages() {
        let profile = FlowProfile::builtin(FlowKind::Subscription);
        let totals = compute_fee_totals(&schedule(), &profile, &FeeBases::subscription(dec!(10000)));
        assert_eq!(
            totals,
            FeeTotals {
                enter_fees_amount: dec!(65),
                variable_fees_amount: dec!(110),
                enter_percent: dec!(1.25),
                variable_percent: dec!(1.3),
                total_value: dec!(175),
                total_percentage: dec!(2.55),
            }
        );
    }

    #[test]
    fn test_arbitrage_derives_percentages_from_amounts() {
        let profile = FlowProfile::builtin(FlowKind::Arbitrage);
        let bases = FeeBases::arbitrage(dec!(4000), dec!(6000));
        let totals = compute_fee_totals(&schedule(), &profile, &bases);
        // opening + arbitration are entry fees here, transfer + gestion recurring
        assert_eq!(totals.enter_fees_amount, dec!(70));
        assert_eq!(totals.variable_fees_amount, dec!(105));
        assert_eq!(totals.enter_percent, dec!(0.7));
        assert_eq!(totals.variable_percent, dec!(1.05));
        assert_eq!(totals.total_percentage, dec!(1.75));
    }

    #[test]
    fn test_arbitrage_zero_base_gives_zero_percent() {
        let profile = FlowProfile::builtin(FlowKind::Arbitrage);
        let totals = compute_fee_totals(&schedule(), &profile, &FeeBases::default());
        assert_eq!(totals.enter_percent, Decimal::ZERO);
        assert_eq!(totals.variable_percent, Decimal::ZERO);
        assert_eq!(totals.total_value, dec!(175));
    }

    #[test]
    fn test_custom_fees_use_their_own_type() {
        let profile = FlowProfile::builtin(FlowKind::Subscription);
        let mut s = FeeSchedule::cif();
        s.custom_fees.push(CustomFee {
            label: "Frais de dossier".into(),
            fees_type: FeeType::Variable,
            arbitration_value_type: None,
            fee: row(dec!(0.1), dec!(10)),
        });
        // `opening` inside a custom fee is not matched by name
        s.custom_fees.push(CustomFee {
            label: "opening".into(),
            fees_type: FeeType::Variable,
            arbitration_value_type: None,
            fee: row(dec!(0.2), dec!(20)),
        });
        let totals = compute_fee_totals(&s, &profile, &FeeBases::subscription(dec!(10000)));
        assert_eq!(totals.enter_fees_amount, Decimal::ZERO);
        assert_eq!(totals.variable_fees_amount, dec!(30));
        assert_eq!(totals.variable_percent, dec!(0.3));
    }

    #[test]
    fn test_unknown_keys_are_excluded() {
        let profile = FlowProfile::builtin(FlowKind::Subscription);
        let mut s = schedule();
        s.insert_fee(FeeCategory::Products, "mystery", row(dec!(9), dec!(900)))
            .unwrap();
        let totals = compute_fee_totals(&s, &profile, &FeeBases::subscription(dec!(10000)));
        assert_eq!(totals.total_value, dec!(175));
        assert_eq!(unclassified_fees(&s, &profile), vec!["products.mystery".to_string()]);
    }

    #[test]
    fn test_empty_schedule_is_zero() {
        let profile = FlowProfile::builtin(FlowKind::Redemption);
        let totals = compute_fee_totals(&FeeSchedule::insurance(), &profile, &FeeBases::redemption(dec!(5000)));
        assert!(totals.is_zero());
    }
}
