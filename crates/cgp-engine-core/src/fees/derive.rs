use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CgpError;
use crate::fees::flow::{FeeBases, FlowProfile, ENTER_RIGHT};
use crate::fees::schedule::{CustomFee, FeeLineItem, FeeSchedule, FeeType};
use crate::rounding::{round2, share_of};
use crate::types::{Money, Percent};
use crate::CgpResult;

const HUNDRED: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Amount <-> percentage
// ---------------------------------------------------------------------------

/// `round2(base * percentage / 100)`; nothing is charged on a non-positive base.
pub fn amount_from_percentage(base: Money, percentage: Percent) -> Money {
    if base <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    round2(base * percentage / HUNDRED)
}

/// Percentage of `base` that `amount` represents, 2 decimals, 0 on a non-positive base.
pub fn percentage_from_amount(base: Money, amount: Money) -> Percent {
    round2(share_of(amount, base))
}

// ---------------------------------------------------------------------------
// Base selection
// ---------------------------------------------------------------------------

pub fn resolve_base(profile: &FlowProfile, bases: &FeeBases, key: &str) -> Money {
    bases.amount(profile.base_kind_for(key))
}

pub fn resolve_custom_base(profile: &FlowProfile, bases: &FeeBases, fee: &CustomFee) -> Money {
    bases.amount(profile.custom_base_kind(fee.arbitration_value_type))
}

/// Sum of the fixed entry fees other than `enterRight`.
pub fn fixed_fees_without_enter_right(schedule: &FeeSchedule, profile: &FlowProfile) -> Money {
    schedule
        .table
        .fixed_rows()
        .filter(|(_, key, _)| *key != ENTER_RIGHT)
        .filter(|(_, key, _)| profile.fee_type(key) == Some(FeeType::Enter))
        .map(|(_, _, item)| item.amount)
        .sum()
}

/// Base a fixed row is computed on, `enterRight` net of the other entry
/// fees when the flow asks for it.
pub fn fixed_row_base(
    schedule: &FeeSchedule,
    profile: &FlowProfile,
    bases: &FeeBases,
    key: &str,
) -> Money {
    let base = resolve_base(profile, bases, key);
    if profile.enter_right_net_of_fixed_fees && key == ENTER_RIGHT {
        base - fixed_fees_without_enter_right(schedule, profile)
    } else {
        base
    }
}

// ---------------------------------------------------------------------------
// Contract / company split
// ---------------------------------------------------------------------------

/// Side of an insurance fee split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SplitSide {
    Contract,
    Company,
}

fn check_percentage(field: &str, value: Percent) -> CgpResult<()> {
    if value < Decimal::ZERO || value > HUNDRED {
        return Err(CgpError::InvalidInput {
            field: field.into(),
            reason: "Split percentage must be between 0 and 100".into(),
        });
    }
    Ok(())
}

fn split_field(side: SplitSide, what: &str) -> String {
    match side {
        SplitSide::Contract => format!("contract{what}"),
        SplitSide::Company => format!("company{what}"),
    }
}

fn write_split(
    item: &mut FeeLineItem,
    side: SplitSide,
    percentage: Percent,
    amount: Money,
    sibling_amount: Money,
) {
    let sibling_percentage = HUNDRED - percentage;
    match side {
        SplitSide::Contract => {
            item.contract_percentage = Some(percentage);
            item.contract_amount = Some(amount);
            item.company_percentage = Some(sibling_percentage);
            item.company_amount = Some(sibling_amount);
        }
        SplitSide::Company => {
            item.company_percentage = Some(percentage);
            item.company_amount = Some(amount);
            item.contract_percentage = Some(sibling_percentage);
            item.contract_amount = Some(sibling_amount);
        }
    }
}

/// Re-derive both split amounts from the (already rounded) row total.
///
/// The contract percentage drives; the company gets the remainder.
pub fn derive_split(item: &mut FeeLineItem) {
    if !item.has_split() {
        return;
    }
    let contract_percentage = match (item.contract_percentage, item.company_percentage) {
        (Some(contract), _) => contract,
        (None, Some(company)) => HUNDRED - company,
        (None, None) => return,
    };
    let contract_amount = round2(item.amount * contract_percentage / HUNDRED);
    let company_amount = round2(item.amount - contract_amount);
    write_split(
        item,
        SplitSide::Contract,
        contract_percentage,
        contract_amount,
        company_amount,
    );
}

/// Edit one side's percentage; the other side becomes `100 - percentage`.
pub fn set_split_percentage(
    item: &mut FeeLineItem,
    side: SplitSide,
    percentage: Percent,
) -> CgpResult<()> {
    check_percentage(&split_field(side, "Percentage"), percentage)?;
    let amount = round2(item.amount * percentage / HUNDRED);
    let sibling_amount = round2(item.amount - amount);
    write_split(item, side, percentage, amount, sibling_amount);
    Ok(())
}

/// Edit one side's amount; its percentage is derived from the row total.
pub fn set_split_amount(item: &mut FeeLineItem, side: SplitSide, amount: Money) -> CgpResult<()> {
    if amount < Decimal::ZERO || amount > item.amount {
        return Err(CgpError::InvalidInput {
            field: split_field(side, "Amount"),
            reason: format!("Split amount must be between 0 and the fee total {}", item.amount),
        });
    }
    let percentage = percentage_from_amount(item.amount, amount);
    let sibling_amount = round2(item.amount - amount);
    write_split(item, side, percentage, amount, sibling_amount);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::flow::FlowKind;
    use crate::fees::schedule::FeeCategory;

    #[test]
    fn test_opening_fee_both_directions() {
        // 2% of 10,000 is 200; typing 150 gives back 1.5%
        assert_eq!(amount_from_percentage(dec!(10000), dec!(2)), dec!(200));
        assert_eq!(percentage_from_amount(dec!(10000), dec!(150)), dec!(1.5));
    }

    #[test]
    fn test_zero_base_never_divides() {
        assert_eq!(percentage_from_amount(Decimal::ZERO, dec!(150)), Decimal::ZERO);
        assert_eq!(amount_from_percentage(Decimal::ZERO, dec!(2)), Decimal::ZERO);
        assert_eq!(amount_from_percentage(dec!(-500), dec!(2)), Decimal::ZERO);
    }

    #[test]
    fn test_percentage_keeps_two_decimals() {
        // 123.45 / 10,000 = 1.2345% -> 1.23
        assert_eq!(percentage_from_amount(dec!(10000), dec!(123.45)), dec!(1.23));
    }

    #[test]
    fn test_enter_right_is_net_of_other_entry_fees() {
        let profile = FlowProfile::builtin(FlowKind::Arbitrage);
        let bases = FeeBases::arbitrage(dec!(4000), dec!(6000));
        let mut schedule = FeeSchedule::cif();
        let mut advice = FeeLineItem::new(dec!(1));
        advice.amount = dec!(100);
        let mut custody = FeeLineItem::new(dec!(0.5));
        custody.amount = dec!(50);
        schedule.insert_fee(FeeCategory::Services, "advice", advice).unwrap();
        schedule
            .insert_fee(FeeCategory::Services, "custodialRight", custody)
            .unwrap();
        schedule
            .insert_fee(FeeCategory::Products, "enterRight", FeeLineItem::new(dec!(3)))
            .unwrap();

        // custodialRight is recurring and does not reduce the base
        assert_eq!(fixed_fees_without_enter_right(&schedule, &profile), dec!(100));
        assert_eq!(
            fixed_row_base(&schedule, &profile, &bases, "enterRight"),
            dec!(9900)
        );
        assert_eq!(fixed_row_base(&schedule, &profile, &bases, "advice"), dec!(10000));
        assert_eq!(fixed_row_base(&schedule, &profile, &bases, "arbitration"), dec!(6000));
        assert_eq!(fixed_row_base(&schedule, &profile, &bases, "opening"), dec!(4000));
    }

    #[test]
    fn test_enter_right_gross_in_subscription() {
        let profile = FlowProfile::builtin(FlowKind::Subscription);
        let bases = FeeBases::subscription(dec!(10000));
        let mut schedule = FeeSchedule::cif();
        let mut advice = FeeLineItem::new(dec!(1));
        advice.amount = dec!(100);
        schedule.insert_fee(FeeCategory::Services, "advice", advice).unwrap();
        assert_eq!(
            fixed_row_base(&schedule, &profile, &bases, "enterRight"),
            dec!(10000)
        );
    }

    #[test]
    fn test_derive_split_rounds_total_first() {
        let mut item = FeeLineItem::split(dec!(2), dec!(33.33));
        item.amount = dec!(200.01);
        derive_split(&mut item);
        // 200.01 * 33.33% = 66.663333 -> 66.66, company keeps 133.35
        assert_eq!(item.contract_amount, Some(dec!(66.66)));
        assert_eq!(item.company_amount, Some(dec!(133.35)));
        assert_eq!(item.company_percentage, Some(dec!(66.67)));
    }

    #[test]
    fn test_derive_split_from_company_only() {
        let mut item = FeeLineItem {
            amount: dec!(100),
            company_percentage: Some(dec!(25)),
            ..Default::default()
        };
        derive_split(&mut item);
        assert_eq!(item.contract_percentage, Some(dec!(75)));
        assert_eq!(item.contract_amount, Some(dec!(75)));
        assert_eq!(item.company_amount, Some(dec!(25)));
    }

    #[test]
    fn test_set_company_percentage_forces_contract() {
        let mut item = FeeLineItem::split(dec!(2), dec!(50));
        item.amount = dec!(200);
        set_split_percentage(&mut item, SplitSide::Company, dec!(30)).unwrap();
        assert_eq!(item.contract_percentage, Some(dec!(70)));
        assert_eq!(item.company_amount, Some(dec!(60)));
        assert_eq!(item.contract_amount, Some(dec!(140)));
    }

    #[test]
    fn test_set_contract_amount() {
        let mut item = FeeLineItem::split(dec!(2), dec!(50));
        item.amount = dec!(200);
        set_split_amount(&mut item, SplitSide::Contract, dec!(150)).unwrap();
        assert_eq!(item.contract_percentage, Some(dec!(75)));
        assert_eq!(item.company_percentage, Some(dec!(25)));
        assert_eq!(item.company_amount, Some(dec!(50)));
    }

    #[test]
    fn test_split_rejects_out_of_range() {
        let mut item = FeeLineItem::split(dec!(2), dec!(50));
        item.amount = dec!(200);
        assert!(set_split_percentage(&mut item, SplitSide::Contract, dec!(120)).is_err());
        assert!(set_split_amount(&mut item, SplitSide::Company, dec!(250)).is_err());
        assert!(set_split_amount(&mut item, SplitSide::Company, dec!(-1)).is_err());
    }
}
