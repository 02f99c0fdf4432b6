use cgp_engine_core::risk::basket::LIQUIDITY_CODE;
use cgp_engine_core::risk::sri::{conservative_round, weighted_risk};
use cgp_engine_core::risk::{
    allocate_basket, compare_risk, compute_sri, HeldPosition, InvestmentPosition,
    RiskComparisonInput, SriInput,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_arbitrage_sri_scenario() {
    // Sell half of a risk-2 fund, reinvest in a risk-6 fund, keep cash aside
    let input = SriInput {
        held_positions: vec![
            HeldPosition::new(InvestmentPosition::new("FR0010135103", Some(2), dec!(20000)), dec!(50)),
            HeldPosition::new(InvestmentPosition::new(LIQUIDITY_CODE, None, dec!(2000)), dec!(0)),
        ],
        reinvestments: vec![InvestmentPosition::new("LU1681043599", Some(6), dec!(8000))],
        deinvested_amount: dec!(10000),
        transfer_amount_without_liquidity: Decimal::ZERO,
        fees: dec!(100),
    };
    let out = compute_sri(&input).unwrap();
    // 10,000 @2 + 2,000 @1 + 8,000 @6 + 1,900 @1 over 21,900
    assert_eq!(out.result.total_value, dec!(21900));
    assert_eq!(out.result.remainder, dec!(1900));
    // 71,900 / 21,900 = 3.28 -> rounds to 3, below 3.28 -> 4
    assert_eq!(out.result.sri, Some(4));
}

#[test]
fn test_conservative_rounding_examples() {
    assert_eq!(conservative_round(dec!(4.3)), 5);
    assert_eq!(conservative_round(dec!(4.6)), 5);
    assert_eq!(conservative_round(dec!(4.0)), 4);
}

#[test]
fn test_basket_then_sri() {
    let basket = allocate_basket(
        &[InvestmentPosition::new("A", Some(7), dec!(6000))],
        dec!(10000),
    )
    .unwrap();
    assert_eq!(basket.positions[0].percent, dec!(60));
    let input = SriInput {
        reinvestments: basket.positions,
        transfer_amount_without_liquidity: dec!(10000),
        ..Default::default()
    };
    assert_eq!(compute_sri(&input).unwrap().result.sri, Some(5));
}

#[test]
fn test_comparison_from_json() {
    let json = r#"{
        "heldPositions": [
            {"code": "FR0010135103", "label": "Fonds euros", "riskIndicator": 1, "amount": "15000", "divestmentPercent": "0"}
        ],
        "reinvestments": [],
        "tolerated": 2
    }"#;
    let input: RiskComparisonInput = serde_json::from_str(json).unwrap();
    let out = compare_risk(&input).unwrap();
    assert_eq!(out.result.before, Some(1));
    assert_eq!(out.result.after, Some(1));
    assert!(!out.result.exceeds_tolerance);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn component() -> impl Strategy<Value = (Decimal, u8)> {
    ((0i64..10_000_000).prop_map(|c| Decimal::new(c, 2)), 1u8..=7)
}

proptest! {
    #[test]
    fn prop_sri_is_none_iff_no_value(components in proptest::collection::vec(component(), 0..8)) {
        let total: Decimal = components.iter().map(|(v, _)| *v).sum();
        let weighted = weighted_risk(&components);
        prop_assert_eq!(weighted.is_none(), total.is_zero());
    }

    #[test]
    fn prop_sri_stays_in_band_and_never_under_reports(
        components in proptest::collection::vec(component(), 1..8)
    ) {
        if let Some(weighted) = weighted_risk(&components) {
            let sri = conservative_round(weighted);
            prop_assert!((1..=7).contains(&sri));
            prop_assert!(Decimal::from(sri) >= weighted);
        }
    }
}
