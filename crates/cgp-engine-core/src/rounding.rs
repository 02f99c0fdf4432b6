use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const HUNDRED: Decimal = dec!(100);
const HALF: Decimal = dec!(0.5);

/// Round to 2 decimals with ties going toward positive infinity.
///
/// Stored project metadata was produced by `Math.round(x * 100) / 100` on
/// the web client, so `-0.125` becomes `-0.12` and `0.125` becomes `0.13`.
/// Every monetary amount and percentage in the engine goes through here.
pub fn round2(value: Decimal) -> Decimal {
    ((value * HUNDRED + HALF).floor() / HUNDRED).normalize()
}

/// Round to the nearest integer, ties toward positive infinity.
pub fn round_half_up(value: Decimal) -> Decimal {
    (value + HALF).floor()
}

/// `numerator / denominator * 100`, or zero when the denominator is not positive.
pub(crate) fn share_of(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    numerator / denominator * HUNDRED
}
