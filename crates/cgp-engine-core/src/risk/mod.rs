//! Portfolio risk: reinvestment baskets and the weighted SRI.

pub mod basket;
pub mod sri;

pub use basket::{allocate_basket, BasketAllocation, HeldPosition, InvestmentPosition};
pub use sri::{
    compare_risk, compute_sri, format_sri, RiskComparison, RiskComparisonInput, SriInput,
    SriOutput,
};
