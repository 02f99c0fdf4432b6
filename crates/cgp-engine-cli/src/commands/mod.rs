pub mod fees;
pub mod risk;
