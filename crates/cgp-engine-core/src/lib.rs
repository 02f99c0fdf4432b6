pub mod error;
pub mod rounding;
pub mod types;

#[cfg(feature = "fees")]
pub mod fees;

#[cfg(feature = "risk")]
pub mod risk;

pub use error::CgpError;
pub use types::*;

/// Standard result type for all engine operations
pub type CgpResult<T> = Result<T, CgpError>;
