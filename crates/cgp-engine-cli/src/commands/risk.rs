use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use cgp_engine_core::risk::{self, InvestmentPosition, RiskComparisonInput, SriInput};

use crate::input;

/// Arguments for the portfolio SRI
#[derive(Args)]
pub struct SriArgs {
    /// Path to JSON input file ({heldPositions, reinvestments, deinvestedAmount, ...})
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the before/after/tolerated comparison
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON input file (SRI input plus optional "tolerated")
    #[arg(long)]
    pub input: Option<String>,

    /// Client's tolerated SRI (1-7), overrides the input file
    #[arg(long)]
    pub tolerated: Option<u8>,
}

/// Arguments for basket allocation
#[derive(Args)]
pub struct AllocateArgs {
    /// Path to JSON input file ({positions, available})
    #[arg(long)]
    pub input: Option<String>,

    /// Amount available for reinvestment, overrides the input file
    #[arg(long)]
    pub available: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct AllocateInput {
    positions: Vec<InvestmentPosition>,
    #[serde(default)]
    available: Decimal,
}

pub fn run_sri(args: SriArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sri_input: SriInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file.json> or stdin required for SRI".into());
    };
    let result = risk::compute_sri(&sri_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut cmp_input: RiskComparisonInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file.json> or stdin required for risk comparison".into());
    };
    if args.tolerated.is_some() {
        cmp_input.tolerated = args.tolerated;
    }
    let result = risk::compare_risk(&cmp_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_allocate(args: AllocateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let alloc_input: AllocateInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file.json> or stdin required for allocation".into());
    };
    let available = args.available.unwrap_or(alloc_input.available);
    let result = risk::allocate_basket(&alloc_input.positions, available)?;
    Ok(serde_json::to_value(result)?)
}
