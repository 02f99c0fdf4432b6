use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use cgp_engine_core::fees::evolution::project_fee_evolution;
use cgp_engine_core::fees::{self, FeeComputationInput, FlowKind};
use cgp_engine_core::MAX_AMOUNT;

use crate::config;
use crate::input;

/// Arguments for fee schedule computation
#[derive(Args)]
pub struct FeesArgs {
    /// Path to JSON input file ({flow, schedule, bases, edit?})
    #[arg(long)]
    pub input: Option<String>,

    /// YAML or JSON file overriding flow fee rules
    #[arg(long)]
    pub config: Option<String>,
}

/// Arguments for the fee-evolution projection
#[derive(Args)]
pub struct EvolutionArgs {
    /// One-time entry fees, in percent of the base
    #[arg(long)]
    pub enter_percent: Decimal,

    /// Recurring fees, in percent of the base
    #[arg(long)]
    pub variable_percent: Decimal,

    /// Amount the fees apply to
    #[arg(long)]
    pub base: Decimal,
}

/// Arguments for listing flow rules
#[derive(Args)]
pub struct FlowsArgs {
    /// Only show this flow (subscription, arbitrage, complementary, redemption)
    #[arg(long)]
    pub flow: Option<String>,

    /// YAML or JSON file overriding flow fee rules
    #[arg(long)]
    pub config: Option<String>,
}

pub fn run_fees(args: FeesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let fees_input: FeeComputationInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file.json> or stdin required for fee computation".into());
    };
    let engine_config = config::load_config(&args.config)?;
    let result = fees::compute_fees_with_config(&fees_input, &engine_config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_evolution(args: EvolutionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if args.base < Decimal::ZERO {
        return Err("Base amount cannot be negative".into());
    }
    for value in [args.enter_percent, args.variable_percent, args.base] {
        if value.abs() > MAX_AMOUNT {
            return Err(format!("{} exceeds the maximum of {}", value, MAX_AMOUNT).into());
        }
    }
    let points = project_fee_evolution(args.enter_percent, args.variable_percent, args.base);
    Ok(serde_json::to_value(points)?)
}

fn parse_flow(name: &str) -> Result<FlowKind, Box<dyn std::error::Error>> {
    FlowKind::ALL
        .into_iter()
        .find(|kind| kind.to_string() == name.to_lowercase())
        .ok_or_else(|| {
            format!(
                "Unknown flow '{}'. Use: subscription, arbitrage, complementary, redemption",
                name
            )
            .into()
        })
}

pub fn run_flows(args: FlowsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let engine_config = config::load_config(&args.config)?;
    match args.flow {
        Some(ref name) => {
            let kind = parse_flow(name)?;
            Ok(serde_json::to_value(engine_config.profile(kind))?)
        }
        None => Ok(serde_json::to_value(engine_config.effective_profiles())?),
    }
}
