use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use cgp_engine_core::fees::{self, EngineConfig};
use cgp_engine_core::risk::{self, InvestmentPosition};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_config(config_json: Option<String>) -> NapiResult<EngineConfig> {
    let config: EngineConfig = match config_json {
        Some(json) => serde_json::from_str(&json).map_err(to_napi_error)?,
        None => EngineConfig::default(),
    };
    config.validate().map_err(to_napi_error)?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

/// Full computation: recompute or edit the schedule, then totals and evolution.
#[napi]
pub fn compute_fees(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: fees::FeeComputationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let output = fees::compute_fees_with_config(&input, &config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Re-derive every amount after the project amounts changed.
#[napi]
pub fn recompute_fee_schedule(
    input_json: String,
    config_json: Option<String>,
) -> NapiResult<String> {
    let req: fees::FeeComputationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let profile = parse_config(config_json)?.profile(req.flow);
    let output =
        fees::recompute_fee_schedule(&req.schedule, &req.bases, &profile).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Apply a single field edit and return the updated schedule.
#[napi]
pub fn apply_fee_edit(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let req: fees::FeeComputationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let edit = req
        .edit
        .ok_or_else(|| to_napi_error("Missing \"edit\" in fee edit request"))?;
    let profile = parse_config(config_json)?.profile(req.flow);
    let output = fees::apply_fee_edit(&req.schedule, &edit, &req.bases, &profile)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EvolutionRequest {
    enter_percent: Decimal,
    variable_percent: Decimal,
    base: Decimal,
}

#[napi]
pub fn project_fee_evolution(input_json: String) -> NapiResult<String> {
    let req: EvolutionRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    for value in [req.enter_percent, req.variable_percent, req.base] {
        if value.abs() > cgp_engine_core::MAX_AMOUNT {
            return Err(to_napi_error(format!(
                "{} exceeds the maximum of {}",
                value,
                cgp_engine_core::MAX_AMOUNT
            )));
        }
    }
    let output = fees::project_fee_evolution(req.enter_percent, req.variable_percent, req.base);
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Effective per-flow fee rules, built-ins merged with the overrides.
#[napi]
pub fn flow_profiles(config_json: Option<String>) -> NapiResult<String> {
    let config = parse_config(config_json)?;
    serde_json::to_string(&config.effective_profiles()).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Risk
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_sri(input_json: String) -> NapiResult<String> {
    let input: risk::SriInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = risk::compute_sri(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_risk(input_json: String) -> NapiResult<String> {
    let input: risk::RiskComparisonInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = risk::compare_risk(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct AllocationRequest {
    positions: Vec<InvestmentPosition>,
    available: Decimal,
}

#[napi]
pub fn allocate_basket(input_json: String) -> NapiResult<String> {
    let req: AllocationRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = risk::allocate_basket(&req.positions, req.available).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
