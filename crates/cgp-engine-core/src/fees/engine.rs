use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::CgpError;
use crate::fees::derive::{
    amount_from_percentage, derive_split, fixed_row_base, percentage_from_amount,
    resolve_base, resolve_custom_base, set_split_amount, set_split_percentage, SplitSide,
};
use crate::fees::evolution::{project_from_totals, EvolutionPoint};
use crate::fees::flow::{EngineConfig, FeeBases, FlowKind, FlowProfile, ENTER_RIGHT};
use crate::fees::schedule::{FeeRowRef, FeeSchedule, FeeType};
use crate::fees::totals::{compute_fee_totals, unclassified_fees, FeeTotals};
use crate::rounding::round2;
use crate::types::{check_amount, with_metadata, ComputationOutput, Money};
use crate::CgpResult;

/// Editable field of a fee row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeeField {
    Percentage,
    Amount,
    ContractPercentage,
    ContractAmount,
    CompanyPercentage,
    CompanyAmount,
}

impl FeeField {
    fn name(self) -> &'static str {
        match self {
            FeeField::Percentage => "percentage",
            FeeField::Amount => "amount",
            FeeField::ContractPercentage => "contractPercentage",
            FeeField::ContractAmount => "contractAmount",
            FeeField::CompanyPercentage => "companyPercentage",
            FeeField::CompanyAmount => "companyAmount",
        }
    }

    fn is_split(self) -> bool {
        !matches!(self, FeeField::Percentage | FeeField::Amount)
    }
}

/// A single field change coming from the project form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeEdit {
    /// Row being edited
    pub row: FeeRowRef,
    /// Field the user typed into
    pub field: FeeField,
    /// Value as typed
    pub value: Decimal,
}

/// Request for a full fee computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeComputationInput {
    /// Project screen the schedule belongs to
    pub flow: FlowKind,
    /// Fee table and custom fees as stored on the project
    pub schedule: FeeSchedule,
    /// Project amounts the fees are computed on
    #[serde(default)]
    pub bases: FeeBases,
    /// Field change to apply before totalling; without it the whole
    /// schedule is re-derived from its percentages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<FeeEdit>,
}

/// Everything the fee widgets display after a change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeComputation {
    /// Flow whose rules were applied
    pub flow: FlowKind,
    /// Schedule with every amount and split re-derived
    pub schedule: FeeSchedule,
    /// Entry and recurring totals
    pub totals: FeeTotals,
    /// Amount the evolution is projected on
    pub projection_base: Money,
    /// Effective annual fee rate for a 1 to 5 year holding
    pub evolution: Vec<EvolutionPoint>,
}

// ---------------------------------------------------------------------------
// Recompute
// ---------------------------------------------------------------------------

/// Re-derive every `enterRight` row, whichever section holds it.
fn refresh_enter_right(schedule: &mut FeeSchedule, profile: &FlowProfile, bases: &FeeBases) {
    let base = fixed_row_base(schedule, profile, bases, ENTER_RIGHT);
    for (_, rows) in schedule.table.categories_mut() {
        if let Some(item) = rows.get_mut(ENTER_RIGHT) {
            item.amount = amount_from_percentage(base, item.percentage);
            derive_split(item);
        }
    }
}

/// Re-derive every amount from its percentage after the project amounts changed.
///
/// When the flow nets `enterRight` of the other entry fees, that row is
/// computed last so its base sees the fresh amounts.
pub fn recompute_fee_schedule(
    schedule: &FeeSchedule,
    bases: &FeeBases,
    profile: &FlowProfile,
) -> CgpResult<FeeSchedule> {
    bases.validate()?;
    schedule.validate()?;
    let mut out = schedule.clone();
    let net_enter_right = profile.enter_right_net_of_fixed_fees;

    for (_, rows) in out.table.categories_mut() {
        for (key, item) in rows.iter_mut() {
            if net_enter_right && key == ENTER_RIGHT {
                continue;
            }
            let base = resolve_base(profile, bases, key);
            item.amount = amount_from_percentage(base, item.percentage);
            derive_split(item);
        }
    }

    if net_enter_right {
        refresh_enter_right(&mut out, profile, bases);
    }

    for fee in out.custom_fees.iter_mut() {
        let base = resolve_custom_base(profile, bases, fee);
        fee.fee.amount = amount_from_percentage(base, fee.fee.percentage);
        derive_split(&mut fee.fee);
    }

    Ok(out)
}

// ---------------------------------------------------------------------------
// Edit
// ---------------------------------------------------------------------------

fn edit_base(
    schedule: &FeeSchedule,
    row: &FeeRowRef,
    profile: &FlowProfile,
    bases: &FeeBases,
) -> CgpResult<Money> {
    match row {
        FeeRowRef::Fixed { key, .. } => Ok(fixed_row_base(schedule, profile, bases, key)),
        FeeRowRef::Custom { index } => schedule
            .custom_fees
            .get(*index)
            .map(|fee| resolve_custom_base(profile, bases, fee))
            .ok_or_else(|| CgpError::UnknownFeeRow(row.to_string())),
    }
}

/// Apply one field change the way the form does: the edited field is kept
/// as typed and the fields depending on it are re-derived.
pub fn apply_fee_edit(
    schedule: &FeeSchedule,
    edit: &FeeEdit,
    bases: &FeeBases,
    profile: &FlowProfile,
) -> CgpResult<FeeSchedule> {
    bases.validate()?;
    schedule.validate()?;
    check_amount(&format!("{}.{}", edit.row, edit.field.name()), edit.value)?;

    let mut out = schedule.clone();
    let base = edit_base(&out, &edit.row, profile, bases)?;
    let item = out.row_mut(&edit.row)?;

    if edit.field.is_split() && !item.has_split() {
        return Err(CgpError::InvalidInput {
            field: format!("{}.{}", edit.row, edit.field.name()),
            reason: "Row has no contract/company split".into(),
        });
    }

    match edit.field {
        FeeField::Percentage => {
            item.percentage = edit.value;
            item.amount = amount_from_percentage(base, edit.value);
            derive_split(item);
        }
        FeeField::Amount => {
            item.amount = round2(edit.value);
            item.percentage = percentage_from_amount(base, item.amount);
            derive_split(item);
        }
        FeeField::ContractPercentage => {
            set_split_percentage(item, SplitSide::Contract, edit.value)?
        }
        FeeField::CompanyPercentage => set_split_percentage(item, SplitSide::Company, edit.value)?,
        FeeField::ContractAmount => set_split_amount(item, SplitSide::Contract, round2(edit.value))?,
        FeeField::CompanyAmount => set_split_amount(item, SplitSide::Company, round2(edit.value))?,
    }

    // Only a fixed entry fee moves the net base of `enterRight`.
    if profile.enter_right_net_of_fixed_fees && !edit.field.is_split() {
        if let FeeRowRef::Fixed { key, .. } = &edit.row {
            if key != ENTER_RIGHT && profile.fee_type(key) == Some(FeeType::Enter) {
                refresh_enter_right(&mut out, profile, bases);
            }
        }
    }

    debug!(row = %edit.row, field = edit.field.name(), value = %edit.value, "applied fee edit");
    Ok(out)
}

// ---------------------------------------------------------------------------
// Full computation
// ---------------------------------------------------------------------------

/// Recompute (or edit), total and project a fee schedule with the built-in flow table.
pub fn compute_fees(
    input: &FeeComputationInput,
) -> CgpResult<ComputationOutput<FeeComputation>> {
    compute_fees_with_config(input, &EngineConfig::default())
}

pub fn compute_fees_with_config(
    input: &FeeComputationInput,
    config: &EngineConfig,
) -> CgpResult<ComputationOutput<FeeComputation>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    config.validate()?;
    let profile = config.profile(input.flow);
    let bases = &input.bases;

    let schedule = match &input.edit {
        Some(edit) => apply_fee_edit(&input.schedule, edit, bases, &profile)?,
        None => recompute_fee_schedule(&input.schedule, bases, &profile)?,
    };

    let unclassified = unclassified_fees(&schedule, &profile);
    for key in &unclassified {
        warn!(flow = %input.flow, fee = %key, "fee is neither an entry nor a variable fee");
        warnings.push(format!(
            "Fee '{key}' is neither an entry nor a variable fee for a {} and is left out of the totals",
            input.flow
        ));
    }

    if bases.amount(profile.default_base).is_zero() {
        warnings.push("Base amount is zero; every fee amount derives to 0".into());
    }

    if profile.enter_right_net_of_fixed_fees && schedule.find_fixed(ENTER_RIGHT).is_some() {
        let net = fixed_row_base(&schedule, &profile, bases, ENTER_RIGHT);
        if net <= Decimal::ZERO {
            warnings.push(format!(
                "Entry fees exceed the enterRight base (net base {net}); enterRight is 0"
            ));
        }
    }

    let totals = compute_fee_totals(&schedule, &profile, bases);
    let projection_base = bases.amount(profile.projection_base);
    let evolution = project_from_totals(&totals, projection_base);

    debug!(
        flow = %input.flow,
        total_value = %totals.total_value,
        total_percentage = %totals.total_percentage,
        "fee schedule computed"
    );

    let output = FeeComputation {
        flow: input.flow,
        schedule,
        totals,
        projection_base,
        evolution,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "bases": bases,
        "profile": profile,
    });
    Ok(with_metadata(
        "Fee schedule: amount = round2(base x percentage / 100), entry/variable partition by flow, entry fee amortised over 1-5 years",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}
