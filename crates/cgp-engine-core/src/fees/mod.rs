//! Fee schedules of project forms: per-flow rules, amount/percentage
//! derivation, entry/variable totals and the fee-evolution projection.

pub mod derive;
pub mod engine;
pub mod evolution;
pub mod flow;
pub mod schedule;
pub mod totals;

pub use engine::{
    apply_fee_edit, compute_fees, compute_fees_with_config, recompute_fee_schedule, FeeComputation,
    FeeComputationInput, FeeEdit, FeeField,
};
pub use evolution::{project_fee_evolution, EvolutionPoint};
pub use flow::{EngineConfig, FeeBases, FlowKind, FlowProfile};
pub use schedule::{
    ArbitrationValueType, CustomFee, FeeCategory, FeeLineItem, FeeRowRef, FeeSchedule, FeeTable,
    FeeType,
};
pub use totals::{compute_fee_totals, FeeTotals};
