use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CgpError;
use crate::fees::schedule::{ArbitrationValueType, FeeType};
use crate::types::{check_amount, Money};
use crate::CgpResult;

/// Fee key whose base is reduced by the other entry fees in arbitrage flows.
pub const ENTER_RIGHT: &str = "enterRight";

/// One-time fees of subscription-like flows.
pub const ENTER_FEES: &[&str] = &[
    "opening",
    "transfer",
    "closing",
    "advice",
    "brokerage",
    "exchange",
    ENTER_RIGHT,
];

/// Recurring or contingent fees of subscription-like flows.
pub const VARIABLE_FEES: &[&str] = &[
    "arbitration",
    "followingAdvice",
    "custodialRight",
    "accountManagement",
    "inactivity",
    "managementAssignments",
    "gestion",
    "surperformance",
];

/// In an arbitrage, `arbitration` is the entry fee while `transfer` and
/// `closing` become recurring.
pub const ARBITRATION_ENTER_FEES: &[&str] = &[
    "opening",
    "arbitration",
    "advice",
    "brokerage",
    "exchange",
    ENTER_RIGHT,
];

pub const ARBITRATION_VARIABLE_FEES: &[&str] = &[
    "transfer",
    "closing",
    "followingAdvice",
    "custodialRight",
    "accountManagement",
    "inactivity",
    "managementAssignments",
    "gestion",
    "surperformance",
];

/// Arbitrage fees charged on the deinvested amount.
pub const ARBITRATION_FEES_ON_DESINVEST: &[&str] = &["arbitration"];

/// Arbitrage fees charged on the fresh money only.
pub const ARBITRATION_FEES_ON_TRANSFER_WITHOUT_DESINVEST: &[&str] = &["opening", "brokerage"];

// ---------------------------------------------------------------------------
// Flow kinds and bases
// ---------------------------------------------------------------------------

/// The project screens that carry a fee schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowKind {
    Subscription,
    Arbitrage,
    Complementary,
    Redemption,
}

impl FlowKind {
    pub const ALL: [FlowKind; 4] = [
        FlowKind::Subscription,
        FlowKind::Arbitrage,
        FlowKind::Complementary,
        FlowKind::Redemption,
    ];
}

impl std::fmt::Display for FlowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FlowKind::Subscription => "subscription",
            FlowKind::Arbitrage => "arbitrage",
            FlowKind::Complementary => "complementary",
            FlowKind::Redemption => "redemption",
        };
        f.write_str(name)
    }
}

/// Which of the project amounts a fee row is computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BaseKind {
    TransferAmount,
    TransferAmountWithoutLiquidity,
    DeinvestedAmount,
}

/// Amounts a project puts in motion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeeBases {
    /// Total amount moved: the payment for a subscription, fresh money
    /// plus deinvested amount for an arbitrage.
    pub transfer_amount: Money,
    /// Fresh money, liquidity excluded.
    pub transfer_amount_without_liquidity: Money,
    /// Money freed by divestments.
    pub deinvested_amount: Money,
}

impl FeeBases {
    pub fn subscription(payment: Money) -> Self {
        FeeBases {
            transfer_amount: payment,
            transfer_amount_without_liquidity: payment,
            deinvested_amount: Decimal::ZERO,
        }
    }

    pub fn arbitrage(transfer_without_liquidity: Money, deinvested: Money) -> Self {
        FeeBases {
            transfer_amount: transfer_without_liquidity + deinvested,
            transfer_amount_without_liquidity: transfer_without_liquidity,
            deinvested_amount: deinvested,
        }
    }

    pub fn complementary(payment: Money, deinvested: Money) -> Self {
        FeeBases {
            transfer_amount: payment + deinvested,
            transfer_amount_without_liquidity: payment,
            deinvested_amount: deinvested,
        }
    }

    pub fn redemption(deinvested: Money) -> Self {
        FeeBases {
            transfer_amount: deinvested,
            transfer_amount_without_liquidity: Decimal::ZERO,
            deinvested_amount: deinvested,
        }
    }

    pub fn amount(&self, kind: BaseKind) -> Money {
        match kind {
            BaseKind::TransferAmount => self.transfer_amount,
            BaseKind::TransferAmountWithoutLiquidity => self.transfer_amount_without_liquidity,
            BaseKind::DeinvestedAmount => self.deinvested_amount,
        }
    }

    pub(crate) fn validate(&self) -> CgpResult<()> {
        let fields = [
            ("transferAmount", self.transfer_amount),
            (
                "transferAmountWithoutLiquidity",
                self.transfer_amount_without_liquidity,
            ),
            ("deinvestedAmount", self.deinvested_amount),
        ];
        for (field, value) in fields {
            check_amount(field, value)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Flow profiles
// ---------------------------------------------------------------------------

/// How custom fees pick their base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CustomFeeBase {
    /// Same base as the fixed rows.
    Default,
    /// Follow the fee's own `arbitrationValueType` tag.
    ByValueType,
}

/// How entry/recurring percentages are totalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PercentMode {
    /// Sum the row percentages.
    Summed,
    /// Divide the summed amounts by the transfer amount.
    FromAmounts,
}

/// Per-flow fee rules, kept as data so every project screen shares one engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowProfile {
    /// Fixed fee keys counted as one-time fees
    pub enter_fees: Vec<String>,
    /// Fixed fee keys counted as recurring fees
    pub variable_fees: Vec<String>,
    /// Base of every fixed row without an override
    pub default_base: BaseKind,
    /// Per-key base exceptions
    #[serde(default)]
    pub base_overrides: BTreeMap<String, BaseKind>,
    /// How custom fees pick their base
    pub custom_fee_base: CustomFeeBase,
    /// How entry/recurring percentages are totalled
    pub percent_mode: PercentMode,
    /// `enterRight` is computed on its base minus the other fixed entry fees
    #[serde(default)]
    pub enter_right_net_of_fixed_fees: bool,
    /// Base of the fee-evolution projection
    pub projection_base: BaseKind,
}

fn names(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

impl FlowProfile {
    pub fn builtin(kind: FlowKind) -> Self {
        match kind {
            FlowKind::Subscription => FlowProfile {
                enter_fees: names(ENTER_FEES),
                variable_fees: names(VARIABLE_FEES),
                default_base: BaseKind::TransferAmount,
                base_overrides: BTreeMap::new(),
                custom_fee_base: CustomFeeBase::Default,
                percent_mode: PercentMode::Summed,
                enter_right_net_of_fixed_fees: false,
                projection_base: BaseKind::TransferAmount,
            },
            FlowKind::Arbitrage => {
                let mut base_overrides = BTreeMap::new();
                for key in ARBITRATION_FEES_ON_DESINVEST {
                    base_overrides.insert(key.to_string(), BaseKind::DeinvestedAmount);
                }
                for key in ARBITRATION_FEES_ON_TRANSFER_WITHOUT_DESINVEST {
                    base_overrides.insert(key.to_string(), BaseKind::TransferAmountWithoutLiquidity);
                }
                FlowProfile {
                    enter_fees: names(ARBITRATION_ENTER_FEES),
                    variable_fees: names(ARBITRATION_VARIABLE_FEES),
                    default_base: BaseKind::TransferAmount,
                    base_overrides,
                    custom_fee_base: CustomFeeBase::ByValueType,
                    percent_mode: PercentMode::FromAmounts,
                    enter_right_net_of_fixed_fees: true,
                    projection_base: BaseKind::TransferAmount,
                }
            }
            FlowKind::Complementary => FlowProfile {
                default_base: BaseKind::TransferAmountWithoutLiquidity,
                custom_fee_base: CustomFeeBase::ByValueType,
                projection_base: BaseKind::TransferAmountWithoutLiquidity,
                ..FlowProfile::builtin(FlowKind::Subscription)
            },
            FlowKind::Redemption => FlowProfile {
                default_base: BaseKind::DeinvestedAmount,
                custom_fee_base: CustomFeeBase::ByValueType,
                projection_base: BaseKind::DeinvestedAmount,
                ..FlowProfile::builtin(FlowKind::Subscription)
            },
        }
    }

    /// Category of a fixed fee row, `None` when the key is in neither set.
    pub fn fee_type(&self, key: &str) -> Option<FeeType> {
        if self.enter_fees.iter().any(|k| k == key) {
            Some(FeeType::Enter)
        } else if self.variable_fees.iter().any(|k| k == key) {
            Some(FeeType::Variable)
        } else {
            None
        }
    }

    pub fn base_kind_for(&self, key: &str) -> BaseKind {
        self.base_overrides
            .get(key)
            .copied()
            .unwrap_or(self.default_base)
    }

    pub fn custom_base_kind(&self, value_type: Option<ArbitrationValueType>) -> BaseKind {
        match (self.custom_fee_base, value_type) {
            (CustomFeeBase::ByValueType, Some(ArbitrationValueType::Complementary)) => {
                BaseKind::TransferAmountWithoutLiquidity
            }
            (CustomFeeBase::ByValueType, Some(ArbitrationValueType::Desinvest)) => {
                BaseKind::DeinvestedAmount
            }
            (CustomFeeBase::ByValueType, Some(ArbitrationValueType::Both)) => {
                BaseKind::TransferAmount
            }
            _ => self.default_base,
        }
    }

    pub fn validate(&self) -> CgpResult<()> {
        if let Some(shared) = self
            .enter_fees
            .iter()
            .find(|k| self.variable_fees.contains(*k))
        {
            return Err(CgpError::InvalidConfig(format!(
                "fee '{shared}' is listed as both an entry and a variable fee"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Engine configuration
// ---------------------------------------------------------------------------

/// Replacement profiles keyed by flow; flows left out keep the built-in table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default)]
    pub profiles: BTreeMap<FlowKind, FlowProfile>,
}

impl EngineConfig {
    pub fn profile(&self, kind: FlowKind) -> FlowProfile {
        self.profiles
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| FlowProfile::builtin(kind))
    }

    pub fn validate(&self) -> CgpResult<()> {
        for (kind, profile) in &self.profiles {
            profile
                .validate()
                .map_err(|e| CgpError::InvalidConfig(format!("{kind}: {e}")))?;
        }
        Ok(())
    }

    /// Every flow with its effective profile.
    pub fn effective_profiles(&self) -> BTreeMap<FlowKind, FlowProfile> {
        FlowKind::ALL
            .iter()
            .map(|kind| (*kind, self.profile(*kind)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_builtin_sets_are_disjoint() {
        for kind in FlowKind::ALL {
            assert!(FlowProfile::builtin(kind).validate().is_ok(), "{kind}");
        }
    }

    #[test]
    fn test_arbitrage_swaps_arbitration_and_transfer() {
        let sub = FlowProfile::builtin(FlowKind::Subscription);
        let arb = FlowProfile::builtin(FlowKind::Arbitrage);
        assert_eq!(sub.fee_type("arbitration"), Some(FeeType::Variable));
        assert_eq!(arb.fee_type("arbitration"), Some(FeeType::Enter));
        assert_eq!(sub.fee_type("transfer"), Some(FeeType::Enter));
        assert_eq!(arb.fee_type("transfer"), Some(FeeType::Variable));
        assert_eq!(sub.fee_type("closing"), Some(FeeType::Enter));
        assert_eq!(arb.fee_type("closing"), Some(FeeType::Variable));
        assert_eq!(arb.fee_type("unknownFee"), None);
    }

    #[test]
    fn test_arbitrage_base_overrides() {
        let arb = FlowProfile::builtin(FlowKind::Arbitrage);
        assert_eq!(arb.base_kind_for("arbitration"), BaseKind::DeinvestedAmount);
        assert_eq!(
            arb.base_kind_for("opening"),
            BaseKind::TransferAmountWithoutLiquidity
        );
        assert_eq!(
            arb.base_kind_for("brokerage"),
            BaseKind::TransferAmountWithoutLiquidity
        );
        assert_eq!(arb.base_kind_for("advice"), BaseKind::TransferAmount);
    }

    #[test]
    fn test_custom_fee_base_by_value_type() {
        let arb = FlowProfile::builtin(FlowKind::Arbitrage);
        assert_eq!(
            arb.custom_base_kind(Some(ArbitrationValueType::Complementary)),
            BaseKind::TransferAmountWithoutLiquidity
        );
        assert_eq!(
            arb.custom_base_kind(Some(ArbitrationValueType::Desinvest)),
            BaseKind::DeinvestedAmount
        );
        assert_eq!(
            arb.custom_base_kind(Some(ArbitrationValueType::Both)),
            BaseKind::TransferAmount
        );
        assert_eq!(arb.custom_base_kind(None), BaseKind::TransferAmount);

        let sub = FlowProfile::builtin(FlowKind::Subscription);
        assert_eq!(
            sub.custom_base_kind(Some(ArbitrationValueType::Desinvest)),
            BaseKind::TransferAmount
        );
    }

    #[test]
    fn test_arbitrage_bases_sum() {
        let bases = FeeBases::arbitrage(dec!(4000), dec!(6000));
        assert_eq!(bases.transfer_amount, dec!(10000));
        assert_eq!(bases.amount(BaseKind::DeinvestedAmount), dec!(6000));
    }

    #[test]
    fn test_config_rejects_overlapping_sets() {
        let mut profile = FlowProfile::builtin(FlowKind::Subscription);
        profile.variable_fees.push("opening".into());
        let mut config = EngineConfig::default();
        config.profiles.insert(FlowKind::Subscription, profile);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_falls_back_to_builtin() {
        let config = EngineConfig::default();
        assert_eq!(
            config.profile(FlowKind::Redemption),
            FlowProfile::builtin(FlowKind::Redemption)
        );
        assert_eq!(config.effective_profiles().len(), 4);
    }
}
