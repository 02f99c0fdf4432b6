use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::CgpError;
use crate::types::{check_amount, Money, Percent};
use crate::CgpResult;

/// One-time (`enter`) or recurring (`variable`) fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeeType {
    Enter,
    Variable,
}

/// Which amount an arbitrage custom fee is charged on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArbitrationValueType {
    /// Fresh money only.
    Complementary,
    /// Deinvested amount only.
    Desinvest,
    /// Fresh money plus deinvested amount.
    Both,
}

/// A fee row as held in the project form.
///
/// The split fields only exist on insurance contracts, where the fee is
/// shared between the contract and the insurance company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeLineItem {
    /// Fee in percent of its base
    #[serde(default)]
    pub percentage: Percent,
    /// Fee amount, rounded to cents
    #[serde(default)]
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_percentage: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_amount: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_percentage: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_amount: Option<Money>,
}

impl FeeLineItem {
    pub fn new(percentage: Percent) -> Self {
        FeeLineItem {
            percentage,
            ..Default::default()
        }
    }

    /// Row split between contract and company, the company taking the rest.
    pub fn split(percentage: Percent, contract_percentage: Percent) -> Self {
        FeeLineItem {
            percentage,
            contract_percentage: Some(contract_percentage),
            company_percentage: Some(dec!(100) - contract_percentage),
            ..Default::default()
        }
    }

    pub fn has_split(&self) -> bool {
        self.contract_percentage.is_some() || self.company_percentage.is_some()
    }

    fn validate(&self, row: &str) -> CgpResult<()> {
        check_amount(&format!("{row}.percentage"), self.percentage)?;
        check_amount(&format!("{row}.amount"), self.amount)?;
        if let Some(contract) = self.contract_percentage {
            check_amount(&format!("{row}.contractPercentage"), contract)?;
        }
        if let Some(company) = self.company_percentage {
            check_amount(&format!("{row}.companyPercentage"), company)?;
        }
        Ok(())
    }
}

/// A fee added by the advisor on top of the contract's fee table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFee {
    /// Name shown on the form
    #[serde(default)]
    pub label: String,
    /// One-time or recurring, chosen by the advisor
    pub fees_type: FeeType,
    /// Base of the fee in arbitrage-like flows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arbitration_value_type: Option<ArbitrationValueType>,
    #[serde(flatten)]
    pub fee: FeeLineItem,
}

/// Section of the fee table a fixed row lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeeCategory {
    Services,
    Tiers,
    Products,
    /// The single section of an insurance contract.
    Fees,
}

impl fmt::Display for FeeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeeCategory::Services => "services",
            FeeCategory::Tiers => "tiers",
            FeeCategory::Products => "products",
            FeeCategory::Fees => "fees",
        };
        f.write_str(name)
    }
}

pub type FeeRows = BTreeMap<String, FeeLineItem>;

/// Contract fee table, shaped by the contract family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "camelCase")]
pub enum FeeTable {
    /// Securities account: services, tiers and products sections.
    Cif {
        #[serde(default)]
        services: FeeRows,
        #[serde(default)]
        tiers: FeeRows,
        #[serde(default)]
        products: FeeRows,
    },
    /// Insurance contract: one flat section with contract/company splits.
    Insurance {
        #[serde(default)]
        fees: FeeRows,
    },
}

impl FeeTable {
    pub fn categories(&self) -> Vec<(FeeCategory, &FeeRows)> {
        match self {
            FeeTable::Cif {
                services,
                tiers,
                products,
            } => vec![
                (FeeCategory::Services, services),
                (FeeCategory::Tiers, tiers),
                (FeeCategory::Products, products),
            ],
            FeeTable::Insurance { fees } => vec![(FeeCategory::Fees, fees)],
        }
    }

    pub fn categories_mut(&mut self) -> Vec<(FeeCategory, &mut FeeRows)> {
        match self {
            FeeTable::Cif {
                services,
                tiers,
                products,
            } => vec![
                (FeeCategory::Services, services),
                (FeeCategory::Tiers, tiers),
                (FeeCategory::Products, products),
            ],
            FeeTable::Insurance { fees } => vec![(FeeCategory::Fees, fees)],
        }
    }

    pub fn rows(&self, category: FeeCategory) -> Option<&FeeRows> {
        self.categories()
            .into_iter()
            .find(|(c, _)| *c == category)
            .map(|(_, rows)| rows)
    }

    pub fn rows_mut(&mut self, category: FeeCategory) -> Option<&mut FeeRows> {
        self.categories_mut()
            .into_iter()
            .find(|(c, _)| *c == category)
            .map(|(_, rows)| rows)
    }

    /// Every fixed row, section by section.
    pub fn fixed_rows(&self) -> impl Iterator<Item = (FeeCategory, &str, &FeeLineItem)> + '_ {
        self.categories()
            .into_iter()
            .flat_map(|(category, rows)| {
                rows.iter()
                    .map(move |(key, item)| (category, key.as_str(), item))
            })
    }
}

/// Reference to one editable row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FeeRowRef {
    Fixed { category: FeeCategory, key: String },
    Custom { index: usize },
}

impl fmt::Display for FeeRowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeeRowRef::Fixed { category, key } => write!(f, "{category}.{key}"),
            FeeRowRef::Custom { index } => write!(f, "customFees[{index}]"),
        }
    }
}

/// The fee part of a project form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSchedule {
    pub table: FeeTable,
    #[serde(default)]
    pub custom_fees: Vec<CustomFee>,
}

impl FeeSchedule {
    pub fn cif() -> Self {
        FeeSchedule {
            table: FeeTable::Cif {
                services: FeeRows::new(),
                tiers: FeeRows::new(),
                products: FeeRows::new(),
            },
            custom_fees: Vec::new(),
        }
    }

    pub fn insurance() -> Self {
        FeeSchedule {
            table: FeeTable::Insurance {
                fees: FeeRows::new(),
            },
            custom_fees: Vec::new(),
        }
    }

    pub fn insert_fee(
        &mut self,
        category: FeeCategory,
        key: &str,
        item: FeeLineItem,
    ) -> CgpResult<()> {
        let rows = self.table.rows_mut(category).ok_or_else(|| CgpError::InvalidInput {
            field: "category".into(),
            reason: format!("section '{category}' does not exist on this contract"),
        })?;
        rows.insert(key.to_string(), item);
        Ok(())
    }

    pub fn row(&self, row: &FeeRowRef) -> Option<&FeeLineItem> {
        match row {
            FeeRowRef::Fixed { category, key } => self.table.rows(*category)?.get(key),
            FeeRowRef::Custom { index } => self.custom_fees.get(*index).map(|c| &c.fee),
        }
    }

    pub fn row_mut(&mut self, row: &FeeRowRef) -> CgpResult<&mut FeeLineItem> {
        let found = match row {
            FeeRowRef::Fixed { category, key } => self
                .table
                .rows_mut(*category)
                .and_then(|rows| rows.get_mut(key)),
            FeeRowRef::Custom { index } => self.custom_fees.get_mut(*index).map(|c| &mut c.fee),
        };
        found.ok_or_else(|| CgpError::UnknownFeeRow(row.to_string()))
    }

    /// Every row's percentage and amount must be non-negative and bounded.
    pub fn validate(&self) -> CgpResult<()> {
        for (category, key, item) in self.table.fixed_rows() {
            item.validate(&format!("{category}.{key}"))?;
        }
        for (index, fee) in self.custom_fees.iter().enumerate() {
            fee.fee.validate(&format!("customFees[{index}]"))?;
        }
        Ok(())
    }

    /// Location of the first fixed row with this key.
    pub fn find_fixed(&self, key: &str) -> Option<FeeRowRef> {
        self.table
            .fixed_rows()
            .find(|(_, k, _)| *k == key)
            .map(|(category, key, _)| FeeRowRef::Fixed {
                category,
                key: key.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insert_into_wrong_section() {
        let mut schedule = FeeSchedule::insurance();
        let err = schedule.insert_fee(FeeCategory::Services, "opening", FeeLineItem::new(dec!(1)));
        assert!(err.is_err());
        assert!(schedule
            .insert_fee(FeeCategory::Fees, "opening", FeeLineItem::new(dec!(1)))
            .is_ok());
    }

    #[test]
    fn test_fixed_rows_walks_every_section() {
        let mut schedule = FeeSchedule::cif();
        schedule
            .insert_fee(FeeCategory::Services, "advice", FeeLineItem::new(dec!(1)))
            .unwrap();
        schedule
            .insert_fee(FeeCategory::Products, "enterRight", FeeLineItem::new(dec!(3)))
            .unwrap();
        let keys: Vec<&str> = schedule.table.fixed_rows().map(|(_, k, _)| k).collect();
        assert_eq!(keys, vec!["advice", "enterRight"]);
        assert_eq!(
            schedule.find_fixed("enterRight"),
            Some(FeeRowRef::Fixed {
                category: FeeCategory::Products,
                key: "enterRight".into()
            })
        );
    }

    #[test]
    fn test_unknown_row_is_an_error() {
        let mut schedule = FeeSchedule::cif();
        let row = FeeRowRef::Custom { index: 2 };
        assert!(schedule.row(&row).is_none());
        assert!(matches!(
            schedule.row_mut(&row),
            Err(CgpError::UnknownFeeRow(_))
        ));
    }

    #[test]
    fn test_validate_rejects_huge_and_negative_rows() {
        let mut schedule = FeeSchedule::cif();
        schedule
            .insert_fee(FeeCategory::Services, "opening", FeeLineItem::new(dec!(2)))
            .unwrap();
        assert!(schedule.validate().is_ok());

        schedule
            .insert_fee(
                FeeCategory::Tiers,
                "advice",
                FeeLineItem::new(dec!(790000000000000000000000000)),
            )
            .unwrap();
        assert!(matches!(
            schedule.validate(),
            Err(CgpError::InvalidInput { field, .. }) if field == "tiers.advice.percentage"
        ));

        let mut schedule = FeeSchedule::cif();
        schedule.custom_fees.push(CustomFee {
            label: "negative".into(),
            fees_type: FeeType::Enter,
            arbitration_value_type: None,
            fee: FeeLineItem::new(dec!(-1)),
        });
        assert!(schedule.validate().is_err());
    }

    #[test]
    fn test_metadata_shape() {
        let json = r#"{
            "table": {
                "layout": "insurance",
                "fees": {
                    "opening": {
                        "percentage": "2",
                        "amount": "200",
                        "contractPercentage": "60",
                        "companyPercentage": "40"
                    }
                }
            },
            "customFees": [
                {"label": "Frais dossier", "feesType": "enter", "arbitrationValueType": "both", "percentage": 0.5, "amount": 50}
            ]
        }"#;
        let schedule: FeeSchedule = serde_json::from_str(json).unwrap();
        let opening = schedule.table.rows(FeeCategory::Fees).unwrap().get("opening").unwrap();
        assert!(opening.has_split());
        assert_eq!(opening.contract_percentage, Some(dec!(60)));
        assert_eq!(schedule.custom_fees[0].fees_type, FeeType::Enter);
        assert_eq!(
            schedule.custom_fees[0].arbitration_value_type,
            Some(ArbitrationValueType::Both)
        );
        assert_eq!(schedule.custom_fees[0].fee.amount, dec!(50));
    }
}
