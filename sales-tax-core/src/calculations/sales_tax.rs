//! Sales tax breakdown for a single unit of a product.
//!
//! Each product category maps to a fixed, ordered list of tax lines:
//!
//! | Category         | Tax lines                                   |
//! |------------------|---------------------------------------------|
//! | Basic Food       | VAT 5%                                      |
//! | Liquors          | VAT 19% + Liquor Excise (25%)               |
//! | Plastic Bags     | VAT 19% + Plastic Bag Tax (20%)             |
//! | Fuels            | VAT 19% + National Consumption Tax (8%)     |
//! | Public Utilities | Exempt                                      |
//! | Other            | VAT 19%                                     |
//!
//! Line amounts are rounded to cents one by one. The total tax is the
//! rounded sum of the rounded lines, and the total value is the rounded sum
//! of the base value and the total tax.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use sales_tax_core::calculations::{ProductCategory, SalesTaxCalculator};
//!
//! let calculator = SalesTaxCalculator::standard();
//! let breakdown = calculator
//!     .calculate(dec!(2000), ProductCategory::Liquors)
//!     .unwrap();
//!
//! assert_eq!(breakdown.amount_for("VAT 19%"), Some(dec!(380.00)));
//! assert_eq!(breakdown.amount_for("Liquor Excise"), Some(dec!(500.00)));
//! assert_eq!(breakdown.total_tax, dec!(880.00));
//! assert_eq!(breakdown.total_value, dec!(2880.00));
//! ```

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::{round_half_up, round_sum};

/// Largest base value the calculator accepts.
pub const MAX_BASE_VALUE: Decimal = Decimal::from_parts(999_999_999, 0, 0, false, 0);

/// Errors raised by the sales tax calculator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaxError {
    /// The base value or category supplied by the caller is unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// The six product categories known to the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProductCategory {
    #[serde(rename = "Basic Food")]
    BasicFood,
    #[serde(rename = "Liquors")]
    Liquors,
    #[serde(rename = "Plastic Bags")]
    PlasticBags,
    #[serde(rename = "Fuels")]
    Fuels,
    #[serde(rename = "Public Utilities")]
    PublicUtilities,
    #[serde(rename = "Other")]
    Other,
}

impl ProductCategory {
    /// Every category, in table order.
    pub const ALL: [ProductCategory; 6] = [
        Self::BasicFood,
        Self::Liquors,
        Self::PlasticBags,
        Self::Fuels,
        Self::PublicUtilities,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BasicFood => "Basic Food",
            Self::Liquors => "Liquors",
            Self::PlasticBags => "Plastic Bags",
            Self::Fuels => "Fuels",
            Self::PublicUtilities => "Public Utilities",
            Self::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s.trim())
    }

    /// Tax lines applied to this category, in table order.
    pub fn tax_types(&self) -> &'static [TaxType] {
        TAX_TABLE
            .iter()
            .find(|entry| entry.category == *self)
            .map(|entry| entry.taxes)
            .unwrap_or(&[])
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductCategory {
    type Err = TaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| TaxError::InvalidArgument(format!("unknown category '{s}'")))
    }
}

/// A single kind of tax line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxType {
    Exempt,
    Vat5,
    Vat19,
    NationalConsumption,
    LiquorExcise,
    PlasticBag,
}

impl TaxType {
    /// Name shown for this line in a breakdown.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Exempt => "Exempt",
            Self::Vat5 => "VAT 5%",
            Self::Vat19 => "VAT 19%",
            Self::NationalConsumption => "National Consumption Tax",
            Self::LiquorExcise => "Liquor Excise",
            Self::PlasticBag => "Plastic Bag Tax",
        }
    }

    /// Rate as a fraction of the base value.
    pub fn rate(&self) -> Decimal {
        match self {
            Self::Exempt => Decimal::ZERO,
            Self::Vat5 => Decimal::new(5, 2),
            Self::Vat19 => Decimal::new(19, 2),
            Self::NationalConsumption => Decimal::new(8, 2),
            Self::LiquorExcise => Decimal::new(25, 2),
            Self::PlasticBag => Decimal::new(20, 2),
        }
    }
}

/// One row of the category table.
#[derive(Debug)]
pub struct CategoryTaxes {
    pub category: ProductCategory,
    pub taxes: &'static [TaxType],
}

/// The fixed category to tax lines table.
pub static TAX_TABLE: [CategoryTaxes; 6] = [
    CategoryTaxes {
        category: ProductCategory::BasicFood,
        taxes: &[TaxType::Vat5],
    },
    CategoryTaxes {
        category: ProductCategory::Liquors,
        taxes: &[TaxType::Vat19, TaxType::LiquorExcise],
    },
    CategoryTaxes {
        category: ProductCategory::PlasticBags,
        taxes: &[TaxType::Vat19, TaxType::PlasticBag],
    },
    CategoryTaxes {
        category: ProductCategory::Fuels,
        taxes: &[TaxType::Vat19, TaxType::NationalConsumption],
    },
    CategoryTaxes {
        category: ProductCategory::PublicUtilities,
        taxes: &[TaxType::Exempt],
    },
    CategoryTaxes {
        category: ProductCategory::Other,
        taxes: &[TaxType::Vat19],
    },
];

/// One named tax contribution within a breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxLine {
    pub name: String,
    pub rate: Decimal,
    pub amount: Decimal,
}

/// Itemized result of a tax calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub base_value: Decimal,
    pub category: ProductCategory,
    /// Lines in table order.
    pub lines: Vec<TaxLine>,
    pub total_tax: Decimal,
    pub total_value: Decimal,
}

impl TaxBreakdown {
    /// Amount of the line called `name`, if the breakdown has one.
    pub fn amount_for(
        &self,
        name: &str,
    ) -> Option<Decimal> {
        self.lines
            .iter()
            .find(|line| line.name == name)
            .map(|line| line.amount)
    }
}

/// Table-driven sales tax calculator.
///
/// Holds no mutable state; the same calculator can be shared freely.
#[derive(Debug, Clone, Copy)]
pub struct SalesTaxCalculator<'a> {
    table: &'a [CategoryTaxes],
}

impl SalesTaxCalculator<'static> {
    /// Calculator backed by the fixed [`TAX_TABLE`].
    pub fn standard() -> Self {
        Self { table: &TAX_TABLE }
    }
}

impl<'a> SalesTaxCalculator<'a> {
    pub fn new(table: &'a [CategoryTaxes]) -> Self {
        Self { table }
    }

    /// Computes the itemized tax breakdown for `base_value`.
    ///
    /// # Errors
    ///
    /// Returns [`TaxError::InvalidArgument`] if `base_value` is not in
    /// `(0, MAX_BASE_VALUE]` or the category is missing from the table.
    pub fn calculate(
        &self,
        base_value: Decimal,
        category: ProductCategory,
    ) -> Result<TaxBreakdown, TaxError> {
        self.validate_base_value(base_value)?;
        let taxes = self.taxes(category)?;

        let lines: Vec<TaxLine> = taxes
            .iter()
            .map(|tax| TaxLine {
                name: tax.name().to_string(),
                rate: tax.rate(),
                amount: self.line_amount(base_value, *tax),
            })
            .collect();

        let total_tax = round_sum(lines.iter().map(|line| line.amount));
        let total_value = round_half_up(base_value + total_tax);

        Ok(TaxBreakdown {
            base_value,
            category,
            lines,
            total_tax,
            total_value,
        })
    }

    /// Same as [`calculate`](Self::calculate) but takes raw text, as typed
    /// by a user.
    ///
    /// `base_value` may carry surrounding whitespace and comma thousands
    /// separators; `category` must be one of the display names.
    pub fn calculate_from_input(
        &self,
        base_value: &str,
        category: &str,
    ) -> Result<TaxBreakdown, TaxError> {
        let normalized = base_value.trim().replace(',', "");
        let value = Decimal::from_str(&normalized).map_err(|_| {
            TaxError::InvalidArgument(format!("base value '{base_value}' is not numeric"))
        })?;
        let category = ProductCategory::from_str(category)?;

        self.calculate(value, category)
    }

    /// Display names of every category, in table order.
    pub fn categories(&self) -> Vec<&'static str> {
        self.table
            .iter()
            .map(|entry| entry.category.as_str())
            .collect()
    }

    /// Names of the tax lines applied to the category called `category`.
    pub fn taxes_for(
        &self,
        category: &str,
    ) -> Result<Vec<&'static str>, TaxError> {
        let category = ProductCategory::from_str(category)?;
        Ok(self
            .taxes(category)?
            .iter()
            .map(|tax| tax.name())
            .collect())
    }

    fn taxes(
        &self,
        category: ProductCategory,
    ) -> Result<&'static [TaxType], TaxError> {
        self.table
            .iter()
            .find(|entry| entry.category == category)
            .map(|entry| entry.taxes)
            .ok_or_else(|| {
                TaxError::InvalidArgument(format!("no tax lines configured for '{category}'"))
            })
    }

    fn validate_base_value(
        &self,
        base_value: Decimal,
    ) -> Result<(), TaxError> {
        if base_value <= Decimal::ZERO {
            return Err(TaxError::InvalidArgument(format!(
                "base value must be greater than zero, got {base_value}"
            )));
        }
        if base_value > MAX_BASE_VALUE {
            return Err(TaxError::InvalidArgument(format!(
                "base value must not exceed {MAX_BASE_VALUE}, got {base_value}"
            )));
        }
        Ok(())
    }

    fn line_amount(
        &self,
        base_value: Decimal,
        tax: TaxType,
    ) -> Decimal {
        match tax {
            TaxType::Exempt => Decimal::ZERO,
            _ => round_half_up(base_value * tax.rate()),
        }
    }
}

/// Computes a breakdown with the standard table.
pub fn compute_tax(
    base_value: Decimal,
    category: ProductCategory,
) -> Result<TaxBreakdown, TaxError> {
    SalesTaxCalculator::standard().calculate(base_value, category)
}

/// Computes a breakdown from raw text input with the standard table.
pub fn compute_tax_from_input(
    base_value: &str,
    category: &str,
) -> Result<TaxBreakdown, TaxError> {
    SalesTaxCalculator::standard().calculate_from_input(base_value, category)
}

/// Display names of the known categories, in table order.
pub fn available_categories() -> Vec<&'static str> {
    SalesTaxCalculator::standard().categories()
}

/// Tax line names for a category given by display name.
pub fn taxes_for_category(category: &str) -> Result<Vec<&'static str>, TaxError> {
    SalesTaxCalculator::standard().taxes_for(category)
}
