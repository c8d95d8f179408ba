use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::validation::{ValidationResult, require_fraction, require_text};

/// A category-specific tax definition kept alongside the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalTax {
    pub id: i64,
    pub name: String,
    pub rate: Decimal,
    pub description: String,
    pub category_id: Option<i64>,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAdditionalTax {
    pub name: String,
    pub rate: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_id: Option<i64>,
}

impl NewAdditionalTax {
    pub fn new(
        name: impl Into<String>,
        rate: Decimal,
        description: impl Into<String>,
        category_id: Option<i64>,
    ) -> ValidationResult<Self> {
        let tax = Self {
            name: name.into(),
            rate,
            description: description.into(),
            category_id,
        };
        tax.validate()?;
        Ok(tax)
    }

    pub fn validate(&self) -> ValidationResult<()> {
        require_text("name", &self.name)?;
        require_fraction("rate", self.rate)
    }
}
