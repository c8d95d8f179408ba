use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::validation::{ValidationError, ValidationResult, require_fraction, require_text};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub vat_rate: Decimal,
    pub created_at: DateTime<Utc>,
}

/// For creating new categories (no id or timestamp)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_vat_rate")]
    pub vat_rate: Decimal,
}

/// VAT rate assumed when none is given.
pub fn default_vat_rate() -> Decimal {
    Decimal::new(19, 2)
}

impl NewCategory {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        vat_rate: Decimal,
    ) -> ValidationResult<Self> {
        let category = Self {
            name: name.into(),
            description: description.into(),
            vat_rate,
        };
        category.validate()?;
        Ok(category)
    }

    pub fn validate(&self) -> ValidationResult<()> {
        require_text("name", &self.name)?;
        require_fraction("vat_rate", self.vat_rate)
    }
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub vat_rate: Option<Decimal>,
}

impl CategoryPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.vat_rate.is_none()
    }

    /// An empty patch is an error, not a no-op.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.is_empty() {
            return Err(ValidationError::EmptyPatch);
        }
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(rate) = self.vat_rate {
            require_fraction("vat_rate", rate)?;
        }
        Ok(())
    }
}
