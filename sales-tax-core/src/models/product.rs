use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::validation::{ValidationError, ValidationResult, require_positive, require_text};

/// Sale eligibility of a product. Only [`ProductStatus::Active`] products
/// may be sold.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
    Discontinued,
}

impl ProductStatus {
    pub const NAMES: &'static [&'static str] = &["Active", "Inactive", "Discontinued"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Discontinued => "Discontinued",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Active" => Some(Self::Active),
            "Inactive" => Some(Self::Inactive),
            "Discontinued" => Some(Self::Discontinued),
            _ => None,
        }
    }

    pub fn is_sellable(&self) -> bool {
        *self == Self::Active
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ValidationError::InvalidChoice {
            field: "status",
            allowed: Self::NAMES,
            value: s.to_string(),
        })
    }
}

/// A product as read back from the store, joined with its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub base_price: Decimal,
    pub category_id: i64,
    pub category_name: String,
    pub category_vat_rate: Decimal,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// For creating new products (no id or timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_price: Decimal,
    pub category_id: i64,
    #[serde(default)]
    pub status: ProductStatus,
}

impl NewProduct {
    pub fn new(
        name: impl Into<String>,
        base_price: Decimal,
        category_id: i64,
    ) -> ValidationResult<Self> {
        let product = Self {
            name: name.into(),
            description: String::new(),
            base_price,
            category_id,
            status: ProductStatus::Active,
        };
        product.validate()?;
        Ok(product)
    }

    pub fn with_description(
        mut self,
        description: impl Into<String>,
    ) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_status(
        mut self,
        status: ProductStatus,
    ) -> Self {
        self.status = status;
        self
    }

    pub fn validate(&self) -> ValidationResult<()> {
        require_text("name", &self.name)?;
        require_positive("base_price", self.base_price)
    }
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_price: Option<Decimal>,
    pub category_id: Option<i64>,
    pub status: Option<ProductStatus>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.base_price.is_none()
            && self.category_id.is_none()
            && self.status.is_none()
    }

    /// An empty patch is an error, not a no-op.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.is_empty() {
            return Err(ValidationError::EmptyPatch);
        }
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(price) = self.base_price {
            require_positive("base_price", price)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn status_parses_known_names() {
        assert_eq!("Active".parse::<ProductStatus>(), Ok(ProductStatus::Active));
        assert_eq!(
            "Discontinued".parse::<ProductStatus>(),
            Ok(ProductStatus::Discontinued)
        );
    }

    #[test]
    fn status_rejects_unknown_name() {
        let result = "Archived".parse::<ProductStatus>();

        assert!(matches!(
            result,
            Err(ValidationError::InvalidChoice { field: "status", .. })
        ));
    }

    #[test]
    fn only_active_is_sellable() {
        assert!(ProductStatus::Active.is_sellable());
        assert!(!ProductStatus::Inactive.is_sellable());
        assert!(!ProductStatus::Discontinued.is_sellable());
    }

    #[test]
    fn new_product_requires_positive_price() {
        assert!(NewProduct::new("Rice", dec!(0), 1).is_err());
        assert!(NewProduct::new("Rice", dec!(-5), 1).is_err());
    }

    #[test]
    fn new_product_defaults_to_active() {
        let product = NewProduct::new("Rice", dec!(2500), 1)
            .unwrap()
            .with_description("500g bag");

        assert_eq!(product.status, ProductStatus::Active);
        assert_eq!(product.description, "500g bag");
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert_eq!(
            ProductPatch::default().validate(),
            Err(ValidationError::EmptyPatch)
        );
    }

    #[test]
    fn patch_rejects_non_positive_price() {
        let patch = ProductPatch {
            base_price: Some(dec!(0)),
            ..Default::default()
        };

        assert!(patch.validate().is_err());
    }

    #[test]
    fn patch_with_status_only_is_valid() {
        let patch = ProductPatch {
            status: Some(ProductStatus::Inactive),
            ..Default::default()
        };

        assert!(!patch.is_empty());
        assert_eq!(patch.validate(), Ok(()));
    }
}
