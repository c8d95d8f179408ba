//! The fixed sample catalog inserted by `seed_sample_data`.
//!
//! One category per tax table entry, one active product per category, and
//! the three category-specific surcharges.

use rust_decimal::Decimal;

use crate::calculations::ProductCategory;

pub struct SampleCategory {
    pub category: ProductCategory,
    pub description: &'static str,
    pub vat_rate: Decimal,
}

pub struct SampleProduct {
    pub name: &'static str,
    pub description: &'static str,
    pub base_price: Decimal,
    pub category: ProductCategory,
}

pub struct SampleAdditionalTax {
    pub name: &'static str,
    pub rate: Decimal,
    pub description: &'static str,
    pub category: ProductCategory,
}

pub fn categories() -> Vec<SampleCategory> {
    vec![
        SampleCategory {
            category: ProductCategory::BasicFood,
            description: "Staple food products",
            vat_rate: Decimal::new(5, 2),
        },
        SampleCategory {
            category: ProductCategory::Liquors,
            description: "Alcoholic beverages",
            vat_rate: Decimal::new(19, 2),
        },
        SampleCategory {
            category: ProductCategory::PlasticBags,
            description: "Disposable plastic bags",
            vat_rate: Decimal::new(19, 2),
        },
        SampleCategory {
            category: ProductCategory::Fuels,
            description: "Vehicle fuels",
            vat_rate: Decimal::new(19, 2),
        },
        SampleCategory {
            category: ProductCategory::PublicUtilities,
            description: "Basic public services",
            vat_rate: Decimal::ZERO,
        },
        SampleCategory {
            category: ProductCategory::Other,
            description: "Other products and services",
            vat_rate: Decimal::new(19, 2),
        },
    ]
}

pub fn products() -> Vec<SampleProduct> {
    vec![
        SampleProduct {
            name: "Rice 500g",
            description: "White rice, 500 gram bag",
            base_price: Decimal::from(2500),
            category: ProductCategory::BasicFood,
        },
        SampleProduct {
            name: "National Beer",
            description: "Domestic beer, 330ml",
            base_price: Decimal::from(3500),
            category: ProductCategory::Liquors,
        },
        SampleProduct {
            name: "Plastic Bags",
            description: "Medium plastic bags",
            base_price: Decimal::from(100),
            category: ProductCategory::PlasticBags,
        },
        SampleProduct {
            name: "Regular Gasoline",
            description: "Regular gasoline per gallon",
            base_price: Decimal::from(12000),
            category: ProductCategory::Fuels,
        },
        SampleProduct {
            name: "Electricity",
            description: "Electric power service",
            base_price: Decimal::from(50000),
            category: ProductCategory::PublicUtilities,
        },
        SampleProduct {
            name: "Laptop",
            description: "Office laptop",
            base_price: Decimal::from(1_500_000),
            category: ProductCategory::Other,
        },
    ]
}

pub fn additional_taxes() -> Vec<SampleAdditionalTax> {
    vec![
        SampleAdditionalTax {
            name: "National Consumption Tax",
            rate: Decimal::new(8, 2),
            description: "Consumption tax on fuels",
            category: ProductCategory::Fuels,
        },
        SampleAdditionalTax {
            name: "Liquor Excise",
            rate: Decimal::new(25, 2),
            description: "Special tax on liquors",
            category: ProductCategory::Liquors,
        },
        SampleAdditionalTax {
            name: "Plastic Bag Tax",
            rate: Decimal::new(20, 2),
            description: "Environmental tax on plastic bags",
            category: ProductCategory::PlasticBags,
        },
    ]
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn one_sample_category_per_tax_table_entry() {
        let names: Vec<_> = categories().iter().map(|c| c.category).collect();

        assert_eq!(names, ProductCategory::ALL.to_vec());
    }

    #[test]
    fn every_sample_category_has_one_product() {
        for category in ProductCategory::ALL {
            let count = products().iter().filter(|p| p.category == category).count();
            assert_eq!(count, 1, "{category}");
        }
    }

    #[test]
    fn surcharges_match_tax_table_rates() {
        for tax in additional_taxes() {
            let line = tax
                .category
                .tax_types()
                .iter()
                .find(|t| t.name() == tax.name)
                .expect("surcharge should appear in the tax table");
            assert_eq!(line.rate(), tax.rate);
        }
    }
}
