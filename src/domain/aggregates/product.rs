//! Product Aggregate

use super::Toggle;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub product_type: ProductType,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub price: Decimal,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default = "active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    #[default]
    Simple,
    Variant,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    /// Overrides the parent product price when present.
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option", skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(default = "active")]
    pub is_active: bool,
}

fn active() -> bool { true }

impl Product {
    pub fn has_variants(&self) -> bool { self.product_type == ProductType::Variant }

    pub fn variant(&self, id: &str) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| v.id == id)
    }

    /// Unit price for a sale of this product, optionally of one variant.
    pub fn unit_price(&self, variant: Option<&ProductVariant>) -> Decimal {
        variant.and_then(|v| v.price).unwrap_or(self.price)
    }
}

impl ProductVariant {
    /// Description such as `"XL / Red"`, leaving out blank parts.
    pub fn label(&self) -> String {
        [self.size.trim(), self.color.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

impl Toggle for Product {
    fn toggle(&mut self) -> bool {
        self.is_active = !self.is_active;
        self.is_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::timestamp;

    fn variant(id: &str, size: &str, color: &str, price: Option<Decimal>) -> ProductVariant {
        ProductVariant { id: id.into(), size: size.into(), color: color.into(), price, sku: None, stock: None, is_active: true }
    }

    fn shirt() -> Product {
        Product {
            id: "P1".into(), name: "Shirt".into(), product_type: ProductType::Variant, price: Decimal::new(50, 0),
            variants: vec![variant("V1", "XL", "Red", Some(Decimal::new(65, 0))), variant("V2", "M", "", None)],
            image: None, is_active: true, created_at: timestamp(),
        }
    }

    #[test]
    fn test_variant_price_override() {
        let p = shirt();
        assert_eq!(p.unit_price(p.variant("V1")), Decimal::new(65, 0));
        assert_eq!(p.unit_price(p.variant("V2")), Decimal::new(50, 0));
        assert_eq!(p.unit_price(None), Decimal::new(50, 0));
    }

    #[test]
    fn test_variant_label() {
        let p = shirt();
        assert_eq!(p.variants[0].label(), "XL / Red");
        assert_eq!(p.variants[1].label(), "M");
    }

    #[test]
    fn test_toggle() {
        let mut p = shirt();
        assert!(!p.toggle());
        assert!(p.toggle());
    }

    #[test]
    fn test_type_serializes_lowercase() {
        let json = serde_json::to_value(shirt()).unwrap();
        assert_eq!(json["type"], "variant");
        assert_eq!(json["isActive"], true);
    }
}
