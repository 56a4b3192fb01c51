//! Delivery company aggregate

use super::Toggle;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryCompany {
    pub id: String,
    pub name: String,
    pub phone: String,
    /// Flat cost, used whenever no zone override applies.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub cost: Decimal,
    #[serde(default, skip_serializing_if = "ZoneCosts::is_empty")]
    pub zone_costs: ZoneCosts,
    #[serde(default = "active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

fn active() -> bool { true }

/// Delivery regions with their own price list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeliveryZone {
    WestBank,
    #[serde(rename = "inside1948")]
    Inside1948,
    Jerusalem,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneCosts {
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option", skip_serializing_if = "Option::is_none")]
    pub west_bank: Option<Decimal>,
    #[serde(rename = "inside1948", default, with = "rust_decimal::serde::arbitrary_precision_option", skip_serializing_if = "Option::is_none")]
    pub inside_1948: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option", skip_serializing_if = "Option::is_none")]
    pub jerusalem: Option<Decimal>,
}

impl ZoneCosts {
    pub fn is_empty(&self) -> bool {
        self.west_bank.is_none() && self.inside_1948.is_none() && self.jerusalem.is_none()
    }

    pub fn get(&self, zone: DeliveryZone) -> Option<Decimal> {
        match zone {
            DeliveryZone::WestBank => self.west_bank,
            DeliveryZone::Inside1948 => self.inside_1948,
            DeliveryZone::Jerusalem => self.jerusalem,
        }
    }
}

/// Copy of the company as it was when an order was placed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryCompanySnapshot {
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub cost: Decimal,
}

impl DeliveryCompany {
    pub fn cost_for(&self, zone: Option<DeliveryZone>) -> Decimal {
        zone.and_then(|z| self.zone_costs.get(z)).unwrap_or(self.cost)
    }

    /// Snapshot carrying the cost actually charged.
    pub fn snapshot(&self, charged: Decimal) -> DeliveryCompanySnapshot {
        DeliveryCompanySnapshot { id: self.id.clone(), name: self.name.clone(), phone: self.phone.clone(), cost: charged }
    }
}

impl Toggle for DeliveryCompany {
    fn toggle(&mut self) -> bool {
        self.is_active = !self.is_active;
        self.is_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::timestamp;

    #[test]
    fn test_zone_override() {
        let company = DeliveryCompany {
            id: "D1".into(), name: "Fast".into(), phone: "0590000000".into(), cost: Decimal::new(20, 0),
            zone_costs: ZoneCosts { jerusalem: Some(Decimal::new(30, 0)), ..Default::default() },
            is_active: true, created_at: timestamp(),
        };
        assert_eq!(company.cost_for(Some(DeliveryZone::Jerusalem)), Decimal::new(30, 0));
        assert_eq!(company.cost_for(Some(DeliveryZone::WestBank)), Decimal::new(20, 0));
        assert_eq!(company.cost_for(None), Decimal::new(20, 0));
    }

    #[test]
    fn test_zone_names() {
        let zone: DeliveryZone = serde_json::from_str(r#""inside1948""#).unwrap();
        assert_eq!(zone, DeliveryZone::Inside1948);
        assert_eq!(serde_json::to_string(&DeliveryZone::WestBank).unwrap(), r#""westBank""#);
    }
}
