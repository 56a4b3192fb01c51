//! Domain model: entities, value objects and recompute signals.

pub mod aggregates;
pub mod events;
pub mod value_objects;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The kinds of record the back-office tracks. Used for not-found errors
/// and for the localized outcome messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Customer,
    Product,
    Variant,
    DeliveryCompany,
    Order,
    User,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Customer => "customer",
            Self::Product => "product",
            Self::Variant => "variant",
            Self::DeliveryCompany => "delivery company",
            Self::Order => "order",
            Self::User => "user",
        };
        f.write_str(name)
    }
}

/// Fresh identity for a new record.
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Current instant at millisecond precision, so a stored timestamp
/// revives to exactly the same value.
pub fn timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
