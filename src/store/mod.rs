//! Persistence of the whole back-office as one JSON document.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::domain::aggregates::{Customer, DeliveryCompany, Order, Product, Role, User, UserStatus};
use crate::domain::{new_id, timestamp};
use crate::error::StoreError;
use serde::{Deserialize, Serialize};

/// Every collection the back-office owns. Orders are kept most recent first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Document {
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub delivery_companies: Vec<DeliveryCompany>,
    pub orders: Vec<Order>,
    pub users: Vec<User>,
}

impl Document {
    /// Contents of a freshly initialised store: empty collections plus the
    /// owner account.
    pub fn seeded() -> Self {
        Self {
            users: vec![User {
                id: new_id(),
                name: "Store Owner".into(),
                email: "owner@store.local".into(),
                phone: None,
                role: Role::Owner,
                status: UserStatus::Active,
                created_at: timestamp(),
            }],
            ..Default::default()
        }
    }

    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Load/save boundary for the document.
///
/// `load` never fails for a missing store: it seeds, saves and returns the
/// seed instead. Only write failures are reported.
pub trait DocumentStore: Send {
    fn load(&mut self) -> Result<Document, StoreError>;
    fn save(&mut self, document: &Document) -> Result<(), StoreError>;
}
