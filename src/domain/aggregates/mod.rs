//! Aggregates module
pub mod customer;
pub mod delivery;
pub mod order;
pub mod product;
pub mod user;

pub use customer::{Customer, CustomerSnapshot};
pub use delivery::{DeliveryCompany, DeliveryCompanySnapshot, DeliveryZone, ZoneCosts};
pub use order::{Order, OrderItem, OrderParts, OrderStatus, PaymentMethod, PaymentStatus};
pub use product::{Product, ProductType, ProductVariant};
pub use user::{Role, User, UserStatus};

/// Records with an on/off switch the operator can flip from a list view.
pub trait Toggle {
    /// Flips the switch and reports whether the record is now active.
    fn toggle(&mut self) -> bool;
}
