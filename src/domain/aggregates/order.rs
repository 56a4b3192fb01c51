//! Order Aggregate

use super::{CustomerSnapshot, DeliveryCompanySnapshot, DeliveryZone};
use crate::domain::{new_id, timestamp};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub customer: CustomerSnapshot,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_proof: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_company: Option<DeliveryCompanySnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_zone: Option<DeliveryZone>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub delivery_cost: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub total: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    pub quantity: u32,
    /// Unit price resolved when the order was placed.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub price: Decimal,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus { #[default] New, Processing, WithDelivery, Delivered, Returned, Canceled }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod { Cod, BankTransfer }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus { Paid, #[default] Unpaid, Partial }

impl OrderStatus {
    /// Returns and cancellations are the transitions the operator is asked
    /// to justify.
    pub fn needs_reason(&self) -> bool { matches!(self, Self::Returned | Self::Canceled) }
}

impl OrderItem {
    /// `None` when the product does not fit in a `Decimal`.
    pub fn line_total(&self) -> Option<Decimal> { self.price.checked_mul(Decimal::from(self.quantity)) }
}

/// Everything the order builder resolved, ready to become an [`Order`].
#[derive(Clone, Debug)]
pub struct OrderParts {
    pub order_number: String,
    pub customer: CustomerSnapshot,
    pub items: Vec<OrderItem>,
    pub payment_method: PaymentMethod,
    pub payment_proof: Option<String>,
    pub delivery_company: Option<DeliveryCompanySnapshot>,
    pub delivery_zone: Option<DeliveryZone>,
    pub delivery_cost: Decimal,
    pub notes: Option<String>,
}

impl Order {
    /// New orders always start as `new` and `unpaid`, whatever the payment
    /// method. Returns `None` if the totals overflow.
    pub fn assemble(parts: OrderParts) -> Option<Self> {
        let now = timestamp();
        let subtotal = subtotal_of(&parts.items)?;
        let total = subtotal.checked_add(parts.delivery_cost)?;
        Some(Self {
            id: new_id(), order_number: parts.order_number, customer: parts.customer, items: parts.items,
            status: OrderStatus::New, payment_method: parts.payment_method, payment_status: PaymentStatus::Unpaid,
            payment_proof: parts.payment_proof, delivery_company: parts.delivery_company, delivery_zone: parts.delivery_zone,
            delivery_cost: parts.delivery_cost, subtotal, total, notes: parts.notes,
            created_at: now, updated_at: now,
        })
    }

    pub fn set_status(&mut self, status: OrderStatus) { self.status = status; self.touch(); }

    pub fn set_payment(&mut self, status: PaymentStatus, proof: Option<String>) {
        self.payment_status = status;
        if proof.is_some() { self.payment_proof = proof; }
        self.touch();
    }

    pub fn totals_consistent(&self) -> bool {
        subtotal_of(&self.items) == Some(self.subtotal)
            && self.subtotal.checked_add(self.delivery_cost) == Some(self.total)
    }

    fn touch(&mut self) { self.updated_at = timestamp(); }
}

fn subtotal_of(items: &[OrderItem]) -> Option<Decimal> {
    items.iter().try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.line_total()?))
}
