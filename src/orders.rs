//! Order composition.
//!
//! Turns a validated [`OrderRequest`] into a priced [`Order`] inside the
//! in-memory document: resolves or creates the customer, prices every line
//! from the catalogue, applies the delivery charge, numbers the order and
//! bumps the customer's order counter. Nothing here touches storage.

use crate::domain::aggregates::{Customer, DeliveryCompany, Order, OrderItem, OrderParts, Product};
use crate::domain::value_objects::OrderNumber;
use crate::domain::{new_id, timestamp, EntityKind};
use crate::error::{BackofficeError, Result};
use crate::repository::{self, find};
use crate::store::Document;
use crate::validation::{CustomerRef, FieldErrors, NewCustomerFields, OrderLineRequest, OrderRequest};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What to do with references to records that no longer exist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaleReferencePolicy {
    /// Drop the line (or the delivery charge) and report a warning.
    #[default]
    Skip,
    /// Fail the whole order with not-found.
    Reject,
}

impl FromStr for StaleReferencePolicy {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "reject" => Ok(Self::Reject),
            _ => Err(()),
        }
    }
}

/// A reference the builder could not resolve and left out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SkippedReference {
    #[serde(rename_all = "camelCase")]
    Product { product_id: String },
    /// The line was kept at the product's own price.
    #[serde(rename_all = "camelCase")]
    Variant { product_id: String, variant_id: String },
    /// No delivery charge was applied.
    #[serde(rename_all = "camelCase")]
    DeliveryCompany { delivery_company_id: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderReceipt {
    pub order: Order,
    pub warnings: Vec<SkippedReference>,
}

pub fn compose(doc: &mut Document, request: OrderRequest, policy: StaleReferencePolicy) -> Result<OrderReceipt> {
    let mut warnings = Vec::new();
    let customer_id = resolve_customer(doc, request.customer)?;

    let mut items = Vec::with_capacity(request.items.len());
    for line in request.items {
        match find::<Product>(doc, &line.product_id) {
            Some(product) => items.push(price_line(product, line, policy, &mut warnings)?),
            None => {
                skip(policy, EntityKind::Product, &line.product_id)?;
                warnings.push(SkippedReference::Product { product_id: line.product_id });
            }
        }
    }

    let mut delivery_cost = Decimal::ZERO;
    let mut delivery_company = None;
    if let Some(company_id) = request.delivery_company_id {
        match find::<DeliveryCompany>(doc, &company_id) {
            Some(company) => {
                delivery_cost = company.cost_for(request.delivery_zone);
                delivery_company = Some(company.snapshot(delivery_cost));
            }
            None => {
                skip(policy, EntityKind::DeliveryCompany, &company_id)?;
                warnings.push(SkippedReference::DeliveryCompany { delivery_company_id: company_id });
            }
        }
    }

    let order_number = next_order_number(doc).to_string();
    let customer = repository::find_mut::<Customer>(doc, &customer_id)?;
    customer.record_order();
    let snapshot = customer.snapshot();

    let order = Order::assemble(OrderParts {
        order_number,
        customer: snapshot,
        items,
        payment_method: request.payment_method,
        payment_proof: request.payment_proof,
        delivery_company,
        delivery_zone: request.delivery_zone,
        delivery_cost,
        notes: request.notes,
    })
    .ok_or_else(totals_overflow)?;
    doc.orders.insert(0, order.clone());
    Ok(OrderReceipt { order, warnings })
}

/// Existing customers are looked up; inline ones are created with zeroed
/// counters and become durable only with the order itself.
fn resolve_customer(doc: &mut Document, customer: CustomerRef) -> Result<String> {
    match customer {
        CustomerRef::Existing(id) => find::<Customer>(doc, &id)
            .map(|c| c.id.clone())
            .ok_or_else(|| BackofficeError::not_found(EntityKind::Customer, id)),
        CustomerRef::New(NewCustomerFields { name: Some(name), phone: Some(phone), address, city }) => {
            let customer = Customer {
                id: new_id(),
                name,
                phone,
                address,
                city,
                total_orders: 0,
                return_count: 0,
                notes: None,
                created_at: timestamp(),
            };
            let id = customer.id.clone();
            repository::append(doc, customer);
            Ok(id)
        }
        CustomerRef::New(_) => Err(BackofficeError::MissingCustomerFields),
    }
}

fn price_line(
    product: &Product,
    line: OrderLineRequest,
    policy: StaleReferencePolicy,
    warnings: &mut Vec<SkippedReference>,
) -> Result<OrderItem> {
    let mut variant_label = line.variant_label;
    let mut variant_id = None;
    let mut variant = None;

    if let (true, Some(requested)) = (product.has_variants(), line.variant_id) {
        match product.variant(&requested) {
            Some(found) => {
                variant_label = variant_label.or_else(|| Some(found.label()).filter(|l| !l.is_empty()));
                variant_id = Some(requested);
                variant = Some(found);
            }
            None => {
                skip(policy, EntityKind::Variant, &requested)?;
                warnings.push(SkippedReference::Variant { product_id: product.id.clone(), variant_id: requested });
            }
        }
    }

    Ok(OrderItem {
        product_id: product.id.clone(),
        variant_id,
        product_name: product.name.clone(),
        variant: variant_label,
        quantity: line.quantity.value(),
        price: product.unit_price(variant),
    })
}

fn totals_overflow() -> BackofficeError {
    let mut errors = FieldErrors::new();
    errors.add("items", "total_too_large");
    BackofficeError::Validation(errors)
}

fn skip(policy: StaleReferencePolicy, kind: EntityKind, id: &str) -> Result<()> {
    match policy {
        StaleReferencePolicy::Reject => Err(BackofficeError::not_found(kind, id)),
        StaleReferencePolicy::Skip => {
            tracing::warn!(%kind, id, "Skipping stale reference while composing order");
            Ok(())
        }
    }
}

/// `count + 1`, moved past any number already in use (possible once
/// orders have been deleted).
fn next_order_number(doc: &Document) -> OrderNumber {
    let mut number = OrderNumber::new(doc.orders.len() as u64 + 1);
    while doc.orders.iter().any(|o| o.order_number == number.to_string()) {
        number = number.next();
    }
    number
}
