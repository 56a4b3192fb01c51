use super::{clean, parse_enum, FieldErrors};
use crate::domain::aggregates::{
    Customer, DeliveryCompany, DeliveryZone, OrderStatus, PaymentMethod, PaymentStatus, Product, ProductType,
    ProductVariant, Role, User, UserStatus, ZoneCosts,
};
use crate::domain::value_objects::{NumberField, Phone, PhoneError, Quantity};
use crate::domain::{new_id, timestamp};
use crate::error::{BackofficeError, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use validator::Validate;

fn phone_rule(value: &str) -> std::result::Result<String, &'static str> {
    Phone::new(value).map(Phone::into_inner).map_err(|e| match e {
        PhoneError::Empty => "required",
        PhoneError::TooFewDigits => "phone_too_short",
    })
}

fn cost_rule(value: &NumberField) -> std::result::Result<Option<Decimal>, &'static str> {
    value.optional_at_least(Decimal::ZERO, "cost_invalid", "cost_negative")
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductForm {
    #[validate(length(min = 2, code = "name_too_short"))]
    pub name: String,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub price: NumberField,
    /// Variant list, usually JSON-encoded text; parsed on its own after the
    /// outer form passes.
    pub variants: Option<Value>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub product_type: ProductType,
    pub price: Decimal,
    pub variants: Vec<ProductVariant>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VariantPayload {
    id: Option<String>,
    size: String,
    color: String,
    price: NumberField,
    sku: Option<String>,
    stock: NumberField,
    is_active: Option<bool>,
}

impl ProductForm {
    pub fn into_draft(mut self) -> Result<ProductDraft> {
        self.name = self.name.trim().to_string();
        let mut errors = FieldErrors::from_validation(self.validate());
        let product_type = match clean(self.product_type.take()) {
            None => Some(ProductType::Simple),
            Some(t) => errors.check("type", parse_enum(&t).ok_or("type_invalid")),
        };
        let price = errors.check("price", self.price.at_least(Decimal::ONE, "price_invalid", "price_too_low"));
        errors.finish()?;

        let product_type = product_type.unwrap_or_default();
        let variants = match product_type {
            ProductType::Variant => parse_variants(self.variants)?,
            ProductType::Simple => Vec::new(),
        };
        Ok(ProductDraft {
            name: self.name,
            product_type,
            price: price.unwrap_or_default(),
            variants,
            image: clean(self.image),
            is_active: self.is_active,
        })
    }
}

fn parse_variants(raw: Option<Value>) -> Result<Vec<ProductVariant>> {
    let invalid = |reason: &str| BackofficeError::InvalidVariantData(reason.to_string());
    let payloads: Vec<VariantPayload> = match raw {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(text)) if text.trim().is_empty() => Vec::new(),
        Some(Value::String(text)) => serde_json::from_str(&text).map_err(|e| invalid(&e.to_string()))?,
        Some(list @ Value::Array(_)) => serde_json::from_value(list).map_err(|e| invalid(&e.to_string()))?,
        Some(_) => return Err(invalid("expected a list of variants")),
    };

    let mut seen = HashSet::new();
    let mut ids = HashSet::new();
    let mut variants = Vec::with_capacity(payloads.len());
    for payload in payloads {
        let size = payload.size.trim().to_string();
        let color = payload.color.trim().to_string();
        if size.is_empty() && color.is_empty() {
            return Err(invalid("variant needs a size or a color"));
        }
        if !seen.insert((size.clone(), color.clone())) {
            return Err(invalid(&format!("duplicate variant {size} / {color}")));
        }
        let price = payload
            .price
            .optional_at_least(Decimal::ZERO, "", "")
            .map_err(|_| invalid("variant price must be a non-negative number"))?;
        let stock = match payload.stock.optional_at_least(Decimal::ZERO, "", "") {
            Ok(None) => None,
            Ok(Some(n)) if n.fract().is_zero() => n.to_u32(),
            _ => None,
        };
        if !payload.stock.is_missing() && stock.is_none() {
            return Err(invalid("variant stock must be a whole number"));
        }
        let id = clean(payload.id).unwrap_or_else(new_id);
        if !ids.insert(id.clone()) {
            return Err(invalid(&format!("duplicate variant id {id}")));
        }
        variants.push(ProductVariant {
            id,
            size,
            color,
            price,
            sku: clean(payload.sku),
            stock,
            is_active: payload.is_active.unwrap_or(true),
        });
    }
    Ok(variants)
}

impl ProductDraft {
    pub fn into_product(self) -> Product {
        Product {
            id: new_id(),
            name: self.name,
            product_type: self.product_type,
            price: self.price,
            variants: self.variants,
            image: self.image,
            is_active: self.is_active.unwrap_or(true),
            created_at: timestamp(),
        }
    }

    /// Replaces the editable fields, keeping identity and creation time.
    pub fn apply_to(self, product: &mut Product) {
        product.name = self.name;
        product.product_type = self.product_type;
        product.price = self.price;
        product.variants = self.variants;
        product.image = self.image;
        if let Some(active) = self.is_active {
            product.is_active = active;
        }
    }
}

// =============================================================================
// Customers
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerForm {
    #[validate(length(min = 2, code = "name_too_short"))]
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerDraft {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub notes: Option<String>,
}

impl CustomerForm {
    pub fn into_draft(mut self) -> Result<CustomerDraft> {
        self.name = self.name.trim().to_string();
        let mut errors = FieldErrors::from_validation(self.validate());
        let phone = errors.check("phone", phone_rule(&self.phone));
        errors.finish()?;
        Ok(CustomerDraft {
            name: self.name,
            phone: phone.unwrap_or_default(),
            address: clean(self.address).unwrap_or_default(),
            city: clean(self.city).unwrap_or_default(),
            notes: clean(self.notes),
        })
    }
}

impl CustomerDraft {
    pub fn into_customer(self) -> Customer {
        Customer {
            id: new_id(),
            name: self.name,
            phone: self.phone,
            address: self.address,
            city: self.city,
            total_orders: 0,
            return_count: 0,
            notes: self.notes,
            created_at: timestamp(),
        }
    }

    /// Counters are not part of the form and survive an edit.
    pub fn apply_to(self, customer: &mut Customer) {
        customer.name = self.name;
        customer.phone = self.phone;
        customer.address = self.address;
        customer.city = self.city;
        customer.notes = self.notes;
    }
}

// =============================================================================
// Delivery companies
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct DeliveryCompanyForm {
    #[validate(length(min = 2, code = "name_too_short"))]
    pub name: String,
    pub phone: String,
    pub cost: NumberField,
    pub zone_costs: ZoneCostsForm,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZoneCostsForm {
    pub west_bank: NumberField,
    #[serde(rename = "inside1948")]
    pub inside_1948: NumberField,
    pub jerusalem: NumberField,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryCompanyDraft {
    pub name: String,
    pub phone: String,
    pub cost: Decimal,
    pub zone_costs: ZoneCosts,
    pub is_active: Option<bool>,
}

impl DeliveryCompanyForm {
    pub fn into_draft(mut self) -> Result<DeliveryCompanyDraft> {
        self.name = self.name.trim().to_string();
        let mut errors = FieldErrors::from_validation(self.validate());
        let phone = errors.check("phone", phone_rule(&self.phone));
        let cost = errors.check("cost", self.cost.at_least(Decimal::ZERO, "cost_invalid", "cost_negative"));
        let zones = &self.zone_costs;
        let zone_costs = ZoneCosts {
            west_bank: errors.check("zoneCosts.westBank", cost_rule(&zones.west_bank)).flatten(),
            inside_1948: errors.check("zoneCosts.inside1948", cost_rule(&zones.inside_1948)).flatten(),
            jerusalem: errors.check("zoneCosts.jerusalem", cost_rule(&zones.jerusalem)).flatten(),
        };
        errors.finish()?;
        Ok(DeliveryCompanyDraft {
            name: self.name,
            phone: phone.unwrap_or_default(),
            cost: cost.unwrap_or_default(),
            zone_costs,
            is_active: self.is_active,
        })
    }
}

impl DeliveryCompanyDraft {
    pub fn into_company(self) -> DeliveryCompany {
        DeliveryCompany {
            id: new_id(),
            name: self.name,
            phone: self.phone,
            cost: self.cost,
            zone_costs: self.zone_costs,
            is_active: self.is_active.unwrap_or(true),
            created_at: timestamp(),
        }
    }

    pub fn apply_to(self, company: &mut DeliveryCompany) {
        company.name = self.name;
        company.phone = self.phone;
        company.cost = self.cost;
        company.zone_costs = self.zone_costs;
        if let Some(active) = self.is_active {
            company.is_active = active;
        }
    }
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct UserForm {
    #[validate(length(min = 2, code = "name_too_short"))]
    pub name: String,
    #[validate(email(code = "email_invalid"))]
    pub email: String,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
}

impl UserForm {
    pub fn into_draft(mut self) -> Result<UserDraft> {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();
        let mut errors = FieldErrors::from_validation(self.validate());
        let role = match clean(self.role) {
            None => None,
            Some(r) => errors.check("role", parse_enum(&r).ok_or("role_invalid")),
        };
        let status = match clean(self.status) {
            None => None,
            Some(s) => errors.check("status", parse_enum(&s).ok_or("status_invalid")),
        };
        errors.finish()?;
        Ok(UserDraft { name: self.name, email: self.email, phone: clean(self.phone), role, status })
    }
}

impl UserDraft {
    pub fn into_user(self) -> User {
        User {
            id: new_id(),
            name: self.name,
            email: self.email,
            phone: self.phone,
            role: self.role.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            created_at: timestamp(),
        }
    }

    pub fn apply_to(self, user: &mut User) {
        user.name = self.name;
        user.email = self.email;
        user.phone = self.phone;
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(status) = self.status {
            user.status = status;
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Sentinel `customerId` asking for a customer to be created on the fly.
pub const NEW_CUSTOMER: &str = "new";

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderForm {
    #[validate(length(min = 1, code = "customer_required"))]
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub customer_city: Option<String>,
    pub items: Vec<OrderItemForm>,
    pub payment_method: Option<String>,
    pub payment_proof: Option<String>,
    pub delivery_company_id: Option<String>,
    pub delivery_zone: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderItemForm {
    pub product_id: String,
    pub variant_id: Option<String>,
    /// Human-readable variant text; synthesised from size and colour when
    /// left out.
    pub variant_label: Option<String>,
    pub quantity: NumberField,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerRef {
    Existing(String),
    New(NewCustomerFields),
}

/// Inline customer details. Name and phone are held to the customer form's
/// rules when given; the order builder rejects them when missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCustomerFields {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub variant_label: Option<String>,
    pub quantity: Quantity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub customer: CustomerRef,
    pub items: Vec<OrderLineRequest>,
    pub payment_method: PaymentMethod,
    pub payment_proof: Option<String>,
    pub delivery_company_id: Option<String>,
    pub delivery_zone: Option<DeliveryZone>,
    pub notes: Option<String>,
}

impl OrderForm {
    pub fn into_request(mut self) -> Result<OrderRequest> {
        self.customer_id = self.customer_id.trim().to_string();
        let mut errors = FieldErrors::from_validation(self.validate());
        if self.items.is_empty() {
            errors.add("items", "items_required");
        }

        let payment_method = match clean(self.payment_method) {
            None => {
                errors.add("paymentMethod", "payment_method_required");
                None
            }
            Some(m) => errors.check("paymentMethod", parse_enum(&m).ok_or("payment_method_invalid")),
        };
        let delivery_zone = match clean(self.delivery_zone) {
            None => None,
            Some(z) => errors.check("deliveryZone", parse_enum(&z).ok_or("zone_invalid")),
        };

        let new_customer = self.customer_id == NEW_CUSTOMER;
        let customer_name = clean(self.customer_name);
        let customer_phone = clean(self.customer_phone);
        if new_customer {
            if customer_name.as_ref().is_some_and(|name| name.chars().count() < 2) {
                errors.add("customerName", "name_too_short");
            }
            if let Some(phone) = &customer_phone {
                errors.check("customerPhone", phone_rule(phone));
            }
        }

        let mut items = Vec::with_capacity(self.items.len());
        for (i, item) in self.items.into_iter().enumerate() {
            let product_id = item.product_id.trim().to_string();
            if product_id.is_empty() {
                errors.add(format!("items.{i}.productId"), "product_required");
            }
            let quantity = errors.check(&format!("items.{i}.quantity"), Quantity::from_field(&item.quantity));
            if let Some(quantity) = quantity {
                items.push(OrderLineRequest {
                    product_id,
                    variant_id: clean(item.variant_id),
                    variant_label: clean(item.variant_label),
                    quantity,
                });
            }
        }
        errors.finish()?;

        let customer = if new_customer {
            CustomerRef::New(NewCustomerFields {
                name: customer_name,
                phone: customer_phone,
                address: clean(self.customer_address).unwrap_or_default(),
                city: clean(self.customer_city).unwrap_or_default(),
            })
        } else {
            CustomerRef::Existing(self.customer_id)
        };
        Ok(OrderRequest {
            customer,
            items,
            payment_method: payment_method.unwrap_or(PaymentMethod::Cod),
            payment_proof: clean(self.payment_proof),
            delivery_company_id: clean(self.delivery_company_id),
            delivery_zone,
            notes: clean(self.notes),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderStatusForm {
    pub status: Option<String>,
    /// Asked for on returns and cancellations; logged, not stored.
    pub reason: Option<String>,
}

impl OrderStatusForm {
    pub fn into_status(self) -> Result<(OrderStatus, Option<String>)> {
        let mut errors = FieldErrors::new();
        let status = match clean(self.status) {
            None => {
                errors.add("status", "required");
                None
            }
            Some(s) => errors.check("status", parse_enum(&s).ok_or("order_status_invalid")),
        };
        errors.finish()?;
        Ok((status.unwrap_or_default(), clean(self.reason)))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentForm {
    pub payment_status: Option<String>,
    pub payment_proof: Option<String>,
}

impl PaymentForm {
    pub fn into_payment(self) -> Result<(PaymentStatus, Option<String>)> {
        let mut errors = FieldErrors::new();
        let status = match clean(self.payment_status) {
            None => {
                errors.add("paymentStatus", "required");
                None
            }
            Some(s) => errors.check("paymentStatus", parse_enum(&s).ok_or("payment_status_invalid")),
        };
        errors.finish()?;
        Ok((status.unwrap_or_default(), clean(self.payment_proof)))
    }
}
