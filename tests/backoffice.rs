use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use souq_backoffice::domain::aggregates::{OrderStatus, PaymentStatus, UserStatus};
use souq_backoffice::domain::events::View;
use souq_backoffice::domain::EntityKind;
use souq_backoffice::error::StoreError;
use souq_backoffice::orders::{SkippedReference, StaleReferencePolicy};
use souq_backoffice::store::{Document, DocumentStore, JsonFileStore, MemoryStore};
use souq_backoffice::{Backoffice, BackofficeError};
use std::collections::HashSet;
use tokio::sync::broadcast::error::TryRecvError;

fn form<T: DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).expect("form deserializes")
}

fn backoffice() -> Backoffice {
    Backoffice::new(MemoryStore::new(), StaleReferencePolicy::Skip)
}

fn customer(app: &Backoffice, name: &str) -> String {
    app.create_customer(form(json!({"name": name, "phone": "0591234567", "city": "Ramallah"}))).unwrap().id
}

fn product(app: &Backoffice, name: &str, price: i64) -> String {
    app.create_product(form(json!({"name": name, "price": price}))).unwrap().id
}

fn order_for(app: &Backoffice, customer_id: &str, product_id: &str, quantity: u32) -> souq_backoffice::orders::OrderReceipt {
    app.create_order(form(json!({
        "customerId": customer_id,
        "paymentMethod": "cod",
        "items": [{"productId": product_id, "quantity": quantity}]
    })))
    .unwrap()
}

#[test]
fn created_identities_are_unique() {
    let app = backoffice();
    let mut ids = HashSet::new();
    for i in 0..20 {
        assert!(ids.insert(product(&app, &format!("Item {i}"), 10)));
        assert!(ids.insert(customer(&app, &format!("Customer {i}"))));
    }
    assert_eq!(app.list_products().unwrap().len(), 20);
}

#[test]
fn missing_ids_leave_collections_untouched() {
    let app = backoffice();
    product(&app, "Mug", 10);
    let before = app.list_products().unwrap();

    let update = app.update_product("missing", form(json!({"name": "Cup", "price": 12})));
    assert!(matches!(update, Err(BackofficeError::NotFound(EntityKind::Product, _))));
    assert!(matches!(app.toggle_product_status("missing"), Err(BackofficeError::NotFound(..))));
    assert!(matches!(app.delete_product("missing"), Err(BackofficeError::NotFound(..))));
    assert!(matches!(app.toggle_delivery_company_status("missing"), Err(BackofficeError::NotFound(..))));
    assert!(matches!(app.toggle_user_status("missing"), Err(BackofficeError::NotFound(..))));

    assert_eq!(app.list_products().unwrap(), before);
}

#[test]
fn delete_removes_exactly_one_record() {
    let app = backoffice();
    let a = customer(&app, "Amal");
    customer(&app, "Basel");
    customer(&app, "Carim");
    let before = app.list_customers().unwrap();

    app.delete_customer(&a).unwrap();
    let after = app.list_customers().unwrap();
    assert_eq!(after.len(), before.len() - 1);
    assert_eq!(after, before.into_iter().filter(|c| c.id != a).collect::<Vec<_>>());
}

#[test]
fn order_totals_are_consistent() {
    let app = backoffice();
    let c = customer(&app, "Lina");
    let mug = product(&app, "Mug", 15);
    let lamp = product(&app, "Lamp", 120);
    let company = app
        .create_delivery_company(form(json!({"name": "Fast", "phone": "0590000000", "cost": "25"})))
        .unwrap();

    let receipt = app
        .create_order(form(json!({
            "customerId": c,
            "paymentMethod": "bank_transfer",
            "deliveryCompanyId": company.id,
            "items": [{"productId": mug, "quantity": 3}, {"productId": lamp, "quantity": "1"}]
        })))
        .unwrap();
    let order = receipt.order;
    let sum: Decimal = order.items.iter().map(|i| i.price * Decimal::from(i.quantity)).sum();
    assert_eq!(order.subtotal, sum);
    assert_eq!(order.subtotal, Decimal::new(165, 0));
    assert_eq!(order.delivery_cost, Decimal::new(25, 0));
    assert_eq!(order.total, order.subtotal + order.delivery_cost);
    assert_eq!(order.status, OrderStatus::New);
    assert_eq!(order.payment_status, PaymentStatus::Unpaid);
}

#[test]
fn orders_are_numbered_in_sequence_most_recent_first() {
    let app = backoffice();
    let c = customer(&app, "Lina");
    let mug = product(&app, "Mug", 15);
    for n in 1..=12 {
        let receipt = order_for(&app, &c, &mug, 1);
        assert_eq!(receipt.order.order_number, format!("ORD-{n:03}"));
    }
    let orders = app.list_orders().unwrap();
    assert_eq!(orders.first().unwrap().order_number, "ORD-012");
    assert_eq!(orders.last().unwrap().order_number, "ORD-001");
}

#[test]
fn variant_override_price_wins_over_product_price() {
    let app = backoffice();
    let c = customer(&app, "Lina");
    let shirt = app
        .create_product(form(json!({
            "name": "Shirt",
            "type": "variant",
            "price": 50,
            "variants": r#"[{"id":"xl","size":"XL","color":"Red","price":65},{"id":"m","size":"M","color":"Blue"}]"#
        })))
        .unwrap();

    let receipt = app
        .create_order(form(json!({
            "customerId": c,
            "paymentMethod": "cod",
            "items": [
                {"productId": shirt.id, "variantId": "xl", "quantity": 1},
                {"productId": shirt.id, "variantId": "m", "variantLabel": "Medium blue", "quantity": 1}
            ]
        })))
        .unwrap();
    let items = &receipt.order.items;
    assert_eq!(items[0].price, Decimal::new(65, 0));
    assert_eq!(items[0].variant.as_deref(), Some("XL / Red"));
    assert_eq!(items[1].price, Decimal::new(50, 0));
    assert_eq!(items[1].variant.as_deref(), Some("Medium blue"));
}

#[test]
fn placing_an_order_bumps_the_customer_counter() {
    let app = backoffice();
    let c = customer(&app, "Lina");
    let mug = product(&app, "Mug", 15);
    order_for(&app, &c, &mug, 1);
    let k = app.list_customers().unwrap().into_iter().find(|x| x.id == c).unwrap().total_orders;

    order_for(&app, &c, &mug, 2);
    let refetched = app.list_customers().unwrap().into_iter().find(|x| x.id == c).unwrap();
    assert_eq!(refetched.total_orders, k + 1);
}

#[test]
fn inline_customer_is_committed_with_the_order() {
    let app = backoffice();
    let mug = product(&app, "Mug", 15);
    let receipt = app
        .create_order(form(json!({
            "customerId": "new",
            "customerName": "Sami",
            "customerPhone": "0599999999",
            "paymentMethod": "cod",
            "items": [{"productId": mug, "quantity": 1}]
        })))
        .unwrap();
    let customers = app.list_customers().unwrap();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0].id, receipt.order.customer.id);
    assert_eq!(customers[0].total_orders, 1);
    assert_eq!(customers[0].address, "");
}

#[test]
fn failed_order_leaves_no_trace() {
    let app = backoffice();
    let mug = product(&app, "Mug", 15);

    let missing_phone = app.create_order(form(json!({
        "customerId": "new", "customerName": "Sami", "paymentMethod": "cod",
        "items": [{"productId": mug, "quantity": 1}]
    })));
    assert!(matches!(missing_phone, Err(BackofficeError::MissingCustomerFields)));

    let unknown_customer = app.create_order(form(json!({
        "customerId": "C404", "paymentMethod": "cod",
        "items": [{"productId": mug, "quantity": 1}]
    })));
    assert!(matches!(unknown_customer, Err(BackofficeError::NotFound(EntityKind::Customer, _))));

    let malformed = app.create_order(form(json!({"customerId": "new", "items": []})));
    assert!(matches!(malformed, Err(BackofficeError::Validation(_))));

    assert!(app.list_customers().unwrap().is_empty());
    assert!(app.list_orders().unwrap().is_empty());
}

#[test]
fn unknown_delivery_company_means_free_delivery() {
    let app = backoffice();
    let c = customer(&app, "Lina");
    let mug = product(&app, "Mug", 15);
    let receipt = app
        .create_order(form(json!({
            "customerId": c, "paymentMethod": "cod", "deliveryCompanyId": "ghost",
            "items": [{"productId": mug, "quantity": 2}]
        })))
        .unwrap();
    assert_eq!(receipt.order.delivery_cost, Decimal::ZERO);
    assert_eq!(receipt.order.total, Decimal::new(30, 0));
    assert!(receipt.order.delivery_company.is_none());
    assert_eq!(receipt.warnings, vec![SkippedReference::DeliveryCompany { delivery_company_id: "ghost".into() }]);
}

#[test]
fn reject_policy_refuses_stale_delivery_company() {
    let app = Backoffice::new(MemoryStore::new(), StaleReferencePolicy::Reject);
    let c = customer(&app, "Lina");
    let mug = product(&app, "Mug", 15);
    let result = app.create_order(form(json!({
        "customerId": c, "paymentMethod": "cod", "deliveryCompanyId": "ghost",
        "items": [{"productId": mug, "quantity": 2}]
    })));
    assert!(matches!(result, Err(BackofficeError::NotFound(EntityKind::DeliveryCompany, _))));
    assert!(app.list_orders().unwrap().is_empty());
    assert_eq!(app.list_customers().unwrap()[0].total_orders, 0);
}

#[test]
fn product_name_length_rule() {
    let app = backoffice();
    match app.create_product(form(json!({"name": "A", "price": 10}))) {
        Err(BackofficeError::Validation(errors)) => assert_eq!(errors.get("name"), Some("name_too_short")),
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert!(app.create_product(form(json!({"name": "AB", "price": 10}))).is_ok());
    assert_eq!(app.list_products().unwrap().len(), 1);
}

#[test]
fn duplicate_email_is_a_conflict() {
    let app = backoffice();
    let owner_email = app.list_users().unwrap()[0].email.clone();

    let dup = app.create_user(form(json!({"name": "Copy", "email": owner_email})));
    assert!(matches!(dup, Err(BackofficeError::EmailTaken(_))));
    assert_eq!(app.list_users().unwrap().len(), 1);

    let different_case = owner_email.to_uppercase();
    let user = app.create_user(form(json!({"name": "Omar", "email": different_case}))).unwrap();
    assert_eq!(app.list_users().unwrap().len(), 2);

    // Keeping one's own email is not a conflict; taking someone else's is.
    assert!(app.update_user(&user.id, form(json!({"name": "Omar K", "email": different_case}))).is_ok());
    let steal = app.update_user(&user.id, form(json!({"name": "Omar K", "email": owner_email})));
    assert!(matches!(steal, Err(BackofficeError::EmailTaken(_))));
}

#[test]
fn toggles_flip_flags() {
    let app = backoffice();
    let mug = product(&app, "Mug", 15);
    assert!(!app.toggle_product_status(&mug).unwrap().is_active);
    assert!(app.toggle_product_status(&mug).unwrap().is_active);

    let owner = app.list_users().unwrap()[0].id.clone();
    assert_eq!(app.toggle_user_status(&owner).unwrap().status, UserStatus::Disabled);
}

#[test]
fn updates_keep_fields_outside_the_form() {
    let app = backoffice();
    let c = customer(&app, "Lina");
    let mug = product(&app, "Mug", 15);
    order_for(&app, &c, &mug, 1);
    let before = app.list_customers().unwrap()[0].clone();

    let updated = app
        .update_customer(&c, form(json!({"name": "Lina Haddad", "phone": "0590001112", "city": "Jenin"})))
        .unwrap();
    assert_eq!(updated.name, "Lina Haddad");
    assert_eq!(updated.created_at, before.created_at);
    assert_eq!(updated.total_orders, before.total_orders);

    // The order keeps the customer as they were.
    assert_eq!(app.list_orders().unwrap()[0].customer.name, "Lina");

    app.toggle_product_status(&mug).unwrap();
    let product = app.update_product(&mug, form(json!({"name": "Big Mug", "price": 18}))).unwrap();
    assert!(!product.is_active);
}

#[test]
fn order_status_and_payment_updates() {
    let app = backoffice();
    let c = customer(&app, "Lina");
    let mug = product(&app, "Mug", 15);
    let order = order_for(&app, &c, &mug, 1).order;

    let shipped = app.update_order_status(&order.id, form(json!({"status": "with_delivery"}))).unwrap();
    assert_eq!(shipped.status, OrderStatus::WithDelivery);
    assert!(shipped.updated_at >= order.updated_at);

    let canceled = app.update_order_status(&order.id, form(json!({"status": "canceled", "reason": "Customer changed mind"}))).unwrap();
    assert_eq!(canceled.status, OrderStatus::Canceled);

    let paid = app.update_payment_status(&order.id, form(json!({"paymentStatus": "paid", "paymentProof": "receipt-17.png"}))).unwrap();
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(paid.payment_proof.as_deref(), Some("receipt-17.png"));

    assert!(matches!(app.update_order_status(&order.id, form(json!({"status": "lost"}))), Err(BackofficeError::Validation(_))));
    assert!(matches!(app.get_order("nope"), Err(BackofficeError::NotFound(EntityKind::Order, _))));

    app.delete_order(&order.id).unwrap();
    assert!(app.list_orders().unwrap().is_empty());
    assert!(matches!(app.delete_order(&order.id), Err(BackofficeError::NotFound(..))));
}

#[test]
fn mutations_announce_views() {
    let app = backoffice();
    let mut signals = app.subscribe();

    assert!(app.create_product(form(json!({"name": "A", "price": 10}))).is_err());
    assert!(matches!(signals.try_recv(), Err(TryRecvError::Empty)));

    let c = customer(&app, "Lina");
    assert_eq!(signals.try_recv().unwrap().view, View::Customers);
    let mug = product(&app, "Mug", 15);
    assert_eq!(signals.try_recv().unwrap().view, View::Products);

    order_for(&app, &c, &mug, 1);
    let views: Vec<View> = std::iter::from_fn(|| signals.try_recv().ok()).map(|s| s.view).collect();
    assert_eq!(views, vec![View::Orders, View::Customers, View::Dashboard]);
}

#[test]
fn file_round_trip_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");
    let app = Backoffice::new(JsonFileStore::new(&path), StaleReferencePolicy::Skip);
    let c = customer(&app, "Lina");
    let mug = product(&app, "Mug", 15);
    app.create_product(form(json!({
        "name": "Shirt", "type": "variant", "price": "49.90",
        "variants": r#"[{"size":"XL","color":"Red","price":65.5}]"#
    })))
    .unwrap();
    app.create_delivery_company(form(json!({"name": "Fast", "phone": "0590000000", "cost": 20, "zoneCosts": {"jerusalem": 30}})))
        .unwrap();
    order_for(&app, &c, &mug, 2);

    let first = std::fs::read_to_string(&path).unwrap();
    let mut store = JsonFileStore::new(&path);
    let loaded = store.load().unwrap();
    store.save(&loaded).unwrap();
    let second = std::fs::read_to_string(&path).unwrap();
    assert_eq!(first, second);
    assert_eq!(store.load().unwrap(), loaded);
    assert_eq!(loaded.orders[0].created_at, app.list_orders().unwrap()[0].created_at);
}

#[test]
fn money_survives_the_file_store_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");
    let app = Backoffice::new(JsonFileStore::new(&path), StaleReferencePolicy::Skip);
    let c = customer(&app, "Lina");

    let too_big = app.create_product(form(json!({"name": "Yacht", "price": "79228162514264337593543950335"})));
    match too_big {
        Err(BackofficeError::Validation(errors)) => assert_eq!(errors.get("price"), Some("amount_too_high")),
        other => panic!("expected validation failure, got {other:?}"),
    }

    let precise = app.create_product(form(json!({"name": "Saffron", "price": "12.345678901234567891"}))).unwrap();
    let reopened = Backoffice::new(JsonFileStore::new(&path), StaleReferencePolicy::Skip);
    let products = reopened.list_products().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].price.to_string(), "12.345678901234567891");
    assert_eq!(products[0].price, precise.price);
    assert_eq!(reopened.list_customers().unwrap()[0].id, c);

    let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().file_name()).collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("db.json")]);
}

#[test]
fn overflowing_order_totals_are_refused() {
    let mut doc = Document::seeded();
    let app = backoffice();
    let c = customer(&app, "Lina");
    let mug = product(&app, "Mug", 15);
    doc.customers = app.list_customers().unwrap();
    doc.products = app.list_products().unwrap();
    doc.products[0].price = Decimal::MAX;

    let app = Backoffice::new(MemoryStore::with_document(&doc).unwrap(), StaleReferencePolicy::Skip);
    let result = app.create_order(form(json!({
        "customerId": c,
        "paymentMethod": "cod",
        "items": [{"productId": mug, "quantity": 10}]
    })));
    match result {
        Err(BackofficeError::Validation(errors)) => assert_eq!(errors.get("items"), Some("total_too_large")),
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert!(app.list_orders().unwrap().is_empty());
    assert_eq!(app.list_customers().unwrap()[0].total_orders, 0);
}

#[test]
fn repeated_variant_ids_are_rejected() {
    let app = backoffice();
    let result = app.create_product(form(json!({
        "name": "Shirt", "type": "variant", "price": 50,
        "variants": r#"[{"id":"V","size":"M","price":10},{"id":"V","size":"L","price":12}]"#
    })));
    assert!(matches!(result, Err(BackofficeError::InvalidVariantData(_))));
    assert!(app.list_products().unwrap().is_empty());
}

struct ReadOnlyStore(MemoryStore);

impl DocumentStore for ReadOnlyStore {
    fn load(&mut self) -> Result<Document, StoreError> {
        self.0.load()
    }

    fn save(&mut self, _: &Document) -> Result<(), StoreError> {
        Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
    }
}

#[test]
fn write_failures_surface_as_persistence_errors() {
    let seeded = MemoryStore::with_document(&Document::seeded()).unwrap();
    let app = Backoffice::new(ReadOnlyStore(seeded), StaleReferencePolicy::Skip);
    let mut signals = app.subscribe();

    let result = app.create_customer(form(json!({"name": "Lina", "phone": "0591234567"})));
    assert!(matches!(result, Err(BackofficeError::Persistence(_))));
    assert!(app.list_customers().unwrap().is_empty());
    assert!(signals.try_recv().is_err());
}
