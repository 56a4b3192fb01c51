//! The back-office operations.
//!
//! Each mutation validates its form first, then runs one
//! load → mutate → save cycle under the store lock and finally announces
//! the affected views. The lock spans the whole cycle, so two requests
//! cannot overwrite each other's changes.

use crate::domain::aggregates::{Customer, DeliveryCompany, Order, Product, User};
use crate::domain::events::{RecomputeBus, RecomputeSignal, View};
use crate::error::{BackofficeError, Result};
use crate::orders::{self, OrderReceipt, StaleReferencePolicy};
use crate::repository::{self, Record};
use crate::store::{Document, DocumentStore};
use crate::validation::{
    CustomerForm, DeliveryCompanyForm, OrderForm, OrderStatusForm, PaymentForm, ProductForm, UserDraft, UserForm,
};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

const ORDER_VIEWS: &[View] = &[View::Orders, View::Customers, View::Dashboard];

pub struct Backoffice {
    store: Mutex<Box<dyn DocumentStore>>,
    bus: RecomputeBus,
    policy: StaleReferencePolicy,
}

impl Backoffice {
    pub fn new(store: impl DocumentStore + 'static, policy: StaleReferencePolicy) -> Self {
        Self { store: Mutex::new(Box::new(store)), bus: RecomputeBus::default(), policy }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RecomputeSignal> { self.bus.subscribe() }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    pub fn list_products(&self) -> Result<Vec<Product>> { self.list() }

    pub fn create_product(&self, form: ProductForm) -> Result<Product> {
        let product = form.into_draft()?.into_product();
        self.commit(&[View::Products], |doc| {
            repository::append(doc, product.clone());
            Ok(())
        })?;
        tracing::info!(id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    pub fn update_product(&self, id: &str, form: ProductForm) -> Result<Product> {
        let draft = form.into_draft()?;
        let product = self.commit(&[View::Products], |doc| repository::update(doc, id, |p: &mut Product| draft.apply_to(p)))?;
        tracing::info!(id, "Product updated");
        Ok(product)
    }

    pub fn toggle_product_status(&self, id: &str) -> Result<Product> {
        let product = self.commit(&[View::Products], |doc| repository::toggle::<Product>(doc, id))?;
        tracing::info!(id, active = product.is_active, "Product status toggled");
        Ok(product)
    }

    pub fn delete_product(&self, id: &str) -> Result<()> {
        self.commit(&[View::Products], |doc| repository::remove::<Product>(doc, id))?;
        tracing::info!(id, "Product deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    pub fn list_orders(&self) -> Result<Vec<Order>> { self.list() }

    pub fn get_order(&self, id: &str) -> Result<Order> { self.get(id) }

    /// Composes and stores a new order. Any customer created inline is
    /// committed in the same save as the order.
    pub fn create_order(&self, form: OrderForm) -> Result<OrderReceipt> {
        let request = form.into_request()?;
        let policy = self.policy;
        let receipt = self.commit(ORDER_VIEWS, |doc| orders::compose(doc, request, policy))?;
        tracing::info!(
            id = %receipt.order.id,
            order_number = %receipt.order.order_number,
            total = %receipt.order.total,
            warnings = receipt.warnings.len(),
            "Order created"
        );
        Ok(receipt)
    }

    pub fn delete_order(&self, id: &str) -> Result<()> {
        self.commit(&[View::Orders, View::Dashboard], |doc| repository::remove::<Order>(doc, id))?;
        tracing::info!(id, "Order deleted");
        Ok(())
    }

    pub fn update_order_status(&self, id: &str, form: OrderStatusForm) -> Result<Order> {
        let (status, reason) = form.into_status()?;
        let order = self.commit(ORDER_VIEWS, |doc| repository::update(doc, id, |o: &mut Order| o.set_status(status)))?;
        if status.needs_reason() {
            tracing::info!(id, ?status, reason = reason.as_deref().unwrap_or(""), "Order status changed");
        } else {
            tracing::info!(id, ?status, "Order status changed");
        }
        Ok(order)
    }

    pub fn update_payment_status(&self, id: &str, form: PaymentForm) -> Result<Order> {
        let (status, proof) = form.into_payment()?;
        let order = self.commit(&[View::Orders, View::Dashboard], |doc| {
            repository::update(doc, id, |o: &mut Order| o.set_payment(status, proof))
        })?;
        tracing::info!(id, ?status, "Payment status changed");
        Ok(order)
    }

    // -------------------------------------------------------------------------
    // Customers
    // -------------------------------------------------------------------------

    pub fn list_customers(&self) -> Result<Vec<Customer>> { self.list() }

    pub fn create_customer(&self, form: CustomerForm) -> Result<Customer> {
        let customer = form.into_draft()?.into_customer();
        self.commit(&[View::Customers], |doc| {
            repository::append(doc, customer.clone());
            Ok(())
        })?;
        tracing::info!(id = %customer.id, "Customer created");
        Ok(customer)
    }

    pub fn update_customer(&self, id: &str, form: CustomerForm) -> Result<Customer> {
        let draft = form.into_draft()?;
        let customer = self.commit(&[View::Customers], |doc| repository::update(doc, id, |c: &mut Customer| draft.apply_to(c)))?;
        tracing::info!(id, "Customer updated");
        Ok(customer)
    }

    pub fn delete_customer(&self, id: &str) -> Result<()> {
        self.commit(&[View::Customers], |doc| repository::remove::<Customer>(doc, id))?;
        tracing::info!(id, "Customer deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Delivery companies
    // -------------------------------------------------------------------------

    pub fn list_delivery_companies(&self) -> Result<Vec<DeliveryCompany>> { self.list() }

    pub fn create_delivery_company(&self, form: DeliveryCompanyForm) -> Result<DeliveryCompany> {
        let company = form.into_draft()?.into_company();
        self.commit(&[View::DeliveryCompanies], |doc| {
            repository::append(doc, company.clone());
            Ok(())
        })?;
        tracing::info!(id = %company.id, name = %company.name, "Delivery company created");
        Ok(company)
    }

    pub fn update_delivery_company(&self, id: &str, form: DeliveryCompanyForm) -> Result<DeliveryCompany> {
        let draft = form.into_draft()?;
        let company = self.commit(&[View::DeliveryCompanies], |doc| {
            repository::update(doc, id, |c: &mut DeliveryCompany| draft.apply_to(c))
        })?;
        tracing::info!(id, "Delivery company updated");
        Ok(company)
    }

    pub fn toggle_delivery_company_status(&self, id: &str) -> Result<DeliveryCompany> {
        let company = self.commit(&[View::DeliveryCompanies], |doc| repository::toggle::<DeliveryCompany>(doc, id))?;
        tracing::info!(id, active = company.is_active, "Delivery company status toggled");
        Ok(company)
    }

    pub fn delete_delivery_company(&self, id: &str) -> Result<()> {
        self.commit(&[View::DeliveryCompanies], |doc| repository::remove::<DeliveryCompany>(doc, id))?;
        tracing::info!(id, "Delivery company deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    pub fn list_users(&self) -> Result<Vec<User>> { self.list() }

    pub fn create_user(&self, form: UserForm) -> Result<User> {
        let draft = form.into_draft()?;
        let user = self.commit(&[View::Users], |doc| {
            ensure_email_free(doc, &draft, None)?;
            let user = draft.into_user();
            repository::append(doc, user.clone());
            Ok(user)
        })?;
        tracing::info!(id = %user.id, role = ?user.role, "User created");
        Ok(user)
    }

    pub fn update_user(&self, id: &str, form: UserForm) -> Result<User> {
        let draft = form.into_draft()?;
        let user = self.commit(&[View::Users], |doc| {
            repository::find_mut::<User>(doc, id)?;
            ensure_email_free(doc, &draft, Some(id))?;
            repository::update(doc, id, |u: &mut User| draft.apply_to(u))
        })?;
        tracing::info!(id, "User updated");
        Ok(user)
    }

    pub fn toggle_user_status(&self, id: &str) -> Result<User> {
        let user = self.commit(&[View::Users], |doc| repository::toggle::<User>(doc, id))?;
        tracing::info!(id, status = ?user.status, "User status toggled");
        Ok(user)
    }

    // -------------------------------------------------------------------------
    // Document access
    // -------------------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, Box<dyn DocumentStore>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn list<R: Record>(&self) -> Result<Vec<R>> {
        let doc = self.lock().load()?;
        Ok(R::collection(&doc).clone())
    }

    fn get<R: Record>(&self, id: &str) -> Result<R> {
        let doc = self.lock().load()?;
        repository::find::<R>(&doc, id).cloned().ok_or_else(|| BackofficeError::not_found(R::KIND, id))
    }

    /// The single commit point: `mutate` works on a freshly loaded copy and
    /// the copy is saved only if it succeeds.
    fn commit<T>(&self, views: &[View], mutate: impl FnOnce(&mut Document) -> Result<T>) -> Result<T> {
        let mut store = self.lock();
        let mut doc = store.load()?;
        let out = mutate(&mut doc)?;
        if let Err(e) = store.save(&doc) {
            tracing::error!(error = %e, "Failed to save back-office document");
            return Err(e.into());
        }
        drop(store);
        self.bus.announce(views);
        Ok(out)
    }
}

/// Emails are unique across users, compared exactly; `current` is the
/// account being edited.
fn ensure_email_free(doc: &Document, draft: &UserDraft, current: Option<&str>) -> Result<()> {
    let taken = doc.users.iter().any(|u| u.email == draft.email && Some(u.id.as_str()) != current);
    if taken {
        return Err(BackofficeError::EmailTaken(draft.email.clone()));
    }
    Ok(())
}
