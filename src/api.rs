//! HTTP surface.
//!
//! Lists answer with plain JSON arrays; mutations answer with an
//! [`ActionResponse`] whose message is in the caller's language.

use crate::domain::EntityKind;
use crate::error::{BackofficeError, Result};
use crate::i18n::{Locale, Message};
use crate::orders::SkippedReference;
use crate::service::Backoffice;
use crate::validation::{
    CustomerForm, DeliveryCompanyForm, FieldErrors, OrderForm, OrderStatusForm, PaymentForm, ProductForm, UserForm,
};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Path, Request, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub backoffice: Arc<Backoffice>,
    pub default_locale: Locale,
}

impl AppState {
    fn locale(&self, headers: &HeaderMap) -> Locale { Locale::negotiate(headers, self.default_locale) }

    /// Runs a back-office operation on the blocking pool; every operation
    /// holds the store lock across synchronous file I/O.
    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Backoffice) -> Result<T> + Send + 'static,
    {
        let backoffice = Arc::clone(&self.backoffice);
        tokio::task::spawn_blocking(move || op(&backoffice)).await?
    }
}

/// JSON request body. A body that does not fit the form is answered with
/// the usual failed [`ActionResponse`] instead of axum's plain-text
/// rejection.
pub struct Form<T>(pub T);

#[async_trait]
impl<T> FromRequest<AppState> for Form<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        let locale = state.locale(req.headers());
        match Json::<T>::from_request(req, state).await {
            Ok(Json(form)) => Ok(Self(form)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "Unreadable request body");
                Err(fail(BackofficeError::Validation(rejection_errors(&rejection)), locale, Message::ValidationFailed))
            }
        }
    }
}

fn rejection_errors(rejection: &JsonRejection) -> FieldErrors {
    let mut errors = FieldErrors::new();
    match rejection {
        JsonRejection::JsonDataError(e) => {
            errors.add(offending_field(&e.body_text()).unwrap_or_else(|| "form".into()), "type_mismatch")
        }
        _ => errors.add("form", "request_malformed"),
    }
    errors
}

/// Field path out of a message like
/// `... into the target type: items[0].productId: invalid type: ...`,
/// written the way field errors are keyed (`items.0.productId`).
fn offending_field(text: &str) -> Option<String> {
    let (_, detail) = text.split_once("target type: ")?;
    let (path, _) = detail.split_once(": ")?;
    if path.is_empty() || path == "." || path.contains(char::is_whitespace) {
        return None;
    }
    Some(path.replace('[', ".").replace(']', ""))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<SkippedReference>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "souq-backoffice"})) }))
        .route("/api/v1/products", get(list_products).post(create_product))
        .route("/api/v1/products/:id", put(update_product).delete(delete_product))
        .route("/api/v1/products/:id/toggle", post(toggle_product))
        .route("/api/v1/orders", get(list_orders).post(create_order))
        .route("/api/v1/orders/:id", get(get_order).delete(delete_order))
        .route("/api/v1/orders/:id/status", put(update_order_status))
        .route("/api/v1/orders/:id/payment", put(update_payment_status))
        .route("/api/v1/customers", get(list_customers).post(create_customer))
        .route("/api/v1/customers/:id", put(update_customer).delete(delete_customer))
        .route("/api/v1/delivery-companies", get(list_delivery_companies).post(create_delivery_company))
        .route("/api/v1/delivery-companies/:id", put(update_delivery_company).delete(delete_delivery_company))
        .route("/api/v1/delivery-companies/:id/toggle", post(toggle_delivery_company))
        .route("/api/v1/users", get(list_users).post(create_user))
        .route("/api/v1/users/:id", put(update_user))
        .route("/api/v1/users/:id/toggle", post(toggle_user))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn succeed<T: Serialize>(status: StatusCode, message: Message, locale: Locale, data: Option<T>, warnings: Vec<SkippedReference>) -> Response {
    let body = ActionResponse { success: true, message: message.text(locale), field_errors: None, data, warnings };
    (status, Json(body)).into_response()
}

fn fail(err: BackofficeError, locale: Locale, fallback: Message) -> Response {
    let status = match &err {
        BackofficeError::Validation(_) | BackofficeError::InvalidVariantData(_) => StatusCode::UNPROCESSABLE_ENTITY,
        BackofficeError::NotFound(..) => StatusCode::NOT_FOUND,
        BackofficeError::EmailTaken(_) => StatusCode::CONFLICT,
        BackofficeError::MissingCustomerFields => StatusCode::BAD_REQUEST,
        BackofficeError::Persistence(_) | BackofficeError::Interrupted(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_client_error() {
        tracing::debug!(error = %err, "Request rejected");
    }
    let field_errors = match &err {
        BackofficeError::Validation(errors) => Some(errors.localized(locale)),
        _ => None,
    };
    let body = ActionResponse::<()> { success: false, message: err.message(fallback).text(locale), field_errors, data: None, warnings: Vec::new() };
    (status, Json(body)).into_response()
}

fn respond<T: Serialize>(result: Result<T>, locale: Locale, status: StatusCode, done: Message, fallback: Message) -> Response {
    match result {
        Ok(data) => succeed(status, done, locale, Some(data), Vec::new()),
        Err(e) => fail(e, locale, fallback),
    }
}

fn respond_empty(result: Result<()>, locale: Locale, done: Message, fallback: Message) -> Response {
    match result {
        Ok(()) => succeed::<()>(StatusCode::OK, done, locale, None, Vec::new()),
        Err(e) => fail(e, locale, fallback),
    }
}

fn listing<T: Serialize>(result: Result<T>, locale: Locale) -> Response {
    match result {
        Ok(items) => Json(items).into_response(),
        Err(e) => fail(e, locale, Message::SaveFailed),
    }
}

// =============================================================================
// Products
// =============================================================================

async fn list_products(State(s): State<AppState>, headers: HeaderMap) -> Response {
    listing(s.run(|b| b.list_products()).await, s.locale(&headers))
}

async fn create_product(State(s): State<AppState>, headers: HeaderMap, Form(form): Form<ProductForm>) -> Response {
    let kind = EntityKind::Product;
    let result = s.run(move |b| b.create_product(form)).await;
    respond(result, s.locale(&headers), StatusCode::CREATED, Message::Created(kind), Message::SaveFailed)
}

async fn update_product(State(s): State<AppState>, headers: HeaderMap, Path(id): Path<String>, Form(form): Form<ProductForm>) -> Response {
    let kind = EntityKind::Product;
    let result = s.run(move |b| b.update_product(&id, form)).await;
    respond(result, s.locale(&headers), StatusCode::OK, Message::Updated(kind), Message::SaveFailed)
}

async fn toggle_product(State(s): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    let kind = EntityKind::Product;
    let result = s.run(move |b| b.toggle_product_status(&id)).await;
    respond(result, s.locale(&headers), StatusCode::OK, Message::StatusChanged(kind), Message::SaveFailed)
}

async fn delete_product(State(s): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    let result = s.run(move |b| b.delete_product(&id)).await;
    respond_empty(result, s.locale(&headers), Message::Deleted(EntityKind::Product), Message::DeleteFailed)
}

// =============================================================================
// Orders
// =============================================================================

async fn list_orders(State(s): State<AppState>, headers: HeaderMap) -> Response {
    listing(s.run(|b| b.list_orders()).await, s.locale(&headers))
}

async fn get_order(State(s): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    match s.run(move |b| b.get_order(&id)).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => fail(e, s.locale(&headers), Message::SaveFailed),
    }
}

async fn create_order(State(s): State<AppState>, headers: HeaderMap, Form(form): Form<OrderForm>) -> Response {
    let locale = s.locale(&headers);
    match s.run(move |b| b.create_order(form)).await {
        Ok(receipt) => succeed(StatusCode::CREATED, Message::Created(EntityKind::Order), locale, Some(receipt.order), receipt.warnings),
        Err(e) => fail(e, locale, Message::OrderCreationFailed),
    }
}

async fn delete_order(State(s): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    let result = s.run(move |b| b.delete_order(&id)).await;
    respond_empty(result, s.locale(&headers), Message::Deleted(EntityKind::Order), Message::DeleteFailed)
}

async fn update_order_status(State(s): State<AppState>, headers: HeaderMap, Path(id): Path<String>, Form(form): Form<OrderStatusForm>) -> Response {
    let kind = EntityKind::Order;
    let result = s.run(move |b| b.update_order_status(&id, form)).await;
    respond(result, s.locale(&headers), StatusCode::OK, Message::StatusChanged(kind), Message::SaveFailed)
}

async fn update_payment_status(State(s): State<AppState>, headers: HeaderMap, Path(id): Path<String>, Form(form): Form<PaymentForm>) -> Response {
    let kind = EntityKind::Order;
    let result = s.run(move |b| b.update_payment_status(&id, form)).await;
    respond(result, s.locale(&headers), StatusCode::OK, Message::Updated(kind), Message::SaveFailed)
}

// =============================================================================
// Customers
// =============================================================================

async fn list_customers(State(s): State<AppState>, headers: HeaderMap) -> Response {
    listing(s.run(|b| b.list_customers()).await, s.locale(&headers))
}

async fn create_customer(State(s): State<AppState>, headers: HeaderMap, Form(form): Form<CustomerForm>) -> Response {
    let kind = EntityKind::Customer;
    let result = s.run(move |b| b.create_customer(form)).await;
    respond(result, s.locale(&headers), StatusCode::CREATED, Message::Created(kind), Message::SaveFailed)
}

async fn update_customer(State(s): State<AppState>, headers: HeaderMap, Path(id): Path<String>, Form(form): Form<CustomerForm>) -> Response {
    let kind = EntityKind::Customer;
    let result = s.run(move |b| b.update_customer(&id, form)).await;
    respond(result, s.locale(&headers), StatusCode::OK, Message::Updated(kind), Message::SaveFailed)
}

async fn delete_customer(State(s): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    let result = s.run(move |b| b.delete_customer(&id)).await;
    respond_empty(result, s.locale(&headers), Message::Deleted(EntityKind::Customer), Message::DeleteFailed)
}

// =============================================================================
// Delivery companies
// =============================================================================

async fn list_delivery_companies(State(s): State<AppState>, headers: HeaderMap) -> Response {
    listing(s.run(|b| b.list_delivery_companies()).await, s.locale(&headers))
}

async fn create_delivery_company(State(s): State<AppState>, headers: HeaderMap, Form(form): Form<DeliveryCompanyForm>) -> Response {
    let kind = EntityKind::DeliveryCompany;
    let result = s.run(move |b| b.create_delivery_company(form)).await;
    respond(result, s.locale(&headers), StatusCode::CREATED, Message::Created(kind), Message::SaveFailed)
}

async fn update_delivery_company(
    State(s): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(form): Form<DeliveryCompanyForm>,
) -> Response {
    let kind = EntityKind::DeliveryCompany;
    let result = s.run(move |b| b.update_delivery_company(&id, form)).await;
    respond(result, s.locale(&headers), StatusCode::OK, Message::Updated(kind), Message::SaveFailed)
}

async fn toggle_delivery_company(State(s): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    let kind = EntityKind::DeliveryCompany;
    let result = s.run(move |b| b.toggle_delivery_company_status(&id)).await;
    respond(result, s.locale(&headers), StatusCode::OK, Message::StatusChanged(kind), Message::SaveFailed)
}

async fn delete_delivery_company(State(s): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    let kind = EntityKind::DeliveryCompany;
    let result = s.run(move |b| b.delete_delivery_company(&id)).await;
    respond_empty(result, s.locale(&headers), Message::Deleted(kind), Message::DeleteFailed)
}

// =============================================================================
// Users
// =============================================================================

async fn list_users(State(s): State<AppState>, headers: HeaderMap) -> Response {
    listing(s.run(|b| b.list_users()).await, s.locale(&headers))
}

async fn create_user(State(s): State<AppState>, headers: HeaderMap, Form(form): Form<UserForm>) -> Response {
    let kind = EntityKind::User;
    let result = s.run(move |b| b.create_user(form)).await;
    respond(result, s.locale(&headers), StatusCode::CREATED, Message::Created(kind), Message::SaveFailed)
}

async fn update_user(State(s): State<AppState>, headers: HeaderMap, Path(id): Path<String>, Form(form): Form<UserForm>) -> Response {
    let kind = EntityKind::User;
    let result = s.run(move |b| b.update_user(&id, form)).await;
    respond(result, s.locale(&headers), StatusCode::OK, Message::Updated(kind), Message::SaveFailed)
}

async fn toggle_user(State(s): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    let kind = EntityKind::User;
    let result = s.run(move |b| b.toggle_user_status(&id)).await;
    respond(result, s.locale(&headers), StatusCode::OK, Message::StatusChanged(kind), Message::SaveFailed)
}
