//! Souq Back-Office
//!
//! Order, product, customer, delivery-company and staff management for a
//! small Arabic/English online store, persisted as one JSON document.
//!
//! ## Layers
//! - [`store`]: load/save of the whole document
//! - [`repository`]: append, find, update, remove and toggle on a collection
//! - [`validation`]: form checks producing field-level errors
//! - [`orders`]: composition of priced orders from a request
//! - [`service`]: the operations, one commit per mutation, plus recompute signals
//! - [`api`]: axum routes answering in the caller's language

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod i18n;
pub mod orders;
pub mod repository;
pub mod service;
pub mod store;
pub mod validation;

pub use error::{BackofficeError, Result, StoreError};
pub use service::Backoffice;
