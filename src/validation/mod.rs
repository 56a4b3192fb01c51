//! Boundary validation.
//!
//! Every mutation takes a loosely-typed form, checks it field by field and
//! hands the service a typed draft. Failures are collected into
//! [`FieldErrors`] as rule codes; text is chosen later for the caller's
//! locale.

mod forms;

pub use forms::*;

use crate::error::{BackofficeError, Result};
use crate::i18n::{rule_text, Locale};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use validator::ValidationErrors;

/// Field name (camelCase, as submitted) to the code of the first rule it
/// broke.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self { Self::default() }

    /// Collects the derive-based checks of a form.
    pub fn from_validation(outcome: std::result::Result<(), ValidationErrors>) -> Self {
        let mut errors = Self::new();
        if let Err(failed) = outcome {
            for (field, list) in failed.field_errors() {
                if let Some(first) = list.first() {
                    errors.add(camel_case(field), first.code.to_string());
                }
            }
        }
        errors
    }

    /// Records `code` unless the field already failed an earlier rule.
    pub fn add(&mut self, field: impl Into<String>, code: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| code.into());
    }

    /// Unwraps a single-field check, recording its failure.
    pub fn check<T>(&mut self, field: &str, outcome: std::result::Result<T, &'static str>) -> Option<T> {
        match outcome {
            Ok(value) => Some(value),
            Err(code) => {
                self.add(field, code);
                None
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> { self.0.get(field).map(String::as_str) }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn localized(&self, locale: Locale) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|(field, code)| (field.clone(), rule_text(code, locale).to_string()))
            .collect()
    }

    pub fn finish(self) -> Result<()> {
        if self.is_empty() { Ok(()) } else { Err(BackofficeError::Validation(self)) }
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Reads an enumeration from its wire name.
pub(crate) fn parse_enum<T: DeserializeOwned>(value: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(value.to_string())).ok()
}

/// Trims text, treating blank input as absent.
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
