//! Environment-driven settings.

use crate::i18n::Locale;
use crate::orders::StaleReferencePolicy;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_file: PathBuf,
    pub port: u16,
    pub default_locale: Locale,
    pub stale_references: StaleReferencePolicy,
    pub nats_url: Option<String>,
    pub nats_subject_prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data/db.json"),
            port: 8083,
            default_locale: Locale::Ar,
            stale_references: StaleReferencePolicy::Skip,
            nats_url: None,
            nats_subject_prefix: "backoffice.recompute".into(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup; unusable values keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            data_file: lookup("DATA_FILE").map(PathBuf::from).unwrap_or(defaults.data_file),
            port: parsed(&lookup, "PORT").unwrap_or(defaults.port),
            default_locale: parsed(&lookup, "DEFAULT_LOCALE").unwrap_or(defaults.default_locale),
            stale_references: parsed(&lookup, "STALE_REFERENCE_POLICY").unwrap_or(defaults.stale_references),
            nats_url: lookup("NATS_URL").filter(|url| !url.trim().is_empty()),
            nats_subject_prefix: lookup("NATS_SUBJECT_PREFIX").unwrap_or(defaults.nats_subject_prefix),
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    let value = raw.parse().ok();
    if value.is_none() {
        tracing::warn!(key, value = %raw, "Ignoring unparseable setting, using default");
    }
    value
}
