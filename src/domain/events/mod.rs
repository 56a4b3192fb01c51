//! Recompute signals
//!
//! After every committed mutation the service announces which views hold
//! stale data so the presentation layer can re-fetch them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum View {
    Products,
    Orders,
    Customers,
    DeliveryCompanies,
    Users,
    Dashboard,
}

impl View {
    /// Subject suffix used when the signal leaves the process.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Orders => "orders",
            Self::Customers => "customers",
            Self::DeliveryCompanies => "delivery_companies",
            Self::Users => "users",
            Self::Dashboard => "dashboard",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecomputeSignal {
    pub view: View,
    pub at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct RecomputeBus {
    sender: broadcast::Sender<RecomputeSignal>,
}

impl RecomputeBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RecomputeSignal> { self.sender.subscribe() }

    /// Fire-and-forget; having no listeners is normal.
    pub fn announce(&self, views: &[View]) {
        let at = crate::domain::timestamp();
        for &view in views {
            let _ = self.sender.send(RecomputeSignal { view, at });
        }
    }
}

impl Default for RecomputeBus {
    fn default() -> Self { Self::new(64) }
}

/// Relays signals to NATS as JSON on `<prefix>.<view>` until the bus closes.
pub async fn forward_to_nats(mut signals: broadcast::Receiver<RecomputeSignal>, client: async_nats::Client, prefix: String) {
    loop {
        match signals.recv().await {
            Ok(signal) => {
                let subject = format!("{}.{}", prefix, signal.view.subject());
                let payload = match serde_json::to_vec(&signal) {
                    Ok(p) => p,
                    Err(e) => { tracing::error!(error = %e, "Failed to encode recompute signal"); continue; }
                };
                if let Err(e) = client.publish(subject, payload.into()).await {
                    tracing::warn!(error = %e, "Failed to publish recompute signal");
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Recompute relay lagged behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
