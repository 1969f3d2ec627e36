//! Urgent-report notification hook.
//!
//! Delivery is fire-and-forget: the pipeline spawns the call and never
//! waits on it, and a failing [`Notifier`] only produces a warning.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use works_portal_report_models::Domain;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NotifyKind {
    /// Needs attention soon
    Urgent,
    /// Needs attention now; the segment or asset is out of service
    Critical,
}

/// What a notification says about the triggering report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub domain: Domain,
    pub id: String,
    pub title: String,
    pub district: String,
    pub reported_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, kind: NotifyKind, summary: &ReportSummary) -> Result<(), NotifyError>;
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, kind: NotifyKind, summary: &ReportSummary) -> Result<(), NotifyError> {
        log::warn!(
            "[{kind}] {} report {} \"{}\" in {} ({})",
            summary.domain,
            summary.id,
            summary.title,
            summary.district,
            summary.reported_at.to_rfc3339()
        );
        Ok(())
    }
}

/// Spawns delivery on the runtime and returns immediately.
pub fn dispatch(notifier: Arc<dyn Notifier>, kind: NotifyKind, summary: ReportSummary) {
    tokio::spawn(async move {
        if let Err(e) = notifier.notify(kind, &summary).await {
            log::warn!("Dropped {kind} notification for {} {}: {e}", summary.domain, summary.id);
        }
    });
}
