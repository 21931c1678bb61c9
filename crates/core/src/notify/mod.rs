//! Outbound notifications for the approval workflow.
//!
//! Delivery happens after the commit it describes; a failed delivery is
//! logged and never rolls anything back.

use std::collections::HashMap;

use async_trait::async_trait;
use khata_shared::types::{CompanyId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Notification errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    /// The sink could not deliver.
    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    /// Recipients could not be resolved.
    #[error("Actor directory unavailable: {0}")]
    DirectoryUnavailable(String),
}

/// A message for one or more staff users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Users to notify.
    pub recipient_ids: Vec<UserId>,
    /// Short title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// In-app link.
    pub link: Option<String>,
}

/// Delivers notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers `notification` to its recipients.
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Resolves who should hear about approval requests.
#[async_trait]
pub trait ActorDirectory: Send + Sync {
    /// Users of `company_id` allowed to resolve requests.
    async fn privileged_actors(&self, company_id: CompanyId) -> Result<Vec<UserId>, NotifyError>;
}

/// Sink that writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            recipients = notification.recipient_ids.len(),
            title = %notification.title,
            link = notification.link.as_deref().unwrap_or(""),
            "{}",
            notification.message
        );
        Ok(())
    }
}

/// Fixed company-to-admins mapping.
#[derive(Debug, Default, Clone)]
pub struct StaticActorDirectory {
    admins: HashMap<CompanyId, Vec<UserId>>,
}

impl StaticActorDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a privileged user to a company.
    #[must_use]
    pub fn with_admin(mut self, company_id: CompanyId, uid: UserId) -> Self {
        self.admins.entry(company_id).or_default().push(uid);
        self
    }
}

#[async_trait]
impl ActorDirectory for StaticActorDirectory {
    async fn privileged_actors(&self, company_id: CompanyId) -> Result<Vec<UserId>, NotifyError> {
        Ok(self.admins.get(&company_id).cloned().unwrap_or_default())
    }
}
