use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::UserId;

/// Outbound notification payload handed to the e-mail/messaging adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HousingNotice {
    pub template: String,
    pub user_id: UserId,
    pub details: BTreeMap<String, String>,
}

impl HousingNotice {
    pub fn new(template: impl Into<String>, user_id: UserId) -> Self {
        Self {
            template: template.into(),
            user_id,
            details: BTreeMap::new(),
        }
    }

    pub fn detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Trait describing the outbound notification hook (e-mail adapter, etc.).
///
/// Dispatch is best-effort: the engine invokes it after a state change
/// commits and a failure never rolls that change back.
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notice: HousingNotice) -> Result<(), NotificationError>;
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
