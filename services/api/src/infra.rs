use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use reslife::housing::{HousingNotice, NotificationError, NotificationPublisher};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Notification adapter for deployments without an e-mail transport wired
/// in: every notice lands in the service log.
#[derive(Default, Clone)]
pub(crate) struct LoggingNotificationPublisher;

impl NotificationPublisher for LoggingNotificationPublisher {
    fn publish(&self, notice: HousingNotice) -> Result<(), NotificationError> {
        info!(
            template = %notice.template,
            user = %notice.user_id,
            details = ?notice.details,
            "housing notification dispatched"
        );
        Ok(())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
