// crates/sinks/src/log_notifier.rs
use async_trait::async_trait;
use common::{LeadNotification, Result};

use crate::NotificationSink;

/// Notification sink for offline runs: emits the event to the log instead of
/// routing it to an assigned agent.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(&self, event: &LeadNotification) -> Result<()> {
        tracing::info!(
            lead_id = %event.lead_id,
            trigger = ?event.trigger,
            score = event.score,
            tier = event.tier.as_str(),
            "{}",
            event.message
        );
        Ok(())
    }
}
