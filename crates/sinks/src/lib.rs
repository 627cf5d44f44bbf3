// crates/sinks/src/lib.rs
use async_trait::async_trait;
use common::{Communication, Lead, LeadNotification, QualificationUpdate, Result};

pub mod json_store;
pub mod log_notifier;

pub use json_store::JsonFileStore;
pub use log_notifier::LogNotifier;

/// Supplies the lead and communication records to score. Absent optional
/// fields on the records are acceptable.
#[async_trait]
pub trait LeadDataSource: Send + Sync {
    async fn fetch_leads(&self) -> Result<Vec<Lead>>;

    async fn fetch_communications(&self) -> Result<Vec<Communication>>;
}

/// Persists qualification results back onto lead records. Must support
/// per-lead independent success/failure.
#[async_trait]
pub trait LeadUpdateSink: Send + Sync {
    async fn apply(&self, lead_id: &str, update: &QualificationUpdate) -> Result<()>;
}

/// Delivers notification events; owns its delivery semantics. Failures here
/// must never block persistence of the score itself.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, event: &LeadNotification) -> Result<()>;
}
