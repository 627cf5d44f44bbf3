// crates/sinks/src/json_store.rs
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use common::{Communication, Error, Lead, QualificationUpdate, Result};
use parking_lot::Mutex;

use crate::{LeadDataSource, LeadUpdateSink};

/// Offline store for one-shot requalification runs: reads lead and
/// communication snapshots from JSON files, buffers applied updates in
/// memory, and writes a requalified snapshot on flush.
pub struct JsonFileStore {
    leads_path: PathBuf,
    communications_path: Option<PathBuf>,
    output_path: PathBuf,
    pending: Mutex<HashMap<String, QualificationUpdate>>,
}

impl JsonFileStore {
    pub fn new(
        leads_path: impl Into<PathBuf>,
        communications_path: Option<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            leads_path: leads_path.into(),
            communications_path,
            output_path: output_path.into(),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn pending_updates(&self) -> usize {
        self.pending.lock().len()
    }

    /// Write the requalified snapshot: the input leads with every buffered
    /// update applied. Leads without an update pass through unchanged.
    pub async fn flush(&self, leads: &[Lead]) -> Result<()> {
        let pending = {
            let mut guard = self.pending.lock();
            std::mem::take(&mut *guard)
        };

        let merged: Vec<Lead> = leads
            .iter()
            .map(|lead| {
                let mut lead = lead.clone();
                if let Some(update) = pending.get(&lead.id) {
                    lead.qualification_status = Some(update.qualification_status);
                    lead.qualification_score = Some(update.qualification_score);
                    lead.qualification_details = Some(update.qualification_details.clone());
                }
                lead
            })
            .collect();

        let json = serde_json::to_string_pretty(&merged)?;
        tokio::fs::write(&self.output_path, json).await?;
        tracing::info!(
            "Wrote {} leads ({} requalified) to {}",
            merged.len(),
            pending.len(),
            self.output_path.display()
        );
        Ok(())
    }

    async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::DataSource(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::DataSource(format!("Failed to parse {}: {}", path.display(), e)))
    }
}

#[async_trait]
impl LeadDataSource for JsonFileStore {
    async fn fetch_leads(&self) -> Result<Vec<Lead>> {
        Self::read_json(&self.leads_path).await
    }

    async fn fetch_communications(&self) -> Result<Vec<Communication>> {
        match &self.communications_path {
            Some(path) => Self::read_json(path).await,
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl LeadUpdateSink for JsonFileStore {
    async fn apply(&self, lead_id: &str, update: &QualificationUpdate) -> Result<()> {
        self.pending
            .lock()
            .insert(lead_id.to_string(), update.clone());
        Ok(())
    }
}
