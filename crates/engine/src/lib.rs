// crates/engine/src/lib.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{
    BatchSummary, Communication, Lead, LeadNotification, NotificationTrigger, QualificationTier,
    QualificationUpdate, Result, ScoreResult,
};
use scoring::{LeadScorer, NotificationPolicy, ScoringConfig};
use sinks::{LeadUpdateSink, NotificationSink};
use tokio::sync::watch;

struct LeadOutcome {
    tier: QualificationTier,
    notified: bool,
}

/// Applies the scorer across a collection of leads, persisting each result
/// through the update sink and raising a notification when a lead becomes hot
/// or surges while hot. Leads are processed sequentially to bound request
/// concurrency against the upstream service; a single lead's failure never
/// aborts the batch.
pub struct BatchRunner {
    scorer: LeadScorer,
    policy: NotificationPolicy,
    update_sink: Arc<dyn LeadUpdateSink>,
    notifier: Option<Arc<dyn NotificationSink>>,
}

impl BatchRunner {
    pub fn new(
        config: &ScoringConfig,
        update_sink: Arc<dyn LeadUpdateSink>,
        notifier: Option<Arc<dyn NotificationSink>>,
    ) -> Self {
        Self {
            scorer: LeadScorer::new(config),
            policy: config.notifications.clone(),
            update_sink,
            notifier,
        }
    }

    /// Run one batch. The same `now` is used for every lead so a batch is a
    /// consistent snapshot in time. When the shutdown flag flips, no further
    /// leads are submitted; the in-flight lead completes or fails naturally.
    pub async fn run(
        &self,
        leads: &[Lead],
        communications: &[Communication],
        now: DateTime<Utc>,
        shutdown: watch::Receiver<bool>,
    ) -> BatchSummary {
        let start = std::time::Instant::now();
        let mut summary = BatchSummary::default();

        for lead in leads {
            if *shutdown.borrow() {
                tracing::info!(
                    "Requalification cancelled after {} of {} leads",
                    summary.processed,
                    leads.len()
                );
                break;
            }

            summary.processed += 1;
            match self.process_lead(lead, communications, now).await {
                Ok(outcome) => {
                    summary.record_tier(outcome.tier);
                    if outcome.notified {
                        summary.notified += 1;
                    }
                    metrics::counter!("leads_scored_total", "tier" => outcome.tier.as_str())
                        .increment(1);
                }
                Err(e) => {
                    summary.errors += 1;
                    metrics::counter!("lead_processing_errors_total").increment(1);
                    tracing::error!(lead_id = %lead.id, "Failed to requalify lead: {}", e);
                }
            }
        }

        let elapsed = start.elapsed();
        metrics::histogram!("qualification_batch_duration_ms").record(elapsed.as_millis() as f64);
        tracing::info!(
            "Batch done in {:?}: {} processed ({} hot / {} warm / {} cold / {} unqualified), {} notified, {} errors",
            elapsed,
            summary.processed,
            summary.hot,
            summary.warm,
            summary.cold,
            summary.unqualified,
            summary.notified,
            summary.errors
        );

        summary
    }

    /// Exactly one update call per lead and at most one notify call. A failed
    /// notify is logged and excluded from the notified count; scoring and
    /// persistence still count as successful.
    async fn process_lead(
        &self,
        lead: &Lead,
        communications: &[Communication],
        now: DateTime<Utc>,
    ) -> Result<LeadOutcome> {
        let result = self.scorer.score(lead, communications, now);
        let update = QualificationUpdate::from(&result);
        self.update_sink.apply(&lead.id, &update).await?;

        let mut notified = false;
        if self.policy.enabled {
            if let (Some(trigger), Some(notifier)) =
                (self.notification_trigger(lead, &result), &self.notifier)
            {
                let event = build_notification(lead, &result, trigger);
                match notifier.notify(&event).await {
                    Ok(()) => notified = true,
                    Err(e) => {
                        tracing::warn!(lead_id = %lead.id, "Notification failed: {}", e);
                        metrics::counter!("lead_notification_failures_total").increment(1);
                    }
                }
            }
        }

        Ok(LeadOutcome {
            tier: result.tier,
            notified,
        })
    }

    fn notification_trigger(
        &self,
        lead: &Lead,
        result: &ScoreResult,
    ) -> Option<NotificationTrigger> {
        if result.tier != QualificationTier::Hot {
            return None;
        }
        if lead.qualification_status != Some(QualificationTier::Hot) {
            return Some(NotificationTrigger::BecameHot);
        }
        let previous = lead.qualification_score.unwrap_or(0) as u32;
        if result.score as u32 > previous + self.policy.score_jump {
            return Some(NotificationTrigger::ScoreSurge);
        }
        None
    }
}

fn build_notification(
    lead: &Lead,
    result: &ScoreResult,
    trigger: NotificationTrigger,
) -> LeadNotification {
    let message = match trigger {
        NotificationTrigger::BecameHot => format!(
            "{} is now a hot lead (score {})",
            lead.buyer_name, result.score
        ),
        NotificationTrigger::ScoreSurge => format!(
            "Hot lead {} jumped from {} to {}",
            lead.buyer_name,
            lead.qualification_score.unwrap_or(0),
            result.score
        ),
    };

    LeadNotification {
        trigger,
        lead_id: lead.id.clone(),
        buyer_name: lead.buyer_name.clone(),
        score: result.score,
        tier: result.tier,
        previous_score: lead.qualification_score,
        previous_tier: lead.qualification_status,
        message,
    }
}
