// crates/scoring/src/scorer.rs
use chrono::{DateTime, Utc};
use common::{
    Communication, Factor, Lead, LeadSource, LeadStatus, Priority, QualificationTier, ScoreResult,
    Signal, Urgency,
};

use crate::{FactorWeights, ScoringConfig, TierThresholds};

/// Identifier stored with each result so downstream consumers can tell which
/// scoring generation produced it.
pub const SCORING_METHOD: &str = "weighted_v2";

const MISSING_CONTACT_PENALTY: f64 = 5.0;
const LOST_PENALTY: f64 = 30.0;
const RECENT_WINDOW_DAYS: i64 = 7;
const DETAILED_MESSAGE_CHARS: usize = 50;

/// Running total plus the explanations gathered along the way
#[derive(Default)]
struct Tally {
    points: f64,
    factors: Vec<Factor>,
    signals: Vec<Signal>,
}

/// Unified lead scorer. Pure function of (lead, communications, config, now);
/// holds no mutable state and is safe to share across concurrent scoring of
/// independent leads.
pub struct LeadScorer {
    weights: FactorWeights,
    thresholds: TierThresholds,
}

impl LeadScorer {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            weights: config.weights.clone(),
            thresholds: config.thresholds.clone(),
        }
    }

    /// Score one lead against its communication history. `now` is injected so
    /// recency math is deterministic; pass `Utc::now()` outside of tests.
    pub fn score(
        &self,
        lead: &Lead,
        communications: &[Communication],
        now: DateTime<Utc>,
    ) -> ScoreResult {
        let mut tally = Tally::default();

        self.source_quality(lead, &mut tally);
        self.budget(lead, &mut tally);
        self.contact_completeness(lead, &mut tally);
        self.engagement(lead, communications, now, &mut tally);
        self.recency(lead, now, &mut tally);
        self.intent(lead, &mut tally);

        if lead.status == LeadStatus::Lost {
            tally.points = (tally.points - LOST_PENALTY).max(0.0);
            tally
                .factors
                .push(Factor::negative("Lead marked lost", LOST_PENALTY));
        }

        let score = tally.points.clamp(0.0, 100.0).round() as u8;
        let tier = self.categorize(score);
        let urgency = derive_urgency(&tally.signals);
        let needs_attention =
            tier == QualificationTier::Hot || (tier == QualificationTier::Warm && urgency == Urgency::High);

        tracing::trace!(lead_id = %lead.id, score, tier = tier.as_str(), "lead scored");

        ScoreResult {
            score,
            tier,
            factors: tally.factors,
            signals: tally.signals,
            urgency,
            needs_attention,
            method: SCORING_METHOD.to_string(),
            scored_at: now,
        }
    }

    fn categorize(&self, score: u8) -> QualificationTier {
        let score = score as u32;
        if score >= self.thresholds.hot {
            QualificationTier::Hot
        } else if score >= self.thresholds.warm {
            QualificationTier::Warm
        } else if score >= self.thresholds.cold {
            QualificationTier::Cold
        } else {
            QualificationTier::Unqualified
        }
    }

    fn source_quality(&self, lead: &Lead, out: &mut Tally) {
        let weight = self.weights.source_quality as f64;
        let fraction = match lead.source {
            LeadSource::Referral => 1.0,
            LeadSource::DirectContact => 0.85,
            LeadSource::Website | LeadSource::Networking => 0.7,
            LeadSource::Portal | LeadSource::PaidSocial => 0.5,
            LeadSource::EmailMarketing | LeadSource::Other => 0.3,
        };

        let points = weight * fraction;
        out.points += points;
        if points >= weight * 2.0 / 3.0 {
            out.factors
                .push(Factor::positive("High-quality lead source", points));
        }
    }

    fn budget(&self, lead: &Lead, out: &mut Tally) {
        let weight = self.weights.budget as f64;
        // Zero, negative, and non-finite budgets contribute nothing
        let Some(budget) = lead.budget_eur.filter(|b| b.is_finite() && *b > 0.0) else {
            return;
        };

        let fraction = if budget >= 500_000.0 {
            1.0
        } else if budget >= 250_000.0 {
            0.8
        } else if budget >= 100_000.0 {
            0.6
        } else {
            0.4
        };

        let points = weight * fraction;
        out.points += points;
        out.signals.push(Signal::BudgetDefined);
        if fraction >= 0.8 {
            out.factors.push(Factor::positive("Substantial budget", points));
        }
    }

    fn contact_completeness(&self, lead: &Lead, out: &mut Tally) {
        let weight = self.weights.contact_completeness as f64;
        let quarter = weight / 4.0;

        let has_email = has_text(&lead.email);
        let has_phone = has_text(&lead.phone);
        let full_name = lead.buyer_name.split_whitespace().count() >= 2;
        let has_location = has_text(&lead.location);

        let points = [has_email, has_phone, full_name, has_location]
            .into_iter()
            .filter(|present| *present)
            .count() as f64
            * quarter;
        out.points += points;

        if points > weight * 2.0 / 3.0 {
            out.factors
                .push(Factor::positive("Complete contact details", points));
        }

        if !has_email && !has_phone {
            out.points -= MISSING_CONTACT_PENALTY;
            out.factors.push(Factor::negative(
                "No direct contact channel",
                MISSING_CONTACT_PENALTY,
            ));
        }
    }

    fn engagement(
        &self,
        lead: &Lead,
        communications: &[Communication],
        now: DateTime<Utc>,
        out: &mut Tally,
    ) {
        let weight = self.weights.engagement as f64;
        let related: Vec<&Communication> = communications
            .iter()
            .filter(|c| c.belongs_to(lead))
            .collect();
        let interactions = related.len() + lead.follow_ups as usize;

        let points = if interactions >= 5 {
            weight
        } else if interactions >= 3 {
            weight * 0.7
        } else if interactions >= 1 {
            weight * 0.4
        } else {
            0.0
        };
        out.points += points;

        if interactions >= 5 {
            out.signals.push(Signal::HighEngagement);
            out.factors.push(Factor::positive("Highly engaged", points));
        }

        let recent = related
            .iter()
            .filter(|c| (now - c.sent_at).num_days() < RECENT_WINDOW_DAYS)
            .count();
        if recent >= 2 {
            out.points += weight * 0.2;
            out.signals.push(Signal::RecentActivity);
        }
    }

    fn recency(&self, lead: &Lead, now: DateTime<Utc>, out: &mut Tally) {
        let weight = self.weights.recency as f64;
        // Whole-day truncation; a future last_touch counts as today
        let days = (now - lead.last_touch()).num_days().max(0);

        let points = match days {
            0..=2 => {
                out.signals.push(Signal::VeryRecent);
                weight
            }
            3..=7 => weight * 0.8,
            8..=14 => weight * 8.0 / 15.0,
            15..=30 => weight * 4.0 / 15.0,
            _ => {
                out.signals.push(Signal::StaleLead);
                out.factors
                    .push(Factor::negative("No contact in over 30 days", weight));
                0.0
            }
        };
        out.points += points;
    }

    fn intent(&self, lead: &Lead, out: &mut Tally) {
        let weight = self.weights.intent as f64;
        let mut points = 0.0;

        if has_text(&lead.property_interest) {
            points += weight * 0.4;
            out.signals.push(Signal::SpecificInterest);
        }
        if lead
            .message
            .as_deref()
            .is_some_and(|m| m.trim().chars().count() > DETAILED_MESSAGE_CHARS)
        {
            points += weight * 0.3;
            out.signals.push(Signal::DetailedMessage);
        }
        if lead.priority == Some(Priority::High) {
            points += weight * 0.3;
            out.signals.push(Signal::HighPriority);
        }

        if points > 0.0 {
            out.points += points;
            out.factors.push(Factor::positive("Expressed intent", points));
        }
    }
}

fn has_text(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

fn derive_urgency(signals: &[Signal]) -> Urgency {
    let has = |signal| signals.contains(&signal);

    if (has(Signal::HighEngagement) && has(Signal::RecentActivity))
        || (has(Signal::VeryRecent) && has(Signal::BudgetDefined))
    {
        Urgency::High
    } else if has(Signal::StaleLead) {
        Urgency::Low
    } else {
        Urgency::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use common::Polarity;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn bare_lead(id: &str) -> Lead {
        Lead {
            id: id.to_string(),
            buyer_name: "Ana".to_string(),
            email: None,
            phone: None,
            location: None,
            source: LeadSource::Website,
            created_at: fixed_now(),
            last_contact_at: None,
            budget_eur: None,
            property_interest: None,
            message: None,
            priority: None,
            status: LeadStatus::New,
            follow_ups: 0,
            qualification_status: None,
            qualification_score: None,
            qualification_details: None,
        }
    }

    fn communication(lead_id: &str, n: usize, sent_at: DateTime<Utc>) -> Communication {
        Communication {
            id: format!("comm-{}", n),
            contact_id: Some(lead_id.to_string()),
            opportunity_id: None,
            sent_at,
        }
    }

    fn scorer() -> LeadScorer {
        LeadScorer::new(&ScoringConfig::default())
    }

    fn tier_rank(tier: QualificationTier) -> u8 {
        match tier {
            QualificationTier::Unqualified => 0,
            QualificationTier::Cold => 1,
            QualificationTier::Warm => 2,
            QualificationTier::Hot => 3,
        }
    }

    #[test]
    fn test_bare_lead_scores_source_recency_and_contact_penalty_only() {
        // Website source (0.7 * 20 = 14) + created today (10) - missing
        // contact penalty (5); everything else contributes zero.
        let result = scorer().score(&bare_lead("l1"), &[], fixed_now());

        assert_eq!(result.score, 19);
        assert_eq!(result.tier, QualificationTier::Unqualified);
        assert!(!result.needs_attention);
    }

    #[test]
    fn test_referral_with_budget_and_engagement_is_hot() {
        let mut lead = bare_lead("l1");
        lead.buyer_name = "Maria Santos".to_string();
        lead.email = Some("maria@example.com".to_string());
        lead.phone = Some("+351 910 000 000".to_string());
        lead.source = LeadSource::Referral;
        lead.budget_eur = Some(600_000.0);

        let comms: Vec<Communication> = (0..6)
            .map(|n| communication("l1", n, fixed_now() - Duration::days(1)))
            .collect();

        let result = scorer().score(&lead, &comms, fixed_now());

        assert!(result.score >= 70, "expected hot score, got {}", result.score);
        assert_eq!(result.tier, QualificationTier::Hot);
        assert!(result.has_signal(Signal::HighEngagement));
        assert!(result.has_signal(Signal::RecentActivity));
        assert_eq!(result.urgency, Urgency::High);
        assert!(result.needs_attention);
    }

    #[test]
    fn test_score_clamped_to_scale() {
        let mut config = ScoringConfig::default();
        config.weights.source_quality = 120;
        config.weights.budget = 120;

        let mut lead = bare_lead("l1");
        lead.source = LeadSource::Referral;
        lead.budget_eur = Some(900_000.0);

        let result = LeadScorer::new(&config).score(&lead, &[], fixed_now());
        assert_eq!(result.score, 100);
    }

    #[test]
    fn test_lost_floor_at_zero() {
        let mut lead = bare_lead("l1");
        lead.source = LeadSource::Other;
        lead.status = LeadStatus::Lost;
        lead.created_at = fixed_now() - Duration::days(90);

        // Other source (6) - contact penalty (5) - stale (0) = 1, minus 30
        let result = scorer().score(&lead, &[], fixed_now());
        assert_eq!(result.score, 0);
        assert_eq!(result.tier, QualificationTier::Unqualified);
        assert!(result
            .factors
            .iter()
            .any(|f| f.polarity == Polarity::Negative && f.label == "Lead marked lost"));
    }

    #[test]
    fn test_lost_subtracts_exactly_thirty() {
        let mut lead = bare_lead("l1");
        lead.buyer_name = "Maria Santos".to_string();
        lead.email = Some("maria@example.com".to_string());
        lead.source = LeadSource::Referral;
        lead.budget_eur = Some(600_000.0);

        let active = scorer().score(&lead, &[], fixed_now());

        lead.status = LeadStatus::Lost;
        let lost = scorer().score(&lead, &[], fixed_now());

        assert_eq!(active.score - lost.score, 30);
    }

    #[test]
    fn test_idempotent_for_fixed_clock() {
        let mut lead = bare_lead("l1");
        lead.budget_eur = Some(300_000.0);
        lead.message = Some("Looking for a three-bedroom apartment near the marina with a terrace".to_string());
        let comms = vec![communication("l1", 0, fixed_now() - Duration::days(3))];

        let first = scorer().score(&lead, &comms, fixed_now());
        let second = scorer().score(&lead, &comms, fixed_now());

        assert_eq!(first.score, second.score);
        assert_eq!(first.tier, second.tier);
        assert_eq!(first.factors, second.factors);
        assert_eq!(first.signals, second.signals);
        assert_eq!(first.urgency, second.urgency);
    }

    #[test]
    fn test_tier_is_monotonic_in_score() {
        let s = scorer();
        let mut previous = tier_rank(s.categorize(0));
        for score in 1..=100u8 {
            let rank = tier_rank(s.categorize(score));
            assert!(rank >= previous, "tier dropped at score {}", score);
            previous = rank;
        }
    }

    #[test]
    fn test_tier_threshold_boundaries() {
        let s = scorer();
        assert_eq!(s.categorize(70), QualificationTier::Hot);
        assert_eq!(s.categorize(69), QualificationTier::Warm);
        assert_eq!(s.categorize(45), QualificationTier::Warm);
        assert_eq!(s.categorize(44), QualificationTier::Cold);
        assert_eq!(s.categorize(25), QualificationTier::Cold);
        assert_eq!(s.categorize(24), QualificationTier::Unqualified);
    }

    #[test]
    fn test_budget_bands_increase() {
        let s = scorer();
        let mut previous = 0;
        for budget in [50_000.0, 150_000.0, 300_000.0, 600_000.0] {
            let mut lead = bare_lead("l1");
            lead.budget_eur = Some(budget);
            let result = s.score(&lead, &[], fixed_now());
            assert!(result.has_signal(Signal::BudgetDefined));
            assert!(result.score > previous, "band for {} did not increase", budget);
            previous = result.score;
        }

        let none = s.score(&bare_lead("l1"), &[], fixed_now());
        assert!(!none.has_signal(Signal::BudgetDefined));
    }

    #[test]
    fn test_recency_bands_decay() {
        let s = scorer();
        let mut previous = u8::MAX;
        for days in [1, 5, 10, 20, 40] {
            let mut lead = bare_lead("l1");
            lead.created_at = fixed_now() - Duration::days(60);
            lead.last_contact_at = Some(fixed_now() - Duration::days(days));
            let result = s.score(&lead, &[], fixed_now());
            assert!(result.score < previous, "recency at {} days did not decay", days);
            previous = result.score;

            if days <= 2 {
                assert!(result.has_signal(Signal::VeryRecent));
            }
            if days > 30 {
                assert!(result.has_signal(Signal::StaleLead));
                assert_eq!(result.urgency, Urgency::Low);
            }
        }
    }

    #[test]
    fn test_follow_ups_count_as_interactions() {
        let mut lead = bare_lead("l1");
        lead.follow_ups = 3;

        let with_follow_ups = scorer().score(&lead, &[], fixed_now());
        lead.follow_ups = 0;
        let without = scorer().score(&lead, &[], fixed_now());

        // Three interactions land the 70% engagement band
        assert_eq!(with_follow_ups.score - without.score, 14);
    }

    #[test]
    fn test_missing_contact_penalty_needs_both_channels_absent() {
        let mut lead = bare_lead("l1");
        let penalized = scorer().score(&lead, &[], fixed_now());
        assert!(penalized
            .factors
            .iter()
            .any(|f| f.label == "No direct contact channel"));

        lead.email = Some("ana@example.com".to_string());
        let ok = scorer().score(&lead, &[], fixed_now());
        assert!(!ok.factors.iter().any(|f| f.label == "No direct contact channel"));
    }

    #[test]
    fn test_intent_signals() {
        let mut lead = bare_lead("l1");
        lead.property_interest = Some("T3 apartment, Cascais".to_string());
        lead.message = Some(
            "We are relocating in September and need a family home close to international schools"
                .to_string(),
        );
        lead.priority = Some(Priority::High);

        let result = scorer().score(&lead, &[], fixed_now());
        assert!(result.has_signal(Signal::SpecificInterest));
        assert!(result.has_signal(Signal::DetailedMessage));
        assert!(result.has_signal(Signal::HighPriority));
        // Full intent weight on top of the bare baseline
        assert_eq!(result.score, 29);
    }

    #[test]
    fn test_warm_with_fresh_budget_needs_attention() {
        let mut lead = bare_lead("l1");
        lead.email = Some("ana@example.com".to_string());
        lead.budget_eur = Some(600_000.0);

        // Website (14) + budget (25) + email (3.75) + recency (10) = 52.75
        let result = scorer().score(&lead, &[], fixed_now());
        assert_eq!(result.score, 53);
        assert_eq!(result.tier, QualificationTier::Warm);
        assert_eq!(result.urgency, Urgency::High);
        assert!(result.needs_attention);
    }

    #[test]
    fn test_unparseable_budget_treated_as_absent() {
        let mut lead = bare_lead("l1");
        lead.budget_eur = Some(f64::NAN);
        let with_nan = scorer().score(&lead, &[], fixed_now());

        lead.budget_eur = None;
        let without = scorer().score(&lead, &[], fixed_now());

        assert_eq!(with_nan.score, without.score);
        assert!(!with_nan.has_signal(Signal::BudgetDefined));
    }
}
