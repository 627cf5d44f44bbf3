// crates/common/src/lib.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod error;

pub use error::{Error, Result};

/// Acquisition channel for a lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    Referral,
    DirectContact,
    Website,
    Networking,
    Portal,
    PaidSocial,
    EmailMarketing,
    Other,
}

/// Pipeline status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Viewing,
    Offer,
    Won,
    Lost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Qualification tier derived from the numeric score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualificationTier {
    Hot,
    Warm,
    Cold,
    Unqualified,
}

impl QualificationTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualificationTier::Hot => "hot",
            QualificationTier::Warm => "warm",
            QualificationTier::Cold => "cold",
            QualificationTier::Unqualified => "unqualified",
        }
    }
}

/// Secondary classification used for notification routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Normal,
    High,
    Low,
}

/// Machine-readable tag emitted by a scoring primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    HighEngagement,
    RecentActivity,
    VeryRecent,
    StaleLead,
    BudgetDefined,
    SpecificInterest,
    DetailedMessage,
    HighPriority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Negative,
}

/// Human-readable explanation of one contribution to the score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    pub label: String,
    pub polarity: Polarity,
    pub points: f64,
}

impl Factor {
    pub fn positive(label: impl Into<String>, points: f64) -> Self {
        Self {
            label: label.into(),
            polarity: Polarity::Positive,
            points,
        }
    }

    pub fn negative(label: impl Into<String>, points: f64) -> Self {
        Self {
            label: label.into(),
            polarity: Polarity::Negative,
            points,
        }
    }
}

/// Lead / opportunity record. Read-only to the scorer; optional fields may be
/// absent on records arriving from the upstream store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub buyer_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,

    pub source: LeadSource,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_contact_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub budget_eur: Option<f64>,
    #[serde(default)]
    pub property_interest: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    pub status: LeadStatus,
    #[serde(default)]
    pub follow_ups: u32,

    // Prior scoring state, overwritten on each run
    #[serde(default)]
    pub qualification_status: Option<QualificationTier>,
    #[serde(default)]
    pub qualification_score: Option<u8>,
    #[serde(default)]
    pub qualification_details: Option<QualificationDetails>,
}

impl Lead {
    /// Reference timestamp for recency: last contact, falling back to creation.
    pub fn last_touch(&self) -> DateTime<Utc> {
        self.last_contact_at.unwrap_or(self.created_at)
    }
}

/// Communication record, used only for interaction volume and recency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Communication {
    pub id: String,
    #[serde(default)]
    pub contact_id: Option<String>,
    #[serde(default)]
    pub opportunity_id: Option<String>,
    pub sent_at: DateTime<Utc>,
}

impl Communication {
    pub fn belongs_to(&self, lead: &Lead) -> bool {
        self.contact_id.as_deref() == Some(lead.id.as_str())
            || self.opportunity_id.as_deref() == Some(lead.id.as_str())
    }
}

/// Result of one scoring pass. Computed fresh on every invocation and fully
/// replaces the previous qualification state on the lead record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: u8,
    pub tier: QualificationTier,
    pub factors: Vec<Factor>,
    pub signals: Vec<Signal>,
    pub urgency: Urgency,
    pub needs_attention: bool,
    pub method: String,
    pub scored_at: DateTime<Utc>,
}

impl ScoreResult {
    pub fn has_signal(&self, signal: Signal) -> bool {
        self.signals.contains(&signal)
    }
}

/// Factors/signals/urgency bundle stored alongside the score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualificationDetails {
    pub factors: Vec<Factor>,
    pub signals: Vec<Signal>,
    pub urgency: Urgency,
    pub method: String,
}

/// Partial update written back to the lead record through the update sink
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualificationUpdate {
    pub qualification_status: QualificationTier,
    pub qualification_score: u8,
    pub qualification_date: DateTime<Utc>,
    pub qualification_details: QualificationDetails,
}

impl From<&ScoreResult> for QualificationUpdate {
    fn from(result: &ScoreResult) -> Self {
        Self {
            qualification_status: result.tier,
            qualification_score: result.score,
            qualification_date: result.scored_at,
            qualification_details: QualificationDetails {
                factors: result.factors.clone(),
                signals: result.signals.clone(),
                urgency: result.urgency,
                method: result.method.clone(),
            },
        }
    }
}

/// What fired a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTrigger {
    BecameHot,
    ScoreSurge,
}

/// Structured event handed to the notification sink
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadNotification {
    pub trigger: NotificationTrigger,
    pub lead_id: String,
    pub buyer_name: String,
    pub score: u8,
    pub tier: QualificationTier,
    pub previous_score: Option<u8>,
    pub previous_tier: Option<QualificationTier>,
    pub message: String,
}

/// Per-batch outcome counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub hot: usize,
    pub warm: usize,
    pub cold: usize,
    pub unqualified: usize,
    pub errors: usize,
    pub notified: usize,
}

impl BatchSummary {
    pub fn record_tier(&mut self, tier: QualificationTier) {
        match tier {
            QualificationTier::Hot => self.hot += 1,
            QualificationTier::Warm => self.warm += 1,
            QualificationTier::Cold => self.cold += 1,
            QualificationTier::Unqualified => self.unqualified += 1,
        }
    }

    pub fn categorized(&self) -> usize {
        self.hot + self.warm + self.cold + self.unqualified
    }
}
