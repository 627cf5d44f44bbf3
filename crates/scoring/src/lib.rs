// crates/scoring/src/lib.rs
use common::{Error, Result};
use serde::{Deserialize, Serialize};

pub mod scorer;

pub use scorer::LeadScorer;

/// Point weight per scoring factor. Weights are "points out of" budgets; the
/// defaults sum to 100 so sub-scores read directly as score points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorWeights {
    pub source_quality: u32,
    pub budget: u32,
    pub contact_completeness: u32,
    pub engagement: u32,
    pub recency: u32,
    pub intent: u32,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            source_quality: 20,
            budget: 25,
            contact_completeness: 15,
            engagement: 20,
            recency: 10,
            intent: 10,
        }
    }
}

/// Score cut-offs per tier. Contract: hot > warm > cold > 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub hot: u32,
    pub warm: u32,
    pub cold: u32,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            hot: 70,
            warm: 45,
            cold: 25,
        }
    }
}

/// When the bulk runner raises notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPolicy {
    pub enabled: bool,
    /// Score increase (while hot) that triggers a surge notification
    pub score_jump: u32,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            score_jump: 10,
        }
    }
}

/// Full scoring configuration. Passed explicitly into the engine at call
/// time; read-only during a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: FactorWeights,
    pub thresholds: TierThresholds,
    pub notifications: NotificationPolicy,
}

impl ScoringConfig {
    /// Fail fast on a misconfigured file; a non-descending threshold chain
    /// would make tier assignment non-monotonic.
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        if !(t.hot > t.warm && t.warm > t.cold && t.cold > 0) {
            return Err(Error::Config(format!(
                "thresholds must satisfy hot > warm > cold > 0, got {}/{}/{}",
                t.hot, t.warm, t.cold
            )));
        }
        if t.hot > 100 {
            return Err(Error::Config(format!(
                "hot threshold {} exceeds the 100-point scale",
                t.hot
            )));
        }
        Ok(())
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: ScoringConfig = toml::from_str(raw)
            .map_err(|e| Error::Config(format!("Failed to parse scoring config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_path(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path, e)))?;
        Self::from_toml_str(&raw)
    }
}
