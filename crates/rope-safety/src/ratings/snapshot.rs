use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::TechnicianId;
use super::scoring::{SafetyTier, WeightScheme};

/// Sub-scores behind a PSR. `None` means the component did not contribute:
/// work history while solo, or an empty ratio component under the exclude policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub certification: f64,
    pub safety_docs: Option<f64>,
    pub quizzes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub work_history: Option<f64>,
}

/// Immutable, timestamped Personal Safety Rating for one technician.
///
/// Snapshots are derived from the technician's history and replaced
/// wholesale on recompute; nothing edits one in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PsrSnapshot {
    pub technician_id: TechnicianId,
    pub score: f64,
    pub tier: SafetyTier,
    pub scheme: WeightScheme,
    pub components: ComponentScores,
    pub computed_at: DateTime<Utc>,
    /// Per-technician sequence number; 0 marks a snapshot that was never stored.
    pub revision: u64,
    /// Expiry of the primary certification when it is still in the future;
    /// the certification sub-score changes once this passes.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub valid_until: Option<DateTime<Utc>>,
}

impl PsrSnapshot {
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.map_or(true, |until| now < until)
    }
}
