use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::domain::{Certification, InspectionTally};
use super::config::EmptyComponentPolicy;

const WORK_HISTORY_FLOOR: f64 = 50.0;
const INCIDENT_PENALTY: f64 = 10.0;

/// State of the primary certification, in scoring precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificationStatus {
    VerifiedCurrent,
    Unverified,
    NoExpiry,
    Expired,
    Missing,
}

impl CertificationStatus {
    pub fn evaluate(certification: Option<&Certification>, as_of: DateTime<Utc>) -> Self {
        let Some(certification) = certification else {
            return Self::Missing;
        };

        if !certification.verified {
            return Self::Unverified;
        }

        match certification.expires_at {
            Some(expires_at) if expires_at > as_of => Self::VerifiedCurrent,
            Some(_) => Self::Expired,
            None => Self::NoExpiry,
        }
    }

    pub const fn score(self) -> f64 {
        match self {
            Self::VerifiedCurrent => 100.0,
            Self::Unverified => 75.0,
            Self::NoExpiry => 50.0,
            Self::Expired => 25.0,
            Self::Missing => 0.0,
        }
    }
}

pub fn certification_score(certification: Option<&Certification>, as_of: DateTime<Utc>) -> f64 {
    CertificationStatus::evaluate(certification, as_of).score()
}

/// Lifetime inspection pass rate. `None` only under `EmptyComponentPolicy::Exclude`.
pub fn safety_documents_score(
    tally: InspectionTally,
    policy: EmptyComponentPolicy,
) -> Option<f64> {
    ratio_score(tally.passed as usize, tally.total as usize, policy)
}

pub fn quiz_score(passed: usize, available: usize, policy: EmptyComponentPolicy) -> Option<f64> {
    ratio_score(passed, available, policy)
}

/// Work history under the current link; 50 until the first session is logged.
pub fn work_history_score(incidents: usize, sessions: usize) -> f64 {
    if sessions == 0 {
        return WORK_HISTORY_FLOOR;
    }

    let penalty = INCIDENT_PENALTY * incidents as f64;
    (100.0 - penalty).max(WORK_HISTORY_FLOOR)
}

fn ratio_score(numerator: usize, denominator: usize, policy: EmptyComponentPolicy) -> Option<f64> {
    if denominator == 0 {
        return policy.resolve();
    }

    let bounded = numerator.min(denominator);
    Some(100.0 * bounded as f64 / denominator as f64)
}
