use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sub-score used when the denominator of a ratio component is zero.
pub const NEUTRAL_COMPONENT_SCORE: f64 = 50.0;

/// How a ratio component behaves when there is nothing to divide by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyComponentPolicy {
    /// No records means no credit.
    #[default]
    Zero,
    /// Score the component at the neutral midpoint.
    Neutral,
    /// Drop the component and renormalize the remaining weights.
    Exclude,
}

impl EmptyComponentPolicy {
    pub(crate) fn resolve(self) -> Option<f64> {
        match self {
            Self::Zero => Some(0.0),
            Self::Neutral => Some(NEUTRAL_COMPONENT_SCORE),
            Self::Exclude => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::Neutral => "neutral",
            Self::Exclude => "exclude",
        }
    }
}

impl fmt::Display for EmptyComponentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown empty-component policy '{0}' (expected zero, neutral or exclude)")]
pub struct UnknownPolicy(pub String);

impl FromStr for EmptyComponentPolicy {
    type Err = UnknownPolicy;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "zero" => Ok(Self::Zero),
            "neutral" | "midpoint" => Ok(Self::Neutral),
            "exclude" | "renormalize" => Ok(Self::Exclude),
            _ => Err(UnknownPolicy(value.to_string())),
        }
    }
}

/// Rating policy dials loaded from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingPolicy {
    pub empty_inspections: EmptyComponentPolicy,
    pub empty_quizzes: EmptyComponentPolicy,
}
