use serde::{Deserialize, Serialize};

/// Discrete PSR band shown on dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SafetyTier {
    Low,
    Developing,
    Good,
    Excellent,
}

impl SafetyTier {
    /// Lower bounds are inclusive: 90 is Excellent, 89.99 is Good.
    pub fn classify(score: f64) -> Self {
        if score >= 90.0 {
            Self::Excellent
        } else if score >= 70.0 {
            Self::Good
        } else if score >= 50.0 {
            Self::Developing
        } else {
            Self::Low
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Developing => "Developing",
            Self::Low => "Low",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_closed_below() {
        let cases = [
            (100.0, SafetyTier::Excellent),
            (90.0, SafetyTier::Excellent),
            (89.99, SafetyTier::Good),
            (70.0, SafetyTier::Good),
            (69.99, SafetyTier::Developing),
            (50.0, SafetyTier::Developing),
            (49.99, SafetyTier::Low),
            (0.0, SafetyTier::Low),
        ];

        for (score, expected) in cases {
            assert_eq!(SafetyTier::classify(score), expected, "score {score}");
        }
    }
}
