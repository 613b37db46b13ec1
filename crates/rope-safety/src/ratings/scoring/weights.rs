use serde::{Deserialize, Serialize};

use super::super::linkage::Linkage;
use super::super::snapshot::ComponentScores;

/// Weighting mode. Selected from employer linkage and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightScheme {
    Solo,
    Linked,
}

/// Integer percentage weights; each scheme sums to exactly 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComponentWeights {
    pub certification: u8,
    pub safety_docs: u8,
    pub quizzes: u8,
    pub work_history: u8,
}

impl ComponentWeights {
    pub const fn total(&self) -> u16 {
        self.certification as u16
            + self.safety_docs as u16
            + self.quizzes as u16
            + self.work_history as u16
    }
}

impl WeightScheme {
    pub fn for_linkage(linkage: &Linkage) -> Self {
        if linkage.is_active() {
            Self::Linked
        } else {
            Self::Solo
        }
    }

    pub const fn weights(self) -> ComponentWeights {
        match self {
            Self::Solo => ComponentWeights {
                certification: 33,
                safety_docs: 33,
                quizzes: 34,
                work_history: 0,
            },
            Self::Linked => ComponentWeights {
                certification: 25,
                safety_docs: 25,
                quizzes: 25,
                work_history: 25,
            },
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Solo => "solo",
            Self::Linked => "linked",
        }
    }
}

/// Weighted mean of the included components, clamped to 0..=100.
///
/// Components reported as `None` are left out and the remaining weights
/// renormalized. Work history never contributes in solo mode.
pub fn aggregate(scheme: WeightScheme, components: &ComponentScores) -> f64 {
    let weights = scheme.weights();
    let work_history = match scheme {
        WeightScheme::Solo => None,
        WeightScheme::Linked => components.work_history,
    };

    let weighted = [
        (weights.certification, Some(components.certification)),
        (weights.safety_docs, components.safety_docs),
        (weights.quizzes, components.quizzes),
        (weights.work_history, work_history),
    ];

    let (sum, weight_total) = weighted
        .iter()
        .filter_map(|(weight, score)| score.map(|score| (f64::from(*weight), score)))
        .fold((0.0, 0.0), |(sum, total), (weight, score)| {
            (sum + weight * score.clamp(0.0, 100.0), total + weight)
        });

    if weight_total == 0.0 {
        return 0.0;
    }

    (sum / weight_total).clamp(0.0, 100.0)
}
