mod components;
mod config;
mod tier;
mod weights;

pub use components::{
    certification_score, quiz_score, safety_documents_score, work_history_score,
    CertificationStatus,
};
pub use config::{EmptyComponentPolicy, RatingPolicy, UnknownPolicy, NEUTRAL_COMPONENT_SCORE};
pub use tier::SafetyTier;
pub use weights::{aggregate, ComponentWeights, WeightScheme};

use chrono::{DateTime, Utc};

use super::domain::TechnicianRecord;
use super::quizzes::{QuizAvailabilityResolver, QuizCatalog};
use super::snapshot::{ComponentScores, PsrSnapshot};

/// Stateless calculator turning a technician record into a PSR snapshot.
///
/// The only shared state is the quiz availability cache, which is keyed by
/// every input it depends on.
pub struct RatingEngine {
    policy: RatingPolicy,
    quizzes: QuizAvailabilityResolver,
}

impl RatingEngine {
    pub fn new(policy: RatingPolicy) -> Self {
        Self {
            policy,
            quizzes: QuizAvailabilityResolver::default(),
        }
    }

    pub fn policy(&self) -> RatingPolicy {
        self.policy
    }

    pub fn quiz_resolver(&self) -> &QuizAvailabilityResolver {
        &self.quizzes
    }

    pub fn components(
        &self,
        record: &TechnicianRecord,
        catalog: &QuizCatalog,
        as_of: DateTime<Utc>,
    ) -> ComponentScores {
        let certification = certification_score(record.primary_certification(), as_of);
        let safety_docs =
            safety_documents_score(record.inspection_tally(), self.policy.empty_inspections);

        let available = self.quizzes.for_technician(catalog, record);
        let quizzes = quiz_score(
            available.passed_by(record),
            available.count(),
            self.policy.empty_quizzes,
        );

        let work_history = record.linkage().active_link().map(|link| {
            work_history_score(
                record.incidents_under(&link.link_id),
                record.work_sessions_under(&link.link_id),
            )
        });

        ComponentScores {
            certification,
            safety_docs,
            quizzes,
            work_history,
        }
    }

    pub fn rate(
        &self,
        record: &TechnicianRecord,
        catalog: &QuizCatalog,
        as_of: DateTime<Utc>,
        revision: u64,
    ) -> PsrSnapshot {
        let scheme = WeightScheme::for_linkage(record.linkage());
        let components = self.components(record, catalog, as_of);
        let score = aggregate(scheme, &components);

        let valid_until = record
            .primary_certification()
            .and_then(|cert| cert.expires_at)
            .filter(|expires_at| *expires_at > as_of);

        PsrSnapshot {
            technician_id: record.technician_id().clone(),
            score,
            tier: SafetyTier::classify(score),
            scheme,
            components,
            computed_at: as_of,
            revision,
            valid_until,
        }
    }
}
