//! Quiz catalog and the per-technician availability resolver.
//!
//! The quiz sub-score denominator depends on the technician's certification
//! level and on the employer they are linked to. Availability is memoized
//! under a key containing both inputs and the catalog revision, so a change
//! to any of them resolves a fresh set instead of reusing a stale count.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::domain::{CertificationLevel, CompanyId, QuizId, TechnicianRecord};

/// Employer documents a linked technician must acknowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcknowledgmentDocument {
    HealthAndSafetyManual,
    CompanyPolicy,
    SafeWorkProcedures,
    SafeWorkPractices,
}

impl AcknowledgmentDocument {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::HealthAndSafetyManual,
            Self::CompanyPolicy,
            Self::SafeWorkProcedures,
            Self::SafeWorkPractices,
        ]
    }

    pub const fn slug(self) -> &'static str {
        match self {
            Self::HealthAndSafetyManual => "health-safety-manual",
            Self::CompanyPolicy => "company-policy",
            Self::SafeWorkProcedures => "safe-work-procedures",
            Self::SafeWorkPractices => "safe-work-practices",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuizKind {
    Certification {
        minimum_level: CertificationLevel,
    },
    EmployerDocument {
        company_id: CompanyId,
        document: AcknowledgmentDocument,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDefinition {
    pub quiz_id: QuizId,
    pub title: String,
    pub kind: QuizKind,
}

impl QuizDefinition {
    pub fn employer_document(company_id: CompanyId, document: AcknowledgmentDocument) -> Self {
        Self {
            quiz_id: QuizId(format!("{}:{}", company_id.0, document.slug())),
            title: format!("{} acknowledgment", document.slug().replace('-', " ")),
            kind: QuizKind::EmployerDocument {
                company_id,
                document,
            },
        }
    }
}

/// Published quizzes. Every change bumps `revision`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizCatalog {
    revision: u64,
    quizzes: BTreeMap<QuizId, QuizDefinition>,
}

impl QuizCatalog {
    /// Two certification quizzes per level, giving 2/4/6 available at levels 1/2/3.
    pub fn standard() -> Self {
        const TOPICS: [(&str, &str); 6] = [
            ("l1-harness-inspection", "Harness and PPE inspection"),
            ("l1-rope-systems", "Rope systems fundamentals"),
            ("l2-rescue-techniques", "Rescue techniques"),
            ("l2-rigging-anchors", "Rigging and anchor selection"),
            ("l3-supervision", "Rope-access supervision"),
            ("l3-rescue-planning", "Rescue planning and hazard control"),
        ];

        let mut catalog = Self::default();
        for (index, (id, title)) in TOPICS.iter().enumerate() {
            let minimum_level = CertificationLevel::ordered()[index / 2];
            catalog.publish(QuizDefinition {
                quiz_id: QuizId((*id).to_string()),
                title: (*title).to_string(),
                kind: QuizKind::Certification { minimum_level },
            });
        }
        catalog
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.quizzes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quizzes.is_empty()
    }

    pub fn get(&self, quiz_id: &QuizId) -> Option<&QuizDefinition> {
        self.quizzes.get(quiz_id)
    }

    /// Publish or replace a quiz definition.
    pub fn publish(&mut self, definition: QuizDefinition) {
        self.quizzes.insert(definition.quiz_id.clone(), definition);
        self.revision += 1;
    }

    pub fn withdraw(&mut self, quiz_id: &QuizId) -> Option<QuizDefinition> {
        let removed = self.quizzes.remove(quiz_id);
        if removed.is_some() {
            self.revision += 1;
        }
        removed
    }

    fn available_to(
        &self,
        level: Option<CertificationLevel>,
        company: Option<&CompanyId>,
    ) -> QuizAvailability {
        let quizzes = self
            .quizzes
            .values()
            .filter(|quiz| match &quiz.kind {
                QuizKind::Certification { minimum_level } => {
                    level.map_or(false, |level| level >= *minimum_level)
                }
                QuizKind::EmployerDocument { company_id, .. } => company == Some(company_id),
            })
            .map(|quiz| quiz.quiz_id.clone())
            .collect();

        QuizAvailability { quizzes }
    }
}

/// Quizzes counted in one technician's quiz denominator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizAvailability {
    quizzes: BTreeSet<QuizId>,
}

impl QuizAvailability {
    pub fn count(&self) -> usize {
        self.quizzes.len()
    }

    pub fn contains(&self, quiz_id: &QuizId) -> bool {
        self.quizzes.contains(quiz_id)
    }

    /// Passed attempts on quizzes in this set; attempts on anything else
    /// (a former employer's documents, say) stay in history but do not count.
    pub fn passed_by(&self, record: &TechnicianRecord) -> usize {
        record
            .quiz_attempts()
            .filter(|attempt| attempt.passed && self.contains(&attempt.quiz_id))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AvailabilityKey {
    level: Option<CertificationLevel>,
    company: Option<CompanyId>,
    catalog_revision: u64,
}

/// Memoizing resolver for quiz denominators.
#[derive(Debug, Default)]
pub struct QuizAvailabilityResolver {
    cache: Mutex<HashMap<AvailabilityKey, Arc<QuizAvailability>>>,
}

impl QuizAvailabilityResolver {
    pub fn resolve(
        &self,
        catalog: &QuizCatalog,
        level: Option<CertificationLevel>,
        company: Option<&CompanyId>,
    ) -> Arc<QuizAvailability> {
        let key = AvailabilityKey {
            level,
            company: company.cloned(),
            catalog_revision: catalog.revision(),
        };

        let mut cache = self.cache.lock().expect("quiz cache mutex poisoned");
        if let Some(hit) = cache.get(&key) {
            return hit.clone();
        }

        // entries for older catalog revisions can never be hit again
        cache.retain(|existing, _| existing.catalog_revision == key.catalog_revision);
        let resolved = Arc::new(catalog.available_to(level, company));
        cache.insert(key, resolved.clone());
        resolved
    }

    pub fn for_technician(
        &self,
        catalog: &QuizCatalog,
        record: &TechnicianRecord,
    ) -> Arc<QuizAvailability> {
        let level = record.primary_certification().map(|cert| cert.level);
        self.resolve(catalog, level, record.linkage().company())
    }

    pub fn invalidate(&self) {
        self.cache.lock().expect("quiz cache mutex poisoned").clear();
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.lock().expect("quiz cache mutex poisoned").len()
    }
}
