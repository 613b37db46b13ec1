use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::ratings::domain::{
    Certification, CertificationLevel, CompanyId, InspectionOutcome, InspectionRecord,
    QuizAttempt, QuizId, TechnicianId, TechnicianRecord,
};
use crate::ratings::events::RatingEvent;
use crate::ratings::memory::{InMemorySnapshotStore, InMemoryTechnicianRepository};
use crate::ratings::quizzes::{AcknowledgmentDocument, QuizCatalog, QuizDefinition};
use crate::ratings::repository::{RepositoryError, SnapshotStore, TechnicianRepository};
use crate::ratings::scoring::RatingPolicy;
use crate::ratings::service::SafetyRatingService;
use crate::ratings::snapshot::PsrSnapshot;

pub(super) type MemoryService =
    SafetyRatingService<InMemoryTechnicianRepository, InMemorySnapshotStore>;

pub(super) fn tech(id: &str) -> TechnicianId {
    TechnicianId(id.to_string())
}

pub(super) fn acme() -> CompanyId {
    CompanyId("acme-rope".to_string())
}

pub(super) fn globex() -> CompanyId {
    CompanyId("globex-access".to_string())
}

pub(super) fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(days)
}

/// Standard catalog plus two acknowledgment quizzes published by acme.
pub(super) fn catalog_with_acme_documents() -> QuizCatalog {
    let mut catalog = QuizCatalog::standard();
    catalog.publish(QuizDefinition::employer_document(
        acme(),
        AcknowledgmentDocument::HealthAndSafetyManual,
    ));
    catalog.publish(QuizDefinition::employer_document(
        acme(),
        AcknowledgmentDocument::SafeWorkProcedures,
    ));
    catalog
}

pub(super) fn acme_manual_quiz() -> QuizId {
    QuizDefinition::employer_document(acme(), AcknowledgmentDocument::HealthAndSafetyManual)
        .quiz_id
}

pub(super) fn build_service() -> (
    Arc<MemoryService>,
    Arc<InMemoryTechnicianRepository>,
    Arc<InMemorySnapshotStore>,
) {
    build_service_with(RatingPolicy::default(), catalog_with_acme_documents())
}

pub(super) fn build_service_with(
    policy: RatingPolicy,
    catalog: QuizCatalog,
) -> (
    Arc<MemoryService>,
    Arc<InMemoryTechnicianRepository>,
    Arc<InMemorySnapshotStore>,
) {
    let repository = Arc::new(InMemoryTechnicianRepository::default());
    let snapshots = Arc::new(InMemorySnapshotStore::default());
    let service = Arc::new(SafetyRatingService::new(
        repository.clone(),
        snapshots.clone(),
        policy,
        catalog,
    ));
    (service, repository, snapshots)
}

pub(super) fn verified_certification(level: CertificationLevel) -> RatingEvent {
    RatingEvent::CertificationRecorded(Certification {
        level,
        verified: true,
        issued_at: days_ago(200),
        expires_at: Some(Utc::now() + Duration::days(365)),
    })
}

pub(super) fn inspections(passed: usize, failed: usize, company: CompanyId) -> Vec<RatingEvent> {
    let outcomes = std::iter::repeat(InspectionOutcome::Passed)
        .take(passed)
        .chain(std::iter::repeat(InspectionOutcome::Failed).take(failed));

    outcomes
        .enumerate()
        .map(|(index, outcome)| {
            RatingEvent::InspectionLogged(InspectionRecord {
                outcome,
                inspected_at: days_ago(100 - index as i64),
                issuing_company: company.clone(),
            })
        })
        .collect()
}

pub(super) fn quiz(id: &str, passed: bool) -> RatingEvent {
    quiz_attempt(QuizId(id.to_string()), passed)
}

pub(super) fn quiz_attempt(quiz_id: QuizId, passed: bool) -> RatingEvent {
    RatingEvent::QuizAttempted(QuizAttempt {
        quiz_id,
        passed,
        attempted_at: Utc::now(),
    })
}

pub(super) fn link(company: CompanyId) -> RatingEvent {
    RatingEvent::Linked {
        company_id: company,
        at: days_ago(30),
    }
}

pub(super) fn work_session() -> RatingEvent {
    RatingEvent::WorkSessionLogged {
        started_at: days_ago(10),
    }
}

pub(super) fn incident() -> RatingEvent {
    RatingEvent::IncidentReported {
        occurred_at: days_ago(5),
    }
}

/// Register `id` and apply `events` in order, returning the final snapshot.
pub(super) fn rated<R, S>(
    service: &SafetyRatingService<R, S>,
    id: &TechnicianId,
    events: Vec<RatingEvent>,
) -> PsrSnapshot
where
    R: TechnicianRepository + 'static,
    S: SnapshotStore + 'static,
{
    let mut snapshot = service
        .register_technician(id.clone())
        .expect("technician registers");
    for event in events {
        snapshot = service.apply(id, event).expect("event applies");
    }
    snapshot
}

/// Scenario A: L2 verified certification, 8/10 inspections, 3/4 certification quizzes.
pub(super) fn scenario_a_events() -> Vec<RatingEvent> {
    let mut events = vec![verified_certification(CertificationLevel::Level2)];
    events.extend(inspections(8, 2, globex()));
    events.push(quiz("l1-harness-inspection", true));
    events.push(quiz("l1-rope-systems", true));
    events.push(quiz("l2-rescue-techniques", true));
    events.push(quiz("l2-rigging-anchors", false));
    events
}

/// Scenario B: scenario A, then linked to acme with one of its two document quizzes passed,
/// one logged work session and one incident.
pub(super) fn scenario_b_events() -> Vec<RatingEvent> {
    let mut events = scenario_a_events();
    events.push(link(acme()));
    events.push(quiz_attempt(acme_manual_quiz(), true));
    events.push(work_session());
    events.push(incident());
    events
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 0.01,
        "expected {expected}, got {actual}"
    );
}

/// Snapshot store that fails a configurable number of writes.
#[derive(Default)]
pub(super) struct FlakySnapshotStore {
    inner: InMemorySnapshotStore,
    failures_remaining: AtomicUsize,
}

impl FlakySnapshotStore {
    pub(super) fn fail_next(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }
}

impl SnapshotStore for FlakySnapshotStore {
    fn latest(&self, id: &TechnicianId) -> Result<Option<PsrSnapshot>, RepositoryError> {
        self.inner.latest(id)
    }

    fn store(&self, snapshot: PsrSnapshot) -> Result<(), RepositoryError> {
        let failing = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok();
        if failing {
            return Err(RepositoryError::Unavailable(
                "snapshot store offline".to_string(),
            ));
        }
        self.inner.store(snapshot)
    }
}

/// Repository whose every call reports the backend as unavailable.
pub(super) struct UnavailableRepository;

impl TechnicianRepository for UnavailableRepository {
    fn insert(&self, _record: TechnicianRecord) -> Result<TechnicianRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn update(&self, _record: TechnicianRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn fetch(&self, _id: &TechnicianId) -> Result<Option<TechnicianRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn linked_to(&self, _company: &CompanyId) -> Result<Vec<TechnicianId>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn technician_ids(&self) -> Result<Vec<TechnicianId>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }
}
