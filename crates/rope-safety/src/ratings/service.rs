use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::domain::{CompanyId, QuizId, TechnicianId, TechnicianRecord};
use super::events::{RatingEvent, RatingEventError};
use super::quizzes::{QuizCatalog, QuizDefinition, QuizKind};
use super::repository::{RepositoryError, SnapshotStore, TechnicianRepository};
use super::scoring::{RatingEngine, RatingPolicy};
use super::snapshot::PsrSnapshot;
use super::workforce::WorkforceSafetyScore;

/// Retries after this many failed attempts are dropped with a warning.
pub const MAX_RECOMPUTE_ATTEMPTS: u32 = 5;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

/// A technician whose snapshot could not be stored and needs another pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecomputeRequest {
    pub technician_id: TechnicianId,
    pub attempt: u32,
}

pub type RecomputeSender = mpsc::UnboundedSender<RecomputeRequest>;
pub type RecomputeReceiver = mpsc::UnboundedReceiver<RecomputeRequest>;

pub fn recompute_queue() -> (RecomputeSender, RecomputeReceiver) {
    mpsc::unbounded_channel()
}

/// One mutex per technician; recomputes for different technicians never contend.
#[derive(Default)]
struct TechnicianLocks {
    locks: Mutex<HashMap<TechnicianId, Arc<Mutex<()>>>>,
}

impl TechnicianLocks {
    fn for_technician(&self, id: &TechnicianId) -> Arc<Mutex<()>> {
        let mut guard = self.locks.lock().expect("lock table mutex poisoned");
        guard.entry(id.clone()).or_default().clone()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().expect("lock table mutex poisoned").len()
    }
}

/// Service composing the technician repository, snapshot cache, and rating engine.
///
/// Every mutating event runs fetch, apply, persist and recompute while
/// holding that technician's lock, so two events for the same technician
/// cannot produce a snapshot that reflects only one of them.
pub struct SafetyRatingService<R, S> {
    repository: Arc<R>,
    snapshots: Arc<S>,
    engine: RatingEngine,
    catalog: RwLock<QuizCatalog>,
    locks: TechnicianLocks,
    retries: Option<RecomputeSender>,
}

impl<R, S> SafetyRatingService<R, S>
where
    R: TechnicianRepository + 'static,
    S: SnapshotStore + 'static,
{
    pub fn new(
        repository: Arc<R>,
        snapshots: Arc<S>,
        policy: RatingPolicy,
        catalog: QuizCatalog,
    ) -> Self {
        Self {
            repository,
            snapshots,
            engine: RatingEngine::new(policy),
            catalog: RwLock::new(catalog),
            locks: TechnicianLocks::default(),
            retries: None,
        }
    }

    /// Route failed recomputes to a queue drained by [`run_retry_worker`].
    pub fn with_retry_queue(mut self, sender: RecomputeSender) -> Self {
        self.retries = Some(sender);
        self
    }

    pub fn policy(&self) -> RatingPolicy {
        self.engine.policy()
    }

    pub fn catalog(&self) -> QuizCatalog {
        self.catalog.read().expect("catalog lock poisoned").clone()
    }

    /// Create an empty history for a new technician and rate it.
    pub fn register_technician(
        &self,
        technician_id: TechnicianId,
    ) -> Result<PsrSnapshot, RatingServiceError> {
        let lock = self.locks.for_technician(&technician_id);
        let _guard = lock.lock().expect("technician lock poisoned");

        let record = self
            .repository
            .insert(TechnicianRecord::new(technician_id))?;
        info!(technician_id = %record.technician_id(), "technician registered");
        Ok(self.refresh(&record))
    }

    /// Record an upstream event and recompute the technician's PSR.
    ///
    /// If the new snapshot cannot be stored, the freshly computed value is
    /// still returned, readers keep the previous snapshot, and a retry is
    /// queued.
    pub fn apply(
        &self,
        technician_id: &TechnicianId,
        event: RatingEvent,
    ) -> Result<PsrSnapshot, RatingServiceError> {
        let label = event.label();
        let lock = self.registered_lock(technician_id)?;
        let _guard = lock.lock().expect("technician lock poisoned");

        let mut record = self.fetch_record(technician_id)?;
        event.apply(&mut record)?;
        self.repository.update(record.clone())?;
        debug!(technician_id = %technician_id, event = label, "rating event recorded");

        Ok(self.refresh(&record))
    }

    /// Recompute and store a snapshot from current history, propagating failures.
    pub fn recompute(
        &self,
        technician_id: &TechnicianId,
    ) -> Result<PsrSnapshot, RatingServiceError> {
        let lock = self.registered_lock(technician_id)?;
        let _guard = lock.lock().expect("technician lock poisoned");

        let record = self.fetch_record(technician_id)?;
        Ok(self.recompute_locked(&record)?)
    }

    /// The cached snapshot while it is current, otherwise a recompute. A
    /// failed recompute serves the last valid snapshot instead of failing
    /// the read.
    pub fn personal_safety_rating(
        &self,
        technician_id: &TechnicianId,
    ) -> Result<PsrSnapshot, RatingServiceError> {
        let cached = match self.snapshots.latest(technician_id) {
            Ok(cached) => cached,
            Err(err) => {
                warn!(technician_id = %technician_id, error = %err, "snapshot lookup failed");
                None
            }
        };

        if let Some(snapshot) = &cached {
            if snapshot.is_current(Utc::now()) {
                return Ok(snapshot.clone());
            }
        }

        match (self.recompute(technician_id), cached) {
            (Ok(snapshot), _) => Ok(snapshot),
            (Err(err), Some(stale)) => {
                warn!(
                    technician_id = %technician_id,
                    revision = stale.revision,
                    error = %err,
                    "psr recompute failed; serving last valid snapshot"
                );
                self.schedule_retry(technician_id.clone(), 1);
                Ok(stale)
            }
            (Err(err), None) => Err(err),
        }
    }

    /// Mean PSR over the technicians linked to `company_id` at query time.
    /// Read-only.
    pub fn workforce_safety_score(
        &self,
        company_id: &CompanyId,
    ) -> Result<WorkforceSafetyScore, RatingServiceError> {
        let linked = self.repository.linked_to(company_id)?;
        let ratings = linked
            .iter()
            .map(|id| self.personal_safety_rating(id).map(|snapshot| snapshot.score))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(WorkforceSafetyScore::from_ratings(
            company_id.clone(),
            ratings,
        ))
    }

    /// Publish a quiz and recompute every technician whose denominator it touches.
    ///
    /// The catalog changes before the audience is read, so a technician who
    /// links concurrently is either listed here or already rated against the
    /// new revision.
    pub fn publish_quiz(
        &self,
        definition: QuizDefinition,
    ) -> Result<Vec<TechnicianId>, RatingServiceError> {
        let kind = definition.kind.clone();
        let quiz_id = definition.quiz_id.clone();
        self.catalog
            .write()
            .expect("catalog lock poisoned")
            .publish(definition);

        let affected = self.audience(&kind)?;
        info!(quiz_id = %quiz_id.0, affected = affected.len(), "quiz published");
        self.recompute_all(&affected);
        Ok(affected)
    }

    pub fn withdraw_quiz(
        &self,
        quiz_id: &QuizId,
    ) -> Result<Vec<TechnicianId>, RatingServiceError> {
        let withdrawn = self
            .catalog
            .write()
            .expect("catalog lock poisoned")
            .withdraw(quiz_id);
        let Some(definition) = withdrawn else {
            return Ok(Vec::new());
        };

        let affected = self.audience(&definition.kind)?;
        info!(quiz_id = %quiz_id.0, affected = affected.len(), "quiz withdrawn");
        self.recompute_all(&affected);
        Ok(affected)
    }

    fn audience(&self, kind: &QuizKind) -> Result<Vec<TechnicianId>, RatingServiceError> {
        let ids = match kind {
            QuizKind::Certification { .. } => self.repository.technician_ids()?,
            QuizKind::EmployerDocument { company_id, .. } => {
                self.repository.linked_to(company_id)?
            }
        };
        Ok(ids)
    }

    fn recompute_all(&self, technicians: &[TechnicianId]) {
        for technician_id in technicians {
            if let Err(err) = self.recompute(technician_id) {
                warn!(technician_id = %technician_id, error = %err, "psr recompute failed");
                self.schedule_retry(technician_id.clone(), 1);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn tracked_technicians(&self) -> usize {
        self.locks.len()
    }

    /// Lock for a technician the repository knows; unknown ids never enter the table.
    fn registered_lock(
        &self,
        technician_id: &TechnicianId,
    ) -> Result<Arc<Mutex<()>>, RatingServiceError> {
        self.fetch_record(technician_id)?;
        Ok(self.locks.for_technician(technician_id))
    }

    fn fetch_record(
        &self,
        technician_id: &TechnicianId,
    ) -> Result<TechnicianRecord, RatingServiceError> {
        self.repository
            .fetch(technician_id)?
            .ok_or_else(|| RatingServiceError::TechnicianNotFound(technician_id.clone()))
    }

    /// Caller must hold the technician's lock.
    fn recompute_locked(&self, record: &TechnicianRecord) -> Result<PsrSnapshot, RepositoryError> {
        let revision = self
            .snapshots
            .latest(record.technician_id())?
            .map_or(1, |previous| previous.revision + 1);

        let snapshot = {
            let catalog = self.catalog.read().expect("catalog lock poisoned");
            self.engine.rate(record, &catalog, Utc::now(), revision)
        };

        self.snapshots.store(snapshot.clone())?;
        debug!(
            technician_id = %snapshot.technician_id,
            score = snapshot.score,
            tier = snapshot.tier.label(),
            scheme = snapshot.scheme.label(),
            revision = snapshot.revision,
            "psr recomputed"
        );
        Ok(snapshot)
    }

    /// Caller must hold the technician's lock.
    fn refresh(&self, record: &TechnicianRecord) -> PsrSnapshot {
        match self.recompute_locked(record) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(
                    technician_id = %record.technician_id(),
                    error = %err,
                    "storing psr snapshot failed; queued for retry"
                );
                self.schedule_retry(record.technician_id().clone(), 1);
                let catalog = self.catalog.read().expect("catalog lock poisoned");
                self.engine.rate(record, &catalog, Utc::now(), 0)
            }
        }
    }

    fn schedule_retry(&self, technician_id: TechnicianId, attempt: u32) {
        if attempt > MAX_RECOMPUTE_ATTEMPTS {
            warn!(technician_id = %technician_id, attempt, "giving up on psr recompute");
            return;
        }

        let Some(sender) = &self.retries else {
            warn!(technician_id = %technician_id, "no recompute queue configured; retry skipped");
            return;
        };

        let request = RecomputeRequest {
            technician_id,
            attempt,
        };
        if let Err(err) = sender.send(request) {
            warn!(technician_id = %err.0.technician_id, "recompute queue closed");
        }
    }
}

/// Drain the recompute queue, backing off exponentially between attempts.
pub async fn run_retry_worker<R, S>(
    service: Arc<SafetyRatingService<R, S>>,
    mut receiver: RecomputeReceiver,
) where
    R: TechnicianRepository + 'static,
    S: SnapshotStore + 'static,
{
    while let Some(request) = receiver.recv().await {
        let backoff = RETRY_BASE_DELAY * 2u32.saturating_pow(request.attempt.saturating_sub(1));
        tokio::time::sleep(backoff).await;

        match service.recompute(&request.technician_id) {
            Ok(snapshot) => info!(
                technician_id = %request.technician_id,
                attempt = request.attempt,
                revision = snapshot.revision,
                "psr recompute retry succeeded"
            ),
            Err(err) => {
                warn!(
                    technician_id = %request.technician_id,
                    attempt = request.attempt,
                    error = %err,
                    "psr recompute retry failed"
                );
                service.schedule_retry(request.technician_id, request.attempt + 1);
            }
        }
    }
}

/// Error raised by the rating service.
#[derive(Debug, thiserror::Error)]
pub enum RatingServiceError {
    #[error("technician {0} not found")]
    TechnicianNotFound(TechnicianId),
    #[error(transparent)]
    Event(#[from] RatingEventError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
