//! Personal Safety Rating (PSR) engine and the Workforce Safety Score (WSS).
//!
//! Upstream producers feed [`RatingEvent`]s into the [`SafetyRatingService`],
//! which appends them to the technician's lifetime history and recomputes an
//! immutable [`PsrSnapshot`]: component calculators, then weight scheme
//! selection, aggregation and tier classification. The WSS is a read-only
//! mean over linked technicians and has no path back into company-owned
//! ratings.

pub mod domain;
pub mod events;
pub mod linkage;
pub mod memory;
pub mod quizzes;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod snapshot;
pub mod workforce;

#[cfg(test)]
mod tests;

pub use domain::{
    Certification, CertificationLevel, CompanyId, IncidentRecord, InspectionOutcome,
    InspectionRecord, InspectionTally, InvalidCertificationLevel, LinkId, QuizAttempt, QuizId,
    TechnicianId, TechnicianRecord, WorkSessionRecord,
};
pub use events::{RatingEvent, RatingEventError};
pub use linkage::{EmployerLink, Linkage, LinkageError, LinkageState};
pub use memory::{InMemorySnapshotStore, InMemoryTechnicianRepository};
pub use quizzes::{
    AcknowledgmentDocument, QuizAvailability, QuizAvailabilityResolver, QuizCatalog,
    QuizDefinition, QuizKind,
};
pub use repository::{RepositoryError, SnapshotStore, TechnicianRepository};
pub use router::rating_router;
pub use scoring::{
    EmptyComponentPolicy, RatingEngine, RatingPolicy, SafetyTier, UnknownPolicy, WeightScheme,
};
pub use service::{
    recompute_queue, run_retry_worker, RatingServiceError, RecomputeReceiver, RecomputeRequest,
    RecomputeSender, SafetyRatingService,
};
pub use snapshot::{ComponentScores, PsrSnapshot};
pub use workforce::WorkforceSafetyScore;
