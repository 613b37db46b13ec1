use metrics_exporter_prometheus::PrometheusHandle;
use rope_safety::ratings::{
    InMemorySnapshotStore, InMemoryTechnicianRepository, QuizCatalog, RatingPolicy,
    SafetyRatingService,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type MemoryRatingService =
    SafetyRatingService<InMemoryTechnicianRepository, InMemorySnapshotStore>;

/// Rating service over in-memory storage, starting from the standard quiz catalog.
pub(crate) fn build_rating_service(policy: RatingPolicy) -> MemoryRatingService {
    SafetyRatingService::new(
        Arc::new(InMemoryTechnicianRepository::default()),
        Arc::new(InMemorySnapshotStore::default()),
        policy,
        QuizCatalog::standard(),
    )
}
