use super::domain::{CompanyId, TechnicianId, TechnicianRecord};
use super::snapshot::PsrSnapshot;

/// Storage for technician history, so the service can run against any backend.
pub trait TechnicianRepository: Send + Sync {
    fn insert(&self, record: TechnicianRecord) -> Result<TechnicianRecord, RepositoryError>;
    fn update(&self, record: TechnicianRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &TechnicianId) -> Result<Option<TechnicianRecord>, RepositoryError>;
    /// Technicians holding an active link to `company` right now.
    fn linked_to(&self, company: &CompanyId) -> Result<Vec<TechnicianId>, RepositoryError>;
    fn technician_ids(&self) -> Result<Vec<TechnicianId>, RepositoryError>;
}

/// Cache of the latest valid PSR snapshot per technician.
pub trait SnapshotStore: Send + Sync {
    fn latest(&self, id: &TechnicianId) -> Result<Option<PsrSnapshot>, RepositoryError>;
    fn store(&self, snapshot: PsrSnapshot) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
