use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::domain::{CompanyId, TechnicianId, TechnicianRecord};
use super::repository::{RepositoryError, SnapshotStore, TechnicianRepository};
use super::snapshot::PsrSnapshot;

/// Process-local technician store used by the service binary and tests.
#[derive(Default, Clone)]
pub struct InMemoryTechnicianRepository {
    records: Arc<Mutex<HashMap<TechnicianId, TechnicianRecord>>>,
}

impl TechnicianRepository for InMemoryTechnicianRepository {
    fn insert(&self, record: TechnicianRecord) -> Result<TechnicianRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(record.technician_id()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.technician_id().clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: TechnicianRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(record.technician_id()) {
            guard.insert(record.technician_id().clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &TechnicianId) -> Result<Option<TechnicianRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn linked_to(&self, company: &CompanyId) -> Result<Vec<TechnicianId>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut ids: Vec<_> = guard
            .values()
            .filter(|record| record.linkage().company() == Some(company))
            .map(|record| record.technician_id().clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn technician_ids(&self) -> Result<Vec<TechnicianId>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut ids: Vec<_> = guard.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[derive(Default, Clone)]
pub struct InMemorySnapshotStore {
    snapshots: Arc<Mutex<HashMap<TechnicianId, PsrSnapshot>>>,
}

impl SnapshotStore for InMemorySnapshotStore {
    fn latest(&self, id: &TechnicianId) -> Result<Option<PsrSnapshot>, RepositoryError> {
        let guard = self.snapshots.lock().expect("snapshot mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn store(&self, snapshot: PsrSnapshot) -> Result<(), RepositoryError> {
        let mut guard = self.snapshots.lock().expect("snapshot mutex poisoned");
        guard.insert(snapshot.technician_id.clone(), snapshot);
        Ok(())
    }
}
