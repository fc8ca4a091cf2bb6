use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use log::{debug, info};
use mongodb::bson::oid::ObjectId;

use crate::error_handling::types::StorageError;
use crate::storage::storage_trait::StudentStorage;
use crate::storage::types::{Student, StudentFilter, StudentUpdate, UpdateSummary};

/// In-process student backend.
///
/// Records are kept in insertion order, which is also the order "first match" follows.
/// Useful for tests and for running the CLI without a server.
#[derive(Default)]
pub struct MemoryStorage {
    students: Mutex<Vec<Student>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    fn records(&self) -> MutexGuard<'_, Vec<Student>> {
        // A panic while holding the lock cannot leave a half-written record behind.
        self.students.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn stored(student: &Student) -> (ObjectId, Student) {
        let id = ObjectId::new();
        let mut stored = student.clone();
        stored.id = Some(id);
        (id, stored)
    }
}

#[async_trait]
impl StudentStorage for MemoryStorage {
    async fn insert_student(&self, student: &Student) -> Result<ObjectId, StorageError> {
        let (id, stored) = Self::stored(student);
        self.records().push(stored);
        info!("Inserted student {:?} with id {}", student.name, id);
        Ok(id)
    }

    async fn insert_students(&self, batch: &[Student]) -> Result<Vec<ObjectId>, StorageError> {
        let mut records = self.records();
        let mut ids = Vec::with_capacity(batch.len());
        for student in batch {
            let (id, stored) = Self::stored(student);
            records.push(stored);
            ids.push(id);
        }
        info!("Inserted {} students", ids.len());
        Ok(ids)
    }

    async fn find_student(&self, filter: &StudentFilter) -> Result<Option<Student>, StorageError> {
        let found = self.records().iter().find(|s| filter.matches(s)).cloned();
        if found.is_none() {
            debug!("No student matches {:?}", filter);
        }
        Ok(found)
    }

    async fn list_students(&self, filter: &StudentFilter) -> Result<Vec<Student>, StorageError> {
        let found: Vec<Student> = self
            .records()
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        debug!("Listed {} students matching {:?}", found.len(), filter);
        Ok(found)
    }

    async fn update_student(
        &self,
        filter: &StudentFilter,
        update: &StudentUpdate,
    ) -> Result<UpdateSummary, StorageError> {
        if update.is_empty() {
            return Err(StorageError::EmptyUpdate);
        }
        let mut records = self.records();
        let summary = match records.iter_mut().find(|s| filter.matches(s)) {
            Some(student) => UpdateSummary {
                matched: 1,
                modified: u64::from(update.apply(student)),
            },
            None => UpdateSummary::default(),
        };
        info!(
            "Updated students: matched {}, modified {}",
            summary.matched, summary.modified
        );
        Ok(summary)
    }

    async fn delete_student(&self, filter: &StudentFilter) -> Result<u64, StorageError> {
        if filter.is_empty() {
            debug!("delete_student with an empty filter removes the first stored student");
        }
        let mut records = self.records();
        let deleted = match records.iter().position(|s| filter.matches(s)) {
            Some(index) => {
                records.remove(index);
                1
            }
            None => 0,
        };
        info!("Deleted students: {}", deleted);
        Ok(deleted)
    }
}
