//! Student Storage Trait
//!
//! This module defines the `StudentStorage` trait, which provides an interface for student
//! storage backends.
//!
//! Implementors of this trait are responsible for:
//! - Persisting caller-supplied student records
//! - Looking records up by filter
//! - Applying partial updates and deletions
//!
//! All methods return a `Result`; a missing record is reported through `None` or a zero
//! count, never through an error.

use crate::error_handling::types::StorageError;
use crate::storage::types::{Student, StudentFilter, StudentUpdate, UpdateSummary};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

#[async_trait]
pub trait StudentStorage: Send + Sync {
    /// Inserts one student and returns the identifier assigned by the store.
    async fn insert_student(&self, student: &Student) -> Result<ObjectId, StorageError>;

    /// Inserts several students, returning their identifiers in input order.
    async fn insert_students(&self, students: &[Student]) -> Result<Vec<ObjectId>, StorageError>;

    /// Returns the first student matching `filter`, or `None`.
    async fn find_student(&self, filter: &StudentFilter) -> Result<Option<Student>, StorageError>;

    /// Returns every student matching `filter`.
    async fn list_students(&self, filter: &StudentFilter) -> Result<Vec<Student>, StorageError>;

    /// Applies `update` to the first student matching `filter`.
    async fn update_student(
        &self,
        filter: &StudentFilter,
        update: &StudentUpdate,
    ) -> Result<UpdateSummary, StorageError>;

    /// Deletes the first student matching `filter` and returns how many were removed.
    async fn delete_student(&self, filter: &StudentFilter) -> Result<u64, StorageError>;
}
