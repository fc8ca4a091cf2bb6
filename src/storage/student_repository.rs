use async_trait::async_trait;
use futures::TryStreamExt;
use log::{debug, info};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::Bson;

use crate::error_handling::types::StorageError;
use crate::storage::connection::MongoConnection;
use crate::storage::storage_trait::StudentStorage;
use crate::storage::types::{Student, StudentFilter, StudentUpdate, UpdateSummary};

/// MongoDB-backed student repository.
///
/// Holds no state of its own: every call resolves the collection from the borrowed
/// connection and runs under that connection's per-call deadline.
pub struct StudentRepository<'a> {
    connection: &'a MongoConnection,
}

impl<'a> StudentRepository<'a> {
    pub fn new(connection: &'a MongoConnection) -> Self {
        Self { connection }
    }

    /// Reserved: a per-student summary read has no defined shape yet, so this only
    /// checks the connection.
    pub async fn summary(&self) -> Result<(), StorageError> {
        self.connection.ensure_connected()?;
        debug!("student summary is reserved and performs no store operation");
        Ok(())
    }
}

#[async_trait]
impl<'a> StudentStorage for StudentRepository<'a> {
    async fn insert_student(&self, student: &Student) -> Result<ObjectId, StorageError> {
        let students = self.connection.students()?;
        let result = self
            .connection
            .run("insert_student", students.insert_one(student))
            .await?;
        let id = result
            .inserted_id
            .as_object_id()
            .ok_or(StorageError::UnexpectedId("insert_student"))?;
        info!("Inserted student {:?} with id {}", student.name, id);
        Ok(id)
    }

    async fn insert_students(&self, batch: &[Student]) -> Result<Vec<ObjectId>, StorageError> {
        let students = self.connection.students()?;
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let result = self
            .connection
            .run("insert_students", students.insert_many(batch))
            .await?;
        let mut ids = Vec::with_capacity(batch.len());
        for index in 0..batch.len() {
            let id = result
                .inserted_ids
                .get(&index)
                .and_then(Bson::as_object_id)
                .ok_or(StorageError::UnexpectedId("insert_students"))?;
            ids.push(id);
        }
        info!("Inserted {} students", ids.len());
        Ok(ids)
    }

    async fn find_student(&self, filter: &StudentFilter) -> Result<Option<Student>, StorageError> {
        let students = self.connection.students()?;
        let found = self
            .connection
            .run("find_student", students.find_one(filter.to_document()))
            .await?;
        if found.is_none() {
            debug!("No student matches {:?}", filter);
        }
        Ok(found)
    }

    async fn list_students(&self, filter: &StudentFilter) -> Result<Vec<Student>, StorageError> {
        let students = self.connection.students()?;
        let query = filter.to_document();
        let found = self
            .connection
            .run("list_students", async move {
                let cursor = students.find(query).await?;
                cursor.try_collect::<Vec<Student>>().await
            })
            .await?;
        debug!("Listed {} students matching {:?}", found.len(), filter);
        Ok(found)
    }

    async fn update_student(
        &self,
        filter: &StudentFilter,
        update: &StudentUpdate,
    ) -> Result<UpdateSummary, StorageError> {
        let students = self.connection.students()?;
        if update.is_empty() {
            return Err(StorageError::EmptyUpdate);
        }
        let result = self
            .connection
            .run(
                "update_student",
                students.update_one(filter.to_document(), update.to_document()),
            )
            .await?;
        info!(
            "Updated students: matched {}, modified {}",
            result.matched_count, result.modified_count
        );
        Ok(UpdateSummary {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete_student(&self, filter: &StudentFilter) -> Result<u64, StorageError> {
        if filter.is_empty() {
            debug!("delete_student with an empty filter removes the first stored student");
        }
        let students = self.connection.students()?;
        let result = self
            .connection
            .run("delete_student", students.delete_one(filter.to_document()))
            .await?;
        info!("Deleted students: {}", result.deleted_count);
        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::config::{StorageConfig, DEFAULT_URI};
    use crate::storage::student_filter::{by_name, set_age};
    use serial_test::serial;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_unconnected_repository_reports_not_connected() {
        let connection = MongoConnection::default();
        let repository = StudentRepository::new(&connection);
        let student = Student::new("GoLang User", 30, "go@example.com");

        assert!(repository
            .insert_student(&student)
            .await
            .unwrap_err()
            .is_not_connected());
        assert!(repository
            .insert_students(&[])
            .await
            .unwrap_err()
            .is_not_connected());
        assert!(repository
            .find_student(&by_name("GoLang User"))
            .await
            .unwrap_err()
            .is_not_connected());
        assert!(repository
            .list_students(&StudentFilter::default())
            .await
            .unwrap_err()
            .is_not_connected());
        assert!(repository
            .update_student(&by_name("GoLang User"), &set_age(31))
            .await
            .unwrap_err()
            .is_not_connected());
        assert!(repository
            .update_student(&by_name("GoLang User"), &StudentUpdate::default())
            .await
            .unwrap_err()
            .is_not_connected());
        assert!(repository
            .delete_student(&by_name("GoLang User"))
            .await
            .unwrap_err()
            .is_not_connected());
        assert!(repository.summary().await.unwrap_err().is_not_connected());
    }

    // The tests below need a running MongoDB; run them with `cargo test -- --ignored`.
    // Each one works in a throwaway database that is dropped afterwards.

    async fn live_connection() -> MongoConnection {
        let config = StorageConfig {
            uri: std::env::var("GIMNASIO_TEST_MONGO_URI")
                .unwrap_or_else(|_| DEFAULT_URI.into()),
            database: format!("gimnasio_test_{}", Uuid::new_v4().simple()),
            ..Default::default()
        };
        MongoConnection::connect(&config).await.unwrap()
    }

    async fn find_named(repository: &StudentRepository<'_>, name: &str) -> Option<Student> {
        repository.find_student(&by_name(name)).await.unwrap()
    }

    async fn teardown(mut connection: MongoConnection) {
        connection.database().unwrap().drop().await.unwrap();
        connection.disconnect().await;
        assert!(!connection.is_connected());
    }

    #[tokio::test]
    #[serial]
    #[ignore]
    async fn test_live_student_lifecycle() {
        let connection = live_connection().await;
        assert!(connection.is_connected());
        connection.ping().await.unwrap();
        let repository = StudentRepository::new(&connection);

        let id = repository
            .insert_student(&Student::new("GoLang User", 30, "go@example.com"))
            .await
            .unwrap();

        let found = find_named(&repository, "GoLang User").await.unwrap();
        assert_eq!(found.id, Some(id));
        assert_eq!(found.name, "GoLang User");
        assert_eq!(found.age, 30);
        assert_eq!(found.email, "go@example.com");

        assert!(find_named(&repository, "Nobody").await.is_none());

        let summary = repository
            .update_student(&by_name("GoLang User"), &set_age(31))
            .await
            .unwrap();
        assert_eq!(
            summary,
            UpdateSummary {
                matched: 1,
                modified: 1
            }
        );
        let updated = find_named(&repository, "GoLang User").await.unwrap();
        assert_eq!(updated.age, 31);

        let deleted = repository
            .delete_student(&by_name("GoLang User"))
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert!(find_named(&repository, "GoLang User").await.is_none());
        let deleted_again = repository
            .delete_student(&by_name("GoLang User"))
            .await
            .unwrap();
        assert_eq!(deleted_again, 0);

        teardown(connection).await;
    }

    #[tokio::test]
    #[serial]
    #[ignore]
    async fn test_live_insert_many_and_list() {
        let connection = live_connection().await;
        let repository = StudentRepository::new(&connection);

        let batch = vec![
            Student::new("GoLang User", 30, "go@example.com"),
            Student::new("Alumno", 56, "alumno@example.com"),
            Student::new("Alumno", 19, "alumno2@example.com"),
        ];
        let ids = repository.insert_students(&batch).await.unwrap();
        assert_eq!(ids.len(), 3);

        let all = repository
            .list_students(&StudentFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
        let alumnos = repository.list_students(&by_name("Alumno")).await.unwrap();
        assert_eq!(alumnos.len(), 2);
        assert!(alumnos.iter().all(|s| s.name == "Alumno"));

        let first = find_named(&repository, "GoLang User").await.unwrap();
        assert_eq!(first.id, Some(ids[0]));

        let unchanged = repository
            .update_student(&by_name("GoLang User"), &set_age(30))
            .await
            .unwrap();
        assert_eq!(
            unchanged,
            UpdateSummary {
                matched: 1,
                modified: 0
            }
        );

        let err = repository
            .update_student(&by_name("GoLang User"), &StudentUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::EmptyUpdate));

        teardown(connection).await;
    }
}
