//! Teacher (profesor), shift (turno) and schedule (horario) repositories.
//!
//! These entities have no defined document shape yet. Their operations only require a
//! live connection and otherwise do nothing.

use log::warn;

use crate::error_handling::types::StorageError;
use crate::storage::connection::MongoConnection;

fn reserved(connection: &MongoConnection, operation: &'static str) -> Result<(), StorageError> {
    connection.ensure_connected()?;
    warn!("`{}` is reserved and performs no store operation", operation);
    Ok(())
}

pub struct TeacherRepository<'a> {
    connection: &'a MongoConnection,
}

impl<'a> TeacherRepository<'a> {
    pub fn new(connection: &'a MongoConnection) -> Self {
        Self { connection }
    }

    pub async fn create(&self) -> Result<(), StorageError> {
        reserved(self.connection, "create_teacher")
    }

    pub async fn read(&self) -> Result<(), StorageError> {
        reserved(self.connection, "read_teacher")
    }
}

pub struct ShiftRepository<'a> {
    connection: &'a MongoConnection,
}

impl<'a> ShiftRepository<'a> {
    pub fn new(connection: &'a MongoConnection) -> Self {
        Self { connection }
    }

    pub async fn create(&self) -> Result<(), StorageError> {
        reserved(self.connection, "create_shift")
    }
}

pub struct ScheduleRepository<'a> {
    connection: &'a MongoConnection,
}

impl<'a> ScheduleRepository<'a> {
    pub fn new(connection: &'a MongoConnection) -> Self {
        Self { connection }
    }

    pub async fn create(&self) -> Result<(), StorageError> {
        reserved(self.connection, "create_schedule")
    }
}
