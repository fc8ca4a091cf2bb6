//! Storage subsystem
//!
//! This module provides the data-access layer for the gymnasium's document store.
//!
//! Components:
//! - `connection`: connection lifecycle (connect, liveness check, disconnect) and per-call
//!   deadlines.
//! - `storage_trait`: the `StudentStorage` trait defining a uniform student API.
//! - `types`: shared data types used by storage backends.
//! - `student_repository`: MongoDB implementation of `StudentStorage`.
//! - `memory_storage`: in-process implementation for tests and offline runs.
//! - `student_filter`: helpers to build filters and updates.
//! - `reserved`: teacher, shift and schedule repositories whose operations are not defined yet.

pub mod connection;
pub mod memory_storage;
pub mod reserved;
pub mod storage_trait;
pub mod student_filter;
pub mod student_repository;
pub mod types;

pub use connection::MongoConnection;
pub use memory_storage::MemoryStorage;
pub use storage_trait::StudentStorage;
pub use student_repository::StudentRepository;
pub use types::{Student, StudentFilter, StudentUpdate, UpdateSummary};
