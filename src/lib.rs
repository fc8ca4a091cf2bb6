pub mod configuration;
pub use configuration::StorageConfig;

pub mod error_handling;
pub use error_handling::types::{ConfigError, StorageError};

pub mod storage;
pub use storage::*;
