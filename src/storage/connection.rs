//! Connection lifecycle for the MongoDB backend.
//!
//! `MongoConnection` owns the client session and the bound student collection. It is the
//! only place that connects, health-checks and disconnects; repositories borrow it and
//! route every store call through [`MongoConnection::run`], which gives each call its own
//! deadline.

use std::future::IntoFuture;
use std::time::Duration;

use log::{debug, error, info, warn};
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, ReadPreference, SelectionCriteria};
use mongodb::{Client, Collection, Database};

use crate::configuration::config::StorageConfig;
use crate::error_handling::types::StorageError;
use crate::storage::types::Student;

const SETUP_GRACE: Duration = Duration::from_secs(1);

struct Bound {
    client: Client,
    students: Collection<Student>,
}

/// Handle to the document store.
///
/// A handle is either connected (built by [`MongoConnection::connect`]) or not yet
/// connected (built by `Default` or [`MongoConnection::disconnected`], or after
/// [`MongoConnection::disconnect`]). Operations on an unconnected handle return
/// `StorageError::NotConnected`.
pub struct MongoConnection {
    bound: Option<Bound>,
    database: String,
    collection: String,
    operation_timeout: Duration,
}

impl Default for MongoConnection {
    fn default() -> Self {
        Self::disconnected(&StorageConfig::default())
    }
}

impl MongoConnection {
    /// Connects to the store, verifies it answers a ping on the primary and binds the
    /// configured database and collection.
    ///
    /// The whole setup runs under `connect_timeout_secs`; that deadline is not reused by
    /// later operations.
    pub async fn connect(config: &StorageConfig) -> Result<Self, StorageError> {
        config
            .validate()
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        let setup_timeout = config.connect_timeout();
        let setup = async {
            let mut options = ClientOptions::parse(&config.uri).await.map_err(|e| {
                StorageError::ConnectionFailed(format!("invalid connection string: {}", e))
            })?;
            options.connect_timeout = Some(setup_timeout);
            options.server_selection_timeout = Some(setup_timeout);
            if let Some(ref app_name) = config.app_name {
                options.app_name = Some(app_name.clone());
            }
            let client = Client::with_options(options)
                .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;
            ping_primary(&client)
                .await
                .map_err(|e| StorageError::ConnectionFailed(format!("ping failed: {}", e)))?;
            Ok::<_, StorageError>(client)
        };

        // The driver enforces `setup_timeout` itself and reports why it gave up; the outer
        // guard only catches a setup that hangs past that.
        let client = match tokio::time::timeout(setup_timeout + SETUP_GRACE, setup).await {
            Ok(Ok(client)) => client,
            Ok(Err(e)) => {
                error!("Unable to connect to MongoDB: {}", e);
                return Err(e);
            }
            Err(_) => {
                error!("MongoDB did not answer within {:?}", setup_timeout);
                return Err(StorageError::ConnectionFailed(format!(
                    "no answer within {:?}",
                    setup_timeout
                )));
            }
        };

        let students = client
            .database(&config.database)
            .collection::<Student>(&config.collection);
        info!(
            "Connected to MongoDB, using {}.{}",
            config.database, config.collection
        );

        Ok(Self {
            bound: Some(Bound { client, students }),
            database: config.database.clone(),
            collection: config.collection.clone(),
            operation_timeout: config.operation_timeout(),
        })
    }

    /// Builds a handle in the not-yet-connected state.
    pub fn disconnected(config: &StorageConfig) -> Self {
        Self {
            bound: None,
            database: config.database.clone(),
            collection: config.collection.clone(),
            operation_timeout: config.operation_timeout(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.bound.is_some()
    }

    pub fn database_name(&self) -> &str {
        &self.database
    }

    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    pub fn ensure_connected(&self) -> Result<(), StorageError> {
        self.bound.as_ref().map(|_| ()).ok_or(StorageError::NotConnected)
    }

    pub fn database(&self) -> Result<Database, StorageError> {
        let bound = self.bound.as_ref().ok_or(StorageError::NotConnected)?;
        Ok(bound.client.database(&self.database))
    }

    /// The student collection bound at connect time.
    pub fn students(&self) -> Result<&Collection<Student>, StorageError> {
        self.bound
            .as_ref()
            .map(|bound| &bound.students)
            .ok_or(StorageError::NotConnected)
    }

    /// Liveness check against the primary, under a fresh per-call deadline.
    pub async fn ping(&self) -> Result<(), StorageError> {
        let bound = self.bound.as_ref().ok_or(StorageError::NotConnected)?;
        self.run("ping", ping_primary(&bound.client)).await
    }

    /// Shuts the client down. The handle goes back to the not-yet-connected state;
    /// calling this on an unconnected handle does nothing.
    pub async fn disconnect(&mut self) {
        match self.bound.take() {
            Some(Bound { client, students }) => {
                drop(students);
                client.shutdown().await;
                info!("Disconnected from MongoDB");
            }
            None => debug!("disconnect called on an unconnected handle"),
        }
    }

    /// Runs one store call under its own `operation_timeout`. On expiry the call is
    /// dropped, which cancels it.
    pub(crate) async fn run<T, F>(
        &self,
        operation: &'static str,
        call: F,
    ) -> Result<T, StorageError>
    where
        F: IntoFuture<Output = mongodb::error::Result<T>>,
    {
        match tokio::time::timeout(self.operation_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => {
                error!("MongoDB operation `{}` failed: {}", operation, source);
                Err(StorageError::OperationFailed { operation, source })
            }
            Err(_) => {
                warn!(
                    "MongoDB operation `{}` timed out after {:?}",
                    operation, self.operation_timeout
                );
                Err(StorageError::Timeout {
                    operation,
                    timeout: self.operation_timeout,
                })
            }
        }
    }
}

async fn ping_primary(client: &Client) -> mongodb::error::Result<()> {
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .selection_criteria(SelectionCriteria::ReadPreference(ReadPreference::Primary))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_is_not_connected() {
        let connection = MongoConnection::default();
        assert!(!connection.is_connected());
        assert_eq!(connection.database_name(), "Gimnasio");
        assert_eq!(connection.collection_name(), "alumnos");
        assert!(connection.ensure_connected().unwrap_err().is_not_connected());
        assert!(matches!(connection.students(), Err(StorageError::NotConnected)));
        assert!(matches!(connection.database(), Err(StorageError::NotConnected)));
        assert!(connection.ping().await.unwrap_err().is_not_connected());
    }

    #[tokio::test]
    async fn test_disconnect_unconnected_is_noop() {
        let mut connection = MongoConnection::default();
        connection.disconnect().await;
        connection.disconnect().await;
        assert!(!connection.is_connected());
    }

    #[tokio::test]
    async fn test_connect_unreachable_returns_connection_error() {
        let config = StorageConfig {
            uri: "mongodb://127.0.0.1:1/".into(),
            connect_timeout_secs: 1,
            ..Default::default()
        };
        match MongoConnection::connect(&config).await {
            Err(StorageError::ConnectionFailed(message)) => {
                assert!(message.starts_with("ping failed: "), "{}", message);
                assert!(!message.contains("no answer within"), "{}", message);
            }
            Err(other) => panic!("expected a connection error, got {}", other),
            Ok(_) => panic!("connected to a closed port"),
        }
    }

    #[tokio::test]
    async fn test_connect_invalid_uri_returns_connection_error() {
        let config = StorageConfig {
            uri: "not-a-mongodb-uri".into(),
            ..Default::default()
        };
        let result = MongoConnection::connect(&config).await;
        assert!(matches!(result, Err(StorageError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_config() {
        let config = StorageConfig {
            database: String::new(),
            ..Default::default()
        };
        let result = MongoConnection::connect(&config).await;
        assert!(matches!(result, Err(StorageError::ConnectionFailed(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_applies_per_call_deadline() {
        let config = StorageConfig {
            operation_timeout_secs: 3,
            ..Default::default()
        };
        let connection = MongoConnection::disconnected(&config);

        let result = connection
            .run("stalled", std::future::pending::<mongodb::error::Result<()>>())
            .await;
        match result {
            Err(StorageError::Timeout { operation, timeout }) => {
                assert_eq!(operation, "stalled");
                assert_eq!(timeout, Duration::from_secs(3));
            }
            other => panic!("expected timeout, got {:?}", other),
        }

        // A later call gets a fresh deadline rather than inheriting an expired one.
        let value = connection.run("ready", async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }
}
