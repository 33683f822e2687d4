//! ClickHouse store wrapper for the gavel auction engine.
//!
//! Provides a type-safe interface for record upserts and schema management.
//! Room/team/player tables are ReplacingMergeTree: the latest row per key is
//! the durable state; `sale_log` is append-only.

use std::time::Duration;

use clickhouse::inserter::Inserter;
use clickhouse::Client;
use thiserror::Error;

use crate::{PlayerRecord, RoomRecord, SaleRecord, TeamRecord};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ClickHouse client error: {0}")]
    Client(#[from] clickhouse::error::Error),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Schema creation failed: {0}")]
    Schema(String),
}

/// Configuration for the store client.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// ClickHouse HTTP URL (e.g., "http://localhost:8123").
    pub url: String,
    /// Database name.
    pub database: String,
    /// Username (optional).
    pub user: Option<String>,
    /// Password (optional).
    pub password: Option<String>,
    /// Maximum rows before auto-commit in inserters.
    pub max_rows: u64,
    /// Maximum bytes before auto-commit in inserters.
    pub max_bytes: u64,
    /// Auto-commit period for inserters.
    pub commit_period: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".to_string(),
            database: "gavel".to_string(),
            user: None,
            password: None,
            max_rows: 5_000,
            max_bytes: 5_000_000, // 5MB
            commit_period: Duration::from_secs(2),
        }
    }
}

/// ClickHouse store wrapper with type-safe inserters.
#[derive(Clone)]
pub struct GavelStore {
    client: Client,
    config: StoreConfig,
}

impl GavelStore {
    /// Creates a new store client with the given configuration.
    pub fn new(config: StoreConfig) -> Self {
        let mut client = Client::default()
            .with_url(&config.url)
            .with_database(&config.database);

        if let Some(ref user) = config.user {
            client = client.with_user(user);
        }
        if let Some(ref password) = config.password {
            client = client.with_password(password);
        }

        Self { client, config }
    }

    /// Creates a client with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(StoreConfig::default())
    }

    /// Returns a reference to the underlying clickhouse client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Tests the connection by running a simple query.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .query("SELECT 1")
            .fetch_one::<u8>()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(())
    }

    /// Creates all required tables using the embedded schema.
    pub async fn create_tables(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");

        // Split by semicolons and execute each statement
        for statement in schema.split(';') {
            let statement = statement.trim();
            if statement.is_empty() || statement.starts_with("--") {
                continue;
            }

            let non_comment_lines: Vec<&str> = statement
                .lines()
                .filter(|line| !line.trim().starts_with("--") && !line.trim().is_empty())
                .collect();

            if non_comment_lines.is_empty() {
                continue;
            }

            self.client
                .query(statement)
                .execute()
                .await
                .map_err(|e| StoreError::Schema(format!("{}: {}", e, statement)))?;
        }

        Ok(())
    }

    /// Creates an inserter for room records with auto-commit configuration.
    pub fn room_inserter(&self) -> Result<Inserter<RoomRecord>, StoreError> {
        self.create_inserter("rooms")
    }

    /// Creates an inserter for team records with auto-commit configuration.
    pub fn team_inserter(&self) -> Result<Inserter<TeamRecord>, StoreError> {
        self.create_inserter("teams")
    }

    /// Creates an inserter for player records with auto-commit configuration.
    pub fn player_inserter(&self) -> Result<Inserter<PlayerRecord>, StoreError> {
        self.create_inserter("players")
    }

    /// Creates an inserter for the sale log with auto-commit configuration.
    pub fn sale_inserter(&self) -> Result<Inserter<SaleRecord>, StoreError> {
        self.create_inserter("sale_log")
    }

    /// Creates a generic inserter with the configured auto-commit settings.
    fn create_inserter<T>(&self, table: &str) -> Result<Inserter<T>, StoreError>
    where
        T: clickhouse::Row,
    {
        let inserter = self
            .client
            .inserter(table)?
            .with_max_rows(self.config.max_rows)
            .with_max_bytes(self.config.max_bytes)
            .with_period(Some(self.config.commit_period));

        Ok(inserter)
    }

    /// Fetches the latest durable record for a room, if any.
    pub async fn load_room(&self, room_code: &str) -> Result<Option<RoomRecord>, StoreError> {
        let rows = self
            .client
            .query("SELECT * FROM rooms FINAL WHERE room_code = ?")
            .bind(room_code)
            .fetch_all::<RoomRecord>()
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Fetches the latest team records for a room.
    pub async fn load_teams(&self, room_code: &str) -> Result<Vec<TeamRecord>, StoreError> {
        let rows = self
            .client
            .query("SELECT * FROM teams FINAL WHERE room_code = ?")
            .bind(room_code)
            .fetch_all::<TeamRecord>()
            .await?;
        Ok(rows)
    }

    /// Fetches the latest player records for a room in import order.
    pub async fn load_players(&self, room_code: &str) -> Result<Vec<PlayerRecord>, StoreError> {
        let rows = self
            .client
            .query("SELECT * FROM players FINAL WHERE room_code = ? ORDER BY import_order")
            .bind(room_code)
            .fetch_all::<PlayerRecord>()
            .await?;
        Ok(rows)
    }
}
