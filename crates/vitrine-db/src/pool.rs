//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite, and the
//! [`Database`] handle every delegate and repository hangs off.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  DbConfig::new(path) / from_env() / load_file()                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ├── db.products().find_many(..)    one pooled connection         │
//! │       ├── db.query_raw(..)               one pooled connection         │
//! │       └── db.transaction()               holds one until commit        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! SQLite WAL (Write-Ahead Logging) mode is enabled for:
//! - Better concurrent read performance
//! - Readers don't block writers
//! - Writers don't block readers
//! - Better crash recovery

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use vitrine_core::{
    AuditLog, Boutique, Payment, Product, Sale, SaleItem, Stock, StockEntry, StockEntryItem,
    Supplier, User,
};

use crate::delegate::Delegate;
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::model::Model;
use crate::query::Value;
use crate::raw::{self, JsonRow};
use crate::repository::{AuditLogRepository, SaleRepository, StockRepository, UserRepository};
use crate::transaction::Transaction;

/// Path that selects a private in-memory database.
const MEMORY_PATH: &str = ":memory:";

/// How long a statement waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/vitrine/vitrine.db")
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    ///
    /// The file is created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets how long a connection may sit idle before it is closed.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let db = Database::new(DbConfig::in_memory()).await?;
    /// // Database is isolated, perfect for tests
    /// ```
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(MEMORY_PATH),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == MEMORY_PATH
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
        };

        Ok(options
            // WAL mode: Better concurrent read performance
            .journal_mode(SqliteJournalMode::Wal)
            // NORMAL synchronous: Good balance of durability and speed
            .synchronous(SqliteSynchronous::Normal)
            // SQLite has them disabled by default for backwards compatibility
            .foreign_keys(true)
            // Writers queue on the lock for up to this long
            .busy_timeout(BUSY_TIMEOUT))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle: entity delegates, transactions, raw SQL and the
/// workflow repositories.
///
/// Cloning is cheap; clones share the pool.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::from_env()?).await?;
///
/// let product = db.products()
///     .find_unique(ProductKey::Sku("BISSAP-1L".into()))
///     .await?;
///
/// let details = db.sale_repo().record_sale(order).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite:
    ///    - WAL mode for concurrent reads
    ///    - NORMAL synchronous (balance of safety/speed)
    ///    - Foreign keys enabled
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let connect_options = config.connect_options()?;
        debug!("Connection options configured");

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout));
        if config.is_in_memory() {
            // The data lives only as long as its one connection.
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations. Called by `new()` when
    /// `run_migrations` is set.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // =========================================================================
    // Delegates
    // =========================================================================

    /// Delegate for any model.
    pub fn delegate<M: Model>(&self) -> Delegate<'static, M> {
        Delegate::pooled(self.pool.clone())
    }

    pub fn users(&self) -> Delegate<'static, User> {
        self.delegate()
    }

    pub fn boutiques(&self) -> Delegate<'static, Boutique> {
        self.delegate()
    }

    pub fn products(&self) -> Delegate<'static, Product> {
        self.delegate()
    }

    pub fn stocks(&self) -> Delegate<'static, Stock> {
        self.delegate()
    }

    pub fn suppliers(&self) -> Delegate<'static, Supplier> {
        self.delegate()
    }

    pub fn stock_entries(&self) -> Delegate<'static, StockEntry> {
        self.delegate()
    }

    pub fn stock_entry_items(&self) -> Delegate<'static, StockEntryItem> {
        self.delegate()
    }

    pub fn sales(&self) -> Delegate<'static, Sale> {
        self.delegate()
    }

    pub fn sale_items(&self) -> Delegate<'static, SaleItem> {
        self.delegate()
    }

    pub fn payments(&self) -> Delegate<'static, Payment> {
        self.delegate()
    }

    pub fn audit_logs(&self) -> Delegate<'static, AuditLog> {
        self.delegate()
    }

    // =========================================================================
    // Transactions & Raw SQL
    // =========================================================================

    /// Begins a write transaction. See [`Transaction`].
    pub async fn transaction(&self) -> DbResult<Transaction> {
        Transaction::begin(&self.pool).await
    }

    /// Begins a read-only transaction: a consistent snapshot that never
    /// holds the write lock.
    pub async fn read_transaction(&self) -> DbResult<Transaction> {
        Transaction::begin_read(&self.pool).await
    }

    /// Runs a SELECT and returns its rows as JSON objects.
    ///
    /// ```rust,ignore
    /// let rows = db.query_raw(
    ///     r#"SELECT "sku", "price" FROM "Product" WHERE "category" = ?"#,
    ///     vec!["boissons".into()],
    /// ).await?;
    /// ```
    pub async fn query_raw(&self, sql: &str, params: Vec<Value>) -> DbResult<Vec<JsonRow>> {
        raw::query_raw(&self.pool, sql, params).await
    }

    /// Runs a statement and returns the number of affected rows.
    pub async fn execute_raw(&self, sql: &str, params: Vec<Value>) -> DbResult<u64> {
        raw::execute_raw(&self.pool, sql, params).await
    }

    // =========================================================================
    // Repositories
    // =========================================================================

    /// Sale recording, lookup and voiding.
    pub fn sale_repo(&self) -> SaleRepository {
        SaleRepository::new(self.clone())
    }

    /// Stock receipts and adjustments.
    pub fn stock_repo(&self) -> StockRepository {
        StockRepository::new(self.clone())
    }

    /// Accounts and authentication.
    pub fn user_repo(&self) -> UserRepository {
        UserRepository::new(self.clone())
    }

    pub fn audit_repo(&self) -> AuditLogRepository {
        AuditLogRepository::new(self.clone())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Closes the database connection pool.
    ///
    /// After calling close, every operation fails with `ConnectionFailed`.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
