//! # vitrine-db: Data Layer for Vitrine POS
//!
//! Typed access to the eleven Vitrine tables on SQLite, with sqlx for async
//! operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vitrine POS Data Flow                            │
//! │                                                                         │
//! │  Application code                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     vitrine-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │  ┌────────────┐  ┌─────────────┐  ┌─────────────┐  ┌─────────┐ │   │
//! │  │  │  Database  │  │  Delegate   │  │ Repositories│  │Migration│ │   │
//! │  │  │ (pool.rs)  │  │(delegate.rs)│  │ (workflows) │  │(embedded│ │   │
//! │  │  │            │  │             │  │             │  │  SQL)   │ │   │
//! │  │  │ SqlitePool │◄─│ find/create │◄─│ record_sale │  │ 001_... │ │   │
//! │  │  │Transaction │  │ update/...  │  │ receive     │  │         │ │   │
//! │  │  │ raw SQL    │  │ aggregate   │  │ authenticate│  │         │ │   │
//! │  │  └────────────┘  └─────────────┘  └─────────────┘  └─────────┘ │   │
//! │  │         ▲               ▲                                       │   │
//! │  │         │        query/ (filters, args, changes, aggregates)   │   │
//! │  │         │        schema/ (columns, keys, relations per table)  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, [`Database`] handle
//! - [`config`] - Settings from TOML or environment
//! - [`delegate`] - Per-entity CRUD and aggregates
//! - [`transaction`] - Same delegates inside one transaction
//! - [`query`] - Filters, find arguments, changes, aggregation
//! - [`schema`] - Column enums, unique keys and relations per table
//! - [`repository`] - Multi-table workflows (sales, stock, users, audit)
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vitrine_db::query::{ColumnExt, Direction, FindMany};
//! use vitrine_db::schema::ProductColumn;
//! use vitrine_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("vitrine.db")).await?;
//!
//! let drinks = db.products().find_many(
//!     FindMany::new()
//!         .filter(ProductColumn::Category.equals("boissons"))
//!         .order_by(ProductColumn::Price, Direction::Asc),
//! ).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod delegate;
pub mod error;
pub mod migrations;
pub mod model;
pub mod pool;
pub mod query;
pub mod raw;
pub mod repository;
pub mod schema;
pub mod transaction;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, DatabaseSettings};
pub use delegate::Delegate;
pub use error::{DbError, DbResult};
pub use model::{Insertable, Model, UniqueKey};
pub use pool::{Database, DbConfig};
pub use raw::JsonRow;
pub use transaction::Transaction;

// Repository re-exports for convenience
pub use repository::{
    AuditLogRepository, ReceivedStock, SaleDetails, SaleRepository, StockRepository,
    UserRepository,
};
