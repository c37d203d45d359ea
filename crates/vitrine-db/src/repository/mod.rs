//! # Repository Module
//!
//! Multi-table workflows built on the entity delegates.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Caller                                                                │
//! │       │                                                                 │
//! │       │  db.sale_repo().record_sale(order)                             │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── BEGIN                                                              │
//! │  ├── tx.sales().create(..)          ─┐                                 │
//! │  ├── tx.stocks().update_many(..)     │  entity delegates               │
//! │  ├── tx.sale_items().create(..)      │  on one transaction             │
//! │  ├── tx.payments().create(..)       ─┘                                 │
//! │  └── COMMIT                                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Plain CRUD goes straight through the delegates; a repository exists   │
//! │  only where several rows must change together.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SaleRepository`] - Record, look up and void sales
//! - [`StockRepository`] - Receive deliveries and adjust stock
//! - [`UserRepository`] - Register and authenticate accounts
//! - [`AuditLogRepository`] - Append and read the audit trail

pub mod audit;
pub mod sale;
pub mod stock;
pub mod user;

pub use audit::AuditLogRepository;
pub use sale::{SaleDetails, SaleRepository};
pub use stock::{ReceivedStock, StockRepository};
pub use user::UserRepository;
