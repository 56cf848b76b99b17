//! Database layer
//!
//! Database abstraction for the MyVillage backend. It supports:
//! - SQLite (default, for single-binary deployment)
//! - MySQL (for larger deployments)
//!
//! The driver is selected from configuration. The `DatabasePool` trait lets
//! the rest of the application stay backend-agnostic; repositories dispatch
//! on the driver internally.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
