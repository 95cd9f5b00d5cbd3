//! Graph store implementations
//!
//! - `SqliteUnitOfWork`: durable, transaction-scoped store over sqlx
//! - `MemoryGraphStore`: ordered in-memory store

mod memory;
mod sqlite;

pub use memory::MemoryGraphStore;
pub use sqlite::SqliteUnitOfWork;
