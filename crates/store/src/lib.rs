//! SQLite-backed persistence for TaskMind.
//!
//! `SqliteStore` implements both `taskmind_core::ChatStore` and
//! `taskmind_core::TaskStore` over one database file. `HistoryManager`
//! layers conversation lifecycle rules on top of the chat side.

pub mod history;
pub mod sqlite;

pub use history::HistoryManager;
pub use sqlite::SqliteStore;
