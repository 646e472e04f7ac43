//! Persistence layer: scoped key/value state behind one async trait.

pub mod libsql_backend;
pub mod memory;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use memory::MemoryStore;
pub use traits::{KeyValueStore, StateWrite, scopes};
