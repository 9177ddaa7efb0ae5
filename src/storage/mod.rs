//! Key-value storage and the repository layer on top of it.
//!
//! Every entity list lives whole under a single string key; repository
//! operations are sequential read-modify-write cycles against a
//! [`KvStore`] backend chosen once at startup via [`StorageConfig`].

mod kv;
mod memory;
mod sqlite;
mod vault;

pub use kv::{keys, KvStore, StorageConfig};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use vault::Vault;
