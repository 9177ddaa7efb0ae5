pub mod entity;
pub mod error;
pub mod export;
pub mod storage;
pub mod sync;
pub mod tabs;

pub use error::{PlaytabError, Result};
pub use storage::{StorageConfig, Vault};
