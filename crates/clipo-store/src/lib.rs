//! Record store for videos and their rendered clips.
//!
//! This crate provides:
//! - The `RecordStore` trait the pipeline and API depend on
//! - `MemoryStore` for tests and ephemeral deployments
//! - `JsonFileStore`, a single-node store persisting to JSON files

pub mod error;
pub mod file;
pub mod memory;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use store::RecordStore;
