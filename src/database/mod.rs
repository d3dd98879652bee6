//! Record store support
//!
//! The pagination engine only talks to a [`RecordStore`]: ordered range scans
//! with a pushed-down lower bound, plus a count. Two backends are provided:
//! an in-process [`MemoryStore`] and a DuckDB-backed [`DuckDbStore`].

mod engine;
mod memory;
mod store;

pub use engine::DuckDbStore;
pub use memory::MemoryStore;
pub use store::{RecordStore, SharedStore};
