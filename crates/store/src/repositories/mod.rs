//! Repository implementations backing the version engine.
//!
//! Both types implement the storage traits from
//! `scenaria_core::version::repository`, so the engine stays unaware of
//! how data is kept.

pub mod catalog;
pub mod version;

pub use catalog::InMemoryCatalog;
pub use version::MemoryVersionStore;
