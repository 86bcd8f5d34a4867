//! Storage layer for budget versions.
//!
//! This crate provides:
//! - A transactional in-memory [`MemoryVersionStore`]
//! - An [`InMemoryCatalog`] of fiscal years, budget lines and cost centers

pub mod repositories;

pub use repositories::{InMemoryCatalog, MemoryVersionStore};
