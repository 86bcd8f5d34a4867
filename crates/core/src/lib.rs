//! Core business logic for Scenaria.
//!
//! This crate contains pure business logic with ZERO storage or transport
//! dependencies. Persistence is reached through the traits in
//! [`version::repository`].
//!
//! # Modules
//!
//! - `version` - Budget version lifecycle, derivation, and comparison

pub mod version;
