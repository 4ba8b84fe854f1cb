//! Shardhold - per-map entity storage and write-back character cache
//!
//! This crate re-exports all layers of the Shardhold system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: shardhold_engine     — Worlds, systems, events, character lifecycle cache
//! Layer 1: shardhold_storage    — Entity tables, component columns, dirty tracking
//! Layer 0: shardhold_foundation — Core types (EntityHandle, CharacterRecord, Error)
//! ```

pub use shardhold_engine as engine;
pub use shardhold_foundation as foundation;
pub use shardhold_storage as storage;
