//! Entity tables, component columns, and dirty tracking for Shardhold.
//!
//! This crate provides:
//! - [`EntityStore`] - Generational entity allocation
//! - [`ComponentStore`] - Sparse-set component columns keyed by type
//! - [`EntityTable`] - One partition's entities and components
//! - [`components`] - The persisted character components
//! - [`dirty`] - Per-aspect dirty marking

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod component;
pub mod components;
pub mod dirty;
pub mod entity;
pub mod table;

pub use component::{Column, ComponentStore};
pub use components::{Attributes, DirtyFlags, Identity, Inventory, PersistedState};
pub use entity::EntityStore;
pub use table::EntityTable;
