//! Core identifiers, character records, and errors for Shardhold.
//!
//! This crate provides:
//! - [`EntityHandle`] - Generational, partition-scoped entity handles
//! - [`CharacterId`] and [`MapId`] - Durable identifiers
//! - [`CharacterRecord`] - The flattened durable shape of a character
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod entity;
pub mod error;
pub mod ids;
pub mod record;

pub use entity::EntityHandle;
pub use error::{Error, ErrorContext, ErrorKind};
pub use ids::{CharacterId, MapId};
pub use record::{
    CharacterClass, CharacterCreateRequest, CharacterRecord, CharacterStats, Direction, Gender,
    Position,
};

/// Result type alias using Shardhold's error type.
pub type Result<T> = std::result::Result<T, Error>;
