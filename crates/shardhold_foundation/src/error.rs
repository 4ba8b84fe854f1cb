//! Error types for Shardhold.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::entity::EntityHandle;
use crate::ids::{CharacterId, MapId};

/// The main error type for Shardhold operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates an entity not found error.
    #[must_use]
    pub fn entity_not_found(id: EntityHandle) -> Self {
        Self::new(ErrorKind::EntityNotFound(id))
    }

    /// Creates a stale entity handle error.
    #[must_use]
    pub fn stale_entity(id: EntityHandle) -> Self {
        Self::new(ErrorKind::StaleEntity(id))
    }

    /// Creates a missing component error.
    #[must_use]
    pub fn component_not_found(entity: EntityHandle, component: &'static str) -> Self {
        Self::new(ErrorKind::ComponentNotFound { entity, component })
    }

    /// Creates an identity mismatch error.
    #[must_use]
    pub fn identity_mismatch(expected: CharacterId, found: Option<CharacterId>) -> Self {
        Self::new(ErrorKind::IdentityMismatch { expected, found })
    }

    /// Creates a duplicate character error.
    #[must_use]
    pub fn duplicate_character(
        character: CharacterId,
        existing: EntityHandle,
        rejected: EntityHandle,
    ) -> Self {
        Self::new(ErrorKind::DuplicateCharacter {
            character,
            existing,
            rejected,
        })
    }

    /// Creates a map unavailable error.
    #[must_use]
    pub fn map_unavailable(map: MapId) -> Self {
        Self::new(ErrorKind::MapUnavailable(map))
    }

    /// Creates a codec failure error.
    #[must_use]
    pub fn codec(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Codec(message.into()))
    }

    /// Creates a snapshot archive error.
    #[must_use]
    pub fn snapshot(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Snapshot(message.into()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Entity was never allocated or its slot is free.
    #[error("entity not found: {0:?}")]
    EntityNotFound(EntityHandle),

    /// Entity handle is stale (generation mismatch).
    #[error("stale entity handle: {0:?}")]
    StaleEntity(EntityHandle),

    /// Component not attached to entity.
    #[error("component not found: {component} on entity {entity:?}")]
    ComponentNotFound {
        /// The entity that was queried.
        entity: EntityHandle,
        /// The component type name.
        component: &'static str,
    },

    /// Entity identity does not match the character it was indexed under.
    #[error("identity mismatch: expected character {expected}, found {found:?}")]
    IdentityMismatch {
        /// The character id the caller asked for.
        expected: CharacterId,
        /// The id actually carried by the entity, if any.
        found: Option<CharacterId>,
    },

    /// A second live entity was offered for an already indexed character.
    #[error("duplicate character {character}: indexed {existing:?}, rejected {rejected:?}")]
    DuplicateCharacter {
        /// The character id.
        character: CharacterId,
        /// The entity already in the index.
        existing: EntityHandle,
        /// The entity that was refused.
        rejected: EntityHandle,
    },

    /// The partition for a map could not be resolved or created.
    #[error("map unavailable: {0}")]
    MapUnavailable(MapId),

    /// Hydrate, flatten, or create failed.
    #[error("codec failure: {0}")]
    Codec(String),

    /// Snapshot archive could not be encoded or decoded.
    #[error("snapshot archive: {0}")]
    Snapshot(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Character the operation was acting on.
    pub character: Option<CharacterId>,
    /// Map the operation was acting on.
    pub map: Option<MapId>,
    /// Operation name.
    pub operation: Option<&'static str>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the character.
    #[must_use]
    pub fn with_character(mut self, character: CharacterId) -> Self {
        self.character = Some(character);
        self
    }

    /// Sets the map.
    #[must_use]
    pub fn with_map(mut self, map: MapId) -> Self {
        self.map = Some(map);
        self
    }

    /// Sets the operation name.
    #[must_use]
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        self.operation = Some(operation);
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(operation) = self.operation {
            write!(f, "in {operation}")?;
        }
        if let Some(character) = self.character {
            write!(f, " character={character}")?;
        }
        if let Some(map) = self.map {
            write!(f, " map={map}")?;
        }
        Ok(())
    }
}
