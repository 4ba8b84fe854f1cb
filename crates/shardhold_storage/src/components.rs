//! Persisted character components.
//!
//! These are the component types the lifecycle cache and the standard codec
//! know about. Gameplay systems are free to attach their own types alongside.

use shardhold_foundation::{
    CharacterClass, CharacterId, CharacterStats, Direction, Gender, MapId, Position,
};

/// Durable identity of a character entity.
///
/// The character id is fixed at construction; the index relies on it never
/// changing underneath a live handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    id: CharacterId,
    /// Owning account.
    pub account_id: String,
    /// Display name.
    pub name: String,
    /// Class.
    pub class: CharacterClass,
    /// Gender.
    pub gender: Gender,
}

impl Identity {
    /// Creates an identity with empty account and name.
    #[must_use]
    pub fn new(id: CharacterId) -> Self {
        Self {
            id,
            account_id: String::new(),
            name: String::new(),
            class: CharacterClass::default(),
            gender: Gender::default(),
        }
    }

    /// Sets the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The durable character id.
    #[must_use]
    pub fn id(&self) -> CharacterId {
        self.id
    }
}

/// Numeric attributes. Same shape as [`CharacterStats`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attributes(pub CharacterStats);

impl std::ops::Deref for Attributes {
    type Target = CharacterStats;

    fn deref(&self) -> &CharacterStats {
        &self.0
    }
}

impl std::ops::DerefMut for Attributes {
    fn deref_mut(&mut self) -> &mut CharacterStats {
        &mut self.0
    }
}

/// Where the character is and when it was last seen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersistedState {
    /// Current map.
    pub map_id: MapId,
    /// Current position.
    pub position: Position,
    /// Facing direction.
    pub direction: Direction,
    /// Creation time, unix seconds.
    pub created_at: i64,
    /// Last login, unix seconds.
    pub last_login: i64,
    /// Last activity, unix seconds. Not persisted.
    pub last_active: i64,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            map_id: MapId::DEFAULT,
            position: Position::SPAWN,
            direction: Direction::default(),
            created_at: 0,
            last_login: 0,
            last_active: 0,
        }
    }
}

/// Serialized bag, equipment and skill data.
///
/// Kept opaque here; the inventory systems own the format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inventory {
    /// Bag contents.
    pub items: String,
    /// Equipment slots.
    pub equipment: String,
    /// Learned skills.
    pub skills: String,
}

impl Default for Inventory {
    fn default() -> Self {
        Self {
            items: "[]".to_string(),
            equipment: "{}".to_string(),
            skills: "[]".to_string(),
        }
    }
}

/// Which persisted aspects changed since the last successful save.
///
/// Absence of this component means clean. See [`crate::dirty`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct DirtyFlags {
    /// Identity changed.
    pub identity: bool,
    /// Attributes changed.
    pub attributes: bool,
    /// Position or map changed.
    pub state: bool,
    /// Legacy umbrella flag, set alongside items, equipment and skills.
    pub inventory: bool,
    /// Bag contents changed.
    pub items: bool,
    /// Equipment changed.
    pub equipment: bool,
    /// Skills changed.
    pub skills: bool,
}

impl DirtyFlags {
    /// Returns true if any flag is set.
    #[must_use]
    pub fn any(&self) -> bool {
        self.identity
            || self.attributes
            || self.state
            || self.inventory
            || self.items
            || self.equipment
            || self.skills
    }
}
