//! Durable character records.
//!
//! A [`CharacterRecord`] is the flattened form of everything persisted about
//! one character. The lifecycle cache stores records opaquely; only the codec
//! that hydrates and flattens entities looks inside.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::{CharacterId, MapId};

/// Character class.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CharacterClass {
    /// Melee class.
    #[default]
    Warrior,
    /// Caster class.
    Mage,
    /// Hybrid support class.
    Taoist,
}

/// Character gender.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Gender {
    /// Male.
    #[default]
    Male,
    /// Female.
    Female,
}

/// Facing direction on the tile grid.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[allow(missing_docs)]
pub enum Direction {
    Up,
    UpRight,
    Right,
    DownRight,
    #[default]
    Down,
    DownLeft,
    Left,
    UpLeft,
}

/// Tile coordinates on a map.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Position {
    /// Where new characters spawn.
    pub const SPAWN: Position = Position { x: 100, y: 100 };

    /// Creates a position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Persisted numeric attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[allow(missing_docs)]
pub struct CharacterStats {
    pub level: i32,
    pub experience: i32,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub attack: i32,
    pub defense: i32,
    pub magic_attack: i32,
    pub magic_defense: i32,
    pub speed: i32,
    pub gold: i32,
}

impl CharacterStats {
    /// Level one stats for a freshly created character of `class`.
    #[must_use]
    pub fn base_for(class: CharacterClass) -> Self {
        let (hp, mp, attack, defense, magic_attack, magic_defense, speed) = match class {
            CharacterClass::Warrior => (150, 30, 15, 10, 5, 5, 4),
            CharacterClass::Mage => (80, 100, 5, 3, 20, 10, 5),
            CharacterClass::Taoist => (100, 80, 8, 5, 12, 12, 5),
        };
        Self {
            level: 1,
            experience: 0,
            hp,
            max_hp: hp,
            mp,
            max_mp: mp,
            attack,
            defense,
            magic_attack,
            magic_defense,
            speed,
            gold: 0,
        }
    }
}

/// Flattened snapshot of one character.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CharacterRecord {
    /// Durable id.
    pub id: CharacterId,
    /// Owning account.
    pub account_id: String,
    /// Display name.
    pub name: String,
    /// Class.
    pub class: CharacterClass,
    /// Gender.
    pub gender: Gender,
    /// Numeric attributes.
    pub stats: CharacterStats,
    /// Last known map.
    pub map_id: MapId,
    /// Last known position on `map_id`.
    pub position: Position,
    /// Facing direction.
    pub direction: Direction,
    /// Serialized equipment slots.
    pub equipment: String,
    /// Serialized bag contents.
    pub items: String,
    /// Serialized learned skills.
    pub skills: String,
    /// Creation time, unix seconds.
    pub created_at: i64,
    /// Last login time, unix seconds.
    pub last_login: i64,
}

impl CharacterRecord {
    /// Creates an empty record for `id` at the spawn point of the default map.
    #[must_use]
    pub fn new(id: CharacterId) -> Self {
        Self {
            id,
            account_id: String::new(),
            name: String::new(),
            class: CharacterClass::default(),
            gender: Gender::default(),
            stats: CharacterStats::default(),
            map_id: MapId::DEFAULT,
            position: Position::SPAWN,
            direction: Direction::default(),
            equipment: "{}".to_string(),
            items: "[]".to_string(),
            skills: "[]".to_string(),
            created_at: 0,
            last_login: 0,
        }
    }

    /// Sets the map.
    #[must_use]
    pub fn with_map(mut self, map_id: MapId) -> Self {
        self.map_id = map_id;
        self
    }

    /// Sets the position.
    #[must_use]
    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.position = Position::new(x, y);
        self
    }

    /// Sets the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the stats.
    #[must_use]
    pub fn with_stats(mut self, stats: CharacterStats) -> Self {
        self.stats = stats;
        self
    }
}

/// Parameters for explicit character creation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CharacterCreateRequest {
    /// Owning account.
    pub account_id: String,
    /// Display name.
    pub name: String,
    /// Class.
    pub class: CharacterClass,
    /// Gender.
    pub gender: Gender,
}

impl CharacterCreateRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(
        account_id: impl Into<String>,
        name: impl Into<String>,
        class: CharacterClass,
        gender: Gender,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            name: name.into(),
            class,
            gender,
        }
    }

    /// The request used when a character is first referenced without any
    /// stored record: `Player<id>`, warrior, male, no account.
    #[must_use]
    pub fn placeholder(id: CharacterId) -> Self {
        Self {
            account_id: String::new(),
            name: format!("Player{id}"),
            class: CharacterClass::Warrior,
            gender: Gender::Male,
        }
    }
}
