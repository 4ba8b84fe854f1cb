//! Partition worlds, system scheduling, and the character lifecycle cache
//! for Shardhold.
//!
//! This crate provides:
//! - [`World`] - One partition: entity table, ordered systems, event bus
//! - [`EventBus`] - Queued typed publish/subscribe
//! - [`CharacterCodec`] - Entity to record conversion, with [`StandardCodec`]
//! - [`CharacterCache`] / [`CharacterManager`] - Index, sessions, autosave and eviction
//! - [`PartitionRegistry`] - Every world plus the character cache

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod codec;
pub mod config;
pub mod event;
pub mod lifecycle;
pub mod partition;
pub mod registry;
pub mod system;
pub mod world;

pub use codec::{CharacterCodec, StandardCodec, unix_seconds};
pub use config::{CacheConfig, ErrorPolicy, RegistryConfig};
pub use event::{EventBus, LifecycleEvent, LifecycleSink};
pub use lifecycle::{CharacterCache, CharacterManager, SaveResult, SessionState};
pub use partition::{Partitions, Worlds};
pub use registry::PartitionRegistry;
pub use system::{AsAny, System, SystemId, SystemPriority};
pub use world::World;
