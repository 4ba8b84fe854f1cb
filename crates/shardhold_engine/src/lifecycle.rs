//! Character lifecycle cache.
//!
//! Decides which entity represents each character, which partition owns it,
//! when it is built from a stored snapshot, when it is written back, and when
//! it is evicted. The cache is write-back: changes live on entities, flagged
//! by [`DirtyFlags`](shardhold_storage::DirtyFlags), until a save flattens
//! them into the snapshot map.
//!
//! [`CharacterCache`] holds the state. Operations run on a
//! [`CharacterManager`], a short-lived view pairing the cache with the
//! partitions it manages.

mod index;
pub mod manager;

pub use manager::CharacterManager;

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use shardhold_foundation::{CharacterId, CharacterRecord, Error, MapId, Result};

use crate::codec::{CharacterCodec, StandardCodec};
use crate::config::{CacheConfig, ErrorPolicy};
use crate::partition::Partitions;

use index::CharacterIndex;

// =============================================================================
// Session
// =============================================================================

/// Per-character connection bookkeeping driven by
/// [`CharacterManager::update`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SessionState {
    /// True between login and disconnect.
    pub connected: bool,
    /// Seconds since the last autosave while connected.
    pub time_since_last_save: f32,
    /// Seconds since disconnect.
    pub time_since_disconnect: f32,
}

/// Outcome of [`CharacterManager::save_if_dirty`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SaveResult {
    /// Flattened and stored; flags cleared.
    Success,
    /// Live but clean; nothing written.
    NotDirty,
    /// Not indexed or no longer alive.
    EntityNotFound,
    /// The codec failed; flags handled per [`ErrorPolicy`].
    SaveFailed,
}

// =============================================================================
// Character Cache
// =============================================================================

/// Index, snapshots, sessions and settings of the lifecycle cache.
///
/// Not `Sync`: one thread owns the cache, and sharing it is an explicit
/// hand-off.
pub struct CharacterCache {
    index: CharacterIndex,
    stored: HashMap<CharacterId, CharacterRecord>,
    sessions: HashMap<CharacterId, SessionState>,
    config: CacheConfig,
    codec: Box<dyn CharacterCodec>,
    _single_writer: PhantomData<Cell<()>>,
}

impl fmt::Debug for CharacterCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CharacterCache")
            .field("indexed", &self.index.len())
            .field("stored", &self.stored.len())
            .field("sessions", &self.sessions.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for CharacterCache {
    fn default() -> Self {
        Self::new(CacheConfig::default(), StandardCodec)
    }
}

impl CharacterCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(config: CacheConfig, codec: impl CharacterCodec + 'static) -> Self {
        Self {
            index: CharacterIndex::default(),
            stored: HashMap::new(),
            sessions: HashMap::new(),
            config,
            codec: Box::new(codec),
            _single_writer: PhantomData,
        }
    }

    /// Pairs the cache with the partitions it manages.
    pub fn attach<'a, P: Partitions>(
        &'a mut self,
        partitions: &'a mut P,
    ) -> CharacterManager<'a, P> {
        CharacterManager::new(self, partitions)
    }

    /// Settings in effect.
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Sets the autosave interval for connected characters.
    pub fn set_save_interval_seconds(&mut self, seconds: f32) {
        self.config.save_interval_seconds = seconds;
    }

    /// Sets how long disconnected characters stay cached.
    pub fn set_timeout_seconds(&mut self, seconds: f32) {
        self.config.timeout_seconds = seconds;
    }

    /// Sets how save failures treat dirty flags.
    pub fn set_error_policy(&mut self, policy: ErrorPolicy) {
        self.config.error_policy = policy;
    }

    /// Last stored snapshot of `id`.
    #[must_use]
    pub fn stored_data(&self, id: CharacterId) -> Option<&CharacterRecord> {
        self.stored.get(&id)
    }

    /// Number of stored snapshots.
    #[must_use]
    pub fn stored_count(&self) -> usize {
        self.stored.len()
    }

    /// Number of indexed characters.
    #[must_use]
    pub fn index_size(&self) -> usize {
        self.index.len()
    }

    /// Map the index places `id` on. Does not validate the entity.
    #[must_use]
    pub fn try_get_map_id(&self, id: CharacterId) -> Option<MapId> {
        self.index.map(id)
    }

    /// Session of `id`.
    #[must_use]
    pub fn session(&self, id: CharacterId) -> Option<SessionState> {
        self.sessions.get(&id).copied()
    }

    /// Number of tracked sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Serializes every stored snapshot, ordered by character id.
    ///
    /// # Errors
    ///
    /// Returns a snapshot error if encoding fails.
    pub fn export_snapshots(&self) -> Result<Vec<u8>> {
        let mut records: Vec<&CharacterRecord> = self.stored.values().collect();
        records.sort_unstable_by_key(|record| record.id);
        rmp_serde::to_vec_named(&records).map_err(|err| Error::snapshot(err.to_string()))
    }

    /// Loads snapshots written by [`export_snapshots`](Self::export_snapshots),
    /// replacing stored snapshots with the same ids. Live entities are not
    /// touched. Returns the number of records read.
    ///
    /// # Errors
    ///
    /// Returns a snapshot error if `bytes` do not decode; nothing is imported
    /// in that case.
    pub fn import_snapshots(&mut self, bytes: &[u8]) -> Result<usize> {
        let records: Vec<CharacterRecord> =
            rmp_serde::from_slice(bytes).map_err(|err| Error::snapshot(err.to_string()))?;
        let count = records.len();
        for record in records {
            self.stored.insert(record.id, record);
        }
        Ok(count)
    }
}
