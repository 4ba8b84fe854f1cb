//! Gameplay systems run by a [`World`](crate::World) each tick.
//!
//! Systems are owned trait objects. A world sorts them by ascending
//! [`SystemPriority`] before running, keeping insertion order among equals.

use std::any::Any;
use std::fmt;

use shardhold_storage::EntityTable;

use crate::event::EventBus;

// =============================================================================
// Priority
// =============================================================================

/// Execution order key. Lower runs first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SystemPriority(pub i32);

impl SystemPriority {
    /// Movement resolution.
    pub const MOVEMENT: Self = Self(100);
    /// Inventory bookkeeping.
    pub const INVENTORY: Self = Self(150);
    /// Combat resolution.
    pub const COMBAT: Self = Self(200);
    /// Level-up checks, after combat has granted experience.
    pub const LEVEL_UP: Self = Self(300);
}

impl fmt::Display for SystemPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// System
// =============================================================================

/// Identifies a system within the world that created it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SystemId(pub(crate) u32);

/// Upcast to [`Any`] for typed system lookup.
///
/// Blanket-implemented for every `'static` type; systems never implement it
/// by hand.
pub trait AsAny: Any {
    /// Borrows `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
    /// Borrows `self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A unit of per-tick gameplay logic.
///
/// `update` receives the owning world's table and event bus. Events published
/// during a tick are delivered after every system has run.
pub trait System: AsAny + Send {
    /// Where this system runs relative to the others.
    fn priority(&self) -> SystemPriority;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Runs one tick.
    fn update(&mut self, table: &mut EntityTable, events: &mut EventBus, delta_time: f32);
}

pub(crate) struct Slot {
    pub(crate) id: SystemId,
    pub(crate) system: Box<dyn System>,
}

impl Slot {
    pub(crate) fn priority(&self) -> SystemPriority {
        self.system.priority()
    }

    /// Downcasts the boxed system. Goes through `dyn System` so the blanket
    /// `AsAny` impl on the `Box` itself is never picked.
    pub(crate) fn downcast_ref<T: System>(&self) -> Option<&T> {
        (*self.system).as_any().downcast_ref()
    }

    pub(crate) fn downcast_mut<T: System>(&mut self) -> Option<&mut T> {
        (*self.system).as_any_mut().downcast_mut()
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("System")
            .field("id", &self.id)
            .field("name", &self.system.name())
            .field("priority", &self.system.priority())
            .finish()
    }
}
