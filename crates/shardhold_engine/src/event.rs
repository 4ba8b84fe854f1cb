//! Typed, queued event delivery.
//!
//! Publishing only queues; nothing runs until [`EventBus::flush`], which the
//! owning world calls after its systems. Subscribers therefore never observe
//! a half-applied tick.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use shardhold_foundation::{CharacterId, EntityHandle};

type Handler = Box<dyn FnMut(&dyn Any) + Send>;

/// Queued publish/subscribe bus keyed by event type.
#[derive(Default)]
pub struct EventBus {
    queue: Vec<(TypeId, Box<dyn Any + Send>)>,
    handlers: HashMap<TypeId, Vec<Handler>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("pending", &self.queue.len())
            .field("event_types", &self.handlers.len())
            .finish()
    }
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an event for the next flush.
    pub fn publish<E: Any + Send>(&mut self, event: E) {
        self.queue.push((TypeId::of::<E>(), Box::new(event)));
    }

    /// Registers a handler for events of type `E`.
    pub fn subscribe<E: Any>(&mut self, mut handler: impl FnMut(&E) + Send + 'static) {
        self.handlers
            .entry(TypeId::of::<E>())
            .or_default()
            .push(Box::new(move |event: &dyn Any| {
                if let Some(event) = event.downcast_ref::<E>() {
                    handler(event);
                }
            }));
    }

    /// Delivers every queued event in publication order and returns how many
    /// were queued. Events nobody subscribed to are dropped.
    pub fn flush(&mut self) -> usize {
        let queue = std::mem::take(&mut self.queue);
        let delivered = queue.len();
        for (type_id, event) in queue {
            if let Some(handlers) = self.handlers.get_mut(&type_id) {
                for handler in handlers {
                    handler(&*event);
                }
            }
        }
        delivered
    }

    /// Number of queued events.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Drops every handler for `E`.
    pub fn unsubscribe_all<E: Any>(&mut self) {
        self.handlers.remove(&TypeId::of::<E>());
    }
}

// =============================================================================
// Lifecycle events
// =============================================================================

/// Emitted by the character cache at lifecycle boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A character was created from an explicit request.
    CharacterCreated {
        /// Durable id.
        character: CharacterId,
        /// Entity now holding it.
        entity: EntityHandle,
    },
    /// A character logged in.
    CharacterLogin {
        /// Durable id.
        character: CharacterId,
        /// Entity holding it.
        entity: EntityHandle,
    },
    /// A character disconnected. Emitted only if it was live.
    CharacterLogout {
        /// Durable id.
        character: CharacterId,
        /// Entity holding it.
        entity: EntityHandle,
    },
}

impl LifecycleEvent {
    /// The character the event is about.
    #[must_use]
    pub fn character(&self) -> CharacterId {
        match *self {
            Self::CharacterCreated { character, .. }
            | Self::CharacterLogin { character, .. }
            | Self::CharacterLogout { character, .. } => character,
        }
    }
}

/// Where lifecycle events go.
pub trait LifecycleSink {
    /// Accepts one event.
    fn publish_lifecycle(&mut self, event: LifecycleEvent);
}

impl LifecycleSink for EventBus {
    fn publish_lifecycle(&mut self, event: LifecycleEvent) {
        self.publish(event);
    }
}

impl LifecycleSink for Vec<LifecycleEvent> {
    fn publish_lifecycle(&mut self, event: LifecycleEvent) {
        self.push(event);
    }
}
