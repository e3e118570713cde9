//! # Component Events
//!
//! Synchronous, in-process notification channels fired by pools when a
//! component is added or is about to be removed. Dependents such as the
//! renderer subscribe instead of diffing pool contents every frame.

use super::entity::Entity;

/// Token returned by [`ComponentEvent::connect`], used to disconnect later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

/// Boxed listener invoked with the entity and its component.
type Listener<T> = Box<dyn FnMut(Entity, &mut T) + Send>;

/// An ordered list of listeners for one kind of structural change.
///
/// Listeners run in the order they were connected, on the thread that
/// mutates the pool, before the mutating call returns.
pub struct ComponentEvent<T> {
    listeners: Vec<(ConnectionId, Listener<T>)>,
    next_id: u64,
}

impl<T> ComponentEvent<T> {
    /// Creates an event with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    /// Subscribes `listener`, returning a token for [`disconnect`](Self::disconnect).
    pub fn connect<F>(&mut self, listener: F) -> ConnectionId
    where
        F: FnMut(Entity, &mut T) + Send + 'static,
    {
        let id = ConnectionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Unsubscribes a listener.
    ///
    /// Returns `false` if the token was already disconnected.
    pub fn disconnect(&mut self, id: ConnectionId) -> bool {
        let Some(position) = self.listeners.iter().position(|(c, _)| *c == id) else {
            return false;
        };
        drop(self.listeners.remove(position));
        true
    }

    /// Invokes every listener in connection order.
    pub fn fire(&mut self, entity: Entity, component: &mut T) {
        for (_, listener) in &mut self.listeners {
            listener(entity, component);
        }
    }

    /// Checks whether no listener is connected.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Number of connected listeners.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<T> Default for ComponentEvent<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for ComponentEvent<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentEvent")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
