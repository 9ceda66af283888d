use rand::Rng;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tracing::debug;

/// Upper bound (inclusive) of the identity space handlers are drawn from.
pub const MAX_HANDLER_ID: u64 = u32::MAX as u64;

/// Identity of a registered handler, unique within its registry while the
/// handler stays registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Entries<H> = RwLock<HashMap<HandlerId, Arc<H>>>;

trait Deregister: Send + Sync {
    fn deregister(&self, id: HandlerId) -> bool;
}

impl<H: ?Sized + Send + Sync> Deregister for Entries<H> {
    fn deregister(&self, id: HandlerId) -> bool {
        self.write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }
}

/// Handlers for one request kind.
///
/// The registry is a plain mapping: iteration order carries no meaning and
/// callers must not rely on it.
pub struct HandlerRegistry<H: ?Sized> {
    entries: Arc<Entries<H>>,
}

impl<H: ?Sized + Send + Sync + 'static> HandlerRegistry<H> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Stores `handler` under a fresh identity and returns the capability
    /// that removes it again.
    pub fn register(&self, handler: Arc<H>) -> Registration {
        let id = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            let mut rng = rand::thread_rng();
            // Rejection sampling; the space dwarfs any realistic handler count.
            let id = loop {
                let candidate = HandlerId(rng.gen_range(0..=MAX_HANDLER_ID));
                if !entries.contains_key(&candidate) {
                    break candidate;
                }
            };
            entries.insert(id, handler);
            id
        };
        debug!(handler_id = %id, "Handler registered");

        let entries: Arc<dyn Deregister> = self.entries.clone();
        Registration {
            id,
            entries: Arc::downgrade(&entries),
        }
    }

    /// Current handlers, in no particular order.
    pub fn snapshot(&self) -> Vec<Arc<H>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn contains(&self, id: HandlerId) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<H: ?Sized + Send + Sync + 'static> Default for HandlerRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ?Sized> Clone for HandlerRegistry<H> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

/// Removes one handler from the registry it was registered with.
///
/// Dropping a `Registration` leaves the handler in place; only
/// [`Registration::unregister`] removes it.
pub struct Registration {
    id: HandlerId,
    entries: Weak<dyn Deregister>,
}

impl Registration {
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Removes the handler. Calling this again, or after the registry is
    /// gone, does nothing.
    pub fn unregister(&self) {
        if let Some(entries) = self.entries.upgrade()
            && entries.deregister(self.id)
        {
            debug!(handler_id = %self.id, "Handler unregistered");
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration").field("id", &self.id).finish()
    }
}
