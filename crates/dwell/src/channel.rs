use std::cell::RefCell;
use std::rc::Rc;

/// A subscriber callback. Handlers run synchronously on the update thread.
pub type Handler<E> = Rc<dyn Fn(&E)>;

/// Token returned by [`Channel::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct Registry<E> {
    next_id: u64,
    handlers: Vec<(SubscriptionId, Handler<E>)>,
}

/// Observer registry for one kind of event.
///
/// Cloning yields another handle to the same registry. Emission iterates a
/// snapshot, so a handler that subscribes or unsubscribes (itself or others)
/// affects the next emission, never the one in progress.
pub struct Channel<E> {
    registry: Rc<RefCell<Registry<E>>>,
}

impl<E> Channel<E> {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }

    /// Register a handler. Handlers are called in subscription order.
    pub fn subscribe(&self, handler: impl Fn(&E) + 'static) -> SubscriptionId {
        let mut reg = self.registry.borrow_mut();
        let id = SubscriptionId(reg.next_id);
        reg.next_id += 1;
        reg.handlers.push((id, Rc::new(handler)));
        id
    }

    /// Remove a handler. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut reg = self.registry.borrow_mut();
        let before = reg.handlers.len();
        reg.handlers.retain(|(sub, _)| *sub != id);
        reg.handlers.len() != before
    }

    pub fn len(&self) -> usize {
        self.registry.borrow().handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current subscriber list.
    pub fn snapshot(&self) -> Vec<Handler<E>> {
        self.registry
            .borrow()
            .handlers
            .iter()
            .map(|(_, h)| Rc::clone(h))
            .collect()
    }

    /// Deliver `event` to every current subscriber. Returns how many ran.
    pub fn emit(&self, event: &E) -> usize {
        dispatch(&self.snapshot(), event)
    }
}

/// Call each handler in `snapshot` with `event`.
pub(crate) fn dispatch<E>(snapshot: &[Handler<E>], event: &E) -> usize {
    for handler in snapshot {
        handler(event);
    }
    snapshot.len()
}

impl<E> Clone for Channel<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
        }
    }
}

impl<E> Default for Channel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Channel<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("subscribers", &self.len())
            .finish()
    }
}
