//! Listener records and subscription handles.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use futures::future::LocalBoxFuture;
use polarise_types::Event;

use crate::bus::BusInner;

/// Result returned by every event handler.
///
/// Errors are logged by the bus and never reach the publisher.
pub type HandlerResult = Result<(), anyhow::Error>;

/// A synchronous event handler.
pub type SyncHandler = dyn FnMut(&Event) -> HandlerResult;

/// An asynchronous event handler. The returned future owns whatever it needs
/// from the event.
pub type AsyncHandler = dyn FnMut(&Event) -> LocalBoxFuture<'static, HandlerResult>;

/// Priority given to listeners that do not care about ordering.
pub const DEFAULT_PRIORITY: i32 = 100;

/// Identifies one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

impl core::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Identifies one registered middleware hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MiddlewareId(pub(crate) u64);

/// The callable part of a listener.
#[derive(Clone)]
pub(crate) enum HandlerFn {
    Sync(Rc<RefCell<SyncHandler>>),
    Async(Rc<RefCell<AsyncHandler>>),
}

/// One registered listener.
#[derive(Clone)]
pub(crate) struct Listener {
    pub(crate) id: ListenerId,
    pub(crate) priority: i32,
    pub(crate) handler: HandlerFn,
}

/// Insert keeping ascending priority; equal priorities keep registration order.
pub(crate) fn insert_sorted(list: &mut Vec<Listener>, listener: Listener) {
    let at = list.partition_point(|existing| existing.priority <= listener.priority);
    list.insert(at, listener);
}

/// Handle returned by every `subscribe*` call.
///
/// Dropping the handle keeps the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub(crate) bus: Weak<RefCell<BusInner>>,
    pub(crate) id: ListenerId,
}

impl Subscription {
    /// The listener this handle refers to.
    pub const fn id(&self) -> ListenerId {
        self.id
    }

    /// Remove the listener from the bus.
    ///
    /// Returns `false` if it was already gone (a fired once-listener, a
    /// cleared bus, or a bus that has been dropped).
    pub fn unsubscribe(&self) -> bool {
        self.bus
            .upgrade()
            .is_some_and(|inner| inner.borrow_mut().remove_listener(self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listener(id: u64, priority: i32) -> Listener {
        let handler: Rc<RefCell<SyncHandler>> = Rc::new(RefCell::new(|_: &Event| Ok(())));
        Listener {
            id: ListenerId(id),
            priority,
            handler: HandlerFn::Sync(handler),
        }
    }

    #[test]
    fn insert_sorted_is_stable() {
        let mut list = Vec::new();
        insert_sorted(&mut list, listener(1, 50));
        insert_sorted(&mut list, listener(2, 10));
        insert_sorted(&mut list, listener(3, 50));
        insert_sorted(&mut list, listener(4, 90));
        let ids: Vec<u64> = list.iter().map(|l| l.id.0).collect();
        assert_eq!(ids, vec![2, 1, 3, 4]);
    }
}
