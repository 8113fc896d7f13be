//! The event bus.
//!
//! [`EventBus`] is a cheap cloneable handle over shared listener tables.
//! Delivery is single-threaded: a synchronous [`EventBus::publish`] runs
//! middleware, then persistent listeners for the kind, then once-listeners
//! for the kind, then wildcard listeners, each group in ascending priority.
//! Async listeners reached from a synchronous publish are queued and run by
//! [`EventBus::flush_pending`]; [`EventBus::publish_async`] awaits them in
//! place.
//!
//! Handlers may publish from inside a handler. A handler that is already on
//! the call stack is skipped for the nested event rather than re-entered.
//! Two `publish_async` calls awaited concurrently interleave in an
//! unspecified order.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use polarise_types::{Event, EventKind, GameEvent};
use tracing::{debug, trace, warn};

use crate::listener::{
    AsyncHandler, HandlerFn, HandlerResult, Listener, ListenerId, MiddlewareId, Subscription,
    SyncHandler, insert_sorted,
};

/// Number of events kept for [`EventBus::recent_events`] by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// A middleware hook. Returning `false` cancels delivery.
type Middleware = Rc<dyn Fn(&Event) -> bool>;

/// Queued async handler invocation.
struct PendingCall {
    kind: EventKind,
    listener: ListenerId,
    future: LocalBoxFuture<'static, HandlerResult>,
}

/// Shared state behind every [`EventBus`] clone.
pub(crate) struct BusInner {
    next_id: u64,
    listeners: HashMap<EventKind, Vec<Listener>>,
    once_listeners: HashMap<EventKind, Vec<Listener>>,
    wildcard: Vec<Listener>,
    middleware: Vec<(MiddlewareId, Middleware)>,
    pending: Vec<PendingCall>,
    history: VecDeque<Event>,
    history_limit: usize,
}

impl BusInner {
    fn new(history_limit: usize) -> Self {
        Self {
            next_id: 0,
            listeners: HashMap::new(),
            once_listeners: HashMap::new(),
            wildcard: Vec::new(),
            middleware: Vec::new(),
            pending: Vec::new(),
            history: VecDeque::with_capacity(history_limit),
            history_limit,
        }
    }

    const fn allocate_id(&mut self) -> u64 {
        self.next_id = self.next_id.wrapping_add(1);
        self.next_id
    }

    pub(crate) fn remove_listener(&mut self, id: ListenerId) -> bool {
        let mut removed = false;
        for list in self
            .listeners
            .values_mut()
            .chain(self.once_listeners.values_mut())
            .chain(std::iter::once(&mut self.wildcard))
        {
            let before = list.len();
            list.retain(|l| l.id != id);
            removed |= list.len() != before;
        }
        removed
    }

    fn is_registered(&self, id: ListenerId) -> bool {
        self.listeners
            .values()
            .chain(std::iter::once(&self.wildcard))
            .any(|list| list.iter().any(|l| l.id == id))
    }

    fn record(&mut self, event: &Event) {
        if self.history_limit == 0 {
            return;
        }
        while self.history.len() >= self.history_limit {
            self.history.pop_front();
        }
        self.history.push_back(event.clone());
    }
}

/// Where a listener was registered.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Persistent(EventKind),
    Once(EventKind),
    Wildcard,
}

/// Priority-ordered publish/subscribe bus.
#[derive(Clone)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventBus")
            .field("kinds", &inner.listeners.len())
            .field("wildcard", &inner.wildcard.len())
            .field("middleware", &inner.middleware.len())
            .field("pending", &inner.pending.len())
            .finish()
    }
}

impl EventBus {
    /// Create a bus keeping the default amount of history.
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Create a bus keeping at most `limit` recent events (0 disables history).
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            inner: Rc::new(RefCell::new(BusInner::new(limit))),
        }
    }

    // -----------------------------------------------------------------------
    // Subscription
    // -----------------------------------------------------------------------

    /// Register a persistent handler for `kind`.
    ///
    /// Lower `priority` runs first; ties run in registration order.
    pub fn subscribe<F>(&self, kind: EventKind, priority: i32, handler: F) -> Subscription
    where
        F: FnMut(&Event) -> HandlerResult + 'static,
    {
        self.register(Slot::Persistent(kind), priority, sync_handler(handler))
    }

    /// Register a handler that is removed after its first delivery.
    pub fn subscribe_once<F>(&self, kind: EventKind, priority: i32, handler: F) -> Subscription
    where
        F: FnMut(&Event) -> HandlerResult + 'static,
    {
        self.register(Slot::Once(kind), priority, sync_handler(handler))
    }

    /// Register a persistent handler that returns a future.
    pub fn subscribe_async<F, Fut>(&self, kind: EventKind, priority: i32, handler: F) -> Subscription
    where
        F: FnMut(&Event) -> Fut + 'static,
        Fut: Future<Output = HandlerResult> + 'static,
    {
        self.register(Slot::Persistent(kind), priority, async_handler(handler))
    }

    /// Register an async handler removed after its first delivery.
    pub fn subscribe_once_async<F, Fut>(
        &self,
        kind: EventKind,
        priority: i32,
        handler: F,
    ) -> Subscription
    where
        F: FnMut(&Event) -> Fut + 'static,
        Fut: Future<Output = HandlerResult> + 'static,
    {
        self.register(Slot::Once(kind), priority, async_handler(handler))
    }

    /// Register a handler for every event, run after the kind-specific ones.
    pub fn subscribe_all<F>(&self, priority: i32, handler: F) -> Subscription
    where
        F: FnMut(&Event) -> HandlerResult + 'static,
    {
        self.register(Slot::Wildcard, priority, sync_handler(handler))
    }

    fn register(&self, slot: Slot, priority: i32, handler: HandlerFn) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.allocate_id());
        let listener = Listener {
            id,
            priority,
            handler,
        };
        match slot {
            Slot::Persistent(kind) => {
                insert_sorted(inner.listeners.entry(kind).or_default(), listener);
            }
            Slot::Once(kind) => {
                insert_sorted(inner.once_listeners.entry(kind).or_default(), listener);
            }
            Slot::Wildcard => insert_sorted(&mut inner.wildcard, listener),
        }
        trace!(listener = %id, ?slot, priority, "listener registered");
        Subscription {
            bus: Rc::downgrade(&self.inner),
            id,
        }
    }

    // -----------------------------------------------------------------------
    // Middleware
    // -----------------------------------------------------------------------

    /// Add a hook run before every delivery, in registration order.
    pub fn add_middleware<F>(&self, middleware: F) -> MiddlewareId
    where
        F: Fn(&Event) -> bool + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let id = MiddlewareId(inner.allocate_id());
        inner.middleware.push((id, Rc::new(middleware)));
        id
    }

    /// Remove a middleware hook. Returns whether it was registered.
    pub fn remove_middleware(&self, id: MiddlewareId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.middleware.len();
        inner.middleware.retain(|(existing, _)| *existing != id);
        inner.middleware.len() != before
    }

    fn passes_middleware(&self, event: &Event) -> bool {
        let hooks: Vec<Middleware> = self
            .inner
            .borrow()
            .middleware
            .iter()
            .map(|(_, hook)| Rc::clone(hook))
            .collect();
        for hook in hooks {
            if !hook(event) {
                debug!(event = %event.kind(), source = %event.source, "delivery cancelled by middleware");
                return false;
            }
        }
        true
    }

    // -----------------------------------------------------------------------
    // Publishing
    // -----------------------------------------------------------------------

    /// Publish synchronously.
    ///
    /// Returns `false` if middleware cancelled delivery. Handler failures are
    /// logged and do not stop sibling handlers.
    pub fn publish(&self, payload: GameEvent, source: &str) -> bool {
        let event = Event::new(payload, source);
        if !self.passes_middleware(&event) {
            return false;
        }
        self.inner.borrow_mut().record(&event);

        for (listener, once) in self.delivery_order(event.kind()) {
            if !self.claim(&listener, once) {
                continue;
            }
            match &listener.handler {
                HandlerFn::Sync(handler) => invoke_sync(handler, listener.id, &event),
                HandlerFn::Async(handler) => {
                    if let Some(future) = start_async(handler, listener.id, &event) {
                        self.inner.borrow_mut().pending.push(PendingCall {
                            kind: event.kind(),
                            listener: listener.id,
                            future,
                        });
                    }
                }
            }
        }
        true
    }

    /// Publish and await every async handler in priority order.
    pub async fn publish_async(&self, payload: GameEvent, source: &str) -> bool {
        let event = Event::new(payload, source);
        if !self.passes_middleware(&event) {
            return false;
        }
        self.inner.borrow_mut().record(&event);

        for (listener, once) in self.delivery_order(event.kind()) {
            if !self.claim(&listener, once) {
                continue;
            }
            match &listener.handler {
                HandlerFn::Sync(handler) => invoke_sync(handler, listener.id, &event),
                HandlerFn::Async(handler) => {
                    if let Some(future) = start_async(handler, listener.id, &event) {
                        report(event.kind(), listener.id, future.await);
                    }
                }
            }
        }
        true
    }

    /// Run async handlers queued by synchronous publishes, including any
    /// queued while flushing. Returns how many ran.
    pub async fn flush_pending(&self) -> usize {
        let mut ran = 0_usize;
        loop {
            let batch = std::mem::take(&mut self.inner.borrow_mut().pending);
            if batch.is_empty() {
                return ran;
            }
            for call in batch {
                report(call.kind, call.listener, call.future.await);
                ran = ran.saturating_add(1);
            }
        }
    }

    /// Async handler invocations waiting for [`Self::flush_pending`].
    pub fn pending_count(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// Listeners for `kind` in delivery order, flagged when registered once.
    fn delivery_order(&self, kind: EventKind) -> Vec<(Listener, bool)> {
        let inner = self.inner.borrow();
        let persistent = inner.listeners.get(&kind).cloned().unwrap_or_default();
        let once = inner.once_listeners.get(&kind).cloned().unwrap_or_default();
        let wildcard = inner.wildcard.clone();
        persistent
            .into_iter()
            .map(|l| (l, false))
            .chain(once.into_iter().map(|l| (l, true)))
            .chain(wildcard.into_iter().map(|l| (l, false)))
            .collect()
    }

    /// Whether `listener` should still run. A once-listener is removed here,
    /// so one unsubscribed earlier in the same delivery, or already fired by
    /// a nested publish, is skipped.
    fn claim(&self, listener: &Listener, once: bool) -> bool {
        if once {
            self.inner.borrow_mut().remove_listener(listener.id)
        } else {
            self.inner.borrow().is_registered(listener.id)
        }
    }

    // -----------------------------------------------------------------------
    // Management
    // -----------------------------------------------------------------------

    /// Persistent plus once-listeners registered for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        let inner = self.inner.borrow();
        let persistent = inner.listeners.get(&kind).map_or(0, Vec::len);
        let once = inner.once_listeners.get(&kind).map_or(0, Vec::len);
        persistent.saturating_add(once)
    }

    /// Wildcard listeners registered.
    pub fn wildcard_count(&self) -> usize {
        self.inner.borrow().wildcard.len()
    }

    /// Remove every listener for `kind`.
    pub fn remove_all(&self, kind: EventKind) {
        let mut inner = self.inner.borrow_mut();
        inner.listeners.remove(&kind);
        inner.once_listeners.remove(&kind);
    }

    /// Remove every listener, wildcard listener, and queued async call.
    /// Middleware and history are kept.
    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.listeners.clear();
        inner.once_listeners.clear();
        inner.wildcard.clear();
        inner.pending.clear();
    }

    /// Most recent delivered events, oldest first.
    pub fn recent_events(&self) -> Vec<Event> {
        self.inner.borrow().history.iter().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Invocation helpers
// ---------------------------------------------------------------------------

fn sync_handler<F>(handler: F) -> HandlerFn
where
    F: FnMut(&Event) -> HandlerResult + 'static,
{
    let handler: Rc<RefCell<SyncHandler>> = Rc::new(RefCell::new(handler));
    HandlerFn::Sync(handler)
}

fn async_handler<F, Fut>(mut handler: F) -> HandlerFn
where
    F: FnMut(&Event) -> Fut + 'static,
    Fut: Future<Output = HandlerResult> + 'static,
{
    let boxed = move |event: &Event| handler(event).boxed_local();
    let handler: Rc<RefCell<AsyncHandler>> = Rc::new(RefCell::new(boxed));
    HandlerFn::Async(handler)
}

fn invoke_sync(handler: &Rc<RefCell<SyncHandler>>, id: ListenerId, event: &Event) {
    let Ok(mut guard) = handler.try_borrow_mut() else {
        warn!(listener = %id, event = %event.kind(), "skipping re-entrant handler");
        return;
    };
    report(event.kind(), id, (&mut *guard)(event));
}

fn start_async(
    handler: &Rc<RefCell<AsyncHandler>>,
    id: ListenerId,
    event: &Event,
) -> Option<LocalBoxFuture<'static, HandlerResult>> {
    let Ok(mut guard) = handler.try_borrow_mut() else {
        warn!(listener = %id, event = %event.kind(), "skipping re-entrant handler");
        return None;
    };
    Some((&mut *guard)(event))
}

fn report(kind: EventKind, id: ListenerId, result: HandlerResult) {
    if let Err(err) = result {
        warn!(listener = %id, event = %kind, error = %err, "event handler failed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use glam::Vec3;
    use polarise_types::{MeterChangeDetails, PlayerMoveDetails};

    use super::*;
    use crate::listener::DEFAULT_PRIORITY;

    fn outrage(previous: f32, current: f32) -> GameEvent {
        GameEvent::GameOutrageChange(MeterChangeDetails { previous, current })
    }

    fn moved() -> GameEvent {
        GameEvent::PlayerMove(PlayerMoveDetails {
            position: Vec3::Y,
            direction: Vec3::X,
            distance: 0.1,
        })
    }

    #[test]
    fn handlers_run_in_priority_order() {
        let bus = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for priority in [90, 10, 50] {
            let order = Rc::clone(&order);
            bus.subscribe(EventKind::GameOutrageChange, priority, move |_| {
                order.borrow_mut().push(priority);
                Ok(())
            });
        }
        assert!(bus.publish(outrage(0.0, 1.0), "test"));
        assert_eq!(*order.borrow(), vec![10, 50, 90]);
    }

    #[test]
    fn once_listener_fires_exactly_once() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0_u32));
        let seen = Rc::clone(&count);
        bus.subscribe_once(EventKind::GameRestart, DEFAULT_PRIORITY, move |_| {
            seen.set(seen.get() + 1);
            Ok(())
        });
        for _ in 0..3 {
            bus.publish(GameEvent::GameRestart, "test");
        }
        assert_eq!(count.get(), 1);
        assert_eq!(bus.listener_count(EventKind::GameRestart), 0);
    }

    #[test]
    fn once_listener_unsubscribed_mid_delivery_does_not_run() {
        let bus = EventBus::new();
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        let once = bus.subscribe_once(EventKind::GameRestart, DEFAULT_PRIORITY, move |_| {
            flag.set(true);
            Ok(())
        });
        let removed = Rc::new(Cell::new(false));
        let seen = Rc::clone(&removed);
        bus.subscribe(EventKind::GameRestart, DEFAULT_PRIORITY, move |_| {
            seen.set(once.unsubscribe());
            Ok(())
        });

        bus.publish(GameEvent::GameRestart, "test");
        assert!(removed.get());
        assert!(!fired.get());
        assert_eq!(bus.listener_count(EventKind::GameRestart), 1);
    }

    #[test]
    fn once_listener_reached_by_nested_publish_fires_once() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0_u32));
        let inner_bus = bus.clone();
        let nested = Rc::new(Cell::new(false));
        bus.subscribe(EventKind::GameRestart, DEFAULT_PRIORITY, move |_| {
            if !nested.replace(true) {
                inner_bus.publish(GameEvent::GameRestart, "nested");
            }
            Ok(())
        });
        let seen = Rc::clone(&count);
        bus.subscribe_once(EventKind::GameRestart, DEFAULT_PRIORITY, move |_| {
            seen.set(seen.get() + 1);
            Ok(())
        });

        bus.publish(GameEvent::GameRestart, "test");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn persistent_listeners_run_before_once_listeners() {
        let bus = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let o1 = Rc::clone(&order);
        bus.subscribe_once(EventKind::GameRestart, 1, move |_| {
            o1.borrow_mut().push("once");
            Ok(())
        });
        let o2 = Rc::clone(&order);
        bus.subscribe(EventKind::GameRestart, 200, move |_| {
            o2.borrow_mut().push("persistent");
            Ok(())
        });
        let o3 = Rc::clone(&order);
        bus.subscribe_all(0, move |_| {
            o3.borrow_mut().push("wildcard");
            Ok(())
        });
        bus.publish(GameEvent::GameRestart, "test");
        assert_eq!(*order.borrow(), vec!["persistent", "once", "wildcard"]);
    }

    #[test]
    fn middleware_can_cancel_delivery() {
        let bus = EventBus::new();
        let delivered = Rc::new(Cell::new(false));
        let flag = Rc::clone(&delivered);
        bus.subscribe(EventKind::PlayerMove, DEFAULT_PRIORITY, move |_| {
            flag.set(true);
            Ok(())
        });
        let id = bus.add_middleware(|event| event.kind() != EventKind::PlayerMove);

        assert!(!bus.publish(moved(), "test"));
        assert!(!delivered.get());
        assert!(bus.recent_events().is_empty());

        assert!(bus.remove_middleware(id));
        assert!(bus.publish(moved(), "test"));
        assert!(delivered.get());
    }

    #[test]
    fn failing_handler_does_not_stop_siblings() {
        let bus = EventBus::new();
        let reached = Rc::new(Cell::new(false));
        bus.subscribe(EventKind::GameRestart, 1, |_| Err(anyhow::anyhow!("boom")));
        let flag = Rc::clone(&reached);
        bus.subscribe(EventKind::GameRestart, 2, move |_| {
            flag.set(true);
            Ok(())
        });
        assert!(bus.publish(GameEvent::GameRestart, "test"));
        assert!(reached.get());
    }

    #[test]
    fn unsubscribe_removes_listener() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0_u32));
        let seen = Rc::clone(&count);
        let sub = bus.subscribe(EventKind::GameRestart, DEFAULT_PRIORITY, move |_| {
            seen.set(seen.get() + 1);
            Ok(())
        });
        bus.publish(GameEvent::GameRestart, "test");
        assert!(sub.unsubscribe());
        assert!(!sub.unsubscribe());
        bus.publish(GameEvent::GameRestart, "test");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn nested_publish_skips_running_handler() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0_u32));
        let inner_bus = bus.clone();
        let seen = Rc::clone(&count);
        bus.subscribe(EventKind::GameRestart, DEFAULT_PRIORITY, move |_| {
            seen.set(seen.get() + 1);
            inner_bus.publish(GameEvent::GameRestart, "nested");
            Ok(())
        });
        bus.publish(GameEvent::GameRestart, "test");
        assert_eq!(count.get(), 1);
        assert_eq!(bus.recent_events().len(), 2);
    }

    #[test]
    fn remove_all_and_clear() {
        let bus = EventBus::new();
        bus.subscribe(EventKind::PlayerMove, 1, |_| Ok(()));
        bus.subscribe_once(EventKind::PlayerMove, 1, |_| Ok(()));
        bus.subscribe(EventKind::GameOver, 1, |_| Ok(()));
        bus.subscribe_all(1, |_| Ok(()));
        assert_eq!(bus.listener_count(EventKind::PlayerMove), 2);

        bus.remove_all(EventKind::PlayerMove);
        assert_eq!(bus.listener_count(EventKind::PlayerMove), 0);
        assert_eq!(bus.listener_count(EventKind::GameOver), 1);

        bus.clear();
        assert_eq!(bus.listener_count(EventKind::GameOver), 0);
        assert_eq!(bus.wildcard_count(), 0);
    }

    #[test]
    fn history_is_bounded() {
        let bus = EventBus::with_history_limit(3);
        for i in 0..5_u8 {
            bus.publish(outrage(0.0, f32::from(i)), "test");
        }
        let recent = bus.recent_events();
        assert_eq!(recent.len(), 3);
        let first = recent.first().map(|e| e.payload.clone());
        assert_eq!(first, Some(outrage(0.0, 2.0)));
    }

    #[tokio::test]
    async fn sync_publish_queues_async_handlers() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0_u32));
        let seen = Rc::clone(&count);
        bus.subscribe_async(EventKind::GameRestart, DEFAULT_PRIORITY, move |_| {
            let seen = Rc::clone(&seen);
            async move {
                tokio::task::yield_now().await;
                seen.set(seen.get() + 1);
                Ok(())
            }
        });
        bus.publish(GameEvent::GameRestart, "test");
        bus.publish(GameEvent::GameRestart, "test");
        assert_eq!(count.get(), 0);
        assert_eq!(bus.pending_count(), 2);

        assert_eq!(bus.flush_pending().await, 2);
        assert_eq!(count.get(), 2);
    }

    #[tokio::test]
    async fn async_once_listener_fires_exactly_once() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0_u32));
        let seen = Rc::clone(&count);
        bus.subscribe_once_async(EventKind::GameRestart, DEFAULT_PRIORITY, move |_| {
            let seen = Rc::clone(&seen);
            async move {
                tokio::task::yield_now().await;
                seen.set(seen.get() + 1);
                Ok(())
            }
        });

        bus.publish(GameEvent::GameRestart, "test");
        bus.publish(GameEvent::GameRestart, "test");
        assert_eq!(bus.pending_count(), 1);
        assert_eq!(bus.flush_pending().await, 1);
        assert!(bus.publish_async(GameEvent::GameRestart, "test").await);
        assert_eq!(count.get(), 1);
        assert_eq!(bus.listener_count(EventKind::GameRestart), 0);
    }

    #[tokio::test]
    async fn publish_async_awaits_in_priority_order() {
        let bus = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for priority in [30, 10, 20] {
            let order = Rc::clone(&order);
            bus.subscribe_async(EventKind::GameOver, priority, move |_| {
                let order = Rc::clone(&order);
                async move {
                    tokio::task::yield_now().await;
                    order.borrow_mut().push(priority);
                    Ok(())
                }
            });
        }
        let o = Rc::clone(&order);
        bus.subscribe(EventKind::GameOver, 15, move |_| {
            o.borrow_mut().push(15);
            Ok(())
        });
        let payload = GameEvent::GameOver(polarise_types::GameOverDetails {
            reason: polarise_types::GameOverReason::Caught,
            score: 0.0,
            game_time: 0.0,
            polarised_people: 0,
        });
        assert!(bus.publish_async(payload, "test").await);
        assert_eq!(*order.borrow(), vec![10, 15, 20, 30]);
        assert_eq!(bus.pending_count(), 0);
    }
}
