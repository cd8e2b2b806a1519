//! Event bus
//!
//! A synchronous publish/subscribe broker:
//! - delivery happens on the publishing call stack, in subscription order
//! - wildcard subscribers see every event before kind subscribers do
//! - handlers added during a dispatch do not receive that dispatch
//! - handlers may publish, subscribe and unsubscribe from inside a dispatch
//!
//! The lock is never held while a handler runs.

use crate::events::{BusEvent, EventKind, EventSource, PlayerEvent};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::trace;

/// Which events a subscription receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFilter {
    /// Every event, main and ad
    All,
    /// One kind on one channel
    Kind { kind: EventKind, source: EventSource },
}

impl EventFilter {
    /// Main-content channel of `kind`
    pub fn main(kind: EventKind) -> Self {
        EventFilter::Kind {
            kind,
            source: EventSource::Main,
        }
    }

    /// Ad channel of `kind`
    pub fn ad(kind: EventKind) -> Self {
        EventFilter::Kind {
            kind,
            source: EventSource::Ad,
        }
    }

    /// Filter for a public channel name such as `adpause`, or `*` for all
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "*" {
            return Some(EventFilter::All);
        }
        EventKind::parse_channel(name).map(|(kind, source)| EventFilter::Kind { kind, source })
    }

    pub fn matches(&self, event: &BusEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Kind { kind, source } => event.kind() == *kind && event.source == *source,
        }
    }
}

/// Identifier of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&BusEvent) + Send + Sync>;

struct Entry {
    id: SubscriptionId,
    filter: EventFilter,
    handler: Handler,
    once: bool,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    entries: Vec<Entry>,
}

/// Shared event bus. Clones publish to and subscribe on the same bus.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Inner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish a main-content event
    pub fn emit(&self, event: PlayerEvent) {
        self.publish(BusEvent::main(event));
    }

    /// Publish an event on the channel of `source`
    pub fn emit_from(&self, source: EventSource, event: PlayerEvent) {
        self.publish(BusEvent::new(source, event));
    }

    pub fn publish(&self, event: BusEvent) {
        let snapshot: Vec<(SubscriptionId, Handler, bool)> = {
            let mut inner = self.lock();
            let wildcard = inner
                .entries
                .iter()
                .filter(|entry| entry.filter == EventFilter::All);
            let specific = inner
                .entries
                .iter()
                .filter(|entry| entry.filter != EventFilter::All && entry.filter.matches(&event));
            let snapshot: Vec<_> = wildcard
                .chain(specific)
                .map(|entry| (entry.id, Arc::clone(&entry.handler), entry.once))
                .collect();

            // one-shot handlers leave before anything runs, so re-entrant
            // publishes cannot fire them twice
            inner
                .entries
                .retain(|entry| !(entry.once && snapshot.iter().any(|(id, _, _)| *id == entry.id)));
            snapshot
        };

        trace!(event = %event, handlers = snapshot.len(), "Dispatching event");

        for (id, handler, once) in snapshot {
            if once || self.is_subscribed(id) {
                handler(&event);
            }
        }
    }

    /// Call `handler` for every matching event until unsubscribed
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> Subscription
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        self.add(filter, Arc::new(handler), false)
    }

    /// Call `handler` for the next matching event only
    pub fn once<F>(&self, filter: EventFilter, handler: F) -> Subscription
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        self.add(filter, Arc::new(handler), true)
    }

    fn add(&self, filter: EventFilter, handler: Handler, once: bool) -> Subscription {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);
        inner.entries.push(Entry {
            id,
            filter,
            handler,
            once,
        });
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Returns false when the subscription was already gone
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|entry| entry.id != id);
        inner.entries.len() != before
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.lock().entries.iter().any(|entry| entry.id == id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().entries.len()
    }

    /// Drop every subscription
    pub fn clear(&self) {
        self.lock().entries.clear();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Handle returned by [`EventBus::subscribe`]. Dropping it keeps the subscription.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: SubscriptionId,
    bus: Weak<Mutex<Inner>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Remove the handler from the bus
    pub fn unsubscribe(&self) -> bool {
        match self.bus.upgrade() {
            Some(inner) => EventBus { inner }.unsubscribe(self.id),
            None => false,
        }
    }
}

/// Subscription that queues events for later processing
#[derive(Debug)]
pub struct Inbox {
    queue: Arc<Mutex<std::collections::VecDeque<BusEvent>>>,
    subscription: Subscription,
}

impl Inbox {
    /// Queue every event published on `bus`
    pub fn attach(bus: &EventBus) -> Self {
        let queue: Arc<Mutex<std::collections::VecDeque<BusEvent>>> = Arc::default();
        let sink = Arc::clone(&queue);
        let subscription = bus.subscribe(EventFilter::All, move |event| {
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_back(event.clone());
        });
        Self { queue, subscription }
    }

    /// Oldest queued event
    pub fn pop(&self) -> Option<BusEvent> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    pub fn clear(&self) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn detach(&self) {
        self.subscription.unsubscribe();
        self.clear();
    }
}

impl Drop for Inbox {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}
