//! In-process event bus: synchronous, single-threaded fan-out to
//! subscribers, either filtered to one event kind or registered for any.
//! A panicking subscriber is caught and logged rather than propagated, so
//! one misbehaving subscriber never blocks its siblings or the mutation
//! that triggered the event.

use kgraph_core::{Event, EventSink};
use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

struct Subscriber {
    kind: Option<&'static str>,
    handler: Handler,
}

/// Fan-out dispatcher. [`kgraph_storage::AppendOnlyStore::set_event_sink`]
/// publishes into this; any number of subscribers (the index/TF-IDF updater,
/// the cache invalidator, or a caller's own hook) receive events in
/// registration order.
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<Vec<Subscriber>>,
}

impl EventBus {
    pub fn new() -> Arc<Self> {
        Arc::new(EventBus::default())
    }

    /// Registers `handler` for events of `kind` (see [`Event::kind`]), or for
    /// every event when `kind` is `None`.
    pub fn subscribe(&self, kind: Option<&'static str>, handler: impl Fn(&Event) + Send + Sync + 'static) {
        self.subscribers.write().push(Subscriber { kind, handler: Arc::new(handler) });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl EventSink for EventBus {
    fn publish(&self, event: Event) {
        let subscribers = self.subscribers.read();
        for sub in subscribers.iter() {
            if sub.kind.is_some_and(|k| k != event.kind()) {
                continue;
            }
            let handler = sub.handler.clone();
            let outcome = catch_unwind(AssertUnwindSafe(|| handler(&event)));
            if outcome.is_err() {
                tracing::error!(kind = event.kind(), "event subscriber panicked; ignoring");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgraph_core::Entity;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn created(name: &str) -> Event {
        Event::EntityCreated(Arc::new(Entity::new(name, "person", vec![])))
    }

    #[test]
    fn any_subscriber_sees_every_event() {
        let bus = EventBus::default();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        bus.subscribe(None, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        bus.publish(created("Alice"));
        bus.publish(Event::GraphSaved { entity_count: 1, relation_count: 0 });
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn filtered_subscriber_ignores_other_kinds() {
        let bus = EventBus::default();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        bus.subscribe(Some("entity:created"), move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        bus.publish(Event::GraphSaved { entity_count: 0, relation_count: 0 });
        bus.publish(created("Alice"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_subscriber_does_not_block_others() {
        let bus = EventBus::default();
        bus.subscribe(None, |_| panic!("boom"));
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        bus.subscribe(None, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        bus.publish(created("Alice"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
