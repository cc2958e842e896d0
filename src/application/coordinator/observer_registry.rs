//! Weakly held observer set

use crate::domain::call::{CallEvent, CallObserver};
use std::sync::{Arc, Weak};
use tracing::trace;

/// Stable identity of an observer: the address of its allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ObserverKey(usize);

impl ObserverKey {
    pub(crate) fn of<O: ?Sized>(observer: &Arc<O>) -> Self {
        Self(Arc::as_ptr(observer).cast::<()>() as usize)
    }
}

struct ObserverSlot {
    key: ObserverKey,
    observer: Weak<dyn CallObserver>,
}

impl ObserverSlot {
    fn is_alive(&self) -> bool {
        self.observer.strong_count() > 0
    }
}

/// Observers in registration order. Holds no strong references: a dropped
/// observer is skipped on the next fan-out and swept afterwards.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    slots: Vec<ObserverSlot>,
}

impl ObserverRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register an observer. Returns `false` if it is already registered.
    pub(crate) fn insert(&mut self, key: ObserverKey, observer: Weak<dyn CallObserver>) -> bool {
        if self
            .slots
            .iter()
            .any(|slot| slot.key == key && slot.is_alive())
        {
            return false;
        }
        // A dead slot may share the address of a new allocation
        self.slots.retain(|slot| slot.key != key);
        self.slots.push(ObserverSlot { key, observer });
        true
    }

    pub(crate) fn remove(&mut self, key: ObserverKey) -> bool {
        let before = self.slots.len();
        self.slots.retain(|slot| slot.key != key);
        before != self.slots.len()
    }

    /// Number of slots, including dead ones not yet swept
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Live observers, in registration order
    pub(crate) fn snapshot(&self) -> Vec<Arc<dyn CallObserver>> {
        self.slots
            .iter()
            .filter_map(|slot| slot.observer.upgrade())
            .collect()
    }

    /// Deliver `event` to every live observer, then sweep dead slots.
    /// Returns how many observers received it.
    pub(crate) fn notify(&mut self, event: &CallEvent) -> usize {
        let observers = self.snapshot();
        for observer in &observers {
            event.deliver_to(observer.as_ref());
        }

        let swept = self.sweep();
        if swept > 0 {
            trace!("Pruned {} dropped observer(s)", swept);
        }
        observers.len()
    }

    fn sweep(&mut self) -> usize {
        let before = self.slots.len();
        self.slots.retain(ObserverSlot::is_alive);
        before - self.slots.len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::call::Call;
    use crate::domain::shared::value_objects::CallId;
    use std::sync::Mutex;

    /// Observer that records every callback as `"<event>:<call id>"`
    #[derive(Default)]
    pub(crate) struct RecordingObserver {
        pub(crate) events: Mutex<Vec<String>>,
    }

    impl RecordingObserver {
        pub(crate) fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn record(&self, name: &str, call: &Call) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{}:{}", name, call.id()));
        }
    }

    impl CallObserver for RecordingObserver {
        fn on_call_received(&self, call: &Call) {
            self.record("received", call);
        }

        fn on_call_initiated(&self, call: &Call) {
            self.record("initiated", call);
        }

        fn on_call_ended(&self, call: &Call) {
            self.record("ended", call);
        }

        fn on_mute_state_changed(&self, call: &Call) {
            self.record("muted", call);
        }

        fn on_audio_session_changed(&self, active: bool) {
            self.events
                .lock()
                .unwrap()
                .push(format!("audio:{}", active));
        }
    }

    fn register(registry: &mut ObserverRegistry, observer: &Arc<RecordingObserver>) -> bool {
        let weak = Arc::downgrade(observer) as Weak<dyn CallObserver>;
        registry.insert(ObserverKey::of(observer), weak)
    }

    fn ended_event() -> CallEvent {
        CallEvent::Ended(Call::outgoing(CallId::new(), "room-7"))
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut registry = ObserverRegistry::new();
        let observer = Arc::new(RecordingObserver::default());

        assert!(register(&mut registry, &observer));
        assert!(!register(&mut registry, &observer));
        assert_eq!(registry.len(), 1);

        assert_eq!(registry.notify(&ended_event()), 1);
        assert_eq!(observer.events().len(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut registry = ObserverRegistry::new();
        let observer = Arc::new(RecordingObserver::default());
        register(&mut registry, &observer);

        assert!(registry.remove(ObserverKey::of(&observer)));
        assert!(!registry.remove(ObserverKey::of(&observer)));

        assert_eq!(registry.notify(&ended_event()), 0);
        assert!(observer.events().is_empty());
    }

    #[test]
    fn test_dropped_observer_is_skipped_and_pruned() {
        let mut registry = ObserverRegistry::new();
        let kept = Arc::new(RecordingObserver::default());
        let dropped = Arc::new(RecordingObserver::default());
        register(&mut registry, &kept);
        register(&mut registry, &dropped);
        drop(dropped);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.notify(&ended_event()), 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(kept.events().len(), 1);
    }

    #[test]
    fn test_fan_out_in_registration_order() {
        let mut registry = ObserverRegistry::new();
        let first = Arc::new(RecordingObserver::default());
        let second = Arc::new(RecordingObserver::default());
        register(&mut registry, &first);
        register(&mut registry, &second);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(ObserverKey::of(&snapshot[0]), ObserverKey::of(&first));
        assert_eq!(ObserverKey::of(&snapshot[1]), ObserverKey::of(&second));

        registry.notify(&CallEvent::AudioSessionChanged { active: true });
        assert_eq!(first.events(), vec!["audio:true".to_string()]);
        assert_eq!(second.events(), vec!["audio:true".to_string()]);
    }
}
