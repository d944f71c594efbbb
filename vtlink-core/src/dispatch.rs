//! Ordered subscriber lists for the four user-input event kinds.
//!
//! Registration order is delivery order. Duplicate registrations are
//! allowed; removal takes the first entry with the matching id. Delivery
//! snapshots the list first, so a handler may register or remove
//! subscriptions (including its own) without disturbing the in-flight
//! round.
//!
//! Handlers that want to issue follow-up commands capture a handle to the
//! client themselves (a `Weak` avoids a reference cycle); dispatch happens
//! outside the client's lock, so re-entrant sends are safe.

use std::sync::Arc;

use crate::codec::event::{KeyEvent, PointingEvent, SelectInputEvent};

/// Handle returned by a registration; used to remove the subscription.
pub type SubscriptionId = u64;

pub type KeyEventCallback = Arc<dyn Fn(&KeyEvent) + Send + Sync>;
pub type PointingEventCallback = Arc<dyn Fn(&PointingEvent) + Send + Sync>;
pub type SelectInputEventCallback = Arc<dyn Fn(&SelectInputEvent) + Send + Sync>;

struct Entry<T> {
    id: SubscriptionId,
    callback: T,
}

/// The four independent subscriber lists.
pub struct EventDispatcher {
    next_id: SubscriptionId,
    soft_key: Vec<Entry<KeyEventCallback>>,
    button: Vec<Entry<KeyEventCallback>>,
    pointing: Vec<Entry<PointingEventCallback>>,
    select_input: Vec<Entry<SelectInputEventCallback>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            soft_key: Vec::new(),
            button: Vec::new(),
            pointing: Vec::new(),
            select_input: Vec::new(),
        }
    }

    fn next_id(&mut self) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // ── Registration ─────────────────────────────────────────────

    pub fn add_soft_key(&mut self, callback: KeyEventCallback) -> SubscriptionId {
        let id = self.next_id();
        self.soft_key.push(Entry { id, callback });
        id
    }

    pub fn add_button(&mut self, callback: KeyEventCallback) -> SubscriptionId {
        let id = self.next_id();
        self.button.push(Entry { id, callback });
        id
    }

    pub fn add_pointing(&mut self, callback: PointingEventCallback) -> SubscriptionId {
        let id = self.next_id();
        self.pointing.push(Entry { id, callback });
        id
    }

    pub fn add_select_input(&mut self, callback: SelectInputEventCallback) -> SubscriptionId {
        let id = self.next_id();
        self.select_input.push(Entry { id, callback });
        id
    }

    // ── Removal ──────────────────────────────────────────────────

    pub fn remove_soft_key(&mut self, id: SubscriptionId) -> bool {
        remove_first(&mut self.soft_key, id)
    }

    pub fn remove_button(&mut self, id: SubscriptionId) -> bool {
        remove_first(&mut self.button, id)
    }

    pub fn remove_pointing(&mut self, id: SubscriptionId) -> bool {
        remove_first(&mut self.pointing, id)
    }

    pub fn remove_select_input(&mut self, id: SubscriptionId) -> bool {
        remove_first(&mut self.select_input, id)
    }

    // ── Snapshots (delivery order) ───────────────────────────────

    pub fn soft_key_handlers(&self) -> Vec<KeyEventCallback> {
        self.soft_key.iter().map(|e| Arc::clone(&e.callback)).collect()
    }

    pub fn button_handlers(&self) -> Vec<KeyEventCallback> {
        self.button.iter().map(|e| Arc::clone(&e.callback)).collect()
    }

    pub fn pointing_handlers(&self) -> Vec<PointingEventCallback> {
        self.pointing.iter().map(|e| Arc::clone(&e.callback)).collect()
    }

    pub fn select_input_handlers(&self) -> Vec<SelectInputEventCallback> {
        self.select_input
            .iter()
            .map(|e| Arc::clone(&e.callback))
            .collect()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn remove_first<T>(entries: &mut Vec<Entry<T>>, id: SubscriptionId) -> bool {
    match entries.iter().position(|e| e.id == id) {
        Some(pos) => {
            entries.remove(pos);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeyActivationCode;
    use std::sync::Mutex;

    fn key_event() -> KeyEvent {
        KeyEvent {
            activation: KeyActivationCode::ButtonPressedOrLatched,
            object_id: 1,
            parent_object_id: 2,
            key_number: 3,
        }
    }

    #[test]
    fn delivery_follows_registration_order() {
        let mut dispatcher = EventDispatcher::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            dispatcher.add_soft_key(Arc::new(move |_| order.lock().unwrap().push(tag)));
        }

        let event = key_event();
        for handler in dispatcher.soft_key_handlers() {
            handler(&event);
        }
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn duplicate_registration_delivers_twice() {
        let mut dispatcher = EventDispatcher::new();
        let count = Arc::new(Mutex::new(0u32));
        let counter: KeyEventCallback = {
            let count = Arc::clone(&count);
            Arc::new(move |_| *count.lock().unwrap() += 1)
        };

        let first = dispatcher.add_button(Arc::clone(&counter));
        let second = dispatcher.add_button(counter);
        assert_ne!(first, second);

        let event = key_event();
        for handler in dispatcher.button_handlers() {
            handler(&event);
        }
        assert_eq!(*count.lock().unwrap(), 2);

        // Removing one id leaves the other registration in place.
        assert!(dispatcher.remove_button(first));
        assert!(!dispatcher.remove_button(first));
        assert_eq!(dispatcher.button_handlers().len(), 1);
    }

    #[test]
    fn removal_during_dispatch_does_not_affect_snapshot() {
        let mut dispatcher = EventDispatcher::new();
        let hits = Arc::new(Mutex::new(0u32));
        for _ in 0..3 {
            let hits = Arc::clone(&hits);
            dispatcher.add_pointing(Arc::new(move |_| *hits.lock().unwrap() += 1));
        }

        let snapshot = dispatcher.pointing_handlers();
        // All subscriptions vanish mid-round; the snapshot still delivers.
        dispatcher.remove_pointing(1);
        dispatcher.remove_pointing(2);
        dispatcher.remove_pointing(3);
        assert!(dispatcher.pointing_handlers().is_empty());

        let event = PointingEvent {
            activation: KeyActivationCode::ButtonPressedOrLatched,
            x: 0,
            y: 0,
        };
        for handler in snapshot {
            handler(&event);
        }
        assert_eq!(*hits.lock().unwrap(), 3);
    }

    #[test]
    fn lists_are_independent() {
        let mut dispatcher = EventDispatcher::new();
        let id = dispatcher.add_select_input(Arc::new(|_| {}));
        assert!(!dispatcher.remove_soft_key(id));
        assert!(dispatcher.remove_select_input(id));
    }
}
