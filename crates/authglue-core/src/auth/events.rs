use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::UserProfile;

/// Payload delivered to subscribers after the stored profile changed.
#[derive(Debug, Clone, PartialEq)]
pub struct UserInfoUpdated {
    pub new_user_info: UserProfile,
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&UserInfoUpdated) + Send + Sync>;

/// Registry of `UserInfoUpdated` listeners.
#[derive(Default)]
pub struct Listeners {
    next_id: AtomicU64,
    entries: Mutex<Vec<(SubscriptionId, Listener)>>,
}

impl Listeners {
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&UserInfoUpdated) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries().push((id, Arc::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call every listener in subscription order. The lock is released first,
    /// so listeners may subscribe, unsubscribe or read the store.
    pub fn emit(&self, event: &UserInfoUpdated) {
        let snapshot: Vec<Listener> = self
            .entries()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    fn entries(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Listener)>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str) -> UserInfoUpdated {
        UserInfoUpdated {
            new_user_info: UserProfile::new(name),
        }
    }

    #[test]
    fn test_emit_in_order_and_unsubscribe() {
        let listeners = Listeners::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = {
            let seen = Arc::clone(&seen);
            listeners.subscribe(move |e| {
                let name = e.new_user_info.username().unwrap_or_default();
                seen.lock().unwrap().push(format!("1:{name}"));
            })
        };
        {
            let seen = Arc::clone(&seen);
            listeners.subscribe(move |e| {
                let name = e.new_user_info.username().unwrap_or_default();
                seen.lock().unwrap().push(format!("2:{name}"));
            });
        }

        listeners.emit(&event("bob"));
        assert!(listeners.unsubscribe(first));
        assert!(!listeners.unsubscribe(first));
        listeners.emit(&event("carol"));

        assert_eq!(*seen.lock().unwrap(), vec!["1:bob", "2:bob", "2:carol"]);
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn test_listener_can_unsubscribe_during_emit() {
        let listeners = Arc::new(Listeners::default());
        let id_slot = Arc::new(Mutex::new(None));

        let id = {
            let handle = Arc::clone(&listeners);
            let id_slot = Arc::clone(&id_slot);
            listeners.subscribe(move |_| {
                if let Some(id) = id_slot.lock().unwrap().take() {
                    handle.unsubscribe(id);
                }
            })
        };
        *id_slot.lock().unwrap() = Some(id);

        listeners.emit(&event("bob"));
        assert!(listeners.is_empty());
    }
}
