use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::entity::{CollectionGroup, UserSettings};
use crate::error::{PlaytabError, Result};
use crate::sync::{CollectionRow, CollectionsCallback, RemoteStore, Subscription};

struct Subscriber {
    id: u64,
    user_id: String,
    callback: Arc<CollectionsCallback>,
}

#[derive(Default)]
struct RemoteState {
    user: Option<String>,
    collections: HashMap<String, Vec<CollectionRow>>,
    settings: HashMap<String, UserSettings>,
    subscribers: Vec<Subscriber>,
    next_subscriber_id: u64,
}

/// In-process remote backend. Rows are held per user with immediate
/// change notification; doubles as the test double for the reconciler.
#[derive(Default)]
pub struct MemoryRemote {
    state: Arc<Mutex<RemoteState>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Establish a session. Stands in for a real authentication flow.
    pub fn sign_in(&self, user_id: &str) {
        let mut state = self.state.lock().expect("remote state lock poisoned");
        state.user = Some(user_id.to_string());
    }

    pub fn sign_out(&self) {
        let mut state = self.state.lock().expect("remote state lock poisoned");
        state.user = None;
    }

    fn authenticated_user(&self) -> Result<String> {
        let state = self.state.lock().expect("remote state lock poisoned");
        state.user.clone().ok_or(PlaytabError::AuthRequired)
    }

    /// Snapshot the user's rows and their subscribers, then notify outside
    /// the lock so a callback may call back into the remote.
    fn notify(&self, user_id: &str) {
        let (groups, callbacks): (Vec<CollectionGroup>, Vec<Arc<CollectionsCallback>>) = {
            let state = self.state.lock().expect("remote state lock poisoned");
            let groups = state
                .collections
                .get(user_id)
                .map(|rows| rows.iter().cloned().map(CollectionRow::into_group).collect())
                .unwrap_or_default();
            let callbacks = state
                .subscribers
                .iter()
                .filter(|s| s.user_id == user_id)
                .map(|s| Arc::clone(&s.callback))
                .collect();
            (groups, callbacks)
        };

        for callback in callbacks {
            callback(groups.clone());
        }
    }
}

impl RemoteStore for MemoryRemote {
    fn current_user(&self) -> Result<Option<String>> {
        let state = self.state.lock().expect("remote state lock poisoned");
        Ok(state.user.clone())
    }

    fn push_collections(&self, collections: &[CollectionGroup]) -> Result<()> {
        let user = self.authenticated_user()?;
        {
            let mut state = self.state.lock().expect("remote state lock poisoned");
            let rows = state.collections.entry(user.clone()).or_default();
            for group in collections {
                let row = CollectionRow::from_group(&user, group);
                match rows.iter_mut().find(|r| r.id == row.id) {
                    Some(slot) => *slot = row,
                    None => rows.push(row),
                }
            }
        }
        self.notify(&user);
        Ok(())
    }

    fn pull_collections(&self) -> Result<Vec<CollectionGroup>> {
        let user = self.authenticated_user()?;
        let state = self.state.lock().expect("remote state lock poisoned");
        Ok(state
            .collections
            .get(&user)
            .map(|rows| rows.iter().cloned().map(CollectionRow::into_group).collect())
            .unwrap_or_default())
    }

    fn delete_collection(&self, collection_id: &str) -> Result<()> {
        let user = self.authenticated_user()?;
        {
            let mut state = self.state.lock().expect("remote state lock poisoned");
            if let Some(rows) = state.collections.get_mut(&user) {
                rows.retain(|r| r.id != collection_id);
            }
        }
        self.notify(&user);
        Ok(())
    }

    fn push_settings(&self, settings: &UserSettings) -> Result<()> {
        let user = self.authenticated_user()?;
        let mut state = self.state.lock().expect("remote state lock poisoned");
        state.settings.insert(user, *settings);
        Ok(())
    }

    fn pull_settings(&self) -> Result<Option<UserSettings>> {
        let user = self.authenticated_user()?;
        let state = self.state.lock().expect("remote state lock poisoned");
        Ok(state.settings.get(&user).copied())
    }

    fn subscribe_collections(
        &self,
        user_id: &str,
        callback: CollectionsCallback,
    ) -> Result<Subscription> {
        let subscriber_id = {
            let mut state = self.state.lock().expect("remote state lock poisoned");
            let id = state.next_subscriber_id;
            state.next_subscriber_id += 1;
            state.subscribers.push(Subscriber {
                id,
                user_id: user_id.to_string(),
                callback: Arc::new(callback),
            });
            id
        };

        let state = Arc::clone(&self.state);
        Ok(Subscription::new(move || {
            let mut state = state.lock().expect("remote state lock poisoned");
            state.subscribers.retain(|s| s.id != subscriber_id);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn collection(id: &str) -> CollectionGroup {
        CollectionGroup {
            id: id.to_string(),
            title: format!("collection {id}"),
            space_id: "s1".to_string(),
            items: Vec::new(),
            is_open: true,
        }
    }

    #[test]
    fn test_calls_without_session_fail() {
        let remote = MemoryRemote::new();
        assert!(matches!(
            remote.pull_collections(),
            Err(PlaytabError::AuthRequired)
        ));
        assert!(matches!(
            remote.push_collections(&[collection("k1")]),
            Err(PlaytabError::AuthRequired)
        ));
    }

    #[test]
    fn test_rows_are_scoped_per_user() {
        let remote = MemoryRemote::new();

        remote.sign_in("alice");
        remote.push_collections(&[collection("k1")]).unwrap();

        remote.sign_in("bob");
        assert!(remote.pull_collections().unwrap().is_empty());
        remote.push_collections(&[collection("k2")]).unwrap();

        remote.sign_in("alice");
        let pulled = remote.pull_collections().unwrap();
        assert_eq!(pulled.len(), 1);
        assert_eq!(pulled[0].id, "k1");
    }

    #[test]
    fn test_delete_collection_removes_row() {
        let remote = MemoryRemote::new();
        remote.sign_in("alice");
        remote
            .push_collections(&[collection("k1"), collection("k2")])
            .unwrap();

        remote.delete_collection("k1").unwrap();

        let pulled = remote.pull_collections().unwrap();
        assert_eq!(pulled.len(), 1);
        assert_eq!(pulled[0].id, "k2");
    }

    #[test]
    fn test_settings_roundtrip() {
        let remote = MemoryRemote::new();
        remote.sign_in("alice");
        assert!(remote.pull_settings().unwrap().is_none());

        let mut settings = UserSettings::default();
        settings.enable_tab_groups = true;
        remote.push_settings(&settings).unwrap();

        assert_eq!(remote.pull_settings().unwrap(), Some(settings));
    }

    #[test]
    fn test_subscription_fires_on_change_and_stops_after_unsubscribe() {
        let remote = MemoryRemote::new();
        remote.sign_in("alice");

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let subscription = {
            let calls = Arc::clone(&calls);
            let seen = Arc::clone(&seen);
            remote
                .subscribe_collections(
                    "alice",
                    Box::new(move |collections| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        *seen.lock().unwrap() = collections;
                    }),
                )
                .unwrap()
        };

        remote.push_collections(&[collection("k1")]).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(seen.lock().unwrap().len(), 1);

        subscription.unsubscribe();
        remote.push_collections(&[collection("k2")]).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_ignores_other_users() {
        let remote = MemoryRemote::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let _subscription = {
            let calls = Arc::clone(&calls);
            remote
                .subscribe_collections(
                    "alice",
                    Box::new(move |_| {
                        calls.fetch_add(1, Ordering::SeqCst);
                    }),
                )
                .unwrap()
        };

        remote.sign_in("bob");
        remote.push_collections(&[collection("k1")]).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
