//! Bounded session registry with idle expiry
//!
//! An [`LruCache`] behind a tokio mutex. Every lookup marks its entry
//! active; inserting a new key into a full registry evicts the least
//! recently used entry, and [`SessionRegistry::sweep_idle`] drops entries
//! nobody has touched within the idle timeout.

use lru::LruCache;
use std::borrow::Borrow;
use std::fmt::Debug;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

struct Entry<V> {
    value: V,
    last_active: Instant,
}

pub struct SessionRegistry<K: Hash + Eq, V> {
    entries: Arc<Mutex<LruCache<K, Entry<V>>>>,
}

impl<K: Hash + Eq, V> Clone for SessionRegistry<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<K, V> SessionRegistry<K, V>
where
    K: Hash + Eq + Clone + Debug,
    V: Clone,
{
    /// Registry holding at most `capacity` entries (never less than one)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    pub async fn capacity(&self) -> usize {
        self.entries.lock().await.cap().get()
    }

    /// Insert or replace `key`; returns whether an entry was replaced
    pub async fn insert(&self, key: K, value: V) -> bool {
        let entry = Entry {
            value,
            last_active: Instant::now(),
        };
        let mut entries = self.entries.lock().await;
        match entries.push(key.clone(), entry) {
            Some((old_key, _)) if old_key == key => true,
            Some((evicted, _)) => {
                debug!(key = ?evicted, capacity = entries.cap().get(), "Evicted least recently used session");
                false
            }
            None => false,
        }
    }

    /// Value for `key`, marking it active
    pub async fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut entries = self.entries.lock().await;
        entries.get_mut(key).map(|entry| {
            entry.last_active = Instant::now();
            entry.value.clone()
        })
    }

    pub async fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.lock().await.pop(key).map(|entry| entry.value)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Drop entries idle for longer than `idle`; returns how many went
    pub async fn sweep_idle(&self, idle: Duration) -> usize {
        self.sweep_idle_at(Instant::now(), idle).await
    }

    /// [`Self::sweep_idle`] as seen from `now`
    pub async fn sweep_idle_at(&self, now: Instant, idle: Duration) -> usize {
        let mut entries = self.entries.lock().await;
        let expired: Vec<K> = entries
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.last_active) > idle)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            entries.pop(key);
        }
        expired.len()
    }
}
