//! Per-session figure storage
//!
//! Earlier revisions kept the two most recent charts in a process-wide
//! list, so concurrent users could read each other's uploads. Every
//! session now owns one store entry, keyed by a Uuid carried in its
//! cookie session. Entries expire after a TTL and the map is capped, with
//! the oldest entry evicted first.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::figure::Figure;

/// How long stored figures outlive the upload that produced them
pub const FIGURE_TTL: Duration = Duration::from_secs(30 * 60);

/// Upper bound on concurrently stored figure sets
pub const MAX_ENTRIES: usize = 256;

#[derive(Debug)]
struct FigureEntry {
    figures: Vec<Figure>,
    stored_at: Instant,
}

/// Cloneable handle to the shared figure map
#[derive(Debug, Clone)]
pub struct FigureStore {
    entries: Arc<RwLock<HashMap<Uuid, FigureEntry>>>,
    ttl: Duration,
    capacity: usize,
}

impl Default for FigureStore {
    fn default() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl: FIGURE_TTL,
            capacity: MAX_ENTRIES,
        }
    }
}

impl FigureStore {
    /// Store with the default TTL and capacity
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the entry TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Override the entry capacity
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Store a session's figures, replacing any previous entry under the
    /// same key, then drop expired entries and enforce the capacity cap.
    pub async fn insert(&self, key: Uuid, figures: Vec<Figure>) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            FigureEntry {
                figures,
                stored_at: Instant::now(),
            },
        );

        entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        while entries.len() > self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(key, _)| *key);
            match oldest {
                Some(key) => {
                    entries.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Fetch one figure by position, if the entry exists and is fresh
    pub async fn figure(&self, key: Uuid, index: usize) -> Option<Figure> {
        let entries = self.entries.read().await;
        let entry = entries.get(&key)?;
        if entry.stored_at.elapsed() >= self.ttl {
            return None;
        }
        entry.figures.get(index).cloned()
    }

    /// Drop a session's figures
    pub async fn remove(&self, key: Uuid) {
        self.entries.write().await.remove(&key);
    }

    /// Number of stored entries, including any not yet pruned
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// True when no entries are stored
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_figures() -> Vec<Figure> {
        vec![
            Figure::Bar {
                title: "first".to_string(),
                labels: vec!["a".to_string()],
                values: vec![1.0],
            },
            Figure::Bar {
                title: "second".to_string(),
                labels: vec!["b".to_string()],
                values: vec![2.0],
            },
        ]
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let store = FigureStore::new();
        let key = Uuid::new_v4();
        store.insert(key, sample_figures()).await;

        let first = store.figure(key, 0).await.expect("figure stored");
        assert_eq!(first.title(), "first");
        let second = store.figure(key, 1).await.expect("figure stored");
        assert_eq!(second.title(), "second");
        assert!(store.figure(key, 2).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_key_is_none() {
        let store = FigureStore::new();
        assert!(store.figure(Uuid::new_v4(), 0).await.is_none());
    }

    #[tokio::test]
    async fn test_keys_are_isolated() {
        let store = FigureStore::new();
        let key_a = Uuid::new_v4();
        let key_b = Uuid::new_v4();
        store.insert(key_a, sample_figures()).await;

        assert!(store.figure(key_a, 0).await.is_some());
        assert!(store.figure(key_b, 0).await.is_none());

        store.remove(key_a).await;
        assert!(store.figure(key_a, 0).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_expired_entries_are_unreadable() {
        let store = FigureStore::new().with_ttl(Duration::ZERO);
        let key = Uuid::new_v4();
        store.insert(key, sample_figures()).await;
        assert!(store.figure(key, 0).await.is_none());
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let store = FigureStore::new().with_capacity(2);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let third = Uuid::new_v4();

        store.insert(first, sample_figures()).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        store.insert(second, sample_figures()).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        store.insert(third, sample_figures()).await;

        assert_eq!(store.len().await, 2);
        assert!(store.figure(first, 0).await.is_none());
        assert!(store.figure(second, 0).await.is_some());
        assert!(store.figure(third, 0).await.is_some());
    }
}
