//! Time-bounded cache of normalized search pages, keyed by upstream URL.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use super::SearchPage;

/// Upper bound on cached pages; the oldest page is evicted past this.
const MAX_ENTRIES: usize = 256;

struct CachedPage {
    stored_at: Instant,
    page: SearchPage,
}

pub struct ResponseCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedPage>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch a page that is still within its time window.
    pub async fn get(&self, key: &str) -> Option<SearchPage> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|cached| cached.stored_at.elapsed() < self.ttl)
            .map(|cached| cached.page.clone())
    }

    pub async fn insert(&self, key: String, page: SearchPage) {
        if self.ttl.is_zero() {
            return;
        }

        let mut entries = self.entries.write().await;
        let ttl = self.ttl;
        entries.retain(|_, cached| cached.stored_at.elapsed() < ttl);

        if entries.len() >= MAX_ENTRIES {
            let oldest = entries
                .iter()
                .min_by_key(|(_, cached)| cached.stored_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            CachedPage {
                stored_at: Instant::now(),
                page,
            },
        );
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
