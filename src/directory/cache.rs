/// Community Directory Cache - process-wide catalog and detail cache
///
/// Both structures are insert-once: the catalog is fetched on first use and
/// kept until restart, and each community detail is fetched on first request
/// for its id and never evicted. Concurrent misses on the same key share a
/// single upstream call; failed or empty fetches are not cached.
use crate::{
    directory::{Community, CommunityDetail, CommunityId, DirectoryClient},
    error::{GuildError, GuildResult},
    metrics,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use tracing::{debug, info};

type DetailCell = Arc<OnceCell<Arc<CommunityDetail>>>;

/// Why a detail fetch did not populate its cell
enum DetailMiss {
    /// Upstream answered with an empty body
    Absent,
    Failed(GuildError),
}

/// Hit/miss counts for one cache instance.
///
/// A miss is counted once per upstream fetch; callers that waited on another
/// caller's in-flight fetch count as hits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Cached view of the upstream community directory
pub struct CommunityDirectory {
    client: Arc<dyn DirectoryClient>,
    catalog: OnceCell<Arc<Vec<Community>>>,
    details: Mutex<HashMap<CommunityId, DetailCell>>,
    counters: Counters,
}

impl CommunityDirectory {
    /// Create an empty cache over the given directory client
    pub fn new(client: Arc<dyn DirectoryClient>) -> Self {
        Self {
            client,
            catalog: OnceCell::new(),
            details: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    /// Get the full community catalog, fetching it on first use
    pub async fn list_communities(&self) -> GuildResult<Arc<Vec<Community>>> {
        let fetched = AtomicBool::new(false);
        let result = self
            .catalog
            .get_or_try_init(|| async {
                fetched.store(true, Ordering::Relaxed);
                let communities = self.client.fetch_communities().await?;
                info!(count = communities.len(), "community catalog cached");
                Ok::<_, GuildError>(Arc::new(communities))
            })
            .await;
        self.record_access("community_catalog", !fetched.load(Ordering::Relaxed));

        Ok(Arc::clone(result?))
    }

    /// Get a community's detail, fetching it on first request for `id`.
    ///
    /// Returns `None` when the directory has no detail for the id.
    pub async fn get_detail(&self, id: CommunityId) -> GuildResult<Option<Arc<CommunityDetail>>> {
        let cell = self.detail_cell(id);

        let fetched = AtomicBool::new(false);
        let result = cell
            .get_or_try_init(|| async {
                fetched.store(true, Ordering::Relaxed);
                match self.client.fetch_detail(id).await {
                    Ok(Some(detail)) => {
                        debug!(id, roles = detail.roles.len(), "community detail cached");
                        Ok(Arc::new(detail))
                    }
                    Ok(None) => Err(DetailMiss::Absent),
                    Err(e) => Err(DetailMiss::Failed(e)),
                }
            })
            .await;
        self.record_access("community_detail", !fetched.load(Ordering::Relaxed));

        match result {
            Ok(detail) => Ok(Some(Arc::clone(detail))),
            Err(DetailMiss::Absent) => Ok(None),
            Err(DetailMiss::Failed(e)) => Err(e),
        }
    }

    /// Whether the catalog has been fetched
    pub fn is_catalog_loaded(&self) -> bool {
        self.catalog.initialized()
    }

    /// Number of community details currently cached
    pub fn cached_detail_count(&self) -> usize {
        self.details
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    /// Hit/miss counts since this cache was created
    pub fn stats(&self) -> CacheStats {
        let hits = self.counters.hits.load(Ordering::Relaxed);
        let misses = self.counters.misses.load(Ordering::Relaxed);
        CacheStats {
            hits,
            misses,
            hit_rate: if hits + misses > 0 {
                hits as f64 / (hits + misses) as f64
            } else {
                0.0
            },
        }
    }

    fn record_access(&self, cache_type: &str, hit: bool) {
        let counter = if hit {
            &self.counters.hits
        } else {
            &self.counters.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::record_cache_access(cache_type, hit);
    }

    fn detail_cell(&self, id: CommunityId) -> DetailCell {
        let mut cells = self.details.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cells.entry(id).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::testing::{role, FakeDirectory};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn acme_directory() -> FakeDirectory {
        FakeDirectory::new()
            .with_community(7, "acme-dao", "Acme DAO", vec![role(101), role(102)])
            .with_community(8, "other-dao", "Other DAO", vec![role(201)])
    }

    #[tokio::test]
    async fn test_catalog_fetched_once() {
        let fake = Arc::new(acme_directory());
        let cache = CommunityDirectory::new(fake.clone());

        let first = cache.list_communities().await.unwrap();
        let second = cache.list_communities().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(fake.catalog_calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_catalog_loaded());
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().hit_rate, 0.5);
    }

    #[tokio::test]
    async fn test_detail_fetched_once_per_id() {
        let fake = Arc::new(acme_directory());
        let cache = CommunityDirectory::new(fake.clone());

        let first = cache.get_detail(7).await.unwrap().unwrap();
        let again = cache.get_detail(7).await.unwrap().unwrap();
        cache.get_detail(8).await.unwrap().unwrap();

        assert_eq!(first, again);
        assert_eq!(first.url_name, "acme-dao");
        assert_eq!(fake.detail_calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.cached_detail_count(), 2);
    }

    #[tokio::test]
    async fn test_catalog_failure_leaves_cache_empty() {
        let fake = Arc::new(acme_directory());
        fake.fail_catalog.store(true, Ordering::SeqCst);
        let cache = CommunityDirectory::new(fake.clone());

        let result = cache.list_communities().await;
        assert!(matches!(result, Err(GuildError::Upstream(_))));
        assert!(!cache.is_catalog_loaded());

        // Upstream recovers; the next call fetches again
        fake.fail_catalog.store(false, Ordering::SeqCst);
        assert_eq!(cache.list_communities().await.unwrap().len(), 2);
        assert_eq!(fake.catalog_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_absent_detail_is_not_cached() {
        let fake = Arc::new(acme_directory());
        let cache = CommunityDirectory::new(fake.clone());

        assert!(cache.get_detail(999).await.unwrap().is_none());
        assert!(cache.get_detail(999).await.unwrap().is_none());
        assert_eq!(cache.stats().misses, 2);

        assert_eq!(fake.detail_calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.cached_detail_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_detail_is_not_cached() {
        let fake = Arc::new(acme_directory().with_failing_detail(7));
        let cache = CommunityDirectory::new(fake.clone());

        assert!(cache.get_detail(7).await.is_err());
        assert_eq!(cache.cached_detail_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_detail_misses_share_one_fetch() {
        let fake = Arc::new(acme_directory().with_delay(Duration::from_millis(50)));
        let cache = CommunityDirectory::new(fake.clone());

        let (a, b, c) = tokio::join!(cache.get_detail(7), cache.get_detail(7), cache.get_detail(7));

        assert_eq!(a.unwrap(), b.unwrap());
        assert!(c.unwrap().is_some());
        assert_eq!(fake.detail_calls.load(Ordering::SeqCst), 1);

        // Only the caller that went upstream counts as a miss
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);
    }

    #[tokio::test]
    async fn test_concurrent_catalog_misses_share_one_fetch() {
        let fake = Arc::new(acme_directory().with_delay(Duration::from_millis(50)));
        let cache = CommunityDirectory::new(fake.clone());

        let (a, b) = tokio::join!(cache.list_communities(), cache.list_communities());

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(fake.catalog_calls.load(Ordering::SeqCst), 1);
    }
}
