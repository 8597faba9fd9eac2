//! Exemplar Retrieval
//!
//! Selects human-written reference passages for a (mode, query, k) request.
//!
//! ## Cascade
//!
//! 1. Embed the query and ask the vector service for the nearest rows
//! 2. Without an embedding, ask the service for rows filtered by mode
//! 3. On any failure or an empty answer, use the curated built-in set
//!
//! Retrieval never fails a request: `ExemplarStore::retrieve` is infallible
//! and reports degradation through `RetrievalSource::Fallback`.

mod cache;
mod fallback;
mod supabase;

pub use cache::ExemplarCache;
pub use fallback::curated;
pub use supabase::{OpenAiEmbedder, SupabaseVectorSearch};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::ai::timeout::with_timeout;
use crate::config::RetrievalConfig;
use crate::types::{Mode, Result};

// =============================================================================
// Types
// =============================================================================

/// Reference passage of human-authored text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exemplar {
    pub content: String,
    pub content_type: Mode,
    pub topic: Option<String>,
    /// Similarity to the query, in [0, 1]
    pub similarity: f64,
}

/// Raw row returned by a vector service
#[derive(Debug, Clone, Deserialize)]
pub struct ExemplarRow {
    pub content: String,
    pub content_type: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub similarity: Option<f64>,
}

/// Query sent to a `VectorSearch`
#[derive(Debug, Clone)]
pub enum SearchQuery {
    Embedding(Vec<f32>),
    /// No embedding available; the service filters by mode only
    Text(String),
}

/// Where a set of exemplars came from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum RetrievalSource {
    /// Nearest neighbours by embedding
    Vector,
    /// Mode-filtered rows without similarity ranking
    Filtered,
    /// Served from the in-process cache
    Cache,
    /// Curated built-in exemplars after a degraded retrieval
    Fallback { reason: String },
}

impl RetrievalSource {
    pub fn is_degraded(&self) -> bool {
        matches!(self, RetrievalSource::Fallback { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Retrieval {
    /// Sorted by similarity, descending; never empty
    pub exemplars: Vec<Exemplar>,
    pub source: RetrievalSource,
}

// =============================================================================
// Traits
// =============================================================================

/// Produces exemplars for a mode
#[async_trait]
pub trait ExemplarStore: Send + Sync {
    /// At most `k` exemplars (at least one), sorted by similarity descending
    async fn retrieve(&self, mode: Mode, query: &str, k: usize) -> Retrieval;
}

/// External nearest-neighbour service
#[async_trait]
pub trait VectorSearch: Send + Sync {
    async fn search(
        &self,
        query: &SearchQuery,
        content_type: Mode,
        k: usize,
    ) -> Result<Vec<ExemplarRow>>;
}

/// Text embedding backend
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

pub type SharedExemplarStore = Arc<dyn ExemplarStore>;

// =============================================================================
// Curated-only store
// =============================================================================

/// Store that always serves the built-in exemplars
#[derive(Debug, Default)]
pub struct CuratedExemplarStore;

#[async_trait]
impl ExemplarStore for CuratedExemplarStore {
    async fn retrieve(&self, mode: Mode, _query: &str, k: usize) -> Retrieval {
        Retrieval {
            exemplars: curated(mode, k),
            source: RetrievalSource::Fallback {
                reason: "retrieval disabled".to_string(),
            },
        }
    }
}

// =============================================================================
// Vector-backed store
// =============================================================================

/// Store backed by an external vector service with curated fallback
pub struct VectorExemplarStore {
    search: Arc<dyn VectorSearch>,
    embedder: Option<Arc<dyn Embedder>>,
    timeout: Duration,
    cache: Option<ExemplarCache>,
}

impl VectorExemplarStore {
    pub fn new(search: Arc<dyn VectorSearch>, timeout: Duration) -> Self {
        Self {
            search,
            embedder: None,
            timeout,
            cache: None,
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Enable the TTL cache; a zero TTL leaves it disabled
    pub fn with_cache(mut self, ttl: Duration) -> Self {
        self.cache = (!ttl.is_zero()).then(|| ExemplarCache::new(ttl));
        self
    }

    /// Build the Supabase-backed store, or the curated-only store when
    /// retrieval is disabled or not configured
    pub fn from_config(config: &RetrievalConfig) -> Result<SharedExemplarStore> {
        if !config.enabled {
            return Ok(Arc::new(CuratedExemplarStore));
        }

        let Some(search) = SupabaseVectorSearch::from_config(config)? else {
            warn!("Retrieval enabled but SUPABASE_URL/SUPABASE_KEY not set; using curated exemplars");
            return Ok(Arc::new(CuratedExemplarStore));
        };

        let mut store = Self::new(Arc::new(search), Duration::from_secs(config.timeout_secs))
            .with_cache(Duration::from_secs(config.cache_ttl_secs));

        match OpenAiEmbedder::from_config(config) {
            Ok(embedder) => store = store.with_embedder(Arc::new(embedder)),
            Err(e) => warn!("Embeddings unavailable, using filtered retrieval: {}", e),
        }

        Ok(Arc::new(store))
    }

    async fn build_query(&self, query: &str) -> SearchQuery {
        let Some(embedder) = &self.embedder else {
            return SearchQuery::Text(query.to_string());
        };

        match with_timeout(self.timeout, embedder.embed(query), "query embedding").await {
            Ok(embedding) if !embedding.is_empty() => SearchQuery::Embedding(embedding),
            Ok(_) => {
                warn!("Embedder returned an empty vector; falling back to filtered query");
                SearchQuery::Text(query.to_string())
            }
            Err(e) => {
                warn!("Embedding failed; falling back to filtered query: {}", e);
                SearchQuery::Text(query.to_string())
            }
        }
    }

    async fn search(&self, mode: Mode, query: &str, k: usize) -> Result<Retrieval> {
        let search_query = self.build_query(query).await;
        let source = match search_query {
            SearchQuery::Embedding(_) => RetrievalSource::Vector,
            SearchQuery::Text(_) => RetrievalSource::Filtered,
        };

        let rows = with_timeout(
            self.timeout,
            self.search.search(&search_query, mode, k),
            "exemplar search",
        )
        .await?;

        Ok(Retrieval {
            exemplars: rank_rows(rows, mode, k),
            source,
        })
    }
}

#[async_trait]
impl ExemplarStore for VectorExemplarStore {
    async fn retrieve(&self, mode: Mode, query: &str, k: usize) -> Retrieval {
        let k = k.max(1);
        let key = ExemplarCache::key(mode, k, query);

        if let Some(exemplars) = self.cache.as_ref().and_then(|c| c.get(&key)) {
            debug!(%mode, count = exemplars.len(), "Exemplar cache hit");
            return Retrieval {
                exemplars,
                source: RetrievalSource::Cache,
            };
        }

        let reason = match self.search(mode, query, k).await {
            Ok(retrieval) if !retrieval.exemplars.is_empty() => {
                debug!(
                    %mode,
                    count = retrieval.exemplars.len(),
                    source = ?retrieval.source,
                    "Exemplars retrieved"
                );
                if retrieval.source == RetrievalSource::Vector
                    && let Some(cache) = &self.cache
                {
                    cache.insert(key, retrieval.exemplars.clone());
                }
                return retrieval;
            }
            Ok(_) => "vector service returned no rows".to_string(),
            Err(e) => e.to_string(),
        };

        warn!(%mode, reason = %reason, "Exemplar retrieval degraded; using curated exemplars");
        Retrieval {
            exemplars: curated(mode, k),
            source: RetrievalSource::Fallback { reason },
        }
    }
}

/// Keep rows of `mode` with content, clamp similarity, sort descending and
/// truncate to `k`
fn rank_rows(rows: Vec<ExemplarRow>, mode: Mode, k: usize) -> Vec<Exemplar> {
    let mut exemplars: Vec<Exemplar> = rows
        .into_iter()
        .filter(|row| !row.content.trim().is_empty())
        .filter(|row| row.content_type.parse::<Mode>().ok() == Some(mode))
        .map(|row| Exemplar {
            content: row.content,
            content_type: mode,
            topic: row.topic,
            similarity: row
                .similarity
                .filter(|s| s.is_finite())
                .unwrap_or(0.0)
                .clamp(0.0, 1.0),
        })
        .collect();

    exemplars.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    exemplars.truncate(k);
    exemplars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HumaniseError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn row(content: &str, content_type: &str, similarity: Option<f64>) -> ExemplarRow {
        ExemplarRow {
            content: content.to_string(),
            content_type: content_type.to_string(),
            topic: None,
            similarity,
        }
    }

    /// Search backend returning fixed rows and counting calls
    struct MockSearch {
        rows: Option<Vec<ExemplarRow>>,
        calls: AtomicU32,
        delay: Option<Duration>,
    }

    impl MockSearch {
        fn returning(rows: Vec<ExemplarRow>) -> Self {
            Self {
                rows: Some(rows),
                calls: AtomicU32::new(0),
                delay: None,
            }
        }

        fn failing() -> Self {
            Self {
                rows: None,
                calls: AtomicU32::new(0),
                delay: None,
            }
        }
    }

    #[async_trait]
    impl VectorSearch for MockSearch {
        async fn search(
            &self,
            query: &SearchQuery,
            _content_type: Mode,
            _k: usize,
        ) -> Result<Vec<ExemplarRow>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let SearchQuery::Embedding(embedding) = query {
                assert!(!embedding.is_empty());
            }
            self.rows
                .clone()
                .ok_or_else(|| HumaniseError::retrieval("connection refused"))
        }
    }

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.1, 0.2, 0.3])
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(HumaniseError::retrieval("embedding quota exceeded"))
        }
    }

    #[tokio::test]
    async fn test_failing_search_falls_back() {
        let store =
            VectorExemplarStore::new(Arc::new(MockSearch::failing()), Duration::from_secs(1));
        for mode in Mode::ALL {
            let retrieval = store.retrieve(mode, "anything", 5).await;
            assert!(!retrieval.exemplars.is_empty());
            assert!(retrieval.source.is_degraded());
            assert!(retrieval.exemplars.iter().all(|e| e.content_type == mode));
        }
    }

    #[tokio::test]
    async fn test_empty_rows_fall_back() {
        let store = VectorExemplarStore::new(
            Arc::new(MockSearch::returning(vec![])),
            Duration::from_secs(1),
        );
        let retrieval = store.retrieve(Mode::Sales, "shoes", 3).await;
        assert!(!retrieval.exemplars.is_empty());
        match retrieval.source {
            RetrievalSource::Fallback { reason } => assert!(reason.contains("no rows")),
            other => panic!("expected fallback, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let search = MockSearch {
            delay: Some(Duration::from_secs(5)),
            ..MockSearch::returning(vec![row("late", "sales", Some(0.9))])
        };
        let store = VectorExemplarStore::new(Arc::new(search), Duration::from_millis(20));
        let retrieval = store.retrieve(Mode::Sales, "shoes", 3).await;
        assert!(retrieval.source.is_degraded());
    }

    #[tokio::test]
    async fn test_rows_sorted_filtered_and_truncated() {
        let rows = vec![
            row("low", "sales", Some(0.2)),
            row("other mode", "journalist", Some(0.99)),
            row("high", "sales", Some(0.9)),
            row("overflow", "sales", Some(1.7)),
            row("   ", "sales", Some(0.95)),
            row("mid", "sales", Some(0.5)),
        ];
        let store =
            VectorExemplarStore::new(Arc::new(MockSearch::returning(rows)), Duration::from_secs(1))
                .with_embedder(Arc::new(FixedEmbedder));

        let retrieval = store.retrieve(Mode::Sales, "shoes", 3).await;
        assert_eq!(retrieval.source, RetrievalSource::Vector);
        let contents: Vec<_> = retrieval.exemplars.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["overflow", "high", "mid"]);
        assert_eq!(retrieval.exemplars[0].similarity, 1.0);
        assert!(
            retrieval
                .exemplars
                .windows(2)
                .all(|w| w[0].similarity >= w[1].similarity)
        );
    }

    #[tokio::test]
    async fn test_embedding_failure_uses_filtered_query() {
        let store = VectorExemplarStore::new(
            Arc::new(MockSearch::returning(vec![row("plain", "journalist", None)])),
            Duration::from_secs(1),
        )
        .with_embedder(Arc::new(FailingEmbedder));

        let retrieval = store.retrieve(Mode::Journalist, "council", 5).await;
        assert_eq!(retrieval.source, RetrievalSource::Filtered);
        assert_eq!(retrieval.exemplars[0].similarity, 0.0);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_search() {
        let search = Arc::new(MockSearch::returning(vec![row("cached", "sales", Some(0.8))]));
        let store = VectorExemplarStore::new(search.clone(), Duration::from_secs(1))
            .with_embedder(Arc::new(FixedEmbedder))
            .with_cache(Duration::from_secs(60));

        let first = store.retrieve(Mode::Sales, "Summer sale", 2).await;
        let second = store.retrieve(Mode::Sales, "summer   sale", 2).await;

        assert_eq!(first.source, RetrievalSource::Vector);
        assert_eq!(second.source, RetrievalSource::Cache);
        assert_eq!(second.exemplars, first.exemplars);
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fallback_results_not_cached() {
        let search = Arc::new(MockSearch::failing());
        let store = VectorExemplarStore::new(search.clone(), Duration::from_secs(1))
            .with_cache(Duration::from_secs(60));

        store.retrieve(Mode::Sales, "shoes", 2).await;
        store.retrieve(Mode::Sales, "shoes", 2).await;
        assert_eq!(search.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_curated_store() {
        let retrieval = CuratedExemplarStore.retrieve(Mode::Sales, "x", 0).await;
        assert_eq!(retrieval.exemplars.len(), 1);
        assert!(retrieval.source.is_degraded());
    }
}
