//! Documentation cache: crawls the documentation site, keeps sections in
//! memory, mirrors them to a [`SectionStore`] and answers queries.
//!
//! # State
//!
//! The cache is either uninitialized, fresh, or stale (older than the TTL).
//! Every query goes through [`DocsCache::initialize`] first, so a cold or
//! stale cache re-crawls before answering. Only a failure to fetch the index
//! page is reported to callers; everything else degrades to missing sections.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use whistle_docs_mcp::config::DocsConfig;
//! use whistle_docs_mcp::docs_cache::DocsCache;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = Arc::new(DocsCache::from_config(&DocsConfig::default())?);
//!     for hit in cache.search("rules").await? {
//!         println!("{}: {}", hit.section_title, hit.url);
//!     }
//!     Ok(())
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use url::Url;

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, DocsConfig};
use crate::extractor::SectionExtractor;
use crate::fetcher::{ContentFetcher, FetchError, HttpFetcher};
use crate::search::{SearchResult, search_sections};
use crate::section::DocSection;
use crate::store::{FileSectionStore, SectionStore};

#[derive(Debug, Error)]
pub enum DocsError {
    #[error("Failed to initialize documentation from {url}: {source}")]
    Initialization {
        url: String,
        #[source]
        source: FetchError,
    },
}

/// Point-in-time view of the cache, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStatus {
    pub initialized: bool,
    pub section_count: usize,
    /// Time since the last successful crawl.
    pub age: Option<Duration>,
}

/// Sections keyed by id, remembering insertion order for stable listings.
#[derive(Debug, Default)]
struct SectionMap {
    by_id: HashMap<String, DocSection>,
    order: Vec<String>,
}

impl SectionMap {
    /// Replacing an existing id keeps its original position.
    fn insert(&mut self, section: DocSection) {
        let id = section.id.clone();
        if self.by_id.insert(id.clone(), section).is_none() {
            self.order.push(id);
        }
    }

    fn get(&self, id: &str) -> Option<&DocSection> {
        self.by_id.get(id)
    }

    fn iter(&self) -> impl Iterator<Item = &DocSection> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    fn clear(&mut self) {
        self.by_id.clear();
        self.order.clear();
    }
}

#[derive(Debug, Default)]
struct CacheState {
    sections: SectionMap,
    last_fetch: Option<Instant>,
    initialized: bool,
}

pub struct DocsCache {
    fetcher: Arc<dyn ContentFetcher>,
    store: Arc<dyn SectionStore>,
    clock: Arc<dyn Clock>,
    extractor: SectionExtractor,
    ttl: Duration,
    /// Held for the whole of each operation, so callers are served one at a time.
    state: Mutex<CacheState>,
}

impl DocsCache {
    pub fn new(
        extractor: SectionExtractor,
        fetcher: Arc<dyn ContentFetcher>,
        store: Arc<dyn SectionStore>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            fetcher,
            store,
            clock,
            extractor,
            ttl,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Production wiring: HTTP fetcher, file store under `config.cache_dir`,
    /// wall clock.
    pub fn from_config(config: &DocsConfig) -> Result<Self, ConfigError> {
        let base_url = config.parsed_base_url()?;
        Ok(Self::new(
            SectionExtractor::new(base_url, config),
            Arc::new(HttpFetcher::new()),
            Arc::new(FileSectionStore::new(config.cache_dir.clone())),
            Arc::new(SystemClock),
            config.ttl(),
        ))
    }

    pub fn base_url(&self) -> &Url {
        self.extractor.base_url()
    }

    /// Crawls the documentation unless the cache is initialized and fresh.
    pub async fn initialize(&self) -> Result<(), DocsError> {
        let mut state = self.state.lock().await;
        self.ensure_fresh(&mut state).await
    }

    pub async fn get_all_sections(&self) -> Result<Vec<DocSection>, DocsError> {
        let mut state = self.state.lock().await;
        self.ensure_fresh(&mut state).await?;
        Ok(state.sections.iter().cloned().collect())
    }

    pub async fn get_section(&self, id: &str) -> Result<Option<DocSection>, DocsError> {
        let mut state = self.state.lock().await;
        self.ensure_fresh(&mut state).await?;
        Ok(state.sections.get(id).cloned())
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, DocsError> {
        let mut state = self.state.lock().await;
        self.ensure_fresh(&mut state).await?;
        let results = search_sections(state.sections.iter(), query);
        tracing::debug!("Search for {:?} matched {} sections", query, results.len());
        Ok(results)
    }

    /// Drops everything, memory and disk, and crawls again from scratch.
    pub async fn refresh_cache(&self) -> Result<(), DocsError> {
        let mut state = self.state.lock().await;
        state.initialized = false;
        state.sections.clear();
        if let Err(e) = self.store.clear().await {
            tracing::warn!("Failed to clear section store: {}", e);
        }
        self.ensure_fresh(&mut state).await
    }

    pub async fn status(&self) -> CacheStatus {
        let state = self.state.lock().await;
        CacheStatus {
            initialized: state.initialized,
            section_count: state.sections.len(),
            age: state
                .last_fetch
                .map(|at| self.clock.now().saturating_duration_since(at)),
        }
    }

    fn is_stale(&self, state: &CacheState) -> bool {
        match state.last_fetch {
            Some(at) => self.clock.now().saturating_duration_since(at) >= self.ttl,
            None => true,
        }
    }

    async fn ensure_fresh(&self, state: &mut CacheState) -> Result<(), DocsError> {
        if state.initialized && !self.is_stale(state) {
            return Ok(());
        }

        let sections = self.crawl().await?;
        tracing::info!(
            "Documentation cache initialized with {} sections from {}",
            sections.len(),
            self.base_url()
        );
        state.sections = sections;
        state.last_fetch = Some(self.clock.now());
        state.initialized = true;
        Ok(())
    }

    async fn crawl(&self) -> Result<SectionMap, DocsError> {
        let index_url = self.base_url().as_str();
        let index_html = self.fetcher.fetch(index_url).await.map_err(|source| {
            tracing::error!("Failed to fetch documentation index {}: {}", index_url, source);
            DocsError::Initialization {
                url: index_url.to_string(),
                source,
            }
        })?;
        let stubs = self.extractor.parse_index(&index_html);

        let mut sections = SectionMap::default();
        let mut seen_ids = HashSet::new();
        for stub in stubs {
            // A repeated id belongs to a different page, so the record stored
            // for the earlier one must not be reused.
            let repeated = !seen_ids.insert(stub.id.clone());
            if repeated {
                tracing::warn!(
                    "Section id '{}' produced by more than one page, keeping {}",
                    stub.id,
                    stub.url
                );
            }
            let Some(section) = self.populate(stub, !repeated).await else {
                continue;
            };
            sections.insert(section);
        }
        Ok(sections)
    }

    /// Fills in a stub's content from the store, or from the network on a miss.
    async fn populate(&self, stub: DocSection, use_store: bool) -> Option<DocSection> {
        if use_store {
            match self.store.get(&stub.id).await {
                Ok(Some(cached)) => {
                    tracing::debug!("Cache hit for section '{}'", stub.id);
                    return Some(stub.with_content(cached.content));
                }
                Ok(None) => tracing::debug!("Cache miss for section '{}'. Fetching...", stub.id),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable cache record for '{}': {}", stub.id, e)
                }
            }
        }

        let html = match self.fetcher.fetch(&stub.url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Skipping section '{}' ({}): {}", stub.id, stub.url, e);
                return None;
            }
        };

        let content = self.extractor.extract_content(&html);
        let section = stub.with_content(content);
        if let Err(e) = self.store.put(&section).await {
            tracing::warn!("Failed to persist section '{}': {}", section.id, e);
        }
        Some(section)
    }
}
