//! # Catalog resolver
//!
//! Turns free-text ingredient requests into products.
//!
//! ```text
//! CACHE_LOOKUP ──hit──────────────────────────────────────────────▶ SELECT
//!      │
//!     miss
//!      ▼
//! QUEUE_WAIT ─▶ RATE_CHECK ─▶ TRANSPORT_CALL ─▶ CACHE_WRITE ─────▶ SELECT
//! ```
//!
//! Queueing, rate checks and the transport live behind [`CatalogSearch`];
//! this module owns the cache policy and the qualifier fallback:
//!
//! - A cached entry with no candidates is a confirmed "not found" and is
//!   answered without any network call.
//! - On a miss, if the search returns nothing that survives filtering, the
//!   term is stripped of preparation qualifiers ("finely chopped yellow
//!   onion" → "yellow onion") and searched once more. A successful fallback
//!   is cached under both terms. If it fails too, a confirmed "not found"
//!   is cached under the original term.
//!
//! Candidates are always scored against the caller's original term.
//! "Nothing matched" is `Ok(None)` / an empty list; infrastructure failures
//! are returned as [`CatalogError`].

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use grocer_core::models::{Match, ProductCandidate};
use grocer_core::select::SelectionEngine;
use grocer_core::terms::{normalize_term, strip_qualifiers};

use crate::cache::CatalogCache;
use crate::catalog::{CatalogSearch, SearchPage, SearchQuery};
use crate::error::CatalogError;
use crate::queue::Priority;

#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub location_id: Option<String>,
    /// Go to the catalog even if a live cache entry exists.
    pub skip_cache: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AlternativeOptions {
    pub location_id: Option<String>,
    /// Product to skip, typically the one the user wants to swap out.
    pub exclude_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TopOptions {
    pub location_id: Option<String>,
    pub exclude_ids: Vec<String>,
    pub limit: usize,
}

impl Default for TopOptions {
    fn default() -> Self {
        Self {
            location_id: None,
            exclude_ids: Vec::new(),
            limit: 5,
        }
    }
}

/// Outcome of a [`CatalogResolver::warm`] batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WarmReport {
    /// Terms fetched from the catalog and cached with candidates.
    pub warmed: Vec<String>,
    /// Terms that already had a live cache entry.
    pub already_cached: Vec<String>,
    /// Terms cached as confirmed "not found".
    pub not_found: Vec<String>,
    /// Terms whose fetch failed, with the error.
    pub failed: Vec<(String, String)>,
}

pub struct CatalogResolver {
    catalog: Arc<dyn CatalogSearch>,
    cache: CatalogCache,
    engine: Arc<SelectionEngine>,
    search_limit: u32,
}

impl CatalogResolver {
    pub fn new(
        catalog: Arc<dyn CatalogSearch>,
        cache: CatalogCache,
        engine: Arc<SelectionEngine>,
        search_limit: u32,
    ) -> Self {
        Self {
            catalog,
            cache,
            engine,
            search_limit,
        }
    }

    pub fn engine(&self) -> &SelectionEngine {
        &self.engine
    }

    /// Best product for `term`, or `None` if nothing acceptable exists.
    pub async fn resolve_product(
        &self,
        term: &str,
        opts: &ResolveOptions,
    ) -> Result<Option<Match>, CatalogError> {
        let candidates = self
            .candidates(
                term,
                opts.location_id.as_deref(),
                opts.skip_cache,
                Priority::INGREDIENT_ENRICHMENT,
            )
            .await?;
        let best = self.engine.select_best(term, &candidates).map(Match::from);
        debug!(stage = "SELECT", term = %term, found = best.is_some(), "resolved product");
        Ok(best)
    }

    /// Best product for `term` other than `exclude_id`.
    pub async fn resolve_alternatives(
        &self,
        term: &str,
        opts: &AlternativeOptions,
    ) -> Result<Option<Match>, CatalogError> {
        let candidates = self
            .candidates(
                term,
                opts.location_id.as_deref(),
                false,
                Priority::INGREDIENT_ENRICHMENT,
            )
            .await?;
        let alt = self
            .engine
            .rank(term, &candidates)
            .into_iter()
            .find(|s| Some(s.candidate.id.as_str()) != opts.exclude_id.as_deref())
            .map(|s| Match::from(s.candidate));
        Ok(alt)
    }

    /// Up to `limit` ranked products for `term`, skipping `exclude_ids`.
    pub async fn resolve_top_n(&self, term: &str, opts: &TopOptions) -> Result<Vec<Match>, CatalogError> {
        let candidates = self
            .candidates(
                term,
                opts.location_id.as_deref(),
                false,
                Priority::INGREDIENT_ENRICHMENT,
            )
            .await?;
        Ok(self
            .engine
            .rank(term, &candidates)
            .into_iter()
            .filter(|s| !opts.exclude_ids.iter().any(|id| *id == s.candidate.id))
            .take(opts.limit)
            .map(|s| Match::from(s.candidate))
            .collect())
    }

    /// Pre-populate the cache for `terms` at the lowest queue priority.
    pub async fn warm(&self, terms: &[String], location_id: Option<&str>) -> WarmReport {
        let mut report = WarmReport::default();
        for term in terms {
            if self.cache.get(location_id, term).await.is_some() {
                report.already_cached.push(term.clone());
                continue;
            }
            match self
                .fetch_with_fallback(term, location_id, Priority::CACHE_WARMING)
                .await
            {
                Ok(candidates) if candidates.is_empty() => report.not_found.push(term.clone()),
                Ok(_) => report.warmed.push(term.clone()),
                Err(e) => {
                    warn!(term = %term, error = %e, "cache warming failed");
                    report.failed.push((term.clone(), e.to_string()));
                }
            }
        }
        info!(
            warmed = report.warmed.len(),
            already_cached = report.already_cached.len(),
            not_found = report.not_found.len(),
            failed = report.failed.len(),
            "cache warming finished"
        );
        report
    }

    async fn candidates(
        &self,
        term: &str,
        location: Option<&str>,
        skip_cache: bool,
        priority: Priority,
    ) -> Result<Vec<ProductCandidate>, CatalogError> {
        if !skip_cache {
            if let Some(entry) = self.cache.get(location, term).await {
                debug!(
                    stage = "CACHE_LOOKUP",
                    term = %term,
                    candidates = entry.candidates.len(),
                    confirmed_empty = entry.is_confirmed_empty(),
                    "cache hit"
                );
                return Ok(entry.candidates);
            }
        }
        debug!(stage = "CACHE_LOOKUP", term = %term, "cache miss");

        self.fetch_with_fallback(term, location, priority).await
    }

    fn has_acceptable(&self, term: &str, candidates: &[ProductCandidate]) -> bool {
        !self.engine.filter(term, candidates).is_empty()
    }

    async fn search(
        &self,
        term: &str,
        location: Option<&str>,
        priority: Priority,
    ) -> Result<SearchPage, CatalogError> {
        debug!(stage = "QUEUE_WAIT", term = %term, priority = priority.0, "searching catalog");
        let page = self
            .catalog
            .search(&SearchQuery {
                term: term.to_string(),
                location_id: location.map(str::to_string),
                limit: self.search_limit,
                priority,
            })
            .await?;
        debug!(
            stage = "TRANSPORT_CALL",
            term = %term,
            returned = page.candidates.len(),
            total = page.total,
            "catalog responded"
        );
        Ok(page)
    }

    /// Search upstream, falling back to the qualifier-stripped term once.
    /// Writes the cache on every path before returning, so the next lookup
    /// for the same term is a hit.
    async fn fetch_with_fallback(
        &self,
        term: &str,
        location: Option<&str>,
        priority: Priority,
    ) -> Result<Vec<ProductCandidate>, CatalogError> {
        let primary = self.search(term, location, priority).await?;
        if self.has_acceptable(term, &primary.candidates) {
            debug!(stage = "CACHE_WRITE", term = %term, "caching search result");
            self.cache
                .set(location, term, primary.candidates.clone(), primary.total)
                .await;
            return Ok(primary.candidates);
        }

        let fallback = strip_qualifiers(term);
        if !fallback.is_empty() && fallback != normalize_term(term) {
            info!(term = %term, fallback = %fallback, "no acceptable match, retrying without qualifiers");

            let (candidates, total, from_cache) = match self.cache.get(location, &fallback).await {
                Some(entry) => (entry.candidates, entry.total, true),
                None => {
                    let page = self.search(&fallback, location, priority).await?;
                    (page.candidates, page.total, false)
                }
            };

            if self.has_acceptable(term, &candidates) {
                debug!(stage = "CACHE_WRITE", term = %term, fallback = %fallback, "caching fallback result");
                if !from_cache {
                    self.cache
                        .set(location, &fallback, candidates.clone(), total)
                        .await;
                }
                self.cache.set(location, term, candidates.clone(), total).await;
                return Ok(candidates);
            }
        }

        info!(term = %term, "no acceptable match, caching not-found");
        self.cache.set(location, term, Vec::new(), 0).await;
        Ok(Vec::new())
    }
}
