//! Service wiring.
//!
//! [`App`] constructs every service object once from a [`Config`] and owns
//! the shared handles: one store, one queue, one breaker, one governor. CLI
//! commands and the HTTP server both work from an `App`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use grocer_core::rules::{IngredientQualityRule, RuleBook};
use grocer_core::select::SelectionEngine;
use grocer_core::store::KvStore;

use crate::auth::{ClientCredentialsProvider, StaticTokenProvider, TokenProvider};
use crate::breaker::{BreakerSettings, CircuitBreaker};
use crate::cache::CatalogCache;
use crate::catalog::HttpCatalog;
use crate::config::Config;
use crate::governor::RateGovernor;
use crate::queue::{QueueSettings, RequestQueue};
use crate::resolver::CatalogResolver;
use crate::sqlite_store::SqliteStore;
use crate::transport::{ResilientTransport, TransportSettings};
use crate::{db, migrate};

#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(default, rename = "rule")]
    rules: Vec<IngredientQualityRule>,
}

/// Parse a TOML file of `[[rule]]` tables into ingredient rules.
pub fn load_extra_rules(path: &Path) -> Result<Vec<IngredientQualityRule>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read rules file: {}", path.display()))?;
    let file: RulesFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse rules file: {}", path.display()))?;
    for r in &file.rules {
        if r.match_keywords.iter().all(|k| k.trim().is_empty()) {
            anyhow::bail!("rule '{}' has no match_keywords", r.id);
        }
    }
    Ok(file.rules)
}

/// Built-in rules plus any configured extras.
pub fn load_rule_book(config: &Config) -> Result<RuleBook> {
    let book = RuleBook::builtin();
    match &config.rules.path {
        Some(path) => Ok(book.with_extra_rules(load_extra_rules(path)?)),
        None => Ok(book),
    }
}

/// Open the SQLite store, creating the schema if needed.
pub async fn open_store(config: &Config) -> Result<Arc<SqliteStore>> {
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;
    Ok(Arc::new(SqliteStore::new(pool)))
}

fn token_provider(config: &Config, client: reqwest::Client) -> Result<Arc<dyn TokenProvider>> {
    match &config.upstream.static_token {
        Some(token) => Ok(Arc::new(StaticTokenProvider::new(token.clone()))),
        None => Ok(Arc::new(
            ClientCredentialsProvider::from_config(client, &config.upstream)?
                .with_timeout(Duration::from_secs(config.transport.timeout_secs)),
        )),
    }
}

pub struct App {
    pub config: Config,
    pub store: Arc<dyn KvStore>,
    pub queue: RequestQueue,
    pub breaker: Arc<CircuitBreaker>,
    pub governor: Arc<RateGovernor>,
    pub cache: CatalogCache,
    pub catalog: Arc<HttpCatalog>,
    pub resolver: CatalogResolver,
}

impl App {
    /// Full wiring against the configured database and upstream.
    pub async fn from_config(config: Config) -> Result<Self> {
        let store = open_store(&config).await?;
        let client = http_client(&config)?;
        let tokens = token_provider(&config, client.clone())?;
        Self::build(config, store, tokens, client)
    }

    /// Wire services over an explicit store and token provider.
    pub fn build(
        config: Config,
        store: Arc<dyn KvStore>,
        tokens: Arc<dyn TokenProvider>,
        client: reqwest::Client,
    ) -> Result<Self> {
        let engine = Arc::new(SelectionEngine::new(load_rule_book(&config)?));

        let queue = RequestQueue::new(QueueSettings::from(&config.queue));
        let breaker = Arc::new(CircuitBreaker::new(BreakerSettings::from(&config.breaker)));
        let governor = Arc::new(RateGovernor::new(store.clone(), &config.rate_limit));
        let transport = Arc::new(ResilientTransport::new(
            client,
            breaker.clone(),
            governor.clone(),
            queue.clone(),
            TransportSettings::from(&config.transport),
        ));
        let cache = CatalogCache::new(store.clone(), &config.cache);
        let catalog = Arc::new(HttpCatalog::new(
            &config.upstream.base_url,
            config.upstream.fulfillment.clone(),
            queue.clone(),
            transport,
            tokens,
        ));
        let resolver = CatalogResolver::new(
            catalog.clone(),
            cache.clone(),
            engine,
            config.upstream.search_limit,
        );

        Ok(Self {
            config,
            store,
            queue,
            breaker,
            governor,
            cache,
            catalog,
            resolver,
        })
    }
}

pub fn http_client(config: &Config) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!("grocer/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(config.transport.timeout_secs))
        .build()?)
}
