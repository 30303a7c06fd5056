//! Online CLI commands: resolving terms, warming the cache, finding store
//! locations, and sweeping expired documents.
//!
//! Results are printed to stdout as JSON; logs go to stderr. Each command
//! flushes pending cache bookkeeping before the process exits.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use grocer_core::models::Match;
use grocer_core::store::KvStore;

use crate::app::{open_store, App};
use crate::cache::CACHE_PREFIX;
use crate::config::Config;
use crate::governor::RATE_PREFIX;
use crate::resolver::{AlternativeOptions, ResolveOptions, TopOptions};

#[derive(Serialize)]
struct MatchOutput<'a> {
    term: &'a str,
    #[serde(rename = "match")]
    matched: Option<Match>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn run_resolve(
    config: Config,
    term: &str,
    location_id: Option<String>,
    skip_cache: bool,
) -> Result<()> {
    let app = App::from_config(config).await?;
    let opts = ResolveOptions {
        location_id,
        skip_cache,
    };
    let matched = app.resolver.resolve_product(term, &opts).await;
    app.cache.flush().await;
    let matched = matched?;
    print_json(&MatchOutput { term, matched })
}

pub async fn run_alternatives(
    config: Config,
    term: &str,
    location_id: Option<String>,
    exclude_id: Option<String>,
) -> Result<()> {
    let app = App::from_config(config).await?;
    let opts = AlternativeOptions {
        location_id,
        exclude_id,
    };
    let matched = app.resolver.resolve_alternatives(term, &opts).await;
    app.cache.flush().await;
    let matched = matched?;
    print_json(&MatchOutput { term, matched })
}

pub async fn run_top(
    config: Config,
    term: &str,
    location_id: Option<String>,
    exclude_ids: Vec<String>,
    limit: usize,
) -> Result<()> {
    let app = App::from_config(config).await?;
    let opts = TopOptions {
        location_id,
        exclude_ids,
        limit,
    };
    let matches = app.resolver.resolve_top_n(term, &opts).await;
    app.cache.flush().await;
    let matches = matches?;
    print_json(&matches)
}

/// Read one term per line, skipping blanks and `#` comments.
pub fn read_terms_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read terms file: {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

pub async fn run_warm(
    config: Config,
    mut terms: Vec<String>,
    file: Option<&Path>,
    location_id: Option<&str>,
) -> Result<()> {
    if let Some(path) = file {
        terms.extend(read_terms_file(path)?);
    }
    if terms.is_empty() {
        anyhow::bail!("no terms to warm: pass terms or --file");
    }

    let app = App::from_config(config).await?;
    let report = app.resolver.warm(&terms, location_id).await;
    app.cache.flush().await;
    print_json(&report)?;
    if !report.failed.is_empty() {
        anyhow::bail!("{} of {} terms failed to warm", report.failed.len(), terms.len());
    }
    Ok(())
}

pub async fn run_locations(config: Config, zip_code: &str, radius_miles: u32, limit: u32) -> Result<()> {
    let app = App::from_config(config).await?;
    let locations = app
        .catalog
        .search_locations(zip_code, radius_miles, limit)
        .await?;
    print_json(&locations)
}

#[derive(Serialize)]
struct SweepOutput {
    cache_entries: u64,
    rate_windows: u64,
}

/// Delete expired cache entries and rate windows. Reads already ignore
/// expired documents; this only reclaims space.
pub async fn run_sweep(config: &Config) -> Result<()> {
    let store = open_store(config).await?;
    let now = chrono::Utc::now().timestamp_millis();
    let out = SweepOutput {
        cache_entries: store.delete_expired(CACHE_PREFIX, now).await?,
        rate_windows: store.delete_expired(RATE_PREFIX, now).await?,
    };
    store.pool().close().await;
    print_json(&out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_terms_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "# pantry staples\neggs\n\n  whole milk  \n#skip\nflour").unwrap();
        assert_eq!(
            read_terms_file(f.path()).unwrap(),
            vec!["eggs", "whole milk", "flour"]
        );
    }
}
