//! Cache and rate-window statistics.
//!
//! Summarizes what the shared store holds: live and expired cache entries,
//! confirmed "not found" entries, accumulated hits, and the rate windows
//! still counting. Used by `grocer stats`.

use anyhow::Result;
use serde::Serialize;

use grocer_core::models::{RateWindowCounter, SearchCacheEntry};
use grocer_core::store::KvStore;

use crate::app::open_store;
use crate::cache::CACHE_PREFIX;
use crate::config::Config;
use crate::governor::RATE_PREFIX;

#[derive(Debug, Default, Clone, Serialize)]
pub struct StoreStats {
    pub cache_entries: u64,
    pub live_entries: u64,
    pub expired_entries: u64,
    pub confirmed_empty: u64,
    pub total_hits: u64,
    /// Live entry with the most hits, as `(term, location, hits)`.
    pub most_hit: Option<(String, String, u64)>,
    pub rate_windows: u64,
    /// Calls counted in the busiest live second / hour window.
    pub current_second_calls: i64,
    pub current_hour_calls: i64,
}

pub async fn collect_stats(store: &dyn KvStore, now_ms: i64) -> Result<StoreStats> {
    let mut stats = StoreStats::default();

    for (_, doc) in store.scan(CACHE_PREFIX).await? {
        let Ok(entry) = serde_json::from_value::<SearchCacheEntry>(doc) else {
            continue;
        };
        stats.cache_entries += 1;
        stats.total_hits += entry.hit_count;
        if entry.is_expired(now_ms) {
            stats.expired_entries += 1;
            continue;
        }
        stats.live_entries += 1;
        if entry.is_confirmed_empty() {
            stats.confirmed_empty += 1;
        }
        if entry.hit_count > 0 && stats.most_hit.as_ref().map_or(true, |m| entry.hit_count > m.2) {
            stats.most_hit = Some((entry.raw_term, entry.location, entry.hit_count));
        }
    }

    let now_sec = now_ms.div_euclid(1000);
    let current_second = format!("second_{}", now_sec);
    let current_hour = format!("hour_{}", now_sec - now_sec.rem_euclid(3600));
    for (_, doc) in store.scan(RATE_PREFIX).await? {
        let Ok(window) = serde_json::from_value::<RateWindowCounter>(doc) else {
            continue;
        };
        if window.expires_at <= now_ms {
            continue;
        }
        stats.rate_windows += 1;
        if window.window_key == current_second {
            stats.current_second_calls = window.count;
        } else if window.window_key == current_hour {
            stats.current_hour_calls = window.count;
        }
    }

    Ok(stats)
}

/// Run the stats command: read the store and print a summary.
pub async fn run_stats(config: &Config, json: bool) -> Result<()> {
    let store = open_store(config).await?;
    let stats = collect_stats(store.as_ref(), chrono::Utc::now().timestamp_millis()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        store.pool().close().await;
        return Ok(());
    }

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("grocer Store Stats");
    println!("==================");
    println!();
    println!("  Database:        {}", config.db.path.display());
    println!("  Size:            {}", format_bytes(db_size));
    println!();
    println!("  Cache entries:   {}", stats.cache_entries);
    println!("    live:          {}", stats.live_entries);
    println!("    expired:       {}", stats.expired_entries);
    println!("    not found:     {}", stats.confirmed_empty);
    println!("  Cache hits:      {}", stats.total_hits);
    if let Some((term, location, hits)) = &stats.most_hit {
        println!("  Most hit:        \"{}\" @ {} ({} hits)", term, location, hits);
    }
    println!();
    println!("  Rate windows:    {}", stats.rate_windows);
    println!(
        "  This second:     {} / {}",
        stats.current_second_calls, config.rate_limit.per_second
    );
    println!(
        "  This hour:       {} / {}",
        stats.current_hour_calls, config.rate_limit.per_hour
    );
    println!();

    store.pool().close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
