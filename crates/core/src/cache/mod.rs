//! Process-local smart cache for rate tables.
//!
//! The unit of caching is a base currency's complete rate table;
//! individual pairs are never cached standalone. Entries expire at a
//! TTL computed from the upstream publication schedule ([`TtlPolicy`])
//! and are evicted lazily on read - there is no timer sweep.
//!
//! Cross-rates between two non-home currencies are derived on demand by
//! triangulating through the home currency's cached table. The cache
//! never fetches; populating it is the service layer's job, and
//! concurrent same-base refreshes simply race with last-writer-wins
//! semantics (table overwrites are idempotent for a point in time).

mod ttl;

pub use ttl::TtlPolicy;

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;
use tokio::sync::RwLock;

use currex_providers::{Rate, RateTable};

#[derive(Debug, Clone)]
struct CacheEntry {
    table: RateTable,
    expires_at: DateTime<Utc>,
}

/// Business-hours-aware cache of per-base rate tables.
pub struct SmartCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: TtlPolicy,
    home_currency: String,
}

impl SmartCache {
    pub fn new(ttl: TtlPolicy, home_currency: impl Into<String>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            home_currency: home_currency.into(),
        }
    }

    /// The reference currency whose table anchors triangulation.
    pub fn home_currency(&self) -> &str {
        &self.home_currency
    }

    /// The unexpired table for `base`, if cached. Never fetches.
    pub async fn latest_table(&self, base: &str) -> Option<RateTable> {
        let now = Utc::now();
        {
            let entries = self.entries.read().await;
            match entries.get(base) {
                Some(entry) if entry.expires_at > now => return Some(entry.table.clone()),
                Some(_) => {} // expired; evict below
                None => return None,
            }
        }

        // Lazy eviction. Re-check under the write lock: a racing writer
        // may have refreshed the entry in the meantime.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(base) {
            if entry.expires_at > Utc::now() {
                return Some(entry.table.clone());
            }
            debug!("cache: evicting expired table for base '{}'", base);
            entries.remove(base);
        }
        None
    }

    /// Store or overwrite the table for its base currency.
    ///
    /// The TTL comes from the policy unless an explicit override is
    /// given. Entries are replaced whole, never merged.
    pub async fn store_latest_table(&self, table: RateTable, ttl_override: Option<Duration>) {
        let now = Utc::now();
        let ttl = ttl_override.unwrap_or_else(|| self.ttl.ttl_at(now));
        let expires_at = now
            + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero());

        debug!(
            "cache: storing table for base '{}' ({} rates, ttl {:?})",
            table.base,
            table.len(),
            ttl
        );
        self.entries
            .write()
            .await
            .insert(table.base.clone(), CacheEntry { table, expires_at });
    }

    /// The rate for a currency pair, derived from cached data only.
    ///
    /// `from == to` short-circuits to the synthetic identity rate.
    /// Otherwise the home currency's table is consulted: a direct read
    /// when `from` is the home currency, an inversion when `to` is, and
    /// a cross-rate (`table[to] / table[from]`) for everything else.
    /// Returns `None` when any required entry is missing or expired -
    /// it never falls back to fetching.
    pub async fn pair_rate(&self, from: &str, to: &str) -> Option<Rate> {
        if from == to {
            return Some(Rate::identity(from, Utc::now()));
        }

        let table = self.latest_table(&self.home_currency).await?;

        if from == self.home_currency {
            return table.get(to).cloned();
        }
        if to == self.home_currency {
            return table.get(from)?.inverted();
        }

        let from_rate = table.get(from)?;
        let to_rate = table.get(to)?;
        if from_rate.value.is_zero() {
            return None;
        }

        Some(Rate {
            from_currency: from.to_string(),
            to_currency: to.to_string(),
            value: to_rate.value / from_rate.value,
            // The derived rate is only as fresh as its older leg.
            observed_at: from_rate.observed_at.min(to_rate.observed_at),
            source: to_rate.source.clone(),
        })
    }
}
