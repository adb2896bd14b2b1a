//! Service configuration.
//!
//! Plain serde-deserializable settings structs with sensible defaults.
//! Loading and merging (files, environment) is the embedding
//! application's concern; this module only defines the shape and the
//! conversions into runtime policy types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use currex_providers::{CircuitBreakerConfig, ProviderSettings, RetryPolicy};

use crate::cache::TtlPolicy;
use crate::fx::FxError;

/// Top-level settings for the conversion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Name of the provider used for all fetches, e.g. "FRANKFURTER".
    pub active_provider: String,
    /// Per-provider configuration; disabled entries are not built.
    pub providers: Vec<ProviderSettings>,
    /// Reference currency anchoring cache triangulation.
    pub home_currency: String,
    /// Codes rejected everywhere in the core.
    pub excluded_currencies: Vec<String>,
    pub resilience: ResilienceSettings,
    pub cache: CacheSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            active_provider: "FRANKFURTER".to_string(),
            providers: ProviderSettings::defaults(),
            home_currency: "EUR".to_string(),
            excluded_currencies: vec!["TRY".to_string()],
            resilience: ResilienceSettings::default(),
            cache: CacheSettings::default(),
        }
    }
}

/// Retry and circuit-breaker policy, shared by every provider instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResilienceSettings {
    /// Extra attempts after the first transient failure.
    pub retry_max_attempts: u32,
    /// Consecutive post-retry failures before a circuit opens.
    pub failure_threshold: u32,
    /// Seconds an open circuit waits before allowing a probe.
    pub cooldown_seconds: u64,
}

impl Default for ResilienceSettings {
    fn default() -> Self {
        Self {
            retry_max_attempts: 3,
            failure_threshold: 5,
            cooldown_seconds: 60,
        }
    }
}

impl ResilienceSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_max_attempts)
    }

    pub fn breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            cooldown: Duration::from_secs(self.cooldown_seconds),
        }
    }
}

/// Cache TTL configuration around the upstream publication schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheSettings {
    /// IANA name of the publication reference timezone.
    pub publication_timezone: String,
    /// Local hour at which the upstream publishes new rates.
    pub publication_hour: u32,
    /// Safety buffer after the publication hour.
    pub publication_buffer_minutes: u64,
    /// TTL ceiling inside the business window.
    pub business_ttl_minutes: u64,
    /// TTL ceiling outside the business window.
    pub off_hours_ttl_minutes: u64,
    /// Business window start hour (inclusive), local time.
    pub business_start_hour: u32,
    /// Business window end hour (exclusive), local time.
    pub business_end_hour: u32,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            publication_timezone: "Europe/Berlin".to_string(),
            publication_hour: 16,
            publication_buffer_minutes: 15,
            business_ttl_minutes: 30,
            off_hours_ttl_minutes: 360,
            business_start_hour: 8,
            business_end_hour: 18,
        }
    }
}

impl CacheSettings {
    /// Resolve into a [`TtlPolicy`]. Fails on an unknown timezone name.
    pub fn ttl_policy(&self) -> Result<TtlPolicy, FxError> {
        let timezone = self.publication_timezone.parse().map_err(|_| {
            FxError::InvalidConfigValue(format!(
                "unknown timezone '{}'",
                self.publication_timezone
            ))
        })?;

        Ok(TtlPolicy {
            timezone,
            publication_hour: self.publication_hour,
            publication_buffer: Duration::from_secs(self.publication_buffer_minutes * 60),
            business_ttl: Duration::from_secs(self.business_ttl_minutes * 60),
            off_hours_ttl: Duration::from_secs(self.off_hours_ttl_minutes * 60),
            business_start_hour: self.business_start_hour,
            business_end_hour: self.business_end_hour,
        })
    }
}
