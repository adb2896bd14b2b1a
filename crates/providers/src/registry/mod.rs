//! Configuration-driven provider registry.
//!
//! The registry maps provider names to factory functions, populated at
//! startup, so adding a variant means registering a factory rather than
//! growing a hardcoded switch. Construction resolves every enabled
//! provider from configuration, wraps each in its own
//! [`ResilientProvider`](crate::resilience::ResilientProvider), and fails
//! with [`RateError::UnknownProvider`] when the configured active name
//! matches no registered factory - a fatal configuration error, not a
//! per-request condition.
//!
//! Selection itself is a pure lookup: no caching of rate data, no
//! retries.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::RateError;
use crate::models::ExcludedCurrencies;
use crate::provider::currencylayer::CurrencylayerProvider;
use crate::provider::exchangerate_host::ExchangeRateHostProvider;
use crate::provider::frankfurter::FrankfurterProvider;
use crate::provider::RateProvider;
use crate::resilience::{CircuitBreakerConfig, ResilientProvider, RetryPolicy};

/// Default selection priority when configuration doesn't override it.
const DEFAULT_PRIORITY: i32 = 10;

/// Per-provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    /// Registry name, e.g. "FRANKFURTER".
    pub name: String,
    /// Override for the upstream base URL; each variant has a default.
    pub base_url: Option<String>,
    /// API key for providers that require one.
    pub api_key: Option<String>,
    pub enabled: bool,
    /// Selection priority; lower is higher. Ties keep configuration order.
    pub priority: i32,
}

impl ProviderSettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: None,
            api_key: None,
            enabled: true,
            priority: DEFAULT_PRIORITY,
        }
    }

    /// The stock configuration: all built-in variants enabled.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("FRANKFURTER"),
            Self::new("EXCHANGERATE_HOST"),
            Self::new("CURRENCYLAYER"),
        ]
    }
}

/// Builds a provider instance from its configuration.
pub type ProviderFactory =
    Box<dyn Fn(&ProviderSettings, Arc<ExcludedCurrencies>) -> Arc<dyn RateProvider> + Send + Sync>;

/// Builder holding the name -> factory map.
pub struct ProviderRegistryBuilder {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderRegistryBuilder {
    /// An empty builder with no factories registered.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A builder pre-populated with the built-in variants.
    pub fn with_builtins() -> Self {
        Self::new()
            .register("FRANKFURTER", |settings, excluded| {
                Arc::new(FrankfurterProvider::new(
                    settings.base_url.clone(),
                    excluded,
                ))
            })
            .register("EXCHANGERATE_HOST", |settings, excluded| {
                Arc::new(ExchangeRateHostProvider::new(
                    settings.base_url.clone(),
                    settings.api_key.clone(),
                    excluded,
                ))
            })
            .register("CURRENCYLAYER", |settings, excluded| {
                Arc::new(CurrencylayerProvider::new(
                    settings.base_url.clone(),
                    settings.api_key.clone(),
                    excluded,
                ))
            })
    }

    /// Register a factory under a name, replacing any previous entry.
    pub fn register<F>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn(&ProviderSettings, Arc<ExcludedCurrencies>) -> Arc<dyn RateProvider>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
        self
    }

    /// Resolve configuration into a registry of resilient providers.
    ///
    /// Every enabled provider gets its own circuit breaker with the
    /// shared policy configuration. Fails when an enabled or active name
    /// matches no registered factory.
    pub fn build(
        self,
        active: &str,
        settings: &[ProviderSettings],
        excluded: Arc<ExcludedCurrencies>,
        retry: RetryPolicy,
        breaker: CircuitBreakerConfig,
    ) -> Result<ProviderRegistry, RateError> {
        let mut ordered: Vec<&ProviderSettings> =
            settings.iter().filter(|s| s.enabled).collect();
        ordered.sort_by_key(|s| s.priority);

        let mut providers: Vec<Arc<dyn RateProvider>> = Vec::with_capacity(ordered.len());
        let mut by_name = HashMap::new();

        for setting in ordered {
            let factory = self
                .factories
                .get(&setting.name)
                .ok_or_else(|| RateError::UnknownProvider(setting.name.clone()))?;

            let raw = factory(setting, Arc::clone(&excluded));
            debug!("registry: built provider '{}'", raw.id());
            let wrapped: Arc<dyn RateProvider> =
                Arc::new(ResilientProvider::new(raw, retry.clone(), breaker.clone()));

            by_name.insert(setting.name.clone(), providers.len());
            providers.push(wrapped);
        }

        let active_index = *by_name
            .get(active)
            .ok_or_else(|| RateError::UnknownProvider(active.to_string()))?;

        Ok(ProviderRegistry {
            providers,
            by_name,
            active: active_index,
        })
    }
}

impl Default for ProviderRegistryBuilder {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Resolved provider registry. Selection is a pure lookup.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn RateProvider>>,
    by_name: HashMap<String, usize>,
    active: usize,
}

impl ProviderRegistry {
    /// A registry holding one provider, which is also the active one.
    /// Useful for embedding and tests; the provider is used as-is (no
    /// resilience wrapper is added).
    pub fn single(provider: Arc<dyn RateProvider>) -> Self {
        let mut by_name = HashMap::new();
        by_name.insert(provider.id().to_string(), 0);
        Self {
            providers: vec![provider],
            by_name,
            active: 0,
        }
    }

    /// The configured active provider.
    pub fn active(&self) -> Arc<dyn RateProvider> {
        Arc::clone(&self.providers[self.active])
    }

    /// All enabled providers, priority order (ties keep config order).
    pub fn all_enabled(&self) -> Vec<Arc<dyn RateProvider>> {
        self.providers.iter().map(Arc::clone).collect()
    }

    /// Look up an enabled provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn RateProvider>> {
        self.by_name
            .get(name)
            .map(|&index| Arc::clone(&self.providers[index]))
    }
}
