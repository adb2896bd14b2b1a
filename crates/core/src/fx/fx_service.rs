use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::debug;
use rust_decimal::{Decimal, RoundingStrategy};

use currex_providers::models::currency::{decimal_places, normalize_code};
use currex_providers::registry::{ProviderRegistry, ProviderRegistryBuilder};
use currex_providers::{ExcludedCurrencies, RateError, RateTable, DIRECT_SOURCE};

use crate::cache::SmartCache;
use crate::config::Settings;

use super::fx_errors::{FxError, Result};
use super::fx_model::ConversionResult;
use super::fx_traits::FxServiceTrait;

/// The conversion engine.
///
/// Validates input before any I/O, consults the smart cache first, and
/// falls back to the configured active provider on a miss. The cache is
/// warmed opportunistically by the table-fetching paths only - a
/// pair-level miss never populates it.
#[derive(Clone)]
pub struct FxService {
    registry: Arc<ProviderRegistry>,
    cache: Arc<SmartCache>,
    excluded: Arc<ExcludedCurrencies>,
}

impl FxService {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        cache: Arc<SmartCache>,
        excluded: Arc<ExcludedCurrencies>,
    ) -> Self {
        Self {
            registry,
            cache,
            excluded,
        }
    }

    /// Build the full stack from configuration.
    ///
    /// Fails when the active provider name matches no registered variant
    /// or a configuration value cannot be interpreted - the service's
    /// only fatal paths, both at startup-equivalent time.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let excluded = Arc::new(ExcludedCurrencies::from_codes(&settings.excluded_currencies));

        let home = match normalize_code(&settings.home_currency) {
            Some(code) if !excluded.contains(&code) => code,
            _ => {
                return Err(FxError::InvalidConfigValue(format!(
                    "home currency '{}' is not a usable code",
                    settings.home_currency
                )))
            }
        };

        let registry = ProviderRegistryBuilder::with_builtins().build(
            &settings.active_provider,
            &settings.providers,
            Arc::clone(&excluded),
            settings.resilience.retry_policy(),
            settings.resilience.breaker_config(),
        )?;

        let cache = SmartCache::new(settings.cache.ttl_policy()?, home);

        Ok(Self::new(
            Arc::new(registry),
            Arc::new(cache),
            excluded,
        ))
    }

    /// Normalize and vet a caller-supplied code; malformed or excluded
    /// codes are a client-input error.
    fn vet_code(&self, code: &str) -> Result<String> {
        match normalize_code(code) {
            Some(normalized) if !self.excluded.contains(&normalized) => Ok(normalized),
            _ => Err(FxError::InvalidCurrency(code.trim().to_string())),
        }
    }

    fn vet_symbols(&self, symbols: Option<&[String]>) -> Result<Option<Vec<String>>> {
        match symbols {
            None => Ok(None),
            Some(list) => list
                .iter()
                .map(|s| self.vet_code(s))
                .collect::<Result<Vec<_>>>()
                .map(Some),
        }
    }
}

/// Round to the target currency's canonical precision.
fn round_to_currency(value: Decimal, code: &str) -> Decimal {
    value.round_dp_with_strategy(decimal_places(code), RoundingStrategy::MidpointAwayFromZero)
}

#[async_trait]
impl FxServiceTrait for FxService {
    async fn convert(&self, amount: Decimal, from: &str, to: &str) -> Result<ConversionResult> {
        let from = self.vet_code(from)?;
        let to = self.vet_code(to)?;
        if amount <= Decimal::ZERO {
            return Err(FxError::InvalidAmount(amount));
        }

        if from == to {
            return Ok(ConversionResult {
                amount,
                converted_amount: amount,
                from_currency: from,
                to_currency: to,
                rate: Decimal::ONE,
                rate_timestamp: Utc::now(),
                rate_source: DIRECT_SOURCE.to_string(),
            });
        }

        let rate = match self.cache.pair_rate(&from, &to).await {
            Some(rate) => rate,
            None => {
                let provider = self.registry.active();
                debug!(
                    "cache miss for {}/{}, asking provider '{}'",
                    from,
                    to,
                    provider.id()
                );
                provider
                    .fetch_pair(&from, &to)
                    .await?
                    .ok_or_else(|| RateError::RateUnavailable(format!("{}/{}", from, to)))?
            }
        };

        let converted_amount = round_to_currency(amount * rate.value, &to);

        Ok(ConversionResult {
            amount,
            from_currency: from,
            to_currency: to,
            converted_amount,
            rate: rate.value,
            rate_timestamp: rate.observed_at,
            rate_source: rate.source,
        })
    }

    async fn latest_rates(
        &self,
        base: &str,
        symbols: Option<&[String]>,
    ) -> Result<RateTable> {
        let base = self.vet_code(base)?;
        let symbols = self.vet_symbols(symbols)?;

        if let Some(table) = self.cache.latest_table(&base).await {
            return Ok(table.filtered(symbols.as_deref()));
        }

        let provider = self.registry.active();
        debug!(
            "cache miss for base '{}', fetching full table from '{}'",
            base,
            provider.id()
        );

        // Always fetch and cache the complete table; the caller's filter
        // applies only to the returned copy.
        let table = provider.fetch_latest(&base, None).await?;
        self.cache.store_latest_table(table.clone(), None).await;

        Ok(table.filtered(symbols.as_deref()))
    }

    async fn historical_rates(
        &self,
        date: NaiveDate,
        base: &str,
        symbols: Option<&[String]>,
    ) -> Result<RateTable> {
        let base = self.vet_code(base)?;
        let symbols = self.vet_symbols(symbols)?;

        let provider = self.registry.active();
        Ok(provider
            .fetch_historical(date, &base, symbols.as_deref())
            .await?)
    }

    async fn time_series(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        base: &str,
        symbols: Option<&[String]>,
    ) -> Result<BTreeMap<NaiveDate, RateTable>> {
        let base = self.vet_code(base)?;
        let symbols = self.vet_symbols(symbols)?;

        let provider = self.registry.active();
        Ok(provider
            .fetch_range(start, end, &base, symbols.as_deref())
            .await?)
    }

    fn is_supported(&self, code: &str) -> bool {
        self.vet_code(code).is_ok()
    }
}
