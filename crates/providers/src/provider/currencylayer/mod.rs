//! Currencylayer rate provider.
//!
//! Fetches rates from a currencylayer-compatible API. Requests are
//! authenticated with an `access_key` query parameter. The wire format
//! differs from the other variants: the base currency is called
//! `source`, and quotes are keyed by concatenated pair codes
//! (`"USDEUR": 0.92`), which must be split while mapping.
//!
//! No range endpoint upstream; ranges are synthesized per day.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use log::warn;
use reqwest::Client;
use serde::Deserialize;

use crate::errors::RateError;
use crate::models::{ExcludedCurrencies, Rate, RateTable};
use crate::provider::{fetch_range_by_day, ProviderCapabilities, RateProvider};

const DEFAULT_BASE_URL: &str = "https://api.currencylayer.com";
const PROVIDER_ID: &str = "CURRENCYLAYER";

/// Upstream error code for "maximum request volume reached".
const RATE_LIMIT_CODE: i64 = 104;

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct LayerResponse {
    success: bool,
    source: Option<String>,
    /// Unix timestamp of the quoted rates.
    timestamp: Option<i64>,
    date: Option<NaiveDate>,
    quotes: Option<HashMap<String, f64>>,
    error: Option<LayerApiError>,
}

#[derive(Debug, Deserialize)]
struct LayerApiError {
    code: i64,
    info: String,
}

/// Currencylayer rate provider.
pub struct CurrencylayerProvider {
    client: Client,
    base_url: String,
    api_key: String,
    excluded: Arc<ExcludedCurrencies>,
}

impl CurrencylayerProvider {
    pub fn new(
        base_url: Option<String>,
        api_key: Option<String>,
        excluded: Arc<ExcludedCurrencies>,
    ) -> Self {
        if api_key.is_none() {
            warn!("provider '{}' configured without an API key", PROVIDER_ID);
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: api_key.unwrap_or_default(),
            excluded,
        }
    }

    fn live_url(&self, source: &str, currencies: Option<&[String]>) -> String {
        let mut url = format!(
            "{}/live?access_key={}&source={}",
            self.base_url, self.api_key, source
        );
        if let Some(currencies) = currencies {
            url.push_str(&format!("&currencies={}", currencies.join(",")));
        }
        url
    }

    fn historical_url(
        &self,
        date: NaiveDate,
        source: &str,
        currencies: Option<&[String]>,
    ) -> String {
        let mut url = format!(
            "{}/historical?access_key={}&date={}&source={}",
            self.base_url, self.api_key, date, source
        );
        if let Some(currencies) = currencies {
            url.push_str(&format!("&currencies={}", currencies.join(",")));
        }
        url
    }

    fn envelope_error(error: Option<LayerApiError>) -> RateError {
        match error {
            Some(e) if e.code == RATE_LIMIT_CODE => RateError::TransientUpstream {
                provider: PROVIDER_ID.to_string(),
                message: format!("{} (code {})", e.info, e.code),
            },
            Some(e) => RateError::Provider {
                provider: PROVIDER_ID.to_string(),
                message: format!("{} (code {})", e.info, e.code),
            },
            None => RateError::Provider {
                provider: PROVIDER_ID.to_string(),
                message: "request failed without error detail".to_string(),
            },
        }
    }

    /// Split `"USDEUR": v` quote keys into a `{target: value}` map.
    ///
    /// Keys that don't carry the expected source prefix or aren't six
    /// letters long are dropped.
    fn split_quotes(source: &str, quotes: HashMap<String, f64>) -> HashMap<String, f64> {
        quotes
            .into_iter()
            .filter_map(|(key, value)| {
                if key.len() == 6 && key.starts_with(source) {
                    Some((key[3..].to_string(), value))
                } else {
                    None
                }
            })
            .collect()
    }

    async fn get_envelope(&self, url: &str) -> Result<LayerResponse, RateError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RateError::transport(PROVIDER_ID, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateError::http_status(PROVIDER_ID, status));
        }

        let body = response
            .json::<LayerResponse>()
            .await
            .map_err(|e| RateError::decode(PROVIDER_ID, e))?;

        if !body.success {
            return Err(Self::envelope_error(body.error));
        }
        Ok(body)
    }

    fn table_from_envelope(&self, base: &str, body: LayerResponse) -> Result<RateTable, RateError> {
        let quotes = body.quotes.ok_or_else(|| RateError::Provider {
            provider: PROVIDER_ID.to_string(),
            message: "successful response missing quotes".to_string(),
        })?;
        let source = body.source.unwrap_or_else(|| base.to_string());

        let observed_at = body
            .timestamp
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .unwrap_or_else(Utc::now);
        let date = body.date.unwrap_or_else(|| observed_at.date_naive());

        Ok(RateTable::from_raw(
            base,
            date,
            observed_at,
            PROVIDER_ID,
            Self::split_quotes(&source, quotes),
            &self.excluded,
        ))
    }
}

#[async_trait]
impl RateProvider for CurrencylayerProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        8
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_native_range: false,
        }
    }

    async fn fetch_latest(
        &self,
        base: &str,
        symbols: Option<&[String]>,
    ) -> Result<RateTable, RateError> {
        let base = self.excluded.vet(base)?;
        let symbols = self.excluded.vet_symbols(symbols)?;

        let url = self.live_url(&base, symbols.as_deref());
        let body = self.get_envelope(&url).await?;
        self.table_from_envelope(&base, body)
    }

    async fn fetch_historical(
        &self,
        date: NaiveDate,
        base: &str,
        symbols: Option<&[String]>,
    ) -> Result<RateTable, RateError> {
        let base = self.excluded.vet(base)?;
        let symbols = self.excluded.vet_symbols(symbols)?;

        let url = self.historical_url(date, &base, symbols.as_deref());
        let body = self.get_envelope(&url).await?;
        self.table_from_envelope(&base, body)
    }

    async fn fetch_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        base: &str,
        symbols: Option<&[String]>,
    ) -> Result<BTreeMap<NaiveDate, RateTable>, RateError> {
        let base = self.excluded.vet(base)?;
        let symbols = self.excluded.vet_symbols(symbols)?;

        fetch_range_by_day(self, start, end, &base, symbols.as_deref()).await
    }

    async fn fetch_pair(&self, from: &str, to: &str) -> Result<Option<Rate>, RateError> {
        let from = self.excluded.vet(from)?;
        let to = self.excluded.vet(to)?;

        let currencies = vec![to.clone()];
        let url = self.live_url(&from, Some(&currencies));
        let body = self.get_envelope(&url).await?;
        let table = self.table_from_envelope(&from, body)?;
        Ok(table.get(&to).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn provider() -> CurrencylayerProvider {
        CurrencylayerProvider::new(
            None,
            Some("test_key".to_string()),
            Arc::new(ExcludedCurrencies::from_codes(["TRY"])),
        )
    }

    #[test]
    fn test_provider_id_and_capabilities() {
        let p = provider();
        assert_eq!(p.id(), "CURRENCYLAYER");
        assert!(!p.capabilities().supports_native_range);
    }

    #[test]
    fn test_live_url() {
        let p = provider();
        assert_eq!(
            p.live_url("USD", Some(&["EUR".to_string(), "GBP".to_string()])),
            "https://api.currencylayer.com/live?access_key=test_key&source=USD&currencies=EUR,GBP"
        );
    }

    #[test]
    fn test_split_quotes() {
        let quotes = HashMap::from([
            ("USDEUR".to_string(), 0.92),
            ("USDGBP".to_string(), 0.79),
            ("EURGBP".to_string(), 0.86),
            ("USD".to_string(), 1.0),
        ]);

        let split = CurrencylayerProvider::split_quotes("USD", quotes);
        assert_eq!(split.len(), 2);
        assert_eq!(split.get("EUR"), Some(&0.92));
        assert_eq!(split.get("GBP"), Some(&0.79));
    }

    #[test]
    fn test_envelope_mapping() {
        let p = provider();
        let body: LayerResponse = serde_json::from_str(
            r#"{"success":true,"source":"USD","timestamp":1741953600,"quotes":{"USDEUR":0.92,"USDTRY":36.5}}"#,
        )
        .unwrap();

        let table = p.table_from_envelope("USD", body).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("EUR").unwrap().value, dec!(0.92));
        assert!(table.get("TRY").is_none());
        assert_eq!(table.get("EUR").unwrap().source, "CURRENCYLAYER");
    }

    #[tokio::test]
    async fn test_excluded_pair_rejected_before_io() {
        let p = provider();
        let result = p.fetch_pair("USD", "TRY").await;
        assert!(matches!(result, Err(RateError::UnsupportedCurrency(_))));
    }
}
