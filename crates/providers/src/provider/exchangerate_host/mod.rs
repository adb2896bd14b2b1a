//! ExchangeRate Host rate provider.
//!
//! Fetches rates from an exchangerate.host-compatible API. Requests are
//! authenticated with an `access_key` query parameter and responses use a
//! `success` envelope with an `error {code, info}` object on failure.
//!
//! The upstream has no range endpoint; range fetches are synthesized one
//! day at a time with partial-result semantics.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::warn;
use reqwest::Client;
use serde::Deserialize;

use crate::errors::RateError;
use crate::models::{ExcludedCurrencies, Rate, RateTable};
use crate::provider::{fetch_range_by_day, ProviderCapabilities, RateProvider};

const DEFAULT_BASE_URL: &str = "https://api.exchangerate.host";
const PROVIDER_ID: &str = "EXCHANGERATE_HOST";

/// Upstream error code for "rate limit reached".
const RATE_LIMIT_CODE: i64 = 106;

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct HostResponse {
    success: bool,
    #[allow(dead_code)]
    base: Option<String>,
    date: Option<NaiveDate>,
    rates: Option<HashMap<String, f64>>,
    error: Option<HostApiError>,
}

#[derive(Debug, Deserialize)]
struct HostApiError {
    code: i64,
    info: String,
}

/// ExchangeRate Host rate provider.
pub struct ExchangeRateHostProvider {
    client: Client,
    base_url: String,
    api_key: String,
    excluded: Arc<ExcludedCurrencies>,
}

impl ExchangeRateHostProvider {
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

    fn latest_url(&self, base: &str, symbols: Option<&[String]>) -> String {
        let mut url = format!(
            "{}/latest?access_key={}&from={}",
            self.base_url, self.api_key, base
        );
        if let Some(symbols) = symbols {
            url.push_str(&format!("&to={}", symbols.join(",")));
        }
        url
    }

    fn historical_url(&self, date: NaiveDate, base: &str, symbols: Option<&[String]>) -> String {
        let mut url = format!(
            "{}/{}?access_key={}&from={}",
            self.base_url, date, self.api_key, base
        );
        if let Some(symbols) = symbols {
            url.push_str(&format!("&to={}", symbols.join(",")));
        }
        url
    }

    /// Map a `success: false` envelope to the error taxonomy. Rate-limit
    /// rejections are transient; everything else is a business rejection.
    fn envelope_error(error: Option<HostApiError>) -> RateError {
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

    async fn get_envelope(&self, url: &str) -> Result<HostResponse, RateError> {
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
            .json::<HostResponse>()
            .await
            .map_err(|e| RateError::decode(PROVIDER_ID, e))?;

        if !body.success {
            return Err(Self::envelope_error(body.error));
        }
        Ok(body)
    }

    fn table_from_envelope(&self, base: &str, body: HostResponse) -> Result<RateTable, RateError> {
        let rates = body.rates.ok_or_else(|| RateError::Provider {
            provider: PROVIDER_ID.to_string(),
            message: "successful response missing rates".to_string(),
        })?;
        let date = body.date.unwrap_or_else(|| Utc::now().date_naive());

        Ok(RateTable::from_raw(
            base,
            date,
            Utc::now(),
            PROVIDER_ID,
            rates,
            &self.excluded,
        ))
    }
}

#[async_trait]
impl RateProvider for ExchangeRateHostProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        5
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

        let url = self.latest_url(&base, symbols.as_deref());
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

        let symbols = vec![to.clone()];
        let url = self.latest_url(&from, Some(&symbols));
        let body = self.get_envelope(&url).await?;
        let table = self.table_from_envelope(&from, body)?;
        Ok(table.get(&to).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RetryClass;
    use rust_decimal_macros::dec;

    fn provider() -> ExchangeRateHostProvider {
        ExchangeRateHostProvider::new(
            None,
            Some("test_key".to_string()),
            Arc::new(ExcludedCurrencies::from_codes(["TRY"])),
        )
    }

    #[test]
    fn test_provider_id_and_capabilities() {
        let p = provider();
        assert_eq!(p.id(), "EXCHANGERATE_HOST");
        assert!(!p.capabilities().supports_native_range);
    }

    #[test]
    fn test_urls_carry_access_key() {
        let p = provider();
        assert_eq!(
            p.latest_url("EUR", None),
            "https://api.exchangerate.host/latest?access_key=test_key&from=EUR"
        );
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(
            p.historical_url(date, "EUR", Some(&["USD".to_string()])),
            "https://api.exchangerate.host/2025-03-10?access_key=test_key&from=EUR&to=USD"
        );
    }

    #[test]
    fn test_successful_envelope_mapping() {
        let p = provider();
        let body: HostResponse = serde_json::from_str(
            r#"{"success":true,"base":"EUR","date":"2025-03-14","rates":{"USD":1.1,"TRY":35.4}}"#,
        )
        .unwrap();

        let table = p.table_from_envelope("EUR", body).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("USD").unwrap().value, dec!(1.1));
    }

    #[test]
    fn test_error_envelope_is_provider_error() {
        let body: HostResponse = serde_json::from_str(
            r#"{"success":false,"error":{"code":101,"info":"invalid access key"}}"#,
        )
        .unwrap();
        assert!(!body.success);

        let err = ExchangeRateHostProvider::envelope_error(body.error);
        assert_eq!(err.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_rate_limit_envelope_is_transient() {
        let err = ExchangeRateHostProvider::envelope_error(Some(HostApiError {
            code: RATE_LIMIT_CODE,
            info: "rate limit reached".to_string(),
        }));
        assert_eq!(err.retry_class(), RetryClass::Transient);
    }

    #[tokio::test]
    async fn test_excluded_base_rejected_before_io() {
        let p = provider();
        let result = p.fetch_latest("TRY", None).await;
        assert!(matches!(result, Err(RateError::UnsupportedCurrency(_))));
    }
}
