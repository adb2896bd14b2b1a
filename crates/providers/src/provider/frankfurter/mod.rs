//! Frankfurter rate provider.
//!
//! Fetches reference rates from a Frankfurter-compatible API. No API key
//! is required, and the upstream exposes a native date-range endpoint
//! (`/<start>..<end>`), so ranges are fetched in a single call.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::errors::RateError;
use crate::models::{ExcludedCurrencies, Rate, RateTable};
use crate::provider::{ProviderCapabilities, RateProvider};

const DEFAULT_BASE_URL: &str = "https://api.frankfurter.dev/v1";
const PROVIDER_ID: &str = "FRANKFURTER";

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Latest and historical responses share one shape.
#[derive(Debug, Deserialize)]
struct TableResponse {
    #[allow(dead_code)]
    base: String,
    date: NaiveDate,
    rates: HashMap<String, f64>,
}

/// Range responses nest one `{code: value}` map per date.
#[derive(Debug, Deserialize)]
struct RangeResponse {
    #[allow(dead_code)]
    base: String,
    rates: BTreeMap<NaiveDate, HashMap<String, f64>>,
}

/// Frankfurter rate provider.
pub struct FrankfurterProvider {
    client: Client,
    base_url: String,
    excluded: Arc<ExcludedCurrencies>,
}

impl FrankfurterProvider {
    pub fn new(base_url: Option<String>, excluded: Arc<ExcludedCurrencies>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            excluded,
        }
    }

    fn latest_url(&self, base: &str, symbols: Option<&[String]>) -> String {
        let mut url = format!("{}/latest?from={}", self.base_url, base);
        if let Some(symbols) = symbols {
            url.push_str(&format!("&to={}", symbols.join(",")));
        }
        url
    }

    fn historical_url(&self, date: NaiveDate, base: &str, symbols: Option<&[String]>) -> String {
        let mut url = format!("{}/{}?from={}", self.base_url, date, base);
        if let Some(symbols) = symbols {
            url.push_str(&format!("&to={}", symbols.join(",")));
        }
        url
    }

    fn range_url(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        base: &str,
        symbols: Option<&[String]>,
    ) -> String {
        let mut url = format!("{}/{}..{}?from={}", self.base_url, start, end, base);
        if let Some(symbols) = symbols {
            url.push_str(&format!("&to={}", symbols.join(",")));
        }
        url
    }

    async fn get_table(&self, url: &str) -> Result<TableResponse, RateError> {
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

        response
            .json::<TableResponse>()
            .await
            .map_err(|e| RateError::decode(PROVIDER_ID, e))
    }
}

#[async_trait]
impl RateProvider for FrankfurterProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        1
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_native_range: true,
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
        let body = self.get_table(&url).await?;

        Ok(RateTable::from_raw(
            &base,
            body.date,
            Utc::now(),
            PROVIDER_ID,
            body.rates,
            &self.excluded,
        ))
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
        let body = self.get_table(&url).await?;

        let observed_at = body
            .date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or_else(Utc::now);

        Ok(RateTable::from_raw(
            &base,
            body.date,
            observed_at,
            PROVIDER_ID,
            body.rates,
            &self.excluded,
        ))
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

        let url = self.range_url(start, end, &base, symbols.as_deref());
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RateError::transport(PROVIDER_ID, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateError::http_status(PROVIDER_ID, status));
        }

        let body = response
            .json::<RangeResponse>()
            .await
            .map_err(|e| RateError::decode(PROVIDER_ID, e))?;

        let mut tables = BTreeMap::new();
        for (date, raw) in body.rates {
            let observed_at = date
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc())
                .unwrap_or_else(Utc::now);
            tables.insert(
                date,
                RateTable::from_raw(&base, date, observed_at, PROVIDER_ID, raw, &self.excluded),
            );
        }
        Ok(tables)
    }

    async fn fetch_pair(&self, from: &str, to: &str) -> Result<Option<Rate>, RateError> {
        let from = self.excluded.vet(from)?;
        let to = self.excluded.vet(to)?;

        let symbols = vec![to.clone()];
        let url = self.latest_url(&from, Some(&symbols));
        let body = self.get_table(&url).await?;

        let table = RateTable::from_raw(
            &from,
            body.date,
            Utc::now(),
            PROVIDER_ID,
            body.rates,
            &self.excluded,
        );
        Ok(table.get(&to).cloned())
    }
}
