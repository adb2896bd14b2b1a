use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use currex_providers::RateTable;

use super::fx_errors::Result;
use super::fx_model::ConversionResult;

/// The conversion-engine boundary consumed by outer collaborators
/// (controllers, CLIs). Takes plain currency codes, dates, and amounts;
/// returns domain types or one typed failure.
#[async_trait]
pub trait FxServiceTrait: Send + Sync {
    /// Convert an amount between two currencies.
    async fn convert(&self, amount: Decimal, from: &str, to: &str) -> Result<ConversionResult>;

    /// Latest rate table for a base currency, cache-first. The optional
    /// symbol filter narrows only the returned table; the cache always
    /// holds the complete table.
    async fn latest_rates(
        &self,
        base: &str,
        symbols: Option<&[String]>,
    ) -> Result<RateTable>;

    /// Rate table for a base currency on a specific date.
    async fn historical_rates(
        &self,
        date: NaiveDate,
        base: &str,
        symbols: Option<&[String]>,
    ) -> Result<RateTable>;

    /// One table per day over an inclusive date range. Days the upstream
    /// could not answer may be omitted (partial-result semantics).
    async fn time_series(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        base: &str,
        symbols: Option<&[String]>,
    ) -> Result<BTreeMap<NaiveDate, RateTable>>;

    /// Whether a currency code is well-formed and not excluded.
    fn is_supported(&self, code: &str) -> bool;
}
