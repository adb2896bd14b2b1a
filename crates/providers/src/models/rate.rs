use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::currency::{normalize_code, ExcludedCurrencies};

/// Source label for synthetic identity and same-currency rates.
pub const DIRECT_SOURCE: &str = "Direct";

/// A single directed exchange rate observation. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rate {
    pub from_currency: String,
    pub to_currency: String,
    pub value: Decimal,
    pub observed_at: DateTime<Utc>,
    pub source: String,
}

impl Rate {
    /// The synthetic 1:1 rate for a currency against itself.
    ///
    /// Never fetched from a provider; `source` is always `"Direct"`.
    pub fn identity(code: &str, observed_at: DateTime<Utc>) -> Self {
        Self {
            from_currency: code.to_string(),
            to_currency: code.to_string(),
            value: Decimal::ONE,
            observed_at,
            source: DIRECT_SOURCE.to_string(),
        }
    }

    /// The inverse rate (`to -> from`), or `None` when the value is zero.
    pub fn inverted(&self) -> Option<Rate> {
        if self.value.is_zero() {
            return None;
        }
        Some(Rate {
            from_currency: self.to_currency.clone(),
            to_currency: self.from_currency.clone(),
            value: Decimal::ONE / self.value,
            observed_at: self.observed_at,
            source: self.source.clone(),
        })
    }
}

/// A base currency's full rate table: target code -> [`Rate`].
///
/// Always keyed by a single base currency; individual pairs are never
/// cached standalone. Tables are populated unfiltered - caller symbol
/// filters are applied on the way out via [`filtered`](Self::filtered).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateTable {
    pub base: String,
    pub date: NaiveDate,
    pub rates: HashMap<String, Rate>,
}

impl RateTable {
    pub fn new(base: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            base: base.into(),
            date,
            rates: HashMap::new(),
        }
    }

    /// Build a table from an upstream `{code: value}` map.
    ///
    /// Keys that are not well-formed currency codes, are excluded, or
    /// equal the base itself are silently dropped, as are values that
    /// don't survive the decimal conversion.
    pub fn from_raw(
        base: &str,
        date: NaiveDate,
        observed_at: DateTime<Utc>,
        source: &str,
        raw: HashMap<String, f64>,
        excluded: &ExcludedCurrencies,
    ) -> Self {
        let mut table = Self::new(base, date);
        for (key, value) in raw {
            let Some(code) = normalize_code(&key) else {
                continue;
            };
            if code == base || excluded.contains(&code) {
                continue;
            }
            let Ok(value) = Decimal::try_from(value) else {
                continue;
            };
            table.rates.insert(
                code.clone(),
                Rate {
                    from_currency: base.to_string(),
                    to_currency: code,
                    value,
                    observed_at,
                    source: source.to_string(),
                },
            );
        }
        table
    }

    pub fn get(&self, code: &str) -> Option<&Rate> {
        self.rates.get(code)
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// A copy narrowed to the requested symbols. `None` returns the full
    /// table. Filters apply only on the way to the caller, never when
    /// populating the cache.
    pub fn filtered(&self, symbols: Option<&[String]>) -> RateTable {
        match symbols {
            None => self.clone(),
            Some(list) => RateTable {
                base: self.base.clone(),
                date: self.date,
                rates: self
                    .rates
                    .iter()
                    .filter(|(code, _)| list.iter().any(|s| s == *code))
                    .map(|(code, rate)| (code.clone(), rate.clone()))
                    .collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn raw(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn test_identity_rate() {
        let rate = Rate::identity("USD", Utc::now());
        assert_eq!(rate.from_currency, "USD");
        assert_eq!(rate.to_currency, "USD");
        assert_eq!(rate.value, Decimal::ONE);
        assert_eq!(rate.source, DIRECT_SOURCE);
    }

    #[test]
    fn test_inverted() {
        let rate = Rate {
            from_currency: "EUR".to_string(),
            to_currency: "USD".to_string(),
            value: dec!(1.25),
            observed_at: Utc::now(),
            source: "FRANKFURTER".to_string(),
        };
        let inverse = rate.inverted().unwrap();
        assert_eq!(inverse.from_currency, "USD");
        assert_eq!(inverse.to_currency, "EUR");
        assert_eq!(inverse.value, dec!(0.8));
    }

    #[test]
    fn test_inverted_zero_is_none() {
        let rate = Rate {
            from_currency: "EUR".to_string(),
            to_currency: "USD".to_string(),
            value: Decimal::ZERO,
            observed_at: Utc::now(),
            source: "FRANKFURTER".to_string(),
        };
        assert!(rate.inverted().is_none());
    }

    #[test]
    fn test_from_raw_maps_entries() {
        let excluded = ExcludedCurrencies::none();
        let table = RateTable::from_raw(
            "EUR",
            date(),
            Utc::now(),
            "FRANKFURTER",
            raw(&[("USD", 1.1), ("GBP", 0.8)]),
            &excluded,
        );

        assert_eq!(table.base, "EUR");
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("USD").unwrap().value, dec!(1.1));
        assert_eq!(table.get("GBP").unwrap().from_currency, "EUR");
        assert_eq!(table.get("GBP").unwrap().source, "FRANKFURTER");
    }

    #[test]
    fn test_from_raw_drops_excluded_malformed_and_base() {
        let excluded = ExcludedCurrencies::from_codes(["TRY"]);
        let table = RateTable::from_raw(
            "EUR",
            date(),
            Utc::now(),
            "FRANKFURTER",
            raw(&[("USD", 1.1), ("TRY", 35.0), ("EUR", 1.0), ("X1", 2.0)]),
            &excluded,
        );

        assert_eq!(table.len(), 1);
        assert!(table.get("USD").is_some());
        assert!(table.get("TRY").is_none());
        assert!(table.get("EUR").is_none());
    }

    #[test]
    fn test_filtered_narrows_but_keeps_original() {
        let excluded = ExcludedCurrencies::none();
        let table = RateTable::from_raw(
            "EUR",
            date(),
            Utc::now(),
            "FRANKFURTER",
            raw(&[("USD", 1.1), ("GBP", 0.8), ("CHF", 1.08)]),
            &excluded,
        );

        let narrowed = table.filtered(Some(&["USD".to_string(), "CHF".to_string()]));
        assert_eq!(narrowed.len(), 2);
        assert!(narrowed.get("GBP").is_none());

        // Original table is untouched
        assert_eq!(table.len(), 3);

        let full = table.filtered(None);
        assert_eq!(full.len(), 3);
    }
}
