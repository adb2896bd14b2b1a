//! Currency code validation, canonical precision, and the excluded set.

use std::collections::HashSet;

/// Currencies without a minor unit (amounts are whole numbers).
const ZERO_DECIMAL: &[&str] = &[
    "BIF", "CLP", "DJF", "GNF", "ISK", "JPY", "KMF", "KRW", "PYG", "RWF", "UGX", "VND", "VUV",
    "XAF", "XOF", "XPF",
];

/// Currencies quoted in mills (three decimal places).
const THREE_DECIMAL: &[&str] = &["BHD", "IQD", "JOD", "KWD", "LYD", "OMR", "TND"];

/// Canonical number of decimal places for amounts in the given currency.
///
/// 0 for currencies without subunits, 3 for mill-based currencies,
/// 2 otherwise.
pub fn decimal_places(code: &str) -> u32 {
    if ZERO_DECIMAL.contains(&code) {
        0
    } else if THREE_DECIMAL.contains(&code) {
        3
    } else {
        2
    }
}

/// Normalize a currency code to its canonical uppercase form.
///
/// Returns `None` when the code is malformed: anything other than
/// exactly three ASCII letters after trimming.
pub fn normalize_code(code: &str) -> Option<String> {
    let trimmed = code.trim();
    if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(trimmed.to_ascii_uppercase())
    } else {
        None
    }
}

/// Fixed, process-wide, read-only set of currency codes that are never
/// valid anywhere in the core - not as base, source, or target currency.
///
/// Built once from configuration and shared via `Arc`; checked before any
/// cache or provider interaction.
#[derive(Debug, Clone)]
pub struct ExcludedCurrencies {
    codes: HashSet<String>,
}

impl ExcludedCurrencies {
    /// Build the set from configured codes. Codes are normalized;
    /// malformed entries are ignored.
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            codes: codes
                .into_iter()
                .filter_map(|c| normalize_code(c.as_ref()))
                .collect(),
        }
    }

    /// An empty set (nothing excluded).
    pub fn none() -> Self {
        Self {
            codes: HashSet::new(),
        }
    }

    /// Whether the given (already-normalized) code is excluded.
    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    /// Normalize and vet a code for provider use.
    ///
    /// Returns the canonical uppercase code, or
    /// [`RateError::UnsupportedCurrency`](crate::errors::RateError) when the
    /// code is malformed or excluded. Called before any I/O.
    pub fn vet(&self, code: &str) -> Result<String, crate::errors::RateError> {
        match normalize_code(code) {
            Some(normalized) if !self.contains(&normalized) => Ok(normalized),
            _ => Err(crate::errors::RateError::UnsupportedCurrency(
                code.trim().to_string(),
            )),
        }
    }

    /// Vet an optional list of requested symbols, returning the normalized
    /// list. `None` stays `None` (meaning "the full table").
    pub fn vet_symbols(
        &self,
        symbols: Option<&[String]>,
    ) -> Result<Option<Vec<String>>, crate::errors::RateError> {
        match symbols {
            None => Ok(None),
            Some(list) => list
                .iter()
                .map(|s| self.vet(s))
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
        }
    }
}

impl Default for ExcludedCurrencies {
    /// The stock exclusion list shipped with the service.
    fn default() -> Self {
        Self::from_codes(["TRY"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RateError;

    #[test]
    fn test_decimal_places() {
        assert_eq!(decimal_places("JPY"), 0);
        assert_eq!(decimal_places("KRW"), 0);
        assert_eq!(decimal_places("KWD"), 3);
        assert_eq!(decimal_places("USD"), 2);
        assert_eq!(decimal_places("EUR"), 2);
        assert_eq!(decimal_places("GBP"), 2);
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("usd"), Some("USD".to_string()));
        assert_eq!(normalize_code(" eur "), Some("EUR".to_string()));
        assert_eq!(normalize_code("EURO"), None);
        assert_eq!(normalize_code("E1"), None);
        assert_eq!(normalize_code(""), None);
        assert_eq!(normalize_code("US$"), None);
    }

    #[test]
    fn test_default_set_excludes_try() {
        let excluded = ExcludedCurrencies::default();
        assert!(excluded.contains("TRY"));
        assert!(!excluded.contains("USD"));
    }

    #[test]
    fn test_vet_rejects_excluded_and_malformed() {
        let excluded = ExcludedCurrencies::from_codes(["TRY", "RUB"]);

        assert_eq!(excluded.vet("usd").unwrap(), "USD");
        assert!(matches!(
            excluded.vet("try"),
            Err(RateError::UnsupportedCurrency(_))
        ));
        assert!(matches!(
            excluded.vet("RUB"),
            Err(RateError::UnsupportedCurrency(_))
        ));
        assert!(matches!(
            excluded.vet("not-a-code"),
            Err(RateError::UnsupportedCurrency(_))
        ));
    }

    #[test]
    fn test_vet_symbols() {
        let excluded = ExcludedCurrencies::from_codes(["TRY"]);

        assert_eq!(excluded.vet_symbols(None).unwrap(), None);

        let ok = excluded
            .vet_symbols(Some(&["usd".to_string(), "GBP".to_string()]))
            .unwrap();
        assert_eq!(ok, Some(vec!["USD".to_string(), "GBP".to_string()]));

        let bad = excluded.vet_symbols(Some(&["usd".to_string(), "try".to_string()]));
        assert!(matches!(bad, Err(RateError::UnsupportedCurrency(_))));
    }
}
