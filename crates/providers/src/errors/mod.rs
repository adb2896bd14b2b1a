//! Error types and retry classification for the providers crate.
//!
//! This module provides:
//! - [`RateError`]: The main error enum for all rate-fetching operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur while resolving exchange rates.
///
/// Each variant is classified into a [`RetryClass`] via the
/// [`retry_class`](Self::retry_class) method, which determines how the
/// resilience wrapper handles the error.
#[derive(Error, Debug)]
pub enum RateError {
    /// The currency code is malformed or on the excluded list.
    /// Detected before any I/O; never retried.
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// The upstream returned no data for the requested pair or date.
    /// The request was well-formed; retrying won't help.
    #[error("Rate unavailable: {0}")]
    RateUnavailable(String),

    /// A transport-level failure: timeout, connection failure, 5xx, or 429.
    /// Retried with exponential backoff; counts toward the circuit breaker.
    #[error("Transient upstream failure from {provider}: {message}")]
    TransientUpstream {
        /// The provider that failed
        provider: String,
        /// Description of the transport failure
        message: String,
    },

    /// The upstream rejected the request (4xx) or returned a body we could
    /// not decode. The provider is reachable; never retried.
    #[error("Provider error: {provider} - {message}")]
    Provider {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The circuit breaker is open for this provider; the call was rejected
    /// without touching the network. Carries a distinct reason code so
    /// operators can tell "upstream is down" from "we are protecting it".
    #[error("Circuit open: {0}")]
    CircuitOpen(String),

    /// The configured provider name matches no registered variant.
    /// Fatal at registry construction, not a per-request condition.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

impl RateError {
    /// Returns the retry classification for this error.
    ///
    /// - [`RetryClass::Transient`]: retry with exponential backoff; the
    ///   post-retry outcome counts toward the circuit breaker
    /// - [`RetryClass::Never`]: surface immediately
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::TransientUpstream { .. } => RetryClass::Transient,
            Self::UnsupportedCurrency(_)
            | Self::RateUnavailable(_)
            | Self::Provider { .. }
            | Self::CircuitOpen(_)
            | Self::UnknownProvider(_) => RetryClass::Never,
        }
    }

    /// Map a reqwest transport error to the right taxonomy entry.
    ///
    /// Timeouts and connection failures are transient; anything else
    /// (TLS setup, malformed URL, body decode) is a provider error.
    pub fn transport(provider: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            Self::TransientUpstream {
                provider: provider.to_string(),
                message: err.to_string(),
            }
        } else {
            Self::Provider {
                provider: provider.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Map a non-success HTTP status to the right taxonomy entry.
    ///
    /// 5xx and 429 are transient; other statuses mean the upstream
    /// understood and rejected the request.
    pub fn http_status(provider: &str, status: StatusCode) -> Self {
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            Self::TransientUpstream {
                provider: provider.to_string(),
                message: format!("HTTP {status}"),
            }
        } else {
            Self::Provider {
                provider: provider.to_string(),
                message: format!("HTTP {status}"),
            }
        }
    }

    /// Map a response-body decode failure to a provider error.
    pub fn decode(provider: &str, err: impl std::fmt::Display) -> Self {
        Self::Provider {
            provider: provider.to_string(),
            message: format!("failed to decode response: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_currency_never_retries() {
        let error = RateError::UnsupportedCurrency("TRY".to_string());
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_rate_unavailable_never_retries() {
        let error = RateError::RateUnavailable("USD/GBP".to_string());
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_transient_upstream_retries() {
        let error = RateError::TransientUpstream {
            provider: "FRANKFURTER".to_string(),
            message: "timeout".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Transient);
    }

    #[test]
    fn test_provider_error_never_retries() {
        let error = RateError::Provider {
            provider: "CURRENCYLAYER".to_string(),
            message: "invalid access key".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_circuit_open_never_retries() {
        let error = RateError::CircuitOpen("FRANKFURTER".to_string());
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_server_error_status_is_transient() {
        let error = RateError::http_status("FRANKFURTER", StatusCode::BAD_GATEWAY);
        assert_eq!(error.retry_class(), RetryClass::Transient);
    }

    #[test]
    fn test_too_many_requests_is_transient() {
        let error = RateError::http_status("FRANKFURTER", StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(error.retry_class(), RetryClass::Transient);
    }

    #[test]
    fn test_client_error_status_is_terminal() {
        let error = RateError::http_status("FRANKFURTER", StatusCode::NOT_FOUND);
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_error_display() {
        let error = RateError::UnsupportedCurrency("TRY".to_string());
        assert_eq!(format!("{}", error), "Unsupported currency: TRY");

        let error = RateError::CircuitOpen("FRANKFURTER".to_string());
        assert_eq!(format!("{}", error), "Circuit open: FRANKFURTER");

        let error = RateError::Provider {
            provider: "CURRENCYLAYER".to_string(),
            message: "invalid access key".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Provider error: CURRENCYLAYER - invalid access key"
        );
    }
}
