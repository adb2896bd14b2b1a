//! Service-level error type.
//!
//! Input validation failures are detected here, before any I/O;
//! everything the provider layer can produce passes through unchanged so
//! callers always receive exactly one typed failure.

use rust_decimal::Decimal;
use thiserror::Error;

use currex_providers::RateError;

/// Type alias for Result using our error type.
pub type Result<T> = std::result::Result<T, FxError>;

/// Errors surfaced by the conversion engine.
#[derive(Error, Debug)]
pub enum FxError {
    /// The currency code is malformed or excluded. A client-input error,
    /// raised before any cache or provider interaction.
    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    /// The amount is zero or negative.
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// A configuration value could not be interpreted. Fatal at service
    /// construction, never a per-request condition.
    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    /// A failure from the provider layer, passed through unchanged
    /// (transient upstream failures, open circuits, unavailable rates,
    /// unknown provider names).
    #[error(transparent)]
    Rate(#[from] RateError),
}
