//! Currex Providers Crate
//!
//! This crate provides provider-agnostic exchange-rate fetching for the
//! currex service.
//!
//! # Overview
//!
//! The providers crate supports:
//! - Multiple upstream rate sources behind one trait: Frankfurter,
//!   ExchangeRate Host, Currencylayer
//! - Per-provider resilience: bounded retry with exponential backoff and
//!   a circuit breaker per provider instance
//! - A configuration-driven registry that resolves the active provider
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +--------------------+
//! |  Service Layer   | --> |  ProviderRegistry  |  (active / enabled lookup)
//! +------------------+     +--------------------+
//!                                    |
//!                                    v
//!                          +--------------------+
//!                          | ResilientProvider  |  (retry + circuit breaker)
//!                          +--------------------+
//!                                    |
//!                                    v
//!                          +--------------------+
//!                          |   RateProvider     |  (Frankfurter, etc.)
//!                          +--------------------+
//!                                    |
//!                                    v
//!                          +--------------------+
//!                          |     RateTable      |  (base -> target rates)
//!                          +--------------------+
//! ```
//!
//! # Core Types
//!
//! - [`Rate`] - A single directed exchange rate observation
//! - [`RateTable`] - A base currency's full rate table, the unit of caching
//! - [`RateProvider`] - Trait implemented by every upstream source
//! - [`ResilientProvider`] - Decorator adding retry and circuit breaking
//! - [`ProviderRegistry`] - Name-to-instance registry built from configuration
//! - [`ExcludedCurrencies`] - Process-wide read-only set of rejected codes

pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;
pub mod resilience;

// Re-export all public types from models
pub use models::{
    decimal_places, normalize_code, ExcludedCurrencies, Rate, RateTable, DIRECT_SOURCE,
};

// Re-export provider types
pub use provider::currencylayer::CurrencylayerProvider;
pub use provider::exchangerate_host::ExchangeRateHostProvider;
pub use provider::frankfurter::FrankfurterProvider;
pub use provider::{ProviderCapabilities, RateProvider};

// Re-export resilience types
pub use resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, ResilientProvider, RetryPolicy,
};

// Re-export registry types
pub use registry::{ProviderRegistry, ProviderRegistryBuilder, ProviderSettings};

// Re-export error types
pub use errors::{RateError, RetryClass};
