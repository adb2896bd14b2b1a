//! Currex Core - conversion engine, smart cache, and configuration.
//!
//! This crate contains the service layer of the currex system. It sits
//! on top of `currex-providers` and exposes the boundary consumed by
//! outer collaborators (HTTP controllers, CLIs): amount conversion,
//! latest/historical/range rate retrieval, and currency-support checks.
//!
//! The cache is process-local; rate tables are cached whole per base
//! currency with a TTL derived from the upstream publication schedule,
//! and cross-rates are triangulated through a configured home currency.

pub mod cache;
pub mod config;
pub mod fx;

// Re-export common types from the fx module
pub use fx::{ConversionResult, FxError, FxService, FxServiceTrait, Result};

// Re-export cache types
pub use cache::{SmartCache, TtlPolicy};

// Re-export configuration
pub use config::{CacheSettings, ResilienceSettings, Settings};

// Re-export the provider-facing model for convenience
pub use currex_providers::{Rate, RateError, RateTable};
