//! FX module - conversion engine, domain models, and traits.

mod fx_errors;
mod fx_model;
mod fx_service;
mod fx_traits;

pub use fx_errors::{FxError, Result};
pub use fx_model::ConversionResult;
pub use fx_service::FxService;
pub use fx_traits::FxServiceTrait;
