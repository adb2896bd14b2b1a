use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The outcome of a currency conversion.
///
/// `converted_amount` is rounded to the target currency's canonical
/// precision; `rate` is carried unrounded together with its provenance.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub amount: Decimal,
    pub from_currency: String,
    pub to_currency: String,
    pub converted_amount: Decimal,
    pub rate: Decimal,
    pub rate_timestamp: DateTime<Utc>,
    pub rate_source: String,
}
