//! Parsers for the bucket and quantile list formats
//!
//! Buckets are a comma separated list of decimals, e.g. `100,200,300,400.3`.
//! Quantiles are `quantile,error` pairs separated by `|`, e.g.
//! `0.999,0.1|0.99,0.2|0.75,0.3`.
//!
//! Malformed tokens are logged and skipped. Neither parser substitutes
//! defaults; an empty result is returned as such.
use log::warn;

use super::quantile::{QUANTILE_DEFINITION_SEPARATOR, QuantileDefinition};

/// Separator between bucket boundaries
pub const BUCKET_SEPARATOR: char = ',';

/// Parse a bucket list, dropping tokens that are not finite numbers
pub fn parse_buckets(list: &str, metric_name: &str) -> Vec<f64> {
    list.split(BUCKET_SEPARATOR)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| match token.parse::<f64>() {
            Ok(bucket) if bucket.is_finite() => Some(bucket),
            Ok(_) => {
                warn!(
                    "couldn't use {} because it is not a finite number. It won't be included in buckets for the metric {}",
                    token, metric_name
                );
                None
            }
            Err(e) => {
                warn!(
                    "couldn't parse {} because of error {}. It won't be included in buckets for the metric {}",
                    token, e, metric_name
                );
                None
            }
        })
        .collect()
}

/// Parse a quantile list, dropping definitions that are malformed
pub fn parse_quantiles(list: &str, metric_name: &str) -> Vec<QuantileDefinition> {
    list.split(QUANTILE_DEFINITION_SEPARATOR)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| match token.parse::<QuantileDefinition>() {
            Ok(definition) => Some(definition),
            Err(e) => {
                warn!(
                    "couldn't parse {} because of error {}. It won't be included in quantiles for the metric {}",
                    token, e, metric_name
                );
                None
            }
        })
        .collect()
}
