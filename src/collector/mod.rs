mod config;
mod factory;
mod parse;
mod quantile;

// Re-export public items
pub use self::config::{
    CollectorConfig, CollectorKind, DEFAULT_BUCKET_SIZES, DEFAULT_BUCKET_SIZES_STRING,
    DEFAULT_HELP_STRING, DEFAULT_QUANTILES, DEFAULT_QUANTILES_STRING, HELP, LABELS,
    METRIC_NAME_BASE, NAME, QUANTILES_OR_BUCKETS, TYPE,
};
pub use self::factory::{CollectorFactory, MetricCollector};
pub use self::parse::{BUCKET_SEPARATOR, parse_buckets, parse_quantiles};
pub use self::quantile::{
    QUANTILE_DEFINITION_SEPARATOR, QUANTILE_ERROR_SEPARATOR, QuantileDefinition,
    quantiles_to_string,
};
