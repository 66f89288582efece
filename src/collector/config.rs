//! Textual configuration for a single Prometheus collector
use log::warn;
use prometheus::proto::MetricType;
use rand::Rng;
use rand::distr::Alphanumeric;
use std::fmt;
use std::str::FromStr;

use super::parse::{parse_buckets, parse_quantiles};
use super::quantile::QuantileDefinition;
use crate::error::CollectorError;
use crate::property::PropertyStore;

/// Property key for the help text
pub const HELP: &str = "collector.help";
/// Property key for the metric name
pub const NAME: &str = "collector.metric_name";
/// Property key for the collector kind
pub const TYPE: &str = "collector.type";
/// Property key for the label names
pub const LABELS: &str = "collector.labels";
/// Property key for the bucket or quantile list
pub const QUANTILES_OR_BUCKETS: &str = "collector.quantiles_or_buckets";

pub const DEFAULT_BUCKET_SIZES: [f64; 4] = [100.0, 500.0, 1000.0, 3000.0];
pub const DEFAULT_BUCKET_SIZES_STRING: &str = "100,500,1000,3000";

pub const DEFAULT_QUANTILES: [QuantileDefinition; 3] = [
    QuantileDefinition::new(0.75, 0.5),
    QuantileDefinition::new(0.95, 0.1),
    QuantileDefinition::new(0.99, 0.01),
];
pub const DEFAULT_QUANTILES_STRING: &str = "0.75,0.5|0.95,0.1|0.99,0.01";

pub const DEFAULT_HELP_STRING: &str = "default help string";
pub const METRIC_NAME_BASE: &str = "jmeter_autogenerated_metric_";

const RANDOM_SUFFIX_LEN: usize = 8;

/// The kind of collector a config produces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CollectorKind {
    #[default]
    Counter,
    Gauge,
    Histogram,
    Summary,
}

impl CollectorKind {
    /// Upper case name, as stored in properties
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectorKind::Counter => "COUNTER",
            CollectorKind::Gauge => "GAUGE",
            CollectorKind::Histogram => "HISTOGRAM",
            CollectorKind::Summary => "SUMMARY",
        }
    }

    /// The Prometheus exposition type
    pub fn metric_type(&self) -> MetricType {
        match self {
            CollectorKind::Counter => MetricType::COUNTER,
            CollectorKind::Gauge => MetricType::GAUGE,
            CollectorKind::Histogram => MetricType::HISTOGRAM,
            CollectorKind::Summary => MetricType::SUMMARY,
        }
    }
}

impl fmt::Display for CollectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectorKind {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COUNTER" => Ok(CollectorKind::Counter),
            "GAUGE" => Ok(CollectorKind::Gauge),
            "HISTOGRAM" => Ok(CollectorKind::Histogram),
            "SUMMARY" => Ok(CollectorKind::Summary),
            other => Err(CollectorError::Config(format!("Unknown collector kind: {}", other))),
        }
    }
}

/// Configuration for one collector, held as the strings a user typed
///
/// The setters apply the defaulting rules, so `help` and `metric_name` are
/// never empty and `labels` never holds an empty entry. The bucket and
/// quantile accessors parse `quantile_or_bucket` on every read.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorConfig {
    help: String,
    metric_name: String,
    kind: CollectorKind,
    labels: Vec<String>,
    quantile_or_bucket: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectorConfig {
    /// A counter with default help text and a random name
    pub fn new() -> Self {
        Self {
            help: DEFAULT_HELP_STRING.to_string(),
            metric_name: Self::random_metric_name(),
            kind: CollectorKind::Counter,
            labels: Vec::new(),
            quantile_or_bucket: String::new(),
        }
    }

    /// `METRIC_NAME_BASE` followed by 8 random alphanumeric characters
    pub fn random_metric_name() -> String {
        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(RANDOM_SUFFIX_LEN)
            .map(char::from)
            .collect();
        format!("{}{}", METRIC_NAME_BASE, suffix)
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn set_help(&mut self, help: &str) {
        self.help = if help.is_empty() {
            DEFAULT_HELP_STRING.to_string()
        } else {
            help.to_string()
        };
    }

    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }

    pub fn set_metric_name(&mut self, name: &str) {
        self.metric_name = if name.is_empty() {
            Self::random_metric_name()
        } else {
            name.to_string()
        };
    }

    pub fn kind(&self) -> CollectorKind {
        self.kind
    }

    /// Set the kind, seeding an empty bucket or quantile list with its default
    pub fn set_kind(&mut self, kind: CollectorKind) {
        self.kind = kind;

        if self.quantile_or_bucket.is_empty() {
            match kind {
                CollectorKind::Histogram => {
                    self.quantile_or_bucket = DEFAULT_BUCKET_SIZES_STRING.to_string()
                }
                CollectorKind::Summary => {
                    self.quantile_or_bucket = DEFAULT_QUANTILES_STRING.to_string()
                }
                CollectorKind::Counter | CollectorKind::Gauge => {}
            }
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Set label names, dropping empty entries and keeping order
    pub fn set_labels<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.labels = labels
            .into_iter()
            .map(|label| label.as_ref().trim().to_string())
            .filter(|label| !label.is_empty())
            .collect();
    }

    /// Set label names from a comma joined string
    pub fn set_labels_str(&mut self, labels: &str) {
        self.set_labels(labels.split(','));
    }

    pub fn labels_as_string(&self) -> String {
        self.labels.join(",")
    }

    pub fn quantile_or_bucket(&self) -> &str {
        &self.quantile_or_bucket
    }

    pub fn set_quantile_or_bucket(&mut self, quantile_or_bucket: &str) {
        self.quantile_or_bucket = quantile_or_bucket.to_string();
    }

    /// Histogram bucket boundaries, falling back to `DEFAULT_BUCKET_SIZES`
    pub fn buckets(&self) -> Vec<f64> {
        if self.quantile_or_bucket.is_empty() {
            return DEFAULT_BUCKET_SIZES.to_vec();
        }

        let buckets = parse_buckets(&self.quantile_or_bucket, &self.metric_name);
        if buckets.is_empty() {
            warn!(
                "Did not parse any buckets for metric {}. Returning defaults",
                self.metric_name
            );
            return DEFAULT_BUCKET_SIZES.to_vec();
        }

        buckets
    }

    /// Summary quantiles, falling back to `DEFAULT_QUANTILES`
    pub fn quantiles(&self) -> Vec<QuantileDefinition> {
        if self.quantile_or_bucket.is_empty() {
            return DEFAULT_QUANTILES.to_vec();
        }

        let quantiles = parse_quantiles(&self.quantile_or_bucket, &self.metric_name);
        if quantiles.is_empty() {
            warn!(
                "Did not parse any quantiles for metric {}. Returning defaults",
                self.metric_name
            );
            return DEFAULT_QUANTILES.to_vec();
        }

        quantiles
    }

    /// Write every field into a property store
    pub fn save<P: PropertyStore + ?Sized>(&self, store: &mut P) {
        store.set_string(HELP, &self.help);
        store.set_string(NAME, &self.metric_name);
        store.set_string(TYPE, self.kind.as_str());
        store.set_string_list(LABELS, &self.labels);
        store.set_string(QUANTILES_OR_BUCKETS, &self.quantile_or_bucket);
    }

    /// Read a config back from a property store
    ///
    /// Missing fields take their defaults and an unknown kind falls back to
    /// a counter.
    pub fn from_properties<P: PropertyStore + ?Sized>(store: &P) -> Self {
        let mut config = Self::new();
        config.set_help(&store.get_string(HELP, DEFAULT_HELP_STRING));
        config.set_metric_name(&store.get_string(NAME, ""));
        config.set_labels(store.get_string_list(LABELS));
        config.set_quantile_or_bucket(&store.get_string(QUANTILES_OR_BUCKETS, ""));

        let kind_name = store.get_string(TYPE, CollectorKind::Counter.as_str());
        let kind = kind_name.parse().unwrap_or_else(|e| {
            warn!("{} for metric {}, using COUNTER", e, config.metric_name);
            CollectorKind::Counter
        });
        config.set_kind(kind);

        config
    }
}

impl fmt::Display for CollectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}: {}, {}: {}, {}: {}, {}: {}, {}: {}]",
            HELP,
            self.help,
            NAME,
            self.metric_name,
            TYPE,
            self.kind,
            LABELS,
            self.labels_as_string(),
            QUANTILES_OR_BUCKETS,
            self.quantile_or_bucket
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::quantile::quantiles_to_string;
    use crate::property::PropertyMap;

    fn with_field(kind: CollectorKind, field: &str) -> CollectorConfig {
        let mut config = CollectorConfig::new();
        config.set_metric_name("test_metric");
        config.set_quantile_or_bucket(field);
        config.set_kind(kind);
        config
    }

    #[test]
    fn test_new_defaults() {
        let config = CollectorConfig::new();
        assert_eq!(config.help(), DEFAULT_HELP_STRING);
        assert_eq!(config.kind(), CollectorKind::Counter);
        assert!(config.labels().is_empty());
        assert!(config.quantile_or_bucket().is_empty());
        assert!(config.metric_name().starts_with(METRIC_NAME_BASE));
    }

    #[test]
    fn test_empty_help_falls_back() {
        let mut config = CollectorConfig::new();
        config.set_help("requests served");
        assert_eq!(config.help(), "requests served");
        config.set_help("");
        assert_eq!(config.help(), DEFAULT_HELP_STRING);
    }

    #[test]
    fn test_empty_metric_name_is_generated() {
        let mut config = CollectorConfig::new();
        config.set_metric_name("");
        let first = config.metric_name().to_string();

        let suffix = first.strip_prefix(METRIC_NAME_BASE).unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));

        config.set_metric_name("");
        assert_ne!(config.metric_name(), first);
    }

    #[test]
    fn test_metric_name_kept_verbatim() {
        let mut config = CollectorConfig::new();
        config.set_metric_name("http_requests_total");
        assert_eq!(config.metric_name(), "http_requests_total");
    }

    #[test]
    fn test_set_labels_drops_empty_entries() {
        let mut config = CollectorConfig::new();
        config.set_labels(["a", "", "b", ""]);
        assert_eq!(config.labels(), ["a", "b"]);

        config.set_labels_str("code,,method,");
        assert_eq!(config.labels(), ["code", "method"]);
        assert_eq!(config.labels_as_string(), "code,method");
    }

    #[test]
    fn test_kind_seeds_defaults_only_when_empty() {
        let mut histogram = CollectorConfig::new();
        histogram.set_kind(CollectorKind::Histogram);
        assert_eq!(histogram.quantile_or_bucket(), DEFAULT_BUCKET_SIZES_STRING);

        let mut summary = CollectorConfig::new();
        summary.set_kind(CollectorKind::Summary);
        assert_eq!(summary.quantile_or_bucket(), DEFAULT_QUANTILES_STRING);

        let kept = with_field(CollectorKind::Summary, "0.5,0.05");
        assert_eq!(kept.quantile_or_bucket(), "0.5,0.05");

        let mut gauge = CollectorConfig::new();
        gauge.set_kind(CollectorKind::Gauge);
        assert!(gauge.quantile_or_bucket().is_empty());
    }

    #[test]
    fn test_default_quantile_string_matches_definitions() {
        assert_eq!(quantiles_to_string(&DEFAULT_QUANTILES), DEFAULT_QUANTILES_STRING);
    }

    #[test]
    fn test_buckets() {
        let config = with_field(CollectorKind::Histogram, "100,200,300,400.3");
        assert_eq!(config.buckets(), vec![100.0, 200.0, 300.0, 400.3]);

        let config = with_field(CollectorKind::Histogram, "1,oops,2");
        assert_eq!(config.buckets(), vec![1.0, 2.0]);

        let config = with_field(CollectorKind::Histogram, "oops,nope");
        assert_eq!(config.buckets(), DEFAULT_BUCKET_SIZES.to_vec());

        let config = with_field(CollectorKind::Histogram, "NaN,inf");
        assert_eq!(config.buckets(), DEFAULT_BUCKET_SIZES.to_vec());

        let config = with_field(CollectorKind::Counter, "");
        assert_eq!(config.buckets(), DEFAULT_BUCKET_SIZES.to_vec());
    }

    #[test]
    fn test_quantiles() {
        let config = with_field(CollectorKind::Summary, "0.999,0.1|0.99,0.2|0.75,0.3");
        assert_eq!(
            config.quantiles(),
            vec![
                QuantileDefinition::new(0.999, 0.1),
                QuantileDefinition::new(0.99, 0.2),
                QuantileDefinition::new(0.75, 0.3),
            ]
        );

        let config = with_field(CollectorKind::Summary, "0.5|0.9,0.1");
        assert_eq!(config.quantiles(), vec![QuantileDefinition::new(0.9, 0.1)]);

        let config = with_field(CollectorKind::Summary, "0.5|x,y");
        assert_eq!(config.quantiles(), DEFAULT_QUANTILES.to_vec());

        let config = with_field(CollectorKind::Counter, "");
        assert_eq!(config.quantiles(), DEFAULT_QUANTILES.to_vec());
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("histogram".parse::<CollectorKind>().unwrap(), CollectorKind::Histogram);
        assert_eq!(" SUMMARY ".parse::<CollectorKind>().unwrap(), CollectorKind::Summary);
        assert!("timer".parse::<CollectorKind>().is_err());
        assert_eq!(CollectorKind::Gauge.to_string(), "GAUGE");
    }

    #[test]
    fn test_property_round_trip_keeps_custom_buckets() {
        let mut config = CollectorConfig::new();
        config.set_metric_name("latency_ms");
        config.set_help("latency");
        config.set_labels(["route"]);
        config.set_quantile_or_bucket("5,10,20");
        config.set_kind(CollectorKind::Histogram);

        let mut props = PropertyMap::new();
        config.save(&mut props);

        assert_eq!(CollectorConfig::from_properties(&props), config);
    }

    #[test]
    fn test_from_properties_unknown_kind() {
        let mut props = PropertyMap::new();
        props.set_string(NAME, "x_total");
        props.set_string(TYPE, "TIMER");

        let config = CollectorConfig::from_properties(&props);
        assert_eq!(config.kind(), CollectorKind::Counter);
        assert_eq!(config.metric_name(), "x_total");
        assert_eq!(config.help(), DEFAULT_HELP_STRING);
    }

    #[test]
    fn test_display_lists_every_field() {
        let mut config = CollectorConfig::new();
        config.set_metric_name("m");
        config.set_help("h");
        config.set_labels(["a", "b"]);

        assert_eq!(
            config.to_string(),
            "[collector.help: h, collector.metric_name: m, collector.type: COUNTER, \
             collector.labels: a,b, collector.quantiles_or_buckets: ]"
        );
    }
}
