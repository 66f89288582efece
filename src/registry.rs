use log::{info, warn};
use prometheus::{Encoder, Registry, TextEncoder};
use std::collections::BTreeMap;

use crate::collector::{CollectorConfig, CollectorFactory, MetricCollector};
use crate::error::{CollectorError, Result};

/// The collectors committed for a run, indexed by metric name
pub struct CollectorRegistry {
    factory: CollectorFactory,
    collectors: BTreeMap<String, MetricCollector>,
}

impl CollectorRegistry {
    /// Create a registry that registers into `registry`
    pub fn new(registry: Registry) -> Self {
        Self {
            factory: CollectorFactory::new(registry),
            collectors: BTreeMap::new(),
        }
    }

    /// Commit one config, returning `None` if its collector could not be built
    pub fn register(&mut self, cfg: &CollectorConfig) -> Option<&MetricCollector> {
        let collector = self.factory.from_kind(cfg)?;
        let name = collector.name().to_string();
        Some(&*self.collectors.entry(name).or_insert(collector))
    }

    /// Commit every config, skipping the ones that fail; returns how many succeeded
    pub fn register_all<'a, I>(&mut self, configs: I) -> usize
    where
        I: IntoIterator<Item = &'a CollectorConfig>,
    {
        let mut registered = 0;
        let mut skipped = 0;

        for cfg in configs {
            if self.register(cfg).is_some() {
                registered += 1;
            } else {
                skipped += 1;
            }
        }

        if skipped > 0 {
            warn!("Skipped {} collector(s) that could not be registered", skipped);
        }
        info!("Registered {} collector(s)", registered);
        registered
    }

    /// Get a collector by metric name
    pub fn get(&self, name: &str) -> Option<&MetricCollector> {
        self.collectors.get(name)
    }

    /// Registered metric names, in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.collectors.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// Record a value against a registered collector
    pub fn observe(&self, name: &str, label_values: &[&str], value: f64) -> Result<()> {
        self.collectors
            .get(name)
            .ok_or_else(|| CollectorError::NotFound(name.to_string()))?
            .observe(label_values, value)
    }

    /// Render everything in the underlying registry in the Prometheus text format
    pub fn gather_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let families = self.factory.registry().gather();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| CollectorError::Metric(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::CollectorKind;

    fn config(name: &str, kind: CollectorKind, labels: &str) -> CollectorConfig {
        let mut cfg = CollectorConfig::new();
        cfg.set_metric_name(name);
        cfg.set_help(&format!("{} help", name));
        cfg.set_labels_str(labels);
        cfg.set_kind(kind);
        cfg
    }

    #[test]
    fn test_register_all_skips_failures() {
        let configs = vec![
            config("samples_total", CollectorKind::Counter, "label"),
            config("samples_total", CollectorKind::Counter, "label"),
            config("bad name", CollectorKind::Gauge, ""),
            config("response_ms", CollectorKind::Histogram, ""),
        ];

        let mut registry = CollectorRegistry::new(Registry::new());
        assert_eq!(registry.register_all(&configs), 2);
        assert_eq!(registry.names(), vec!["response_ms", "samples_total"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_observe_by_name() {
        let mut registry = CollectorRegistry::new(Registry::new());
        registry.register(&config("samples_total", CollectorKind::Counter, "label"));

        registry.observe("samples_total", &["login"], 2.0).unwrap();
        assert!(matches!(
            registry.observe("missing", &[], 1.0),
            Err(CollectorError::NotFound(_))
        ));

        let text = registry.gather_text().unwrap();
        assert!(text.contains("# HELP samples_total samples_total help"));
        assert!(text.contains("# TYPE samples_total counter"));
        assert!(text.contains("samples_total{label=\"login\"} 2"));
    }

    #[test]
    fn test_summary_text_exposition() {
        let mut registry = CollectorRegistry::new(Registry::new());
        let mut cfg = config("rt", CollectorKind::Summary, "");
        cfg.set_quantile_or_bucket("0.5,0.05");
        registry.register(&cfg).unwrap();

        registry.observe("rt", &[], 4.0).unwrap();

        let text = registry.gather_text().unwrap();
        assert!(text.contains("# TYPE rt summary"));
        assert!(text.contains("rt{quantile=\"0.5\"} 4"));
        assert!(text.contains("rt_sum 4"));
        assert!(text.contains("rt_count 1"));
    }
}
