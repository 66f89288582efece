use log::{debug, error};
use prometheus::core::{Collector, Desc};
use prometheus::{CounterVec, GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry};

use super::config::{CollectorConfig, CollectorKind};
use crate::error::{CollectorError, Result};
use crate::summary::SummaryVec;

/// A collector built from a `CollectorConfig`
#[derive(Clone)]
pub enum MetricCollector {
    Counter(CounterVec),
    Gauge(GaugeVec),
    Histogram(HistogramVec),
    Summary(SummaryVec),
}

impl MetricCollector {
    pub fn kind(&self) -> CollectorKind {
        match self {
            MetricCollector::Counter(_) => CollectorKind::Counter,
            MetricCollector::Gauge(_) => CollectorKind::Gauge,
            MetricCollector::Histogram(_) => CollectorKind::Histogram,
            MetricCollector::Summary(_) => CollectorKind::Summary,
        }
    }

    fn collector(&self) -> &dyn Collector {
        match self {
            MetricCollector::Counter(c) => c,
            MetricCollector::Gauge(g) => g,
            MetricCollector::Histogram(h) => h,
            MetricCollector::Summary(s) => s,
        }
    }

    fn boxed(&self) -> Box<dyn Collector> {
        match self {
            MetricCollector::Counter(c) => Box::new(c.clone()),
            MetricCollector::Gauge(g) => Box::new(g.clone()),
            MetricCollector::Histogram(h) => Box::new(h.clone()),
            MetricCollector::Summary(s) => Box::new(s.clone()),
        }
    }

    fn desc(&self) -> Option<&Desc> {
        self.collector().desc().into_iter().next()
    }

    /// The fully qualified metric name
    pub fn name(&self) -> &str {
        self.desc().map(|d| d.fq_name.as_str()).unwrap_or_default()
    }

    pub fn help(&self) -> &str {
        self.desc().map(|d| d.help.as_str()).unwrap_or_default()
    }

    pub fn label_names(&self) -> &[String] {
        self.desc().map(|d| d.variable_labels.as_slice()).unwrap_or_default()
    }

    /// Record a value for the series identified by `label_values`
    ///
    /// Counters are incremented by `value`, gauges are set to it, histograms
    /// and summaries observe it.
    pub fn observe(&self, label_values: &[&str], value: f64) -> Result<()> {
        match self {
            MetricCollector::Counter(c) => {
                if !(value >= 0.0) {
                    return Err(CollectorError::Metric(format!(
                        "counter {} cannot be increased by {}",
                        self.name(),
                        value
                    )));
                }
                c.get_metric_with_label_values(label_values)?.inc_by(value);
            }
            MetricCollector::Gauge(g) => g.get_metric_with_label_values(label_values)?.set(value),
            MetricCollector::Histogram(h) => {
                h.get_metric_with_label_values(label_values)?.observe(value)
            }
            MetricCollector::Summary(s) => {
                s.get_metric_with_label_values(label_values)?.observe(value)
            }
        }
        Ok(())
    }

    /// Create the unlabelled series so it is exposed before the first observation
    fn touch_unlabelled(&self) -> Result<()> {
        if !self.label_names().is_empty() {
            return Ok(());
        }
        match self {
            MetricCollector::Counter(c) => drop(c.get_metric_with_label_values(&[])?),
            MetricCollector::Gauge(g) => drop(g.get_metric_with_label_values(&[])?),
            MetricCollector::Histogram(h) => drop(h.get_metric_with_label_values(&[])?),
            MetricCollector::Summary(s) => drop(s.get_metric_with_label_values(&[])?),
        }
        Ok(())
    }
}

impl std::fmt::Debug for MetricCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricCollector")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .field("labels", &self.label_names())
            .finish()
    }
}

fn label_refs(cfg: &CollectorConfig) -> Vec<&str> {
    cfg.labels().iter().map(String::as_str).collect()
}

/// Builds collectors from configs and registers them
///
/// The `new_*` builders only construct; `from_kind` also registers with the
/// factory's registry, which is where duplicate names are rejected.
#[derive(Clone)]
pub struct CollectorFactory {
    registry: Registry,
}

impl Default for CollectorFactory {
    /// A factory registering with the process-wide default registry
    fn default() -> Self {
        Self::new(prometheus::default_registry().clone())
    }
}

impl CollectorFactory {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn new_counter(cfg: &CollectorConfig) -> Result<CounterVec> {
        let opts = Opts::new(cfg.metric_name(), cfg.help());
        Ok(CounterVec::new(opts, &label_refs(cfg))?)
    }

    pub fn new_gauge(cfg: &CollectorConfig) -> Result<GaugeVec> {
        let opts = Opts::new(cfg.metric_name(), cfg.help());
        Ok(GaugeVec::new(opts, &label_refs(cfg))?)
    }

    /// Bucket order is left to the histogram, which rejects unsorted boundaries
    pub fn new_histogram(cfg: &CollectorConfig) -> Result<HistogramVec> {
        let opts = HistogramOpts::new(cfg.metric_name(), cfg.help()).buckets(cfg.buckets());
        // a vec only checks its buckets when the first series is created
        Histogram::with_opts(opts.clone())?;
        Ok(HistogramVec::new(opts, &label_refs(cfg))?)
    }

    pub fn new_summary(cfg: &CollectorConfig) -> Result<SummaryVec> {
        let opts = Opts::new(cfg.metric_name(), cfg.help());
        Ok(SummaryVec::new(opts, &label_refs(cfg), &cfg.quantiles())?)
    }

    /// Construct the collector for the config's kind without registering it
    pub fn build(cfg: &CollectorConfig) -> Result<MetricCollector> {
        let collector = match cfg.kind() {
            CollectorKind::Counter => MetricCollector::Counter(Self::new_counter(cfg)?),
            CollectorKind::Gauge => MetricCollector::Gauge(Self::new_gauge(cfg)?),
            CollectorKind::Histogram => MetricCollector::Histogram(Self::new_histogram(cfg)?),
            CollectorKind::Summary => MetricCollector::Summary(Self::new_summary(cfg)?),
        };
        collector.touch_unlabelled()?;
        Ok(collector)
    }

    /// Build and register, returning the error on failure
    pub fn try_from_kind(&self, cfg: &CollectorConfig) -> Result<MetricCollector> {
        let collector = Self::build(cfg)?;
        self.registry.register(collector.boxed())?;
        debug!("Registered {} {}", collector.kind(), collector.name());
        Ok(collector)
    }

    /// Build and register, logging and yielding `None` on failure
    pub fn from_kind(&self, cfg: &CollectorConfig) -> Option<MetricCollector> {
        match self.try_from_kind(cfg) {
            Ok(collector) => Some(collector),
            Err(e) => {
                error!(
                    "Didn't create collector from definition {} because of an error: {}",
                    cfg, e
                );
                None
            }
        }
    }
}
