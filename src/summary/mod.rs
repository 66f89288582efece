//! A Prometheus summary collector with configurable quantile targets
//!
//! The `prometheus` crate ships counters, gauges and histograms but no
//! summary. `SummaryVec` fills that gap and registers like any other
//! collector.
mod ckms;

use prometheus::core::{Collector, Desc};
use prometheus::proto::{self, LabelPair, MetricFamily, MetricType};
use prometheus::{Error as PrometheusError, Opts};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::collector::QuantileDefinition;
use ckms::Ckms;

struct SummaryCore {
    count: u64,
    sum: f64,
    stream: Ckms,
}

/// A single summary series
#[derive(Clone)]
pub struct Summary {
    core: Arc<Mutex<SummaryCore>>,
    quantiles: Arc<[QuantileDefinition]>,
}

impl Summary {
    fn new(quantiles: Arc<[QuantileDefinition]>) -> Self {
        Self {
            core: Arc::new(Mutex::new(SummaryCore {
                count: 0,
                sum: 0.0,
                stream: Ckms::new(&quantiles),
            })),
            quantiles,
        }
    }

    /// Record one observation
    pub fn observe(&self, value: f64) {
        let mut core = self.core.lock().unwrap_or_else(PoisonError::into_inner);
        core.count += 1;
        core.sum += value;
        core.stream.insert(value);
    }

    pub fn get_sample_count(&self) -> u64 {
        self.core.lock().unwrap_or_else(PoisonError::into_inner).count
    }

    pub fn get_sample_sum(&self) -> f64 {
        self.core.lock().unwrap_or_else(PoisonError::into_inner).sum
    }

    /// Current estimate for quantile `q`, NaN before the first observation
    pub fn quantile(&self, q: f64) -> f64 {
        self.core
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stream
            .query(q)
    }

    fn metric(&self, labels: Vec<LabelPair>) -> proto::Metric {
        let mut core = self.core.lock().unwrap_or_else(PoisonError::into_inner);

        let quantiles: Vec<proto::Quantile> = self
            .quantiles
            .iter()
            .map(|definition| {
                let mut quantile = proto::Quantile::default();
                quantile.set_quantile(definition.quantile);
                quantile.set_value(core.stream.query(definition.quantile));
                quantile
            })
            .collect();

        let mut summary = proto::Summary::default();
        summary.set_sample_count(core.count);
        summary.set_sample_sum(core.sum);
        summary.set_quantile(quantiles.into());

        let mut metric = proto::Metric::default();
        metric.set_label(labels.into());
        metric.set_summary(summary);
        metric
    }
}

struct SummaryVecCore {
    desc: Desc,
    quantiles: Arc<[QuantileDefinition]>,
    children: RwLock<BTreeMap<Vec<String>, Summary>>,
}

/// A family of summaries partitioned by label values
#[derive(Clone)]
pub struct SummaryVec {
    inner: Arc<SummaryVecCore>,
}

impl SummaryVec {
    /// Create a summary family
    ///
    /// Every quantile and error must lie in `[0, 1]`.
    pub fn new(
        opts: Opts,
        label_names: &[&str],
        quantiles: &[QuantileDefinition],
    ) -> prometheus::Result<Self> {
        for definition in quantiles {
            if !(0.0..=1.0).contains(&definition.quantile) {
                return Err(PrometheusError::Msg(format!(
                    "quantile {} is not in [0, 1]",
                    definition.quantile
                )));
            }
            if !(0.0..=1.0).contains(&definition.error) {
                return Err(PrometheusError::Msg(format!(
                    "error {} for quantile {} is not in [0, 1]",
                    definition.error, definition.quantile
                )));
            }
        }

        let desc = Desc::new(
            opts.fq_name(),
            opts.help.clone(),
            label_names.iter().map(|name| name.to_string()).collect(),
            opts.const_labels.clone(),
        )?;

        Ok(Self {
            inner: Arc::new(SummaryVecCore {
                desc,
                quantiles: quantiles.into(),
                children: RwLock::new(BTreeMap::new()),
            }),
        })
    }

    /// The quantile targets every series reports
    pub fn quantiles(&self) -> &[QuantileDefinition] {
        &self.inner.quantiles
    }

    /// Get or create the series for the given label values
    pub fn get_metric_with_label_values(&self, values: &[&str]) -> prometheus::Result<Summary> {
        let expected = self.inner.desc.variable_labels.len();
        if values.len() != expected {
            return Err(PrometheusError::InconsistentCardinality {
                expect: expected,
                got: values.len(),
            });
        }

        let key: Vec<String> = values.iter().map(|v| v.to_string()).collect();

        if let Some(summary) = self
            .inner
            .children
            .read()
            .map_err(|_| PrometheusError::Msg("Lock poisoned".to_string()))?
            .get(&key)
        {
            return Ok(summary.clone());
        }

        let mut children = self
            .inner
            .children
            .write()
            .map_err(|_| PrometheusError::Msg("Lock poisoned".to_string()))?;
        Ok(children
            .entry(key)
            .or_insert_with(|| Summary::new(Arc::clone(&self.inner.quantiles)))
            .clone())
    }

    fn label_pairs(&self, values: &[String]) -> Vec<LabelPair> {
        let desc = &self.inner.desc;
        let mut pairs: Vec<LabelPair> = desc.const_label_pairs.clone();
        for (name, value) in desc.variable_labels.iter().zip(values) {
            let mut pair = LabelPair::default();
            pair.set_name(name.clone());
            pair.set_value(value.clone());
            pairs.push(pair);
        }
        pairs.sort_by(|a, b| a.get_name().cmp(b.get_name()));
        pairs
    }
}

impl Collector for SummaryVec {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.inner.desc]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let children = self
            .inner
            .children
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let metrics: Vec<proto::Metric> = children
            .iter()
            .map(|(values, summary)| summary.metric(self.label_pairs(values)))
            .collect();

        let mut family = MetricFamily::default();
        family.set_name(self.inner.desc.fq_name.clone());
        family.set_help(self.inner.desc.help.clone());
        family.set_field_type(MetricType::SUMMARY);
        family.set_metric(metrics.into());
        vec![family]
    }
}
