use config::{self, File, FileFormat};
use log::{debug, error};
use serde::Deserialize;
use std::path::Path;

use crate::collector::{CollectorConfig, CollectorKind};
use crate::error::{CollectorError, Result};

/// Label names, either as a list or as one comma joined string
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum LabelSpec {
    List(Vec<String>),
    Joined(String),
}

impl Default for LabelSpec {
    fn default() -> Self {
        LabelSpec::List(Vec::new())
    }
}

/// One collector entry in a definitions file
#[derive(Debug, Deserialize, Clone, Default)]
pub struct CollectorDefinition {
    /// Metric name; generated when empty
    #[serde(default)]
    pub metric_name: String,
    /// Help text; defaulted when empty
    #[serde(default)]
    pub help: String,
    /// Collector kind, case-insensitive; counter when omitted
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub labels: LabelSpec,
    /// Bucket list for histograms or quantile list for summaries
    #[serde(default)]
    pub quantiles_or_buckets: String,
}

impl CollectorDefinition {
    /// Turn the entry into a config, applying the usual defaulting rules
    pub fn to_config(&self) -> Result<CollectorConfig> {
        let kind = match &self.kind {
            Some(kind) => kind.parse::<CollectorKind>()?,
            None => CollectorKind::Counter,
        };

        let mut cfg = CollectorConfig::new();
        cfg.set_help(&self.help);
        cfg.set_metric_name(&self.metric_name);
        match &self.labels {
            LabelSpec::List(labels) => cfg.set_labels(labels),
            LabelSpec::Joined(labels) => cfg.set_labels_str(labels),
        }
        cfg.set_quantile_or_bucket(&self.quantiles_or_buckets);
        cfg.set_kind(kind);
        Ok(cfg)
    }
}

/// Logging level
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level
    #[default]
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

/// A file of collector definitions
#[derive(Debug, Deserialize, Clone, Default)]
pub struct CollectorFile {
    /// Logging level
    #[serde(default)]
    pub log_level: LogLevel,
    /// Collector entries, in file order
    #[serde(default)]
    pub collectors: Vec<CollectorDefinition>,
}

impl CollectorFile {
    /// Convert every entry; fails on the first entry with an unknown kind
    pub fn configs(&self) -> Result<Vec<CollectorConfig>> {
        self.collectors
            .iter()
            .map(CollectorDefinition::to_config)
            .collect()
    }
}

/// Pick the file format from a path's extension
fn format_for(path: &Path) -> Result<FileFormat> {
    let extension = match path.extension() {
        Some(ext) => ext.to_string_lossy().to_lowercase(),
        None => {
            error!("Collector file has no extension");
            return Err(CollectorError::Config(format!(
                "Collector file has no extension: {}",
                path.display()
            )));
        }
    };

    match extension.as_str() {
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        format => {
            error!("Unsupported collector file format: {}", format);
            Err(CollectorError::Config(format!(
                "Unsupported config format: {}",
                format
            )))
        }
    }
}

fn deserialize(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<CollectorFile> {
    let config = builder
        .build()
        .map_err(|e| CollectorError::Config(format!("Failed to build configuration: {}", e)))?;

    let file: CollectorFile = config
        .try_deserialize()
        .map_err(|e| CollectorError::Config(format!("Failed to deserialize configuration: {}", e)))?;

    debug!("Loaded {} collector definition(s)", file.collectors.len());
    Ok(file)
}

/// Load collector definitions from a TOML, JSON or YAML file
pub fn load_collectors<P: AsRef<Path>>(path: P) -> Result<CollectorFile> {
    let path = path.as_ref();
    debug!("Loading collector definitions from {}", path.display());

    if !path.exists() {
        error!("Collector file {} does not exist", path.display());
        return Err(CollectorError::Config(format!(
            "Collector file not found: {}",
            path.display()
        )));
    }

    let format = format_for(path)?;
    deserialize(config::Config::builder().add_source(File::from(path).format(format)))
}

/// Parse collector definitions from a string in the given format
pub fn parse_collectors(content: &str, format: FileFormat) -> Result<CollectorFile> {
    deserialize(config::Config::builder().add_source(File::from_str(content, format)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TOML: &str = r#"
        log_level = "debug"

        [[collectors]]
        metric_name = "requests_total"
        help = "Requests"
        labels = ["code", "method"]

        [[collectors]]
        metric_name = "latency_ms"
        kind = "histogram"
        labels = "route,,"
        quantiles_or_buckets = "10,50,100"

        [[collectors]]
        kind = "SUMMARY"
    "#;

    #[test]
    fn test_parse_toml() {
        let file = parse_collectors(TOML, FileFormat::Toml).unwrap();
        assert_eq!(file.log_level, LogLevel::Debug);

        let configs = file.configs().unwrap();
        assert_eq!(configs.len(), 3);

        assert_eq!(configs[0].metric_name(), "requests_total");
        assert_eq!(configs[0].kind(), CollectorKind::Counter);
        assert_eq!(configs[0].labels(), ["code", "method"]);

        assert_eq!(configs[1].kind(), CollectorKind::Histogram);
        assert_eq!(configs[1].labels(), ["route"]);
        assert_eq!(configs[1].buckets(), vec![10.0, 50.0, 100.0]);

        assert_eq!(configs[2].kind(), CollectorKind::Summary);
        assert_eq!(configs[2].help(), crate::collector::DEFAULT_HELP_STRING);
        assert_eq!(
            configs[2].quantile_or_bucket(),
            crate::collector::DEFAULT_QUANTILES_STRING
        );
        assert!(
            configs[2]
                .metric_name()
                .starts_with(crate::collector::METRIC_NAME_BASE)
        );
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        let json = r#"{ "collectors": [ { "metric_name": "x", "kind": "timer" } ] }"#;
        let file = parse_collectors(json, FileFormat::Json).unwrap();
        assert!(matches!(file.configs(), Err(CollectorError::Config(_))));
    }

    #[test]
    fn test_empty_file_has_defaults() {
        let file = parse_collectors("", FileFormat::Toml).unwrap();
        assert_eq!(file.log_level, LogLevel::Info);
        assert!(file.collectors.is_empty());
    }

    #[test]
    fn test_load_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "collectors:\n  - metric_name: threads\n    kind: gauge\n    help: Active threads"
        )
        .unwrap();

        let loaded = load_collectors(file.path()).unwrap();
        let configs = loaded.configs().unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].kind(), CollectorKind::Gauge);
        assert_eq!(configs[0].help(), "Active threads");
    }

    #[test]
    fn test_load_rejects_bad_paths() {
        assert!(load_collectors("/definitely/not/here.toml").is_err());

        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(matches!(
            load_collectors(file.path()),
            Err(CollectorError::Config(_))
        ));

        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(load_collectors(file.path()).is_err());
    }
}
