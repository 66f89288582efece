//! Build Prometheus collectors from small textual configuration strings
//!
//! A [`CollectorConfig`](collector::CollectorConfig) holds the strings a user
//! typed (help text, metric name, kind, labels and a bucket or quantile
//! list) and the [`CollectorFactory`](collector::CollectorFactory) turns it
//! into a registered counter, gauge, histogram or summary.

pub mod collector;
pub mod error;
pub mod loader;
pub mod property;
pub mod registry;
pub mod summary;
pub mod util;

/// Re-export of commonly used types for convenience
pub mod prelude {
    pub use crate::collector::{
        CollectorConfig, CollectorFactory, CollectorKind, MetricCollector, QuantileDefinition,
    };
    pub use crate::error::{CollectorError, Result};
    pub use crate::loader::{CollectorFile, load_collectors};
    pub use crate::property::{PropertyMap, PropertyStore};
    pub use crate::registry::CollectorRegistry;
    pub use crate::summary::SummaryVec;
}

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use util::logging::init as init_logging;
