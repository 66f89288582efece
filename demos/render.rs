// Load collector definitions, feed them random samples and print the exposition

use clap::Parser;
use collector_config::collector::{CollectorKind, MetricCollector};
use collector_config::loader::{LogLevel, load_collectors};
use collector_config::registry::CollectorRegistry;
use log::{error, info, warn};
use prometheus::Registry;
use rand::Rng;
use std::path::PathBuf;

/// Command line arguments for the render demo
#[derive(Parser, Debug)]
#[command(name = "render", about = "Render collectors defined in a file")]
struct Args {
    /// Path to the collector definitions (toml, json or yaml)
    #[arg(short, long)]
    config: PathBuf,

    /// Number of random samples recorded per collector
    #[arg(short, long, default_value = "100")]
    samples: usize,
}

// One value per label, so every collector gets a single series
fn label_values(collector: &MetricCollector) -> Vec<String> {
    collector
        .label_names()
        .iter()
        .map(|name| format!("{}_value", name))
        .collect()
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let file = match load_collectors(&args.config) {
        Ok(file) => {
            collector_config::init_logging(&file.log_level);
            info!("Collector definitions loaded from {}", args.config.display());
            file
        }
        Err(e) => {
            collector_config::init_logging(&LogLevel::Error);
            error!("Failed to load collector definitions: {}", e);
            return Err(anyhow::anyhow!("Failed to load collector definitions: {}", e));
        }
    };

    let configs = file.configs()?;
    let mut registry = CollectorRegistry::new(Registry::new());
    let registered = registry.register_all(&configs);
    if registered < configs.len() {
        warn!("{} definition(s) were skipped", configs.len() - registered);
    }

    let mut rng = rand::rng();
    let names: Vec<String> = registry.names().into_iter().map(str::to_string).collect();
    for name in &names {
        let Some(collector) = registry.get(name) else {
            continue;
        };
        let values = label_values(collector);
        let values: Vec<&str> = values.iter().map(String::as_str).collect();

        for _ in 0..args.samples {
            let sample = match collector.kind() {
                CollectorKind::Counter => 1.0,
                _ => rng.random_range(0.0..3000.0),
            };
            collector.observe(&values, sample)?;
        }
    }

    print!("{}", registry.gather_text()?);
    Ok(())
}
