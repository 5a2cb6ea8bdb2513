use anyhow::Context;
use clap::Parser;
use dfcore::export::ExportReport;
use dfcore::receiver::TelemetrySource;
use dfcore::store::SqliteFixStore;
use generator::profile::{SimulatedFeed, SimulationConfig};
use log::warn;
use receiver::XmlFeedSource;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::AggregatorConfig;
use workflow::runner::Runner;

mod generator;
mod receiver;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Triangulates transmitters from networked DF receivers")]
struct Args {
    /// GeoJSON file written on shutdown
    #[arg(short, long, required_unless_present = "config")]
    geofile: Option<PathBuf>,
    /// File listing one receiver URL or path per line
    #[arg(short, long, required_unless_present_any = ["config", "simulate"])]
    receivers: Option<PathBuf>,
    /// SQLite database holding the fix history
    #[arg(short, long, required_unless_present = "config")]
    database: Option<PathBuf>,
    /// Clustering radius in standardized units; 0 disables clustering [default: 0.2]
    #[arg(short, long)]
    epsilon: Option<f64>,
    /// Minimum receiver confidence for a pair to qualify [default: 10]
    #[arg(short, long)]
    confidence: Option<i32>,
    /// Minimum receiver power, applied with --enforce-power [default: 10]
    #[arg(short, long)]
    power: Option<f64>,
    /// Points needed to form a cluster core [default: 20]
    #[arg(short, long)]
    min_samples: Option<usize>,
    /// Max distance in km between a candidate and the cycle reference [default: 500]
    #[arg(long)]
    dist_from_reference: Option<f64>,
    /// Load the whole configuration from YAML; other flags override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Delay between polling cycles
    #[arg(long)]
    interval_ms: Option<u64>,
    /// Stop after this many cycles instead of waiting for Ctrl+C
    #[arg(long)]
    max_cycles: Option<u64>,
    /// Report outliers but keep them in the cycle mean
    #[arg(long, default_value_t = false)]
    keep_outliers: bool,
    /// Require receiver power above --power for a pair to qualify
    #[arg(long, default_value_t = false)]
    enforce_power: bool,
    /// Poll a synthetic receiver network instead of real receivers
    #[arg(long, default_value_t = false)]
    simulate: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<AggregatorConfig> {
        let mut config = match self.config.as_ref() {
            Some(path) => {
                let mut loaded = AggregatorConfig::load(path)?;
                if let Some(geofile) = self.geofile.clone() {
                    loaded.geofile = geofile;
                }
                if let Some(database) = self.database.clone() {
                    loaded.database = database;
                }
                if self.receivers.is_some() {
                    loaded.receivers_file = self.receivers.clone();
                }
                loaded
            }
            None => AggregatorConfig::from_paths(
                self.geofile.clone().unwrap_or_default(),
                self.receivers.clone(),
                self.database.clone().unwrap_or_default(),
            ),
        };

        if let Some(epsilon) = self.epsilon {
            config.clustering.epsilon = epsilon;
        }
        if let Some(min_samples) = self.min_samples {
            config.clustering.min_samples = min_samples;
        }
        if let Some(confidence) = self.confidence {
            config.aggregation.min_confidence = confidence;
        }
        if let Some(power) = self.power {
            config.aggregation.min_power = power;
        }
        if let Some(km) = self.dist_from_reference {
            config.aggregation.max_distance_from_reference_m = km * 1_000.0;
        }
        if let Some(interval_ms) = self.interval_ms {
            config.poll_interval_ms = interval_ms;
        }
        if self.max_cycles.is_some() {
            config.max_cycles = self.max_cycles;
        }
        if self.keep_outliers {
            config.aggregation.exclude_outliers = false;
        }
        if self.enforce_power {
            config.aggregation.enforce_min_power = true;
        }
        if self.simulate && config.simulation.is_none() {
            config.simulation = Some(SimulationConfig::default());
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = args.into_config()?;
    config.validate().context("invalid aggregator configuration")?;
    let endpoints = config.endpoints()?;

    let mut store = SqliteFixStore::open(&config.database)
        .with_context(|| format!("opening fix store {}", config.database.display()))?;

    let source: Box<dyn TelemetrySource> = match config.simulation.clone() {
        Some(simulation) => Box::new(SimulatedFeed::new(simulation)),
        None => Box::new(XmlFeedSource::new().context("building HTTP client")?),
    };

    println!(
        "Polling {} receivers every {} ms (Ctrl+C to stop)...",
        endpoints.len(),
        config.poll_interval_ms
    );

    let geofile = config.geofile.clone();
    let mut runner = Runner::new(config, endpoints, source);
    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating runtime for the polling loop")?;
    let metrics = runtime.block_on(runner.poll(&mut store, async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("cannot listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    }));

    let report = runner.export(&store)?;
    println!(
        "Cycles {} -> fixes {}, empty {}, fetch failures {}, outliers {}",
        metrics.cycles,
        metrics.fixes,
        metrics.empty_cycles,
        metrics.fetch_failures,
        metrics.outliers
    );
    for line in export_summary(&report) {
        println!("{}", line);
    }
    println!("Wrote file {}", geofile.display());

    Ok(())
}

fn export_summary(report: &ExportReport) -> Vec<String> {
    if !report.has_data() {
        return vec!["No intersections".to_string()];
    }
    if !report.clustered {
        return vec![format!("Exported {} fixes without clustering", report.fixes_read)];
    }
    let mut lines = vec![format!(
        "Clustered {} fixes -> {} clusters, {} noise points",
        report.fixes_read, report.cluster_count, report.noise_count
    )];
    lines.extend(
        report
            .centroids
            .iter()
            .map(|c| format!("  likely TX at {:.6}, {:.6}", c.latitude, c.longitude)),
    );
    lines
}
