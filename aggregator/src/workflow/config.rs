use crate::generator::profile::SimulationConfig;
use anyhow::{bail, Context};
use dfcore::{AggregationConfig, ClusteringConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_poll_interval_ms() -> u64 {
    1_000
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// GeoJSON written at shutdown.
    pub geofile: PathBuf,
    /// SQLite fix history.
    pub database: PathBuf,
    /// File listing one receiver endpoint per line.
    #[serde(default)]
    pub receivers_file: Option<PathBuf>,
    /// Endpoints given inline, polled before those from `receivers_file`.
    #[serde(default)]
    pub receivers: Vec<String>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub max_cycles: Option<u64>,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub clustering: ClusteringConfig,
    /// Poll a synthetic feed instead of real receivers.
    #[serde(default)]
    pub simulation: Option<SimulationConfig>,
}

impl AggregatorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading aggregator config {}", path_ref.display()))?;
        let config: AggregatorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing aggregator config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_paths(
        geofile: PathBuf,
        receivers_file: Option<PathBuf>,
        database: PathBuf,
    ) -> Self {
        Self {
            geofile,
            database,
            receivers_file,
            receivers: Vec::new(),
            poll_interval_ms: default_poll_interval_ms(),
            max_cycles: None,
            aggregation: AggregationConfig::default(),
            clustering: ClusteringConfig::default(),
            simulation: None,
        }
    }

    /// Every endpoint to poll, in order.
    pub fn endpoints(&self) -> anyhow::Result<Vec<String>> {
        let mut endpoints = self.receivers.clone();
        if let Some(path) = self.receivers_file.as_ref() {
            endpoints.extend(load_receiver_list(path)?);
        }
        if endpoints.is_empty() {
            if let Some(simulation) = self.simulation.as_ref() {
                endpoints = simulation.station_names();
            }
        }
        Ok(endpoints)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.clustering.epsilon < 0.0 || !self.clustering.epsilon.is_finite() {
            bail!("epsilon must be a non-negative number, got {}", self.clustering.epsilon);
        }
        if self.clustering.enabled() && self.clustering.min_samples == 0 {
            bail!("min samples must be at least 1 when clustering is enabled");
        }
        if self.aggregation.max_distance_from_reference_m <= 0.0 {
            bail!("distance from reference must be positive");
        }
        if self.endpoints()?.is_empty() {
            bail!("no receivers configured");
        }
        Ok(())
    }
}

/// Reads a receiver list: one endpoint per line, `#` comments and blanks skipped.
pub fn load_receiver_list<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<String>> {
    let path_ref = path.as_ref();
    let contents = fs::read_to_string(path_ref)
        .with_context(|| format!("reading receiver list {}", path_ref.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn receiver_list_skips_comments_and_blanks() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"# lab receivers\nhttp://10.0.0.2:8081/DOA_value.xml\n\n  /tmp/rx2.xml  \n")
            .unwrap();
        let endpoints = load_receiver_list(temp.path()).unwrap();
        assert_eq!(
            endpoints,
            vec!["http://10.0.0.2:8081/DOA_value.xml", "/tmp/rx2.xml"]
        );
    }

    #[test]
    fn config_load_reads_yaml_with_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"geofile: out.geojson\ndatabase: fixes.db\nreceivers:\n  - rx1.xml\n  - rx2.xml\naggregation:\n  min_confidence: 25\nclustering:\n  epsilon: 0.0\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = AggregatorConfig::load(&path).unwrap();
        assert_eq!(cfg.poll_interval_ms, 1_000);
        assert_eq!(cfg.aggregation.min_confidence, 25);
        assert!(cfg.aggregation.exclude_outliers);
        assert_eq!(cfg.aggregation.intersection.projection_distance_m, 40_000.0);
        assert!(!cfg.clustering.enabled());
        assert_eq!(cfg.clustering.min_samples, 20);
        assert_eq!(cfg.endpoints().unwrap().len(), 2);
        cfg.validate().unwrap();
    }

    #[test]
    fn missing_receivers_fail_validation() {
        let cfg = AggregatorConfig::from_paths("out.geojson".into(), None, "fixes.db".into());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn simulation_supplies_endpoints() {
        let mut cfg = AggregatorConfig::from_paths("out.geojson".into(), None, "fixes.db".into());
        cfg.simulation = Some(SimulationConfig::default());
        assert_eq!(cfg.endpoints().unwrap().len(), 3);
        cfg.validate().unwrap();
    }

    #[test]
    fn negative_epsilon_is_rejected() {
        let mut cfg = AggregatorConfig::from_paths("a".into(), None, "b".into());
        cfg.receivers = vec!["rx".into()];
        cfg.clustering.epsilon = -0.1;
        assert!(cfg.validate().is_err());
    }
}
