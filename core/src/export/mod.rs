//! Shutdown-time condensation of the fix history into likely emitter locations.

pub mod geojson;

use crate::fix::AggregateFix;
use crate::prelude::{ClusteringConfig, GeoPoint};
use crate::processing::clustering::{cluster_points, ClusterLabel};
use crate::store::{FixStore, StoreError};
use crate::telemetry::LogManager;
use std::path::Path;

pub use geojson::{ExportArtifact, PointGroup, PointGroupKind};

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("reading fix history: {0}")]
    Store(#[from] StoreError),
    #[error("writing export file: {0}")]
    Io(#[from] std::io::Error),
}

/// Summary of one export pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportReport {
    pub fixes_read: usize,
    pub clustered: bool,
    pub cluster_count: usize,
    pub noise_count: usize,
    pub centroids: Vec<GeoPoint>,
    pub artifact: ExportArtifact,
}

impl ExportReport {
    pub fn has_data(&self) -> bool {
        self.fixes_read > 0
    }
}

/// Clusters the stored fix history and assembles the export artifact.
pub struct ExportEngine {
    config: ClusteringConfig,
    logger: LogManager,
}

impl ExportEngine {
    pub fn new(config: ClusteringConfig) -> Self {
        Self {
            config,
            logger: LogManager::new("export"),
        }
    }

    pub fn build(&self, fixes: &[AggregateFix]) -> ExportReport {
        if fixes.is_empty() {
            self.logger.record("no data: fix history is empty");
            return ExportReport::default();
        }

        let points: Vec<GeoPoint> = fixes.iter().map(AggregateFix::location).collect();
        if !self.config.enabled() {
            return ExportReport {
                fixes_read: fixes.len(),
                artifact: ExportArtifact {
                    groups: vec![PointGroup {
                        kind: PointGroupKind::AllPoints,
                        points,
                    }],
                },
                ..Default::default()
            };
        }

        let clustering = cluster_points(&points, &self.config);
        let accepted: Vec<GeoPoint> = points
            .iter()
            .zip(&clustering.labels)
            .filter(|(_, label)| **label != ClusterLabel::Noise)
            .map(|(point, _)| *point)
            .collect();

        self.logger.record(&format!(
            "{} clusters, {} outliers removed from {} fixes",
            clustering.cluster_count(),
            clustering.noise_count(),
            fixes.len()
        ));
        for centroid in &clustering.centroids {
            self.logger.record(&format!(
                "likely location {:.6}, {:.6}",
                centroid.latitude, centroid.longitude
            ));
        }

        ExportReport {
            fixes_read: fixes.len(),
            clustered: true,
            cluster_count: clustering.cluster_count(),
            noise_count: clustering.noise_count(),
            centroids: clustering.centroids.clone(),
            artifact: ExportArtifact {
                groups: vec![
                    PointGroup {
                        kind: PointGroupKind::MostLikely,
                        points: clustering.centroids,
                    },
                    PointGroup {
                        kind: PointGroupKind::AllPoints,
                        points: accepted,
                    },
                ],
            },
        }
    }

    /// Reads the whole store and builds the report.
    pub fn run(&self, store: &dyn FixStore) -> Result<ExportReport, ExportError> {
        let fixes = store.read_all()?;
        Ok(self.build(&fixes))
    }

    /// Reads the store, writes the GeoJSON file and returns the report.
    pub fn export_to(
        &self,
        store: &dyn FixStore,
        path: impl AsRef<Path>,
    ) -> Result<ExportReport, ExportError> {
        let report = self.run(store)?;
        report.artifact.write_geojson(path.as_ref())?;
        self.logger
            .record(&format!("wrote {}", path.as_ref().display()));
        Ok(report)
    }
}
