use serde::{Deserialize, Serialize};

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Tuning for a single pairwise line-of-bearing intersection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntersectionConfig {
    /// Distance along each bearing used to place the second LOB endpoint.
    pub projection_distance_m: f64,
    /// Candidates farther than this from the first receiver are dropped.
    pub max_range_m: f64,
    /// Allowed deviation between the supplied bearing and the bearing to the candidate.
    pub bearing_tolerance_deg: f64,
}

impl Default for IntersectionConfig {
    fn default() -> Self {
        Self {
            projection_distance_m: 40_000.0,
            max_range_m: 50_000.0,
            bearing_tolerance_deg: 5.0,
        }
    }
}

/// Per-cycle qualification and outlier policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub min_confidence: i32,
    pub min_power: f64,
    /// Apply `min_power` to pair qualification. Off by default.
    pub enforce_min_power: bool,
    pub max_distance_from_reference_m: f64,
    /// Drop detected outliers from the cycle mean. When false they are only reported.
    pub exclude_outliers: bool,
    pub intersection: IntersectionConfig,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            min_confidence: 10,
            min_power: 10.0,
            enforce_min_power: false,
            max_distance_from_reference_m: 500_000.0,
            exclude_outliers: true,
            intersection: IntersectionConfig::default(),
        }
    }
}

/// Density clustering parameters for the export pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Neighborhood radius in standardized units; zero disables clustering.
    pub epsilon: f64,
    pub min_samples: usize,
}

impl ClusteringConfig {
    pub fn enabled(&self) -> bool {
        self.epsilon > 0.0
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.2,
            min_samples: 20,
        }
    }
}
