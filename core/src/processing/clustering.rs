use crate::prelude::{ClusteringConfig, GeoPoint};
use ndarray::{Array1, Array2, Axis};

/// Cluster assignment for one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterLabel {
    Noise,
    Cluster(usize),
}

/// Result of clustering a set of positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// One label per input point, in input order.
    pub labels: Vec<ClusterLabel>,
    /// Centroid of each cluster (mean of original coordinates), indexed by cluster id.
    pub centroids: Vec<GeoPoint>,
}

impl Clustering {
    pub fn cluster_count(&self) -> usize {
        self.centroids.len()
    }

    pub fn noise_count(&self) -> usize {
        self.labels
            .iter()
            .filter(|label| **label == ClusterLabel::Noise)
            .count()
    }
}

/// Scales each column to zero mean and unit population variance.
/// Columns with zero variance are only centered.
pub fn standardize(data: &Array2<f64>) -> Array2<f64> {
    if data.nrows() == 0 {
        return data.clone();
    }
    let mean = data
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(data.ncols()));
    let std = data
        .std_axis(Axis(0), 0.0)
        .mapv(|s| if s > 0.0 { s } else { 1.0 });
    (data - &mean) / &std
}

/// Density-based clustering (DBSCAN) over the rows of `points`.
///
/// A row is a core point when at least `min_samples` rows, itself included,
/// lie within `eps` (inclusive). Cluster ids follow discovery order.
pub fn dbscan(points: &Array2<f64>, eps: f64, min_samples: usize) -> Vec<ClusterLabel> {
    let n = points.nrows();
    let neighborhoods: Vec<Vec<usize>> = (0..n)
        .map(|i| {
            let row = points.row(i);
            (0..n)
                .filter(|&j| {
                    let dist_sq: f64 = row
                        .iter()
                        .zip(points.row(j).iter())
                        .map(|(a, b)| (a - b) * (a - b))
                        .sum();
                    dist_sq.sqrt() <= eps
                })
                .collect()
        })
        .collect();
    let is_core: Vec<bool> = neighborhoods
        .iter()
        .map(|neighbors| neighbors.len() >= min_samples)
        .collect();

    let mut labels: Vec<Option<ClusterLabel>> = vec![None; n];
    let mut next_cluster = 0;

    for seed in 0..n {
        if labels[seed].is_some() || !is_core[seed] {
            continue;
        }
        let cluster = ClusterLabel::Cluster(next_cluster);
        next_cluster += 1;
        labels[seed] = Some(cluster);

        let mut frontier = vec![seed];
        while let Some(current) = frontier.pop() {
            if !is_core[current] {
                continue;
            }
            for &neighbor in &neighborhoods[current] {
                if labels[neighbor].is_none() {
                    labels[neighbor] = Some(cluster);
                    frontier.push(neighbor);
                }
            }
        }
    }

    labels
        .into_iter()
        .map(|label| label.unwrap_or(ClusterLabel::Noise))
        .collect()
}

/// Standardizes `points` and clusters them with `config`.
pub fn cluster_points(points: &[GeoPoint], config: &ClusteringConfig) -> Clustering {
    let raw = Array2::from_shape_fn((points.len(), 2), |(row, col)| match col {
        0 => points[row].latitude,
        _ => points[row].longitude,
    });
    let labels = dbscan(&standardize(&raw), config.epsilon, config.min_samples);

    let cluster_count = labels
        .iter()
        .filter_map(|label| match label {
            ClusterLabel::Cluster(id) => Some(id + 1),
            ClusterLabel::Noise => None,
        })
        .max()
        .unwrap_or(0);

    let mut sums = vec![(0.0, 0.0, 0usize); cluster_count];
    for (point, label) in points.iter().zip(&labels) {
        if let ClusterLabel::Cluster(id) = label {
            let entry = &mut sums[*id];
            entry.0 += point.latitude;
            entry.1 += point.longitude;
            entry.2 += 1;
        }
    }
    let centroids = sums
        .into_iter()
        .map(|(lat, lon, count)| GeoPoint::new(lat / count as f64, lon / count as f64))
        .collect();

    Clustering { labels, centroids }
}
