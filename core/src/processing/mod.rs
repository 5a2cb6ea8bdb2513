pub mod aggregation;
pub mod clustering;
pub mod intersection;

pub use aggregation::{CycleAggregator, CycleOutcome};
pub use clustering::{cluster_points, ClusterLabel, Clustering};
pub use intersection::{LineOfBearing, LobIntersector, LobRejection};
