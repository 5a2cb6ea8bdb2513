pub mod geodesy;
pub mod sphere;
pub mod stats;

pub use geodesy::{GeodesicInverse, GeodesyError};
pub use stats::StatsHelper;
