//! Core triangulation, aggregation and clustering for the Rust DF aggregator.
//!
//! The modules follow the data flow of a direction-finding network: receiver
//! snapshots feed pairwise line-of-bearing intersections, each polling cycle
//! condenses its intersections into one aggregate fix, fixes accumulate in a
//! store, and the export pass clusters the history into likely locations.

pub mod export;
pub mod fix;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod receiver;
pub mod store;
pub mod telemetry;

pub use fix::{AggregateFix, CandidateIntersection};
pub use prelude::{AggregationConfig, ClusteringConfig, GeoPoint, IntersectionConfig};
