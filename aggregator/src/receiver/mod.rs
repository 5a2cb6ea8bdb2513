//! Receiver telemetry transports for the aggregator binary.

pub mod feed;
pub mod xml;

pub use feed::XmlFeedSource;
