use crate::math::geodesy::normalize_bearing;
use crate::prelude::GeoPoint;
use serde::{Deserialize, Serialize};

/// Latest report from one direction-finding station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiverSnapshot {
    pub station_id: String,
    pub timestamp: i64,
    pub frequency: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub heading: f64,
    pub raw_bearing: f64,
    pub corrected_bearing: f64,
    pub power: f64,
    pub confidence: i32,
}

impl ReceiverSnapshot {
    /// Builds a snapshot, deriving the compass bearing from the antenna heading
    /// and the bearing relative to it.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        station_id: impl Into<String>,
        timestamp: i64,
        frequency: f64,
        latitude: f64,
        longitude: f64,
        heading: f64,
        raw_bearing: f64,
        power: f64,
        confidence: i32,
    ) -> Self {
        Self {
            station_id: station_id.into(),
            timestamp,
            frequency,
            latitude,
            longitude,
            heading,
            raw_bearing,
            corrected_bearing: corrected_bearing(heading, raw_bearing),
            power,
            confidence,
        }
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Direction of arrival: `heading + (360 - raw_bearing)` wrapped into `[0, 360)`.
pub fn corrected_bearing(heading: f64, raw_bearing: f64) -> f64 {
    normalize_bearing(heading + (360.0 - raw_bearing))
}
