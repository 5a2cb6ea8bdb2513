use crate::prelude::GeoPoint;
use serde::{Deserialize, Serialize};

/// Crossing of two receivers' lines of bearing, tagged with their mean power.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateIntersection {
    pub location: GeoPoint,
    pub support_power: f64,
}

/// One cycle's aggregate position estimate, as persisted in the fix store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateFix {
    pub time: i64,
    pub latitude: f64,
    pub longitude: f64,
}

impl AggregateFix {
    pub fn new(time: i64, location: GeoPoint) -> Self {
        Self {
            time,
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }

    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}
