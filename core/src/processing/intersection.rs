use crate::math::geodesy::{self, bearing_difference};
use crate::math::sphere::{chord, cross, from_unit_vector, negate, norm, scale, to_unit_vector};
use crate::prelude::{GeoPoint, IntersectionConfig};
use crate::receiver::ReceiverSnapshot;

/// Below this sine of the angle between the two LOB planes the planes are
/// treated as the same great circle.
const PARALLEL_SINE: f64 = 1e-9;

/// Product of the plane normal lengths below which a LOB has no usable extent.
const MIN_CONDITIONING: f64 = 1e-20;

/// A receiver position and the compass bearing it reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineOfBearing {
    pub origin: GeoPoint,
    pub bearing_deg: f64,
}

impl LineOfBearing {
    pub fn new(origin: GeoPoint, bearing_deg: f64) -> Self {
        Self {
            origin,
            bearing_deg,
        }
    }
}

impl From<&ReceiverSnapshot> for LineOfBearing {
    fn from(snapshot: &ReceiverSnapshot) -> Self {
        Self::new(snapshot.position(), snapshot.corrected_bearing)
    }
}

/// Why a pair of LOBs produced no candidate.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LobRejection {
    #[error("lines of bearing are parallel or ill-conditioned")]
    Degenerate,
    #[error("crossing lies at bearing {actual:.2} but the receiver reports {expected:.2}")]
    BearingMismatch { expected: f64, actual: f64 },
    #[error("crossing is {distance_m:.0} m from the receiver (limit {limit_m:.0} m)")]
    OutOfRange { distance_m: f64, limit_m: f64 },
}

/// Great-circle crossing of two lines of bearing.
#[derive(Debug, Clone, Default)]
pub struct LobIntersector {
    config: IntersectionConfig,
}

impl LobIntersector {
    pub fn new(config: IntersectionConfig) -> Self {
        Self { config }
    }

    /// Crossing of `a` and `b` nearest to `a`, validated against `a`'s bearing
    /// and range limit.
    pub fn intersect(&self, a: LineOfBearing, b: LineOfBearing) -> Result<GeoPoint, LobRejection> {
        let d = self.config.projection_distance_m;
        let a_start = to_unit_vector(a.origin);
        let a_end = to_unit_vector(geodesy::direct(a.origin, a.bearing_deg, d));
        let b_start = to_unit_vector(b.origin);
        let b_end = to_unit_vector(geodesy::direct(b.origin, b.bearing_deg, d));

        let normal_a = cross(a_start, a_end);
        let normal_b = cross(b_start, b_end);
        let conditioning = norm(normal_a) * norm(normal_b);
        if !(conditioning > MIN_CONDITIONING) {
            return Err(LobRejection::Degenerate);
        }

        let line = cross(normal_a, normal_b);
        let line_norm = norm(line);
        if !(line_norm / conditioning >= PARALLEL_SINE) {
            return self.facing_midpoint(a, b);
        }

        let first = scale(line, 1.0 / line_norm);
        let second = negate(first);
        let nearest = if chord(first, a_start) < chord(second, a_start) {
            first
        } else {
            second
        };

        self.validate(a, from_unit_vector(nearest))
    }

    /// Two receivers on one great circle facing each other: the emitter is
    /// somewhere between them, so take the geodesic midpoint.
    fn facing_midpoint(
        &self,
        a: LineOfBearing,
        b: LineOfBearing,
    ) -> Result<GeoPoint, LobRejection> {
        let baseline =
            geodesy::inverse(a.origin, b.origin).map_err(|_| LobRejection::Degenerate)?;
        if baseline.distance_m <= 0.0 {
            return Err(LobRejection::Degenerate);
        }
        let tolerance = self.config.bearing_tolerance_deg;
        let a_faces_b = bearing_difference(baseline.bearing_deg, a.bearing_deg) <= tolerance;
        let b_faces_a =
            bearing_difference(baseline.reverse_bearing_deg, b.bearing_deg) <= tolerance;
        if !(a_faces_b && b_faces_a) {
            return Err(LobRejection::Degenerate);
        }

        let midpoint = geodesy::direct(a.origin, baseline.bearing_deg, baseline.distance_m / 2.0);
        self.validate(a, midpoint)
    }

    fn validate(&self, a: LineOfBearing, candidate: GeoPoint) -> Result<GeoPoint, LobRejection> {
        if !(candidate.latitude.is_finite() && candidate.longitude.is_finite()) {
            return Err(LobRejection::Degenerate);
        }
        let solution =
            geodesy::inverse(a.origin, candidate).map_err(|_| LobRejection::Degenerate)?;

        let deviation = bearing_difference(solution.bearing_deg, a.bearing_deg);
        if deviation > self.config.bearing_tolerance_deg {
            return Err(LobRejection::BearingMismatch {
                expected: a.bearing_deg,
                actual: solution.bearing_deg,
            });
        }
        if solution.distance_m > self.config.max_range_m {
            return Err(LobRejection::OutOfRange {
                distance_m: solution.distance_m,
                limit_m: self.config.max_range_m,
            });
        }
        Ok(candidate)
    }
}
