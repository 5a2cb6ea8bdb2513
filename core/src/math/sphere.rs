use crate::prelude::GeoPoint;

/// Cartesian vector on (or through) the unit sphere.
pub type Vec3 = [f64; 3];

pub fn to_unit_vector(point: GeoPoint) -> Vec3 {
    let (sin_lat, cos_lat) = point.latitude.to_radians().sin_cos();
    let (sin_lon, cos_lon) = point.longitude.to_radians().sin_cos();
    [cos_lat * cos_lon, cos_lat * sin_lon, sin_lat]
}

pub fn from_unit_vector(v: Vec3) -> GeoPoint {
    GeoPoint::new(
        v[2].clamp(-1.0, 1.0).asin().to_degrees(),
        v[1].atan2(v[0]).to_degrees(),
    )
}

pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn norm(v: Vec3) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

pub fn scale(v: Vec3, k: f64) -> Vec3 {
    [v[0] * k, v[1] * k, v[2] * k]
}

pub fn negate(v: Vec3) -> Vec3 {
    scale(v, -1.0)
}

/// Euclidean (chord) distance between two vectors.
pub fn chord(a: Vec3, b: Vec3) -> f64 {
    norm([a[0] - b[0], a[1] - b[1], a[2] - b[2]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_vector_round_trips_through_lat_lon() {
        let point = GeoPoint::new(-33.5, 151.25);
        let back = from_unit_vector(to_unit_vector(point));
        assert!((back.latitude - point.latitude).abs() < 1e-12);
        assert!((back.longitude - point.longitude).abs() < 1e-12);
    }

    #[test]
    fn cross_of_axes_is_third_axis() {
        assert_eq!(cross([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn antipodes_are_two_units_apart() {
        let v = to_unit_vector(GeoPoint::new(10.0, 20.0));
        assert!((chord(v, negate(v)) - 2.0).abs() < 1e-12);
    }
}
