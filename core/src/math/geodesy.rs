use crate::prelude::GeoPoint;

/// WGS-84 semi-major axis (meters).
pub const WGS84_SEMI_MAJOR_M: f64 = 6_378_137.0;

/// WGS-84 flattening.
pub const WGS84_FLATTENING: f64 = 1.0 / 298.257_223_563;

/// WGS-84 semi-minor axis (meters).
pub const WGS84_SEMI_MINOR_M: f64 = (1.0 - WGS84_FLATTENING) * WGS84_SEMI_MAJOR_M;

const CONVERGENCE_RAD: f64 = 1e-12;
const MAX_ITERATIONS: usize = 200;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeodesyError {
    #[error("inverse geodesic did not converge between {0:?} and {1:?}")]
    NoConvergence(GeoPoint, GeoPoint),
}

/// Solution of the inverse geodesic problem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeodesicInverse {
    pub distance_m: f64,
    /// Initial bearing at the first point toward the second.
    pub bearing_deg: f64,
    /// Bearing at the second point back toward the first.
    pub reverse_bearing_deg: f64,
}

/// Wraps an angle into `[0, 360)`.
pub fn normalize_bearing(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Wraps a longitude into `[-180, 180]`.
pub fn normalize_longitude(deg: f64) -> f64 {
    if (-180.0..=180.0).contains(&deg) {
        deg
    } else {
        (deg + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// Smallest absolute difference between two bearings, in `[0, 180]`.
pub fn bearing_difference(a: f64, b: f64) -> f64 {
    let diff = normalize_bearing(a - b);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

fn reduced_latitude(lat_rad: f64) -> (f64, f64) {
    let tan_u = (1.0 - WGS84_FLATTENING) * lat_rad.tan();
    let cos_u = 1.0 / (1.0 + tan_u * tan_u).sqrt();
    (tan_u * cos_u, cos_u)
}

fn series_coefficients(cos_sq_alpha: f64) -> (f64, f64) {
    let a2 = WGS84_SEMI_MAJOR_M * WGS84_SEMI_MAJOR_M;
    let b2 = WGS84_SEMI_MINOR_M * WGS84_SEMI_MINOR_M;
    let u_sq = cos_sq_alpha * (a2 - b2) / b2;
    let big_a =
        1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
    (big_a, big_b)
}

fn delta_sigma(big_b: f64, sin_sigma: f64, cos_sigma: f64, cos_2sigma_m: f64) -> f64 {
    let c2 = cos_2sigma_m * cos_2sigma_m;
    big_b
        * sin_sigma
        * (cos_2sigma_m
            + big_b / 4.0
                * (cos_sigma * (-1.0 + 2.0 * c2)
                    - big_b / 6.0
                        * cos_2sigma_m
                        * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                        * (-3.0 + 4.0 * c2)))
}

/// Forward geodesic: the point reached from `origin` after travelling
/// `distance_m` along the initial bearing `bearing_deg` (Vincenty).
pub fn direct(origin: GeoPoint, bearing_deg: f64, distance_m: f64) -> GeoPoint {
    let f = WGS84_FLATTENING;
    let alpha1 = bearing_deg.to_radians();
    let (sin_alpha1, cos_alpha1) = alpha1.sin_cos();

    let (sin_u1, cos_u1) = reduced_latitude(origin.latitude.to_radians());
    let sigma1 = (sin_u1 / cos_u1).atan2(cos_alpha1);
    let sin_alpha = cos_u1 * sin_alpha1;
    let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
    let (big_a, big_b) = series_coefficients(cos_sq_alpha);

    let base_sigma = distance_m / (WGS84_SEMI_MINOR_M * big_a);
    let mut sigma = base_sigma;
    let mut cos_2sigma_m;
    let mut iterations = 0;
    loop {
        cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
        let (sin_sigma, cos_sigma) = sigma.sin_cos();
        let previous = sigma;
        sigma = base_sigma + delta_sigma(big_b, sin_sigma, cos_sigma, cos_2sigma_m);
        iterations += 1;
        if (sigma - previous).abs() < CONVERGENCE_RAD || iterations >= MAX_ITERATIONS {
            break;
        }
    }

    let (sin_sigma, cos_sigma) = sigma.sin_cos();
    let tmp = sin_u1 * sin_sigma - cos_u1 * cos_sigma * cos_alpha1;
    let lat2 = (sin_u1 * cos_sigma + cos_u1 * sin_sigma * cos_alpha1)
        .atan2((1.0 - f) * (sin_alpha * sin_alpha + tmp * tmp).sqrt());
    let lambda =
        (sin_sigma * sin_alpha1).atan2(cos_u1 * cos_sigma - sin_u1 * sin_sigma * cos_alpha1);
    let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
    let l = lambda
        - (1.0 - c)
            * f
            * sin_alpha
            * (sigma
                + c * sin_sigma
                    * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

    GeoPoint::new(
        lat2.to_degrees(),
        normalize_longitude(origin.longitude + l.to_degrees()),
    )
}

/// Inverse geodesic: distance and bearings between two points (Vincenty).
pub fn inverse(from: GeoPoint, to: GeoPoint) -> Result<GeodesicInverse, GeodesyError> {
    let f = WGS84_FLATTENING;
    let l = normalize_longitude(to.longitude - from.longitude).to_radians();
    let (sin_u1, cos_u1) = reduced_latitude(from.latitude.to_radians());
    let (sin_u2, cos_u2) = reduced_latitude(to.latitude.to_radians());

    let mut lambda = l;
    let mut converged = false;
    let (mut sin_sigma, mut cos_sigma, mut sigma) = (0.0, 0.0, 0.0);
    let (mut cos_sq_alpha, mut cos_2sigma_m) = (0.0, 0.0);
    let (mut sin_lambda, mut cos_lambda) = (0.0, 0.0);

    for _ in 0..MAX_ITERATIONS {
        (sin_lambda, cos_lambda) = lambda.sin_cos();
        let cross = cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda;
        let sin_sq_sigma = (cos_u2 * sin_lambda).powi(2) + cross * cross;
        cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        if sin_sq_sigma < 1e-24 {
            if cos_sigma < 0.0 {
                // antipodal, azimuth undefined
                return Err(GeodesyError::NoConvergence(from, to));
            }
            return Ok(GeodesicInverse {
                distance_m: 0.0,
                bearing_deg: 0.0,
                reverse_bearing_deg: 0.0,
            });
        }
        sin_sigma = sin_sq_sigma.sqrt();
        sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        cos_2sigma_m = if cos_sq_alpha.abs() > f64::EPSILON {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
            // equatorial line
            0.0
        };
        let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m
                            + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));
        if lambda.abs() > std::f64::consts::PI * 1.5 {
            break;
        }
        if (lambda - previous).abs() < CONVERGENCE_RAD {
            converged = true;
            break;
        }
    }

    if !converged {
        return Err(GeodesyError::NoConvergence(from, to));
    }

    let (big_a, big_b) = series_coefficients(cos_sq_alpha);
    let distance_m = WGS84_SEMI_MINOR_M
        * big_a
        * (sigma - delta_sigma(big_b, sin_sigma, cos_sigma, cos_2sigma_m));

    let alpha1 = (cos_u2 * sin_lambda).atan2(cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda);
    let alpha2 = (cos_u1 * sin_lambda).atan2(-sin_u1 * cos_u2 + cos_u1 * sin_u2 * cos_lambda);

    Ok(GeodesicInverse {
        distance_m,
        bearing_deg: normalize_bearing(alpha1.to_degrees()),
        reverse_bearing_deg: normalize_bearing(alpha2.to_degrees() + 180.0),
    })
}

/// Initial bearing from `from` toward `to`.
pub fn heading(from: GeoPoint, to: GeoPoint) -> Result<f64, GeodesyError> {
    inverse(from, to).map(|solution| solution.bearing_deg)
}

/// Geodesic distance in meters.
pub fn distance(from: GeoPoint, to: GeoPoint) -> Result<f64, GeodesyError> {
    inverse(from, to).map(|solution| solution.distance_m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_bearing_wraps_into_range() {
        assert_eq!(normalize_bearing(360.0), 0.0);
        assert_eq!(normalize_bearing(-90.0), 270.0);
        assert_eq!(normalize_bearing(725.0), 5.0);
        assert!(normalize_bearing(-1e-18) < 360.0);
    }

    #[test]
    fn bearing_difference_handles_wraparound() {
        assert!((bearing_difference(359.0, 1.0) - 2.0).abs() < 1e-12);
        assert!((bearing_difference(90.0, 270.0) - 180.0).abs() < 1e-12);
    }

    #[test]
    fn one_degree_of_equator_matches_ellipsoid() {
        let solution = inverse(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)).unwrap();
        // a * pi / 180
        assert!((solution.distance_m - 111_319.49).abs() < 0.1);
        assert!((solution.bearing_deg - 90.0).abs() < 1e-9);
        assert!((solution.reverse_bearing_deg - 270.0).abs() < 1e-9);
    }

    #[test]
    fn flinders_peak_to_buninyong() {
        // Vincenty's published test line.
        let flinders = GeoPoint::new(-37.951_033_416_7, 144.424_867_888_9);
        let buninyong = GeoPoint::new(-37.652_821_138_9, 143.926_495_527_8);
        let solution = inverse(flinders, buninyong).unwrap();
        assert!((solution.distance_m - 54_972.271).abs() < 0.05);
        assert!((solution.bearing_deg - 306.868_159_7).abs() < 1e-5);
    }

    #[test]
    fn direct_then_inverse_agree() {
        let origin = GeoPoint::new(38.0, -77.0);
        let target = direct(origin, 37.5, 40_000.0);
        let solution = inverse(origin, target).unwrap();
        assert!((solution.distance_m - 40_000.0).abs() < 1e-3);
        assert!((solution.bearing_deg - 37.5).abs() < 1e-7);
    }

    #[test]
    fn coincident_points_have_zero_distance() {
        let p = GeoPoint::new(12.0, 34.0);
        assert_eq!(distance(p, p).unwrap(), 0.0);
    }

    #[test]
    fn antipodal_points_report_non_convergence() {
        let err = inverse(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 180.0));
        assert!(matches!(err, Err(GeodesyError::NoConvergence(..))));
    }

    #[test]
    fn inverse_across_the_antimeridian_takes_the_short_way() {
        let west_of_line = GeoPoint::new(-17.0, 179.9);
        let east_of_line = GeoPoint::new(-17.0, -179.9);
        let across = inverse(west_of_line, east_of_line).unwrap();
        let shifted = inverse(GeoPoint::new(-17.0, -0.1), GeoPoint::new(-17.0, 0.1)).unwrap();

        assert!(across.distance_m < 25_000.0);
        assert!((across.distance_m - shifted.distance_m).abs() < 1e-3);
        assert!((across.bearing_deg - shifted.bearing_deg).abs() < 1e-7);

        let back = inverse(east_of_line, west_of_line).unwrap();
        assert!((back.distance_m - across.distance_m).abs() < 1e-3);
        assert!(bearing_difference(back.bearing_deg, 270.0) < 1.0);
    }
}
