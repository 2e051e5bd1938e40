// Geodesic distance on the WGS84 ellipsoid
use super::target::Coordinate;
use std::f64::consts::PI;

/// WGS84 semi-major axis in meters
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 semi-minor axis in meters
pub const WGS84_B: f64 = 6_356_752.314_245;
/// Mean Earth radius, used by the great-circle fallback
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

const MAX_ITERATIONS: usize = 100;
const CONVERGENCE: f64 = 1e-12;

/// Surface distance in meters between two coordinates.
///
/// Uses Vincenty's inverse formula on WGS84. Nearly antipodal pairs where the
/// iteration does not converge fall back to the great-circle distance.
/// Inputs are ordered before computing so the result is exactly symmetric.
pub fn distance(a: &Coordinate, b: &Coordinate) -> f64 {
    if a == b {
        return 0.0;
    }
    let (p, q) = if (a.latitude, a.longitude) <= (b.latitude, b.longitude) {
        (a, b)
    } else {
        (b, a)
    };

    vincenty(p, q).unwrap_or_else(|| haversine(p, q))
}

fn vincenty(p: &Coordinate, q: &Coordinate) -> Option<f64> {
    let f = (WGS84_A - WGS84_B) / WGS84_A;
    let l = normalize_longitude((q.longitude - p.longitude).to_radians());

    let u1 = ((1.0 - f) * p.latitude.to_radians().tan()).atan();
    let u2 = ((1.0 - f) * q.latitude.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    for _ in 0..MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sq_sigma = (cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2);
        if sin_sq_sigma == 0.0 {
            // coincident points
            return Some(0.0);
        }
        let sin_sigma = sin_sq_sigma.sqrt();
        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // equatorial line when cos_sq_alpha is zero
        let cos_2sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
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
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))));

        if lambda.abs() > PI {
            return None;
        }
        if (lambda - previous).abs() <= CONVERGENCE {
            let u_sq = cos_sq_alpha * (WGS84_A.powi(2) - WGS84_B.powi(2)) / WGS84_B.powi(2);
            let big_a =
                1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
            let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
            let delta_sigma = big_b
                * sin_sigma
                * (cos_2sigma_m
                    + big_b / 4.0
                        * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))
                            - big_b / 6.0
                                * cos_2sigma_m
                                * (-3.0 + 4.0 * sin_sigma.powi(2))
                                * (-3.0 + 4.0 * cos_2sigma_m.powi(2))));
            return Some(WGS84_B * big_a * (sigma - delta_sigma));
        }
    }

    None
}

/// Great-circle distance on a sphere of mean Earth radius.
pub fn haversine(p: &Coordinate, q: &Coordinate) -> f64 {
    let dlat = (q.latitude - p.latitude).to_radians();
    let dlon = (q.longitude - p.longitude).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + p.latitude.to_radians().cos() * q.latitude.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

fn normalize_longitude(mut radians: f64) -> f64 {
    while radians > PI {
        radians -= 2.0 * PI;
    }
    while radians < -PI {
        radians += 2.0 * PI;
    }
    radians
}
