//! Catmull-Rom interpolation between recorded fixes.
//!
//! Recorded tracks are sparse (typically one fix every 1-4 seconds) while a
//! display polls much faster. The interpolator turns a small window of fixes
//! around the query time into a smooth position using a cubic Hermite spline
//! with Catmull-Rom tangents. Tangents are scaled by the real time spacing of
//! the fixes so irregular logging intervals do not distort the curve.
//!
//! Outside the window (before the first fix or after the last one) the
//! nearest fix is held.

use super::fix::{Fix, GeoPoint, Sample};

/// Number of fixes the interpolator uses around the query time.
pub const WINDOW_SIZE: usize = 4;

/// Produce a sample at `time` from an ordered window of fixes.
///
/// The window should contain up to [`WINDOW_SIZE`] fixes, strictly
/// increasing in time, with `time` falling between the second and third
/// entry. Fewer fixes degrade gracefully: two bracketing fixes give a
/// Hermite curve with one-sided tangents, and a query outside the window
/// holds the nearest fix.
///
/// Returns `None` only for an empty window.
pub fn interpolate(window: &[Fix], time: f64) -> Option<Sample> {
    let first = window.first()?;
    let last = window.last()?;

    if window.len() < 2 || time <= first.time {
        return Some(Sample::hold(first, time));
    }
    if time >= last.time {
        return Some(Sample::hold(last, time));
    }

    let Some(i) = window
        .windows(2)
        .position(|pair| pair[0].time <= time && time < pair[1].time)
    else {
        return nearest(window, time).map(|fix| Sample::hold(fix, time));
    };

    let p1 = &window[i];
    let p2 = &window[i + 1];
    let p0 = if i > 0 { &window[i - 1] } else { p1 };
    let p3 = window.get(i + 2).unwrap_or(p2);

    let span = p2.time - p1.time;
    let u = (time - p1.time) / span;
    let curve = Hermite::new(p0.time, p1.time, p2.time, p3.time, u);

    // Longitudes are unwrapped around p1 so a crossing of the antimeridian
    // interpolates the short way round.
    let lon_ref = p1.location.longitude;
    let longitude = curve.eval(
        unwrap_longitude(lon_ref, p0.location.longitude),
        lon_ref,
        unwrap_longitude(lon_ref, p2.location.longitude),
        unwrap_longitude(lon_ref, p3.location.longitude),
    );
    let latitude = curve
        .eval(
            p0.location.latitude,
            p1.location.latitude,
            p2.location.latitude,
            p3.location.latitude,
        )
        .clamp(-90.0, 90.0);
    let altitude = curve.eval(p0.altitude, p1.altitude, p2.altitude, p3.altitude);

    let heading = match (p1.track, p2.track) {
        (Some(a), Some(b)) => Some(lerp_angle(a, b, u)),
        _ if p1.location != p2.location => Some(p1.location.bearing_to(&p2.location)),
        _ => p1.track,
    };
    let climb_rate = match (p1.climb_rate, p2.climb_rate) {
        (Some(a), Some(b)) => Some(a + (b - a) * u),
        _ => Some((p2.altitude - p1.altitude) / span),
    };

    Some(Sample {
        time,
        location: GeoPoint::new(latitude, normalize_longitude(longitude)),
        altitude,
        heading,
        climb_rate,
    })
}

/// Cubic Hermite basis for one segment, with Catmull-Rom tangents.
struct Hermite {
    h00: f64,
    h10: f64,
    h01: f64,
    h11: f64,
    /// Tangent scale at p1: segment span over the p0..p2 span.
    s1: f64,
    /// Tangent scale at p2: segment span over the p1..p3 span.
    s2: f64,
}

impl Hermite {
    fn new(t0: f64, t1: f64, t2: f64, t3: f64, u: f64) -> Self {
        let u2 = u * u;
        let u3 = u2 * u;
        let span = t2 - t1;
        Self {
            h00: 2.0 * u3 - 3.0 * u2 + 1.0,
            h10: u3 - 2.0 * u2 + u,
            h01: -2.0 * u3 + 3.0 * u2,
            h11: u3 - u2,
            s1: span / (t2 - t0),
            s2: span / (t3 - t1),
        }
    }

    fn eval(&self, v0: f64, v1: f64, v2: f64, v3: f64) -> f64 {
        let m1 = (v2 - v0) * self.s1;
        let m2 = (v3 - v1) * self.s2;
        self.h00 * v1 + self.h10 * m1 + self.h01 * v2 + self.h11 * m2
    }
}

fn nearest(window: &[Fix], time: f64) -> Option<&Fix> {
    window
        .iter()
        .min_by(|a, b| (a.time - time).abs().total_cmp(&(b.time - time).abs()))
}

/// Shift `longitude` by whole turns so it lies within 180 degrees of `reference`.
fn unwrap_longitude(reference: f64, longitude: f64) -> f64 {
    let delta = (longitude - reference + 180.0).rem_euclid(360.0) - 180.0;
    reference + delta
}

fn normalize_longitude(longitude: f64) -> f64 {
    let wrapped = (longitude + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && longitude > 0.0 {
        180.0
    } else {
        wrapped
    }
}

/// Interpolate between two angles in degrees along the shorter arc.
fn lerp_angle(from: f64, to: f64, u: f64) -> f64 {
    let delta = (to - from + 180.0).rem_euclid(360.0) - 180.0;
    (from + delta * u).rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(time: f64, lat: f64, lon: f64, alt: f64) -> Fix {
        Fix::new(time, GeoPoint::new(lat, lon), alt)
    }

    /// Straight line north at constant climb, one fix per second.
    fn straight_line(count: usize) -> Vec<Fix> {
        (0..count)
            .map(|i| fix(i as f64, 45.0 + i as f64 * 0.001, 7.0, 1000.0 + i as f64 * 2.0))
            .collect()
    }

    #[test]
    fn test_empty_window_returns_none() {
        assert!(interpolate(&[], 5.0).is_none());
    }

    #[test]
    fn test_single_fix_is_held() {
        let window = [fix(10.0, 45.0, 7.0, 1000.0)];
        let sample = interpolate(&window, 12.0).unwrap();
        assert_eq!(sample.time, 12.0);
        assert_eq!(sample.location, GeoPoint::new(45.0, 7.0));
        assert_eq!(sample.altitude, 1000.0);
    }

    #[test]
    fn test_exact_fix_time_returns_fix() {
        let window = straight_line(4);
        let sample = interpolate(&window, 1.0).unwrap();
        assert_eq!(sample.location, window[1].location);
        assert_eq!(sample.altitude, window[1].altitude);
    }

    #[test]
    fn test_midpoint_on_straight_line() {
        let window = straight_line(4);
        let sample = interpolate(&window, 1.5).unwrap();

        assert!((sample.location.latitude - 45.0015).abs() < 1e-9);
        assert!((sample.location.longitude - 7.0).abs() < 1e-9);
        assert!((sample.altitude - 1003.0).abs() < 1e-9);
        assert_eq!(sample.time, 1.5);
    }

    #[test]
    fn test_two_fix_window_interpolates() {
        let window = [fix(0.0, 45.0, 7.0, 1000.0), fix(2.0, 45.002, 7.0, 1004.0)];
        let sample = interpolate(&window, 1.0).unwrap();
        assert!((sample.location.latitude - 45.001).abs() < 1e-9);
        assert!((sample.altitude - 1002.0).abs() < 1e-9);
    }

    #[test]
    fn test_before_and_after_window_hold_nearest() {
        let window = straight_line(4);

        let before = interpolate(&window, -5.0).unwrap();
        assert_eq!(before.location, window[0].location);
        assert_eq!(before.time, -5.0);

        let after = interpolate(&window, 10.0).unwrap();
        assert_eq!(after.location, window[3].location);
        assert_eq!(after.time, 10.0);
    }

    #[test]
    fn test_irregular_spacing_stays_between_neighbours() {
        let window = [
            fix(0.0, 45.0, 7.0, 1000.0),
            fix(1.0, 45.001, 7.0, 1000.0),
            fix(5.0, 45.005, 7.0, 1000.0),
            fix(6.0, 45.006, 7.0, 1000.0),
        ];
        for step in 1..10 {
            let t = 1.0 + step as f64 * 0.4;
            let sample = interpolate(&window, t).unwrap();
            assert!(sample.location.latitude > 45.001 - 1e-9);
            assert!(sample.location.latitude < 45.005 + 1e-9);
        }
    }

    #[test]
    fn test_antimeridian_crossing_takes_short_way() {
        let window = [
            fix(0.0, 0.0, 179.998, 1000.0),
            fix(1.0, 0.0, 179.999, 1000.0),
            fix(2.0, 0.0, -180.0, 1000.0),
            fix(3.0, 0.0, -179.999, 1000.0),
        ];
        let sample = interpolate(&window, 1.5).unwrap();
        let lon = sample.location.longitude;
        assert!(lon > 179.999 || lon < -179.999, "got {lon}");
    }

    #[test]
    fn test_heading_derived_when_not_recorded() {
        let window = straight_line(4);
        let sample = interpolate(&window, 1.5).unwrap();
        let heading = sample.heading.unwrap();
        assert!(heading < 1.0 || heading > 359.0, "expected ~north, got {heading}");
    }

    #[test]
    fn test_recorded_heading_interpolated_across_north() {
        let window = [
            fix(0.0, 45.0, 7.0, 1000.0).with_track(350.0),
            fix(1.0, 45.001, 7.0, 1000.0).with_track(10.0),
        ];
        let sample = interpolate(&window, 0.5).unwrap();
        let heading = sample.heading.unwrap();
        assert!(heading.abs() < 1e-9 || (heading - 360.0).abs() < 1e-9);
    }

    #[test]
    fn test_climb_rate_derived_from_altitude() {
        let window = straight_line(4);
        let sample = interpolate(&window, 1.25).unwrap();
        assert!((sample.climb_rate.unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_unwrap_and_normalize_longitude() {
        assert!((unwrap_longitude(179.0, -179.0) - 181.0).abs() < 1e-9);
        assert!((unwrap_longitude(-179.0, 179.0) - -181.0).abs() < 1e-9);
        assert!((unwrap_longitude(10.0, 20.0) - 20.0).abs() < 1e-9);

        assert!((normalize_longitude(181.0) - -179.0).abs() < 1e-9);
        assert!((normalize_longitude(-181.0) - 179.0).abs() < 1e-9);
        assert_eq!(normalize_longitude(180.0), 180.0);
    }
}
