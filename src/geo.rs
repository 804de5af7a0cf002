//! Distance helpers and the straight-line route filter.
//!
//! Routes are modelled as the straight segment between origin and
//! destination; there is no turn-by-turn routing.

use crate::crash::record::CrashRecord;
use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const KM_PER_DEGREE: f64 = 111.0;
pub const MILES_PER_KM: f64 = 0.621371;
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 1.0;
/// Slack for projection rounding, so points on the segment pass at distance 0.
pub const ON_ROUTE_TOLERANCE_KM: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Great-circle distance in kilometers.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

pub fn haversine_miles(a: Coordinate, b: Coordinate) -> f64 {
    haversine_km(a, b) * MILES_PER_KM
}

/// Shortest distance in kilometers from `point` to the segment `start`-`end`,
/// using a local equirectangular projection around the segment.
pub fn distance_to_segment_km(point: Coordinate, start: Coordinate, end: Coordinate) -> f64 {
    let mean_lat = ((start.latitude + end.latitude) / 2.0).to_radians();
    let km_per_lon = KM_PER_DEGREE * mean_lat.cos();
    let project = |c: Coordinate| {
        (
            (c.longitude - start.longitude) * km_per_lon,
            (c.latitude - start.latitude) * KM_PER_DEGREE,
        )
    };

    let (px, py) = project(point);
    let (ex, ey) = project(end);
    let length_sq = ex * ex + ey * ey;

    let t = if length_sq == 0.0 {
        0.0
    } else {
        ((px * ex + py * ey) / length_sq).clamp(0.0, 1.0)
    };
    let (dx, dy) = (px - t * ex, py - t * ey);
    (dx * dx + dy * dy).sqrt()
}

/// Keeps the records within `max_distance_km` of the origin-destination
/// segment, preserving input order. Records without coordinates are dropped.
pub fn filter_near_route<'a>(
    records: &'a [CrashRecord],
    origin: Coordinate,
    destination: Coordinate,
    max_distance_km: f64,
) -> Vec<&'a CrashRecord> {
    records
        .iter()
        .filter(|record| {
            record.coordinates().is_some_and(|(lat, lon)| {
                distance_to_segment_km(Coordinate::new(lat, lon), origin, destination)
                    <= max_distance_km + ON_ROUTE_TOLERANCE_KM
            })
        })
        .collect()
}
