//! Geodesy: coordinates, great-circle distance and initial bearing.
//!
//! This module provides:
//!
//! - **Coordinate**: WGS-84 latitude/longitude in degrees
//! - **BoundingBox**: northeast/southwest corners of a route
//! - **Distance**: Haversine distance in meters
//! - **Bearing**: initial bearing normalized to `[0, 360)`

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters used by the Haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS-84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lng", alias = "lon")]
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Distance to `other` in meters.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        distance_meters(*self, *other)
    }
}

/// Rectangular bounds of a route as returned by the directions provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub northeast: Coordinate,
    pub southwest: Coordinate,
}

impl BoundingBox {
    /// Smallest box containing every point, or `None` for an empty slice.
    pub fn enclosing(points: &[Coordinate]) -> Option<Self> {
        let first = points.first()?;
        let mut northeast = *first;
        let mut southwest = *first;
        for point in &points[1..] {
            northeast.latitude = northeast.latitude.max(point.latitude);
            northeast.longitude = northeast.longitude.max(point.longitude);
            southwest.latitude = southwest.latitude.min(point.latitude);
            southwest.longitude = southwest.longitude.min(point.longitude);
        }
        Some(Self {
            northeast,
            southwest,
        })
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        point.latitude <= self.northeast.latitude
            && point.latitude >= self.southwest.latitude
            && point.longitude <= self.northeast.longitude
            && point.longitude >= self.southwest.longitude
    }
}

/// Haversine great-circle distance between two coordinates in meters.
///
/// Symmetric in its arguments and exactly `0.0` for identical points.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    if a == b {
        return 0.0;
    }
    let (lat1, lon1) = (a.latitude.to_radians(), a.longitude.to_radians());
    let (lat2, lon2) = (b.latitude.to_radians(), b.longitude.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Sum of segment distances along a path in meters.
pub fn path_length_meters(path: &[Coordinate]) -> f64 {
    path.windows(2).map(|pair| distance_meters(pair[0], pair[1])).sum()
}

/// Initial bearing from `a` to `b` in degrees, normalized to `[0, 360)`.
///
/// The bearing between identical points is undefined; this returns `0.0`.
pub fn bearing_degrees(a: Coordinate, b: Coordinate) -> f64 {
    if a == b {
        return 0.0;
    }
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if bearing >= 360.0 {
        0.0
    } else {
        bearing
    }
}
