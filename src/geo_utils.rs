//! # Geographic Utilities
//!
//! Core geographic computation utilities for the station filtering pipeline.
//!
//! All coordinates are WGS84 latitude/longitude in decimal degrees; distances are
//! kilometres on a spherical earth (radius 6371 km). That approximation is accurate
//! to well under 0.5% at the regional scale this pipeline operates on, and matches
//! what the coastline filter and the distance-from-Tokyo stage expect.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance_km`] | Great-circle distance between two points |
//! | [`destination`] | Forward projection along a compass bearing |
//! | [`segment_intersection`] | Planar intersection of two line segments |
//! | [`polyline_centroid`] | Arithmetic mean of a polyline's vertices |
//! | [`polyline_midpoint`] | Middle vertex of a polyline |
//!
//! ## Algorithm Notes
//!
//! ### Haversine Formula
//!
//! Standard great-circle distance on a sphere, the same formula every stage of the
//! pipeline uses so derived distances stay mutually consistent.
//!
//! Reference: [Haversine formula (Wikipedia)](https://en.wikipedia.org/wiki/Haversine_formula)
//!
//! ### Segment Intersection
//!
//! Intersection is computed in the flat lon/lat plane. At the few-kilometre ray
//! lengths used by the coastline filter the deviation from the true geodesic is
//! a handful of metres, far below the 2 km / 5 km classification thresholds.
//! No antimeridian handling is needed for the bounded Kanto region.

use crate::GeoPoint;
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Destination, Distance, Haversine, Line, Point};

// =============================================================================
// Distance and Projection
// =============================================================================

/// Calculate the great-circle distance between two points in kilometres.
///
/// Symmetric and non-negative; zero (up to floating tolerance) only for
/// identical points.
///
/// # Example
///
/// ```rust
/// use sunrise_stations::{GeoPoint, geo_utils};
///
/// let tokyo = GeoPoint::new(35.681236, 139.767125);
/// let choshi = GeoPoint::new(35.734559, 140.826942);
///
/// let km = geo_utils::haversine_distance_km(tokyo, choshi);
/// assert!((km - 96.0).abs() < 2.0); // roughly 96 km
/// ```
#[inline]
pub fn haversine_distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let p1 = Point::new(a.lon, a.lat);
    let p2 = Point::new(b.lon, b.lat);
    Haversine::distance(p1, p2) / 1000.0
}

/// Project a point along a compass bearing for a given distance.
///
/// `bearing_deg` is measured clockwise from true north (0-360). Returns the
/// destination point on a spherical earth.
///
/// # Example
///
/// ```rust
/// use sunrise_stations::{GeoPoint, geo_utils};
///
/// let origin = GeoPoint::new(35.0, 140.0);
/// let east = geo_utils::destination(origin, 90.0, 10.0);
///
/// assert!((geo_utils::haversine_distance_km(origin, east) - 10.0).abs() < 0.01);
/// assert!(east.lon > origin.lon);
/// ```
#[inline]
pub fn destination(origin: GeoPoint, bearing_deg: f64, distance_km: f64) -> GeoPoint {
    let p = Haversine::destination(Point::new(origin.lon, origin.lat), bearing_deg, distance_km * 1000.0);
    GeoPoint::new(p.y(), p.x())
}

// =============================================================================
// Segment Intersection
// =============================================================================

/// Intersect two line segments in the flat lon/lat plane.
///
/// Returns the intersection point, or `None` when the segments are parallel,
/// disjoint, or degenerate (zero length). A collinear overlap reports the start
/// of the shared portion; the coastline filter's duplicate-hit collapsing makes
/// the choice of representative point immaterial.
pub fn segment_intersection(a1: GeoPoint, a2: GeoPoint, b1: GeoPoint, b2: GeoPoint) -> Option<GeoPoint> {
    if a1 == a2 || b1 == b2 {
        return None;
    }

    let la = Line::new(
        Coord { x: a1.lon, y: a1.lat },
        Coord { x: a2.lon, y: a2.lat },
    );
    let lb = Line::new(
        Coord { x: b1.lon, y: b1.lat },
        Coord { x: b2.lon, y: b2.lat },
    );

    match line_intersection(la, lb)? {
        LineIntersection::SinglePoint { intersection, .. } => {
            Some(GeoPoint::new(intersection.y, intersection.x))
        }
        LineIntersection::Collinear { intersection } => {
            Some(GeoPoint::new(intersection.start.y, intersection.start.x))
        }
    }
}

// =============================================================================
// Polyline Representative Points
// =============================================================================

/// Arithmetic mean of a polyline's vertices.
///
/// Used by the distance-from-reference stage. Returns `None` for an empty
/// polyline. Fine for the short station track segments this pipeline sees;
/// not meaningful across the antimeridian.
pub fn polyline_centroid(points: &[GeoPoint]) -> Option<GeoPoint> {
    if points.is_empty() {
        return None;
    }

    let sum_lat: f64 = points.iter().map(|p| p.lat).sum();
    let sum_lon: f64 = points.iter().map(|p| p.lon).sum();
    let n = points.len() as f64;

    Some(GeoPoint::new(sum_lat / n, sum_lon / n))
}

/// Middle vertex of a polyline (`points[len / 2]`).
///
/// The coastline filter uses this as the station center: stations are stored as
/// short track-segment polylines and the middle vertex sits on the platform.
/// Returns `None` for an empty polyline.
#[inline]
pub fn polyline_midpoint(points: &[GeoPoint]) -> Option<GeoPoint> {
    if points.is_empty() {
        return None;
    }
    Some(points[points.len() / 2])
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_distance_same_point_is_zero() {
        let p = GeoPoint::new(35.681236, 139.767125);
        assert_eq!(haversine_distance_km(p, p), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = GeoPoint::new(35.681236, 139.767125);
        let b = GeoPoint::new(35.0, 140.5);
        assert!(approx_eq(
            haversine_distance_km(a, b),
            haversine_distance_km(b, a),
            1e-12
        ));
    }

    #[test]
    fn test_distance_known_value() {
        // Tokyo Station to Yokohama Station is roughly 27 km
        let tokyo = GeoPoint::new(35.681236, 139.767125);
        let yokohama = GeoPoint::new(35.465786, 139.622313);
        let km = haversine_distance_km(tokyo, yokohama);
        assert!(approx_eq(km, 27.0, 1.5));
    }

    #[test]
    fn test_destination_round_trip() {
        let origin = GeoPoint::new(35.681236, 139.767125);
        for bearing in [0.0, 90.0, 112.5, 245.0] {
            let dest = destination(origin, bearing, 10.0);
            assert!(approx_eq(haversine_distance_km(origin, dest), 10.0, 0.01));
        }
    }

    #[test]
    fn test_destination_east_southeast_heads_south_and_east() {
        let origin = GeoPoint::new(35.0, 140.0);
        let dest = destination(origin, 112.5, 10.0);
        assert!(dest.lat < origin.lat);
        assert!(dest.lon > origin.lon);
    }

    #[test]
    fn test_segment_intersection_crossing() {
        let hit = segment_intersection(
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 2.0),
            GeoPoint::new(-1.0, 1.0),
            GeoPoint::new(1.0, 1.0),
        )
        .unwrap();
        assert!(approx_eq(hit.lat, 0.0, 1e-9));
        assert!(approx_eq(hit.lon, 1.0, 1e-9));
    }

    #[test]
    fn test_segment_intersection_parallel() {
        let hit = segment_intersection(
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 2.0),
            GeoPoint::new(1.0, 0.0),
            GeoPoint::new(1.0, 2.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_segment_intersection_disjoint() {
        let hit = segment_intersection(
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(1.0, 2.0),
            GeoPoint::new(-1.0, 2.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_segment_intersection_degenerate() {
        let p = GeoPoint::new(0.5, 0.5);
        let hit = segment_intersection(p, p, GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0));
        assert!(hit.is_none());
    }

    #[test]
    fn test_polyline_centroid() {
        let line = vec![GeoPoint::new(35.50, 140.10), GeoPoint::new(35.52, 140.12)];
        let center = polyline_centroid(&line).unwrap();
        assert!(approx_eq(center.lat, 35.51, 1e-9));
        assert!(approx_eq(center.lon, 140.11, 1e-9));
    }

    #[test]
    fn test_polyline_centroid_empty() {
        assert!(polyline_centroid(&[]).is_none());
    }

    #[test]
    fn test_polyline_midpoint_picks_middle_vertex() {
        let line = vec![
            GeoPoint::new(35.50, 140.10),
            GeoPoint::new(35.51, 140.11),
            GeoPoint::new(35.52, 140.12),
        ];
        assert_eq!(polyline_midpoint(&line).unwrap(), line[1]);

        // Even-length polylines take the upper-middle vertex, matching len / 2
        let line4 = vec![
            GeoPoint::new(35.50, 140.10),
            GeoPoint::new(35.51, 140.11),
            GeoPoint::new(35.52, 140.12),
            GeoPoint::new(35.53, 140.13),
        ];
        assert_eq!(polyline_midpoint(&line4).unwrap(), line4[2]);
    }
}
