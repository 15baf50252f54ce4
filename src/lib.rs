//! # Sunrise Stations
//!
//! Coastal station filtering and sunrise wait-time computation for the Kanto seaboard.
//!
//! This library powers an offline data-preparation pipeline that answers one question:
//! from which railway stations within reach of Tokyo can you step off the last train,
//! walk to the shore, and watch the sun rise over open ocean?
//!
//! It provides:
//! - Ray-casting of a fixed compass bearing against coastline polylines to find
//!   stations with nearby, unobstructed ocean ([`coast`])
//! - Approximate solar sunrise times and last-train-to-sunrise wait durations ([`sunrise`])
//! - Last-train extraction from ODPT-style station timetables ([`timetable`])
//! - GeoJSON input/output preserving the source station records ([`io`])
//! - The batch filtering stages tying it all together ([`pipeline`])
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel batch filtering with rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use sunrise_stations::{GeoPoint, CoastlineIndex, RayConfig};
//!
//! // A short stretch of coastline running north-south, east of the station
//! let coastline = vec![vec![
//!     GeoPoint::new(35.70, 140.40),
//!     GeoPoint::new(35.60, 140.42),
//!     GeoPoint::new(35.50, 140.44),
//! ]];
//!
//! let index = CoastlineIndex::from_polylines(&coastline);
//! let station = GeoPoint::new(35.61, 140.40);
//!
//! let config = RayConfig::default();
//! if let Some(km) = index.distance_to_coast(station, &config) {
//!     println!("coast is {:.3} km away along the bearing", km);
//! }
//! ```

pub mod coast;
pub mod geo_utils;
pub mod io;
pub mod pipeline;
pub mod sunrise;
pub mod timetable;

pub use coast::{CoastlineIndex, Intersection, OpenSea, RayConfig};
pub use io::{Station, StationCollection, StationProperties};
pub use sunrise::{sunrise, wait_until_sunrise, Sunrise, WaitTime};
pub use timetable::{LastTrain, NameMapping, StationMapping, TimetableSet};

// ============================================================================
// Core Types
// ============================================================================

/// A WGS84 coordinate with latitude and longitude in decimal degrees.
///
/// # Example
/// ```
/// use sunrise_stations::GeoPoint;
/// let point = GeoPoint::new(35.681236, 139.767125); // Tokyo Station
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Create a new point.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Check that the point has finite, in-range coordinates.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && self.lat >= -90.0
            && self.lat <= 90.0
            && self.lon >= -180.0
            && self.lon <= 180.0
    }
}

/// Tokyo Station, the reference point for the distance filter.
pub const TOKYO_STATION: GeoPoint = GeoPoint {
    lat: 35.681236,
    lon: 139.767125,
};

/// Bearing for the coastline ray cast: east-southeast, degrees clockwise from true north.
pub const BEARING_ESE: f64 = 112.5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new(35.681236, 139.767125).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 181.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_tokyo_station_is_valid() {
        assert!(TOKYO_STATION.is_valid());
    }
}
