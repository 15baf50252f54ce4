//! GeoJSON input/output for station and coastline data.
//!
//! Station records come from the national land numerical survey (N02 railway
//! dataset) filtered to feature collections of short LineStrings, one per
//! station, with the survey's `N02_*` property names. Those names are preserved
//! on output so every pipeline stage round-trips through the same document
//! shape the map front end consumes.
//!
//! A primary input that cannot be read or parsed is fatal to the pass. An
//! individual station with missing or malformed geometry is logged and skipped.

use anyhow::{bail, Context, Result};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::geo_utils::{polyline_centroid, polyline_midpoint};
use crate::GeoPoint;

// ============================================================================
// Station Records
// ============================================================================

/// Survey properties of one station, plus the attributes the pipeline derives.
///
/// Field names mirror the N02 survey schema: `N02_003` line name, `N02_004`
/// operator name, `N02_005` station name, with the remaining codes carried
/// through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationProperties {
    #[serde(rename = "N02_001", default, skip_serializing_if = "Option::is_none")]
    pub railway_class: Option<String>,
    #[serde(rename = "N02_002", default, skip_serializing_if = "Option::is_none")]
    pub operator_class: Option<String>,
    #[serde(rename = "N02_003")]
    pub line: String,
    #[serde(rename = "N02_004")]
    pub operator: String,
    #[serde(rename = "N02_005")]
    pub name: String,
    #[serde(rename = "N02_005c", default, skip_serializing_if = "Option::is_none")]
    pub station_code: Option<String>,
    #[serde(rename = "N02_005g", default, skip_serializing_if = "Option::is_none")]
    pub group_code: Option<String>,

    /// Great-circle distance from the reference point, km, 3 decimals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km_from_tokyo: Option<f64>,
    /// Distance to the nearest coastline along the east-southeast bearing, km.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_to_ese_coast_km: Option<f64>,
    /// Set on excluded stations: an opposite shore sits close past the coastline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_nearby_land_beyond_coast: Option<bool>,
    /// Shore-to-shore gap for excluded stations, km.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_to_nearby_land_km: Option<f64>,
    /// Last-train clock time, `HH:MM` (hours 0-3 mean after midnight).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_train_arrival: Option<String>,
    /// Last-train type and number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_train_info: Option<String>,
}

/// One station: survey properties and its track-segment polyline.
#[derive(Debug, Clone)]
pub struct Station {
    pub properties: StationProperties,
    pub geometry: Vec<GeoPoint>,
}

impl Station {
    /// Mean of the polyline vertices; the reference-distance stage's center.
    pub fn centroid(&self) -> Option<GeoPoint> {
        polyline_centroid(&self.geometry)
    }

    /// Middle vertex of the polyline; the ray-cast stage's center.
    pub fn midpoint(&self) -> Option<GeoPoint> {
        polyline_midpoint(&self.geometry)
    }
}

/// A named station feature collection, the unit every pipeline stage consumes
/// and produces.
#[derive(Debug, Clone, Default)]
pub struct StationCollection {
    pub name: Option<String>,
    pub stations: Vec<Station>,
}

impl StationCollection {
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

// ============================================================================
// Station IO
// ============================================================================

/// Read a station feature collection. Unreadable or unparseable input is fatal;
/// individual malformed stations are skipped with a warning.
pub fn read_stations(path: &Path) -> Result<StationCollection> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read station file {}", path.display()))?;
    let geojson: GeoJson = raw
        .parse()
        .with_context(|| format!("failed to parse GeoJSON in {}", path.display()))?;

    let GeoJson::FeatureCollection(fc) = geojson else {
        bail!("{}: expected a FeatureCollection", path.display());
    };

    let name = fc
        .foreign_members
        .as_ref()
        .and_then(|m| m.get("name"))
        .and_then(|v| v.as_str())
        .map(String::from);

    let total = fc.features.len();
    let stations: Vec<Station> = fc.features.into_iter().filter_map(station_from_feature).collect();

    if stations.len() < total {
        log::warn!(
            "{}: skipped {} of {} station features",
            path.display(),
            total - stations.len(),
            total
        );
    }
    log::info!("{}: loaded {} stations", path.display(), stations.len());

    Ok(StationCollection { name, stations })
}

/// Write a station feature collection, pretty-printed, preserving the
/// collection name and per-station LineString geometry.
pub fn write_stations(collection: &StationCollection, path: &Path) -> Result<()> {
    let features: Vec<Feature> = collection.stations.iter().map(feature_from_station).collect();

    let foreign_members = collection.name.as_ref().map(|name| {
        let mut members = JsonObject::new();
        members.insert("name".to_string(), serde_json::json!(name));
        members
    });

    let fc = FeatureCollection {
        bbox: None,
        features,
        foreign_members,
    };

    let json_string = serde_json::to_string_pretty(&GeoJson::from(fc))
        .context("failed to serialize station GeoJSON")?;
    std::fs::write(path, json_string)
        .with_context(|| format!("failed to write stations to {}", path.display()))?;

    log::info!("{}: wrote {} stations", path.display(), collection.len());
    Ok(())
}

fn station_from_feature(feature: Feature) -> Option<Station> {
    let geometry = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::LineString(coords)) => line_string_points(coords),
        _ => Vec::new(),
    };

    if geometry.is_empty() {
        log::warn!(
            "skipping station feature with missing or empty LineString geometry ({})",
            feature
                .properties
                .as_ref()
                .and_then(|p| p.get("N02_005"))
                .and_then(|v| v.as_str())
                .unwrap_or("unnamed")
        );
        return None;
    }

    let Some(props) = feature.properties else {
        log::warn!("skipping station feature with no properties object");
        return None;
    };
    let properties: StationProperties =
        match serde_json::from_value(serde_json::Value::Object(props)) {
            Ok(p) => p,
            Err(err) => {
                log::warn!("skipping station feature with malformed properties: {}", err);
                return None;
            }
        };

    Some(Station { properties, geometry })
}

fn feature_from_station(station: &Station) -> Feature {
    let coords: Vec<Vec<f64>> = station.geometry.iter().map(|p| vec![p.lon, p.lat]).collect();

    let properties = match serde_json::to_value(&station.properties) {
        Ok(serde_json::Value::Object(map)) => Some(map),
        _ => None,
    };

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::LineString(coords))),
        id: None,
        properties,
        foreign_members: None,
    }
}

fn line_string_points(coords: &[Vec<f64>]) -> Vec<GeoPoint> {
    coords
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| GeoPoint::new(c[1], c[0]))
        .collect()
}

// ============================================================================
// Coastline IO
// ============================================================================

/// Read coastline polylines from one or more GeoJSON files, merged in order.
///
/// LineString features contribute one polyline each, MultiLineStrings one per
/// member line. Any unreadable file is fatal: a coastline pass over partial
/// data would silently misclassify stations.
pub fn read_coastlines(paths: &[impl AsRef<Path>]) -> Result<Vec<Vec<GeoPoint>>> {
    let mut polylines = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read coastline file {}", path.display()))?;
        let geojson: GeoJson = raw
            .parse()
            .with_context(|| format!("failed to parse GeoJSON in {}", path.display()))?;

        let GeoJson::FeatureCollection(fc) = geojson else {
            bail!("{}: expected a FeatureCollection", path.display());
        };

        let before = polylines.len();
        for feature in &fc.features {
            match feature.geometry.as_ref().map(|g| &g.value) {
                Some(Value::LineString(coords)) => {
                    polylines.push(line_string_points(coords));
                }
                Some(Value::MultiLineString(lines)) => {
                    polylines.extend(lines.iter().map(|coords| line_string_points(coords)));
                }
                _ => {}
            }
        }
        log::info!(
            "{}: loaded {} coastline polylines",
            path.display(),
            polylines.len() - before
        );
    }

    log::info!("loaded {} coastline polylines in total", polylines.len());
    Ok(polylines)
}

// ============================================================================
// Unit Tests
// ============================================================================
