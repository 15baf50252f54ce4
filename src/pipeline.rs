//! # Batch Filtering Stages
//!
//! The offline pipeline narrows the national station dataset down to the
//! sunrise-worthy few, one idempotent pass at a time:
//!
//! 1. [`filter_near_reference`] - keep stations within a radius of Tokyo
//!    Station, annotating the distance.
//! 2. [`filter_near_coast`] - keep stations whose east-southeast ray reaches
//!    coastline within the near-coast threshold, annotating the distance.
//! 3. [`split_open_sea`] - separate open-ocean stations from those facing an
//!    enclosed bay, annotating the excluded ones with the opposite-shore gap.
//! 4. [`annotate_last_trains`] - attach last-train times via the name mapping.
//! 5. [`station_sunrises`] - sunrise and wait-until-sunrise per station for a
//!    chosen date.
//!
//! Each stage is a pure in-memory transformation of a [`StationCollection`];
//! rerunning with the same inputs reproduces the same output. A station's
//! coastline distance and open-sea classification always come from the same
//! ray-cast pass, and its sunrise and wait time from the same (lat, lon, date)
//! and (arrival, sunrise) pair.

use chrono::NaiveDate;

use crate::coast::{CoastlineIndex, OpenSea, RayConfig};
use crate::geo_utils::haversine_distance_km;
use crate::io::{Station, StationCollection};
use crate::sunrise::{sunrise, wait_until_sunrise, Sunrise, WaitTime};
use crate::timetable::{last_train_for_station, NameMapping, TimetableSet};
use crate::GeoPoint;

/// Round to 3 decimal places, the precision recorded in the output properties.
fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

// ============================================================================
// Stage 1: Distance from Reference
// ============================================================================

/// Keep stations whose centroid lies within `radius_km` of `reference`,
/// annotating `distance_km_from_tokyo`.
///
/// Stations with empty geometry are skipped with a warning.
pub fn filter_near_reference(
    collection: StationCollection,
    reference: GeoPoint,
    radius_km: f64,
) -> StationCollection {
    let total = collection.len();

    let stations: Vec<Station> = collection
        .stations
        .into_iter()
        .filter_map(|mut station| {
            let Some(center) = station.centroid() else {
                log::warn!("skipping station with empty geometry: {}", station.properties.name);
                return None;
            };

            let distance = haversine_distance_km(center, reference);
            if distance > radius_km {
                return None;
            }

            station.properties.distance_km_from_tokyo = Some(round3(distance));
            Some(station)
        })
        .collect();

    log::info!(
        "reference filter: {} of {} stations within {} km",
        stations.len(),
        total,
        radius_km
    );

    StationCollection {
        name: collection.name,
        stations,
    }
}

// ============================================================================
// Stage 2: Near-Coast Filter
// ============================================================================

/// Keep stations whose bearing ray reaches coastline within
/// [`RayConfig::max_coast_distance_km`], annotating `distance_to_ese_coast_km`.
pub fn filter_near_coast(
    collection: StationCollection,
    coast: &CoastlineIndex,
    config: &RayConfig,
) -> StationCollection {
    let total = collection.len();

    let check = |mut station: Station| -> Option<Station> {
        let Some(center) = station.midpoint() else {
            log::warn!("skipping station with empty geometry: {}", station.properties.name);
            return None;
        };

        let distance = coast.distance_to_coast(center, config)?;
        if distance > config.max_coast_distance_km {
            return None;
        }

        station.properties.distance_to_ese_coast_km = Some(round3(distance));
        log::debug!(
            "{} ({}): coast at {:.3} km",
            station.properties.name,
            station.properties.line,
            distance
        );
        Some(station)
    };

    #[cfg(feature = "parallel")]
    let stations: Vec<Station> = {
        use rayon::prelude::*;
        collection.stations.into_par_iter().filter_map(check).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let stations: Vec<Station> = collection.stations.into_iter().filter_map(check).collect();

    log::info!(
        "near-coast filter: {} of {} stations within {} km of the coastline",
        stations.len(),
        total,
        config.max_coast_distance_km
    );

    StationCollection {
        name: collection.name,
        stations,
    }
}

// ============================================================================
// Stage 3: Open-Sea Refinement
// ============================================================================

/// Result of the open-sea pass: the retained stations and the excluded ones,
/// the latter annotated with the opposite-shore flag and distance.
pub struct OpenSeaSplit {
    pub open_sea: StationCollection,
    pub enclosed: StationCollection,
}

/// Separate stations facing open ocean from those with land visible across the
/// water, using the longer open-sea ray.
pub fn split_open_sea(
    collection: StationCollection,
    coast: &CoastlineIndex,
    config: &RayConfig,
) -> OpenSeaSplit {
    let name = collection.name;

    let classify = |station: Station| -> (Station, OpenSea) {
        let verdict = match station.midpoint() {
            Some(center) => coast.classify_open_sea(center, config),
            None => OpenSea::NoCoast,
        };
        (station, verdict)
    };

    #[cfg(feature = "parallel")]
    let classified: Vec<(Station, OpenSea)> = {
        use rayon::prelude::*;
        collection.stations.into_par_iter().map(classify).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let classified: Vec<(Station, OpenSea)> = collection.stations.into_iter().map(classify).collect();

    let mut open_sea = Vec::new();
    let mut enclosed = Vec::new();

    for (mut station, verdict) in classified {
        match verdict {
            OpenSea::Enclosed { nearby_land_km } => {
                log::debug!(
                    "{} ({}): opposite shore at {:.3} km",
                    station.properties.name,
                    station.properties.line,
                    nearby_land_km
                );
                station.properties.has_nearby_land_beyond_coast = Some(true);
                station.properties.distance_to_nearby_land_km = Some(round3(nearby_land_km));
                enclosed.push(station);
            }
            // A station that already passed the near-coast filter but whose
            // longer ray finds no coastline keeps its classification open.
            OpenSea::Open | OpenSea::NoCoast => open_sea.push(station),
        }
    }

    log::info!(
        "open-sea filter: {} retained, {} excluded with land across the water",
        open_sea.len(),
        enclosed.len()
    );

    OpenSeaSplit {
        open_sea: StationCollection {
            name: name.clone(),
            stations: open_sea,
        },
        enclosed: StationCollection {
            name,
            stations: enclosed,
        },
    }
}

// ============================================================================
// Stage 4: Last-Train Annotation
// ============================================================================

/// Attach `last_train_arrival` / `last_train_info` to every station the name
/// mapping covers. Returns the number of stations matched; unmapped stations
/// are left untouched.
pub fn annotate_last_trains(
    collection: &mut StationCollection,
    mapping: &NameMapping,
    sets: &[TimetableSet],
) -> usize {
    let mut matched = 0usize;

    for station in &mut collection.stations {
        let name = &station.properties.name;

        let Some(last) = last_train_for_station(name, mapping, sets) else {
            log::debug!("no timetable match for {} ({})", name, station.properties.operator);
            continue;
        };

        log::debug!("{}: last train {} ({})", name, last.time, last.info);
        station.properties.last_train_arrival = Some(last.time);
        station.properties.last_train_info = Some(last.info);
        matched += 1;
    }

    log::info!(
        "last-train annotation: matched {} of {} stations",
        matched,
        collection.len()
    );
    matched
}

// ============================================================================
// Stage 5: Sunrise Report
// ============================================================================

/// Sunrise and wait-until-sunrise for one station on the chosen date.
#[derive(Debug, Clone)]
pub struct StationSunrise {
    pub name: String,
    pub line: String,
    pub last_train_arrival: Option<String>,
    pub sunrise: Sunrise,
    pub wait: Option<WaitTime>,
}

/// Compute sunrise and, where a last train is known, the wait from its arrival
/// until sunrise, for every station. Sunrise and wait are derived together from
/// one (lat, lon, date) and one (arrival, sunrise) pair per station.
pub fn station_sunrises(collection: &StationCollection, date: NaiveDate) -> Vec<StationSunrise> {
    collection
        .stations
        .iter()
        .filter_map(|station| {
            let center = station.midpoint()?;
            let sunrise = sunrise(center.lat, center.lon, date);
            let wait = station
                .properties
                .last_train_arrival
                .as_deref()
                .and_then(|arrival| wait_until_sunrise(arrival, &sunrise));

            Some(StationSunrise {
                name: station.properties.name.clone(),
                line: station.properties.line.clone(),
                last_train_arrival: station.properties.last_train_arrival.clone(),
                sunrise,
                wait,
            })
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::destination;
    use crate::io::StationProperties;
    use crate::timetable::{StationMapping, StationTimetable, TimetableObject};
    use std::collections::HashMap;

    fn props(name: &str) -> StationProperties {
        StationProperties {
            railway_class: None,
            operator_class: None,
            line: "常磐線".to_string(),
            operator: "東日本旅客鉄道".to_string(),
            name: name.to_string(),
            station_code: None,
            group_code: None,
            distance_km_from_tokyo: None,
            distance_to_ese_coast_km: None,
            has_nearby_land_beyond_coast: None,
            distance_to_nearby_land_km: None,
            last_train_arrival: None,
            last_train_info: None,
        }
    }

    /// A three-vertex station polyline whose middle vertex is `center`.
    fn station_at(name: &str, center: GeoPoint) -> Station {
        Station {
            properties: props(name),
            geometry: vec![
                destination(center, 270.0, 0.05),
                center,
                destination(center, 90.0, 0.05),
            ],
        }
    }

    /// A coastline segment perpendicular to the bearing, crossing the ray from
    /// `origin` at exactly `distance_km`.
    fn crossing_segment(origin: GeoPoint, bearing_deg: f64, distance_km: f64) -> Vec<GeoPoint> {
        let on_ray = destination(origin, bearing_deg, distance_km);
        vec![
            destination(on_ray, bearing_deg - 90.0, 3.0),
            destination(on_ray, bearing_deg + 90.0, 3.0),
        ]
    }

    #[test]
    fn test_filter_near_reference() {
        let reference = GeoPoint::new(35.681236, 139.767125);
        let near = station_at("品川", GeoPoint::new(35.628, 139.739));
        let far = station_at("札幌", GeoPoint::new(43.068, 141.350));

        let collection = StationCollection {
            name: Some("stations".to_string()),
            stations: vec![near, far],
        };

        let filtered = filter_near_reference(collection, reference, 200.0);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.stations[0].properties.name, "品川");

        let d = filtered.stations[0].properties.distance_km_from_tokyo.unwrap();
        assert!(d > 0.0 && d < 10.0);
        // Annotated with 3-decimal precision
        assert_eq!(d, round3(d));
    }

    #[test]
    fn test_filter_near_reference_skips_empty_geometry() {
        let mut broken = station_at("欠損", GeoPoint::new(35.6, 139.7));
        broken.geometry.clear();

        let collection = StationCollection {
            name: None,
            stations: vec![broken],
        };
        let filtered = filter_near_reference(collection, GeoPoint::new(35.6, 139.7), 200.0);
        assert!(filtered.is_empty());
    }

    /// End-to-end scenario over three synthetic stations:
    /// - A: coast at 1.0 km, opposite shore at 15 km -> retained, open sea
    /// - B: coast at 1.5 km, opposite shore at 4 km -> enclosed bay, excluded
    /// - C: coast at 3.0 km -> fails the near-coast filter
    #[test]
    fn test_full_coast_pipeline() {
        let config = RayConfig::default();
        let base = GeoPoint::new(35.2, 140.0);

        // Spread the stations far enough apart that each ray only meets its
        // own coastline segments.
        let center_a = base;
        let center_b = destination(base, 22.5, 30.0);
        let center_c = destination(base, 22.5, 60.0);

        let polylines = vec![
            crossing_segment(center_a, config.bearing_deg, 1.0),
            crossing_segment(center_a, config.bearing_deg, 15.0),
            crossing_segment(center_b, config.bearing_deg, 1.5),
            crossing_segment(center_b, config.bearing_deg, 4.0),
            crossing_segment(center_c, config.bearing_deg, 3.0),
        ];
        let coast = CoastlineIndex::from_polylines(&polylines);

        let collection = StationCollection {
            name: Some("test".to_string()),
            stations: vec![
                station_at("A", center_a),
                station_at("B", center_b),
                station_at("C", center_c),
            ],
        };

        let near = filter_near_coast(collection, &coast, &config);
        assert_eq!(near.len(), 2);

        let names: Vec<&str> = near.stations.iter().map(|s| s.properties.name.as_str()).collect();
        assert!(names.contains(&"A"));
        assert!(names.contains(&"B"));

        for station in &near.stations {
            let d = station.properties.distance_to_ese_coast_km.unwrap();
            let expected = if station.properties.name == "A" { 1.0 } else { 1.5 };
            assert!(
                (d - expected).abs() <= 0.002,
                "{}: expected ~{:.3} km, got {:.3}",
                station.properties.name,
                expected,
                d
            );
        }

        let split = split_open_sea(near, &coast, &config);
        assert_eq!(split.open_sea.len(), 1);
        assert_eq!(split.open_sea.stations[0].properties.name, "A");
        assert_eq!(split.enclosed.len(), 1);

        let excluded = &split.enclosed.stations[0];
        assert_eq!(excluded.properties.name, "B");
        assert_eq!(excluded.properties.has_nearby_land_beyond_coast, Some(true));
        let gap = excluded.properties.distance_to_nearby_land_km.unwrap();
        assert!((gap - 2.5).abs() <= 0.005, "gap {:.3}", gap);
    }

    #[test]
    fn test_annotate_last_trains() {
        let mut collection = StationCollection {
            name: None,
            stations: vec![
                station_at("日立", GeoPoint::new(36.59, 140.65)),
                station_at("勝浦", GeoPoint::new(35.15, 140.32)),
            ],
        };

        let entries = vec![StationTimetable {
            railway: "odpt.Railway:JR-East.Joban".to_string(),
            station: "odpt.Station:JR-East.Joban.Hitachi".to_string(),
            calendar: Some("odpt.Calendar:Weekday".to_string()),
            rail_direction: None,
            objects: vec![TimetableObject {
                departure_time: Some("00:21".to_string()),
                arrival_time: None,
                train_type: Some("odpt.TrainType:JR-East.Local".to_string()),
                train_number: Some("599M".to_string()),
            }],
        }];
        let sets = [TimetableSet::from_entries("JREast", entries)];

        let mut entries = HashMap::new();
        entries.insert(
            "日立".to_string(),
            vec![StationMapping {
                romaji: "Hitachi".to_string(),
                railway: "Joban".to_string(),
                operator: "JREast".to_string(),
            }],
        );
        let mapping = NameMapping::new(entries);

        let matched = annotate_last_trains(&mut collection, &mapping, &sets);
        assert_eq!(matched, 1);

        let hitachi = &collection.stations[0].properties;
        assert_eq!(hitachi.last_train_arrival.as_deref(), Some("00:21"));
        assert_eq!(hitachi.last_train_info.as_deref(), Some("Local 599M"));

        // Unmapped station untouched
        assert!(collection.stations[1].properties.last_train_arrival.is_none());
    }

    #[test]
    fn test_station_sunrises_wait_pairs_with_arrival() {
        let mut station = station_at("日立", GeoPoint::new(36.59, 140.65));
        station.properties.last_train_arrival = Some("00:21".to_string());

        let collection = StationCollection {
            name: None,
            stations: vec![station],
        };

        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let report = station_sunrises(&collection, date);
        assert_eq!(report.len(), 1);

        let entry = &report[0];
        let Sunrise::Rises { .. } = entry.sunrise else {
            panic!("expected a sunrise at Kanto latitudes");
        };
        let wait = entry.wait.unwrap();
        // Sunrise around 06:50 local; roughly six and a half hours of waiting
        assert!(wait.hours >= 5 && wait.hours <= 7);
    }
}
