//! # Last-Train Extraction
//!
//! Cross-references filtered stations against ODPT-style station timetables to
//! find the last train of the night reaching each one.
//!
//! Two naming schemes meet here and they do not agree: the survey geometry keys
//! stations by Japanese display name, the timetable feed by dot-delimited
//! identifier paths ending in a romanized name
//! (`odpt.Station:JR-East.Joban.Hitachi`). The bridge is a hand-maintained
//! [`NameMapping`] passed in explicitly, so the cross-referencing stage stays a
//! pure function of its inputs.
//!
//! Clock times follow the late-night service-day convention: hours 0-3 belong
//! to the tail of the previous day and order as 24-27 when comparing.

use serde::Deserialize;
use std::collections::HashMap;

use crate::sunrise::parse_hhmm;

// ============================================================================
// ODPT Records
// ============================================================================

/// One scheduled train event at a station.
#[derive(Debug, Clone, Deserialize)]
pub struct TimetableObject {
    #[serde(rename = "odpt:departureTime", default)]
    pub departure_time: Option<String>,
    #[serde(rename = "odpt:arrivalTime", default)]
    pub arrival_time: Option<String>,
    #[serde(rename = "odpt:trainType", default)]
    pub train_type: Option<String>,
    #[serde(rename = "odpt:trainNumber", default)]
    pub train_number: Option<String>,
}

impl TimetableObject {
    /// Departure time if present, else arrival time.
    fn time(&self) -> Option<&str> {
        self.departure_time.as_deref().or(self.arrival_time.as_deref())
    }
}

/// A station timetable: one (station, railway, calendar, direction) scope with
/// its ordered train events.
#[derive(Debug, Clone, Deserialize)]
pub struct StationTimetable {
    #[serde(rename = "odpt:railway")]
    pub railway: String,
    #[serde(rename = "odpt:station")]
    pub station: String,
    #[serde(rename = "odpt:calendar", default)]
    pub calendar: Option<String>,
    #[serde(rename = "odpt:railDirection", default)]
    pub rail_direction: Option<String>,
    #[serde(rename = "odpt:stationTimetableObject", default)]
    pub objects: Vec<TimetableObject>,
}

/// The last train reaching a station, with a short descriptive string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastTrain {
    /// Nominal clock time, `HH:MM` (hours 0-3 mean after midnight).
    pub time: String,
    /// Train type and number, e.g. `"Local 2321M"`.
    pub info: String,
}

// ============================================================================
// Time Ordering
// ============================================================================

/// Minutes since the start of the service day. Hours 0-3 count as 24-27 so
/// after-midnight trains sort after the evening ones.
pub fn service_day_minutes(hhmm: &str) -> Option<u32> {
    let (hours, minutes) = parse_hhmm(hhmm)?;
    let adjusted = if hours < 4 { hours + 24 } else { hours };
    Some(adjusted * 60 + minutes)
}

/// Latest scheduled event among a timetable's train objects.
///
/// Events without any clock time are ignored. Returns `None` when nothing is
/// scheduled.
pub fn last_train(objects: &[TimetableObject]) -> Option<LastTrain> {
    let last = objects
        .iter()
        .filter_map(|obj| obj.time().and_then(service_day_minutes).map(|m| (m, obj)))
        .max_by_key(|(m, _)| *m)
        .map(|(_, obj)| obj)?;

    let time = last.time().unwrap_or_default().to_string();
    let train_type = last
        .train_type
        .as_deref()
        .and_then(|t| t.rsplit('.').next())
        .unwrap_or_default();
    let train_number = last.train_number.as_deref().unwrap_or_default();
    let info = format!("{} {}", train_type, train_number).trim().to_string();

    Some(LastTrain { time, info })
}

// ============================================================================
// Name Mapping
// ============================================================================

/// One (romanized name, railway, operator) triple a native station name maps to.
///
/// A station served by two lines carries one triple per line.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StationMapping {
    pub romaji: String,
    pub railway: String,
    pub operator: String,
}

/// Hand-maintained native-name to romanized-identifier table.
///
/// Immutable configuration, loaded once and passed into the cross-referencing
/// stage. Stations absent from the table are simply skipped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct NameMapping {
    entries: HashMap<String, Vec<StationMapping>>,
}

impl NameMapping {
    pub fn new(entries: HashMap<String, Vec<StationMapping>>) -> Self {
        Self { entries }
    }

    pub fn get(&self, native_name: &str) -> Option<&[StationMapping]> {
        self.entries.get(native_name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Timetable Set
// ============================================================================

/// One operator's timetables grouped by `"{Railway}.{Station}"` leaf key.
pub struct TimetableSet {
    operator: String,
    by_key: HashMap<String, Vec<StationTimetable>>,
}

impl TimetableSet {
    /// Group an operator's raw timetable records.
    ///
    /// Keys are built from the final segments of the dot-delimited identifier
    /// paths; records whose paths have fewer than three segments are malformed
    /// and skipped.
    pub fn from_entries(operator: &str, entries: Vec<StationTimetable>) -> Self {
        let mut by_key: HashMap<String, Vec<StationTimetable>> = HashMap::new();
        let mut skipped = 0usize;

        for entry in entries {
            match leaf_key(&entry.railway, &entry.station) {
                Some(key) => by_key.entry(key).or_default().push(entry),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            log::warn!(
                "{}: skipped {} timetable records with malformed identifiers",
                operator,
                skipped
            );
        }

        Self {
            operator: operator.to_string(),
            by_key,
        }
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// All timetables (calendars and directions) for one railway/station leaf key.
    pub fn get(&self, railway_leaf: &str, station_leaf: &str) -> Option<&[StationTimetable]> {
        self.by_key
            .get(&format!("{}.{}", railway_leaf, station_leaf))
            .map(Vec::as_slice)
    }
}

/// `"{Railway}.{Station}"` from the final segments of two identifier paths,
/// requiring at least three segments each (`odpt.Station:Operator.Railway.Name`).
fn leaf_key(railway_path: &str, station_path: &str) -> Option<String> {
    let railway: Vec<&str> = railway_path.split('.').collect();
    let station: Vec<&str> = station_path.split('.').collect();

    if railway.len() < 3 || station.len() < 3 {
        return None;
    }

    Some(format!("{}.{}", railway.last()?, station.last()?))
}

/// The latest train across every timetable a station maps to.
///
/// Looks up the native name, gathers the matching timetables from whichever
/// operator set owns each mapping, and keeps the latest event over all
/// calendars and directions. `None` when the station has no mapping entry or
/// no schedule at all.
pub fn last_train_for_station(
    native_name: &str,
    mapping: &NameMapping,
    sets: &[TimetableSet],
) -> Option<LastTrain> {
    let mappings = mapping.get(native_name)?;

    let mut latest: Option<LastTrain> = None;

    for entry in mappings {
        let timetables = sets
            .iter()
            .find(|set| set.operator == entry.operator)
            .and_then(|set| set.get(&entry.railway, &entry.romaji));

        let Some(timetables) = timetables else {
            continue;
        };

        for timetable in timetables {
            let Some(candidate) = last_train(&timetable.objects) else {
                continue;
            };

            let is_later = match &latest {
                None => true,
                Some(current) => {
                    service_day_minutes(&candidate.time) > service_day_minutes(&current.time)
                }
            };
            if is_later {
                latest = Some(candidate);
            }
        }
    }

    latest
}

// ============================================================================
// Unit Tests
// ============================================================================
