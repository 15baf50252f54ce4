//! Command-line driver for the station filtering pipeline.
//!
//! Each subcommand runs one offline pass over GeoJSON station data and writes
//! the filtered collection back out, so the stages can be chained, inspected
//! and rerun independently.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use sunrise_stations::coast::{CoastlineIndex, RayConfig};
use sunrise_stations::io::{read_coastlines, read_stations, write_stations};
use sunrise_stations::pipeline::{
    annotate_last_trains, filter_near_coast, filter_near_reference, split_open_sea,
    station_sunrises,
};
use sunrise_stations::timetable::{NameMapping, StationTimetable, TimetableSet};
use sunrise_stations::{GeoPoint, BEARING_ESE, TOKYO_STATION};

#[derive(Parser)]
#[command(name = "station-pipeline", version, about = "Filter railway stations facing the sunrise over open sea")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Keep stations within a radius of the reference point (Tokyo Station).
    NearReference {
        /// Input station GeoJSON
        #[arg(long)]
        input: PathBuf,
        /// Output station GeoJSON
        #[arg(long)]
        output: PathBuf,
        /// Reference latitude, degrees
        #[arg(long, default_value_t = TOKYO_STATION.lat)]
        lat: f64,
        /// Reference longitude, degrees
        #[arg(long, default_value_t = TOKYO_STATION.lon)]
        lon: f64,
        /// Radius in kilometres
        #[arg(long, default_value_t = 200.0)]
        radius_km: f64,
    },
    /// Keep stations whose east-southeast ray reaches coastline nearby.
    NearCoast {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Coastline GeoJSON file(s), merged in order
        #[arg(long, required = true)]
        coastline: Vec<PathBuf>,
        /// Ray bearing, degrees clockwise from north
        #[arg(long, default_value_t = BEARING_ESE)]
        bearing: f64,
        /// Ray length in kilometres
        #[arg(long, default_value_t = 10.0)]
        ray_km: f64,
        /// Maximum station-to-coast distance in kilometres
        #[arg(long, default_value_t = 2.0)]
        max_coast_km: f64,
    },
    /// Drop stations with land visible across the water.
    OpenSea {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Where to write the excluded (enclosed-bay) stations
        #[arg(long)]
        excluded_output: Option<PathBuf>,
        #[arg(long, required = true)]
        coastline: Vec<PathBuf>,
        #[arg(long, default_value_t = BEARING_ESE)]
        bearing: f64,
        /// Long-ray length in kilometres
        #[arg(long, default_value_t = 50.0)]
        ray_km: f64,
        /// Opposite-shore gap under which a station counts as enclosed
        #[arg(long, default_value_t = 5.0)]
        nearby_land_km: f64,
    },
    /// Annotate stations with last-train arrival times.
    LastTrains {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Native-name to romanized-identifier mapping JSON
        #[arg(long)]
        mapping: PathBuf,
        /// Timetable source(s), `OPERATOR=path.json`
        #[arg(long, required = true)]
        timetable: Vec<String>,
    },
    /// Print sunrise and wait-until-sunrise for each station.
    SunriseReport {
        #[arg(long)]
        input: PathBuf,
        /// Date for the sunrise computation
        #[arg(long, default_value = "2026-01-01")]
        date: NaiveDate,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::NearReference { input, output, lat, lon, radius_km } => {
            let reference = GeoPoint::new(lat, lon);
            if !reference.is_valid() {
                bail!("invalid reference point ({}, {})", lat, lon);
            }

            let stations = read_stations(&input)?;
            let filtered = filter_near_reference(stations, reference, radius_km);
            write_stations(&filtered, &output)
        }

        Command::NearCoast { input, output, coastline, bearing, ray_km, max_coast_km } => {
            let coast = load_coast_index(&coastline)?;
            let config = RayConfig {
                bearing_deg: bearing,
                coast_ray_km: ray_km,
                max_coast_distance_km: max_coast_km,
                ..RayConfig::default()
            };

            let stations = read_stations(&input)?;
            let filtered = filter_near_coast(stations, &coast, &config);
            write_stations(&filtered, &output)
        }

        Command::OpenSea {
            input,
            output,
            excluded_output,
            coastline,
            bearing,
            ray_km,
            nearby_land_km,
        } => {
            let coast = load_coast_index(&coastline)?;
            let config = RayConfig {
                bearing_deg: bearing,
                open_sea_ray_km: ray_km,
                nearby_land_km,
                ..RayConfig::default()
            };

            let stations = read_stations(&input)?;
            let split = split_open_sea(stations, &coast, &config);

            write_stations(&split.open_sea, &output)?;
            if let Some(path) = excluded_output {
                write_stations(&split.enclosed, &path)?;
            }
            Ok(())
        }

        Command::LastTrains { input, output, mapping, timetable } => {
            let raw = std::fs::read_to_string(&mapping)
                .with_context(|| format!("failed to read name mapping {}", mapping.display()))?;
            let mapping: NameMapping = serde_json::from_str(&raw)
                .with_context(|| "failed to parse name mapping JSON")?;
            log::info!("name mapping covers {} stations", mapping.len());

            let sets = load_timetable_sets(&timetable)?;

            let mut stations = read_stations(&input)?;
            annotate_last_trains(&mut stations, &mapping, &sets);
            write_stations(&stations, &output)
        }

        Command::SunriseReport { input, date } => {
            let stations = read_stations(&input)?;

            for entry in station_sunrises(&stations, date) {
                match (&entry.last_train_arrival, &entry.wait) {
                    (Some(arrival), Some(wait)) => println!(
                        "{} ({}): sunrise {}, last train {}, wait {}",
                        entry.name, entry.line, entry.sunrise, arrival, wait
                    ),
                    _ => println!("{} ({}): sunrise {}", entry.name, entry.line, entry.sunrise),
                }
            }
            Ok(())
        }
    }
}

fn load_coast_index(paths: &[PathBuf]) -> Result<CoastlineIndex> {
    let polylines = read_coastlines(paths)?;
    let index = CoastlineIndex::from_polylines(&polylines);
    if index.is_empty() {
        bail!("coastline input contains no usable polyline segments");
    }
    Ok(index)
}

/// Parse `OPERATOR=path.json` timetable source arguments and load each file as
/// an array of station timetable records.
fn load_timetable_sets(sources: &[String]) -> Result<Vec<TimetableSet>> {
    let mut by_operator: HashMap<String, Vec<StationTimetable>> = HashMap::new();

    for source in sources {
        let Some((operator, path)) = source.split_once('=') else {
            bail!("timetable source {:?} is not of the form OPERATOR=path.json", source);
        };

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read timetable file {}", path))?;
        let entries: Vec<StationTimetable> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse timetable JSON in {}", path))?;

        log::info!("{}: loaded {} timetable records from {}", operator, entries.len(), path);
        by_operator.entry(operator.to_string()).or_default().extend(entries);
    }

    Ok(by_operator
        .into_iter()
        .map(|(operator, entries)| TimetableSet::from_entries(&operator, entries))
        .collect())
}
