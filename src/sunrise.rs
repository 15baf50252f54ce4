//! # Sunrise and Wait-Time Computation
//!
//! Approximate local sunrise clock times from latitude, longitude and calendar
//! date, plus the arithmetic for "how long after the last train until the sun
//! comes up".
//!
//! The solar position uses the standard closed-form approximation: solar
//! declination from the day of year, hour angle with the -0.833 degree
//! atmospheric-refraction/solar-disk correction, the two-harmonic equation of
//! time, and a longitude correction against the 135 degrees east standard
//! meridian (Japan Standard Time). Accurate to a minute or two, which is all a
//! sunrise-photography planner needs.
//!
//! Degenerate latitudes propagate as values, never errors: [`Sunrise::PolarNight`]
//! (the sun never rises that day) and [`Sunrise::PolarDay`] (it never sets).
//! Downstream wait-time computation treats both as "not computable".

use chrono::{Datelike, NaiveDate};
use std::fmt;

/// Standard meridian for Japan Standard Time, degrees east.
const STANDARD_MERIDIAN_DEG: f64 = 135.0;

/// Sun altitude at sunrise, accounting for atmospheric refraction and the
/// apparent solar disk radius.
const SUNRISE_ALTITUDE_DEG: f64 = -0.833;

// ============================================================================
// Types
// ============================================================================

/// Result of a sunrise computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sunrise {
    /// The sun rises; `minutes` is the day-relative offset from local midnight.
    ///
    /// Kept pre-normalization: it may be slightly negative or exceed 1440 for
    /// longitudes far from the standard meridian. [`Sunrise::clock`] normalizes
    /// for display; wait-time arithmetic wants the raw value's normalized
    /// minutes-of-day.
    Rises { minutes: f64 },
    /// The sun never rises on this date at this latitude.
    PolarNight,
    /// The sun never sets on this date at this latitude.
    PolarDay,
}

impl Sunrise {
    /// Normalized clock time as (hours 0-23, minutes 0-59), or `None` for the
    /// polar sentinels.
    ///
    /// The hour is truncated and the minute rounded, carrying `:60` into the
    /// next hour.
    pub fn hours_minutes(&self) -> Option<(u32, u32)> {
        let Sunrise::Rises { minutes } = self else {
            return None;
        };

        let mut hours = (minutes / 60.0).floor() as i64;
        let mut mins = (minutes - hours as f64 * 60.0).round() as i64;
        if mins == 60 {
            hours += 1;
            mins = 0;
        }

        Some((hours.rem_euclid(24) as u32, mins as u32))
    }

    /// Normalized `HH:MM` string, or `None` for the polar sentinels.
    pub fn clock(&self) -> Option<String> {
        self.hours_minutes().map(|(h, m)| format!("{:02}:{:02}", h, m))
    }
}

impl fmt::Display for Sunrise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.clock() {
            Some(clock) => write!(f, "{}", clock),
            None => match self {
                Sunrise::PolarNight => write!(f, "no sunrise"),
                Sunrise::PolarDay => write!(f, "no sunset"),
                Sunrise::Rises { .. } => unreachable!(),
            },
        }
    }
}

/// A non-negative wait duration, always under 24 hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitTime {
    pub hours: u32,
    pub minutes: u32,
}

impl fmt::Display for WaitTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {:02}m", self.hours, self.minutes)
    }
}

// ============================================================================
// Sunrise Computation
// ============================================================================

/// Compute local sunrise for a date and place.
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use sunrise_stations::sunrise;
///
/// let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
/// let s = sunrise(35.681236, 139.767125, date); // Tokyo Station
/// assert_eq!(s.clock().as_deref(), Some("06:51"));
/// ```
pub fn sunrise(lat: f64, lon: f64, date: NaiveDate) -> Sunrise {
    let day_of_year = date.ordinal() as f64;

    // Solar declination, degrees
    let declination = 23.45 * ((360.0 / 365.0) * (day_of_year - 81.0)).to_radians().sin();

    let lat_rad = lat.to_radians();
    let dec_rad = declination.to_radians();

    let cos_hour_angle = (SUNRISE_ALTITUDE_DEG.to_radians().sin() - lat_rad.sin() * dec_rad.sin())
        / (lat_rad.cos() * dec_rad.cos());

    if cos_hour_angle > 1.0 {
        return Sunrise::PolarNight;
    }
    if cos_hour_angle < -1.0 {
        return Sunrise::PolarDay;
    }

    let hour_angle_deg = cos_hour_angle.acos().to_degrees();

    // Equation of time (minutes), two-harmonic approximation
    let b = ((360.0 / 365.0) * (day_of_year - 81.0)).to_radians();
    let equation_of_time = 9.87 * (2.0 * b).sin() - 7.53 * b.cos() - 1.5 * b.sin();

    // Longitude correction against the standard meridian, 4 minutes per degree
    let longitude_correction = (STANDARD_MERIDIAN_DEG - lon) * 4.0;

    let solar_noon = 12.0 * 60.0 + longitude_correction - equation_of_time;
    let minutes = solar_noon - hour_angle_deg * 4.0;

    Sunrise::Rises { minutes }
}

// ============================================================================
// Wait-Time Arithmetic
// ============================================================================

/// Parse an `HH:MM` clock string. Hours are not range-checked: timetable data
/// uses the late-night convention where 24-27 denotes the tail of the previous
/// service day.
pub fn parse_hhmm(s: &str) -> Option<(u32, u32)> {
    let (h, m) = s.split_once(':')?;
    let hours = h.parse().ok()?;
    let minutes: u32 = m.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    Some((hours, minutes))
}

/// Wait from a last-train arrival tonight until sunrise tomorrow morning.
///
/// `None` when the arrival string does not parse or the sunrise is a polar
/// sentinel. The arrival is a nominal clock time; hours 24-27 from the
/// late-night timetable convention are folded back into 0-3 first. If the
/// sunrise's minutes-of-day precede the arrival's, a day boundary sits between
/// them and 24 hours are added before subtracting. The result is always in
/// `[0, 24)` hours.
///
/// # Example
///
/// ```rust
/// use sunrise_stations::{wait_until_sunrise, Sunrise, WaitTime};
///
/// let sunrise = Sunrise::Rises { minutes: 410.0 }; // 06:50
/// let wait = wait_until_sunrise("00:19", &sunrise).unwrap();
/// assert_eq!(wait, WaitTime { hours: 6, minutes: 31 });
/// ```
pub fn wait_until_sunrise(arrival: &str, sunrise: &Sunrise) -> Option<WaitTime> {
    let (sunrise_h, sunrise_m) = sunrise.hours_minutes()?;
    let (arrival_h, arrival_m) = parse_hhmm(arrival)?;

    let arrival_minutes = (arrival_h % 24) * 60 + arrival_m;
    let mut sunrise_minutes = sunrise_h * 60 + sunrise_m;

    if sunrise_minutes < arrival_minutes {
        sunrise_minutes += 24 * 60;
    }

    let wait = sunrise_minutes - arrival_minutes;

    Some(WaitTime {
        hours: wait / 60,
        minutes: wait % 60,
    })
}

// ============================================================================
// Unit Tests
// ============================================================================
