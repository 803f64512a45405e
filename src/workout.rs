use crate::error::{Result, WorkoutError};
use crate::types::{Coordinates, Extra, WorkoutId, WorkoutKind};
use chrono::{DateTime, Datelike, FixedOffset};
use std::fmt;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Kind-specific part of a workout: the extra input plus the metric derived
/// from distance and duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkoutDetails {
    Running {
        cadence_spm: f64,
        pace_min_per_km: f64,
    },
    Cycling {
        elevation_gain_m: f64,
        speed_km_per_h: f64,
    },
}

/// A recorded workout. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    id: WorkoutId,
    created_at: DateTime<FixedOffset>,
    coordinates: Coordinates,
    distance_km: f64,
    duration_min: f64,
    details: WorkoutDetails,
    description: String,
}

impl Workout {
    /// Build a workout and compute its derived fields.
    ///
    /// Range checks belong to the caller (see `WorkoutStore::create`); this only
    /// refuses inputs for which the derived metric is undefined.
    pub fn new(
        id: WorkoutId,
        created_at: DateTime<FixedOffset>,
        coordinates: Coordinates,
        distance_km: f64,
        duration_min: f64,
        extra: Extra,
    ) -> Result<Self> {
        if !coordinates.is_finite() {
            return Err(WorkoutError::InvalidMetric("coordinates"));
        }

        let details = match extra {
            Extra::CadenceSpm(cadence_spm) => {
                if !cadence_spm.is_finite() {
                    return Err(WorkoutError::InvalidMetric("cadence"));
                }
                WorkoutDetails::Running {
                    cadence_spm,
                    pace_min_per_km: calc_pace(distance_km, duration_min)?,
                }
            }
            Extra::ElevationGainM(elevation_gain_m) => {
                if !elevation_gain_m.is_finite() {
                    return Err(WorkoutError::InvalidMetric("elevation gain"));
                }
                WorkoutDetails::Cycling {
                    elevation_gain_m,
                    speed_km_per_h: calc_speed(distance_km, duration_min)?,
                }
            }
        };

        Ok(Self {
            id,
            created_at,
            coordinates,
            distance_km,
            duration_min,
            details,
            description: describe(extra.kind(), created_at),
        })
    }

    #[must_use]
    pub const fn id(&self) -> WorkoutId {
        self.id
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<FixedOffset> {
        self.created_at
    }

    #[must_use]
    pub const fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    #[must_use]
    pub const fn distance_km(&self) -> f64 {
        self.distance_km
    }

    #[must_use]
    pub const fn duration_min(&self) -> f64 {
        self.duration_min
    }

    #[must_use]
    pub const fn details(&self) -> WorkoutDetails {
        self.details
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub const fn kind(&self) -> WorkoutKind {
        match self.details {
            WorkoutDetails::Running { .. } => WorkoutKind::Running,
            WorkoutDetails::Cycling { .. } => WorkoutKind::Cycling,
        }
    }

    #[must_use]
    pub const fn extra(&self) -> Extra {
        match self.details {
            WorkoutDetails::Running { cadence_spm, .. } => Extra::CadenceSpm(cadence_spm),
            WorkoutDetails::Cycling {
                elevation_gain_m, ..
            } => Extra::ElevationGainM(elevation_gain_m),
        }
    }

    #[must_use]
    pub const fn pace_min_per_km(&self) -> Option<f64> {
        match self.details {
            WorkoutDetails::Running {
                pace_min_per_km, ..
            } => Some(pace_min_per_km),
            WorkoutDetails::Cycling { .. } => None,
        }
    }

    #[must_use]
    pub const fn speed_km_per_h(&self) -> Option<f64> {
        match self.details {
            WorkoutDetails::Cycling { speed_km_per_h, .. } => Some(speed_km_per_h),
            WorkoutDetails::Running { .. } => None,
        }
    }
}

/// One tab-separated list line: description, distance, duration, metric, extra.
impl fmt::Display for Workout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{} km\t{} min\t",
            self.description, self.distance_km, self.duration_min
        )?;
        match self.details {
            WorkoutDetails::Running {
                cadence_spm,
                pace_min_per_km,
            } => write!(f, "{pace_min_per_km:.1} min/km\t{cadence_spm} spm"),
            WorkoutDetails::Cycling {
                elevation_gain_m,
                speed_km_per_h,
            } => write!(f, "{speed_km_per_h:.1} km/h\t{elevation_gain_m} m"),
        }
    }
}

/// Minutes per kilometre.
pub fn calc_pace(distance_km: f64, duration_min: f64) -> Result<f64> {
    finite_ratio(duration_min, distance_km, "pace")
}

/// Kilometres per hour.
pub fn calc_speed(distance_km: f64, duration_min: f64) -> Result<f64> {
    finite_ratio(distance_km, duration_min / 60.0, "speed")
}

fn finite_ratio(num: f64, denom: f64, metric: &'static str) -> Result<f64> {
    if !num.is_finite() || !denom.is_finite() || denom == 0.0 {
        return Err(WorkoutError::InvalidMetric(metric));
    }
    let ratio = num / denom;
    if !ratio.is_finite() {
        return Err(WorkoutError::InvalidMetric(metric));
    }
    Ok(ratio)
}

/// "<Kind> on <Month> <day>", using the calendar date at `created_at`'s own
/// offset (the user's local day when the workout was recorded).
#[must_use]
pub fn describe(kind: WorkoutKind, created_at: DateTime<FixedOffset>) -> String {
    let month = MONTHS[created_at.month0() as usize];
    format!("{} on {month} {}", kind.label(), created_at.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, 0, 0)
            .unwrap()
    }

    #[test]
    fn running_pace() {
        let w = Workout::new(
            WorkoutId(1),
            at(2026, 10, 19, 8),
            Coordinates::new(51.5, -0.1),
            5.0,
            24.0,
            Extra::CadenceSpm(180.0),
        )
        .unwrap();

        assert_eq!(w.kind(), WorkoutKind::Running);
        assert!((w.pace_min_per_km().unwrap() - 4.8).abs() < 1e-9);
        assert_eq!(w.speed_km_per_h(), None);
        assert_eq!(w.description(), "Running on October 19");
    }

    #[test]
    fn cycling_speed() {
        let w = Workout::new(
            WorkoutId(2),
            at(2026, 1, 3, 23),
            Coordinates::new(51.5, -0.1),
            20.0,
            60.0,
            Extra::ElevationGainM(400.0),
        )
        .unwrap();

        assert_eq!(w.kind(), WorkoutKind::Cycling);
        assert!((w.speed_km_per_h().unwrap() - 20.0).abs() < 1e-9);
        assert_eq!(w.description(), "Cycling on January 3");
        assert_eq!(w.extra(), Extra::ElevationGainM(400.0));
    }

    #[test]
    fn zero_distance_has_no_pace() {
        let err = Workout::new(
            WorkoutId(1),
            at(2026, 10, 19, 8),
            Coordinates::new(0.0, 0.0),
            0.0,
            24.0,
            Extra::CadenceSpm(180.0),
        )
        .unwrap_err();
        assert!(matches!(err, WorkoutError::InvalidMetric("pace")));
    }

    #[test]
    fn zero_duration_has_no_speed() {
        assert!(matches!(
            calc_speed(10.0, 0.0),
            Err(WorkoutError::InvalidMetric("speed"))
        ));
        assert!(calc_speed(f64::NAN, 10.0).is_err());
    }

    #[test]
    fn huge_ratio_is_not_a_metric() {
        assert!(matches!(
            calc_speed(1e308, 1e-300),
            Err(WorkoutError::InvalidMetric("speed"))
        ));
        let err = Workout::new(
            WorkoutId(1),
            at(2026, 10, 19, 8),
            Coordinates::new(0.0, 0.0),
            1e308,
            1e-300,
            Extra::ElevationGainM(0.0),
        )
        .unwrap_err();
        assert!(matches!(err, WorkoutError::InvalidMetric("speed")));
    }

    #[test]
    fn description_uses_local_day() {
        // 01:30 at +02:00 is still the previous day in UTC
        let created = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 19, 1, 30, 0)
            .unwrap();
        assert_eq!(describe(WorkoutKind::Running, created), "Running on October 19");

        let west = FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 12, 31, 22, 0, 0)
            .unwrap();
        assert_eq!(describe(WorkoutKind::Cycling, west), "Cycling on December 31");
    }

    #[test]
    fn description_covers_every_month() {
        for (i, name) in MONTHS.iter().enumerate() {
            let month = u32::try_from(i + 1).unwrap();
            let d = describe(WorkoutKind::Cycling, at(2025, month, 28, 12));
            assert_eq!(d, format!("Cycling on {name} 28"));
        }
    }

    #[test]
    fn display_rounds_metric() {
        let w = Workout::new(
            WorkoutId(7),
            at(2026, 5, 1, 8),
            Coordinates::new(0.0, 0.0),
            3.0,
            17.0,
            Extra::CadenceSpm(170.0),
        )
        .unwrap();
        assert_eq!(
            w.to_string(),
            "Running on May 1\t3 km\t17 min\t5.7 min/km\t170 spm"
        );
    }
}
