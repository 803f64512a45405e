//! Plain-data form of the workout list as it sits in storage.
//!
//! Only base fields are written. Description and pace/speed are rebuilt by
//! `Workout::new` on the way back in, so they can never drift from the data.

use crate::error::{Result, WorkoutError};
use crate::store::validate_input;
use crate::types::{Coordinates, Extra, WorkoutId, WorkoutKind};
use crate::workout::Workout;
use chrono::{DateTime, FixedOffset, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashSet;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub id: WorkoutId,
    pub created_at: DateTime<FixedOffset>,
    pub coordinates: Coordinates,
    pub distance_km: f64,
    pub duration_min: f64,
    #[serde(flatten)]
    pub extra: RecordExtra,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecordExtra {
    Running {
        #[serde(rename = "cadenceSpm")]
        cadence_spm: f64,
    },
    Cycling {
        #[serde(rename = "elevationGainM")]
        elevation_gain_m: f64,
    },
}

impl From<Extra> for RecordExtra {
    fn from(extra: Extra) -> Self {
        match extra {
            Extra::CadenceSpm(cadence_spm) => Self::Running { cadence_spm },
            Extra::ElevationGainM(elevation_gain_m) => Self::Cycling { elevation_gain_m },
        }
    }
}

impl From<RecordExtra> for Extra {
    fn from(extra: RecordExtra) -> Self {
        match extra {
            RecordExtra::Running { cadence_spm } => Self::CadenceSpm(cadence_spm),
            RecordExtra::Cycling { elevation_gain_m } => Self::ElevationGainM(elevation_gain_m),
        }
    }
}

impl From<&Workout> for WorkoutRecord {
    fn from(w: &Workout) -> Self {
        Self {
            id: w.id(),
            created_at: w.created_at(),
            coordinates: w.coordinates(),
            distance_km: w.distance_km(),
            duration_min: w.duration_min(),
            extra: w.extra().into(),
        }
    }
}

impl WorkoutRecord {
    /// Rebuild a full workout, keeping `id` and `created_at` as stored.
    pub fn into_workout(self) -> Result<Workout> {
        let extra = Extra::from(self.extra);
        validate_input(
            self.coordinates,
            self.distance_km,
            self.duration_min,
            extra,
        )
        .map_err(|e| WorkoutError::CorruptState(format!("workout {}: {e}", self.id)))?;

        Workout::new(
            self.id,
            self.created_at,
            self.coordinates,
            self.distance_km,
            self.duration_min,
            extra,
        )
        .map_err(|e| WorkoutError::CorruptState(format!("workout {}: {e}", self.id)))
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u32,
    workouts: Vec<WorkoutRecord>,
}

/// Layout written by the browser version: a bare array with `type`, `coords`,
/// `distance`, `duration`, a string id and a UTC `date`, plus cached
/// `description`/`pace`/`speed` that are ignored here. The browser rendered
/// dates in local time, so imported dates take this host's offset.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyRecord {
    id: String,
    date: DateTime<Utc>,
    coords: [f64; 2],
    distance: f64,
    duration: f64,
    #[serde(rename = "type")]
    kind: WorkoutKind,
    cadence: Option<f64>,
    elevation_gain: Option<f64>,
}

impl TryFrom<LegacyRecord> for WorkoutRecord {
    type Error = WorkoutError;

    fn try_from(r: LegacyRecord) -> Result<Self> {
        let id = r
            .id
            .parse::<WorkoutId>()
            .map_err(|_| WorkoutError::CorruptState(format!("legacy id {:?}", r.id)))?;

        let extra = match r.kind {
            WorkoutKind::Running => RecordExtra::Running {
                cadence_spm: r.cadence.ok_or_else(|| {
                    WorkoutError::CorruptState(format!("legacy running workout {id} has no cadence"))
                })?,
            },
            WorkoutKind::Cycling => RecordExtra::Cycling {
                elevation_gain_m: r.elevation_gain.ok_or_else(|| {
                    WorkoutError::CorruptState(format!(
                        "legacy cycling workout {id} has no elevationGain"
                    ))
                })?,
            },
        };

        Ok(Self {
            id,
            created_at: r.date.with_timezone(&Local).fixed_offset(),
            coordinates: r.coords.into(),
            distance_km: r.distance,
            duration_min: r.duration,
            extra,
        })
    }
}

/// Result of decoding a stored document.
#[derive(Debug)]
pub struct Decoded {
    pub workouts: Vec<Workout>,
    /// The document used the unversioned browser layout and should be rewritten.
    pub legacy: bool,
}

pub fn encode(workouts: &[Workout]) -> Result<String> {
    let envelope = Envelope {
        version: SCHEMA_VERSION,
        workouts: workouts.iter().map(WorkoutRecord::from).collect(),
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Parse and validate a stored document. Any bad record rejects the whole
/// document with `CorruptState`.
pub fn decode(raw: &str) -> Result<Decoded> {
    let corrupt = |e: serde_json::Error| WorkoutError::CorruptState(e.to_string());

    let value: JsonValue = serde_json::from_str(raw).map_err(corrupt)?;
    let (records, legacy) = if value.is_array() {
        let legacy: Vec<LegacyRecord> = serde_json::from_value(value).map_err(corrupt)?;
        let records = legacy
            .into_iter()
            .map(WorkoutRecord::try_from)
            .collect::<Result<Vec<_>>>()?;
        (records, true)
    } else if value.is_object() {
        let version = value.get("version").cloned().unwrap_or(JsonValue::Null);
        if version.as_u64() != Some(u64::from(SCHEMA_VERSION)) {
            return Err(WorkoutError::CorruptState(format!(
                "unsupported schema version: {version}"
            )));
        }
        let envelope: Envelope = serde_json::from_value(value).map_err(corrupt)?;
        (envelope.workouts, false)
    } else {
        return Err(WorkoutError::CorruptState(format!(
            "expected an object or array, found {}",
            json_type_name(&value)
        )));
    };

    let mut seen = HashSet::with_capacity(records.len());
    let mut workouts = Vec::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id) {
            return Err(WorkoutError::CorruptState(format!(
                "duplicate workout id {}",
                record.id
            )));
        }
        workouts.push(record.into_workout()?);
    }

    Ok(Decoded { workouts, legacy })
}

const fn json_type_name(v: &JsonValue) -> &'static str {
    match v {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn running() -> Workout {
        Workout::new(
            WorkoutId(1),
            FixedOffset::east_opt(3600)
                .unwrap()
                .with_ymd_and_hms(2026, 10, 19, 8, 0, 0)
                .unwrap(),
            Coordinates::new(51.5, -0.1),
            5.0,
            24.0,
            Extra::CadenceSpm(180.0),
        )
        .unwrap()
    }

    #[test]
    fn encoded_layout() {
        let raw = encode(&[running()]).unwrap();
        let v: JsonValue = serde_json::from_str(&raw).unwrap();

        assert_eq!(v["version"], 1);
        let w = &v["workouts"][0];
        assert_eq!(w["id"], 1);
        assert_eq!(w["kind"], "running");
        assert_eq!(w["createdAt"], "2026-10-19T08:00:00+01:00");
        assert_eq!(w["coordinates"], serde_json::json!([51.5, -0.1]));
        assert_eq!(w["distanceKm"], 5.0);
        assert_eq!(w["durationMin"], 24.0);
        assert_eq!(w["cadenceSpm"], 180.0);
        // derived values are not stored
        assert!(w.get("pace").is_none());
        assert!(w.get("description").is_none());
    }

    #[test]
    fn floats_and_offset_survive_encoding() {
        let w = Workout::new(
            WorkoutId(3),
            FixedOffset::west_opt(7 * 3600)
                .unwrap()
                .with_ymd_and_hms(2026, 10, 18, 23, 15, 7)
                .unwrap(),
            Coordinates::new(-17.968_772_479_422_753, 143.021_908_117_366_2),
            15.773_053_534_253_469,
            24.123_456_789_012_345,
            Extra::CadenceSpm(171.333_333_333_333_34),
        )
        .unwrap();

        let decoded = decode(&encode(std::slice::from_ref(&w)).unwrap()).unwrap();
        let back = &decoded.workouts[0];
        assert_eq!(back, &w);
        assert_eq!(back.distance_km().to_bits(), w.distance_km().to_bits());
        assert_eq!(
            back.pace_min_per_km().unwrap().to_bits(),
            w.pace_min_per_km().unwrap().to_bits()
        );
        assert_eq!(back.created_at().offset(), w.created_at().offset());
        assert_eq!(back.description(), "Running on October 18");
    }

    #[test]
    fn missing_distance_is_corrupt() {
        let raw = r#"{"version":1,"workouts":[{"id":1,"createdAt":"2026-10-19T08:00:00Z",
            "coordinates":[51.5,-0.1],"durationMin":24,"kind":"running","cadenceSpm":180}]}"#;
        assert!(matches!(decode(raw), Err(WorkoutError::CorruptState(_))));
    }

    #[test]
    fn out_of_range_values_are_corrupt() {
        let raw = r#"{"version":1,"workouts":[{"id":1,"createdAt":"2026-10-19T08:00:00Z",
            "coordinates":[51.5,-0.1],"distanceKm":0,"durationMin":24,"kind":"running","cadenceSpm":180}]}"#;
        assert!(matches!(decode(raw), Err(WorkoutError::CorruptState(_))));
    }

    #[test]
    fn unknown_kind_and_version_are_corrupt() {
        let raw = r#"{"version":1,"workouts":[{"id":1,"createdAt":"2026-10-19T08:00:00Z",
            "coordinates":[51.5,-0.1],"distanceKm":3,"durationMin":24,"kind":"swimming"}]}"#;
        assert!(matches!(decode(raw), Err(WorkoutError::CorruptState(_))));

        assert!(matches!(
            decode(r#"{"version":2,"workouts":[]}"#),
            Err(WorkoutError::CorruptState(_))
        ));
        assert!(matches!(decode("42"), Err(WorkoutError::CorruptState(_))));
        assert!(matches!(decode("not json"), Err(WorkoutError::CorruptState(_))));
    }

    #[test]
    fn duplicate_ids_are_corrupt() {
        let w = running();
        let raw = encode(&[w.clone(), w]).unwrap();
        assert!(matches!(decode(&raw), Err(WorkoutError::CorruptState(_))));
    }

    #[test]
    fn legacy_browser_layout() {
        let raw = r#"[
          {"date":"2024-03-05T10:20:30.123Z","id":"9634830123","coords":[51.5,-0.1],
           "distance":5,"duration":24,"type":"running","cadence":180,
           "description":"Running on \n        March 5","pace":4.8},
          {"date":"2024-03-06T10:20:30.123Z","id":"9634830124","coords":[51.5,-0.1],
           "distance":20,"duration":60,"type":"cycling","elevationGain":0,
           "description":"Cycling on \n        March 6","speed":20}
        ]"#;

        let decoded = decode(raw).unwrap();
        assert!(decoded.legacy);
        assert_eq!(decoded.workouts.len(), 2);

        let run = &decoded.workouts[0];
        assert_eq!(run.id(), WorkoutId(9_634_830_123));
        let local_day = run.created_at().format("%B %-d").to_string();
        assert_eq!(run.description(), format!("Running on {local_day}"));
        let recorded = Utc.with_ymd_and_hms(2024, 3, 5, 10, 20, 30).unwrap()
            + chrono::Duration::milliseconds(123);
        assert_eq!(run.created_at(), recorded);
        assert!((run.pace_min_per_km().unwrap() - 4.8).abs() < 1e-9);

        let ride = &decoded.workouts[1];
        assert_eq!(ride.extra(), Extra::ElevationGainM(0.0));
        assert!((ride.speed_km_per_h().unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn legacy_negative_elevation_is_corrupt() {
        let raw = r#"[{"date":"2024-03-06T10:20:30Z","id":"2","coords":[0,0],
            "distance":20,"duration":60,"type":"cycling","elevationGain":-15}]"#;
        assert!(matches!(decode(raw), Err(WorkoutError::CorruptState(_))));
    }

    #[test]
    fn legacy_running_without_cadence_is_corrupt() {
        let raw = r#"[{"date":"2024-03-05T10:20:30Z","id":"1","coords":[0,0],
            "distance":5,"duration":24,"type":"running"}]"#;
        assert!(matches!(decode(raw), Err(WorkoutError::CorruptState(_))));
    }
}
