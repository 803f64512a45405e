use crate::dlog;
use crate::error::{Result, WorkoutError};
use crate::record;
use crate::storage::KeyValueStore;
use crate::types::{Coordinates, Extra, WorkoutId, WorkoutKind};
use crate::workout::Workout;
use chrono::{DateTime, FixedOffset, Local};

/// Storage key holding the whole workout list.
pub const STORAGE_KEY: &str = "workouts";

/// Where an unreadable document is copied before anything can overwrite it.
pub const CORRUPT_BACKUP_KEY: &str = "workouts.corrupt";

/// Source of creation timestamps, carrying the user's UTC offset.
pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Ordered workout list mirrored into a key-value store.
///
/// Every successful `create` is persisted before it returns, so the in-memory
/// list and storage only differ between a failed `reload` and the next write.
pub struct WorkoutStore<S, C = SystemClock> {
    storage: S,
    clock: C,
    workouts: Vec<Workout>,
    /// `None` once every id up to `u64::MAX` has been handed out.
    next_id: Option<u64>,
}

impl<S: KeyValueStore> WorkoutStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> WorkoutStore<S, C> {
    pub fn with_clock(storage: S, clock: C) -> Self {
        Self {
            storage,
            clock,
            workouts: Vec::new(),
            next_id: Some(1),
        }
    }

    /// Validate input, build the workout, append it and persist the list.
    ///
    /// `extra` is the cadence (steps/min) for running and the elevation gain
    /// (m) for cycling.
    pub fn create(
        &mut self,
        kind: WorkoutKind,
        coordinates: Coordinates,
        distance_km: f64,
        duration_min: f64,
        extra: f64,
    ) -> Result<Workout> {
        let extra = match kind {
            WorkoutKind::Running => Extra::CadenceSpm(extra),
            WorkoutKind::Cycling => Extra::ElevationGainM(extra),
        };
        validate_input(coordinates, distance_km, duration_min, extra)?;

        let id = WorkoutId(self.next_id.ok_or(WorkoutError::IdsExhausted)?);
        let workout = Workout::new(
            id,
            self.clock.now(),
            coordinates,
            distance_km,
            duration_min,
            extra,
        )?;

        self.workouts.push(workout.clone());
        if let Err(e) = self.persist() {
            self.workouts.pop();
            return Err(e);
        }
        self.next_id = id.get().checked_add(1);

        dlog!("created workout id={id} kind={kind} description={:?}", workout.description());
        Ok(workout)
    }

    /// Snapshot of all workouts in creation order.
    #[must_use]
    pub fn list(&self) -> Vec<Workout> {
        self.workouts.clone()
    }

    pub fn find_by_id(&self, id: WorkoutId) -> Result<&Workout> {
        self.workouts
            .iter()
            .find(|w| w.id() == id)
            .ok_or(WorkoutError::NotFound { id })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    /// Write the whole list under `STORAGE_KEY`.
    pub fn persist(&mut self) -> Result<()> {
        let raw = record::encode(&self.workouts)?;
        self.storage.set(STORAGE_KEY, &raw)?;
        dlog!("persisted workouts={} bytes={}", self.workouts.len(), raw.len());
        Ok(())
    }

    /// Replace the in-memory list with what storage holds.
    ///
    /// A missing key leaves the store empty. Unreadable data also leaves it
    /// empty and returns `CorruptState`, after copying the document to
    /// `CORRUPT_BACKUP_KEY` so the next write cannot destroy it.
    /// Returns the number of workouts loaded.
    pub fn reload(&mut self) -> Result<usize> {
        self.workouts.clear();

        let Some(raw) = self.storage.get(STORAGE_KEY)? else {
            tracing::info!(key = STORAGE_KEY, "no saved workouts");
            return Ok(0);
        };

        let decoded = match record::decode(&raw) {
            Ok(d) => d,
            Err(e) => {
                self.storage.set(CORRUPT_BACKUP_KEY, &raw)?;
                tracing::warn!(
                    key = STORAGE_KEY,
                    backup = CORRUPT_BACKUP_KEY,
                    err = %e,
                    "saved workouts are unreadable; starting empty"
                );
                return Err(e);
            }
        };

        self.workouts = decoded.workouts;
        if let Some(max_id) = self.workouts.iter().map(|w| w.id().get()).max() {
            let after_loaded = max_id.checked_add(1);
            self.next_id = self.next_id.zip(after_loaded).map(|(a, b)| a.max(b));
        }

        if decoded.legacy {
            tracing::warn!(
                workouts = self.workouts.len(),
                "upgrading saved workouts from the unversioned layout"
            );
            self.persist()?;
        }

        tracing::info!(workouts = self.workouts.len(), "loaded saved workouts");
        Ok(self.workouts.len())
    }

    /// Drop every workout, in memory and in storage. Ids are not reused.
    pub fn reset(&mut self) -> Result<()> {
        self.storage.remove(STORAGE_KEY)?;
        let removed = self.workouts.len();
        self.workouts.clear();
        tracing::info!(removed, "workouts reset");
        Ok(())
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}

/// Range checks shared by `create` and by reconstruction from storage.
pub fn validate_input(
    coordinates: Coordinates,
    distance_km: f64,
    duration_min: f64,
    extra: Extra,
) -> Result<()> {
    if !coordinates.is_finite() || !coordinates.in_range() {
        return Err(WorkoutError::validation(
            "coordinates",
            format!("{coordinates} is not a valid latitude/longitude"),
        ));
    }
    positive("distance", distance_km)?;
    positive("duration", duration_min)?;

    match extra {
        Extra::CadenceSpm(cadence) => positive("cadence", cadence),
        Extra::ElevationGainM(gain) => {
            if gain.is_finite() && gain >= 0.0 {
                Ok(())
            } else {
                Err(WorkoutError::validation(
                    "elevation gain",
                    format!("must be a finite number >= 0, got {gain}"),
                ))
            }
        }
    }
}

fn positive(field: &'static str, v: f64) -> Result<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(WorkoutError::validation(
            field,
            format!("must be a positive number, got {v}"),
        ))
    }
}
