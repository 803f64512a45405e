//! Geotagged running and cycling workouts, kept across sessions in a
//! key-value store.

pub mod cli;
pub mod error;
pub mod record;
pub mod storage;
pub mod store;
pub mod types;
pub mod utils;
pub mod workout;

pub use error::{Result, WorkoutError};
pub use storage::{KeyValueStore, MemoryKv, SqliteKv};
pub use store::WorkoutStore;
pub use types::{Coordinates, Extra, WorkoutId, WorkoutKind};
pub use workout::Workout;
