#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, Result, bail};
use clap::Parser;
use mapty::cli::{AddCmd, Cli, Cmd, CommonArgs};
use mapty::{
    Coordinates, SqliteKv, Workout, WorkoutError, WorkoutId, WorkoutKind, WorkoutStore, utils,
};

#[macro_use]
extern crate mapty;

fn main() -> Result<()> {
    let cli = Cli::parse();
    utils::init_logging(cli.verbose, cli.quiet);

    let kv = SqliteKv::open(&cli.db)
        .with_context(|| format!("opening workout store: {}", cli.db.display()))?;
    let mut store = WorkoutStore::new(kv);

    match store.reload() {
        Ok(n) => dlog!("mode=startup db={} loaded={n}", cli.db.display()),
        Err(WorkoutError::CorruptState(reason)) => {
            tracing::warn!(
                backup = mapty::store::CORRUPT_BACKUP_KEY,
                "saved workouts could not be read ({reason}); a copy was kept, continuing with an empty list"
            );
        }
        Err(e) => return Err(e).context("loading saved workouts"),
    }

    match cli.cmd {
        Cmd::Add(add) => {
            let (kind, common, extra) = match add {
                AddCmd::Running { common, cadence } => (WorkoutKind::Running, common, cadence),
                AddCmd::Cycling { common, elevation } => (WorkoutKind::Cycling, common, elevation),
            };
            let CommonArgs {
                lat,
                lng,
                distance,
                duration,
            } = common;

            let workout = match store.create(
                kind,
                Coordinates::new(lat, lng),
                distance,
                duration,
                extra,
            ) {
                Ok(w) => w,
                Err(e @ WorkoutError::Validation { .. }) => {
                    bail!("Inputs have to be positive numbers: {e}")
                }
                Err(e) => return Err(e).context("saving workout"),
            };

            println!("{}\t{workout}", workout.id());
        }
        Cmd::List { details } => {
            let workouts = store.list();
            if workouts.is_empty() {
                tracing::info!("no workouts yet");
            }
            for w in &workouts {
                print_workout(w, details);
            }
        }
        Cmd::Show { id } => {
            let id = WorkoutId(id);
            let w = match store.find_by_id(id) {
                Ok(w) => w,
                Err(WorkoutError::NotFound { .. }) => bail!("No workout with id {id}."),
                Err(e) => return Err(e.into()),
            };
            print_workout(w, true);
        }
        Cmd::Reset => {
            store.reset().context("clearing saved workouts")?;
        }
    }

    Ok(())
}

fn print_workout(w: &Workout, details: bool) {
    if details {
        let created = w.created_at().to_rfc3339();
        let duration = utils::format_minutes(w.duration_min());
        println!(
            "{}\t{created}\t{}\t{}\t{duration}\t{w}",
            w.id(),
            w.kind(),
            w.coordinates()
        );
    } else {
        println!("{w}");
    }
}
