use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "mapty.sqlite3";

#[derive(Parser, Debug)]
#[command(
    name = "mapty",
    about = "Record geotagged running and cycling workouts"
)]
pub struct Cli {
    /// SQLite file holding saved workouts (created if missing).
    #[arg(long, value_name = "PATH", default_value = DEFAULT_DB_PATH, global = true)]
    pub db: PathBuf,

    /// Increase log verbosity (-v, -vv). Defaults to INFO.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease log verbosity (-q, -qq). Defaults to INFO.
    #[arg(short = 'q', long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Record a new workout at a point on the map.
    #[command(subcommand)]
    Add(AddCmd),

    /// Print saved workouts, oldest first.
    List {
        /// Also print id, creation time and coordinates.
        #[arg(long)]
        details: bool,
    },

    /// Print one workout.
    Show {
        #[arg(value_name = "ID")]
        id: u64,
    },

    /// Delete every saved workout.
    Reset,
}

#[derive(Subcommand, Debug)]
pub enum AddCmd {
    Running {
        #[command(flatten)]
        common: CommonArgs,

        /// Steps per minute.
        #[arg(long)]
        cadence: f64,
    },
    Cycling {
        #[command(flatten)]
        common: CommonArgs,

        /// Elevation gain in metres (0 allowed).
        #[arg(long)]
        elevation: f64,
    },
}

#[derive(Args, Debug)]
pub struct CommonArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    #[arg(long, allow_negative_numbers = true)]
    pub lng: f64,

    /// Distance in km.
    #[arg(long)]
    pub distance: f64,

    /// Duration in minutes.
    #[arg(long)]
    pub duration: f64,
}
