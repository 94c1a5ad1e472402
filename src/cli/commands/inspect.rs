//! Inspect command - Print the layout and table sizes of a track

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use super::load_track;
use crate::{
    cli::output::{format_number, print_kv, print_section, print_subsection},
    racetrack::{CellType, CrashPolicy},
};

#[derive(Parser, Debug)]
#[command(about = "Inspect a track file or a saved track")]
pub struct InspectArgs {
    /// Text grid or saved MessagePack track
    pub track: PathBuf,

    /// Collision handling when building from a text grid (stop or start)
    #[arg(long, default_value_t = CrashPolicy::StopBeforeWall)]
    pub crash_policy: CrashPolicy,

    /// Omit the grid drawing
    #[arg(long, default_value_t = false)]
    pub no_grid: bool,
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let track = load_track(&args.track, args.crash_policy)?;
    let grid = track.grid();

    print_section(&format!("Track '{}'", track.name()));
    if !args.no_grid {
        print!("{grid}");
    }

    print_subsection("Layout");
    print_kv("Dimensions", &format!("{} x {}", grid.width(), grid.height()));
    for cell in [
        CellType::Open,
        CellType::Wall,
        CellType::Start,
        CellType::Finish,
    ] {
        let count = grid.positions_of(cell).count();
        print_kv(&format!("{cell} cells"), &format_number(count));
    }
    print_kv("Crash policy", &track.crash_policy().to_string());

    print_subsection("Tables");
    print_kv("States", &format_number(track.states().len()));
    print_kv("Action edges", &format_number(track.actions().len()));

    let history = track.history();
    if !history.is_empty() {
        print_subsection("Training history");
        print_kv("Epochs", &format_number(history.len()));
        if let Some(last) = history.samples().last() {
            print_kv("Last sum|V|", &format!("{:.4}", last.aggregate_value));
        }
        let delta = history.last_delta();
        if delta.is_finite() {
            print_kv("Last delta", &format!("{delta:.6}"));
        }
    }

    if let Err(err) = track.validate() {
        log::warn!("track '{}' cannot be trained: {err}", track.name());
    }
    Ok(())
}
