//! Export command - Write a track's tables as CSV

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use super::load_track;
use crate::{
    adapters::{CsvExporter, csv_export},
    cli::output::{format_number, print_kv, print_section},
    racetrack::CrashPolicy,
};

#[derive(Parser, Debug)]
#[command(about = "Export state values, q-values and convergence history as CSV")]
pub struct ExportArgs {
    /// Saved MessagePack track (a text grid exports its untrained tables)
    pub track: PathBuf,

    /// Directory for states.csv, actions.csv and history.csv
    #[arg(long, short = 'o')]
    pub out_dir: PathBuf,

    /// Collision handling when building from a text grid (stop or start)
    #[arg(long, default_value_t = CrashPolicy::StopBeforeWall)]
    pub crash_policy: CrashPolicy,
}

pub fn execute(args: ExportArgs) -> Result<()> {
    let track = load_track(&args.track, args.crash_policy)?;
    let summary = CsvExporter::export(&track, &args.out_dir)
        .with_context(|| format!("Failed to export tables to {}", args.out_dir.display()))?;

    print_section(&format!("Exported '{}'", track.name()));
    print_kv(
        csv_export::STATES_FILE,
        &format!("{} rows", format_number(summary.states)),
    );
    print_kv(
        csv_export::ACTIONS_FILE,
        &format!("{} rows", format_number(summary.actions)),
    );
    print_kv(
        csv_export::HISTORY_FILE,
        &format!("{} rows", format_number(summary.history)),
    );
    Ok(())
}
