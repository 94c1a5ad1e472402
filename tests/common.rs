//! Track fixtures shared by the integration tests.

#![allow(dead_code)]

use racetrack::racetrack::{CrashPolicy, Grid, Track};

pub fn track(name: &str, rows: &[&str], policy: CrashPolicy) -> Track {
    let grid = Grid::from_rows(rows).expect("fixture grid parses");
    Track::build(name, grid, policy).expect("fixture track builds")
}

/// Open 3x3 square with the start and finish in opposite corners.
pub fn square() -> Track {
    track("square", &["S..", "...", "..F"], CrashPolicy::StopBeforeWall)
}

/// Single open row walled in above and below.
pub fn corridor() -> Track {
    track(
        "corridor",
        &["#####", "#####", "S...F", "#####", "#####"],
        CrashPolicy::StopBeforeWall,
    )
}

/// Small L-shaped course: start at the bottom left, finish at the top right.
pub fn l_track(policy: CrashPolicy) -> Track {
    track(
        "L",
        &[
            "#####FF", //
            "#.....F", //
            "#..####", //
            "#..#...", //
            "#SS#...",
        ],
        policy,
    )
}
