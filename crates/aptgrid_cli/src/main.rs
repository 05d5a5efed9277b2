//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `aptgrid_core` linkage.
//! - Print occupancy stats and the floor grid for a dataset, so a data
//!   file can be checked without a host app.
//!
//! Usage: `aptgrid_cli [DATASET]`. `DATASET` is a file path or URL and
//! defaults to `APTGRID_DATASET` / `apartments_status.json`.

use aptgrid_core::{BoardConfig, BoardService, DatasetLocation, MemorySessionStorage};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("aptgrid_core ping={}", aptgrid_core::ping());
    println!("aptgrid_core version={}", aptgrid_core::core_version());

    let mut config = BoardConfig::from_env();
    if let Some(raw) = std::env::args().nth(1) {
        config.dataset = DatasetLocation::parse(&raw);
    }

    let source = config.dataset.open(config.fetch_timeout);
    let board = match BoardService::start(
        true,
        source.as_ref(),
        MemorySessionStorage::new(),
        config.bot_username.clone(),
    ) {
        Ok(board) => board,
        Err(err) => {
            eprintln!("board start failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    println!("dataset={}", source.describe());
    if let aptgrid_core::LoadOutcome::Unavailable { reason } = board.load_outcome() {
        println!("dataset_status=unavailable reason={reason}");
    }
    let stats = board.stats();
    println!(
        "units total={} occupied={} free={}",
        stats.total, stats.occupied, stats.free
    );

    if let Some(grid) = board.grid() {
        for row in grid.rows.iter().rev() {
            let cells = row
                .cells
                .iter()
                .map(|cell| if cell.occupied { '#' } else { '.' })
                .collect::<String>();
            println!("{:>3} {cells}", row.floor.label());
        }
    }

    ExitCode::SUCCESS
}
