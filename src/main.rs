//! `gridcover` command line tool.
//!
//! Operates on the cell journal named in the configuration: seeds grid
//! versions, reports their progress, hands out cells, records what the
//! search found and builds optimized next-generation grids.

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gridcover::{
    grid_stats, init_logging, Boundary, CellId, CellLifecycleManager, ErrorExt, FileCellStore,
    GridError, MergeOptimizer, Settings, SplitOutcome,
};
use serde::Serialize;
use tracing::{debug, error};

#[derive(Parser)]
#[command(name = "gridcover")]
#[command(author = "Gridcover Contributors")]
#[command(version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT"),
    ", built ",
    env!("BUILD_TIME"),
    ")"
))]
#[command(about = "Adaptive grid coverage for rate-limited place search", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, env = "GRIDCOVER_CONFIG", global = true)]
    config: Option<PathBuf>,
    /// Boundary document, overrides `boundary_path` from the configuration
    #[arg(short, long, global = true)]
    boundary: Option<PathBuf>,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Output format
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Pretty,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Seed a grid version with level-0 cells (no-op if it exists)
    Init {
        #[arg(value_name = "VERSION")]
        grid_version: String,
    },
    /// Show per-status cell counts of a grid version
    Status {
        #[arg(value_name = "VERSION")]
        grid_version: String,
    },
    /// Claim the next workable cell and print it
    Next {
        #[arg(value_name = "VERSION")]
        grid_version: String,
    },
    /// Record the search results of a claimed cell
    Complete {
        #[arg(value_name = "CELL")]
        cell: CellId,
        #[arg(value_name = "COUNT")]
        results_count: u32,
        /// Ids of the places found in the cell
        #[arg(value_name = "PLACE_ID")]
        place_ids: Vec<String>,
    },
    /// Subdivide a claimed cell whose search hit the result cap
    Split {
        #[arg(value_name = "CELL")]
        cell: CellId,
        /// Results the search returned, kept if the cell cannot be split
        #[arg(long, default_value_t = 0)]
        results_count: u32,
        /// Ids of the places found, kept if the cell cannot be split
        #[arg(value_name = "PLACE_ID")]
        place_ids: Vec<String>,
    },
    /// Build a merged grid version from a completed one
    Optimize { from: String, to: String },
    /// Rewrite the cell journal with one record per cell
    Compact,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", client_message(&err));
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref()).context("loading configuration")?;
    if cli.verbose {
        settings.logging.level = "debug".into();
    } else if cli.quiet {
        settings.logging.level = "error".into();
    }
    if let Some(path) = &cli.boundary {
        settings.boundary_path = Some(path.clone());
    }

    let _logging = init_logging(&settings.logging)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;
    debug!(?settings, "Configuration loaded");

    let result = handle_command(&cli.command, cli.output, &settings);
    if let Err(err) = &result {
        match err.downcast_ref::<GridError>() {
            Some(grid) => error!(code = %grid.status_code(), "{}", grid.log_message()),
            None => error!("{err:#}"),
        }
    }
    result
}

fn handle_command(
    command: &Commands,
    output: OutputFormat,
    settings: &Settings,
) -> Result<()> {
    let store = Arc::new(
        FileCellStore::open(&settings.store.path, settings.store.sync)
            .with_context(|| format!("opening {}", settings.store.path.display()))?,
    );

    match command {
        Commands::Init { grid_version } => {
            let manager = manager(settings, store)?;
            let created = manager.initialize_grid(grid_version)?;
            let value = serde_json::json!({ "version": grid_version, "created": created });
            emit(output, &value, || {
                if created == 0 {
                    format!("grid {grid_version} already initialized")
                } else {
                    format!("grid {grid_version} initialized with {created} cells")
                }
            })
        }
        Commands::Status { grid_version } => {
            let stats = grid_stats(store.as_ref(), grid_version)?;
            emit(output, &stats, || {
                format!(
                    "{grid_version}: {} cells, {} pending, {} processing, {} completed, {} split{}",
                    stats.total(),
                    stats.pending,
                    stats.processing,
                    stats.completed,
                    stats.split,
                    if stats.is_complete() && stats.total() > 0 {
                        " (complete)"
                    } else {
                        ""
                    }
                )
            })
        }
        Commands::Next { grid_version } => {
            let manager = manager(settings, store)?;
            let Some(mut cell) = manager.get_next_cell(grid_version)? else {
                return emit(output, &serde_json::Value::Null, || {
                    format!("no workable cell left in {grid_version}")
                });
            };
            manager.mark_as_processing(&mut cell)?;
            emit(output, &cell, || {
                format!("{} level {} {}", cell.id, cell.level, cell.bbox)
            })
        }
        Commands::Complete {
            cell,
            results_count,
            place_ids,
        } => {
            let manager = manager(settings, store)?;
            let mut cell = manager.open_cell(cell)?;
            manager.complete_cell(&mut cell, *results_count, place_ids.clone())?;
            emit(output, &cell, || {
                format!("{} completed with {} results", cell.id, cell.results_count)
            })
        }
        Commands::Split {
            cell,
            results_count,
            place_ids,
        } => {
            let manager = manager(settings, store)?;
            let mut cell = manager.open_cell(cell)?;
            cell.results_count = *results_count;
            cell.found_place_ids = place_ids.clone();
            let outcome = manager.split_cell(&mut cell)?;
            let children: Vec<CellId> = match &outcome {
                SplitOutcome::Split { children, .. } => children.iter().map(|c| c.id).collect(),
                SplitOutcome::DepthExhausted | SplitOutcome::MinSizeReached => Vec::new(),
            };
            let value = serde_json::json!({
                "cell": cell.id,
                "status": cell.status,
                "children": children,
            });
            emit(output, &value, || match &outcome {
                SplitOutcome::Split { axis, children } => {
                    format!("{} split along {axis} into {} cells", cell.id, children.len())
                }
                SplitOutcome::DepthExhausted => {
                    format!("{} is at the depth limit, completed as is", cell.id)
                }
                SplitOutcome::MinSizeReached => {
                    format!("{} is at the size limit, completed as is", cell.id)
                }
            })
        }
        Commands::Optimize { from, to } => {
            let optimizer = MergeOptimizer::new(store, settings.grid.merge.clone());
            match optimizer.optimize_grid(from, to)? {
                Some(report) => emit(output, &report, || {
                    format!(
                        "{from} -> {to}: {} leaves merged into {} cells ({} saved)",
                        report.original_leaf_cell_count,
                        report.merged_cell_count,
                        report.cells_saved
                    )
                }),
                None => emit(output, &serde_json::Value::Null, || {
                    format!("{from} is not complete yet, try again later")
                }),
            }
        }
        Commands::Compact => {
            store.compact()?;
            emit(output, &serde_json::json!({ "cells": store.len() }), || {
                format!("journal compacted, {} cells", store.len())
            })
        }
    }
}

fn manager(
    settings: &Settings,
    store: Arc<FileCellStore>,
) -> Result<CellLifecycleManager<FileCellStore>> {
    let path = settings
        .boundary_path
        .as_ref()
        .context("no boundary configured, pass --boundary or set boundary_path")?;
    let boundary = Boundary::from_json_file(path)
        .with_context(|| format!("reading boundary {}", path.display()))?;
    Ok(CellLifecycleManager::new(
        store,
        Arc::new(boundary),
        settings.grid.clone(),
    ))
}

fn emit<T: Serialize>(
    format: OutputFormat,
    value: &T,
    pretty: impl FnOnce() -> String,
) -> Result<()> {
    match format {
        OutputFormat::Pretty => println!("{}", pretty()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

/// Engine errors print their operator message; anything else prints its
/// context chain.
fn client_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<GridError>() {
        Some(grid) => grid.client_message(),
        None => format!("{err:#}"),
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<GridError>()
        .map_or(1, |grid| grid.status_code().exit_code())
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
