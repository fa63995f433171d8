#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line host for the Gridsly map editor.

mod config;
mod map_transfer;
mod script;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gridsly_core::{Coord, GridRect, GridSnapshot, LayerId, MapSlot, Point};
use gridsly_rendering::{
    grid_bounds, Presentation, RenderingBackend, Scene, SceneInput, Viewport,
};
use gridsly_rendering_image::PngExporter;
use gridsly_session::EditorSession;
use gridsly_system_persistence::DirectoryStore;
use gridsly_world::query;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{config::Config, script::Script};

#[derive(Parser, Debug)]
#[command(name = "gridsly", version, about = "Headless Gridsly map editor")]
struct Cli {
    /// Configuration file; `gridsly.toml` in the working directory is used when present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the stored slots.
    #[arg(long)]
    store: Option<PathBuf>,

    /// Map slot to operate on (0, 1 or 2).
    #[arg(long, value_parser = parse_slot)]
    slot: Option<MapSlot>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replays a scripted editing session.
    Run {
        /// TOML file listing the steps.
        script: PathBuf,
    },
    /// Rasterises the slot to a PNG file.
    Export {
        /// Output file; defaults to the configured export file.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Zoom applied to the cell size.
        #[arg(long)]
        zoom: Option<f32>,
    },
    /// Prints layer sizes and the stored hash.
    Show,
    /// Prints a share string for the slot.
    Share,
    /// Replaces the slot with the grid carried by a share string.
    Import {
        /// String produced by `share`.
        value: String,
    },
    /// Replaces the slot with the default grid.
    Reset,
}

fn parse_slot(value: &str) -> Result<MapSlot, String> {
    let index: u8 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a slot number"))?;
    MapSlot::try_from(index).map_err(|error| error.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(store) = cli.store {
        config.store_dir = store;
    }
    if let Some(slot) = cli.slot {
        config.slot = slot;
    }

    let mut session = EditorSession::open(DirectoryStore::new(&config.store_dir), config.slot);
    let _ = session.set_zoom(config.zoom);

    match cli.command {
        Command::Run { script } => {
            let contents = fs::read_to_string(&script)
                .with_context(|| format!("failed to read script {}", script.display()))?;
            let summary = Script::parse(&contents)
                .with_context(|| format!("invalid script {}", script.display()))?
                .run(&mut session, config.cell_size)?;
            persist(&mut session)?;
            info!(
                steps = summary.steps,
                rejected_zooms = summary.rejected_zooms,
                slot = session.active_slot().get(),
                "script finished"
            );
        }
        Command::Export { out, zoom } => {
            let path = out.unwrap_or_else(|| config.export_file.clone());
            export(&session, &config, zoom.unwrap_or(session.zoom()), &path)?;
            println!("{}", path.display());
        }
        Command::Show => show(&session),
        Command::Share => {
            let encoded = map_transfer::encode(&query::snapshot(session.world()))
                .context("failed to encode share string")?;
            println!("{encoded}");
        }
        Command::Import { value } => {
            let snapshot = map_transfer::decode(&value).context("invalid share string")?;
            session.replace_grid(snapshot);
            persist(&mut session)?;
            info!(slot = session.active_slot().get(), "imported shared grid");
        }
        Command::Reset => {
            session.replace_grid(GridSnapshot::default());
            persist(&mut session)?;
            info!(slot = session.active_slot().get(), "slot reset to default grid");
        }
    }
    Ok(())
}

fn persist(session: &mut EditorSession<DirectoryStore>) -> Result<()> {
    let _ = session
        .flush()
        .with_context(|| format!("failed to store {}", session.active_slot()))?;
    Ok(())
}

fn export(
    session: &EditorSession<DirectoryStore>,
    config: &Config,
    zoom: f32,
    path: &Path,
) -> Result<()> {
    let layers: Vec<(LayerId, &[Point])> = query::layers(session.world())
        .map(|(layer, contents)| (layer, contents.points()))
        .collect();
    let bounds = grid_bounds(layers.iter().copied())
        .unwrap_or_else(|| GridRect::from_corners(Coord::new(0, 0), Coord::new(0, 0)));
    let viewport = Viewport::framing(bounds, config.cell_size, zoom)?;
    let input = SceneInput {
        layers,
        selected: session.selected_creature(),
        label_origin: session.label_origin(),
    };
    let scene = Scene::compose(&input, &viewport, viewport.canvas_size(bounds));
    PngExporter::new(path)
        .present(&Presentation::new(scene))
        .context("export failed")
}

fn show(session: &EditorSession<DirectoryStore>) {
    println!("{}", session.active_slot());
    for (layer, contents) in query::layers(session.world()) {
        println!("{:<9} {}", layer.name(), contents.len());
    }
    println!("sha256    {}", session.stored_hash().unwrap_or("-"));
}
