#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the tactics board designer and battle sandbox.

mod board_file;
mod config;
mod session;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tactics_core::{BoardSize, ViewState};
use tactics_rendering::{Color, Presentation, RenderingBackend, Scene, SceneGraph};
use tactics_rendering_macroquad::MacroquadBackend;
use tactics_system_designer::BoardStore;
use tactics_world::{query, Board, World};

use self::{
    board_file::{parse_dimensions, FileBoardStore},
    config::{TacticsConfig, DEFAULT_SEED},
    session::{Mode, Session},
};

/// Design tactics boards and drive soldiers across them.
#[derive(Debug, Parser)]
#[command(name = "tactics", version)]
struct Args {
    /// Board layout to open; saving writes back to the same file.
    #[arg(long, default_value = "data/boards/test1.json")]
    board: PathBuf,
    /// Start from a blank board of the given size instead of reading `--board`.
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_dimensions)]
    new: Option<BoardSize>,
    /// Controllers to enable.
    #[arg(long, value_enum, default_value_t = Mode::All)]
    mode: Mode,
    /// Optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for random soldier placement, overriding the configuration.
    #[arg(long)]
    seed: Option<u64>,
    /// Log the frame rate once per second.
    #[arg(long)]
    show_fps: bool,
    /// Synchronise presentation with the display refresh rate.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    vsync: bool,
}

/// Entry point for the tactics command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => TacticsConfig::load(path)?,
        None => TacticsConfig::default(),
    };
    let seed = args.seed.or(config.seed).unwrap_or(DEFAULT_SEED);

    let mut store = FileBoardStore::new(&args.board);
    let board = match args.new {
        Some(size) => Board::blank(size),
        None => {
            let snapshot = store.load()?;
            Board::from_snapshot(&snapshot)
                .with_context(|| format!("{} holds an invalid board", store.path().display()))?
        }
    };
    let world = World::with_board(board, seed);
    tracing::info!(
        board = %store.path().display(),
        seed,
        mode = ?args.mode,
        surfaces = query::board(&world).surfaces().count(),
        "tactics ready"
    );

    let bindings = config
        .key_bindings()
        .context("invalid key bindings in configuration")?;
    let mut session = Session::new(world, args.mode, bindings, Box::new(store));
    if args.mode.fights() {
        let _ = session.deploy(&config.roster);
    }

    let scene = Scene::new(SceneGraph::from_world(session.world()), ViewState::default());
    let presentation =
        Presentation::new(config.window_title, Color::from_hex(0x1b_1e_23), scene);

    MacroquadBackend::new()
        .with_vsync(args.vsync)
        .with_show_fps(args.show_fps)
        .run(presentation, move |_frame_dt, input, scene| {
            session.handle_frame(input, scene);
        })
}
