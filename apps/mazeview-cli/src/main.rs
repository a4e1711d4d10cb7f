use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::{Vec2, Vec3};
use mazeview_assets::{SceneConfig, load_collision_map};
use mazeview_common::{CameraState, CellCoord, Color};
use mazeview_input::{FirstPersonController, InputFrame};
use mazeview_kernel::{CollisionMap, FrameLoop, LoopStats};
use mazeview_render::{
    DebugTextRenderer, MinimapView, ModelId, Renderer, SceneLayout, SceneModel, compose_frame,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mazeview-cli", about = "Headless tools for the maze viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene file (YAML). Built-in defaults are used when omitted.
    #[arg(long, global = true)]
    scene: Option<PathBuf>,

    /// Directory that relative asset paths are resolved against
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Print the effective scene configuration as YAML
    Scene,
    /// Dump the collision map with the camera's starting cell
    Map {
        /// Emit JSON instead of ASCII
        #[arg(long)]
        json: bool,
    },
    /// Walk forward through the frame loop without a window
    Walk {
        /// Walking direction in degrees on the ground plane (0 = +X, 90 = +Z).
        /// Defaults to the camera's starting direction.
        #[arg(long, allow_negative_numbers = true)]
        heading: Option<f32>,
        /// Number of ticks to run at the scene's target rate
        #[arg(short, long, default_value = "120")]
        ticks: u64,
        /// Print the last composed frame
        #[arg(long)]
        trace: bool,
    },
}

#[derive(Serialize)]
struct MapReport {
    width: usize,
    height: usize,
    blocked: usize,
    origin: Vec3,
    camera_cell: Option<CellCoord>,
    rows: Vec<String>,
}

/// One string per map row: `#` blocked, `.` free, `@` the marked cell.
fn map_rows(map: &CollisionMap, mark: Option<CellCoord>) -> Vec<String> {
    (0..map.height())
        .map(|y| {
            (0..map.width())
                .map(|x| {
                    if mark == Some(CellCoord::new(x, y)) {
                        '@'
                    } else if map.is_blocked(x, y) {
                        '#'
                    } else {
                        '.'
                    }
                })
                .collect()
        })
        .collect()
}

/// Point the camera along `degrees` on the ground plane, keeping its pitch.
fn face_heading(camera: &mut CameraState, degrees: f32) {
    let dir = camera.target - camera.position;
    let flat = Vec2::new(dir.x, dir.z).length();
    let (sin, cos) = degrees.to_radians().sin_cos();
    let planar = if flat > f32::EPSILON { flat } else { 1.0 };
    camera.target = camera.position + Vec3::new(cos * planar, dir.y, sin * planar);
}

#[derive(Debug)]
struct WalkReport {
    stats: LoopStats,
    start: Vec3,
    end: Vec3,
    cell: Option<CellCoord>,
}

/// Hold "forward" for `ticks` fixed steps of `dt`.
fn walk(
    frame_loop: &mut FrameLoop,
    controller: &mut FirstPersonController,
    ticks: u64,
    dt: f32,
) -> WalkReport {
    let start = frame_loop.camera().position;
    let input = InputFrame {
        movement: Vec2::new(0.0, 1.0),
        look: Vec2::ZERO,
    };
    for _ in 0..ticks {
        frame_loop.tick(|camera| controller.update(camera, &input, dt));
    }
    WalkReport {
        stats: frame_loop.stats(),
        start,
        end: frame_loop.camera().position,
        cell: frame_loop.player_cell(),
    }
}

/// Layout with stand-in model ids in scene order: maze first, then props.
fn headless_layout(config: &SceneConfig) -> SceneLayout {
    SceneLayout {
        clear_color: Color::BLACK,
        maze: SceneModel {
            name: "maze".into(),
            model: ModelId(0),
            placement: config.maze.placement,
            tint: Color::WHITE,
        },
        props: config
            .props
            .iter()
            .zip(1..)
            .map(|(prop, id)| SceneModel {
                name: prop.name.clone(),
                model: ModelId(id),
                placement: prop.placement,
                tint: Color::WHITE,
            })
            .collect(),
    }
}

fn load_map(config: &SceneConfig) -> anyhow::Result<CollisionMap> {
    load_collision_map(&config.maze.map)
        .with_context(|| format!("maze map {} is required", config.maze.map.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    let config = SceneConfig::resolve(cli.scene.as_deref(), cli.base_dir.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("mazeview-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: {}", mazeview_kernel::crate_info());
            println!("input: {}", mazeview_input::crate_info());
            println!("assets: {}", mazeview_assets::crate_info());
            println!("render: {}", mazeview_render::crate_info());
        }
        Commands::Scene => {
            print!("{}", config.to_yaml()?);
        }
        Commands::Map { json } => {
            let map = load_map(&config)?;
            let origin = config.maze.placement.position;
            let camera_cell = map.cell_at(origin, config.camera.planar_position());
            let report = MapReport {
                width: map.width(),
                height: map.height(),
                blocked: map.blocked_count(),
                origin,
                camera_cell,
                rows: map_rows(&map, camera_cell),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "{}x{} cells, {} blocked, origin ({:.2}, {:.2}, {:.2})",
                    report.width,
                    report.height,
                    report.blocked,
                    origin.x,
                    origin.y,
                    origin.z
                );
                for row in &report.rows {
                    println!("{row}");
                }
            }
        }
        Commands::Walk {
            heading,
            ticks,
            trace,
        } => {
            let map = load_map(&config)?;
            let mut camera = config.camera;
            if let Some(degrees) = heading {
                face_heading(&mut camera, degrees);
            }
            let mut frame_loop = FrameLoop::new(
                camera,
                map,
                config.maze.placement.position,
                config.player.radius,
            )?;
            let mut controller =
                FirstPersonController::from_camera(&camera, config.player.controller);
            let dt = 1.0 / config.window.target_fps.max(1) as f32;
            tracing::debug!(ticks, dt, heading = ?heading, "walking");

            let report = walk(&mut frame_loop, &mut controller, ticks, dt);
            println!(
                "ticks={} rollbacks={} start=({:.3}, {:.3}) end=({:.3}, {:.3}) cell={}",
                report.stats.ticks,
                report.stats.rollbacks,
                report.start.x,
                report.start.z,
                report.end.x,
                report.end.z,
                report
                    .cell
                    .map(|c| format!("({}, {})", c.x, c.y))
                    .unwrap_or_else(|| "-".into())
            );

            if trace {
                let minimap = MinimapView {
                    map: frame_loop.map(),
                    player: frame_loop.player_cell(),
                    x: 20,
                    y: 80,
                    cell_size: 4,
                };
                let frame =
                    compose_frame(&headless_layout(&config), frame_loop.camera(), Some(minimap));
                print!("{}", DebugTextRenderer::new().render(&frame));
            }
        }
    }

    Ok(())
}
