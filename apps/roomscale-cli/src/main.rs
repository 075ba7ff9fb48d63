use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec3;
use roomscale_common::Transform;
use roomscale_input::{ControlLayout, DeviceFrame, Handedness, ScriptedSource, controls};
use roomscale_interact::{GrabEvent, InteractConfig, RoomSession};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "roomscale-cli", about = "Headless driver for the roomscale interaction runtime")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// List the symbolic controls of every layout
    Layouts,
    /// Print the default interaction config as YAML
    Config,
    /// Run a scripted session: walk, jump, then carry a box
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "200")]
        frames: usize,
        /// Frame duration in milliseconds
        #[arg(long, default_value = "16")]
        frame_ms: u64,
        /// YAML config overriding the defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Emit the final state as JSON
        #[arg(long)]
        json: bool,
    },
}

const XR: &str = "xr-standard";
const WALK_FRAMES: usize = 60;
const JUMP_PRESS: usize = 70;
const GRAB_START: usize = 130;
const GRAB_END: usize = 170;

#[derive(Serialize)]
struct ObjectState {
    name: String,
    position: [f32; 3],
    held_by: Option<String>,
}

#[derive(Serialize)]
struct SessionSummary {
    frames: u64,
    avatar: [f32; 3],
    jumping: bool,
    grabs: usize,
    releases: usize,
    objects: Vec<ObjectState>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("roomscale-cli v{}", env!("CARGO_PKG_VERSION"));
            let layouts: Vec<&str> = ControlLayout::ALL.iter().map(|l| l.mapping_id()).collect();
            println!("layouts: {}", layouts.join(", "));
            let c = InteractConfig::default();
            println!(
                "locomotion: hand={:?} dead_zone={} speed={}/{:?}",
                c.locomotion.hand, c.locomotion.dead_zone, c.locomotion.speed, c.locomotion.timing
            );
            println!(
                "jump: hand={:?} button={} height={} up={}ms down={}ms",
                c.jump.hand,
                c.jump.button,
                c.jump.height,
                c.jump.ascent_millis,
                c.jump.descent_millis
            );
            println!("grab: button={}", c.grab.button);
        }
        Commands::Layouts => {
            for layout in ControlLayout::ALL {
                println!("{layout}");
                for (name, index) in layout.buttons() {
                    println!("  button[{index:>2}] {name}");
                }
                for (name, index) in layout.axes() {
                    println!("  axis[{index:>2}]   {name}");
                }
                for pair in layout.axis_pairs() {
                    println!("  pair      {} = ({}, {})", pair.name, pair.x, pair.y);
                }
            }
        }
        Commands::Config => {
            print!("{}", serde_yaml::to_string(&InteractConfig::default())?);
        }
        Commands::Simulate {
            frames,
            frame_ms,
            config,
            json,
        } => {
            let config = match config {
                Some(path) => {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    serde_yaml::from_str(&text)
                        .with_context(|| format!("parsing {}", path.display()))?
                }
                None => InteractConfig::default(),
            };
            let summary = simulate(config, frames, Duration::from_millis(frame_ms))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "frames={} avatar=({:.3}, {:.3}, {:.3}) jumping={} grabs={} releases={}",
                    summary.frames,
                    summary.avatar[0],
                    summary.avatar[1],
                    summary.avatar[2],
                    summary.jumping,
                    summary.grabs,
                    summary.releases
                );
                for o in &summary.objects {
                    println!(
                        "  {} pos=({:.3}, {:.3}, {:.3}){}",
                        o.name,
                        o.position[0],
                        o.position[1],
                        o.position[2],
                        o.held_by
                            .as_deref()
                            .map(|h| format!(" held by {h}"))
                            .unwrap_or_default()
                    );
                }
            }
        }
    }

    Ok(())
}

/// Left hand: stick pushed forward for the walk, then centred.
fn left_script(frames: usize, layout: ControlLayout) -> anyhow::Result<Vec<DeviceFrame>> {
    let y = layout.axis_index(controls::THUMBSTICK_Y)?;
    Ok((0..frames)
        .map(|f| {
            let push = if f < WALK_FRAMES { -1.0 } else { 0.0 };
            DeviceFrame::default().with_axis(y, push)
        })
        .collect())
}

/// Right hand: full press and release of A to jump, then a squeeze to carry a box.
fn right_script(frames: usize, layout: ControlLayout) -> anyhow::Result<Vec<DeviceFrame>> {
    let a = layout.button_index(controls::BUTTON_A)?;
    let squeeze = layout.button_index(controls::SQUEEZE)?;
    Ok((0..frames)
        .map(|f| {
            let jump = if (JUMP_PRESS..JUMP_PRESS + 2).contains(&f) { 1.0 } else { 0.0 };
            let grip = if (GRAB_START..GRAB_END).contains(&f) { 1.0 } else { 0.0 };
            DeviceFrame::default()
                .with_button(a, jump)
                .with_button(squeeze, grip)
        })
        .collect())
}

fn simulate(
    config: InteractConfig,
    frames: usize,
    dt: Duration,
) -> anyhow::Result<SessionSummary> {
    let layout = ControlLayout::from_mapping(XR)?;
    let mut session = RoomSession::with_room(config)?;
    session.add_controller(ScriptedSource::new(
        XR,
        Handedness::Left,
        left_script(frames, layout)?,
    ))?;
    let right = session.add_controller(ScriptedSource::new(
        XR,
        Handedness::Right,
        right_script(frames, layout)?,
    ))?;

    let target = session
        .scene()
        .find_by_name("box-1")
        .context("room has no box-1")?;
    let reach = session.scene().world_position(target)?;

    let (mut grabs, mut releases) = (0, 0);
    for f in 0..frames {
        // Tracked pose: reach for the box, sweep it sideways while held, stay put after.
        let sweep = f.saturating_sub(GRAB_START).min(GRAB_END - GRAB_START) as f32 * 0.01;
        let world_target = reach + Vec3::new(sweep, 0.0, 0.0);
        let rig = session.scene().world_matrix(session.avatar())?;
        let local = rig.inverse().transform_point3(world_target);
        session.set_controller_pose(right, Transform::from_position(local))?;

        let report = session.tick(dt)?;
        for event in &report.grab_events {
            match event {
                GrabEvent::Acquired { .. } => grabs += 1,
                GrabEvent::Released { .. } => releases += 1,
            }
        }
        if report.frame % 50 == 0 {
            tracing::info!(frame = report.frame, phase = ?report.jump_phase, "progress");
        }
    }

    let scene = session.scene();
    let mut objects = Vec::new();
    for id in session.registry().iter() {
        let p = scene.world_position(id)?;
        objects.push(ObjectState {
            name: scene
                .get(id)
                .and_then(|n| n.name())
                .unwrap_or("unnamed")
                .to_string(),
            position: p.to_array(),
            held_by: session
                .grab()
                .holder_of(id)
                .and_then(|c| scene.get(c))
                .and_then(|n| n.name())
                .map(str::to_string),
        });
    }
    let avatar = scene.world_position(session.avatar())?;

    Ok(SessionSummary {
        frames: session.frame(),
        avatar: avatar.to_array(),
        jumping: session.jump().is_jumping(),
        grabs,
        releases,
        objects,
    })
}
