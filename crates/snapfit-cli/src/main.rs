//! snapfit CLI - headless assembly playback
//!
//! Loads a JSON scene description, runs assembly or camera operations
//! against it without a renderer and prints where things ended up.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use snapfit::camera::CurveOptions;
use snapfit::config::GrooveDetection;
use snapfit::scene::SceneDescription;
use snapfit::{
    AssembleOptions, ConfigStore, DisassembleOptions, Easing, ManualStudio,
};

#[derive(Parser)]
#[command(name = "snapfit")]
#[command(about = "Headless assembly playback for product manuals", long_about = None)]
struct Cli {
    /// JSON scene description
    #[arg(short, long, global = true, default_value = "scene.json")]
    scene: PathBuf,

    /// Directory of assembly configs (<key>.json or <key>.toml)
    #[arg(short, long, global = true)]
    configs: Option<PathBuf>,

    /// Frame step in milliseconds
    #[arg(long, global = true, default_value_t = 16)]
    frame_ms: u64,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the scene hierarchy as JSON
    Hierarchy,
    /// Resolve where a part would go without moving it
    Probe {
        /// Moving part
        plug: String,
        /// Receiving part
        socket: String,
        /// Assembly config key
        #[arg(short = 'k', long)]
        config: Option<String>,
    },
    /// Animate a part into its socket
    Assemble {
        /// Moving part
        plug: String,
        /// Receiving part
        socket: String,
        /// Assembly config key
        #[arg(short = 'k', long)]
        config: Option<String>,
        /// Duration in milliseconds
        #[arg(short, long)]
        duration: Option<u64>,
        /// Easing name, e.g. power2.inOut or easeOutCubic
        #[arg(short, long)]
        easing: Option<String>,
        /// Focus the camera on the socket while the part moves
        #[arg(long)]
        focus: bool,
        /// Take the part back out afterwards
        #[arg(long)]
        roundtrip: bool,
    },
    /// Move the camera onto a node
    Focus {
        /// Target node
        node: String,
        /// Approach along a curved path
        #[arg(long, conflicts_with = "frame")]
        curved: bool,
        /// Single framing move instead of align + approach
        #[arg(long)]
        frame: bool,
    },
    /// Focus several nodes in order with pauses between them
    Sequence {
        /// Target nodes in order
        #[arg(required = true)]
        nodes: Vec<String>,
    },
    /// Count the groove highlight overlays a node would get
    Highlight {
        /// Node to highlight
        node: String,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_scene(path: &Path) -> Result<snapfit::scene::SceneGraph> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scene {}", path.display()))?;
    let description = SceneDescription::from_json(&json)?;
    Ok(description.build()?)
}

/// Load the config for `key` up front. Playback is driven without an I/O
/// reactor, so file reads must finish before it starts; later lookups hit
/// the cache.
async fn preload(store: &ConfigStore, key: Option<&str>) -> Result<()> {
    if let Some(key) = key {
        match store.load(key).await? {
            Some(_) => tracing::info!("using assembly config {key}"),
            None => tracing::warn!("no assembly config named {key}"),
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let scene = load_scene(&cli.scene)?;
    let store = match &cli.configs {
        Some(dir) => ConfigStore::from_directory(dir),
        None => ConfigStore::empty(),
    };
    let frame = Duration::from_millis(cli.frame_ms.max(1));

    match cli.command {
        Commands::Hierarchy => {
            let outline = scene
                .hierarchy(scene.root())
                .context("scene has no root")?;
            println!("{}", outline.to_json_pretty()?);
        }
        Commands::Probe {
            plug,
            socket,
            config,
        } => {
            preload(&store, config.as_deref()).await?;
            let studio = ManualStudio::new(scene, store);
            let probe = studio.assembly().resolve(&plug, &socket, config.as_deref());
            match studio.play(frame, probe)?? {
                Some(attempt) => {
                    println!("{plug} -> {socket}");
                    println!("  Strategy: {}", attempt.strategy());
                    match attempt.target() {
                        Some(t) => println!("  Target: ({:.4}, {:.4}, {:.4})", t.x, t.y, t.z),
                        None => println!("  Target: unresolved"),
                    }
                    println!("  Plug candidates: {}", attempt.plug_candidates.len());
                    println!("  Hole candidates: {}", attempt.hole_candidates.len());
                }
                None => anyhow::bail!("{plug} or {socket} is not in the scene"),
            }
        }
        Commands::Assemble {
            plug,
            socket,
            config,
            duration,
            easing,
            focus,
            roundtrip,
        } => {
            preload(&store, config.as_deref()).await?;
            let easing = easing.map(|name| name.parse::<Easing>()).transpose()?;
            let duration = duration.map(Duration::from_millis);
            let studio = ManualStudio::new(scene, store);
            let options = AssembleOptions {
                config_key: config,
                duration,
                easing,
                ..AssembleOptions::default()
            };

            if focus {
                let (part, camera) =
                    studio.play(frame, studio.assemble_with_focus(&plug, &socket, options))??;
                println!("Assemble: {part:?}");
                println!("Camera: {camera:?}");
            } else {
                let part = studio.play(frame, studio.assemble(&plug, &socket, options))??;
                println!("Assemble: {part:?}");
            }
            print_position(&studio, &plug);

            if roundtrip {
                let back = DisassembleOptions {
                    duration,
                    easing,
                    ..DisassembleOptions::default()
                };
                let outcome = studio.play(frame, studio.disassemble(&plug, back))??;
                println!("Disassemble: {outcome:?}");
                print_position(&studio, &plug);
            }
            println!("Elapsed: {:?}", studio.scheduler().now());
        }
        Commands::Focus {
            node,
            curved,
            frame: framing,
        } => {
            let studio = ManualStudio::new(scene, store);
            let director = studio.director();
            let outcome = if curved {
                studio.play(frame, director.run_curved_focus(&node, CurveOptions::default()))??
            } else if framing {
                studio.play(frame, director.frame_node(&node))??
            } else {
                studio.play(frame, studio.run_cinematic_focus(&node))??
            };
            println!("Focus: {outcome:?}");
            print_camera(&studio);
        }
        Commands::Sequence { nodes } => {
            let studio = ManualStudio::new(scene, store);
            let names: Vec<&str> = nodes.iter().map(String::as_str).collect();
            let report = studio.play(frame, studio.run_disassembly_sequence(&names))??;
            for (i, step) in report.steps.iter().enumerate() {
                println!(
                    "  {}: {} {:?} ({:?} .. {:?})",
                    i + 1,
                    step.node,
                    step.outcome,
                    step.started_at,
                    step.finished_at
                );
            }
            print_camera(&studio);
        }
        Commands::Highlight { node } => {
            let studio = ManualStudio::new(scene, store);
            let count = studio
                .assembly()
                .highlight_groove(&node, &GrooveDetection::default())?;
            println!("{node}: {count} highlight overlay(s)");
            studio.assembly().clear_highlights();
        }
    }

    Ok(())
}

fn print_position(studio: &ManualStudio, name: &str) {
    let scene = studio.scene();
    let scene = scene.borrow();
    if let Some(p) = scene.find_by_name(name).and_then(|id| scene.local_position(id)) {
        println!("  {name} at ({:.4}, {:.4}, {:.4})", p.x, p.y, p.z);
    }
}

fn print_camera(studio: &ManualStudio) {
    let camera = studio.camera();
    let rig = camera.borrow();
    println!(
        "  Camera at ({:.4}, {:.4}, {:.4}) looking at ({:.4}, {:.4}, {:.4})",
        rig.position.x, rig.position.y, rig.position.z, rig.target.x, rig.target.y, rig.target.z
    );
}
