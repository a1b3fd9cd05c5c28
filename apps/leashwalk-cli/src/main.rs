use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use glam::Vec3;
use leashwalk_assets::AssetLoader;
use leashwalk_common::{ChunkCoord, WalkConfig};
use leashwalk_input::{InputFrame, MoveKey};
use leashwalk_kernel::{
    CompanionState, Leader, MAX_TICK_SECS, Walk, advance, leash_distance, session_seed,
};
use leashwalk_render::{CameraView, DebugTextRenderer, Renderer};
use leashwalk_tools::{EventTally, WalkInspector};
use leashwalk_worldgen::{ChunkGenerator, CityBlockGenerator};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "leashwalk-cli", about = "Headless tooling for the leashwalk simulation")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML configuration file; defaults apply to omitted fields
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Walk a scripted route without a window
    Simulate {
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "600")]
        ticks: u64,
        /// World seed; random when neither this nor the config sets one
        #[arg(short, long)]
        seed: Option<u64>,
        #[arg(short, long, value_enum, default_value = "straight")]
        route: Route,
        /// Simulated frames per second
        #[arg(long, default_value = "60")]
        fps: f32,
        /// Print a summary every N ticks (0 = only at the end)
        #[arg(long, default_value = "0")]
        report_every: u64,
        /// Companion model to load in the background
        #[arg(long)]
        model: Option<PathBuf>,
        /// Print the final summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the generated content of one chunk as JSON
    Chunk {
        #[arg(allow_hyphen_values = true)]
        x: i32,
        #[arg(allow_hyphen_values = true)]
        z: i32,
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Drop the companion far away and watch the leash pull it back
    Leash {
        /// Starting leash distance
        #[arg(short, long, default_value = "10")]
        distance: f32,
        #[arg(short, long, default_value = "600")]
        ticks: u64,
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
    /// Run the same walk twice and compare final state hashes
    Replay {
        #[arg(short, long, default_value = "600")]
        ticks: u64,
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
    /// Walk a route, then print the debug text rendering
    Render {
        #[arg(short, long, default_value = "120")]
        ticks: u64,
        #[arg(short, long)]
        seed: Option<u64>,
        #[arg(short, long, value_enum, default_value = "circle")]
        route: Route,
        /// List every resident chunk
        #[arg(long)]
        chunks: bool,
    },
    /// Print the effective configuration as YAML
    Config,
}

/// Scripted input patterns for headless walks.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Route {
    /// Stand still.
    Idle,
    /// Hold forward.
    Straight,
    /// Hold forward while turning.
    Circle,
    /// Hold forward, strafing left and right in turns.
    Zigzag,
}

impl Route {
    fn input(self, tick: u64) -> InputFrame {
        match self {
            Route::Idle => InputFrame::default(),
            Route::Straight => InputFrame::holding(&[MoveKey::Forward]),
            Route::Circle => InputFrame::holding(&[MoveKey::Forward]).with_look(4.0, 0.0),
            Route::Zigzag => {
                let side = if (tick / 120) % 2 == 0 {
                    MoveKey::Left
                } else {
                    MoveKey::Right
                };
                InputFrame::holding(&[MoveKey::Forward, side])
            }
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<WalkConfig> {
    match path {
        Some(path) => WalkConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(WalkConfig::default()),
    }
}

fn walk_route(walk: &mut Walk, route: Route, ticks: u64, dt: f32, tally: &mut EventTally) {
    for tick in 0..ticks {
        walk.tick(&route.input(tick), dt);
        tally.record(&walk.drain_events());
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("leashwalk-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("stream: {}", leashwalk_stream::crate_info());
            println!("assets: {}", leashwalk_assets::crate_info());
            println!("render: {}", leashwalk_render::crate_info());
            println!("tools: {}", leashwalk_tools::crate_info());
            println!(
                "chunk size: {} (prefetch within {})",
                config.world.chunk_size,
                config.world.edge_threshold()
            );
        }
        Commands::Simulate {
            ticks,
            seed,
            route,
            fps,
            report_every,
            model,
            json,
        } => {
            anyhow::ensure!(
                fps.is_finite() && fps * MAX_TICK_SECS >= 1.0,
                "fps must be at least {}",
                1.0 / MAX_TICK_SECS
            );
            let seed = session_seed(seed, &config);
            let mut walk = Walk::new(config, seed)?;
            if let Some(model) = model {
                walk.attach_proxy_load(AssetLoader::new().load(model));
            }

            tracing::info!(seed, ticks, ?route, "simulating walk");

            let mut tally = EventTally::new();
            tally.record(&walk.drain_events());
            let dt = 1.0 / fps;
            for tick in 0..ticks {
                walk.tick(&route.input(tick), dt);
                tally.record(&walk.drain_events());
                if report_every > 0 && (tick + 1) % report_every == 0 {
                    println!("{}", WalkInspector::summary(&walk));
                }
            }

            let summary = WalkInspector::summary(&walk);
            if json {
                let out = serde_json::json!({ "summary": summary, "events": tally });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{summary}");
                println!("{tally}");
            }
        }
        Commands::Chunk { x, z, seed } => {
            let seed = session_seed(seed, &config);
            let generator = CityBlockGenerator::from_config(&config, seed);
            let content = generator.generate(ChunkCoord::new(x, z));
            println!("{}", serde_json::to_string_pretty(&content)?);
        }
        Commands::Leash {
            distance,
            ticks,
            seed,
        } => {
            let c = &config.companion;
            let leader = Leader {
                position: Vec3::new(0.0, config.player.body_height * 0.5, 0.0),
                movement_direction: None,
            };
            let mut state = CompanionState::new(Vec3::new(distance, c.ground_height, 0.0));
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let dt = 1.0 / 60.0;

            println!("Leash demo: start={distance:.2} max={:.2}", c.max_length);
            let mut converged = None;
            for tick in 1..=ticks {
                let transition = advance(&mut state, &leader, c, dt, &mut rng);
                let d = leash_distance(state.position, leader.position);
                if converged.is_none() && d <= c.max_length {
                    converged = Some(tick);
                }
                if let Some(t) = transition {
                    println!("  tick {tick:>4}: {} -> {} at {d:.3}", t.from, t.to);
                } else if tick % 30 == 0 {
                    println!("  tick {tick:>4}: {} at {d:.3}", state.mode);
                }
            }
            match converged {
                Some(tick) => println!("Within leash after {tick} ticks ({:.2}s)", tick as f32 * dt),
                None => println!("Still beyond leash after {ticks} ticks"),
            }
        }
        Commands::Replay { ticks, seed } => {
            println!("Deterministic replay: seed={seed}, ticks={ticks}");
            let run = |config: WalkConfig| -> anyhow::Result<_> {
                let mut walk = Walk::new(config, seed)?;
                let mut tally = EventTally::new();
                walk_route(&mut walk, Route::Zigzag, ticks, 1.0 / 60.0, &mut tally);
                Ok((walk.state_hash(), tally))
            };
            let (h1, t1) = run(config.clone())?;
            let (h2, _) = run(config)?;
            println!("Run 1: hash={h1:#018x} {t1}");
            println!("Run 2: hash={h2:#018x}");
            println!("Match: {}", if h1 == h2 { "OK" } else { "MISMATCH" });
            anyhow::ensure!(h1 == h2, "replay diverged for seed {seed}");
        }
        Commands::Render {
            ticks,
            seed,
            route,
            chunks,
        } => {
            let seed = session_seed(seed, &config);
            let mut walk = Walk::new(config, seed)?;
            let mut tally = EventTally::new();
            walk_route(&mut walk, route, ticks, 1.0 / 60.0, &mut tally);

            let renderer = DebugTextRenderer { list_chunks: chunks };
            print!("{}", renderer.render(&walk, &CameraView::from_walk(&walk)));
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
        }
    }

    Ok(())
}
