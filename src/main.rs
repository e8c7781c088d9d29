use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::time::{interval, Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hover_racer::{SimConfig, Simulation};

/// Headless hover-bike arena: runs the fixed-step simulation and prints JSON snapshots.
#[derive(Debug, Parser)]
#[command(name = "hover-racer", version)]
struct Args {
    /// Arena/tuning config (JSON). Built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of ticks to run (0 = until interrupted)
    #[arg(short, long, default_value_t = 600)]
    ticks: u64,

    /// Override the config seed for the avoidance-direction RNG
    #[arg(long)]
    seed: Option<u64>,

    /// Pace ticks at the configured rate instead of running flat out
    #[arg(long)]
    realtime: bool,

    /// Print a snapshot every N ticks (0 = never)
    #[arg(long, default_value_t = 60)]
    snapshot_every: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries snapshot lines only.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hover_racer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let dt = config.physics.dt();
    let tick_hz = config.physics.tick_hz;
    tracing::info!(tick_hz, ticks = args.ticks, realtime = args.realtime, "starting hover-racer");

    let mut sim = Simulation::new(config);
    // Manual handles stay alive for the whole run; nobody drives them headless.
    let _agents = sim.spawn_configured_agents().context("spawning configured agents")?;

    let mut ticker = interval(Duration::from_secs_f32(dt));
    let stdout = std::io::stdout();

    loop {
        if args.realtime {
            ticker.tick().await;
        }

        sim.tick(dt);

        let mut out = stdout.lock();
        for event in sim.drain_events() {
            serde_json::to_writer(&mut out, &event)?;
            writeln!(out)?;
        }
        if args.snapshot_every > 0 && sim.tick % args.snapshot_every == 0 {
            serde_json::to_writer(&mut out, &sim.snapshot())?;
            writeln!(out)?;
        }
        drop(out);

        if args.ticks > 0 && sim.tick >= args.ticks {
            break;
        }
    }

    tracing::info!(ticks = sim.tick, alive = sim.registry.alive_count(), "run finished");
    Ok(())
}
