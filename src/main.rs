use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use humanpace::config::{self as cfg, Config};
use humanpace::executor::{DryRunSurface, InputSurface, Replayer};
use humanpace::humanize::{
    KeyStroke, KeystrokeSequencer, PathGenerator, Point, ScrollAction, ScrollSequencer, Timing,
    net_distance,
};
use humanpace::throttle::{ActivityScheduler, QuotaBook, resolve_timezone};
use humanpace::utils::clock::{Clock, SystemClock};

/// humanpace CLI
#[derive(Debug, Parser)]
#[command(
    name = humanpace::PKG_NAME,
    version = humanpace::PKG_VERSION,
    about = "Generate human-like input sequences and inspect quotas and working hours"
)]
struct Args {
    /// Path to the JSON configuration file (defaults are used when omitted)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Seed the generators for reproducible output
    #[arg(long = "seed", global = true)]
    seed: Option<u64>,

    /// Play path/type/scroll output back against the dry-run surface in real time
    #[arg(long = "replay", global = true)]
    replay: bool,

    /// Replay against the real mouse and keyboard instead of the dry-run surface
    #[cfg(feature = "native-input")]
    #[arg(long = "native", global = true, requires = "replay")]
    native: bool,

    /// Set log level (e.g., trace, debug, info, warn, error). Overrides RUST_LOG.
    #[arg(long = "log-level")]
    log_level: Option<String>,

    /// Print the JSON Schema for the configuration and exit
    #[arg(long = "print-schema")]
    print_schema: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Pointer path between two points
    Path {
        #[arg(long, default_value_t = 0.0)]
        from_x: f64,
        #[arg(long, default_value_t = 0.0)]
        from_y: f64,
        #[arg(long, allow_hyphen_values = true)]
        to_x: f64,
        #[arg(long, allow_hyphen_values = true)]
        to_y: f64,
    },
    /// Keystrokes for a piece of text
    Type { text: String },
    /// Scroll sequence for a signed distance in pixels
    Scroll {
        #[arg(allow_hyphen_values = true)]
        distance: i64,
    },
    /// Sample the delay presets and the backoff curve
    Delays {
        #[arg(long, default_value_t = 5)]
        count: u32,
    },
    /// Working-hours status in the configured timezone
    Schedule,
    /// Configured quotas for every resource class
    Quota,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.log_level.as_deref() {
        Some(level) => {
            humanpace::init_tracing_with(humanpace::parse_level(level).unwrap_or(tracing::Level::INFO))
        }
        None => humanpace::init_tracing(),
    }
    debug!(version = humanpace::PKG_VERSION, seed = ?args.seed, "Starting humanpace");

    if args.print_schema {
        let schema = cfg::generate_schema();
        let json = serde_json::to_string_pretty(&schema)?;
        println!("{json}");
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => cfg::load_from_path_async(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    debug!(target: "humanpace", "Configuration loaded successfully");

    let Some(command) = &args.command else {
        warn!("No subcommand given; see --help");
        return Ok(());
    };

    let output = run(command, &config, &args).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(command: &Command, config: &Config, args: &Args) -> anyhow::Result<Value> {
    let seed = args.seed;
    match command {
        Command::Path {
            from_x,
            from_y,
            to_x,
            to_y,
        } => {
            let mut generator = PathGenerator::with_rng(config.mouse.clone(), rng(seed, 1));
            let path = generator.generate_path(Point::new(*from_x, *from_y), Point::new(*to_x, *to_y));
            let duration = generator.movement_duration(&path);
            if args.replay {
                replay(args, Playback::Path(path, duration)).await?;
                return Ok(json!({ "replayed": "path" }));
            }
            Ok(json!({ "points": path, "duration_ms": millis(duration) }))
        }
        Command::Type { text } => {
            let mut sequencer = KeystrokeSequencer::with_rng(config.typing.clone(), rng(seed, 2));
            let strokes = sequencer.generate_keystrokes(text);
            let duration: Duration = strokes.iter().map(|s| s.delay).sum();
            if args.replay {
                replay(args, Playback::Keys(strokes)).await?;
                return Ok(json!({ "replayed": "keystrokes" }));
            }
            Ok(json!({ "strokes": strokes, "duration_ms": millis(duration) }))
        }
        Command::Scroll { distance } => {
            let mut sequencer = ScrollSequencer::with_rng(config.scrolling.clone(), rng(seed, 3));
            let actions = sequencer.generate_scroll_sequence(*distance);
            let net = net_distance(&actions);
            if args.replay {
                replay(args, Playback::Scroll(actions)).await?;
                return Ok(json!({ "replayed": "scroll" }));
            }
            Ok(json!({ "actions": actions, "net": net }))
        }
        Command::Delays { count } => {
            let mut timing = Timing::with_rng(config.timing.clone(), rng(seed, 4));
            let (mut action, mut think, mut page_load, mut backoff) =
                (Vec::new(), Vec::new(), Vec::new(), Vec::new());
            for attempt in 0..*count {
                action.push(millis(timing.action_delay()));
                think.push(millis(timing.think_delay()));
                page_load.push(millis(timing.page_load_delay()));
                backoff.push(millis(timing.exponential_backoff(
                    attempt,
                    Duration::from_secs(1),
                    Duration::from_secs(60),
                )));
            }
            Ok(json!({
                "action_ms": action,
                "think_ms": think,
                "page_load_ms": page_load,
                "backoff_ms": backoff,
            }))
        }
        Command::Schedule => {
            let clock: Arc<dyn Clock> = Arc::new(SystemClock);
            let mut scheduler =
                ActivityScheduler::with_rng(config.schedule.clone(), clock.clone(), rng(seed, 5));
            let now = clock.now().with_timezone(&scheduler.timezone());
            let (window_start, window_end) = scheduler.daily_activity_window();
            Ok(json!({
                "timezone": scheduler.timezone().name(),
                "now": now.to_rfc3339(),
                "within_working_hours": scheduler.is_within_working_hours(),
                "next_working_time": scheduler.next_working_time(now).to_rfc3339(),
                "until_end_of_day_ms": millis(scheduler.time_until_end_of_day()),
                "activity_window": [window_start.to_rfc3339(), window_end.to_rfc3339()],
                "stats": scheduler.stats(),
            }))
        }
        Command::Quota => {
            let book = QuotaBook::new(
                &config.rate_limits,
                resolve_timezone(&config.schedule.timezone),
                Arc::new(SystemClock),
            );
            Ok(json!({ "trackers": book.trackers() }))
        }
    }
}

/// A generated sequence waiting to be replayed.
enum Playback {
    Path(Vec<Point>, Duration),
    Keys(Vec<KeyStroke>),
    Scroll(Vec<ScrollAction>),
}

/// Replay against the selected surface, cancelling on Ctrl+C.
async fn replay(args: &Args, playback: Playback) -> anyhow::Result<()> {
    let mut surface = surface(args)?;
    let token = CancellationToken::new();
    let watcher = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl+C, cancelling replay");
                token.cancel();
            }
        })
    };

    let mut replayer = Replayer::new(&mut *surface, token);
    let result = match &playback {
        Playback::Path(path, total) => replayer.replay_path(path, *total).await,
        Playback::Keys(strokes) => replayer.replay_keystrokes(strokes).await,
        Playback::Scroll(actions) => replayer.replay_scroll(actions).await,
    };
    watcher.abort();
    match result {
        Err(err) if err.is_cancelled() => {
            warn!("Replay cancelled");
            Ok(())
        }
        other => other.context("replay failed"),
    }
}

#[cfg(feature = "native-input")]
fn surface(args: &Args) -> anyhow::Result<Box<dyn InputSurface>> {
    if args.native {
        let native = humanpace::executor::NativeSurface::new()
            .map_err(|e| anyhow::anyhow!(e))
            .context("Failed to initialize native input")?;
        return Ok(Box::new(native));
    }
    Ok(Box::new(DryRunSurface::new()))
}

#[cfg(not(feature = "native-input"))]
fn surface(_args: &Args) -> anyhow::Result<Box<dyn InputSurface>> {
    Ok(Box::new(DryRunSurface::new()))
}

fn rng(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
        None => StdRng::from_os_rng(),
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
