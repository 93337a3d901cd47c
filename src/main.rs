//! Smile Meter CLI
//!
//! Usage:
//!   smile-meter --replay frames.jsonl        # Replay a recorded session
//!   smile-meter --interactive                # Type frames on stdin
//!   tracker | smile-meter --json             # Score frames piped on stdin
//!   smile-meter --serve                      # HTTP + WebSocket API server
//!   smile-meter --replay f.jsonl --json      # JSON output

use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use colored::Colorize;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use smile_meter::core::{
    run_server, CameraLifecycle, CelebrationMode, DetectionLoop, FeedbackSink, LineDetector, SmileEngine,
};
use smile_meter::types::{CelebrationEvent, FrameOutcome, ReasonCode, ScoreUpdate, Tier};
use smile_meter::{SmileConfig, SmileError, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "smile-meter",
    version = VERSION,
    about = "Smile Meter - score smiles from facial expression signals",
    long_about = "Smile Meter turns per-frame expression probabilities and mouth\n\
                  landmarks into a smoothed 60-100 smile score with feedback tiers.\n\n\
                  Frame format (one per line):\n  \
                  {\"expressions\":{...},\"mouth\":[{\"x\":..,\"y\":..},...]}\n  \
                  happy=0.9 sad=0.05 angry=0.0\n  \
                  null          (no face this frame)\n\n\
                  Modes:\n  \
                  --replay FILE  Replay a recording\n  \
                  --interactive  Read frames from stdin with prompts\n  \
                  (none)         Read frames from stdin as a pipe\n  \
                  --serve        HTTP API server mode"
)]
struct Args {
    /// Recording to replay (one frame per line)
    #[arg(short, long)]
    replay: Option<String>,

    /// Interactive mode - prompt text, then frames from stdin (default: bare pipe)
    #[arg(short, long)]
    interactive: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (overrides SMILE_ADDR)
    #[arg(long)]
    addr: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Show fusion / curvature breakdown
    #[arg(long)]
    verbose: bool,

    /// Celebrate on every frame at 100 instead of once per entry
    #[arg(long)]
    level_trigger: bool,

    /// Delay after a failed frame (milliseconds)
    #[arg(long)]
    retry_delay_ms: Option<u64>,

    /// Pause between frames (milliseconds)
    #[arg(long)]
    frame_interval_ms: Option<u64>,

    /// Display width in pixels; 480 or less selects the mobile detector size
    #[arg(long)]
    display_width: Option<u32>,
}

impl Args {
    fn config(&self) -> SmileConfig {
        let mut config = SmileConfig::from_env();
        if let Some(addr) = &self.addr {
            config.addr = addr.clone();
        }
        if self.level_trigger {
            config.celebration = CelebrationMode::Level;
        }
        if let Some(ms) = self.retry_delay_ms {
            config.retry_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.frame_interval_ms {
            config.frame_interval = Duration::from_millis(ms);
        }
        if let Some(width) = self.display_width {
            config.display_width = width;
        }
        config
    }
}

/// Where frames come from
#[derive(Debug, Clone, PartialEq, Eq)]
enum InputMode {
    Serve,
    Replay(String),
    /// Stdin with the banner and prompt text
    Interactive,
    /// Stdin as a bare pipe
    Pipe,
}

impl Args {
    fn mode(&self) -> InputMode {
        if self.serve {
            InputMode::Serve
        } else if let Some(path) = &self.replay {
            InputMode::Replay(path.clone())
        } else if self.interactive {
            InputMode::Interactive
        } else {
            InputMode::Pipe
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = args.config();
    config.validate()?;

    match args.mode() {
        InputMode::Serve => run_serve(&config).await,
        InputMode::Replay(path) => {
            let mut camera = CameraLifecycle::new();
            camera.begin_init()?;
            let file = match tokio::fs::File::open(&path).await {
                Ok(f) => f,
                Err(e) => {
                    camera.fail(e.to_string())?;
                    bail!(
                        "cannot open recording {}: {}",
                        path,
                        camera.last_error().unwrap_or("unknown error")
                    );
                }
            };
            camera.stream_started()?;
            let detector = LineDetector::with_camera(BufReader::new(file), camera);
            run_frames(detector, &args, &config).await
        }
        InputMode::Interactive => {
            print_header(args.no_color);
            run_frames(LineDetector::new(BufReader::new(tokio::io::stdin())), &args, &config).await
        }
        InputMode::Pipe => {
            run_frames(LineDetector::new(BufReader::new(tokio::io::stdin())), &args, &config).await
        }
    }
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("smile_meter=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    }
}

/// Drive the detection loop from a line source
async fn run_frames<R>(detector: LineDetector<R>, args: &Args, config: &SmileConfig) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin + Send,
{
    let sink = TerminalSink {
        json: args.json,
        no_color: args.no_color,
        verbose: args.verbose,
    };
    let engine = SmileEngine::new(config.celebration);
    let detection_loop = DetectionLoop::new(detector, sink, engine, config);

    let handle = detection_loop.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.stop();
        }
    });

    let summary = detection_loop.run().await;
    if !args.json {
        println!(
            "\nSession ended. Frames: {} | failures: {} | camera restarts: {} | final score: {}",
            summary.frames,
            summary.failures,
            summary.camera_restarts,
            summary.final_score.round()
        );
    }
    Ok(())
}

/// Prints updates to the terminal
struct TerminalSink {
    json: bool,
    no_color: bool,
    verbose: bool,
}

impl FeedbackSink for TerminalSink {
    fn on_score(&mut self, update: &ScoreUpdate) {
        if self.json {
            match serde_json::to_string(update) {
                Ok(line) => println!("{}", line),
                Err(e) => eprintln!("serialize failed: {}", e),
            }
        } else if self.verbose {
            print_verbose(update, self.no_color);
        } else if self.no_color {
            println!("{}", update.to_parseable_string());
        } else {
            println!("{}", update.to_terminal_string());
        }
    }

    fn on_no_face(&mut self, score: f64) {
        if self.json {
            match serde_json::to_string(&FrameOutcome::no_face(score)) {
                Ok(line) => println!("{}", line),
                Err(e) => eprintln!("serialize failed: {}", e),
            }
        } else if self.no_color {
            println!("no face detected | score={}", score.round());
        } else {
            println!("{} score={}", "  no face detected".bright_black(), score.round());
        }
    }

    fn on_celebration(&mut self, event: &CelebrationEvent) {
        if self.json {
            let line = serde_json::json!({ "celebration": event });
            println!("{}", line);
            return;
        }
        let banner = format!(
            "  🎉 PERFECT {}! celebration {:.1}s, prize banner {:.1}s",
            event.score,
            event.effect_ms as f64 / 1000.0,
            event.prize_banner_ms as f64 / 1000.0
        );
        if self.no_color {
            println!("{}", banner);
        } else {
            println!("{}", banner.magenta().bold());
        }
    }

    fn on_detection_error(&mut self, error: &SmileError) {
        let reason = ReasonCode::S001_DETECTION_FAILED;
        if self.json {
            let line = serde_json::json!({ "reason": reason.code(), "error": error.to_string() });
            println!("{}", line);
            return;
        }
        let msg = format!("  {} ({}): {}", reason.description(), reason.code(), error);
        if self.no_color {
            eprintln!("{}", msg);
        } else {
            eprintln!("{}", msg.red());
        }
    }
}

/// Print header
fn print_header(no_color: bool) {
    let title = format!("Smile Meter v{}", VERSION);
    if no_color {
        println!("========================================");
        println!("  {}", title);
        println!("========================================");
    } else {
        println!("{}", "╔════════════════════════════════════════╗".bold());
        println!("{}", format!("║  {:<38}║", title).bold());
        println!("{}", "╚════════════════════════════════════════╝".bold());
    }
    println!("One frame per line: JSON detection, 'happy=0.9 sad=0.1', or 'null'.");
    println!("Type 'quit' to exit. Goal: a perfect 100.");
    println!();
}

/// Print verbose breakdown
fn print_verbose(update: &ScoreUpdate, no_color: bool) {
    let color = if no_color { "" } else { update.tier.color_code() };
    let reset = if no_color { "" } else { Tier::color_reset() };

    println!("{}┌──────────────────────────────────────┐{}", color, reset);
    println!(
        "{}│ score = {} ({:.2}) {}{}",
        color, update.rounded, update.score, update.tier.emoji(), reset
    );
    println!("{}├──────────────────────────────────────┤{}", color, reset);
    println!(
        "{}│ fusion:  +{:.0} happy  -{:.0} sad/angry  → {:.0}{}",
        color, update.fusion.happy_bonus, update.fusion.negative_penalty, update.fusion.value, reset
    );
    match update.curvature.curvature() {
        Some(c) => println!("{}│ mouth:   curvature {:+.3} ({}){}", color, c, update.curvature.label(), reset),
        None => println!(
            "{}│ mouth:   {} ({}){}",
            color,
            update.curvature.label(),
            update.curvature.reason().description(),
            reset
        ),
    }
    println!("{}│ instant: {:.0}  α={:.2}{}", color, update.instant, update.alpha, reset);
    println!("{}├──────────────────────────────────────┤{}", color, reset);
    println!("{}│ {} | {}{}", color, update.tier.key(), update.tier.message(), reset);
    println!("{}│ Reason: {}{}", color, update.reason.code(), reset);
    println!("{}└──────────────────────────────────────┘{}", color, reset);
}

/// Run HTTP API server
async fn run_serve(config: &SmileConfig) -> anyhow::Result<()> {
    info!(addr = %config.addr, celebration = ?config.celebration, "starting API server");
    run_server(config)
        .await
        .with_context(|| format!("server on {} failed", config.addr))
}
