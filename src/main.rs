//! beatgrid CLI: offline rendering, live playback and pattern inspection.
//!
//! Usage:
//!   beatgrid render --bars 4 --bpm 124 --out loop.wav
//!   beatgrid play --bpm 128 --seconds 10
//!   beatgrid show --pattern groove.json
//!   beatgrid export --out groove.json

use anyhow::{Context, Result};
use bg_ir::{Modifier, Pattern, PatternTree, Track};
use bg_master::{Controller, EngineConfig};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[cfg(feature = "alloc_check")]
#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

/// Four-track step sequencer with built-in drum voices.
#[derive(Parser, Debug)]
#[command(name = "beatgrid")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// Seed for probability draws and noise voices
    #[arg(long, default_value_t = EngineConfig::default().seed)]
    seed: u64,

    #[arg(long, default_value_t = 48_000)]
    sample_rate: u32,

    /// JSON pattern to load instead of the default groove
    #[arg(short, long, value_name = "FILE")]
    pattern: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render bars of the pattern to a 16-bit stereo WAV file
    Render {
        #[arg(long, default_value_t = 4)]
        bars: u32,
        #[arg(long, default_value_t = 120.0)]
        bpm: f64,
        #[arg(short, long, value_name = "FILE")]
        out: PathBuf,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Play the pattern on the default audio device
    Play {
        #[arg(long, default_value_t = 120.0)]
        bpm: f64,
        #[arg(long, default_value_t = 8.0)]
        seconds: f64,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Print the pattern grid
    Show {
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Write the pattern as JSON
    Export {
        #[arg(short, long, value_name = "FILE")]
        out: PathBuf,
        #[command(flatten)]
        engine: EngineArgs,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Render { bars, bpm, out, engine } => {
            let ctrl = controller(&engine)?;
            render(&ctrl, bars, bpm, &out)
        }
        Commands::Play { bpm, seconds, engine } => {
            let mut ctrl = controller(&engine)?;
            play(&mut ctrl, bpm, seconds)
        }
        Commands::Show { engine } => {
            let ctrl = controller(&engine)?;
            print!("{}", grid(&ctrl.snapshot()));
            Ok(())
        }
        Commands::Export { out, engine } => {
            let ctrl = controller(&engine)?;
            let json = serde_json::to_string_pretty(&ctrl.save_pattern())?;
            fs::write(&out, json).with_context(|| format!("failed to write {}", out.display()))?;
            println!("Wrote {}", out.display());
            Ok(())
        }
    }
}

fn controller(args: &EngineArgs) -> Result<Controller> {
    let config = EngineConfig { sample_rate: args.sample_rate, seed: args.seed, ..EngineConfig::default() };
    let ctrl = Controller::new(config);
    if let Some(path) = &args.pattern {
        let tree = load_tree(path)?;
        ctrl.load_pattern(&tree).with_context(|| format!("invalid pattern in {}", path.display()))?;
        log::info!("loaded pattern from {}", path.display());
    }
    Ok(ctrl)
}

fn load_tree(path: &Path) -> Result<PatternTree> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn render(ctrl: &Controller, bars: u32, bpm: f64, out: &Path) -> Result<()> {
    println!("Rendering {} bars at {} BPM, {} Hz...", bars, bpm, ctrl.config().sample_rate);
    let wav = ctrl.render_to_wav(bars, bpm).context("render failed")?;
    fs::write(out, &wav).with_context(|| format!("failed to write {}", out.display()))?;
    println!("Wrote {} bytes to {}", wav.len(), out.display());
    Ok(())
}

fn play(ctrl: &mut Controller, bpm: f64, seconds: f64) -> Result<()> {
    ctrl.set_bpm(bpm);
    ctrl.play().context("failed to start audio")?;
    println!("Playing at {} BPM...", ctrl.bpm());

    let until = Instant::now() + Duration::from_secs_f64(seconds.max(0.0));
    while Instant::now() < until {
        if let Some(step) = ctrl.current_step() {
            print!("\rStep: {:2}", step + 1);
            let _ = std::io::stdout().flush();
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    ctrl.stop();
    ctrl.close_audio()?;
    println!("\rDone.     ");
    Ok(())
}

fn cell(track: &Track, index: usize) -> char {
    let step = &track.steps[index];
    if !step.active {
        return '.';
    }
    match step.modifier {
        Modifier::None => 'x',
        Modifier::Ratchet(_) => 'r',
        Modifier::Glide => 'g',
        Modifier::SkipCycle => 's',
        Modifier::OnlyFirstCycle => '1',
    }
}

/// Render the pattern as one text row per track, beats separated by spaces.
fn grid(pattern: &Pattern) -> String {
    let mut out = String::new();
    for track in &pattern.tracks {
        out.push_str(&format!("{:<6}", track.name()));
        for i in 0..track.steps.len() {
            if i % 4 == 0 {
                out.push(' ');
            }
            out.push(cell(track, i));
        }
        out.push('\n');
    }
    out
}
