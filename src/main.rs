//! midigen - compile a JSON song file into a Standard MIDI File.
//!
//! # Usage
//!
//! ```bash
//! midigen song.json                 # writes song.mid next to the input
//! midigen song.json -o out.mid      # explicit output path
//! midigen song.json --tpq 960       # finer resolution
//! RUST_LOG=midigen=debug midigen song.json
//! ```

use anyhow::{bail, Context, Result};
use midigen::{CompilerConfig, SongFile};
use std::fs;
use std::path::PathBuf;

/// Command-line options for the application.
struct CliOptions {
    /// Song file to compile.
    input: PathBuf,
    /// Output path; defaults to the input with a `.mid` extension.
    output: Option<PathBuf>,
    /// Ticks per quarter note override.
    ticks_per_quarter_note: Option<u32>,
}

impl CliOptions {
    /// Parses command-line arguments.
    ///
    /// Supports:
    /// - `<song.json>`: the song file (required)
    /// - `--output <path>` or `-o <path>`: where to write the MIDI file
    /// - `--tpq <n>`: ticks per quarter note
    /// - `--help` or `-h`: Print help and exit
    fn parse() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut input: Option<PathBuf> = None;
        let mut output: Option<PathBuf> = None;
        let mut ticks_per_quarter_note: Option<u32> = None;
        let mut i = 1;

        while i < args.len() {
            match args[i].as_str() {
                "--output" | "-o" => {
                    i += 1;
                    let path = args.get(i).context("--output requires a path argument")?;
                    output = Some(PathBuf::from(path));
                }
                "--tpq" => {
                    i += 1;
                    let value = args.get(i).context("--tpq requires a number")?;
                    let tpq = value
                        .parse()
                        .with_context(|| format!("Invalid --tpq value '{}'", value))?;
                    ticks_per_quarter_note = Some(tpq);
                }
                "--help" | "-h" => {
                    print_help(args.first().map(String::as_str).unwrap_or("midigen"));
                    std::process::exit(0);
                }
                other if other.starts_with('-') => {
                    eprintln!("Unknown option: {}", other);
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
                other => {
                    if input.is_some() {
                        bail!("Only one song file can be compiled at a time");
                    }
                    input = Some(PathBuf::from(other));
                }
            }
            i += 1;
        }

        let Some(input) = input else {
            bail!("No song file given. Use --help for usage information");
        };
        Ok(Self {
            input,
            output,
            ticks_per_quarter_note,
        })
    }

    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension("mid"))
    }
}

fn print_help(program: &str) {
    eprintln!("midigen - compile a JSON song file to MIDI");
    eprintln!();
    eprintln!("Usage: {} <song.json> [OPTIONS]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -o, --output PATH  Write the MIDI file here (default: input with .mid)");
    eprintln!("  --tpq N            Ticks per quarter note (default: 480)");
    eprintln!("  -h, --help         Print this help message");
    eprintln!();
    eprintln!("Set RUST_LOG=midigen=debug to log every resolved chord.");
}

/// Main entry point.
fn main() -> Result<()> {
    let cli = CliOptions::parse()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let json = fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let song_file = SongFile::parse(&json)
        .with_context(|| format!("Failed to parse {}", cli.input.display()))?;

    let mut config = CompilerConfig::default();
    if let Some(tpq) = cli.ticks_per_quarter_note {
        config.ticks_per_quarter_note = tpq;
    }

    let score = song_file.compile(config).context("Failed to compile song")?;

    let output = cli.output_path();
    score
        .save(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!(
        tracks = score.track_count(),
        seconds = score.duration_seconds(),
        "Wrote {}",
        output.display()
    );
    Ok(())
}
