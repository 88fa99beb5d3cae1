mod panic_handler;

use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use log::{LevelFilter, info};
use simplelog::{Config, WriteLogger};

use docsync::fixture::DocumentFixture;
use docsync::overlay::{TransformOptions, transform};
use docsync::replay::{ReplayOptions, Step, replay};
use docsync::settings::{self, Settings};
use docsync::temporal::{Cue, select_transcript};
use docsync::types::{BBox, Dimensions};
use docsync::SyncConfig;

#[derive(Parser)]
#[command(name = "docsync", about = "Page overlay, content and transcript sync engine")]
#[command(version)]
struct Cli {
    /// Log at debug level regardless of the configured level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file to use instead of the per-user config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "docsync.log")]
    log_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a view over a fixture document and print the final state
    Replay(ReplayArgs),
    /// Parse cues (JSON) or text markers and print the transcript chunks
    Transcript(TranscriptArgs),
    /// Map one source-space box into display space
    Transform(TransformArgs),
}

#[derive(Args)]
struct ReplayArgs {
    /// Fixture JSON with pages, chunks and optional transcript
    fixture: PathBuf,

    /// Initial URL query, e.g. "page=3&chunk=c12"
    #[arg(long, default_value = "")]
    url: String,

    /// JSON array of steps to run after start-up
    #[arg(long)]
    script: Option<PathBuf>,

    #[arg(long, default_value_t = 1000.0)]
    width: f64,

    #[arg(long, default_value_t = 1000.0)]
    height: f64,
}

#[derive(Args)]
struct TranscriptArgs {
    /// `.json` files are read as a cue array, anything else as marker text
    file: PathBuf,
}

#[derive(Args)]
struct TransformArgs {
    /// Source box as left,bottom,right,top
    #[arg(long)]
    bbox: String,

    /// Source page size as WIDTHxHEIGHT
    #[arg(long)]
    source: String,

    /// Displayed page size as WIDTHxHEIGHT
    #[arg(long)]
    display: String,

    #[arg(long)]
    min_size: Option<f64>,

    /// Do not grow small boxes to the minimum size
    #[arg(long)]
    no_min: bool,

    /// Do not clip boxes to the display bounds
    #[arg(long)]
    no_clamp: bool,
}

fn main() -> Result<()> {
    panic_handler::initialize_panic_handler();
    let cli = Cli::parse();

    // Open at full verbosity so settings warnings land; narrowed once loaded
    WriteLogger::init(
        LevelFilter::Trace,
        Config::default(),
        File::create(&cli.log_file)
            .with_context(|| format!("Failed to create log file {}", cli.log_file.display()))?,
    )?;

    match &cli.config {
        Some(path) => settings::load_settings_from_path(path)?,
        None => settings::load_settings(),
    }
    let settings = settings::get_settings();
    log::set_max_level(effective_level(cli.verbose, &settings));
    info!("Starting docsync {}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Replay(args) => run_replay(args, &settings),
        Commands::Transcript(args) => run_transcript(args),
        Commands::Transform(args) => run_transform(args, &settings),
    }
}

fn effective_level(verbose: bool, settings: &Settings) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        settings.log_level.to_level_filter()
    }
}

fn run_replay(args: &ReplayArgs, settings: &Settings) -> Result<()> {
    let fixture = DocumentFixture::load(&args.fixture)?;
    let steps = match &args.script {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read script {}", path.display()))?;
            Step::parse_script(&json)?
        }
        None => Vec::new(),
    };
    let options = ReplayOptions {
        query: args.url.clone(),
        surface: Dimensions::new(args.width, args.height),
        config: SyncConfig::from_settings(settings),
    };

    let report = replay(fixture, options, &steps)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_transcript(args: &TranscriptArgs) -> Result<()> {
    let text = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let is_json = args
        .file
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let (origin, chunks) = if is_json {
        let cues: Vec<Cue> = serde_json::from_str(&text).context("Failed to parse cues")?;
        select_transcript(Some(&cues), None)
    } else {
        select_transcript(None, Some(&text))
    };
    info!("Transcript from {origin:?}: {} chunks", chunks.len());
    println!("{}", serde_json::to_string_pretty(&chunks)?);
    Ok(())
}

fn run_transform(args: &TransformArgs, settings: &Settings) -> Result<()> {
    let bbox = parse_bbox(&args.bbox)?;
    let source = parse_size(&args.source)?;
    let display = parse_size(&args.display)?;
    if !source.is_valid() || !display.is_valid() {
        bail!("Source and display sizes must be positive");
    }
    let options = TransformOptions {
        min_size: args.min_size.unwrap_or(settings.min_box_size),
        enforce_minimum: settings.enforce_minimum && !args.no_min,
        clamp_to_bounds: settings.clamp_to_bounds && !args.no_clamp,
    };

    let scaled = transform(&bbox, source, display, &options);
    println!("{}", serde_json::to_string_pretty(&scaled)?);
    Ok(())
}

fn parse_numbers(raw: &str, sep: char) -> Result<Vec<f64>> {
    raw.split(sep)
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .with_context(|| format!("Invalid number {part:?} in {raw:?}"))
        })
        .collect()
}

fn parse_bbox(raw: &str) -> Result<BBox> {
    match parse_numbers(raw, ',')?.as_slice() {
        &[left, bottom, right, top] => Ok(BBox::new(left, bottom, right, top)),
        _ => bail!("Expected left,bottom,right,top but got {raw:?}"),
    }
}

fn parse_size(raw: &str) -> Result<Dimensions> {
    match parse_numbers(&raw.to_ascii_lowercase(), 'x')?.as_slice() {
        &[width, height] => Ok(Dimensions::new(width, height)),
        _ => bail!("Expected WIDTHxHEIGHT but got {raw:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsync::settings::LogLevel;

    #[test]
    fn parses_cli_boxes_and_sizes() {
        assert_eq!(
            parse_bbox("10, 20,30,40").unwrap(),
            BBox::new(10.0, 20.0, 30.0, 40.0)
        );
        assert_eq!(parse_size("612x792").unwrap(), Dimensions::new(612.0, 792.0));
        assert_eq!(parse_size("612X792").unwrap(), Dimensions::new(612.0, 792.0));
        assert!(parse_bbox("1,2,3").is_err());
        assert!(parse_size("wide").is_err());
    }

    #[test]
    fn verbose_flag_overrides_configured_level() {
        let quiet = Settings {
            log_level: LogLevel::Error,
            ..Settings::default()
        };
        assert_eq!(effective_level(false, &quiet), LevelFilter::Error);
        assert_eq!(effective_level(true, &quiet), LevelFilter::Debug);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
