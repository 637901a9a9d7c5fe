//! jpgresize CLI - Batch JPEG Resizer
//!
//! Shrinks JPEG photos to a preset or custom width and writes them to a new
//! desktop folder, an explicit directory, or back over the originals.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use jpgresize::processing::{plan_resize, ImageValidator, ResizePlan};
use jpgresize::{
    collect_sources, init_with_config, BatchProcessor, BatchReport, BatchSummary, Config,
    Destination, ErrorPolicy, ProgressEvent, Quality, ResizeJob, WidthPreset,
};

/// jpgresize - Batch JPEG Resizer
#[derive(Parser)]
#[command(
    name = "jpgresize",
    version,
    about = "Shrink a batch of JPEG photos to a target width",
    long_about = "jpgresize scales JPEG photos so that their longer side (the width of \
                  landscape and square photos, the height of portrait ones) matches a target \
                  width. Photos that already fit are copied unchanged. Results go to a new \
                  folder on the desktop, an explicit directory, or replace the originals.",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// JPEG files or folders containing them
    #[arg(value_name = "PATH")]
    inputs: Vec<PathBuf>,

    /// Preset target width
    #[arg(short, long, value_enum, conflicts_with = "width")]
    preset: Option<CliPreset>,

    /// Target width in pixels
    #[arg(short, long, value_name = "PIXELS")]
    width: Option<u32>,

    /// JPEG quality; values outside 1-100 are clamped
    #[arg(short, long, value_name = "QUALITY", allow_negative_numbers = true)]
    quality: Option<i64>,

    /// Write into a new folder on the desktop (takes precedence over other destinations)
    #[arg(long)]
    desktop: bool,

    /// Replace the original files
    #[arg(long)]
    in_place: bool,

    /// Write into this directory, creating it if needed
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Include JPEG files in subfolders
    #[arg(short = 'R', long)]
    recursive: bool,

    /// Number of worker threads (default: process one image at a time)
    #[arg(short, long, value_name = "COUNT")]
    threads: Option<usize>,

    /// Use one worker thread per CPU core
    #[arg(short = 'j', long, conflicts_with = "threads")]
    parallel: bool,

    /// Skip unreadable images instead of stopping
    #[arg(long)]
    skip_errors: bool,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "JPGRESIZE_CONFIG")]
    config: Option<PathBuf>,

    /// Show what would be done without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Print the batch report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'Q', long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// List the preset widths
    Presets,
    /// Validate configuration file
    Config {
        /// Configuration file to validate
        file: PathBuf,
    },
    /// Generate example configuration file
    ExampleConfig {
        /// Output file path
        #[arg(short, long, default_value = "jpgresize.toml")]
        output: PathBuf,
        /// Use YAML format instead of TOML
        #[arg(long)]
        yaml: bool,
    },
}

/// CLI-compatible preset enum
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliPreset {
    Thumbnail,
    Small,
    Medium,
    Large,
}

impl From<CliPreset> for WidthPreset {
    fn from(preset: CliPreset) -> Self {
        match preset {
            CliPreset::Thumbnail => WidthPreset::Thumbnail,
            CliPreset::Small => WidthPreset::Small,
            CliPreset::Medium => WidthPreset::Medium,
            CliPreset::Large => WidthPreset::Large,
        }
    }
}

#[tokio::main]
async fn main() {
    let mut cli = Cli::parse();

    if let Some(command) = cli.command.take() {
        if let Err(e) = handle_subcommand(command) {
            eprintln!("{}: {:#}", style("Error").red().bold(), e);
            process::exit(1);
        }
        return;
    }

    if let Err(e) = run(cli).await {
        eprintln!("{}: {:#}", style("Error").red().bold(), e);
        process::exit(1);
    }
}

/// Handle subcommands
fn handle_subcommand(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Presets => show_presets(),
        Commands::Config { file } => validate_config_file(&file)?,
        Commands::ExampleConfig { output, yaml } => generate_example_config(&output, yaml)?,
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.inputs.is_empty() {
        bail!("No input files or folders given. Run with --help for usage information");
    }

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => Config::default(),
    };

    if cli.quiet {
        config.logging.level = "error".to_string();
    } else if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    init_with_config(&config)?;

    if let Some(path) = &cli.config {
        info!("Loaded configuration from: {:?}", path);
    }

    let job = create_resize_job(&cli, &config)?;
    let sources = collect_sources(&cli.inputs, cli.recursive || config.processing.recursive)?;
    info!("Found {} images to process", sources.len());

    if cli.dry_run {
        print_dry_run(&sources, &job);
        return Ok(());
    }

    let processor = BatchProcessor::new(job)?;
    let (handle, mut events) = processor.spawn(sources);

    let progress = if cli.json || cli.quiet {
        None
    } else {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        Some(pb)
    };

    while let Some(event) = events.recv().await {
        if let Some(pb) = &progress {
            update_progress(pb, &event);
        }
        if event.is_terminal() {
            break;
        }
    }

    let report = handle
        .await
        .context("Resize task panicked")?
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !cli.quiet {
        print_summary(&report);
    }

    Ok(())
}

/// Create the resize job from configuration and CLI overrides
fn create_resize_job(cli: &Cli, config: &Config) -> anyhow::Result<ResizeJob> {
    let destination = if cli.desktop || cli.in_place || cli.output.is_some() {
        Some(Destination::from_flags(cli.desktop, cli.in_place, cli.output.clone())?)
    } else {
        None
    };
    let mut job = config.to_job_with(destination)?;

    if let Some(preset) = cli.preset {
        job.target_width = WidthPreset::from(preset).width();
    } else if let Some(width) = cli.width {
        job.target_width = width;
    }

    if let Some(quality) = cli.quality {
        job.quality = Quality::new(quality);
    }

    if cli.parallel {
        job = job.parallel();
    } else if cli.threads.is_some() {
        job.threads = cli.threads;
    }

    if cli.skip_errors {
        job.error_policy = ErrorPolicy::Skip;
    }

    job.validate()?;
    debug!("Resize job: {:?}", job);
    Ok(job)
}

fn update_progress(pb: &ProgressBar, event: &ProgressEvent) {
    match event {
        ProgressEvent::Started { total, .. } => pb.set_length(*total as u64),
        ProgressEvent::ImageCompleted { report, .. } => {
            pb.set_message(file_name(&report.source));
            pb.inc(1);
        }
        ProgressEvent::ImageSkipped { path, error, .. } => {
            pb.println(format!(
                "{} {}: {}",
                style("Skipped").yellow().bold(),
                path.display(),
                error
            ));
            pb.inc(1);
        }
        ProgressEvent::Replacing { count } => {
            pb.set_message(format!("replacing {} originals", count));
        }
        ProgressEvent::Finished { .. } => pb.finish_with_message("done"),
        ProgressEvent::Aborted { .. } => pb.abandon_with_message("stopped"),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Show what each image would go through
fn print_dry_run(sources: &[PathBuf], job: &ResizeJob) {
    let validator = ImageValidator::with_limits(job.max_file_size, job.max_image_pixels);

    let width = match WidthPreset::from_width(job.target_width) {
        Some(preset) => format!("{}px ({})", job.target_width, preset.name()),
        None => format!("{}px", job.target_width),
    };
    println!(
        "{} images, target width {}, quality {}, destination {:?}",
        style(sources.len()).bold(),
        width,
        job.quality,
        job.destination
    );

    for source in sources {
        let line = match validator.validate_file(source) {
            Ok(info) => match plan_resize(info.width, info.height, job.target_width) {
                Ok(ResizePlan::Copy) => format!("{}x{} (copy unchanged)", info.width, info.height),
                Ok(ResizePlan::Scale { width, height }) => {
                    format!("{}x{} -> {}x{}", info.width, info.height, width, height)
                }
                Err(e) => style(e.user_message()).red().to_string(),
            },
            Err(e) => style(e.user_message()).red().to_string(),
        };
        println!("  {}: {}", source.display(), line);
    }
}

/// Show available presets
fn show_presets() {
    println!("{}", style("Preset widths:").bold());
    for preset in WidthPreset::ALL {
        println!(
            "  {:<10} {:>5}px  {}",
            style(preset.name()).cyan().bold(),
            preset.width(),
            preset.description()
        );
    }
}

/// Validate configuration file
fn validate_config_file(file_path: &Path) -> anyhow::Result<()> {
    let config = Config::from_file(file_path)?;
    config.validate()?;

    println!("{}: Configuration file is valid", style("Success").green().bold());
    println!("Width: {}px", config.resize.width);
    println!("Quality: {}", config.resize.quality);
    println!("Output: {:?}", config.output.mode);

    Ok(())
}

/// Generate example configuration file
fn generate_example_config(output_path: &Path, use_yaml: bool) -> anyhow::Result<()> {
    let output_path = if use_yaml {
        output_path.with_extension("yaml")
    } else {
        output_path.to_path_buf()
    };

    Config::default().to_file(&output_path)?;

    let format = if use_yaml { "YAML" } else { "TOML" };
    println!(
        "{}: Generated example {} configuration: {}",
        style("Success").green().bold(),
        format,
        output_path.display()
    );

    Ok(())
}

/// Print processing summary
fn print_summary(report: &BatchReport) {
    let summary: &BatchSummary = &report.summary;

    println!();
    println!("{}", style("Summary:").bold());
    println!(
        "  {}: {} of {}",
        style("Processed").green(),
        summary.processed(),
        summary.total
    );
    println!("  {}: {}", style("Resized").green(), summary.resized);
    if summary.copied + summary.unchanged > 0 {
        println!(
            "  {}: {}",
            style("Already small enough").green(),
            summary.copied + summary.unchanged
        );
    }
    if summary.replaced > 0 {
        println!("  {}: {}", style("Originals replaced").cyan(), summary.replaced);
    }
    if summary.skipped > 0 {
        println!("  {}: {}", style("Skipped").red(), summary.skipped);
        for skipped in &report.skipped {
            println!("    {}: {}", skipped.path.display(), skipped.error);
        }
    }
    if let Some(folder) = &summary.output_folder {
        println!("  {}: {}", style("Output").blue(), folder.display());
    }
    println!("  {}: {:.2}s", style("Duration").blue(), summary.elapsed.as_secs_f64());

    if summary.input_bytes > 0 {
        println!(
            "  {}: {:.2}MB -> {:.2}MB ({:.1}% reduction)",
            style("Size").cyan(),
            summary.input_bytes as f64 / 1024.0 / 1024.0,
            summary.output_bytes as f64 / 1024.0 / 1024.0,
            summary.size_reduction()
        );
    }
}
