// Command-line entry point: reads images, runs them through the queue and
// writes a `compressed_<name>` file per completed job into the output directory.

use std::collections::HashSet;
use std::path::PathBuf;
use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use anysize_lib::{
    AdaptiveSearch, CompressionConfig, JobQueue, JobStatus, OutputFormat, SizeUnit, SourceImage,
    TargetMode, WorkerContext, claim_unique_path, compressed_output_path, file_name, format_file_size, format_from_extension,
    read_source, write_output,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Fit under --max-size-mb
    Size,
    /// Resize into --max-width/--max-height or --max-edge
    Pixel,
    /// Encode once at --quality
    Quality,
}

impl From<Mode> for TargetMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Size => TargetMode::Size,
            Mode::Pixel => TargetMode::Pixel,
            Mode::Quality => TargetMode::Quality,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "anysize", version, about = "Compress images to a byte size, a pixel footprint or a fixed quality")]
struct Cli {
    /// Images to compress
    #[arg(required = true)]
    files: Vec<PathBuf>,

    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Byte budget in MB (1 MB = 1,048,576 bytes)
    #[arg(long)]
    max_size_mb: Option<f64>,

    #[arg(long)]
    max_width: Option<u32>,

    #[arg(long)]
    max_height: Option<u32>,

    /// Limit for the longer edge
    #[arg(long)]
    max_edge: Option<u32>,

    /// Encode quality, 0.1 to 1.0
    #[arg(long)]
    quality: Option<f64>,

    /// Output format: jpeg, png or webp
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Stretch to exactly --max-width × --max-height
    #[arg(long)]
    free_ratio: bool,

    /// Never change the pixel dimensions
    #[arg(long)]
    keep_resolution: bool,

    /// JSON config file; command-line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

impl Cli {
    async fn compression_config(&self) -> Result<CompressionConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("Invalid config {}", path.display()))?
            }
            None => CompressionConfig::default(),
        };

        if let Some(mode) = self.mode {
            config.target_mode = mode.into();
        }
        if let Some(max_size_mb) = self.max_size_mb {
            config.max_size_mb = max_size_mb;
        }
        if self.max_width.is_some() {
            config.max_width = self.max_width;
        }
        if self.max_height.is_some() {
            config.max_height = self.max_height;
        }
        if let Some(edge) = self.max_edge {
            config.max_longest_edge = edge;
        }
        if let Some(quality) = self.quality {
            config.quality = quality;
            config.initial_quality = quality;
        }
        if let Some(format) = self.format {
            config.output_format = format;
        }
        if self.free_ratio {
            config.keep_aspect_ratio = false;
        }
        if self.keep_resolution {
            config.always_keep_resolution = true;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    info!("=== anysize: {} file(s) ===", cli.files.len());
    let config = cli.compression_config().await?;
    debug!("Effective config: {}", serde_json::to_string(&config)?);

    let mut images = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        match read_source(path).await {
            Ok(bytes) => images.push(SourceImage::new(file_name(path), bytes)),
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }
    if images.is_empty() {
        bail!("No readable input files");
    }

    let (context, events) = WorkerContext::spawn(AdaptiveSearch::default());
    let mut queue = JobQueue::new(context, events);
    queue.submit(images, &config)?;
    let summary = queue.run_until_idle().await?;

    let mut taken = HashSet::new();
    for job in queue.completed() {
        let Some(output) = job.output() else {
            continue;
        };
        // Pass-through results are the source bytes and keep the source extension
        let path = if output.passthrough {
            match format_from_extension(job.name()) {
                Ok(format) => compressed_output_path(&cli.out_dir, job.name(), format),
                Err(_) => cli.out_dir.join(format!("compressed_{}", job.name())),
            }
        } else {
            compressed_output_path(&cli.out_dir, job.name(), config.output_format)
        };
        let path = claim_unique_path(path, &mut taken);
        write_output(&path, &output.bytes).await?;
        info!(
            "{} → {} ({} → {}, {}% saved)",
            job.name(),
            path.display(),
            format_file_size(job.original_size(), SizeUnit::Auto),
            format_file_size(output.size, SizeUnit::Auto),
            output.ratio
        );
    }

    for job in queue.jobs().iter().filter(|job| job.status() == JobStatus::Error) {
        warn!("{} failed: {}", job.name(), job.error().unwrap_or("unknown error"));
    }

    info!(
        "Done: {} of {} compressed, {} saved",
        summary.completed,
        summary.total,
        format_file_size(summary.saved_bytes(), SizeUnit::Auto)
    );

    if summary.failed > 0 {
        bail!("{} of {} images failed", summary.failed, summary.total);
    }
    Ok(())
}
