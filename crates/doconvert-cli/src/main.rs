//! doconvert CLI - Command line tool for building, merging and converting documents.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use doconvert_core::{
    AppConfig, ConversionTarget, ConverterBackend, ImageAssembler, InputAsset, Orientation,
    PageSize, check_image_inputs, create_converter, merge_uploaded_pdfs,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PageSizeOption {
    A4,
    Letter,
}

impl From<PageSizeOption> for PageSize {
    fn from(opt: PageSizeOption) -> Self {
        match opt {
            PageSizeOption::A4 => Self::A4,
            PageSizeOption::Letter => Self::Letter,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrientationOption {
    Portrait,
    Landscape,
    Auto,
}

impl From<OrientationOption> for Orientation {
    fn from(opt: OrientationOption) -> Self {
        match opt {
            OrientationOption::Portrait => Self::Portrait,
            OrientationOption::Landscape => Self::Landscape,
            OrientationOption::Auto => Self::Auto,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TargetOption {
    Pdf,
    Docx,
}

impl From<TargetOption> for ConversionTarget {
    fn from(opt: TargetOption) -> Self {
        match opt {
            TargetOption::Pdf => Self::Pdf,
            TargetOption::Docx => Self::Docx,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "doconvert")]
#[command(author, version, about = "Turn images into PDFs, merge PDFs and convert office documents", long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a PDF with one page per image
    Images {
        /// Input images (JPEG or PNG), in page order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Page size
        #[arg(long, value_enum, default_value = "a4")]
        page_size: PageSizeOption,

        /// Page orientation
        #[arg(long, value_enum, default_value = "auto")]
        orientation: OrientationOption,

        /// Output PDF file
        #[arg(short, long, default_value = "images.pdf")]
        output: PathBuf,
    },

    /// Concatenate PDFs in the order given
    Merge {
        /// Input PDFs
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output PDF file
        #[arg(short, long, default_value = "merged.pdf")]
        output: PathBuf,
    },

    /// Convert Word/PowerPoint to PDF or PDF to Word
    Convert {
        /// Input document
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum)]
        to: TargetOption,

        /// Output file (default: input name with the new extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Conversion backend (convertapi, libreoffice, disabled)
        #[arg(long, env = "DOCONVERT_BACKEND")]
        backend: Option<String>,

        /// ConvertAPI secret
        #[arg(long, env = "CONVERTAPI_SECRET", hide_env_values = true)]
        convertapi_secret: Option<String>,

        /// ConvertAPI base URL
        #[arg(long, env = "CONVERTAPI_BASE")]
        convertapi_base: Option<String>,

        /// Path to the LibreOffice `soffice` binary
        #[arg(long, env = "SOFFICE_PATH")]
        soffice_path: Option<PathBuf>,
    },
}

/// Read input files, keeping their file names for kind detection.
fn read_assets(paths: &[PathBuf]) -> Result<Vec<InputAsset>> {
    paths
        .iter()
        .map(|path| {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let name = path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            Ok(InputAsset::new(bytes, name))
        })
        .collect()
}

fn progress_bar(len: usize) -> ProgressBar {
    #[allow(clippy::cast_possible_truncation)]
    let pb = ProgressBar::new(len as u64);
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write output: {}", path.display()))
}

fn run_images(
    files: &[PathBuf],
    page_size: PageSize,
    orientation: Orientation,
    output: &Path,
) -> Result<()> {
    let assets = read_assets(files)?;
    check_image_inputs(&assets)?;

    info!("Assembling {} image(s) ({}, {})", assets.len(), page_size, orientation);

    let pb = progress_bar(assets.len());
    let mut assembler = ImageAssembler::new(page_size, orientation);

    for asset in &assets {
        pb.set_message(asset.filename.clone());
        if let Err(e) = assembler.add_image(&asset.bytes, &asset.filename) {
            pb.println(format!("Skipped {e}"));
        }
        pb.inc(1);
    }
    pb.finish_with_message(format!("{} page(s)", assembler.page_count()));

    let outcome = assembler.finish().context("Failed to build PDF")?;
    write_output(output, &outcome.pdf)?;

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!(
            "Wrote {} page(s) to {} ({} skipped)",
            outcome.pages,
            output.display(),
            outcome.skipped.len()
        );
    }
    Ok(())
}

fn run_merge(files: &[PathBuf], output: &Path) -> Result<()> {
    let assets = read_assets(files)?;
    let outcome = merge_uploaded_pdfs(&assets).context("Failed to merge PDFs")?;
    write_output(output, &outcome.pdf)?;

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!("Merged {} page(s) into {}", outcome.pages, output.display());
    }
    Ok(())
}

/// Where a converted file lands when no `-o` was given: beside the input.
fn converted_path(input: &Path, converted_name: &str) -> PathBuf {
    input.with_file_name(converted_name)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Load or create config
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    match args.command {
        Command::Images {
            files,
            page_size,
            orientation,
            output,
        } => run_images(&files, page_size.into(), orientation.into(), &output),

        Command::Merge { files, output } => run_merge(&files, &output),

        Command::Convert {
            file,
            to,
            output,
            backend,
            convertapi_secret,
            convertapi_base,
            soffice_path,
        } => {
            // Override config with CLI arguments
            if let Some(name) = backend {
                let Some(backend) = ConverterBackend::from_name(&name) else {
                    bail!("Unknown converter backend: {name}");
                };
                config.converter.backend = Some(backend);
            }
            if convertapi_secret.is_some() {
                config.converter.api_secret = convertapi_secret;
            }
            if let Some(base) = convertapi_base {
                config.converter.api_base = base;
            }
            if let Some(path) = soffice_path {
                config.converter.soffice_path = path;
            }

            let converter =
                create_converter(&config.converter).context("Failed to initialize converter")?;
            if !converter.is_available() {
                bail!(
                    "No office converter configured (set CONVERTAPI_SECRET or use --backend libreoffice)"
                );
            }

            let asset = read_assets(std::slice::from_ref(&file))?
                .pop()
                .context("No input file")?;
            let target = ConversionTarget::from(to);
            target.check_source(&asset)?;

            info!("Converting {} with {}", asset.filename, converter.name());
            let converted = converter
                .convert(&asset, target)
                .await
                .with_context(|| format!("Failed to convert {}", file.display()))?;

            let output_path = output.unwrap_or_else(|| converted_path(&file, &converted.filename));
            write_output(&output_path, &converted.bytes)?;

            // CLI output is intentional
            #[allow(clippy::print_stdout)]
            {
                println!("Converted file saved to: {}", output_path.display());
            }
            Ok(())
        }
    }
}
