use clap::{Parser, Subcommand};
use nano_image::config::{self, ToolConfig};
use nano_image::export::{self, SaveOptions};
use nano_image::imaging::{Blur, RustBackend};
use nano_image::naming::SavePolicy;
use nano_image::output::{self, ImageInfo};
use nano_image::session::ImageSession;
use nano_image::types::ImageFormat;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "nano-image")]
#[command(about = "Resize, blur and convert images; writes byte-exact 24-bit BMP")]
#[command(long_about = "\
Resize, blur and convert images; writes byte-exact 24-bit BMP

Inputs: JPEG, PNG, GIF, WebP, BMP.
Outputs: JPEG, PNG, GIF, WebP (via the image crate) and uncompressed 24-bit BMP.

When the output file already exists the naming policy decides what happens:
  replace    overwrite it
  thumbnail  keep it, write name-WxH.ext (W x H = requested resize)
  timestamp  keep it, write name-<unix seconds>.ext

For BMP output, --quality Q scales both axes to Q% before encoding.

Run 'nano-image gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Config file (TOML); flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Image to read
    input: PathBuf,

    /// Where to write; omit to write the encoded image to stdout
    output: Option<PathBuf>,

    /// Output width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Fit width/height to the source aspect ratio
    #[arg(long)]
    keep_ratio: bool,

    /// Gaussian blur sigma in pixels
    #[arg(long)]
    blur: Option<f32>,

    /// JPEG quality, or BMP scale percentage (1-100)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100))]
    quality: Option<u32>,

    /// Output format (jpeg, png, gif, webp, bmp); defaults to OUTPUT's extension
    #[arg(long)]
    format: Option<ImageFormat>,

    /// What to do when OUTPUT already exists
    #[arg(long, value_enum)]
    policy: Option<SavePolicy>,

    /// Do not carry EXIF into the output
    #[arg(long)]
    strip_exif: bool,

    /// Delete INPUT after a successful convert
    #[arg(long)]
    remove_source: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Convert, resize or blur an image
    Convert(ConvertArgs),
    /// Show dimensions, format and EXIF of an image
    Info {
        /// Image to inspect
        input: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print a stock config file with all options documented
    GenConfig,
}

/// Stderr logger; the level is set once from `--verbose`.
static LOGGER: StderrLogger = StderrLogger;

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let target = if !record.target().is_empty() {
                record.target()
            } else {
                record.module_path().unwrap_or_default()
            };
            let args = record.args();

            match record.level() {
                log::Level::Error => eprintln!("error ({}): {}", target, args),
                log::Level::Warn => eprintln!("warning ({}): {}", target, args),
                level => eprintln!("{} ({}): {}", level.as_str().to_lowercase(), target, args),
            }
        }
    }

    fn flush(&self) {}
}

fn init_logging(verbose: bool) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        });
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Convert(args) => {
            let config = config::load_config(cli.config.as_deref())?;
            convert(&config, &args)?;
        }
        Command::Info { input, json } => {
            let config = config::load_config(cli.config.as_deref())?;
            let backend = RustBackend::with_filter(config.resize.filter);
            let session = ImageSession::open(&backend, &input)?;
            let info = ImageInfo::from_session(&input, &session);
            if json {
                println!("{}", output::format_info_json(&info)?);
            } else {
                output::print_info(&info);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn convert(config: &ToolConfig, args: &ConvertArgs) -> Result<(), Box<dyn std::error::Error>> {
    let backend = RustBackend::with_filter(config.resize.filter);
    let mut session = ImageSession::open(&backend, &args.input)?;

    if args.width.is_some() || args.height.is_some() {
        let original = session.original_dimensions();
        session = session.resize(
            args.width.unwrap_or(original.width),
            args.height.unwrap_or(original.height),
            args.keep_ratio || config.resize.preserve_ratio,
        );
    }

    let sigma = args.blur.unwrap_or(config.blur.sigma);
    session = session.blur(&backend, Blur::new(sigma))?;

    if args.strip_exif || !config.metadata.keep_exif {
        session = session.strip_exif();
    }

    let format = args.format.or(config.output.format);
    let options = SaveOptions {
        quality: args.quality.or(config.output.quality),
    };

    match &args.output {
        Some(target) => {
            let policy = args.policy.unwrap_or(config.output.policy);
            let report = match format {
                Some(format) => {
                    export::save_as(&backend, &session, target, policy, options, format)?
                }
                None => export::save(&backend, &session, target, policy, options)?,
            };
            output::print_save_report(&args.input, &report);
            if args.remove_source {
                remove_source(&session, &report.path)?;
            }
        }
        None => {
            let format = format.ok_or("--format is required when writing to stdout")?;
            let bytes = export::encode(&backend, &session, format, options)?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
            if args.remove_source {
                session.remove_source()?;
            }
        }
    }

    Ok(())
}

/// Delete the input unless the convert just wrote over it.
fn remove_source(session: &ImageSession, written: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let same_file = session
        .source()
        .zip(std::fs::canonicalize(written).ok())
        .is_some_and(|(source, written)| {
            std::fs::canonicalize(source).is_ok_and(|source| source == written)
        });
    if same_file {
        log::warn!("not removing {}: it is the output file", written.display());
        return Ok(());
    }
    session.remove_source()?;
    Ok(())
}
