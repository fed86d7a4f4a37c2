use clap::{Parser, Subcommand};
use scaledown::imaging::{
    RustBackend, ScaleMode, ScaleRequest, compress, rust_backend, scale_or_original,
};
use scaledown::{config, output};
use std::path::PathBuf;

/// Arguments for the `scale` command.
#[derive(clap::Args)]
struct ScaleArgs {
    /// Images to scale
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Width of the destination box in pixels
    #[arg(long)]
    width: u32,

    /// Height of the destination box in pixels
    #[arg(long)]
    height: u32,

    /// fit (whole image visible) or crop (fill the box); defaults to config
    #[arg(long)]
    mode: Option<ScaleMode>,

    /// Directory for scaled images (created if missing)
    #[arg(long, default_value = ".")]
    output: PathBuf,

    /// JPEG quality 1-100; defaults to config
    #[arg(long)]
    quality: Option<u32>,
}

#[derive(Parser)]
#[command(name = "scaledown")]
#[command(about = "Downscale photos into a box, fitting or center-cropping")]
#[command(long_about = "\
Downscale photos into a box, fitting or center-cropping

Images that already fit the box are left alone. Larger images are decoded at
a reduced sample size, cropped or fitted, and written as
<output>/Scaled_<timestamp>.jpg.

Modes:
  fit   whole image visible; one side may be smaller than the box
  crop  box filled exactly; excess trimmed equally from both sides

Run 'scaledown gen-config' to generate a documented scaledown.toml.")]
#[command(version)]
struct Cli {
    /// Config file (TOML); stock defaults when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log geometry decisions (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scale images into a width x height box
    Scale(ScaleArgs),
    /// Re-encode a JPEG in place until it is no larger than a byte limit
    Compress {
        /// Image to re-encode
        input: PathBuf,
        /// Byte limit (defaults to the current file size)
        #[arg(long)]
        limit: Option<u64>,
    },
    /// Print a stock scaledown.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Command::Scale(args) => {
            let config = config::load_config(cli.config.as_deref())?;
            let backend = RustBackend::new();
            let mode = args.mode.unwrap_or(config.scaling.mode);
            let quality = args
                .quality
                .map(scaledown::imaging::Quality::new)
                .unwrap_or_else(|| config.output.quality());

            for input in &args.inputs {
                if !rust_backend::is_supported_input(input) {
                    log::warn!(
                        "{}: unrecognised extension, relying on content sniffing",
                        input.display()
                    );
                }
                let request = ScaleRequest {
                    quality,
                    naming: config.output.naming(),
                    ..ScaleRequest::new(input, args.width, args.height, mode, &args.output)
                };
                let outcome = scale_or_original(&backend, &request)?;
                for line in output::format_scale_outcome(input, &outcome) {
                    println!("{}", line);
                }
            }
        }
        Command::Compress { input, limit } => {
            let config = config::load_config(cli.config.as_deref())?;
            let outcome = compress(
                &RustBackend::new(),
                &input,
                limit,
                &config.compress.schedule(),
            )?;
            for line in output::format_compress_outcome(&input, &outcome) {
                println!("{}", line);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
