use clap::{Parser, Subcommand};
use jpegfit::config::{self, CliOverrides};
use jpegfit::imaging::{RustBackend, compress_image};
use jpegfit::{output, process};
use std::path::PathBuf;

/// Threshold and quality flags shared by `batch` and `file`.
#[derive(clap::Args, Clone, Default)]
struct TargetArgs {
    /// Files below this size (KiB) are re-encoded at quality 95
    #[arg(long)]
    min_kb: Option<u64>,

    /// Budget (KiB) for large files; files up to this size are re-encoded
    #[arg(long)]
    max_kb: Option<u64>,

    /// Starting JPEG quality for large files (1-100)
    #[arg(long)]
    quality: Option<u32>,
}

impl TargetArgs {
    fn overrides(&self, jobs: Option<usize>) -> CliOverrides {
        CliOverrides {
            min_kb: self.min_kb,
            max_kb: self.max_kb,
            initial_quality: self.quality,
            max_processes: jobs,
        }
    }
}

#[derive(Parser)]
#[command(name = "jpegfit")]
#[command(about = "Normalize images into JPEGs that fit a byte budget")]
#[command(long_about = "\
Normalize images into JPEGs that fit a byte budget

Every jpg, jpeg, png, bmp, tiff and webp file directly inside the input
directory is written as <stem>.jpg to the output directory:

  smaller than min_kb   re-encoded at quality 95
  up to max_kb          re-encoded at quality 95
  larger than max_kb    scaled, then compressed until it fits in max_kb

Transparent images are placed on a white background.

Configuration layers, lowest first:
  stock defaults → <input_dir>/jpegfit.toml → --config FILE → flags

Run 'jpegfit gen-config' to generate a documented jpegfit.toml.
Set RUST_LOG=debug to see every encode attempt.")]
#[command(version)]
struct Cli {
    /// Explicit config file, applied over <input_dir>/jpegfit.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compress every image in a directory
    Batch {
        /// Directory containing the source images
        input_dir: PathBuf,

        /// Output directory (default: <input_dir>/<output_subdir>)
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        target: TargetArgs,

        /// Maximum parallel workers (capped at the number of cores)
        #[arg(long, short)]
        jobs: Option<usize>,

        /// Write the batch report as JSON to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Compress a single image
    File {
        /// Source image
        input: PathBuf,

        /// Output path (the extension is forced to .jpg)
        output: PathBuf,

        #[command(flatten)]
        target: TargetArgs,
    },
    /// Print a stock jpegfit.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Batch {
            input_dir,
            output: output_arg,
            target,
            jobs,
            report,
        } => {
            let config = config::load_config(
                Some(&input_dir),
                cli.config.as_deref(),
                &target.overrides(jobs),
            )?;
            init_thread_pool(&config.processing);
            let output_dir = output_arg.unwrap_or_else(|| input_dir.join(&config.output_subdir));

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_process_event(&event);
                }
            });
            let result = process::run(&input_dir, &output_dir, &config.target(), Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let batch = result?;

            output::print_batch_summary(&batch);
            if let Some(path) = report {
                batch.save_json(&path)?;
                println!("Report: {}", path.display());
            }
        }
        Command::File {
            input,
            output: output_path,
            target,
        } => {
            let config = config::load_config(
                input.parent().filter(|p| !p.as_os_str().is_empty()),
                cli.config.as_deref(),
                &target.overrides(None),
            )?;
            let compressed = compress_image(
                &RustBackend::new(),
                &input,
                &output_path,
                &config.target(),
            )?;
            output::print_compressed(&compressed);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Route `log` output to stderr. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: `--jobs` can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    log::debug!("using {} worker thread(s)", threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
