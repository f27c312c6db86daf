use clap::{Parser, Subcommand};
use cropfit::config::{self, AppConfig};
use cropfit::imaging::{
    Algorithm, Dimensions, ImageBackend, Mode, Quality, ResizeConfig, ResizeOptions, RustBackend,
    resize_image,
};
use cropfit::naming::VariantName;
use cropfit::process::{self, ProcessConfig};
use cropfit::storage::{LocalBackend, ObjectId, StorageBackend};
use cropfit::output;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Resize policy flags. Anything not given falls back to `[resize]` in the config.
#[derive(clap::Args, Clone)]
struct ResizeArgs {
    /// fit (stay inside the box) or fill (cover the box, crop the rest)
    #[arg(long)]
    mode: Option<Mode>,
    /// Fill only: scale_then_crop or crop_sample_then_scale
    #[arg(long)]
    algorithm: Option<Algorithm>,
    /// Allow output larger than the original
    #[arg(long)]
    upscale: bool,
}

impl ResizeArgs {
    fn options(&self, config: &AppConfig) -> ResizeOptions {
        let defaults = config.resize.options();
        ResizeOptions {
            mode: self.mode.unwrap_or(defaults.mode),
            algorithm: self.algorithm.or(defaults.algorithm),
            upscale: self.upscale || defaults.upscale,
        }
    }
}

fn version_string() -> &'static str {
    let on_tag = env!("CROPFIT_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("CROPFIT_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "cropfit")]
#[command(about = "Fit/fill image resizing with a content-addressed store")]
#[command(long_about = "\
Fit/fill image resizing with a content-addressed store

Modes:
  fit    Shrink to stay inside the target box. Never crops.
  fill   Cover the whole target box, cropping what overflows.

Originals are stored under an id derived from their contents. Variants are
stored next to them and named after how they were made:

  media/3c72aedc/ba25/11e6/569a/406c8f413974/photo.jpg/
  ├── photo.jpg                      # original
  ├── 300x200-fill.jpg               # fill 300x200, default algorithm
  └── 64x64-fit-upscale.png          # fit 64x64, enlarging if needed

Requesting a variant URL that does not exist yet generates it ('fetch').

Run 'cropfit gen-config' to generate a documented cropfit.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: ./cropfit.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Scratch directory for retrieved originals and encoded variants
    #[arg(long, global = true)]
    work_dir: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the resize plan for a source (WxH or image file) and a target
    Plan {
        source: String,
        target: Dimensions,
        #[command(flatten)]
        resize: ResizeArgs,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resize a local file (output format from the extension)
    Resize {
        input: PathBuf,
        output: PathBuf,
        target: Dimensions,
        #[command(flatten)]
        resize: ResizeArgs,
        /// JPEG quality (1-100)
        #[arg(long)]
        quality: Option<u32>,
    },
    /// Store a local file as an original
    Put {
        file: PathBuf,
        /// Overwrite if already stored
        #[arg(long)]
        force: bool,
    },
    /// Generate variants of a stored original
    Variants {
        id: ObjectId,
        #[arg(required = true)]
        sizes: Vec<Dimensions>,
        #[command(flatten)]
        resize: ResizeArgs,
        /// Output format extension
        #[arg(long, default_value = "jpg")]
        format: String,
        /// Overwrite existing variants
        #[arg(long)]
        force: bool,
    },
    /// Resolve a variant URL, generating the variant if needed
    Fetch {
        url: String,
        /// Regenerate even if already stored
        #[arg(long)]
        force: bool,
    },
    /// Print the URL of a stored file
    Url { id: ObjectId, filename: Option<String> },
    /// Copy a stored original into a local directory
    Get { id: ObjectId, dest: PathBuf },
    /// Delete an original and all its variants
    Delete { id: ObjectId },
    /// Delete all variants of an original, keeping the original
    Clear { id: ObjectId },
    /// Print a stock cropfit.toml with all options documented
    GenConfig,
}

impl Command {
    /// Commands that fan variant generation out over the rayon pool.
    fn generates_variants(&self) -> bool {
        matches!(self, Command::Variants { .. } | Command::Fetch { .. })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let app_config = match (&cli.command, &cli.config) {
        // Must work even when the existing config is broken
        (Command::GenConfig, _) => AppConfig::default(),
        (_, Some(path)) => config::load_config_file(path)?,
        (_, None) => config::load_config(Path::new("."))?,
    };
    debug!("config: {:?}", app_config);
    let storage = LocalBackend::new(&app_config.storage.path, &app_config.storage.url);
    let backend = RustBackend::new();
    let work_dir = cli
        .work_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("cropfit"));
    let process_config = |force: bool| ProcessConfig {
        quality: Quality::new(app_config.resize.quality),
        force,
        work_dir: work_dir.clone(),
    };

    if cli.command.generates_variants() {
        init_thread_pool(&app_config.processing);
    }

    match cli.command {
        Command::Plan {
            source,
            target,
            resize,
            json,
        } => {
            let source = match source.parse::<Dimensions>() {
                Ok(dims) => dims,
                Err(_) => backend.identify(Path::new(&source))?,
            };
            let options = resize.options(&app_config);
            let plan = options.plan(source, target)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                output::print_plan(source, target, &options, &plan);
            }
        }
        Command::Resize {
            input,
            output: out,
            target,
            resize,
            quality,
        } => {
            let config = ResizeConfig {
                options: resize.options(&app_config),
                quality: Quality::new(quality.unwrap_or(app_config.resize.quality)),
            };
            let variant = resize_image(&backend, &input, &out, target, &config)?;
            println!(
                "{} ({}x{})",
                out.display(),
                variant.width,
                variant.height
            );
        }
        Command::Put { file, force } => {
            let id = process::ingest_original(&storage, &file, force)?;
            output::print_stored(&id, &storage.url_for(&id, id.filename()));
        }
        Command::Variants {
            id,
            sizes,
            resize,
            format,
            force,
        } => {
            let options = resize.options(&app_config);
            let requests: Vec<VariantName> = sizes
                .into_iter()
                .map(|size| VariantName::new(size, options, &format))
                .collect();
            let variants =
                process::create_variants(&backend, &storage, &id, &requests, &process_config(force))?;
            output::print_variants(&variants);
        }
        Command::Fetch { url, force } => {
            let resolved = process::resolve_url(&backend, &storage, &url, &process_config(force))?;
            output::print_resolved(&resolved);
        }
        Command::Url { id, filename } => {
            let filename = filename.unwrap_or_else(|| id.filename().to_string());
            println!("{}", storage.url_for(&id, &filename));
        }
        Command::Get { id, dest } => {
            let path = storage.retrieve_original(&id, &dest)?;
            println!("{}", path.display());
        }
        Command::Delete { id } => {
            if storage.delete(&id)? {
                println!("Deleted {}", id);
            } else {
                println!("Not stored: {}", id);
            }
        }
        Command::Clear { id } => {
            let removed = storage.clear_variants(&id)?;
            println!("Removed {} variant(s) of {}", removed, id);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// `RUST_LOG` wins when set; otherwise `-v` raises the level from `warn`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    info!("using {} worker thread(s)", threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
