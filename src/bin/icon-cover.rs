use std::path::{Path, PathBuf};
use std::process::{self, Command};

use clap::{Parser, Subcommand};

use icon_cover_overlay::fs_store::{DirectoryAssetStore, DirectoryIconStore};
use icon_cover_overlay::{combine, CoverImage, IconSetManager, DEFAULT_COVER_PATH};

#[derive(Parser)]
#[command(
    name = "icon-cover",
    about = "Overlay a development cover watermark on app icons around a build",
    version,
    after_help = "Typical usage: icon-cover wrap --icons-root icons -- make build\n\n\
                  Icons are overwritten before the wrapped command runs and\n\
                  restored afterward. Tracking lives in-process only, so the\n\
                  overwrite and revert always happen within one invocation."
)]
struct Cli {
    /// Path to the development cover image
    #[arg(long, default_value = DEFAULT_COVER_PATH, global = true)]
    cover: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Overwrite all icons, run a build command, then revert
    Wrap {
        /// Root directory holding the icon set
        #[arg(long, default_value = "icons")]
        icons_root: PathBuf,

        /// Directory for generated combined assets
        #[arg(long, default_value = "icons/combined")]
        assets_dir: PathBuf,

        /// Active build target name, used in generated asset names
        #[arg(long, default_value = "")]
        target: String,

        /// Build command and its arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        build_command: Vec<String>,
    },

    /// Blend the cover over a single image and save the result
    Preview {
        /// Input image file
        input: PathBuf,

        /// Output file (default: {name}_covered.{ext})
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let cover = match CoverImage::load(&cli.cover) {
        Ok(cover) => cover,
        Err(e) => {
            eprintln!("Fatal: {e}");
            process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Wrap {
            icons_root,
            assets_dir,
            target,
            build_command,
        } => run_wrap(cover, &icons_root, &assets_dir, target, &build_command),
        Commands::Preview { input, output } => run_preview(&cover, &input, output.as_deref()),
    };
    process::exit(code);
}

/// Overwrite icons, run the build command, revert, and return the exit code.
///
/// The revert runs even when the wrapped command fails; a revert failure
/// takes precedence in the exit code so a dirty icon set never passes
/// silently.
fn run_wrap(
    cover: CoverImage,
    icons_root: &Path,
    assets_dir: &Path,
    target: String,
    build_command: &[String],
) -> i32 {
    let store = DirectoryIconStore::new(icons_root, target);
    let assets = DirectoryAssetStore::new(assets_dir);
    let mut manager = IconSetManager::new(store, assets, cover);

    if let Err(e) = manager.run_overwrite() {
        eprintln!("Error: failed to overwrite icons: {e}");
        if let Err(e) = manager.run_revert() {
            eprintln!("Error: failed to revert after partial overwrite: {e}");
        }
        return 1;
    }

    let status = Command::new(&build_command[0])
        .args(&build_command[1..])
        .status();

    let build_code = match status {
        Ok(status) => status.code().unwrap_or(1),
        Err(e) => {
            eprintln!("Error: failed to run '{}': {e}", build_command[0]);
            1
        }
    };

    if let Err(e) = manager.run_revert() {
        eprintln!("Error: failed to revert icons: {e}");
        return 1;
    }

    build_code
}

/// Blend the cover over one image without touching any store.
fn run_preview(cover: &CoverImage, input: &Path, output: Option<&Path>) -> i32 {
    let source = match image::open(input) {
        Ok(img) => img.to_rgba32f(),
        Err(e) => {
            eprintln!("Error: failed to load '{}': {e}", input.display());
            return 1;
        }
    };

    let resampled = cover.resampled(source.width(), source.height());
    let mut combined = combine(&source, &resampled);
    for px in combined.pixels_mut() {
        for channel in &mut px.0 {
            *channel = channel.clamp(0.0, 1.0);
        }
    }

    let output = output.map_or_else(|| default_preview_path(input), Path::to_path_buf);
    let result = image::DynamicImage::ImageRgba32F(combined)
        .to_rgba8()
        .save(&output);
    match result {
        Ok(()) => {
            eprintln!("[OK] {}", output.display());
            0
        }
        Err(e) => {
            eprintln!("Error: failed to save '{}': {e}", output.display());
            1
        }
    }
}

/// `"icon.png"` becomes `"icon_covered.png"`.
fn default_preview_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let ext = input.extension().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_covered.{ext}"))
}
