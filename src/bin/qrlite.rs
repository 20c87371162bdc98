use std::error::Error as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use qr_lite::config;
use qr_lite::history::{self, HistoryKind};
use qr_lite::locales::{self, LocaleError};
use qr_lite::render::raster::{RasterPalette, rasterize};
use qr_lite::render::svg::{self, Palette};
use qr_lite::render::{finder_style_names, module_style_names};
use qr_lite::settings::{JsonFileStore, Settings, SettingsService, StoreError};
use qr_lite::tools::download_filename;
use qr_lite::{EcLevel, RenderError, RenderOptions, render_text};
use thiserror::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "qrlite", version, about = "Styled QR code renderer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render content as SVG or PNG
    Render {
        content: String,
        /// Output file or directory; `.png` writes a raster image, anything else SVG.
        /// SVG goes to stdout when omitted.
        #[arg(long, short)]
        out: Option<PathBuf>,
        #[arg(long)]
        module_style: Option<String>,
        #[arg(long)]
        finder_style: Option<String>,
        #[arg(long)]
        ec: Option<EcLevel>,
        #[arg(long)]
        quiet_zone: Option<u32>,
        /// Output side in pixels
        #[arg(long)]
        size: Option<u32>,
        /// Render for a dark page
        #[arg(long)]
        dark: bool,
        /// Light modules when `--dark` is set; defaults to the stored setting
        #[arg(long)]
        white_on_black: bool,
        /// Page title used for the file name when `--out` is a directory
        #[arg(long)]
        title: Option<String>,
    },
    /// List registered module and finder styles
    Styles,
    /// Compare every locale catalogue against the source locale
    CheckLocales {
        dir: PathBuf,
        #[arg(long, default_value = "en")]
        source: String,
        /// Source tree searched for `__MSG_key__` and `i18n.getMessage('key')` uses
        #[arg(long)]
        src: Option<PathBuf>,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Settings(#[from] StoreError),
    #[error(transparent)]
    Locales(#[from] LocaleError),
    #[error("failed to write `{0}`")]
    Write(PathBuf, #[source] std::io::Error),
    #[error("failed to encode image `{0}`")]
    Image(PathBuf, #[source] image::ImageError),
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Render {
            content,
            out,
            module_style,
            finder_style,
            ec,
            quiet_zone,
            size,
            dark,
            white_on_black,
            title,
        } => {
            let args = RenderArgs {
                module_style,
                finder_style,
                ec,
                quiet_zone,
                size,
                dark,
                white_on_black,
                title,
            };
            render_cmd(&content, out.as_deref(), args).map(|()| true)
        }
        Command::Styles => {
            styles_cmd();
            Ok(true)
        }
        Command::CheckLocales { dir, source, src } => {
            check_locales_cmd(&dir, &source, src.as_deref())
        }
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

struct RenderArgs {
    module_style: Option<String>,
    finder_style: Option<String>,
    ec: Option<EcLevel>,
    quiet_zone: Option<u32>,
    size: Option<u32>,
    dark: bool,
    white_on_black: bool,
    title: Option<String>,
}

fn open_settings() -> Result<Option<SettingsService<JsonFileStore>>, StoreError> {
    let Some(path) = config::settings_path() else {
        return Ok(None);
    };
    debug!(path = %path.display(), "using settings file");
    Ok(Some(SettingsService::new(JsonFileStore::open(path)?)))
}

fn render_cmd(content: &str, out: Option<&Path>, args: RenderArgs) -> Result<(), CliError> {
    let mut service = open_settings()?;
    let settings = match &service {
        Some(service) => service.load()?,
        None => Settings::default(),
    };

    let (default_module, default_finder) = settings.render_styles();
    let quiet_zone = args.quiet_zone.unwrap_or_else(config::quiet_zone);
    let options = RenderOptions {
        module_style: args.module_style.unwrap_or(default_module),
        finder_style: args.finder_style.unwrap_or(default_finder),
        ec_level: args.ec.unwrap_or(settings.ec_level),
        module_size_px: 1.0,
        quiet_zone,
    };
    let size = args.size.unwrap_or_else(config::raster_size);
    let white_on_black = args.white_on_black || settings.white_on_black_qr_code_in_dark_mode;
    let rendered = render_text(content, &options);

    let target = out.map(|path| {
        if path.is_dir() {
            path.join(download_filename(content, args.title.as_deref()))
        } else {
            path.to_path_buf()
        }
    });

    match &target {
        Some(path) if is_png(path) => {
            let symbol = rendered?;
            let palette = RasterPalette::resolve(args.dark, white_on_black);
            rasterize(&symbol, size, &palette)
                .save(path)
                .map_err(|e| CliError::Image(path.clone(), e))?;
            info!(path = %path.display(), size, "wrote PNG");
        }
        // SVG output carries the error placeholder, the exit status still reports the failure
        Some(path) => {
            let palette = Palette::resolve(args.dark, white_on_black);
            let document = svg::document_or_error(&rendered, size, size, &palette);
            std::fs::write(path, document).map_err(|e| CliError::Write(path.clone(), e))?;
            rendered?;
            info!(path = %path.display(), size, "wrote SVG");
        }
        None => {
            let palette = Palette::resolve(args.dark, white_on_black);
            println!("{}", svg::document_or_error(&rendered, size, size, &palette));
            rendered?;
        }
    }

    if let Some(service) = service.as_mut().filter(|_| settings.history_enabled) {
        if let Err(err) = history::add_history(service.store_mut(), HistoryKind::Encode, content) {
            warn!(%err, "could not record history");
        }
    }
    Ok(())
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}

fn styles_cmd() {
    println!("Module styles:");
    for name in module_style_names() {
        println!("  {name}");
    }
    println!("Finder styles:");
    for name in finder_style_names() {
        println!("  {name}");
    }
}

fn check_locales_cmd(dir: &Path, source: &str, src: Option<&Path>) -> Result<bool, CliError> {
    let mut clean = true;
    if let Some(src) = src {
        let report = locales::check_sources(src, dir, source)?;
        println!("{}", report.summary());
        for key in &report.missing {
            println!("  missing: {key}");
        }
        for key in &report.unused {
            println!("  unused: {key}");
        }
        clean &= report.is_clean();
    }

    let reports = locales::check_dir(dir, source)?;
    for report in &reports {
        println!("{}", report.summary());
        for key in &report.missing {
            println!("  missing: {key}");
        }
        for key in &report.redundant {
            println!("  redundant: {key}");
        }
        for key in &report.placeholder_mismatch {
            println!("  placeholders differ: {key}");
        }
        clean &= report.is_clean();
    }
    Ok(clean)
}
