use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use services::{AppServices, Clock, ExportService, LessonConfig, LessonService};
use tracing_subscriber::EnvFilter;
use ui::{App, UiApp, build_app_context};
use url::Url;

const DEFAULT_DB_URL: &str = "sqlite://eco_responders.sqlite3";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidShareUrl { raw: String },
    InvalidAutosaveMs { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidShareUrl { raw } => write!(f, "invalid --share-url value: {raw}"),
            ArgsError::InvalidAutosaveMs { raw } => {
                write!(f, "invalid --autosave-ms value: {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct DesktopApp {
    services: AppServices,
}

impl UiApp for DesktopApp {
    fn lesson(&self) -> Arc<LessonService> {
        self.services.lesson()
    }

    fn exports(&self) -> Arc<ExportService> {
        self.services.exports()
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    resume: Option<String>,
    config: LessonConfig,
    log_level: Option<String>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] [--resume <code_or_link>]");
    eprintln!("                      [--share-url <url>] [--export-dir <dir>]");
    eprintln!("                      [--autosave-ms <ms>] [--log-level <filter>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --share-url {}", services::config::DEFAULT_SHARE_BASE_URL);
    eprintln!("  --export-dir .");
    eprintln!("  --autosave-ms 200");
    eprintln!("  --log-level {DEFAULT_LOG_LEVEL} (RUST_LOG is used when the flag is absent)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LESSON_DB_URL, LESSON_SHARE_URL, LESSON_EXPORT_DIR, LESSON_RESUME");
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut config = LessonConfig::default();
        let mut db_url = env_value("LESSON_DB_URL")
            .map_or_else(|| DEFAULT_DB_URL.to_owned(), normalize_sqlite_url);
        let mut resume = env_value("LESSON_RESUME");
        let mut log_level = None;
        if let Some(share_url) = env_value("LESSON_SHARE_URL") {
            config.share_base_url = parse_share_url(share_url)?;
        }
        if let Some(dir) = env_value("LESSON_EXPORT_DIR") {
            config.export_dir = PathBuf::from(dir);
        }

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--resume" => {
                    resume = Some(require_value(args, "--resume")?);
                }
                "--share-url" => {
                    let value = require_value(args, "--share-url")?;
                    config.share_base_url = parse_share_url(value)?;
                }
                "--export-dir" => {
                    config.export_dir = PathBuf::from(require_value(args, "--export-dir")?);
                }
                "--autosave-ms" => {
                    let value = require_value(args, "--autosave-ms")?;
                    let millis: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidAutosaveMs { raw: value.clone() })?;
                    config.autosave_delay = Duration::from_millis(millis);
                }
                "--log-level" => {
                    log_level = Some(require_value(args, "--log-level")?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            resume,
            config,
            log_level,
        })
    }
}

fn parse_share_url(raw: String) -> Result<String, ArgsError> {
    match Url::parse(raw.trim()) {
        Ok(url) => Ok(url.into()),
        Err(_) => Err(ArgsError::InvalidShareUrl { raw }),
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Applies a resume link or bare code given at launch. Failures are logged and the
/// saved progress is kept.
async fn apply_launch_resume(lesson: &LessonService, raw: &str) {
    match Url::parse(raw.trim()) {
        Ok(link) => {
            let stripped = lesson.apply_resume_link(&link).await;
            tracing::debug!(link = %stripped, "launch link processed");
        }
        Err(_) => match lesson.apply_resume_code(raw).await {
            Ok(applied) => tracing::debug!(applied, "launch resume code processed"),
            Err(err) => tracing::warn!(error = %err, "ignoring launch resume code"),
        },
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing(parsed.log_level.as_deref());

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, parsed.config, Clock::system()).await?;
    tracing::info!(
        db = %parsed.db_url,
        export_dir = %services.config().export_dir.display(),
        "lesson services ready"
    );

    if let Some(raw) = parsed.resume.as_deref() {
        apply_launch_resume(&services.lesson(), raw).await;
    }

    let app: Arc<dyn UiApp> = Arc::new(DesktopApp { services });
    let context = build_app_context(&app);

    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("Eco-Responders")
            .with_always_on_top(false),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
