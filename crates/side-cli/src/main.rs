use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use side_core::actions::HostEvent;
use side_core::actions::ShellAction;
use side_core::actions::UserAction;
use side_core::config::Preferences;
use side_core::persistence::PreferencesStore;
use side_core::persistence::SessionStore;
use side_core::state::Notice;
use side_core::state::NoticeLevel;
use side_core::state::ShellState;
use side_exec::host::LocalHost;
use tracing_subscriber::EnvFilter;

mod bridge;
mod highlight;
mod ui;

use bridge::HostBridge;
use ui::Stores;

const LOG_FILE: &str = "side.log";

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Default, PartialEq)]
struct Args {
    path: Option<PathBuf>,
    config_dir: Option<PathBuf>,
    verbose: bool,
}

enum Invocation {
    Help,
    Version,
    Open(Args),
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = match parse_args(env::args().skip(1).collect())? {
        Invocation::Help => {
            print_help();
            return Ok(());
        }
        Invocation::Version => {
            println!("side {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Invocation::Open(args) => args,
    };

    let config_dir = match args.config_dir.clone() {
        Some(dir) => dir,
        None => dirs::config_dir()
            .map(|dir| dir.join("side"))
            .ok_or("no config directory on this platform; pass --config DIR")?,
    };
    fs::create_dir_all(&config_dir)?;
    init_logging(&config_dir, args.verbose)?;

    let preferences_store = PreferencesStore::open(&config_dir)?;
    let session_store = SessionStore::open(&config_dir)?;
    let (preferences, startup_notice) = load_preferences(&preferences_store);
    let session = session_store.load().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "ignoring unreadable session");
        Default::default()
    });
    tracing::info!(config = %config_dir.display(), "starting side");

    let startup = startup_actions(args.path, session.last_opened_folder)?;
    let mut state = ShellState::new(preferences);
    state.notice = startup_notice;
    let bridge = HostBridge::new(Arc::new(LocalHost));
    let stores = Stores {
        preferences: preferences_store,
        session: session_store,
    };
    ui::run(state, bridge, stores, startup)
}

/// An unreadable preferences file falls back to defaults; the notice tells
/// the user why their settings are missing.
fn load_preferences(store: &PreferencesStore) -> (Preferences, Option<Notice>) {
    match store.load() {
        Ok(preferences) => (preferences, None),
        Err(err) => {
            tracing::warn!(
                error = %err,
                path = %store.path().display(),
                "ignoring unreadable preferences"
            );
            let notice = Notice {
                level: NoticeLevel::Error,
                message: format!("Preferences not loaded, using defaults: {err}"),
            };
            (Preferences::default(), Some(notice))
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<Invocation, Box<dyn std::error::Error>> {
    let mut parsed = Args::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => return Ok(Invocation::Help),
            "--version" | "-V" => return Ok(Invocation::Version),
            "--verbose" | "-v" => {
                parsed.verbose = true;
                i += 1;
            }
            "--config" => {
                let Some(value) = args.get(i + 1) else {
                    return Err("--config requires a directory".into());
                };
                parsed.config_dir = Some(PathBuf::from(value));
                i += 2;
            }
            other if other.starts_with('-') => {
                return Err(format!("unsupported argument: {other}").into());
            }
            other => {
                if parsed.path.is_some() {
                    return Err(format!("unexpected extra path: {other}").into());
                }
                parsed.path = Some(PathBuf::from(other));
                i += 1;
            }
        }
    }
    Ok(Invocation::Open(parsed))
}

/// A folder argument opens that folder, a file argument opens its parent and
/// then the file. Without an argument the last opened folder is restored when
/// it still exists.
fn startup_actions(
    path: Option<PathBuf>,
    last_opened_folder: Option<PathBuf>,
) -> Result<Vec<ShellAction>, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(last_opened_folder
            .filter(|folder| folder.is_dir())
            .map(|folder| vec![ShellAction::Host(HostEvent::FolderOpened(folder))])
            .unwrap_or_default());
    };
    let path = path
        .canonicalize()
        .map_err(|err| format!("cannot open {}: {err}", path.display()))?;
    if path.is_dir() {
        return Ok(vec![ShellAction::Host(HostEvent::FolderOpened(path))]);
    }
    let mut actions = Vec::new();
    if let Some(parent) = path.parent() {
        actions.push(ShellAction::Host(HostEvent::FolderOpened(
            parent.to_path_buf(),
        )));
    }
    actions.push(ShellAction::User(UserAction::SelectFile { path, line: None }));
    Ok(actions)
}

/// The terminal belongs to the UI, so process logs go to a file next to the
/// preferences.
fn init_logging(dir: &std::path::Path, verbose: bool) -> std::io::Result<()> {
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE))?;
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_env("SIDE_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

fn print_help() {
    println!("side {}", env!("CARGO_PKG_VERSION"));
    println!("Usage:");
    println!("  side [PATH] [--config DIR] [--verbose]");
    println!("  side --help");
    println!("  side --version");
    println!();
    println!("Keys:");
    println!("  Ctrl+O open folder    Ctrl+P open file      Ctrl+S save    Alt+S save as");
    println!("  Ctrl+W close tab      Alt+Left/Right tabs   Ctrl+F search  Ctrl+J terminal");
    println!("  F2 preferences        Ctrl+D theme          F5 refresh     Ctrl+Y copy path");
    println!("  F6 / Shift+Tab focus  F12 logs              Esc dismiss notice");
    println!("  Ctrl+Q quit");
}
