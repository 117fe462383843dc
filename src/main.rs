//! Clickpoint -- hotkey-driven mouse automation daemon for Windows.
//!
//! Entry point and daemon lifecycle: load the settings and the point list,
//! bind hotkeys, then dispatch actions until the process is terminated.

mod config;
// The portable core is exercised by the Windows composition root and the
// test suite; platforms without an input backend only run the config path.
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
mod controller;
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
mod dispatch;
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
mod hotkey;
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
mod platform;
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
mod point;

use std::path::PathBuf;
use std::process::ExitCode;

use thiserror::Error;

use crate::config::ConfigError;
use crate::hotkey::RegistryError;

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[allow(dead_code)] // constructed only by the Windows composition root
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("usage: clickpoint [settings.toml]")]
    Usage,
    #[cfg(not(target_os = "windows"))]
    #[error("no input backend for this platform; clickpoint runs on Windows only")]
    UnsupportedPlatform,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("clickpoint v{}", env!("CARGO_PKG_VERSION"));

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), AppError> {
    let mut args = std::env::args_os().skip(1);
    let settings_path: Option<PathBuf> = args.next().map(PathBuf::from);
    if args.next().is_some() {
        return Err(AppError::Usage);
    }

    let settings = config::load_settings(settings_path.as_deref())?;
    let points_path = settings
        .points_file
        .clone()
        .unwrap_or_else(config::default_points_path);
    let points = config::load_points(&points_path)?;
    log::info!(
        "loaded {} points from {} (strategy {:?})",
        points.len(),
        points_path.display(),
        settings.strategy
    );

    serve(settings, points)
}

/// Builds the Windows backends and runs the controller until the process
/// is terminated. Hotkey resources are per-process; the OS reclaims them
/// on exit.
#[cfg(target_os = "windows")]
fn serve(settings: config::Settings, points: Vec<point::ActionPoint>) -> Result<(), AppError> {
    use std::sync::mpsc;

    use crate::controller::Controller;
    use crate::dispatch::ActionDispatcher;
    use crate::platform::windows;

    let (fired_tx, fired_rx) = mpsc::channel();
    // The callback runs on the registry thread; a channel send keeps it
    // fast enough for the hook path.
    let registry = windows::HotkeyRegistry::new(Box::new(move |tag| {
        let _ = fired_tx.send(tag);
    }))?;

    let dispatcher = ActionDispatcher::new(
        windows::create_injector(settings.strategy),
        windows::create_screen_geometry(),
        windows::create_active_window(),
    );

    let mut controller = Controller::new(points, Box::new(registry), dispatcher, fired_rx);
    let bound = controller.rebind()?;
    log::info!("{bound} hotkeys bound; waiting for triggers");
    controller.run();
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn serve(_settings: config::Settings, _points: Vec<point::ActionPoint>) -> Result<(), AppError> {
    Err(AppError::UnsupportedPlatform)
}
