use anyhow::Result;
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

mod clicker;
mod geometry;
mod hotkeys;
mod input;
mod vision;
mod window;

use crate::clicker::{run_loop, CartClicker, Clicker as _};
use crate::input::InputDriver;
use crate::window::TargetWindow;

#[derive(Parser)]
#[command(name = "slotwatch")]
#[command(about = "Watches a mirrored mobile window for a free delivery slot and clicks through checkout")]
#[command(version)]
struct Cli {
    /// Title of the mobile-mirroring window to automate.
    name: String,

    /// Debug-level log verbosity.
    #[arg(long)]
    verbose: bool,

    /// Observation-only mode: never clicks, just logs the cursor position
    /// under the `p` hotkey until `esc`. Use it to calibrate the fractional
    /// position constants.
    #[arg(long)]
    study: bool,

    /// If > 1, run exactly one attempt with an interactive pause between
    /// steps. If > 0, additionally dump each sampled region as a PNG.
    #[arg(long = "debuglevel", default_value_t = 0)]
    debug_level: i32,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let verbose = args.verbose || args.study;

    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env()?,
        )
        .with_target(false)
        .init();

    // Window not found is a configuration error: fail before touching input.
    let window = TargetWindow::find(&args.name)?;

    let cancel = Arc::new(AtomicBool::new(false));
    hotkeys::spawn_listener(args.name.clone(), cancel.clone());

    if args.study {
        info!("study mode: press p to log the cursor position, esc to exit");
        while !cancel.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_millis(100));
        }
        return Ok(());
    }

    let driver = InputDriver::new(window, args.debug_level)?;
    if args.debug_level > 1 {
        driver.cursor_position();
    }
    let mut clicker = CartClicker::new(driver);

    if args.debug_level > 1 {
        // One manually stepped attempt instead of the loop.
        let secured = clicker.check_one()?;
        info!(secured, "single attempt finished");
    } else {
        run_loop(&mut clicker, &cancel)?;
    }
    Ok(())
}
