//! Global hotkeys: `esc` cancels the run, `p` logs the cursor position.

use crate::geometry::Point;
use crate::input::report_cursor_position;
use crate::window::TargetWindow;
use device_query::{DeviceQuery as _, DeviceState, Keycode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const POLL_PERIOD: Duration = Duration::from_millis(50);

/// Spawns the listener thread.
///
/// The thread polls the global key state independently of the click loop, so
/// `esc` registers even while an attempt is mid-gesture; the loop itself only
/// honors the flag at attempt boundaries. The thread resolves its own window
/// handle from the title for the relative-position report; if that fails it
/// still reports absolute positions.
pub fn spawn_listener(window_title: String, cancel: Arc<AtomicBool>) {
    thread::spawn(move || {
        let device_state = DeviceState::new();
        let window = match TargetWindow::find(&window_title) {
            Ok(window) => Some(window),
            Err(err) => {
                debug!(%err, "hotkey thread has no window handle");
                None
            }
        };

        let mut p_held = false;
        loop {
            let keys = device_state.get_keys();
            if keys.contains(&Keycode::Escape) {
                warn!("cancel signal detected!!");
                cancel.store(true, Ordering::Relaxed);
                return;
            }

            // Edge-triggered so holding `p` logs once.
            let p_down = keys.contains(&Keycode::P);
            if p_down && !p_held {
                let (x, y) = device_state.get_mouse().coords;
                let rect = window.as_ref().and_then(|w| w.rect().ok());
                report_cursor_position(Point::new(x, y), rect);
            }
            p_held = p_down;

            thread::sleep(POLL_PERIOD);
        }
    });
}
