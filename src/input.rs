//! Simulated mouse gestures against the mirroring window.

use crate::geometry::{Point, Rectangle};
use crate::window::TargetWindow;
use anyhow::Context as _;
use device_query::{DeviceQuery as _, DeviceState};
use enigo::{Button, Coordinate, Direction, Enigo, Mouse as _, Settings};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Where to park the cursor before a "back" right-click if it has wandered
/// outside the window, as fractions of the window rectangle.
const BACK_SAFE_POS: (f64, f64) = (0.7, 0.96);

/// Mouse/cursor primitives plus the target window they are aimed at.
///
/// Each gesture ends with a fixed settle sleep so the mirrored app's UI
/// animation can catch up before the next one lands.
pub struct InputDriver {
    enigo: Enigo,
    device_state: DeviceState,
    window: TargetWindow,
    debug_level: i32,
}

impl InputDriver {
    pub fn new(window: TargetWindow, debug_level: i32) -> anyhow::Result<Self> {
        Ok(Self {
            enigo: Enigo::new(&Settings::default()).context("failed to initialize enigo")?,
            device_state: DeviceState::new(),
            window,
            debug_level,
        })
    }

    pub fn window(&self) -> &TargetWindow {
        &self.window
    }

    pub fn debug_level(&self) -> i32 {
        self.debug_level
    }

    pub fn move_to(&mut self, pos: Point) -> anyhow::Result<()> {
        debug!(?pos, "moving mouse");
        self.enigo.move_mouse(pos.x, pos.y, Coordinate::Abs)?;
        Ok(())
    }

    pub fn click(&mut self, pos: Point, settle: Duration) -> anyhow::Result<()> {
        debug!(?pos, "clicking");
        self.enigo.move_mouse(pos.x, pos.y, Coordinate::Abs)?;
        self.enigo.button(Button::Left, Direction::Click)?;
        thread::sleep(settle);
        Ok(())
    }

    /// Drag-down gesture, the usual page-refresh motion for a mobile app.
    /// Synthesized by hand as move + press + move + release; the one-shot
    /// drag helpers in input-simulation crates have a habit of mis-clicking.
    pub fn drag_down(&mut self, pos: Point, distance: i32, settle: Duration) -> anyhow::Result<()> {
        debug!(?pos, distance, "dragging down");
        self.enigo.move_mouse(pos.x, pos.y, Coordinate::Abs)?;
        self.enigo.button(Button::Left, Direction::Press)?;
        self.enigo.move_mouse(pos.x, pos.y + distance, Coordinate::Abs)?;
        self.enigo.button(Button::Left, Direction::Release)?;
        thread::sleep(settle);
        Ok(())
    }

    /// Android back: the mirroring app maps a right-click to the back
    /// gesture. Right-clicks land at the current cursor position, so if the
    /// cursor has left the window, park it at a known-safe spot first.
    pub fn back(&mut self, settle: Duration) -> anyhow::Result<()> {
        debug!("android back");
        let pos = self.cursor_position();
        if !pos.is_in(self.window.rect()?) {
            let safe = self.window.position(BACK_SAFE_POS.0, BACK_SAFE_POS.1)?;
            self.move_to(safe)?;
        }
        self.enigo.button(Button::Right, Direction::Click)?;
        thread::sleep(settle);
        Ok(())
    }

    pub fn cursor_position(&self) -> Point {
        let (x, y) = self.device_state.get_mouse().coords;
        let pos = Point::new(x, y);
        debug!(?pos, "cursor at");
        pos
    }

    /// Blocks on a console prompt between steps so a run can be stepped
    /// manually. Only active at debug level > 1.
    pub fn pause(&self) -> anyhow::Result<()> {
        if self.debug_level > 1 {
            self.cursor_position();
            inquire::Confirm::new("Continue to the next step?")
                .with_default(true)
                .prompt()?;
        }
        Ok(())
    }

}

/// Logs a cursor position, window-relative when it falls inside the tracked
/// window. The relative factors are what gets pasted into the fractional
/// position constants, so this is the main tool for calibrating them.
pub fn report_cursor_position(pos: Point, window_rect: Option<Rectangle>) {
    match window_rect {
        Some(rect) if pos.is_in(rect) => {
            let rel = pos.offset(-rect.left, -rect.top);
            let factor = (
                rel.x as f64 / rect.width() as f64,
                rel.y as f64 / rect.height() as f64,
            );
            info!(absolute = ?pos, relative = ?rel, ?factor, "cursor position");
        }
        _ => info!(absolute = ?pos, "cursor position (outside window)"),
    }
}
