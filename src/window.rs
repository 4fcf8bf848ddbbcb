//! Locates the mirroring window and maps fractional coordinates into it.

use crate::geometry::{Point, Rectangle};
use anyhow::{bail, Context as _};
use tracing::debug;

/// The OS window being automated. The handle is resolved once; its geometry
/// is deliberately NOT cached: every query goes back to the OS so that a
/// moved or resized window is transparently tolerated.
pub struct TargetWindow {
    inner: xcap::Window,
}

impl TargetWindow {
    /// Resolves a window by exact title match.
    pub fn find(title: &str) -> anyhow::Result<Self> {
        let windows = xcap::Window::all().context("failed to enumerate windows")?;
        for window in windows {
            if window.title().map(|t| t == title).unwrap_or(false) {
                let found = Self { inner: window };
                debug!(title, rect = ?found.rect()?, "found target window");
                return Ok(found);
            }
        }
        bail!(
            "cannot find window {title:?}; \
             maybe the mobile is not connected or the window name is wrong"
        );
    }

    /// Current window bounds, re-queried from the OS on every call.
    pub fn rect(&self) -> anyhow::Result<Rectangle> {
        let left = self.inner.x()?;
        let top = self.inner.y()?;
        let width = self.inner.width()?;
        let height = self.inner.height()?;
        Ok(Rectangle::new(
            left,
            top,
            left + width as i32,
            top + height as i32,
        ))
    }

    /// Absolute screen point at fractional offsets into the current window.
    pub fn position(&self, fx: f64, fy: f64) -> anyhow::Result<Point> {
        Ok(self.rect()?.at(fx, fy))
    }

    /// Absolute screen region at fractional offsets into the current window.
    pub fn area(&self, lf: f64, tf: f64, rf: f64, bf: f64) -> anyhow::Result<Rectangle> {
        Ok(self.rect()?.region(lf, tf, rf, bf))
    }
}
