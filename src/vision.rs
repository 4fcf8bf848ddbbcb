//! Pixel sampling and the "is a delivery slot free" decision rule.
//!
//! The free/taken distinction is purely typographic: when a slot is taken its
//! label is rendered in a light grey, when it opens up the label turns dark.
//! So the rule is: grab the label region, binarize it, and see whether enough
//! dark pixels show up. The cutoffs below were tuned against one app's font
//! rendering; changing them changes behavior, so they stay as they are.

use crate::geometry::Rectangle;
use anyhow::Context as _;
use image::{imageops, GrayImage};
use std::path::PathBuf;
use tracing::debug;
use xcap::Monitor;

/// A pixel with luma at or below this is counted as dark.
pub const DARK_LUMA_CUTOFF: u8 = 127;
/// A region is "ready" iff it has strictly more dark pixels than this.
pub const READY_PIXEL_COUNT: u32 = 20;

/// Number of stacked delivery-time-slot rows to scan.
pub const SLOT_COUNT: usize = 5;
/// Vertical distance between slot rows, as a fraction of window height.
pub const SLOT_ROW_STRIDE: f64 = 0.055;
/// The first slot's label area, as fractions of the window rectangle.
pub const SLOT_REGION: (f64, f64, f64, f64) = (0.36, 0.48, 0.7, 0.52);

/// The candidate label regions for slots `0..SLOT_COUNT`: the first slot's
/// region stacked downward by `SLOT_ROW_STRIDE` of the window height.
pub fn slot_regions(first: Rectangle, window_height: i32) -> Vec<Rectangle> {
    (0..SLOT_COUNT)
        .map(|i| first.offset(0, (window_height as f64 * SLOT_ROW_STRIDE * i as f64) as i32))
        .collect()
}

pub fn count_dark_pixels(region: &GrayImage) -> u32 {
    region.pixels().filter(|p| p[0] <= DARK_LUMA_CUTOFF).count() as u32
}

/// The decision rule itself, separated from capture so it can be exercised
/// on synthetic images.
pub fn is_ready(region: &GrayImage) -> bool {
    count_dark_pixels(region) > READY_PIXEL_COUNT
}

/// Scans the candidate regions in order and returns the index of the first
/// one whose sample passes the readiness rule, or `None` when every slot
/// misses. Sampling is injected so the scan itself needs no display.
pub fn first_ready_slot<F>(regions: &[Rectangle], mut sample: F) -> anyhow::Result<Option<usize>>
where
    F: FnMut(usize, Rectangle) -> anyhow::Result<GrayImage>,
{
    for (slot, &region) in regions.iter().enumerate() {
        let sampled = sample(slot, region)?;
        debug!(slot, dark = count_dark_pixels(&sampled), "dark pixels");
        if is_ready(&sampled) {
            return Ok(Some(slot));
        }
    }
    Ok(None)
}

/// Captures the given screen rectangle and converts it to grayscale.
///
/// The capture comes from the monitor containing the region's top-left
/// corner. On HiDPI screens the captured image is larger than the monitor's
/// logical size, so the rectangle is rescaled into image space before
/// cropping.
pub fn capture_region(rect: Rectangle) -> anyhow::Result<GrayImage> {
    let monitor = Monitor::from_point(rect.left, rect.top)
        .with_context(|| format!("no monitor contains point ({}, {})", rect.left, rect.top))?;
    let image = monitor.capture_image().context("screen capture failed")?;

    let local = rect.offset(-monitor.x()?, -monitor.y()?);
    let scale_x = image.width() as f64 / monitor.width()? as f64;
    let scale_y = image.height() as f64 / monitor.height()? as f64;
    let local = Rectangle::new(
        (local.left as f64 * scale_x) as i32,
        (local.top as f64 * scale_y) as i32,
        (local.right as f64 * scale_x) as i32,
        (local.bottom as f64 * scale_y) as i32,
    );

    let x = local.left.clamp(0, image.width() as i32 - 1) as u32;
    let y = local.top.clamp(0, image.height() as i32 - 1) as u32;
    let width = (local.width().max(1) as u32).min(image.width() - x);
    let height = (local.height().max(1) as u32).min(image.height() - y);
    debug!(?rect, ?local, "sampling screen region");

    let cropped = imageops::crop_imm(&image, x, y, width, height).to_image();
    Ok(imageops::grayscale(&cropped))
}

/// Writes a sampled region to the temp directory so the thresholds can be
/// inspected after a run. Only used at debug level > 0.
pub fn save_debug_region(region: &GrayImage, slot: usize) -> anyhow::Result<PathBuf> {
    let path = std::env::temp_dir().join(format!("slotwatch-slot-{slot}.png"));
    region
        .save(&path)
        .with_context(|| format!("failed to write debug capture {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn region_with_dark_pixels(count: u32) -> GrayImage {
        let mut img = GrayImage::from_pixel(30, 10, Luma([255u8]));
        for i in 0..count {
            img.put_pixel(i % 30, i / 30, Luma([0u8]));
        }
        img
    }

    #[test]
    fn ready_requires_strictly_more_than_the_cutoff() {
        assert!(!is_ready(&region_with_dark_pixels(0)));
        assert!(!is_ready(&region_with_dark_pixels(READY_PIXEL_COUNT)));
        assert!(is_ready(&region_with_dark_pixels(READY_PIXEL_COUNT + 1)));
    }

    #[test]
    fn luma_cutoff_is_inclusive_on_the_dark_side() {
        let mut img = GrayImage::from_pixel(10, 10, Luma([255u8]));
        for x in 0..10 {
            for y in 0..5 {
                img.put_pixel(x, y, Luma([DARK_LUMA_CUTOFF]));
            }
        }
        assert_eq!(count_dark_pixels(&img), 50);

        let light = GrayImage::from_pixel(10, 10, Luma([DARK_LUMA_CUTOFF + 1]));
        assert_eq!(count_dark_pixels(&light), 0);
    }

    #[test]
    fn slot_regions_are_stacked_by_window_height_fraction() {
        let window = Rectangle::new(100, 100, 500, 700);
        let (lf, tf, rf, bf) = SLOT_REGION;
        let regions = slot_regions(window.region(lf, tf, rf, bf), window.height());
        assert_eq!(regions.len(), SLOT_COUNT);
        assert_eq!(regions[0], Rectangle::new(244, 388, 380, 412));

        // 600 px tall window: one row stride is trunc(600 * 0.055) = 33 px.
        for (i, region) in regions.iter().enumerate() {
            assert_eq!(region.top - regions[0].top, 33 * i as i32);
            assert_eq!(region.width(), regions[0].width());
            assert_eq!(region.height(), regions[0].height());
        }
    }

    fn test_regions() -> Vec<Rectangle> {
        let window = Rectangle::new(100, 100, 500, 700);
        let (lf, tf, rf, bf) = SLOT_REGION;
        slot_regions(window.region(lf, tf, rf, bf), window.height())
    }

    #[test]
    fn scan_identifies_the_first_ready_slot() {
        let regions = test_regions();
        let mut sampled = Vec::new();
        let ready = first_ready_slot(&regions, |slot, region| {
            sampled.push(region);
            Ok(if slot == 2 {
                region_with_dark_pixels(READY_PIXEL_COUNT + 1)
            } else {
                region_with_dark_pixels(READY_PIXEL_COUNT)
            })
        })
        .unwrap();
        assert_eq!(ready, Some(2));
        // The scan stops at the first hit and walks the regions in order.
        assert_eq!(sampled.as_slice(), &regions[..3]);
    }

    #[test]
    fn scan_misses_when_every_slot_is_at_or_below_the_cutoff() {
        let regions = test_regions();
        let mut calls = 0;
        let ready = first_ready_slot(&regions, |_, _| {
            calls += 1;
            Ok(region_with_dark_pixels(READY_PIXEL_COUNT))
        })
        .unwrap();
        assert_eq!(ready, None);
        assert_eq!(calls, SLOT_COUNT);
    }
}
