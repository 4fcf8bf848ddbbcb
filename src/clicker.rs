//! The per-attempt click sequence and the outer polling loop.

use crate::input::InputDriver;
use crate::vision;
use anyhow::Result;
use std::io::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One attempt against the target app. Returns true once the purchase went
/// through; false means "nothing available this round, try again".
pub trait Clicker {
    fn check_one(&mut self) -> Result<bool>;
}

/// Fractional position of the drag-down refresh gesture.
const DRAG_DOWN_POS: (f64, f64) = (0.5, 0.3);
/// Fractional position of the "submit cart" button.
const SUBMIT_CART_POS: (f64, f64) = (0.85, 0.85);
/// Fractional position of the "pay" button.
const PAY_POS: (f64, f64) = (0.8, 0.9);

const SETTLE_GESTURE: Duration = Duration::from_millis(500);
const SETTLE_CLICK: Duration = Duration::from_millis(500);
const SETTLE_BACK: Duration = Duration::from_millis(200);
const SETTLE_REFRESH: Duration = Duration::from_secs(1);

/// Drives a grocery app's shopping-cart checkout inside the mirrored window:
/// refresh the cart, walk to the pay screen, look for a free delivery time
/// slot, and either pay or back out and wait for the next round.
pub struct CartClicker {
    driver: InputDriver,
}

impl CartClicker {
    pub fn new(driver: InputDriver) -> Self {
        Self { driver }
    }

    fn refresh(&mut self) -> Result<()> {
        info!("refreshing shopping cart page");
        let pos = self.driver.window().position(DRAG_DOWN_POS.0, DRAG_DOWN_POS.1)?;
        let distance = self.driver.window().rect()?.height() / 3;
        self.driver.drag_down(pos, distance, SETTLE_GESTURE)?;
        thread::sleep(SETTLE_REFRESH);
        Ok(())
    }

    /// Scans the stacked slot regions top to bottom and selects the first
    /// one whose label has turned dark by clicking its center.
    fn check_slots(&mut self) -> Result<Option<usize>> {
        let window_height = self.driver.window().rect()?.height();
        let (lf, tf, rf, bf) = vision::SLOT_REGION;
        let first = self.driver.window().area(lf, tf, rf, bf)?;
        let regions = vision::slot_regions(first, window_height);
        debug!(slots = vision::SLOT_COUNT, "checking delivery time slots");

        let debug_level = self.driver.debug_level();
        let ready = vision::first_ready_slot(&regions, |slot, region| {
            debug!(slot, ?region, "checking slot region");
            let sample = vision::capture_region(region)?;
            if debug_level > 0 {
                let path = vision::save_debug_region(&sample, slot)?;
                debug!(slot, path = %path.display(), "sampled region written");
                thread::sleep(Duration::from_secs(1));
            }
            Ok(sample)
        })?;

        match ready {
            Some(slot) => {
                warn!(slot, "pay is ready!");
                self.driver.click(regions[slot].middle(), SETTLE_CLICK)?;
                Ok(Some(slot))
            }
            None => {
                info!("sigh.. no delivery time slot");
                Ok(None)
            }
        }
    }
}

impl Clicker for CartClicker {
    fn check_one(&mut self) -> Result<bool> {
        self.refresh()?;

        self.driver.pause()?;
        let submit_cart = self
            .driver
            .window()
            .position(SUBMIT_CART_POS.0, SUBMIT_CART_POS.1)?;
        self.driver.click(submit_cart, SETTLE_CLICK)?;

        self.driver.pause()?;
        let pay = self.driver.window().position(PAY_POS.0, PAY_POS.1)?;
        self.driver.click(pay, SETTLE_CLICK)?;

        self.driver.pause()?;
        if self.check_slots()?.is_some() {
            // A slot is selected; confirm the payment.
            self.driver.click(pay, SETTLE_CLICK)?;
            return Ok(true);
        }

        // Back out to the shopping cart page for the next round.
        self.driver.back(SETTLE_BACK)?;
        self.driver.back(SETTLE_BACK)?;
        Ok(false)
    }
}

/// Runs attempts until one succeeds or the cancel flag is raised.
///
/// The flag is read once per iteration, after the attempt has finished: an
/// in-progress sequence of clicks and sleeps always runs to completion.
/// Returns true if a slot was secured.
pub fn run_loop<C: Clicker>(clicker: &mut C, cancel: &AtomicBool) -> Result<bool> {
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        debug!(attempt, "starting attempt");
        if clicker.check_one()? {
            warn!(attempt, "slot secured, ringing until cancelled (press esc)");
            ring_until_cancelled(cancel);
            return Ok(true);
        }
        if cancel.load(Ordering::Relaxed) {
            warn!("cancel signal detected, stopping");
            return Ok(false);
        }
    }
}

const RING_PERIOD: Duration = Duration::from_millis(100);

/// Repeats the terminal bell until the cancel flag is raised, so an
/// unattended success does not go unnoticed.
fn ring_until_cancelled(cancel: &AtomicBool) {
    while !cancel.load(Ordering::Relaxed) {
        eprint!("\x07");
        let _ = std::io::stderr().flush();
        thread::sleep(RING_PERIOD);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    /// Scripted attempts: pops the next outcome per call and optionally
    /// raises the cancel flag mid-attempt at a given call number.
    struct ScriptedClicker {
        outcomes: Vec<bool>,
        calls: usize,
        cancel: Arc<AtomicBool>,
        cancel_on_call: Option<usize>,
    }

    impl Clicker for ScriptedClicker {
        fn check_one(&mut self) -> Result<bool> {
            self.calls += 1;
            if self.cancel_on_call == Some(self.calls) {
                self.cancel.store(true, Ordering::Relaxed);
            }
            Ok(self.outcomes.remove(0))
        }
    }

    #[test]
    fn cancel_raised_mid_attempt_stops_after_that_attempt() {
        let cancel = Arc::new(AtomicBool::new(false));
        let mut clicker = ScriptedClicker {
            outcomes: vec![false; 10],
            calls: 0,
            cancel: cancel.clone(),
            cancel_on_call: Some(3),
        };
        let secured = run_loop(&mut clicker, &cancel).unwrap();
        assert!(!secured);
        assert_eq!(clicker.calls, 3);
    }

    #[test]
    fn cancel_raised_before_the_loop_still_finishes_one_attempt() {
        let cancel = Arc::new(AtomicBool::new(true));
        let mut clicker = ScriptedClicker {
            outcomes: vec![false; 10],
            calls: 0,
            cancel: cancel.clone(),
            cancel_on_call: None,
        };
        let secured = run_loop(&mut clicker, &cancel).unwrap();
        assert!(!secured);
        assert_eq!(clicker.calls, 1);
    }

    #[test]
    fn ring_exits_promptly_once_cancelled() {
        let cancel = AtomicBool::new(true);
        let started = std::time::Instant::now();
        ring_until_cancelled(&cancel);
        assert!(started.elapsed() < RING_PERIOD);
    }

    #[test]
    fn loop_retries_until_success() {
        let cancel = Arc::new(AtomicBool::new(false));
        let mut clicker = ScriptedClicker {
            outcomes: vec![false, false, true],
            calls: 0,
            cancel: cancel.clone(),
            // Pre-raise cancel during the winning attempt so the success
            // bell exits immediately under test.
            cancel_on_call: Some(3),
        };
        let secured = run_loop(&mut clicker, &cancel).unwrap();
        assert!(secured);
        assert_eq!(clicker.calls, 3);
    }
}
