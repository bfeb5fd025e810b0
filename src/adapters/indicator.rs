//! Status LED adapter.
//!
//! Wraps any `embedded_hal::digital::OutputPin` as an
//! [`Indicator`](crate::app::ports::Indicator). The board carries a blue LED
//! lit while the sampler holds the bus and a green LED lit while a snapshot
//! response is being written.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::Indicator;

pub struct PinIndicator<P> {
    pin: Mutex<CriticalSectionRawMutex, RefCell<P>>,
    label: &'static str,
}

impl<P: OutputPin> PinIndicator<P> {
    pub fn new(pin: P, label: &'static str) -> Self {
        Self {
            pin: Mutex::new(RefCell::new(pin)),
            label,
        }
    }
}

impl<P: OutputPin + Send> Indicator for PinIndicator<P> {
    fn set_active(&self, on: bool) {
        let result = self.pin.lock(|p| {
            let mut p = p.borrow_mut();
            if on { p.set_high() } else { p.set_low() }
        });
        if let Err(e) = result {
            warn!("LED: {} pin write failed: {:?}", self.label, e);
        }
    }
}
