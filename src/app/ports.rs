//! Port traits: the boundary between the station actors and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Sampler / Responder / Publisher
//! ```
//!
//! The bus itself needs no port of its own: the sensor layer consumes
//! `embedded_hal::i2c::I2c` directly. What remains is the status lights and
//! the outbound HTTP client, both of which differ between device and host.

use crate::error::PublishError;

// ───────────────────────────────────────────────────────────────
// Indicator port (domain → status light)
// ───────────────────────────────────────────────────────────────

/// A single on/off activity light.
///
/// Takes `&self` because the responder drives it from many connection
/// threads at once; implementations serialise access internally.
pub trait Indicator: Send + Sync {
    fn set_active(&self, on: bool);
}

/// Used when a board has no light for a given activity.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIndicator;

impl Indicator for NoIndicator {
    fn set_active(&self, _on: bool) {}
}

/// Lights an indicator for as long as the guard lives.
pub struct ActiveGuard<'a> {
    indicator: &'a dyn Indicator,
}

impl<'a> ActiveGuard<'a> {
    pub fn new(indicator: &'a dyn Indicator) -> Self {
        indicator.set_active(true);
        Self { indicator }
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.indicator.set_active(false);
    }
}

// ───────────────────────────────────────────────────────────────
// Publish port (domain → cloud endpoint)
// ───────────────────────────────────────────────────────────────

/// Outbound HTTP POST used by the cloud publisher.
///
/// Implementations send `body` as `application/json` with the given
/// `Authorization` header value and return the response status. Any status
/// outside `200..300` is reported as [`PublishError::Status`].
pub trait PublishPort: Send {
    fn post(&mut self, uri: &str, authorization: &str, body: &str) -> Result<u16, PublishError>;
}

/// Map a raw status code to the port's result convention.
pub fn check_status(status: u16) -> Result<u16, PublishError> {
    if (200..300).contains(&status) {
        Ok(status)
    } else {
        Err(PublishError::Status(status))
    }
}
