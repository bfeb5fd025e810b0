//! Weather station firmware library.
//!
//! ```text
//!            ┌──────────────┐   bus lock    ┌──────────────────────┐
//!  I2C ◀────▶│ WeatherShield│◀──────────────│  SamplingScheduler   │
//!            └──────────────┘               └──────────┬───────────┘
//!                                                      │ swap
//!                                              ┌───────▼───────┐
//!                             ┌───────────────▶│  SampleStore  │◀──────────────┐
//!                             │                └───────────────┘               │
//!                   ┌─────────┴─────────┐                          ┌───────────┴─────────┐
//!                   │ SnapshotResponder │                          │   CloudPublisher    │
//!                   │  HTTP :50001      │                          │  SAS-signed POSTs   │
//!                   └───────────────────┘                          └─────────────────────┘
//! ```
//!
//! Everything here builds and tests on the host. ESP-IDF specific code is
//! gated on `target_os = "espidf"`; the `espidf` feature only enables the
//! device binary and its build-time environment.

#![deny(unused_must_use)]

// Host timer driver behind `async_io_mini::Timer`.
#[cfg(not(target_os = "espidf"))]
use embassy_time as _;

pub mod actor;
pub mod adapters;
pub mod app;
pub mod cloud;
pub mod config;
pub mod error;
pub mod sample;
pub mod scheduler;
pub mod sensors;
pub mod server;
pub mod store;
