//! Adapters: concrete implementations of the port traits and bus seams.
//!
//! | Adapter       | Implements               | Connects to                  |
//! |---------------|--------------------------|------------------------------|
//! | `http_client` | PublishPort              | ESP-IDF HTTPS / host TCP     |
//! | `indicator`   | Indicator                | Status LED GPIO (OutputPin)  |
//! | `sim_bus`     | embedded_hal I2c         | Simulated weather shield     |
//! | `time`        | embedded_hal DelayNs     | OS scheduler, wall clock     |
//! | `time_driver` | embassy-time driver      | esp_timer (device only)      |
//! | `wifi`        | none                     | ESP-IDF WiFi STA             |

pub mod http_client;
pub mod indicator;
pub mod sim_bus;
pub mod time;
#[cfg(target_os = "espidf")]
mod time_driver;
pub mod wifi;
