//! Station configuration parameters
//!
//! All tunable parameters for the weather station. The device binary embeds
//! a JSON document at build time; tests build configs in code.

use serde::{Deserialize, Serialize};

use crate::cloud::message::{ChannelSpec, Measure};
use crate::error::ConfigError;

/// Core station configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    // --- Sampling ---
    /// Sampling cycle period (milliseconds)
    pub sample_interval_ms: u32,
    /// Maximum wait for the bus lock before a cycle is skipped (milliseconds)
    pub bus_lock_timeout_ms: u32,
    /// Conversion settle time for the pressure sensor (milliseconds)
    pub pressure_settle_ms: u32,

    // --- Snapshot responder ---
    /// TCP port the snapshot responder listens on
    pub http_port: u16,

    // --- Cloud ---
    /// Message publish period (milliseconds)
    pub publish_interval_ms: u32,
    /// Signing token renewal period (seconds)
    pub token_renew_interval_secs: u32,
    /// Lifetime of each signing token (seconds)
    pub token_ttl_secs: u32,
    pub cloud: CloudSettings,
    /// Channels forwarded to the cloud, in send order.
    pub channels: Vec<ChannelSpec>,

    // --- Network ---
    pub wifi: WifiSettings,
}

/// Event Hub credentials and publisher identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudSettings {
    pub namespace: String,
    pub hub_name: String,
    pub key_name: String,
    pub key: String,
    pub display_name: String,
    pub organization: String,
    pub location: String,
}

impl CloudSettings {
    /// Every field is required before anything is signed or sent.
    pub fn is_complete(&self) -> bool {
        [
            &self.namespace,
            &self.hub_name,
            &self.key_name,
            &self.key,
            &self.display_name,
            &self.organization,
            &self.location,
        ]
        .iter()
        .all(|s| !s.is_empty())
    }

    /// `https://<namespace>.servicebus.windows.net/<hub>/publishers/<display_name>/messages`
    pub fn resource_uri(&self) -> String {
        format!(
            "https://{}.servicebus.windows.net/{}/publishers/{}/messages",
            self.namespace, self.hub_name, self.display_name
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiSettings {
    pub ssid: String,
    pub password: String,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            // Sampling
            sample_interval_ms: 2000,
            bus_lock_timeout_ms: 1000,
            pressure_settle_ms: 10,

            // Snapshot responder
            http_port: 50001,

            // Cloud
            publish_interval_ms: 2000,
            token_renew_interval_secs: 15 * 60,
            token_ttl_secs: 20 * 60,
            cloud: CloudSettings::default(),
            channels: default_channels(),

            wifi: WifiSettings::default(),
        }
    }
}

/// Altitude, humidity and pressure. Temperature has no channel identifier
/// assigned yet, so it is left out until one is configured.
pub fn default_channels() -> Vec<ChannelSpec> {
    vec![
        ChannelSpec::new("2298a348-e2f9-4438-ab23-82a3930662ab", Measure::Altitude),
        ChannelSpec::new("2298a348-e2f9-4438-ab23-82a3930662ac", Measure::Humidity),
        ChannelSpec::new("2298a348-e2f9-4438-ab23-82a3930662ad", Measure::Pressure),
    ]
}

impl StationConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json(doc: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(doc).map_err(|_| ConfigError::Malformed)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Range checks. Cloud credentials are not checked here: an incomplete
    /// [`CloudSettings`] disables publishing rather than the station.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("sample_interval_ms must be > 0"));
        }
        if self.bus_lock_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("bus_lock_timeout_ms must be > 0"));
        }
        // A skipped cycle has to give up before the next one is due.
        if self.bus_lock_timeout_ms >= self.sample_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "bus_lock_timeout_ms must be below sample_interval_ms",
            ));
        }
        if self.http_port == 0 {
            return Err(ConfigError::ValidationFailed("http_port must be non-zero"));
        }
        if self.publish_interval_ms == 0 || self.token_renew_interval_secs == 0 {
            return Err(ConfigError::ValidationFailed("publish intervals must be > 0"));
        }
        if self.token_ttl_secs <= self.token_renew_interval_secs {
            return Err(ConfigError::ValidationFailed(
                "token_ttl_secs must exceed token_renew_interval_secs",
            ));
        }
        Ok(())
    }
}
