//! Per-channel telemetry messages in the ConnectTheDots layout.

use serde::{Deserialize, Serialize};

use crate::config::CloudSettings;
use crate::sample::WeatherSample;

/// Which sample field a cloud channel carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Measure {
    Altitude,
    Humidity,
    Pressure,
    Temperature,
}

impl Measure {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Altitude => "Altitude",
            Self::Humidity => "Humidity",
            Self::Pressure => "Pressure",
            Self::Temperature => "Temperature",
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Self::Altitude => "m",
            Self::Humidity => "%RH",
            Self::Pressure => "kPa",
            Self::Temperature => "C",
        }
    }

    pub fn value_from(self, sample: &WeatherSample) -> f32 {
        match self {
            Self::Altitude => sample.altitude_m,
            Self::Humidity => sample.humidity_pct,
            Self::Pressure => sample.pressure_kpa,
            Self::Temperature => sample.temperature_c,
        }
    }
}

/// A configured cloud channel: stable identifier plus what it measures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub channel_id: String,
    pub measure: Measure,
}

impl ChannelSpec {
    pub fn new(channel_id: impl Into<String>, measure: Measure) -> Self {
        Self {
            channel_id: channel_id.into(),
            measure,
        }
    }
}

/// Body of one POST to the event hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedMessage {
    #[serde(rename = "guid")]
    pub channel_id: String,
    #[serde(rename = "displayname")]
    pub display_name: String,
    pub organization: String,
    pub location: String,
    #[serde(rename = "measurename")]
    pub measure_name: String,
    #[serde(rename = "unitofmeasure")]
    pub unit: String,
    pub value: f32,
    /// UTC, round-trip format.
    #[serde(rename = "timecreated")]
    pub timestamp_utc: String,
}

impl SignedMessage {
    pub fn new(
        channel: &ChannelSpec,
        settings: &CloudSettings,
        sample: &WeatherSample,
        timestamp_utc: &str,
    ) -> Self {
        Self {
            channel_id: channel.channel_id.clone(),
            display_name: settings.display_name.clone(),
            organization: settings.organization.clone(),
            location: settings.location.clone(),
            measure_name: channel.measure.name().into(),
            unit: channel.measure.unit().into(),
            value: channel.measure.value_from(sample),
            timestamp_utc: timestamp_utc.into(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}
