//! The weather sample shared by the sampler, the responder and the publisher.

use serde::{Deserialize, Serialize};

use crate::adapters::time;

/// One complete reading of every channel.
///
/// Never mutated after construction; the sampler builds a fresh value each
/// cycle and swaps it into the [`SampleStore`](crate::store::SampleStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// Local time the sample was taken (RFC 3339).
    pub timestamp: String,
    #[serde(serialize_with = "fixed::two")]
    pub altitude_m: f32,
    #[serde(rename = "pressure_kPa", serialize_with = "fixed::four")]
    pub pressure_kpa: f32,
    #[serde(serialize_with = "fixed::two")]
    pub temperature_c: f32,
    #[serde(serialize_with = "fixed::two")]
    pub temperature_f: f32,
    #[serde(serialize_with = "fixed::two")]
    pub humidity_pct: f32,
}

impl WeatherSample {
    /// Build a sample stamped with the current local time. Fahrenheit is
    /// derived from `temperature_c`.
    pub fn new(altitude_m: f32, pressure_kpa: f32, temperature_c: f32, humidity_pct: f32) -> Self {
        Self {
            timestamp: time::local_timestamp(),
            altitude_m,
            pressure_kpa,
            temperature_c,
            temperature_f: celsius_to_fahrenheit(temperature_c),
            humidity_pct,
        }
    }

    /// Flat JSON object with the wire field names.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

/// Before the first cycle completes: current time, every measurement zero.
impl Default for WeatherSample {
    fn default() -> Self {
        Self {
            timestamp: time::local_timestamp(),
            altitude_m: 0.0,
            pressure_kpa: 0.0,
            temperature_c: 0.0,
            temperature_f: 0.0,
            humidity_pct: 0.0,
        }
    }
}

pub fn celsius_to_fahrenheit(c: f32) -> f32 {
    c * 9.0 / 5.0 + 32.0
}

/// Fixed-precision number serializers.
mod fixed {
    use serde::Serializer;

    fn rounded(value: f32, places: i32) -> f64 {
        if !value.is_finite() {
            return 0.0;
        }
        let scale = 10f64.powi(places);
        (f64::from(value) * scale).round() / scale
    }

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn two<S: Serializer>(value: &f32, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(rounded(*value, 2))
    }

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn four<S: Serializer>(value: &f32, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(rounded(*value, 4))
    }
}
