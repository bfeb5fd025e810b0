//! Fuzz target: HTU21D and MPL3115A2 frame decoding
//!
//! Treats the input as a sequence of 3-byte frames and runs each through
//! both HTU21D channels and the pressure decoder. Asserts that nothing
//! panics and that accepted values are physically plausible.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use weatherstation::sensors::htu21d::{Channel, decode_frame};
use weatherstation::sensors::mpl3115a2::{PressureReading, assemble_raw};

fuzz_target!(|data: &[u8]| {
    for chunk in data.chunks_exact(3) {
        let frame = [chunk[0], chunk[1], chunk[2]];

        for channel in [Channel::Temperature, Channel::Humidity] {
            if let Ok(raw) = decode_frame(frame, channel) {
                assert_eq!(raw & 0x03, 0, "status bits leaked into the value");
                let value = channel.convert(raw);
                assert!(value.is_finite());
                assert!((-47.0..=129.0).contains(&value), "out of range: {value}");
            }
        }

        let reading = PressureReading::from_raw(assemble_raw(frame));
        assert!(reading.pressure_pa >= 0.0);
        assert!(reading.altitude_m.is_finite() || reading.pressure_pa == 0.0);
    }
});
