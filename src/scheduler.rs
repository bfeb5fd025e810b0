//! Sampling scheduler: the only writer of the [`SampleStore`].
//!
//! ```text
//!   Idle ──tick──▶ acquire bus (bounded) ──timeout──▶ Skipped ──▶ Idle
//!                        │
//!                        ▼
//!        humidity → temperature → pressure/altitude
//!                        │
//!                        ▼
//!        new WeatherSample ──swap──▶ SampleStore ──▶ Published ──▶ Idle
//! ```
//!
//! The bus lock is an async mutex so the wait can be raced against a timer.
//! The guard is scoped to the cycle and drops on every exit path.

use core::time::Duration;
use std::io;
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{error, info, warn};

use crate::actor::{self, ActorHandle, ActorSpec, Core};
use crate::app::ports::{ActiveGuard, Indicator, NoIndicator};
use crate::config::StationConfig;
use crate::error::BusError;
use crate::sample::WeatherSample;
use crate::sensors::{ShieldReadout, WeatherShield};
use crate::store::SampleStore;

/// Exclusive access to the sensor shield.
pub type BusLock<I, D> = Mutex<CriticalSectionRawMutex, WeatherShield<I, D>>;

pub type BusGuard<'a, I, D> = MutexGuard<'a, CriticalSectionRawMutex, WeatherShield<I, D>>;

const SAMPLER: ActorSpec = ActorSpec {
    name: "sampler\0",
    core: Core::App,
    priority: 10,
    stack_kb: 16,
};

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The bus stayed busy past the timeout; the store was not touched.
    Skipped,
    /// A new sample is in the store.
    Published(Arc<WeatherSample>),
}

/// Wait up to `timeout` for the bus. `None` on timeout.
pub async fn acquire<I, D>(bus: &BusLock<I, D>, timeout: Duration) -> Option<BusGuard<'_, I, D>> {
    futures_lite::future::or(async { Some(bus.lock().await) }, async {
        async_io_mini::Timer::after(timeout).await;
        None
    })
    .await
}

pub struct SamplingScheduler<I, D> {
    bus: Arc<BusLock<I, D>>,
    store: Arc<SampleStore>,
    indicator: Arc<dyn Indicator>,
    period: Duration,
    lock_timeout: Duration,
}

impl<I, D> SamplingScheduler<I, D>
where
    I: I2c + Send + 'static,
    D: DelayNs + Send + 'static,
{
    pub fn new(bus: Arc<BusLock<I, D>>, store: Arc<SampleStore>, config: &StationConfig) -> Self {
        Self {
            bus,
            store,
            indicator: Arc::new(NoIndicator),
            period: Duration::from_millis(u64::from(config.sample_interval_ms)),
            lock_timeout: Duration::from_millis(u64::from(config.bus_lock_timeout_ms)),
        }
    }

    /// Light shown while a cycle holds the bus.
    pub fn with_indicator(mut self, indicator: Arc<dyn Indicator>) -> Self {
        self.indicator = indicator;
        self
    }

    pub fn store(&self) -> &Arc<SampleStore> {
        &self.store
    }

    /// One full acquisition cycle.
    pub fn run_cycle(&self) -> CycleOutcome {
        let Some(mut shield) = futures_lite::future::block_on(acquire(&self.bus, self.lock_timeout))
        else {
            warn!(
                "Sampler: bus busy for {} ms, cycle skipped",
                self.lock_timeout.as_millis()
            );
            return CycleOutcome::Skipped;
        };
        let _lit = ActiveGuard::new(&*self.indicator);

        let sample = assemble(shield.read_all());
        CycleOutcome::Published(self.store.replace(sample))
    }

    /// Run cycles on the configured period until stopped.
    pub fn spawn(self) -> io::Result<ActorHandle> {
        info!(
            "Sampler: every {} ms, bus timeout {} ms",
            self.period.as_millis(),
            self.lock_timeout.as_millis()
        );
        let period = self.period;
        actor::spawn_periodic(SAMPLER, period, move || {
            self.run_cycle();
        })
    }
}

fn or_sentinel(channel: &str, reading: Result<f32, BusError>) -> f32 {
    reading.unwrap_or_else(|e| {
        error!("Sampler: {} read failed: {}", channel, e);
        0.0
    })
}

/// Build a sample from one readout. Failed channels read as zero.
fn assemble(readout: ShieldReadout) -> WeatherSample {
    let humidity = or_sentinel("humidity", readout.humidity_pct);
    let temperature = or_sentinel("temperature", readout.temperature_c);
    let (pressure_kpa, altitude_m) = match readout.pressure {
        Ok(p) => (p.pressure_pa / 1000.0, p.altitude_m),
        Err(e) => {
            error!("Sampler: pressure read failed: {}", e);
            (0.0, 0.0)
        }
    };
    WeatherSample::new(altitude_m, pressure_kpa, temperature, humidity)
}
