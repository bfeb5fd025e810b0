//! Mock hardware and network adapters for integration tests.
//!
//! The shield is the crate's own `SimulatedShield`; this module adds the
//! wiring around it plus a recording publish port and a counting light so
//! tests can assert on everything the actors did.

use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use weatherstation::adapters::sim_bus::SimulatedShield;
use weatherstation::adapters::time::StdDelay;
use weatherstation::app::ports::{Indicator, PublishPort};
use weatherstation::cloud::message::Measure;
use weatherstation::config::{CloudSettings, StationConfig};
use weatherstation::error::PublishError;
use weatherstation::scheduler::{BusLock, SamplingScheduler};
use weatherstation::sensors::WeatherShield;
use weatherstation::store::SampleStore;

pub type SimBus = BusLock<SimulatedShield, StdDelay>;

// ── Station wiring ────────────────────────────────────────────

pub struct Station {
    pub bus: Arc<SimBus>,
    pub store: Arc<SampleStore>,
    pub sampler: SamplingScheduler<SimulatedShield, StdDelay>,
}

#[allow(dead_code)]
impl Station {
    pub fn new(sim: SimulatedShield, config: &StationConfig) -> Self {
        let bus = Arc::new(SimBus::new(WeatherShield::with_settle_ms(sim, StdDelay, 0)));
        let store = Arc::new(SampleStore::default());
        let sampler = SamplingScheduler::new(Arc::clone(&bus), Arc::clone(&store), config);
        Self {
            bus,
            store,
            sampler,
        }
    }

    /// Change the simulated environment between cycles.
    pub fn set_environment(&self, temperature_c: f32, humidity_pct: f32) {
        let mut shield = futures_lite::future::block_on(self.bus.lock());
        let sim = shield.bus_mut();
        sim.temperature_c = temperature_c;
        sim.humidity_pct = humidity_pct;
    }

    pub fn transactions(&self) -> u32 {
        futures_lite::future::block_on(self.bus.lock())
            .bus_mut()
            .transactions
    }
}

/// Fast periods and a short lock timeout so tests do not wait on defaults.
pub fn fast_config() -> StationConfig {
    StationConfig {
        sample_interval_ms: 200,
        bus_lock_timeout_ms: 100,
        publish_interval_ms: 20,
        ..StationConfig::default()
    }
}

pub fn complete_cloud() -> CloudSettings {
    CloudSettings {
        namespace: "weather-ns".into(),
        hub_name: "ehdevices".into(),
        key_name: "D1".into(),
        key: "test-key-1234".into(),
        display_name: "station-1".into(),
        organization: "Contoso Labs".into(),
        location: "Redmond".into(),
    }
}

pub fn cloud_config() -> StationConfig {
    StationConfig {
        cloud: complete_cloud(),
        ..fast_config()
    }
}

// ── Recording publish port ────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Posted {
    pub uri: String,
    pub authorization: String,
    pub body: serde_json::Value,
}

impl Posted {
    pub fn measure_name(&self) -> &str {
        self.body["measurename"].as_str().unwrap_or_default()
    }
}

/// Records every request; can be told to fail one measure or to answer
/// with a fixed status.
#[derive(Clone)]
pub struct RecordingPoster {
    pub posted: Arc<Mutex<Vec<Posted>>>,
    fail_measure: Option<Measure>,
    status: u16,
}

#[allow(dead_code)]
impl RecordingPoster {
    pub fn new() -> Self {
        Self {
            posted: Arc::new(Mutex::new(Vec::new())),
            fail_measure: None,
            status: 201,
        }
    }

    pub fn failing(measure: Measure) -> Self {
        Self {
            fail_measure: Some(measure),
            ..Self::new()
        }
    }

    pub fn answering(status: u16) -> Self {
        Self {
            status,
            ..Self::new()
        }
    }

    pub fn requests(&self) -> Vec<Posted> {
        self.posted.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.posted.lock().unwrap().len()
    }
}

impl PublishPort for RecordingPoster {
    fn post(&mut self, uri: &str, authorization: &str, body: &str) -> Result<u16, PublishError> {
        let posted = Posted {
            uri: uri.to_owned(),
            authorization: authorization.to_owned(),
            body: serde_json::from_str(body).expect("publisher sent invalid JSON"),
        };
        let fail = self
            .fail_measure
            .is_some_and(|m| posted.measure_name() == m.name());
        self.posted.lock().unwrap().push(posted);

        if fail {
            return Err(PublishError::Connect);
        }
        weatherstation::app::ports::check_status(self.status)
    }
}

// ── Counting light ────────────────────────────────────────────

#[derive(Default)]
pub struct CountingLight {
    pub on: AtomicU32,
    pub off: AtomicU32,
    pub lit: AtomicBool,
}

#[allow(dead_code)]
impl CountingLight {
    pub fn on_count(&self) -> u32 {
        self.on.load(Ordering::SeqCst)
    }

    pub fn off_count(&self) -> u32 {
        self.off.load(Ordering::SeqCst)
    }

    pub fn is_lit(&self) -> bool {
        self.lit.load(Ordering::SeqCst)
    }
}

impl Indicator for CountingLight {
    fn set_active(&self, on: bool) {
        if on {
            self.on.fetch_add(1, Ordering::SeqCst);
        } else {
            self.off.fetch_add(1, Ordering::SeqCst);
        }
        self.lit.store(on, Ordering::SeqCst);
    }
}

// ── Raw HTTP client ───────────────────────────────────────────

/// Send `request` verbatim and read until the server closes.
#[allow(dead_code)]
pub fn http_exchange(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).expect("connect to responder");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream.write_all(request).unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    response
}

#[allow(dead_code)]
pub fn http_get(addr: SocketAddr) -> String {
    http_exchange(addr, b"GET / HTTP/1.1\r\nHost: station\r\n\r\n")
}

/// Connect, send nothing, half-close, and read the response.
#[allow(dead_code)]
pub fn http_silent(addr: SocketAddr) -> String {
    let mut stream = TcpStream::connect(addr).expect("connect to responder");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream.shutdown(Shutdown::Write).unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    response
}

/// Split a response into (status line, headers, body).
#[allow(dead_code)]
pub fn split_response(response: &str) -> (&str, Vec<(&str, &str)>, &str) {
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("response has no header terminator");
    let mut lines = head.split("\r\n");
    let status = lines.next().unwrap_or_default();
    let headers = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect();
    (status, headers, body)
}

#[allow(dead_code)]
pub fn header<'a>(headers: &[(&'a str, &'a str)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| *v)
}
