//! Snapshot responder over loopback TCP.

use std::io::{Read, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use weatherstation::actor::ActorHandle;
use weatherstation::adapters::sim_bus::SimulatedShield;
use weatherstation::sample::WeatherSample;
use weatherstation::server::SnapshotResponder;
use weatherstation::store::SampleStore;

use crate::mock_hw::{
    CountingLight, Station, fast_config, header, http_exchange, http_get, http_silent,
    split_response,
};

fn loopback() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 0))
}

fn serve(store: Arc<SampleStore>) -> (SocketAddr, ActorHandle) {
    let responder = SnapshotResponder::bind_addr(loopback(), store).expect("bind loopback");
    let addr = responder.local_addr().unwrap();
    (addr, responder.spawn().expect("spawn responder"))
}

fn body_of(response: &str) -> WeatherSample {
    let (status, headers, body) = split_response(response);
    assert_eq!(status, "HTTP/1.1 200 OK");
    assert_eq!(header(&headers, "Content-Type"), Some("text/json"));
    assert_eq!(
        header(&headers, "Content-Length").and_then(|v| v.parse::<usize>().ok()),
        Some(body.len())
    );
    serde_json::from_str(body).expect("body is a complete sample")
}

// ── Before the first cycle ────────────────────────────────────

#[test]
fn serves_zeroed_default_before_any_cycle() {
    let store = Arc::new(SampleStore::default());
    let (addr, handle) = serve(Arc::clone(&store));

    let sample = body_of(&http_get(addr));
    assert_eq!(sample.temperature_c, 0.0);
    assert_eq!(sample.temperature_f, 0.0);
    assert_eq!(sample.humidity_pct, 0.0);
    assert_eq!(sample.pressure_kpa, 0.0);
    assert_eq!(sample.altitude_m, 0.0);
    assert!(!sample.timestamp.is_empty());

    handle.stop();
}

#[test]
fn body_uses_wire_field_names() {
    let store = Arc::new(SampleStore::default());
    let (addr, handle) = serve(store);

    let response = http_get(addr);
    let (_, _, body) = split_response(&response);
    let json: serde_json::Value = serde_json::from_str(body).unwrap();
    for key in [
        "timestamp",
        "altitude_m",
        "pressure_kPa",
        "temperature_c",
        "temperature_f",
        "humidity_pct",
    ] {
        assert!(json.get(key).is_some(), "missing {key} in {body}");
    }

    handle.stop();
}

// ── Request handling ──────────────────────────────────────────

#[test]
fn method_and_path_are_ignored() {
    let store = Arc::new(SampleStore::default());
    let (addr, handle) = serve(store);

    for request in [
        &b"POST /anything?x=1 HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc"[..],
        b"DELETE /weather HTTP/1.0\r\n\r\n",
        b"not http at all\r\n",
    ] {
        body_of(&http_exchange(addr, request));
    }

    handle.stop();
}

#[test]
fn body_sent_after_the_headers_does_not_cost_the_response() {
    let store = Arc::new(SampleStore::default());
    let (addr, handle) = serve(store);

    let mut stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream
        .write_all(b"POST /reading HTTP/1.1\r\nContent-Length: 5\r\n\r\n")
        .unwrap();
    thread::sleep(Duration::from_millis(100));
    stream.write_all(b"hello").unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    let sample = body_of(&response);
    assert_eq!(sample.temperature_c, 0.0);

    handle.stop();
}

#[test]
fn empty_request_still_gets_a_response() {
    let store = Arc::new(SampleStore::default());
    let (addr, handle) = serve(store);

    body_of(&http_silent(addr));

    handle.stop();
}

// ── Live data ─────────────────────────────────────────────────

#[test]
fn reflects_the_latest_cycle() {
    let station = Station::new(SimulatedShield::new(18.0, 72.0, 99_500.0), &fast_config());
    let (addr, handle) = serve(Arc::clone(&station.store));

    station.sampler.run_cycle();
    let sample = body_of(&http_get(addr));
    assert!((sample.temperature_c - 18.0).abs() < 0.02);
    assert!((sample.temperature_f - 64.4).abs() < 0.02);
    assert!((sample.humidity_pct - 72.0).abs() < 0.02);
    assert!((sample.pressure_kpa - 99.5).abs() < 1e-4);

    handle.stop();
}

#[test]
fn concurrent_requests_during_cycles_all_get_whole_samples() {
    let station = Station::new(SimulatedShield::new(0.0, 0.0, 101_325.0), &fast_config());
    let (addr, handle) = serve(Arc::clone(&station.store));

    let writer = thread::spawn(move || {
        for i in 0..100 {
            station.set_environment(i as f32, i as f32);
            station.sampler.run_cycle();
        }
    });

    let clients: Vec<_> = (0..4)
        .map(|_| {
            thread::spawn(move || {
                for _ in 0..25 {
                    let sample = body_of(&http_get(addr));
                    assert!((sample.temperature_c - sample.humidity_pct).abs() < 0.05);
                }
            })
        })
        .collect();

    for c in clients {
        c.join().unwrap();
    }
    writer.join().unwrap();
    handle.stop();
}

// ── Indicator and lifecycle ───────────────────────────────────

#[test]
fn light_toggles_once_per_response() {
    let store = Arc::new(SampleStore::default());
    let light = Arc::new(CountingLight::default());
    let responder = SnapshotResponder::bind_addr(loopback(), store)
        .unwrap()
        .with_indicator(Arc::<CountingLight>::clone(&light));
    let addr = responder.local_addr().unwrap();
    let handle = responder.spawn().unwrap();

    http_get(addr);
    http_get(addr);
    handle.stop();

    // The connection thread switches the light off after closing the socket.
    let deadline = Instant::now() + Duration::from_secs(2);
    while light.off_count() < 2 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(light.on_count(), 2);
    assert_eq!(light.off_count(), 2);
    assert!(!light.is_lit());
}

#[test]
fn accept_pending_without_clients_dispatches_nothing() {
    let store = Arc::new(SampleStore::default());
    let responder = SnapshotResponder::bind_addr(loopback(), store).unwrap();
    assert_eq!(responder.accept_pending(), 0);
}

#[test]
fn stopped_responder_releases_its_thread() {
    let store = Arc::new(SampleStore::default());
    let (addr, handle) = serve(store);
    body_of(&http_get(addr));

    assert!(!handle.is_finished());
    assert_eq!(handle.name(), "http");
    let started = Instant::now();
    handle.stop();
    assert!(started.elapsed() < Duration::from_secs(1), "accept loop slow to stop");
}
