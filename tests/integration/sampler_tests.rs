//! Sampling scheduler against the simulated shield: atomic publication,
//! bounded lock waits, per-channel sentinels and the actor lifecycle.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use weatherstation::adapters::sim_bus::{Fault, SimulatedShield};
use weatherstation::sample::WeatherSample;
use weatherstation::scheduler::{CycleOutcome, SamplingScheduler};

use crate::mock_hw::{CountingLight, Station, fast_config};

fn published(outcome: CycleOutcome) -> Arc<WeatherSample> {
    match outcome {
        CycleOutcome::Published(sample) => sample,
        CycleOutcome::Skipped => panic!("cycle was skipped"),
    }
}

// ── Snapshot consistency ──────────────────────────────────────

#[test]
fn readers_never_observe_a_mixed_sample() {
    let station = Station::new(SimulatedShield::new(0.0, 0.0, 101_325.0), &fast_config());
    let store = Arc::clone(&station.store);

    // Temperature and humidity move together, so a sample mixing two
    // cycles would show them apart.
    let writer = thread::spawn(move || {
        for i in 0..100 {
            station.set_environment(i as f32, i as f32);
            published(station.sampler.run_cycle());
        }
        station.store.generation()
    });

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..25 {
                    let json = store.load().to_json();
                    let sample: WeatherSample =
                        serde_json::from_str(&json).expect("snapshot is complete JSON");
                    assert!(
                        (sample.temperature_c - sample.humidity_pct).abs() < 0.05,
                        "mixed sample: {json}"
                    );
                    let f = sample.temperature_c * 9.0 / 5.0 + 32.0;
                    assert!((sample.temperature_f - f).abs() < 0.02, "F/C mismatch: {json}");
                    thread::yield_now();
                }
            })
        })
        .collect();

    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(writer.join().unwrap(), 100);

    let last = store.load();
    assert!((last.temperature_c - 99.0).abs() < 0.02);
    assert!((last.humidity_pct - 99.0).abs() < 0.02);
}

#[test]
fn published_sample_is_the_stored_one() {
    let station = Station::new(SimulatedShield::new(21.5, 40.0, 100_000.0), &fast_config());
    let sample = published(station.sampler.run_cycle());
    assert!(Arc::ptr_eq(&sample, &station.store.load()));
    assert!((sample.pressure_kpa - 100.0).abs() < 1e-3);
}

// ── Bus lock ──────────────────────────────────────────────────

#[test]
fn held_bus_skips_the_cycle_and_leaves_the_store() {
    let station = Station::new(SimulatedShield::new(20.0, 50.0, 101_325.0), &fast_config());
    let before = station.store.load();

    let held = futures_lite::future::block_on(station.bus.lock());
    let started = Instant::now();
    let outcome = station.sampler.run_cycle();
    let waited = started.elapsed();
    drop(held);

    assert_eq!(outcome, CycleOutcome::Skipped);
    assert!(waited >= Duration::from_millis(100), "gave up after {waited:?}");
    assert!(waited < Duration::from_secs(1), "waited {waited:?}");
    assert_eq!(station.store.generation(), 0);
    assert!(Arc::ptr_eq(&before, &station.store.load()));
    assert_eq!(station.transactions(), 0, "no transport call without the lock");
}

#[test]
fn released_bus_is_picked_up_by_a_waiting_cycle() {
    let station = Station::new(SimulatedShield::new(20.0, 50.0, 101_325.0), &fast_config());
    let bus = Arc::clone(&station.bus);

    let holder = thread::spawn(move || {
        let _held = futures_lite::future::block_on(bus.lock());
        thread::sleep(Duration::from_millis(30));
    });
    thread::sleep(Duration::from_millis(5));
    let outcome = station.sampler.run_cycle();
    holder.join().unwrap();

    published(outcome);
    assert_eq!(station.store.generation(), 1);
}

#[test]
fn bus_is_free_after_every_cycle() {
    let mut sim = SimulatedShield::new(20.0, 50.0, 101_325.0);
    sim.faults.temperature = Fault::Nack;
    sim.faults.pressure = Fault::Nack;
    let station = Station::new(sim, &fast_config());

    published(station.sampler.run_cycle());
    assert!(station.bus.try_lock().is_ok());
}

// ── Sentinels ─────────────────────────────────────────────────

#[test]
fn corrupt_humidity_frame_reads_zero_and_others_survive() {
    let mut sim = SimulatedShield::new(25.0, 60.0, 101_325.0);
    sim.faults.humidity = Fault::CorruptCrc;
    let sample = published(Station::new(sim, &fast_config()).sampler.run_cycle());

    assert_eq!(sample.humidity_pct, 0.0);
    assert!((sample.temperature_c - 25.0).abs() < 0.02);
    assert!((sample.pressure_kpa - 101.325).abs() < 1e-3);
}

#[test]
fn wrong_channel_temperature_reads_zero_celsius_and_freezing_fahrenheit() {
    let mut sim = SimulatedShield::new(25.0, 60.0, 101_325.0);
    sim.faults.temperature = Fault::WrongStatus;
    let sample = published(Station::new(sim, &fast_config()).sampler.run_cycle());

    assert_eq!(sample.temperature_c, 0.0);
    assert!((sample.temperature_f - 32.0).abs() < 1e-6);
    assert!((sample.humidity_pct - 60.0).abs() < 0.02);
}

#[test]
fn silent_shield_still_publishes_a_zeroed_sample() {
    let mut sim = SimulatedShield::new(25.0, 60.0, 101_325.0);
    sim.faults.temperature = Fault::Nack;
    sim.faults.humidity = Fault::Nack;
    sim.faults.pressure = Fault::Nack;
    let station = Station::new(sim, &fast_config());

    let sample = published(station.sampler.run_cycle());
    assert_eq!(sample.temperature_c, 0.0);
    assert_eq!(sample.humidity_pct, 0.0);
    assert_eq!(sample.pressure_kpa, 0.0);
    assert_eq!(sample.altitude_m, 0.0);
    assert_eq!(station.store.generation(), 1);
}

// ── Indicator ─────────────────────────────────────────────────

#[test]
fn light_is_on_only_while_a_cycle_holds_the_bus() {
    let config = fast_config();
    let station = Station::new(SimulatedShield::new(20.0, 50.0, 101_325.0), &config);
    let light = Arc::new(CountingLight::default());
    let sampler = SamplingScheduler::new(
        Arc::clone(&station.bus),
        Arc::clone(&station.store),
        &config,
    )
    .with_indicator(Arc::<CountingLight>::clone(&light));

    published(sampler.run_cycle());
    assert_eq!(light.on_count(), 1);
    assert_eq!(light.off_count(), 1);
    assert!(!light.is_lit());

    let held = futures_lite::future::block_on(station.bus.lock());
    assert_eq!(sampler.run_cycle(), CycleOutcome::Skipped);
    drop(held);
    assert_eq!(light.on_count(), 1, "a skipped cycle does not light up");
}

// ── Actor lifecycle ───────────────────────────────────────────

#[test]
fn sampler_actor_runs_until_stopped() {
    let station = Station::new(SimulatedShield::new(20.0, 50.0, 101_325.0), &fast_config());
    let store = Arc::clone(&station.store);
    let handle = station.sampler.spawn().expect("spawn sampler");
    assert_eq!(handle.name(), "sampler");

    let deadline = Instant::now() + Duration::from_secs(5);
    while store.generation() < 3 {
        assert!(Instant::now() < deadline, "sampler made no progress");
        thread::sleep(Duration::from_millis(5));
    }

    handle.stop();
    let settled = store.generation();
    thread::sleep(Duration::from_millis(60));
    assert_eq!(store.generation(), settled, "no cycles after stop");
}
