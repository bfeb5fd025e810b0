//! Actor threads: core pinning, stop signals and periodic loops.
//!
//! Each station actor (sampler, responder, publisher) runs on its own thread.
//! On ESP-IDF `std::thread` is a pthread over a FreeRTOS task, and
//! `esp_pthread_set_cfg()` sets the core, priority and stack of the *next*
//! thread created from the calling thread, so the config→spawn pair must not
//! be interleaved with other thread creation on the same thread.
//!
//! Loops wait on an `async_io_mini::Timer` raced against an
//! `embassy_sync::signal::Signal`, so [`ActorHandle::stop`] wakes a sleeping
//! actor immediately instead of waiting out its period.

use core::time::Duration;
use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::{info, warn};

pub type StopSignal = Signal<CriticalSectionRawMutex, ()>;

/// CPU core identifiers for the ESP32-S3 Xtensa LX7 dual-core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU): Wi-Fi and lwIP.
    Pro = 0,
    /// Core 1 (APP_CPU): sampling.
    App = 1,
}

/// Where and how an actor thread is created.
#[derive(Debug, Clone, Copy)]
pub struct ActorSpec {
    /// Null-terminated task name, e.g. `"sampler\0"`.
    pub name: &'static str,
    pub core: Core,
    pub priority: u8,
    pub stack_kb: usize,
}

impl ActorSpec {
    pub fn display_name(&self) -> &'static str {
        self.name.trim_end_matches('\0')
    }
}

/// Spawn a thread pinned to a specific core with explicit priority and stack.
#[cfg(target_os = "espidf")]
pub fn spawn_on_core(
    spec: ActorSpec,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    // SAFETY: the config struct lives for the duration of the call and the
    // name is a 'static null-terminated string.
    unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = spec.core as i32;
        cfg.prio = spec.priority as _;
        cfg.stack_size = (spec.stack_kb * 1024) as _;
        cfg.thread_name = spec.name.as_ptr().cast();
        let ret = esp_idf_sys::esp_pthread_set_cfg(&cfg);
        if ret != esp_idf_sys::ESP_OK as i32 {
            return Err(io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")));
        }
    }

    info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        spec.display_name(),
        spec.core,
        spec.priority,
        spec.stack_kb
    );

    std::thread::Builder::new()
        .name(spec.display_name().into())
        .spawn(f)
}

/// Simulation fallback. Ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(
    spec: ActorSpec,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    info!(
        "Spawning '{}' (sim, no core pinning, stack={}KB)",
        spec.display_name(),
        spec.stack_kb
    );

    std::thread::Builder::new()
        .name(spec.display_name().into())
        .stack_size(spec.stack_kb * 1024)
        .spawn(f)
}

/// Sleep for `period` unless stopped first. Returns `true` on stop.
pub async fn sleep_or_stop(stop: &StopSignal, period: Duration) -> bool {
    futures_lite::future::or(
        async {
            stop.wait().await;
            true
        },
        async {
            async_io_mini::Timer::after(period).await;
            false
        },
    )
    .await
}

/// A running actor thread.
pub struct ActorHandle {
    name: &'static str,
    stop: Arc<StopSignal>,
    thread: Option<JoinHandle<()>>,
}

impl ActorHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Signal the actor and wait for its thread to exit.
    pub fn stop(mut self) {
        self.stop.signal(());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Actor '{}' panicked before stopping", self.name);
            } else {
                info!("Actor '{}' stopped", self.name);
            }
        }
    }
}

/// Spawn an actor whose body owns its loop and watches `stop` itself.
pub fn spawn(
    spec: ActorSpec,
    body: impl FnOnce(&StopSignal) + Send + 'static,
) -> io::Result<ActorHandle> {
    let stop = Arc::new(StopSignal::new());
    let signal = Arc::clone(&stop);
    let thread = spawn_on_core(spec, move || body(&signal))?;
    Ok(ActorHandle {
        name: spec.display_name(),
        stop,
        thread: Some(thread),
    })
}

/// Deadline of the tick after the one due at `due`, as seen at `now`.
///
/// Ticks keep a fixed rate from the first one. A tick that overran its
/// slot drops the missed ones and restarts the schedule from `now`.
pub fn next_deadline(due: Instant, period: Duration, now: Instant) -> Instant {
    let next = due + period;
    if next < now { now } else { next }
}

/// Spawn an actor that runs `tick` immediately and then once per `period`,
/// measured start to start.
pub fn spawn_periodic(
    spec: ActorSpec,
    period: Duration,
    mut tick: impl FnMut() + Send + 'static,
) -> io::Result<ActorHandle> {
    spawn(spec, move |stop| {
        futures_lite::future::block_on(async {
            let mut due = Instant::now();
            loop {
                tick();
                let now = Instant::now();
                due = next_deadline(due, period, now);
                if sleep_or_stop(stop, due.saturating_duration_since(now)).await {
                    break;
                }
            }
        });
    })
}
