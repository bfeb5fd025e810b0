//! embassy-time driver for ESP-IDF.
//!
//! Every `async_io_mini::Timer` the actors sleep on resolves through the two
//! driver symbols below. `now` is the 1 MHz `esp_timer`, which matches the
//! embassy-time default tick rate. Wakeups are served by one alarm thread
//! parked on a condvar until the earliest deadline.

use core::task::Waker;
use core::time::Duration;
use std::sync::{Condvar, Mutex, MutexGuard, Once, PoisonError};

use log::error;

const ALARM_STACK_KB: usize = 4;

struct Alarm {
    at: u64,
    waker: Waker,
}

static ALARMS: Mutex<Vec<Alarm>> = Mutex::new(Vec::new());
static ALARM_CHANGED: Condvar = Condvar::new();
static ALARM_THREAD: Once = Once::new();

fn alarms() -> MutexGuard<'static, Vec<Alarm>> {
    ALARMS.lock().unwrap_or_else(PoisonError::into_inner)
}

#[unsafe(no_mangle)]
fn _embassy_time_now() -> u64 {
    // SAFETY: esp_timer is running before app_main is entered.
    let micros = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
    micros.max(0) as u64
}

#[unsafe(no_mangle)]
fn _embassy_time_schedule_wake(at: u64, waker: &Waker) {
    ALARM_THREAD.call_once(|| {
        let spawned = std::thread::Builder::new()
            .name("time-alarm".into())
            .stack_size(ALARM_STACK_KB * 1024)
            .spawn(run_alarms);
        if let Err(e) = spawned {
            error!("Timer: alarm thread not started: {}", e);
        }
    });

    let mut pending = alarms();
    match pending.iter_mut().find(|a| a.waker.will_wake(waker)) {
        Some(alarm) => alarm.at = alarm.at.min(at),
        None => pending.push(Alarm {
            at,
            waker: waker.clone(),
        }),
    }
    drop(pending);
    ALARM_CHANGED.notify_one();
}

fn run_alarms() {
    let mut pending = alarms();
    loop {
        let now = _embassy_time_now();
        let mut due = Vec::new();
        pending.retain(|a| {
            if a.at <= now {
                due.push(a.waker.clone());
                false
            } else {
                true
            }
        });

        if !due.is_empty() {
            // Wake without the lock; woken tasks may re-arm immediately.
            drop(pending);
            due.into_iter().for_each(Waker::wake);
            pending = alarms();
            continue;
        }

        let earliest = pending.iter().map(|a| a.at).min();
        pending = match earliest {
            Some(next) => {
                let idle = Duration::from_micros(next - now);
                ALARM_CHANGED
                    .wait_timeout(pending, idle)
                    .map_or_else(|e| e.into_inner().0, |(guard, _)| guard)
            }
            None => ALARM_CHANGED
                .wait(pending)
                .unwrap_or_else(PoisonError::into_inner),
        };
    }
}
