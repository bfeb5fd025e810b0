//! Cloud publisher: forwards the latest sample to an Azure Event Hub.
//!
//! Two periods run on one actor thread:
//!
//! | Period          | Default | Action                                          |
//! |-----------------|---------|-------------------------------------------------|
//! | publish         | 2 s     | one POST per configured channel                 |
//! | token renewal   | 15 min  | new [`SigningToken`] valid for 20 min           |
//!
//! Each channel's POST stands alone: a failure is logged and the next channel
//! is still sent. There is no retry queue. A stop request is honoured
//! between channels, so stopping waits for at most one POST in flight.
//!
//! The token lives in a [`SharedCell`] so a renewal swaps it in whole. A
//! token is only signed once the wall clock looks synced; until then
//! publishing is skipped and a renewal is attempted on every publish tick.

pub mod message;
pub mod sas;

use core::time::Duration;
use std::io;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info, warn};

use crate::actor::{self, ActorHandle, ActorSpec, Core, StopSignal};
use crate::adapters::time;
use crate::app::ports::PublishPort;
use crate::config::{CloudSettings, StationConfig};
use crate::error::PublishError;
use crate::store::{SampleStore, SharedCell};
use message::{ChannelSpec, SignedMessage};
use sas::SigningToken;

const PUBLISHER: ActorSpec = ActorSpec {
    name: "cloud\0",
    core: Core::Pro,
    priority: 5,
    stack_kb: 24,
};

/// Outcome of one publish tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub sent: usize,
    pub failed: usize,
}

pub struct CloudPublisher<P> {
    settings: CloudSettings,
    resource_uri: String,
    channels: Vec<ChannelSpec>,
    store: Arc<SampleStore>,
    token: SharedCell<Option<SigningToken>>,
    port: P,
    clock: fn() -> i64,
    token_ttl_secs: u32,
    publish_period: Duration,
    renew_period: Duration,
}

impl<P: PublishPort + 'static> CloudPublisher<P> {
    /// `None` when any cloud setting is empty; the station then runs
    /// without publishing.
    pub fn new(config: &StationConfig, store: Arc<SampleStore>, port: P) -> Option<Self> {
        Self::with_clock(config, store, port, time::unix_now)
    }

    /// As [`new`](Self::new), reading Unix seconds from `clock`.
    pub fn with_clock(
        config: &StationConfig,
        store: Arc<SampleStore>,
        port: P,
        clock: fn() -> i64,
    ) -> Option<Self> {
        if !config.cloud.is_complete() {
            warn!("Cloud: settings incomplete, publishing disabled");
            return None;
        }

        let publisher = Self {
            resource_uri: config.cloud.resource_uri(),
            settings: config.cloud.clone(),
            channels: config.channels.clone(),
            store,
            token: SharedCell::new(None),
            port,
            clock,
            token_ttl_secs: config.token_ttl_secs,
            publish_period: Duration::from_millis(u64::from(config.publish_interval_ms)),
            renew_period: Duration::from_secs(u64::from(config.token_renew_interval_secs)),
        };
        publisher.renew_token();
        info!(
            "Cloud: publishing {} channel(s) to {}",
            publisher.channels.len(),
            publisher.resource_uri
        );
        Some(publisher)
    }

    pub fn resource_uri(&self) -> &str {
        &self.resource_uri
    }

    /// Token currently attached to requests.
    pub fn token(&self) -> Option<SigningToken> {
        (*self.token.load()).clone()
    }

    /// Sign a fresh token. Returns `false` while the clock is unsynced.
    pub fn renew_token(&self) -> bool {
        let now = (self.clock)();
        if !time::wall_clock_synced(now) {
            warn!("Cloud: wall clock not synced, token not signed");
            return false;
        }
        let token = SigningToken::generate(
            &self.resource_uri,
            &self.settings.key_name,
            &self.settings.key,
            now + i64::from(self.token_ttl_secs),
        );
        info!("Cloud: token renewed, expires at {}", token.expiry_unix_secs);
        self.token.replace(Some(token));
        true
    }

    /// Authorization header value, renewing first if the token is
    /// missing or expired.
    fn authorization(&self) -> Option<String> {
        let now = (self.clock)();
        if let Some(token) = &*self.token.load() {
            if !token.is_expired(now) {
                return Some(token.authorization());
            }
        }
        if !self.renew_token() {
            return None;
        }
        (*self.token.load()).as_ref().map(SigningToken::authorization)
    }

    /// Send one message per channel from the current sample.
    pub fn publish_once(&mut self) -> Result<PublishReport, PublishError> {
        self.publish_unless_stopped(&StopSignal::new())
    }

    /// As [`publish_once`](Self::publish_once), leaving the remaining
    /// channels unsent once `stop` has been raised.
    pub fn publish_unless_stopped(
        &mut self,
        stop: &StopSignal,
    ) -> Result<PublishReport, PublishError> {
        let authorization = self.authorization().ok_or(PublishError::NoToken)?;

        let sample = self.store.load();
        let created = time::utc_timestamp();
        let mut report = PublishReport::default();

        for (attempted, channel) in self.channels.iter().enumerate() {
            if stop.signaled() {
                info!(
                    "Cloud: stopping, {} channel(s) left unsent",
                    self.channels.len() - attempted
                );
                break;
            }
            let message = SignedMessage::new(channel, &self.settings, &sample, &created);
            match self
                .port
                .post(&self.resource_uri, &authorization, &message.to_json())
            {
                Ok(status) => {
                    debug!("Cloud: {} sent ({})", channel.measure.name(), status);
                    report.sent += 1;
                }
                Err(e) => {
                    error!("Cloud: {} not sent: {}", channel.measure.name(), e);
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    /// Run both periods until stopped. Publishing starts immediately.
    pub fn spawn(mut self) -> io::Result<ActorHandle> {
        actor::spawn(PUBLISHER, move |stop| {
            futures_lite::future::block_on(async {
                let mut next_publish = Instant::now();
                let mut next_renew = Instant::now() + self.renew_period;
                loop {
                    let now = Instant::now();
                    if now >= next_renew {
                        self.renew_token();
                        next_renew = now + self.renew_period;
                    }
                    if now >= next_publish {
                        if let Err(e) = self.publish_unless_stopped(stop) {
                            warn!("Cloud: publish skipped: {}", e);
                        }
                        next_publish = now + self.publish_period;
                    }

                    let wake = next_publish.min(next_renew);
                    let idle = wake.saturating_duration_since(Instant::now());
                    if actor::sleep_or_stop(stop, idle).await {
                        break;
                    }
                }
            });
            info!("Cloud: publisher exited");
        })
    }
}
