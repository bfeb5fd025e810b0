//! Snapshot responder: serves the latest sample over plain HTTP.
//!
//! Any request on the listening port gets the current [`WeatherSample`] as a
//! JSON body with status 200, then the connection is closed. Method, path and
//! headers are read off the socket and ignored.
//!
//! ## Connection model
//!
//! 1. `bind()` opens a non-blocking `TcpListener` (lwIP sockets on ESP-IDF).
//! 2. The accept actor drains pending connections every 50 ms and checks its
//!    stop signal between polls.
//! 3. Each accepted connection is handled on its own short-lived thread:
//!    read the request (bounded), take a store snapshot, write, close.
//! 4. Closing only half-closes the write side, then keeps reading until the
//!    peer hangs up. Request bytes still in flight when the response went
//!    out would otherwise make the stack answer with a reset, and the
//!    client could lose the response.

use core::time::Duration;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};

use crate::actor::{self, ActorHandle, ActorSpec, Core};
use crate::app::ports::{ActiveGuard, Indicator, NoIndicator};
use crate::sample::WeatherSample;
use crate::store::SampleStore;

/// Read request bytes in chunks of this size.
pub const READ_CHUNK: usize = 8192;
/// Stop reading a request after this many bytes.
pub const MAX_REQUEST_BYTES: usize = 64 * 1024;

const ACCEPT_POLL: Duration = Duration::from_millis(50);
const READ_TIMEOUT: Duration = Duration::from_millis(500);
const WRITE_TIMEOUT: Duration = Duration::from_secs(2);
/// Longest wait for the peer to close after the response is sent.
const LINGER: Duration = Duration::from_millis(500);
const CONNECTION_STACK_KB: usize = 16;

const RESPONDER: ActorSpec = ActorSpec {
    name: "http\0",
    core: Core::Pro,
    priority: 8,
    stack_kb: 16,
};

/// Full HTTP/1.1 response for one sample.
pub fn render_response(sample: &WeatherSample) -> String {
    let body = sample.to_json();
    format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: text/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

/// Consume the request. Stops on a short read, end of stream, a read
/// timeout, or once [`MAX_REQUEST_BYTES`] have been read. Returns the byte
/// count.
pub fn drain_request(stream: &mut impl Read) -> io::Result<usize> {
    let mut chunk = vec![0u8; READ_CHUNK];
    let mut total = 0;
    while total < MAX_REQUEST_BYTES {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                total += n;
                if n < READ_CHUNK {
                    break;
                }
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => break,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}

/// Serve one connection to completion.
pub fn handle_connection(
    mut stream: TcpStream,
    store: &SampleStore,
    indicator: &dyn Indicator,
) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    stream.set_write_timeout(Some(WRITE_TIMEOUT))?;

    drain_request(&mut stream)?;

    {
        let _lit = ActiveGuard::new(indicator);
        let response = render_response(&store.load());
        stream.write_all(response.as_bytes())?;
        stream.flush()?;
    }
    // Peer may already be gone.
    if stream.shutdown(Shutdown::Write).is_ok() {
        let discarded = linger(&mut stream, LINGER);
        if discarded > 0 {
            debug!("HTTP: discarded {} late request bytes", discarded);
        }
    }
    Ok(())
}

/// Read and discard until the peer closes, `limit` elapses or
/// [`MAX_REQUEST_BYTES`] more have arrived. Returns the discarded count.
pub fn linger(stream: &mut TcpStream, limit: Duration) -> usize {
    let deadline = Instant::now() + limit;
    let mut sink = [0u8; 512];
    let mut discarded = 0;
    while discarded < MAX_REQUEST_BYTES {
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() || stream.set_read_timeout(Some(left)).is_err() {
            break;
        }
        match stream.read(&mut sink) {
            Ok(0) => break,
            Ok(n) => discarded += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(_) => break,
        }
    }
    discarded
}

pub struct SnapshotResponder {
    listener: TcpListener,
    store: Arc<SampleStore>,
    indicator: Arc<dyn Indicator>,
}

impl SnapshotResponder {
    /// Listen on `0.0.0.0:<port>`. Port `0` lets the OS pick; see
    /// [`local_addr()`](Self::local_addr).
    pub fn bind(port: u16, store: Arc<SampleStore>) -> io::Result<Self> {
        Self::bind_addr(SocketAddr::from(([0, 0, 0, 0], port)), store)
    }

    pub fn bind_addr(addr: SocketAddr, store: Arc<SampleStore>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        info!("HTTP: listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            store,
            indicator: Arc::new(NoIndicator),
        })
    }

    /// Light shown while a response is being written.
    pub fn with_indicator(mut self, indicator: Arc<dyn Indicator>) -> Self {
        self.indicator = indicator;
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept every pending connection and hand each to its own thread.
    /// Returns how many were dispatched.
    pub fn accept_pending(&self) -> usize {
        let mut dispatched = 0;
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    if self.dispatch(stream, peer) {
                        dispatched += 1;
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!("HTTP: accept error: {}", e);
                    break;
                }
            }
        }
        dispatched
    }

    fn dispatch(&self, stream: TcpStream, peer: SocketAddr) -> bool {
        let store = Arc::clone(&self.store);
        let indicator = Arc::clone(&self.indicator);
        let spawned = std::thread::Builder::new()
            .name("http-conn".into())
            .stack_size(CONNECTION_STACK_KB * 1024)
            .spawn(move || {
                if let Err(e) = handle_connection(stream, &store, &*indicator) {
                    warn!("HTTP: {} dropped: {}", peer, e);
                }
            });
        match spawned {
            Ok(_) => true,
            Err(e) => {
                warn!("HTTP: no thread for {}: {}", peer, e);
                false
            }
        }
    }

    /// Run the accept loop until stopped.
    pub fn spawn(self) -> io::Result<ActorHandle> {
        actor::spawn(RESPONDER, move |stop| {
            futures_lite::future::block_on(async {
                loop {
                    self.accept_pending();
                    if actor::sleep_or_stop(stop, ACCEPT_POLL).await {
                        break;
                    }
                }
            });
            info!("HTTP: accept loop exited");
        })
    }
}
