//! Outbound HTTP adapters for the cloud publisher.
//!
//! - [`EspHttpPoster`] (ESP-IDF targets): `embedded-svc` HTTP client over
//!   `esp-idf-svc`, TLS verified against the built-in certificate bundle.
//! - [`TcpHttpPoster`]: plaintext HTTP/1.1 over `std::net::TcpStream`, for
//!   host runs and tests. An `https://` URI is only accepted when a relay
//!   address is configured; the request then goes to the relay in plaintext
//!   with the original `Host` header.

use core::time::Duration;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

use crate::app::ports::{PublishPort, check_status};
use crate::error::PublishError;

/// Longest response head kept while looking for the status line.
const MAX_RESPONSE_BYTES: usize = 4096;

/// `http[s]://host[:port][/path]` split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTarget<'a> {
    pub tls: bool,
    pub host: &'a str,
    pub port: u16,
    pub path: &'a str,
}

impl<'a> HttpTarget<'a> {
    pub fn parse(uri: &'a str) -> Result<Self, PublishError> {
        let (tls, rest) = if let Some(rest) = uri.strip_prefix("https://") {
            (true, rest)
        } else if let Some(rest) = uri.strip_prefix("http://") {
            (false, rest)
        } else {
            return Err(PublishError::InvalidUri);
        };
        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, "/"),
        };
        let (host, port) = match authority.rsplit_once(':') {
            Some((h, p)) => (h, p.parse().map_err(|_| PublishError::InvalidUri)?),
            None => (authority, if tls { 443 } else { 80 }),
        };
        if host.is_empty() {
            return Err(PublishError::InvalidUri);
        }
        Ok(Self {
            tls,
            host,
            port,
            path,
        })
    }
}

/// `HTTP/1.1 201 Created` → `201`
pub fn parse_status_line(line: &str) -> Option<u16> {
    let mut parts = line.split_whitespace();
    if !parts.next()?.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}

pub struct TcpHttpPoster {
    timeout: Duration,
    relay: Option<SocketAddr>,
}

impl TcpHttpPoster {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            relay: None,
        }
    }

    /// Send every request to `relay` instead of the URI's host.
    pub fn with_relay(mut self, relay: SocketAddr) -> Self {
        self.relay = Some(relay);
        self
    }

    fn resolve(&self, target: &HttpTarget<'_>) -> Result<SocketAddr, PublishError> {
        if let Some(relay) = self.relay {
            return Ok(relay);
        }
        if target.tls {
            return Err(PublishError::InvalidUri);
        }
        (target.host, target.port)
            .to_socket_addrs()
            .map_err(|_| PublishError::Connect)?
            .next()
            .ok_or(PublishError::Connect)
    }
}

impl Default for TcpHttpPoster {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl PublishPort for TcpHttpPoster {
    fn post(&mut self, uri: &str, authorization: &str, body: &str) -> Result<u16, PublishError> {
        let target = HttpTarget::parse(uri)?;
        let addr = self.resolve(&target)?;

        let mut stream =
            TcpStream::connect_timeout(&addr, self.timeout).map_err(|_| PublishError::Connect)?;
        stream
            .set_read_timeout(Some(self.timeout))
            .and_then(|()| stream.set_write_timeout(Some(self.timeout)))
            .map_err(|_| PublishError::Io)?;

        let request = format!(
            "POST {} HTTP/1.1\r\n\
             Host: {}\r\n\
             Authorization: {}\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n{}",
            target.path,
            target.host,
            authorization,
            body.len(),
            body
        );
        stream
            .write_all(request.as_bytes())
            .and_then(|()| stream.flush())
            .map_err(|_| PublishError::Io)?;

        let mut head = Vec::with_capacity(256);
        let mut chunk = [0u8; 256];
        while !head.windows(2).any(|w| w == b"\r\n") && head.len() < MAX_RESPONSE_BYTES {
            match stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => head.extend_from_slice(&chunk[..n]),
                Err(_) => return Err(PublishError::Io),
            }
        }

        let text = String::from_utf8_lossy(&head);
        let status = text
            .lines()
            .next()
            .and_then(parse_status_line)
            .ok_or(PublishError::Io)?;
        check_status(status)
    }
}

#[cfg(target_os = "espidf")]
pub use esp::EspHttpPoster;

#[cfg(target_os = "espidf")]
mod esp {
    use embedded_svc::http::client::Client as HttpClient;
    use embedded_svc::io::Write;
    use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
    use esp_idf_svc::sys::EspError;

    use crate::app::ports::{PublishPort, check_status};
    use crate::error::PublishError;

    pub struct EspHttpPoster {
        client: HttpClient<EspHttpConnection>,
    }

    impl EspHttpPoster {
        pub fn new() -> Result<Self, EspError> {
            let connection = EspHttpConnection::new(&Configuration {
                crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
                ..Default::default()
            })?;
            Ok(Self {
                client: HttpClient::wrap(connection),
            })
        }
    }

    impl PublishPort for EspHttpPoster {
        fn post(&mut self, uri: &str, authorization: &str, body: &str) -> Result<u16, PublishError> {
            let len = body.len().to_string();
            let headers = [
                ("Authorization", authorization),
                ("Content-Type", "application/json"),
                ("Content-Length", len.as_str()),
            ];

            let mut request = self
                .client
                .post(uri, &headers)
                .map_err(|_| PublishError::Connect)?;
            request
                .write_all(body.as_bytes())
                .map_err(|_| PublishError::Io)?;
            request.flush().map_err(|_| PublishError::Io)?;

            let response = request.submit().map_err(|_| PublishError::Io)?;
            check_status(response.status())
        }
    }
}
