//! Shared Access Signature tokens for the event hub REST endpoint.
//!
//! ```text
//!   string_to_sign = url_encode(uri) + "\n" + expiry
//!   sig            = base64(HMAC-SHA256(key, string_to_sign))
//!   token          = sr=<url_encode(uri)>&sig=<url_encode(sig)>&se=<expiry>&skn=<key_name>
//! ```
//!
//! HMAC comes from `hmac-sha256`; the key is used as its UTF-8 bytes, not
//! base64-decoded.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Everything except `A-Z a-z 0-9 - _ . ~` is escaped.
const ESCAPED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode with upper-case hex, then turn `%20` into `+`.
pub fn url_encode(value: &str) -> String {
    utf8_percent_encode(value, ESCAPED)
        .to_string()
        .replace("%20", "+")
}

pub fn string_to_sign(resource_uri: &str, expiry_unix_secs: i64) -> String {
    format!("{}\n{}", url_encode(resource_uri), expiry_unix_secs)
}

/// `base64(HMAC-SHA256(key, message))`
pub fn sign(key: &str, message: &str) -> String {
    STANDARD.encode(hmac_sha256::HMAC::mac(message.as_bytes(), key.as_bytes()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningToken {
    pub expiry_unix_secs: i64,
    /// Base64 signature, not yet URL-encoded.
    pub signature: String,
    pub resource_uri: String,
    pub key_name: String,
}

impl SigningToken {
    pub fn generate(resource_uri: &str, key_name: &str, key: &str, expiry_unix_secs: i64) -> Self {
        Self {
            expiry_unix_secs,
            signature: sign(key, &string_to_sign(resource_uri, expiry_unix_secs)),
            resource_uri: resource_uri.into(),
            key_name: key_name.into(),
        }
    }

    /// `sr=..&sig=..&se=..&skn=..`
    pub fn token(&self) -> String {
        format!(
            "sr={}&sig={}&se={}&skn={}",
            url_encode(&self.resource_uri),
            url_encode(&self.signature),
            self.expiry_unix_secs,
            self.key_name
        )
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("SharedAccessSignature {}", self.token())
    }

    pub fn is_expired(&self, now_unix_secs: i64) -> bool {
        now_unix_secs >= self.expiry_unix_secs
    }
}
