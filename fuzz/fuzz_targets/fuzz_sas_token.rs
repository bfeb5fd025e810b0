//! Fuzz target: SAS token construction
//!
//! Splits the input into a resource URI and a key and builds a token. The
//! encoded parts must stay inside the URL-safe alphabet so the header value
//! can never be split or injected into.
//!
//! cargo fuzz run fuzz_sas_token

#![no_main]

use libfuzzer_sys::fuzz_target;
use weatherstation::cloud::sas::{SigningToken, url_encode};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let (uri, key) = text.split_once('\n').unwrap_or((text, ""));

    let encoded = url_encode(uri);
    assert!(
        encoded
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"-_.~+%".contains(&b)),
        "unsafe byte in {encoded:?}"
    );

    let token = SigningToken::generate(uri, "fuzz", key, 1_700_000_000);
    let header = token.authorization();
    assert!(!header.contains('\r') && !header.contains('\n'));
    assert_eq!(token.signature.len(), 44);
});
