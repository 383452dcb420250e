//! Fuzz target: `parse_request`
//!
//! Splits the input into a method bit, a path and a body, then routes it.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Every rejection is a 400 or 404 with a JSON `error` body
//! - Only `/api/update` can fail with 400
//!
//! cargo fuzz run fuzz_request_router

#![no_main]

use glacier::api::handlers::{Method, parse_request};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&m, rest)) = data.split_first() else {
        return;
    };
    let method = if m & 1 == 0 { Method::Get } else { Method::Post };

    let text = String::from_utf8_lossy(rest);
    let (path, body) = text.split_once('\n').unwrap_or((&text, ""));

    if let Err(resp) = parse_request(method, path, body) {
        assert!(resp.status == 400 || resp.status == 404, "unexpected status {}", resp.status);
        assert!(resp.body.starts_with(r#"{"error":"#));
        if resp.status == 400 {
            assert_eq!(method, Method::Post);
            assert!(path.starts_with("/api/update"));
        }
    }
});
