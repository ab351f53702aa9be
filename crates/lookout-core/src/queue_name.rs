//! Deterministic queue-name derivation
//!
//! Queue transports constrain names (lowercase, alphanumeric plus dashes,
//! bounded length). Subscriber queue names are derived from the subscriber
//! identity and the event kind; when the readable form does not fit, the
//! tail is replaced with an xxh3 hash of the full identity so distinct
//! inputs keep distinct names.

use xxhash_rust::xxh3::xxh3_64;

/// Maximum queue name length accepted by the transport
pub const MAX_QUEUE_NAME_LEN: usize = 63;

const HASH_SUFFIX_LEN: usize = 17; // '-' plus 16 hex digits

/// Derive the queue name for one (subscriber, event kind) pair
pub fn subscriber_queue_name(subscriber: &str, kind: &str) -> String {
    let readable = sanitize(&format!("{}-{}", subscriber, kind));
    if readable.len() <= MAX_QUEUE_NAME_LEN {
        return readable;
    }

    let hash = xxh3_64(format!("{}|{}", subscriber, kind).as_bytes());
    let keep = MAX_QUEUE_NAME_LEN - HASH_SUFFIX_LEN;
    let mut name = readable[..keep].trim_end_matches('-').to_string();
    name.push('-');
    name.push_str(&format!("{:016x}", hash));
    name
}

/// Lowercase, map runs of non-alphanumeric characters to single dashes,
/// trim leading/trailing dashes
fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_dash = true; // suppress a leading dash
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}
