//! Time utilities for Veridity.
//!
//! Proof-input timestamps are Unix epoch seconds (i64), matching what
//! the credential circuits expect.

/// Return the current time as seconds since Unix epoch.
pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}
