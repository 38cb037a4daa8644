//! Note identifier generation.
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use uuid::Uuid;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generates a new note id.
///
/// The id is `<millis>-<sequence>-<random>`: the zero-padded millisecond
/// timestamp and the process-wide sequence make ids from one process sort in
/// creation order, and the random tail keeps ids from different processes
/// (for example imported notes) from colliding. The sequence is padded to
/// ten digits and never wraps.
pub fn new_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0);
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let random = Uuid::new_v4().simple().to_string();

    format!("{:013}-{:010}-{}", millis, seq, &random[..8])
}
