//! # Process Utilities
//!
//! Thin wrappers around the operating-system facts that decorations and file
//! name placeholders need: process and thread ids, the host name, the
//! process start time and the clocks used for `time`/`uptime` decorations.
//!
//! ## Design Principles
//!
//! - **Resolved once**: values that cannot change during the life of the
//!   process (pid, host name, start time) are computed on first use and
//!   cached, so the hot logging path never repeats a system call for them.
//! - **Infallible**: a failing lookup degrades to a placeholder value rather
//!   than an error, because a missing host name must never stop a log line.

use chrono::{DateTime, Local, Utc};
use std::sync::OnceLock;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

struct ProcessStart {
    instant: Instant,
    wall_clock: DateTime<Local>,
}

static PROCESS_START: OnceLock<ProcessStart> = OnceLock::new();
static HOSTNAME: OnceLock<String> = OnceLock::new();

fn process_start() -> &'static ProcessStart {
    PROCESS_START.get_or_init(|| ProcessStart {
        instant: Instant::now(),
        wall_clock: Local::now(),
    })
}

/// Pin the process start time.
///
/// Called when the logging system is created so that `uptime` decorations
/// and the `%t` file name placeholder both measure from the same instant.
/// Later calls are no-ops.
pub fn mark_process_start() {
    let _ = process_start();
}

/// Time elapsed since [`mark_process_start`].
pub fn uptime() -> Duration {
    process_start().instant.elapsed()
}

/// Local wall-clock time at which the process started.
pub fn start_time() -> DateTime<Local> {
    process_start().wall_clock
}

/// Current wall-clock time in nanoseconds since the Unix epoch.
///
/// Returns 0 if the system clock is set before the epoch.
pub fn current_timestamp_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

pub fn now_local() -> DateTime<Local> {
    Local::now()
}

pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Id of the current process.
pub fn process_id() -> u32 {
    std::process::id()
}

/// Kernel id of the calling thread.
#[cfg(target_os = "linux")]
pub fn thread_id() -> u64 {
    nix::unistd::gettid().as_raw() as u64
}

/// Id of the calling thread.
#[cfg(not(target_os = "linux"))]
pub fn thread_id() -> u64 {
    use std::cell::Cell;
    use std::sync::atomic::{AtomicU64, Ordering};

    static NEXT: AtomicU64 = AtomicU64::new(1);
    thread_local! {
        static ID: Cell<u64> = Cell::new(0);
    }
    ID.with(|id| {
        if id.get() == 0 {
            id.set(NEXT.fetch_add(1, Ordering::Relaxed));
        }
        id.get()
    })
}

/// Host name of the machine, resolved once.
pub fn hostname() -> &'static str {
    HOSTNAME.get_or_init(|| {
        nix::unistd::gethostname()
            .ok()
            .and_then(|name| name.into_string().ok())
            .unwrap_or_else(|| "unknown-host".to_string())
    })
}

/// Number of decimal digits needed to print `value`.
pub fn number_of_digits(mut value: u32) -> usize {
    let mut digits = 1;
    while value >= 10 {
        value /= 10;
        digits += 1;
    }
    digits
}

/// Parse a byte size with an optional `K`, `M` or `G` suffix (binary units).
pub fn parse_byte_size(text: &str) -> Option<u64> {
    let text = text.trim();
    let (digits, multiplier) = match text.char_indices().last()? {
        (i, 'k') | (i, 'K') => (&text[..i], 1u64 << 10),
        (i, 'm') | (i, 'M') => (&text[..i], 1u64 << 20),
        (i, 'g') | (i, 'G') => (&text[..i], 1u64 << 30),
        _ => (text, 1),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u64>().ok()?.checked_mul(multiplier)
}

/// Render a byte count using the largest exact binary unit, e.g. `20M`.
pub fn format_byte_size(bytes: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(1 << 30, "G"), (1 << 20, "M"), (1 << 10, "K")];
    for (size, suffix) in UNITS {
        if bytes >= size && bytes % size == 0 {
            return format!("{}{}", bytes / size, suffix);
        }
    }
    bytes.to_string()
}
