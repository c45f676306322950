//! # unilog
//!
//! A tag and level routed logging subsystem for long running native
//! programs. Every log call site belongs to a *tag-set* such as `{gc, heap}`;
//! textual *selections* decide, per tag-set and per output, which levels are
//! emitted; outputs are the two standard streams and size-rotated files.
//!
//! ## Architecture Overview
//!
//! - `selection`: parsing and resolution of `gc+heap*=debug,all=warning`
//! - `tagset`: the append-only registry of tag-sets and their level tables
//! - `configuration`: the output registry and the command configurator
//! - `output`: standard stream and rotating file outputs
//! - `async_writer`: bounded queue and background drain thread
//! - `system`: the process-wide entry point and the emission path
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use unilog::{log_debug, LogSystem, Tag};
//!
//! fn main() -> anyhow::Result<()> {
//!     let system = LogSystem::global();
//!     system.configuration().register_tag_sets(&[&[Tag::Gc, Tag::Heap]])?;
//!     system
//!         .configuration()
//!         .parse_command("gc*=debug:file=gc_%p.log:uptime,level,tags:filecount=3,filesize=10M")?;
//!
//!     let log = system.logger(&[Tag::Gc, Tag::Heap])?;
//!     log_debug!(log, "heap expanded to {}M", 256);
//!
//!     system.flush();
//!     Ok(())
//! }
//! ```
//!
//! ## Performance Characteristics
//!
//! - **Lock-free level checks**: a disabled call costs one atomic load
//! - **No configuration lock on the hot path**: only configuration changes
//!   and first use of a tag-set serialize
//! - **Optional async mode** that moves all file I/O off application threads

/// Background writer used in async mode
///
/// Owns the bounded FIFO of pending entries, the drop accounting and the
/// drain thread.
pub mod async_writer;

/// Command-line interface of the `unilog` operator binary
pub mod cli;

/// Output registry and configuration commands
pub mod configuration;

pub mod decorations;

pub mod decorators;

/// Formatter for the subsystem's own `tracing` diagnostics
pub mod diagnostics;

/// Error types for configuration, selection and output failures
pub mod error;

pub mod level;

/// Process facts used by decorations and file name placeholders
pub mod os;

/// Output sinks: standard streams and rotating files
///
/// Contains the `LogOutput` trait, the shared line formatting with column
/// alignment, and the concrete outputs.
pub mod output;

pub mod selection;

/// Process-wide log system and the `Logger` handle used by call sites
pub mod system;

pub mod tag;

pub mod tagset;

pub use async_writer::{AsyncConfig, AsyncLogWriter};
pub use configuration::{LogConfiguration, OutputHandle};
pub use decorations::Decorations;
pub use decorators::{Decorator, DecoratorSet};
pub use error::{ConfigError, DecoratorError, OutputError, Result, SelectionError, TagSetError};
pub use level::Level;
pub use output::{FileOutput, LogOutput, OutputId, OutputKind, StdStreamOutput};
pub use selection::{LogSelection, Selection, UnmatchedSelection};
pub use system::{LogOptions, LogSystem, Logger};
pub use tag::Tag;
pub use tagset::{TagSet, TagSetRegistry};

/// The current version of unilog
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
///
/// The file defaults apply to a file output whose options leave them out;
/// the async defaults apply when async mode is enabled without settings.
pub mod defaults {
    use std::time::Duration;

    /// Default number of archived files kept next to a log file
    pub const FILE_COUNT: u32 = 5;

    /// Upper bound of the `filecount` option
    pub const MAX_FILE_COUNT: u32 = 1000;

    /// Default rotation threshold, 20 MiB
    pub const FILE_SIZE: u64 = 20 * 1024 * 1024;

    /// Default byte budget of the async queue, 2 MiB
    pub const ASYNC_BUFFER_SIZE: usize = 2 * 1024 * 1024;

    /// Assumed size of one pending entry when deriving the queue capacity
    /// from the byte budget
    pub const ESTIMATED_ENTRY_SIZE: usize = 256;

    /// Longest idle time of the async writer between two drains
    pub const FLUSH_INTERVAL: Duration = Duration::from_secs(1);
}
