//! # Log System
//!
//! [`LogSystem`] ties the configurator and the optional asynchronous writer
//! together and owns the emission path. Most programs use the process-wide
//! instance from [`LogSystem::global`]; tests build their own.
//!
//! ## Emission
//!
//! A call site holds a [`Logger`] for its tag-set. Logging at a level:
//!
//! 1. registers the thread as a reader of the tag-set,
//! 2. loads the tag-set's level table (lock-free),
//! 3. builds one [`Decorations`] for the merged decorator set,
//! 4. writes to, or enqueues for, every output whose threshold passes.
//!
//! ## Usage Example
//!
//! ```rust
//! use unilog::{log_info, LogSystem, Tag};
//!
//! let system = LogSystem::new();
//! system.configuration().parse_command("gc=info:stdout").unwrap();
//! let log = system.logger(&[Tag::Gc]).unwrap();
//! log_info!(log, "heap {}M -> {}M", 512, 128);
//! ```

use crate::async_writer::{AsyncConfig, AsyncLogWriter};
use crate::configuration::LogConfiguration;
use crate::decorations::Decorations;
use crate::error::{ConfigError, Result};
use crate::level::Level;
use crate::os;
use crate::tag::Tag;
use crate::tagset::TagSet;
use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::info;

static GLOBAL: OnceLock<LogSystem> = OnceLock::new();

/// Options loadable from a JSON file: configuration commands applied in
/// order and, optionally, async mode.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogOptions {
    pub commands: Vec<String>,
    #[serde(rename = "async")]
    pub async_mode: Option<AsyncConfig>,
}

impl LogOptions {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// The logging subsystem of one process.
pub struct LogSystem {
    configuration: LogConfiguration,
    async_writer: ArcSwapOption<AsyncLogWriter>,
    /// Serializes switches between sync and async mode.
    mode_lock: Mutex<()>,
}

impl Default for LogSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSystem {
    pub fn new() -> Self {
        Self::with_configuration(LogConfiguration::new())
    }

    pub fn with_configuration(configuration: LogConfiguration) -> Self {
        os::mark_process_start();
        Self {
            configuration,
            async_writer: ArcSwapOption::empty(),
            mode_lock: Mutex::new(()),
        }
    }

    /// The process-wide instance, created on first use.
    pub fn global() -> &'static LogSystem {
        GLOBAL.get_or_init(LogSystem::new)
    }

    pub fn configuration(&self) -> &LogConfiguration {
        &self.configuration
    }

    /// A logger for the tag-set `tags`, registering it on first use.
    pub fn logger(&self, tags: &[Tag]) -> Result<Logger<'_>> {
        Ok(Logger {
            system: self,
            tag_set: self.configuration.tag_set(tags)?,
        })
    }

    /// Apply every command of `options`, then switch to async mode if requested.
    pub fn apply_options(&self, options: &LogOptions) -> Result<()> {
        for command in &options.commands {
            self.configuration.parse_command(command)?;
        }
        if let Some(async_config) = &options.async_mode {
            self.enable_async(async_config)?;
        }
        Ok(())
    }

    pub fn is_async(&self) -> bool {
        self.async_writer.load().is_some()
    }

    /// Route all further messages through a background writer.
    ///
    /// The writer is published first, then every tag-set's reader barrier
    /// is awaited so no thread is still inside a synchronous write when the
    /// drain thread starts.
    pub fn enable_async(&self, config: &AsyncConfig) -> Result<()> {
        let _mode = self.mode_lock.lock();
        if self.is_async() {
            return Err(ConfigError::AsyncAlreadyEnabled);
        }
        let notice_tag_set = self.configuration.tag_set(&[Tag::Logging])?;
        let writer = Arc::new(AsyncLogWriter::new(config, notice_tag_set));

        self.async_writer.store(Some(Arc::clone(&writer)));
        for tag_set in self.configuration.registry().snapshot() {
            tag_set.wait_until_no_readers();
        }
        if let Err(e) = writer.start() {
            self.async_writer.store(None);
            writer.flush();
            return Err(e);
        }
        info!(capacity = writer.capacity(), "Async logging enabled");
        Ok(())
    }

    /// Return to synchronous writes after draining the queue.
    pub fn disable_async(&self) {
        let _mode = self.mode_lock.lock();
        let Some(writer) = self.async_writer.swap(None) else {
            return;
        };
        for tag_set in self.configuration.registry().snapshot() {
            tag_set.wait_until_no_readers();
        }
        writer.shutdown();
        info!("Async logging disabled");
    }

    /// Write out everything queued by the async writer, if any.
    pub fn flush(&self) {
        if let Some(writer) = self.async_writer.load_full() {
            writer.flush();
        }
    }

    /// Emit `message` at `level` on `tag_set`.
    pub fn write(&self, tag_set: &Arc<TagSet>, level: Level, message: &str) {
        let _reader = tag_set.enter();
        let table = tag_set.table();
        if !level.passes(table.max_level()) {
            return;
        }
        let decorations = Decorations::new(level, tag_set, table.decorators());
        let writer = self.async_writer.load();
        for entry in table.entries() {
            if !level.passes(entry.level) {
                continue;
            }
            match &*writer {
                Some(writer) => writer.enqueue(&entry.output, &decorations, message),
                None => {
                    entry.output.write_blocking(&decorations, message);
                }
            }
        }
    }
}

impl Drop for LogSystem {
    fn drop(&mut self) {
        self.disable_async();
    }
}

/// Logging handle of one call site's tag-set.
#[derive(Clone)]
pub struct Logger<'a> {
    system: &'a LogSystem,
    tag_set: Arc<TagSet>,
}

impl Logger<'_> {
    pub fn tag_set(&self) -> &Arc<TagSet> {
        &self.tag_set
    }

    /// Whether a message at `level` would reach any output.
    #[inline]
    pub fn is_enabled(&self, level: Level) -> bool {
        self.tag_set.is_level(level)
    }

    pub fn log(&self, level: Level, message: &str) {
        if self.is_enabled(level) {
            self.system.write(&self.tag_set, level, message);
        }
    }

    /// Like [`log`](Logger::log), formatting only when the level is enabled.
    pub fn log_args(&self, level: Level, args: fmt::Arguments<'_>) {
        if !self.is_enabled(level) {
            return;
        }
        match args.as_str() {
            Some(message) => self.system.write(&self.tag_set, level, message),
            None => self.system.write(&self.tag_set, level, &args.to_string()),
        }
    }

    pub fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    pub fn warning(&self, message: &str) {
        self.log(Level::Warning, message);
    }

    pub fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    pub fn trace(&self, message: &str) {
        self.log(Level::Trace, message);
    }
}

impl fmt::Debug for Logger<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("tag_set", &self.tag_set).finish()
    }
}

/// Log a formatted message through a [`Logger`] at the given level.
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_args($level, format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => { $crate::log_at!($logger, $crate::Level::Error, $($arg)+) };
}

#[macro_export]
macro_rules! log_warning {
    ($logger:expr, $($arg:tt)+) => { $crate::log_at!($logger, $crate::Level::Warning, $($arg)+) };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => { $crate::log_at!($logger, $crate::Level::Info, $($arg)+) };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => { $crate::log_at!($logger, $crate::Level::Debug, $($arg)+) };
}

#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $($arg:tt)+) => { $crate::log_at!($logger, $crate::Level::Trace, $($arg)+) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    fn system() -> (LogSystem, SharedBuffer, SharedBuffer) {
        let out = SharedBuffer::default();
        let err = SharedBuffer::default();
        let config = LogConfiguration::with_streams(Box::new(out.clone()), Box::new(err.clone()));
        (LogSystem::with_configuration(config), out, err)
    }

    #[test]
    fn test_default_routing_is_stderr_warning() {
        let (system, out, err) = system();
        system.configuration().parse_command("all=warning:stderr:level,tags").unwrap();
        let log = system.logger(&[Tag::Gc]).unwrap();
        log.warning("careful");
        log.info("not shown");
        assert_eq!(err.text(), "[warning][gc] careful\n");
        assert!(out.text().is_empty());
    }

    #[test]
    fn test_message_reaches_every_enabled_output() {
        let (system, out, err) = system();
        system.configuration().parse_command("gc=debug:stdout:none").unwrap();
        system.configuration().parse_command("gc=error:stderr:none").unwrap();
        let log = system.logger(&[Tag::Gc]).unwrap();
        log_error!(log, "code {}", 7);
        log_debug!(log, "details");
        assert_eq!(out.text(), "code 7\ndetails\n");
        assert_eq!(err.text(), "code 7\n");
    }

    #[test]
    fn test_async_mode_round_trip() {
        let (system, out, _err) = system();
        system.configuration().parse_command("gc=info:stdout:none").unwrap();
        let log = system.logger(&[Tag::Gc]).unwrap();

        system.enable_async(&AsyncConfig::default()).unwrap();
        assert!(matches!(
            system.enable_async(&AsyncConfig::default()),
            Err(ConfigError::AsyncAlreadyEnabled)
        ));
        log.info("queued");
        system.flush();
        assert_eq!(out.text(), "queued\n");

        system.disable_async();
        assert!(!system.is_async());
        log.info("direct");
        assert_eq!(out.text(), "queued\ndirect\n");
    }

    #[test]
    fn test_apply_options_from_json() {
        let (system, out, _err) = system();
        let options = LogOptions::from_json(r#"{"commands": ["safepoint=info:stdout:level"]}"#).unwrap();
        assert!(options.async_mode.is_none());
        system.apply_options(&options).unwrap();
        system.logger(&[Tag::Safepoint]).unwrap().info("reached");
        assert_eq!(out.text(), "[info] reached\n");

        let bad = LogOptions {
            commands: vec!["safepoint=loud".to_string()],
            async_mode: None,
        };
        assert!(system.apply_options(&bad).is_err());
    }
}
