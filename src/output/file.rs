//! # Rotating File Output
//!
//! A file output writes to a live path and, once the bytes written since the
//! last rotation reach `filesize`, moves the live file to a numbered archive
//! next to it and starts a fresh one:
//!
//! ```text
//! gc.log      live file
//! gc.log.0    archive slot 0
//! gc.log.1    archive slot 1
//! ```
//!
//! Archive numbers are zero padded to the width of `filecount - 1` and cycle
//! through `0..filecount`, overwriting the previous occupant of a slot.
//!
//! ## Options
//!
//! - `filecount=N`: number of archives to keep, `0` disables rotation
//!   (default 5, at most 1000)
//! - `filesize=N[K|M|G]`: rotation threshold, `0` disables rotation
//!   (default 20M)
//! - `foldmultilines=true|false`: escape embedded newlines so one message
//!   always stays on one line
//!
//! ## Failure handling
//!
//! Errors while archiving are reported through `tracing` and rotation
//! continues best-effort; if the live file cannot be renamed it keeps
//! growing instead of losing data.

use super::{LogOutput, OutputKind, OutputState};
use crate::decorations::Decorations;
use crate::defaults;
use crate::error::OutputError;
use crate::level::Level;
use crate::os;
use crate::selection::Selection;
use parking_lot::Mutex;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, error, warn};

/// A log file with size based rotation.
pub struct FileOutput {
    state: OutputState,
    path: PathBuf,
    inner: Mutex<FileInner>,
}

/// Rotation state, guarded by the output's rotation lock.
struct FileInner {
    stream: Option<File>,
    file_count: u32,
    file_count_max_digits: usize,
    is_default_file_count: bool,
    rotate_size: u64,
    current_size: u64,
    current_file: u32,
}

impl FileInner {
    fn should_rotate(&self) -> bool {
        self.file_count > 0 && self.rotate_size > 0 && self.current_size >= self.rotate_size
    }

    fn increment_file_count(&mut self) {
        self.current_file = (self.current_file + 1) % self.file_count;
    }
}

impl FileOutput {
    /// Create a closed file output for `template`; placeholders are resolved
    /// here, once. The output's name keeps the raw template.
    pub fn new(template: &str) -> Self {
        Self {
            state: OutputState::new(format!("file={}", template), Selection::all(Level::Off)),
            path: PathBuf::from(expand_placeholders(template)),
            inner: Mutex::new(FileInner {
                stream: None,
                file_count: defaults::FILE_COUNT,
                file_count_max_digits: os::number_of_digits(defaults::FILE_COUNT - 1),
                is_default_file_count: true,
                rotate_size: defaults::FILE_SIZE,
                current_size: 0,
                current_file: 0,
            }),
        }
    }

    /// Resolved path of the live file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written to the live file since it was opened or last rotated.
    pub fn bytes_since_rotation(&self) -> u64 {
        self.inner.lock().current_size
    }

    /// Archive slot the next rotation will use.
    pub fn next_archive_index(&self) -> u32 {
        self.inner.lock().current_file
    }

    /// Path of archive slot `index`.
    pub fn archive_path(&self, index: u32) -> PathBuf {
        let digits = self.inner.lock().file_count_max_digits;
        self.archive_path_with(index, digits)
    }

    fn archive_path_with(&self, index: u32, digits: usize) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(format!(".{:0width$}", index, width = digits));
        PathBuf::from(name)
    }

    fn parse_options(&self, inner: &mut FileInner, options: &str) -> Result<(), OutputError> {
        for option in options.split(',').filter(|o| !o.is_empty()) {
            let Some((key, value)) = option.split_once('=') else {
                return Err(OutputError::UnknownOption(option.to_string()));
            };
            let invalid = |reason: &str| OutputError::InvalidOption {
                key: key.to_string(),
                value: value.to_string(),
                reason: reason.to_string(),
            };
            match key {
                "filecount" => {
                    let count: u32 = value.parse().map_err(|_| invalid("not a number"))?;
                    if count > defaults::MAX_FILE_COUNT {
                        return Err(invalid(&format!("must be at most {}", defaults::MAX_FILE_COUNT)));
                    }
                    inner.file_count = count;
                    inner.is_default_file_count = false;
                }
                "filesize" => {
                    inner.rotate_size = os::parse_byte_size(value).ok_or_else(|| invalid("not a byte size"))?;
                }
                "foldmultilines" => match value {
                    "true" => self.state.writer().set_fold_multilines(true),
                    "false" => self.state.writer().set_fold_multilines(false),
                    _ => return Err(invalid("expected true or false")),
                },
                _ => return Err(OutputError::UnknownOption(key.to_string())),
            }
        }
        Ok(())
    }

    /// First free archive slot, else the least recently modified one.
    fn next_file_number(&self, inner: &FileInner) -> Option<u32> {
        let mut oldest: Option<(u32, SystemTime)> = None;
        for i in 0..inner.file_count {
            let archive = self.archive_path_with(i, inner.file_count_max_digits);
            let meta = match fs::metadata(&archive) {
                Ok(meta) => meta,
                Err(_) => return Some(i),
            };
            if !meta.is_file() {
                continue;
            }
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            if oldest.map_or(true, |(_, t)| modified < t) {
                oldest = Some((i, modified));
            }
        }
        oldest.map(|(i, _)| i)
    }

    /// Move the live file into the current archive slot.
    fn archive(&self, inner: &FileInner) {
        let target = self.archive_path_with(inner.current_file, inner.file_count_max_digits);
        if let Err(e) = fs::remove_file(&target) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("Could not remove old log file '{}' ({})", target.display(), e);
            }
        }
        if let Err(e) = fs::rename(&self.path, &target) {
            error!(
                "Could not rename log file '{}' to '{}' ({})",
                self.path.display(),
                target.display(),
                e
            );
        }
    }

    fn open(&self, truncate: bool) -> Result<File, OutputError> {
        let mut options = OpenOptions::new();
        options.create(true).write(true);
        if truncate {
            options.truncate(true);
        } else {
            options.append(true);
        }
        options.open(&self.path).map_err(|source| OutputError::Open {
            path: self.path.clone(),
            source,
        })
    }

    fn rotate(&self, inner: &mut FileInner) {
        if inner.file_count == 0 {
            return;
        }
        if let Some(mut stream) = inner.stream.take() {
            if let Err(e) = stream.flush() {
                warn!("Could not flush log file '{}' before rotation ({})", self.path.display(), e);
            }
        }
        self.archive(inner);
        // Append, not truncate: if the rename failed the old content stays.
        match self.open(false) {
            Ok(stream) => inner.stream = Some(stream),
            Err(e) => error!("Could not reopen log file after rotation: {}", e),
        }
        inner.current_size = 0;
        inner.increment_file_count();
    }
}

impl LogOutput for FileOutput {
    fn state(&self) -> &OutputState {
        &self.state
    }

    fn kind(&self) -> OutputKind {
        OutputKind::File
    }

    fn initialize(&self, options: &str) -> Result<(), OutputError> {
        let mut inner = self.inner.lock();
        self.parse_options(&mut inner, options)?;
        inner.file_count_max_digits = os::number_of_digits(inner.file_count.saturating_sub(1));

        let exists = match fs::metadata(&self.path) {
            Ok(meta) if !meta.is_file() => {
                if !inner.is_default_file_count {
                    return Err(OutputError::NotRegularFile { path: self.path.clone() });
                }
                debug!("Log file '{}' is not a regular file, rotation disabled", self.path.display());
                inner.file_count = 0;
                true
            }
            Ok(_) => true,
            Err(_) => false,
        };

        if exists && inner.file_count > 0 {
            match self.next_file_number(&inner) {
                Some(slot) => {
                    inner.current_file = slot;
                    self.archive(&inner);
                    inner.increment_file_count();
                }
                None => warn!("No usable archive slot for '{}', appending to it", self.path.display()),
            }
        }

        let stream = self.open(exists && inner.file_count == 0)?;
        inner.current_size = stream.metadata().map(|m| m.len()).unwrap_or(0);
        inner.stream = Some(stream);
        debug!(path = %self.path.display(), file_count = inner.file_count, "Opened log file");
        Ok(())
    }

    fn write_blocking(&self, decorations: &Decorations, message: &str) -> usize {
        let mut inner = self.inner.lock();
        let Some(stream) = inner.stream.as_mut() else {
            return 0;
        };
        let written = self
            .state
            .writer()
            .write_line(stream, self.name(), self.decorators(), decorations, message);
        inner.current_size += written as u64;
        if inner.should_rotate() {
            self.rotate(&mut inner);
        }
        written
    }

    fn options_description(&self) -> Option<String> {
        let inner = self.inner.lock();
        let mut description = format!(
            "filecount={},filesize={}",
            inner.file_count,
            os::format_byte_size(inner.rotate_size)
        );
        if self.state.writer().fold_multilines() {
            description.push_str(",foldmultilines=true");
        }
        Some(description)
    }

    fn force_rotate(&self) {
        let mut inner = self.inner.lock();
        if inner.stream.is_some() {
            self.rotate(&mut inner);
        }
    }
}

/// Replace the first `%p`, `%t` and `%hn` in `template`.
fn expand_placeholders(template: &str) -> String {
    let pid = os::process_id().to_string();
    let start = os::start_time().format("%Y-%m-%d_%H-%M-%S").to_string();
    template
        .replacen("%p", &pid, 1)
        .replacen("%t", &start, 1)
        .replacen("%hn", os::hostname(), 1)
}
