//! # Asynchronous Log Writer
//!
//! In async mode log call sites never perform I/O. They push a pending
//! entry onto a bounded FIFO and return; a single background thread swaps
//! the whole queue out and replays it through each output's blocking write.
//!
//! ## Overflow
//!
//! When the queue is full the **oldest** entry is discarded and counted
//! against its output. Before the next replay, every output with drops
//! receives one `warning` line:
//!
//! ```text
//! 17 messages dropped due to async logging
//! ```
//!
//! ## Wake-ups
//!
//! The drain thread wakes when the queue reaches half or full occupancy and,
//! at the latest, every `flush_interval`. The interval is only an upper
//! bound between drains; a signal always causes an earlier drain.

use crate::decorations::Decorations;
use crate::defaults;
use crate::error::ConfigError;
use crate::level::Level;
use crate::output::{LogOutput, OutputId};
use crate::tagset::TagSet;
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Settings of the asynchronous writer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsyncConfig {
    /// Total queue budget in bytes; capacity is this divided by
    /// [`defaults::ESTIMATED_ENTRY_SIZE`].
    pub buffer_size: usize,
    /// Longest time a message may sit in the queue while the writer is idle.
    pub flush_interval_ms: u64,
}

impl Default for AsyncConfig {
    fn default() -> Self {
        Self {
            buffer_size: defaults::ASYNC_BUFFER_SIZE,
            flush_interval_ms: defaults::FLUSH_INTERVAL.as_millis() as u64,
        }
    }
}

impl AsyncConfig {
    /// Number of entries the queue holds, at least one.
    pub fn capacity(&self) -> usize {
        (self.buffer_size / defaults::ESTIMATED_ENTRY_SIZE).max(1)
    }

    /// Drain period, at least one millisecond so the drain thread never spins.
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms.max(1))
    }
}

struct PendingEntry {
    output: Arc<dyn LogOutput>,
    decorations: Decorations,
    message: String,
}

#[derive(Default)]
struct Queue {
    entries: VecDeque<PendingEntry>,
    drops: Vec<(Arc<dyn LogOutput>, u64)>,
}

impl Queue {
    fn record_drop(&mut self, output: &Arc<dyn LogOutput>) {
        let id = output.id();
        match self.drops.iter_mut().find(|(o, _)| o.id() == id) {
            Some((_, count)) => *count += 1,
            None => self.drops.push((Arc::clone(output), 1)),
        }
    }
}

/// Bounded queue plus the thread that drains it.
pub struct AsyncLogWriter {
    queue: Mutex<Queue>,
    capacity: usize,
    flush_interval: Duration,
    signal_tx: Sender<()>,
    signal_rx: Receiver<()>,
    /// Serializes drains so `flush` waits for a drain already in progress.
    write_lock: Mutex<()>,
    /// Tag-set the dropped-message notices are attributed to.
    notice_tag_set: Arc<TagSet>,
    running: AtomicBool,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl AsyncLogWriter {
    pub fn new(config: &AsyncConfig, notice_tag_set: Arc<TagSet>) -> Self {
        let capacity = config.capacity();
        let (signal_tx, signal_rx) = channel::bounded(1);
        Self {
            queue: Mutex::new(Queue {
                entries: VecDeque::with_capacity(capacity),
                drops: Vec::new(),
            }),
            capacity,
            flush_interval: config.flush_interval(),
            signal_tx,
            signal_rx,
            write_lock: Mutex::new(()),
            notice_tag_set,
            running: AtomicBool::new(false),
            thread: Mutex::new(None),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries waiting to be written.
    pub fn pending(&self) -> usize {
        self.queue.lock().entries.len()
    }

    /// Drops recorded for `output` and not yet reported.
    pub fn dropped(&self, output: OutputId) -> u64 {
        self.queue
            .lock()
            .drops
            .iter()
            .find(|(o, _)| o.id() == output)
            .map_or(0, |(_, count)| *count)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Queue a message for `output`, discarding the oldest entry if full.
    pub fn enqueue(&self, output: &Arc<dyn LogOutput>, decorations: &Decorations, message: &str) {
        let entry = PendingEntry {
            output: Arc::clone(output),
            decorations: decorations.clone(),
            message: message.to_string(),
        };
        let occupancy = {
            let mut queue = self.queue.lock();
            if queue.entries.len() >= self.capacity {
                if let Some(oldest) = queue.entries.pop_front() {
                    queue.record_drop(&oldest.output);
                }
            }
            queue.entries.push_back(entry);
            queue.entries.len()
        };
        if occupancy == (self.capacity + 1) / 2 || occupancy == self.capacity {
            // A full channel means a wake-up is already pending.
            let _ = self.signal_tx.try_send(());
        }
    }

    /// Write everything queued so far. Returns the number of replayed entries.
    pub fn drain(&self) -> usize {
        let _write = self.write_lock.lock();
        let (entries, drops) = {
            let mut queue = self.queue.lock();
            (mem::take(&mut queue.entries), mem::take(&mut queue.drops))
        };

        for (output, count) in drops {
            let decorations = Decorations::new(Level::Warning, &self.notice_tag_set, output.decorators());
            output.write_blocking(&decorations, &format!("{} messages dropped due to async logging", count));
        }

        let replayed = entries.len();
        for entry in entries {
            entry.output.write_blocking(&entry.decorations, &entry.message);
        }
        replayed
    }

    /// Synchronously write everything pending at the time of the call.
    pub fn flush(&self) {
        self.drain();
    }

    /// Spawn the drain thread.
    pub fn start(self: &Arc<Self>) -> Result<(), ConfigError> {
        self.running.store(true, Ordering::Release);
        let writer = Arc::clone(self);
        let handle = thread::Builder::new()
            .name("AsyncLog Thread".to_string())
            .spawn(move || writer.run())
            .map_err(|e| {
                self.running.store(false, Ordering::Release);
                ConfigError::AsyncThread(e)
            })?;
        *self.thread.lock() = Some(handle);
        debug!(capacity = self.capacity, "Started async log writer");
        Ok(())
    }

    /// Stop the drain thread after a final drain.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Release);
        let _ = self.signal_tx.try_send(());
        if let Some(handle) = self.thread.lock().take() {
            if handle.join().is_err() {
                warn!("Async log writer thread panicked");
            }
        }
        self.drain();
        debug!("Stopped async log writer");
    }

    fn run(&self) {
        while self.is_running() {
            let _ = self.signal_rx.recv_timeout(self.flush_interval);
            self.drain();
        }
    }
}
