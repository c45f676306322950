use crate::decorations::Decorations;
use crate::decorators::{Decorator, DecoratorSet, DECORATOR_COUNT};
use crate::error::OutputError;
use crate::selection::Selection;
use parking_lot::Mutex;
use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, AtomicUsize, Ordering};
use tracing::error;

pub mod file;
pub mod stream;

pub use file::FileOutput;
pub use stream::StdStreamOutput;

/// Identity of an output that is never reused, unlike its registry index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputId(u64);

impl OutputId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        OutputId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "output-{}", self.0)
    }
}

/// Concrete kinds of outputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputKind {
    Stdout,
    Stderr,
    File,
}

/// State shared by every output kind: identity, decorators, the effective
/// selection that produced the current configuration, and the line writer.
pub struct OutputState {
    id: OutputId,
    name: String,
    decorators: AtomicU16,
    selection: Mutex<Selection>,
    writer: LineWriter,
}

impl OutputState {
    pub fn new(name: impl Into<String>, selection: Selection) -> Self {
        Self {
            id: OutputId::next(),
            name: name.into(),
            decorators: AtomicU16::new(DecoratorSet::DEFAULT.bits()),
            selection: Mutex::new(selection),
            writer: LineWriter::default(),
        }
    }

    pub fn writer(&self) -> &LineWriter {
        &self.writer
    }
}

/// A sink for formatted log lines.
///
/// Implementations provide [`write_blocking`](LogOutput::write_blocking),
/// which performs the actual I/O on the calling thread; the asynchronous
/// writer ends up calling the same method from its drain thread.
pub trait LogOutput: Send + Sync {
    fn state(&self) -> &OutputState;

    fn kind(&self) -> OutputKind;

    /// Apply output specific options; called once, right after construction.
    fn initialize(&self, options: &str) -> Result<(), OutputError>;

    /// Write one decorated line. Returns the number of bytes written, 0 if
    /// the output is broken or the write failed.
    fn write_blocking(&self, decorations: &Decorations, message: &str) -> usize;

    /// Current options in `key=value` form, for `describe`.
    fn options_description(&self) -> Option<String> {
        None
    }

    /// Rotate now, regardless of the size threshold. No-op for streams.
    fn force_rotate(&self) {}

    fn id(&self) -> OutputId {
        self.state().id
    }

    fn name(&self) -> &str {
        &self.state().name
    }

    fn is_standard_stream(&self) -> bool {
        matches!(self.kind(), OutputKind::Stdout | OutputKind::Stderr)
    }

    fn decorators(&self) -> DecoratorSet {
        DecoratorSet::from_bits(self.state().decorators.load(Ordering::Acquire))
    }

    fn set_decorators(&self, decorators: DecoratorSet) {
        self.state().decorators.store(decorators.bits(), Ordering::Release);
    }

    /// Effective selection of this output: the composition of every
    /// selection applied to it since it was created or last reset.
    fn selection(&self) -> Selection {
        self.state().selection.lock().clone()
    }

    fn set_selection(&self, selection: Selection) {
        *self.state().selection.lock() = selection;
    }

    /// Live config-string, the canonical rendering of [`selection`](LogOutput::selection).
    fn config_string(&self) -> String {
        self.state().selection.lock().to_string()
    }
}

impl fmt::Debug for dyn LogOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogOutput")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("config", &self.config_string())
            .finish()
    }
}

/// Formats decorated lines and reports write failures.
///
/// Column widths only ever grow: when a rendered decoration is wider than
/// its column, the column is widened for every following line.
#[derive(Default)]
pub struct LineWriter {
    widths: [AtomicUsize; DECORATOR_COUNT],
    fold_multilines: AtomicBool,
    failed: AtomicBool,
}

impl LineWriter {
    pub fn set_fold_multilines(&self, fold: bool) {
        self.fold_multilines.store(fold, Ordering::Relaxed);
    }

    pub fn fold_multilines(&self) -> bool {
        self.fold_multilines.load(Ordering::Relaxed)
    }

    /// Whether a previous write failed and the output became a silent sink.
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// Current minimum width of each decorator column that has been used.
    pub fn column_widths(&self) -> Vec<(Decorator, usize)> {
        Decorator::ALL
            .iter()
            .map(|&d| (d, self.widths[d.index()].load(Ordering::Relaxed)))
            .filter(|&(_, width)| width > 0)
            .collect()
    }

    /// Render `[deco][deco] message\n`, widening columns as needed.
    pub fn format_line(&self, decorators: DecoratorSet, decorations: &Decorations, message: &str) -> String {
        let mut line = String::with_capacity(message.len() + 64);
        let mut decorated = false;
        for decorator in decorators.iter() {
            let Some(value) = decorations.decoration(decorator) else {
                continue;
            };
            let width = self.widths[decorator.index()].fetch_max(value.len(), Ordering::Relaxed);
            line.push('[');
            line.push_str(value);
            for _ in value.len()..width {
                line.push(' ');
            }
            line.push(']');
            decorated = true;
        }
        if decorated {
            line.push(' ');
        }
        if self.fold_multilines() {
            for c in message.chars() {
                match c {
                    '\\' => line.push_str("\\\\"),
                    '\n' => line.push_str("\\n"),
                    c => line.push(c),
                }
            }
        } else {
            line.push_str(message);
        }
        line.push('\n');
        line
    }

    /// Write one line to `out`. The first failure is reported and latches
    /// the output into a silent sink; later calls write nothing.
    pub fn write_line(
        &self,
        out: &mut dyn Write,
        output_name: &str,
        decorators: DecoratorSet,
        decorations: &Decorations,
        message: &str,
    ) -> usize {
        if self.has_failed() {
            return 0;
        }
        let line = self.format_line(decorators, decorations, message);
        match out.write_all(line.as_bytes()).and_then(|_| out.flush()) {
            Ok(()) => line.len(),
            Err(e) => {
                if !self.failed.swap(true, Ordering::AcqRel) {
                    error!(output = output_name, "Failed to write to log output, disabling it: {}", e);
                }
                0
            }
        }
    }
}
