use super::{LogOutput, OutputKind, OutputState};
use crate::decorations::Decorations;
use crate::error::OutputError;
use crate::level::Level;
use crate::selection::Selection;
use parking_lot::Mutex;
use std::io::Write;

/// The `stdout` or `stderr` output.
///
/// These two outputs are created with the registry, live at indices 0 and 1
/// for the whole process and take no options.
pub struct StdStreamOutput {
    state: OutputState,
    kind: OutputKind,
    stream: Mutex<Box<dyn Write + Send>>,
}

impl StdStreamOutput {
    pub fn stdout() -> Self {
        Self::with_writer("stdout", Level::Off, Box::new(std::io::stdout()))
    }

    /// Standard error starts at `all=warning` so errors and warnings are
    /// visible before any configuration is applied.
    pub fn stderr() -> Self {
        Self::with_writer("stderr", Level::Warning, Box::new(std::io::stderr()))
    }

    /// Build a stream output over an arbitrary writer, e.g. a buffer in tests.
    ///
    /// `name` must be `stdout` or `stderr`; anything else is treated as `stdout`.
    pub fn with_writer(name: &str, initial: Level, stream: Box<dyn Write + Send>) -> Self {
        let (name, kind) = if name == "stderr" {
            ("stderr", OutputKind::Stderr)
        } else {
            ("stdout", OutputKind::Stdout)
        };
        Self {
            state: OutputState::new(name, Selection::all(initial)),
            kind,
            stream: Mutex::new(stream),
        }
    }
}

impl LogOutput for StdStreamOutput {
    fn state(&self) -> &OutputState {
        &self.state
    }

    fn kind(&self) -> OutputKind {
        self.kind
    }

    fn initialize(&self, _options: &str) -> Result<(), OutputError> {
        Err(OutputError::OptionsNotSupported(self.name().to_string()))
    }

    fn write_blocking(&self, decorations: &Decorations, message: &str) -> usize {
        let mut stream = self.stream.lock();
        self.state
            .writer()
            .write_line(&mut **stream, self.name(), self.decorators(), decorations, message)
    }
}
