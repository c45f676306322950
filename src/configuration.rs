//! # Output Registry and Configurator
//!
//! [`LogConfiguration`] owns every output and is the only place where the
//! routing of tag-sets to outputs changes. It turns textual commands of the
//! form
//!
//! ```text
//! what[:output[:decorators[:output-options]]]
//! ```
//!
//! into level-table updates on every registered tag-set.
//!
//! ## Output registry
//!
//! Index 0 is always `stdout` and index 1 is always `stderr`; both exist for
//! the lifetime of the configuration. File outputs are appended from index 2
//! and are removed as soon as a configuration change leaves them with
//! nothing to log, so their indices are not stable. Code that keeps a
//! reference to an output across configuration changes uses an
//! [`OutputHandle`], which detects that its slot now holds another output.
//!
//! ## Locking
//!
//! Every mutation runs under one configuration lock. Log call sites never
//! take it: they read tag-set level tables lock-free. Creating a tag-set
//! for the first time does take the lock, so that the new tag-set observes
//! the configuration atomically.

use crate::decorators::{Decorator, DecoratorSet};
use crate::error::{ConfigError, OutputError, Result, SelectionError};
use crate::level::Level;
use crate::output::{FileOutput, LogOutput, OutputId, OutputKind, StdStreamOutput};
use crate::selection::{LogSelection, Selection, MAX_SELECTIONS};
use crate::tag::{Tag, MAX_TAGS_PER_SET};
use crate::tagset::{TagSet, TagSetRegistry};
use parking_lot::Mutex;
use std::fmt::Write as _;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Index of the `stdout` output.
pub const STDOUT_INDEX: usize = 0;
/// Index of the `stderr` output.
pub const STDERR_INDEX: usize = 1;

/// The command that turns off every output, errors and warnings included.
pub const DISABLE_COMMAND: &str = "disable";

/// A reference to a registered output that notices when it went stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputHandle {
    index: usize,
    id: OutputId,
}

impl OutputHandle {
    /// Registry index at the time the handle was taken.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn id(&self) -> OutputId {
        self.id
    }
}

type UpdateListener = Arc<dyn Fn() + Send + Sync>;

struct ConfigState {
    outputs: Vec<Arc<dyn LogOutput>>,
    listeners: Vec<UpdateListener>,
}

/// How the `output` part of a command refers to an output.
#[derive(Debug, PartialEq, Eq)]
enum OutputRef {
    Index(usize),
    Name(String),
}

/// The output registry and configurator.
pub struct LogConfiguration {
    registry: TagSetRegistry,
    stdout: Arc<dyn LogOutput>,
    stderr: Arc<dyn LogOutput>,
    state: Mutex<ConfigState>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

impl LogConfiguration {
    /// Configuration writing to the process's standard streams.
    pub fn new() -> Self {
        Self::with_outputs(Arc::new(StdStreamOutput::stdout()), Arc::new(StdStreamOutput::stderr()))
    }

    /// Configuration whose `stdout` and `stderr` outputs write to the given
    /// writers; used to capture output in tests.
    pub fn with_streams(stdout: Box<dyn Write + Send>, stderr: Box<dyn Write + Send>) -> Self {
        Self::with_outputs(
            Arc::new(StdStreamOutput::with_writer("stdout", Level::Off, stdout)),
            Arc::new(StdStreamOutput::with_writer("stderr", Level::Warning, stderr)),
        )
    }

    fn with_outputs(stdout: Arc<dyn LogOutput>, stderr: Arc<dyn LogOutput>) -> Self {
        Self {
            registry: TagSetRegistry::new(),
            state: Mutex::new(ConfigState {
                outputs: vec![Arc::clone(&stdout), Arc::clone(&stderr)],
                listeners: Vec::new(),
            }),
            stdout,
            stderr,
        }
    }

    pub fn registry(&self) -> &TagSetRegistry {
        &self.registry
    }

    pub fn stdout(&self) -> &Arc<dyn LogOutput> {
        &self.stdout
    }

    pub fn stderr(&self) -> &Arc<dyn LogOutput> {
        &self.stderr
    }

    /// Look up the tag-set for `tags`, creating and registering it on first use.
    ///
    /// A new tag-set starts with `stderr` at `warning` and then has the
    /// stored selection of every output applied, so it follows whatever was
    /// configured before it existed.
    pub fn tag_set(&self, tags: &[Tag]) -> Result<Arc<TagSet>> {
        if let Some(tag_set) = self.registry.find(tags) {
            return Ok(tag_set);
        }
        let state = self.state.lock();
        if let Some(tag_set) = self.registry.find(tags) {
            return Ok(tag_set);
        }
        let tag_set = TagSet::new(tags, Arc::clone(&self.stderr))?;
        for output in &state.outputs {
            let level = output.selection().resolve(&tag_set).unwrap_or(Level::Off);
            tag_set.set_output_level(output, level);
        }
        debug!(tags = tag_set.label(), "Registered tag set");
        Ok(self.registry.insert(tag_set))
    }

    /// Register every tag combination a program uses, ahead of configuration.
    pub fn register_tag_sets(&self, manifest: &[&[Tag]]) -> Result<()> {
        for tags in manifest {
            self.tag_set(tags)?;
        }
        Ok(())
    }

    /// Snapshot of the registry in index order.
    pub fn outputs(&self) -> Vec<Arc<dyn LogOutput>> {
        self.state.lock().outputs.clone()
    }

    pub fn output_count(&self) -> usize {
        self.state.lock().outputs.len()
    }

    /// Resolve a handle to its output, failing if the slot was reused.
    pub fn output(&self, handle: OutputHandle) -> Result<Arc<dyn LogOutput>> {
        let state = self.state.lock();
        Self::checked_index(&state, handle).map(|i| Arc::clone(&state.outputs[i]))
    }

    /// Find an output by its name (`stdout`, `stderr` or `file=<path>`).
    pub fn find_output_by_name(&self, name: &str) -> Option<OutputHandle> {
        let state = self.state.lock();
        Self::find_locked(&state, name).map(|i| Self::handle_at(&state, i))
    }

    /// Create and initialize an output from `type=params`, or return the
    /// existing output of that name. Options given for an existing output
    /// are ignored with a warning.
    pub fn add_output(&self, spec: &str, options: &str) -> Result<OutputHandle> {
        let mut state = self.state.lock();
        let name = match normalize_output_name(spec)? {
            OutputRef::Name(name) => name,
            OutputRef::Index(_) => return Err(OutputError::UnsupportedType(spec.to_string()).into()),
        };
        let (index, _) = Self::find_or_add_locked(&mut state, &name, options)?;
        Ok(Self::handle_at(&state, index))
    }

    /// Apply one textual configuration command.
    pub fn parse_command(&self, command: &str) -> Result<()> {
        let command = command.trim();
        if command == DISABLE_COMMAND {
            self.disable_logging();
            return Ok(());
        }
        let parts = split_command(command)?;
        let part = |i: usize| parts.get(i).copied().unwrap_or("");
        self.configure(part(1), part(0), part(2), part(3))
    }

    /// Configure `output` (a name, `#index` or empty for `stdout`) with the
    /// selection `what` and the decorator list `decorators`.
    ///
    /// Everything is parsed and the output is created before any tag-set is
    /// touched, so a failing call leaves the configuration unchanged.
    pub fn configure(&self, output: &str, what: &str, decorators: &str, options: &str) -> Result<()> {
        let selection = Selection::parse(what)?;
        let decorators = if decorators.is_empty() {
            None
        } else {
            Some(DecoratorSet::parse(decorators)?)
        };
        let target = normalize_output_name(output)?;

        for unmatched in selection.verify_against_registry(&self.registry.snapshot()) {
            warn!("{}", unmatched);
        }

        let listeners = {
            let mut state = self.state.lock();
            let (index, fresh) = match target {
                OutputRef::Index(index) => {
                    if index >= state.outputs.len() {
                        return Err(ConfigError::NoSuchOutput(format!("#{}", index)));
                    }
                    warn_ignored_options(&state.outputs[index], options);
                    (index, false)
                }
                OutputRef::Name(name) => Self::find_or_add_locked(&mut state, &name, options)?,
            };
            if let Err(e) = self.configure_output_locked(&mut state, index, &selection, decorators, fresh) {
                if fresh {
                    state.outputs.pop();
                }
                return Err(e);
            }
            state.listeners.clone()
        };
        notify(&listeners);
        Ok(())
    }

    /// Configure the output behind `handle` with an already parsed selection.
    /// `None` decorators keeps the output's current decorators.
    pub fn configure_output(
        &self,
        handle: OutputHandle,
        selection: &Selection,
        decorators: Option<DecoratorSet>,
    ) -> Result<()> {
        let listeners = {
            let mut state = self.state.lock();
            let index = Self::checked_index(&state, handle)?;
            self.configure_output_locked(&mut state, index, selection, decorators, false)?;
            state.listeners.clone()
        };
        notify(&listeners);
        Ok(())
    }

    /// Enable `stdout` at `level` for `tags`; with `exact` only the tag-set
    /// made of exactly these tags, otherwise every tag-set containing them.
    pub fn configure_stdout(&self, level: Level, exact: bool, tags: &[Tag]) -> Result<()> {
        if tags.len() > MAX_TAGS_PER_SET {
            let text = tags.iter().map(|t| t.name()).collect::<Vec<_>>().join("+");
            return Err(SelectionError::TooManyTags(text).into());
        }
        let selection = Selection::single(LogSelection::new(tags, !exact, level));
        let handle = {
            let state = self.state.lock();
            Self::handle_at(&state, STDOUT_INDEX)
        };
        self.configure_output(handle, &selection, None)
    }

    /// Turn `handle`'s output off on every tag-set. The standard streams
    /// are reset to `all=off`; file outputs are closed and removed.
    pub fn disable_output(&self, handle: OutputHandle) -> Result<()> {
        let listeners = {
            let mut state = self.state.lock();
            let index = Self::checked_index(&state, handle)?;
            self.disable_output_locked(&mut state, index);
            state.listeners.clone()
        };
        notify(&listeners);
        Ok(())
    }

    /// Disable every output on every tag-set, including errors and warnings on `stderr`.
    pub fn disable_logging(&self) {
        let listeners = {
            let mut state = self.state.lock();
            for index in (0..state.outputs.len()).rev() {
                self.disable_output_locked(&mut state, index);
            }
            state.listeners.clone()
        };
        info!("Disabled all log outputs");
        notify(&listeners);
    }

    /// Force a rotation of every file output.
    pub fn rotate_all_outputs(&self) {
        let outputs = self.outputs();
        for output in outputs.iter().filter(|o| o.kind() == OutputKind::File) {
            debug!(output = output.name(), "Forcing log rotation");
            output.force_rotate();
        }
    }

    /// Call `listener` after every successful configuration change.
    pub fn register_update_listener(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.state.lock().listeners.push(Arc::new(listener));
    }

    /// Human readable dump of the vocabulary and of the live output table.
    pub fn describe(&self) -> String {
        let mut text = String::new();
        self.describe_available(&mut text);
        text.push('\n');
        self.describe_current(&mut text);
        text
    }

    fn describe_available(&self, text: &mut String) {
        let levels: Vec<&str> = Level::ALL.iter().map(|l| l.name()).collect();
        let _ = writeln!(text, "Available log levels: {}", levels.join(", "));

        let decorators: Vec<String> = Decorator::ALL
            .iter()
            .map(|d| format!("{} ({})", d.name(), d.abbreviation()))
            .collect();
        let _ = writeln!(text, "Available log decorators: {}", decorators.join(", "));
        let _ = writeln!(text, " Decorators can also be specified as 'none' for no decoration.");

        let tags: Vec<&str> = Tag::ALL.iter().map(|t| t.name()).collect();
        let _ = writeln!(text, "Available log tags: {}", tags.join(", "));
        let _ = writeln!(
            text,
            " Specifying 'all' instead of a tag combination matches all tag combinations."
        );
    }

    fn describe_current(&self, text: &mut String) {
        let _ = writeln!(text, "Log output configuration:");
        for (index, output) in self.outputs().iter().enumerate() {
            let _ = write!(
                text,
                " #{}: {} {} {}",
                index,
                output.name(),
                output.config_string(),
                output.decorators()
            );
            if let Some(options) = output.options_description() {
                let _ = write!(text, " {}", options);
            }
            let widths = output.state().writer().column_widths();
            if !widths.is_empty() {
                let widths: Vec<String> = widths.iter().map(|(d, w)| format!("{}={}", d.abbreviation(), w)).collect();
                let _ = write!(text, " (widths: {})", widths.join(","));
            }
            text.push('\n');
        }
    }

    fn handle_at(state: &ConfigState, index: usize) -> OutputHandle {
        OutputHandle {
            index,
            id: state.outputs[index].id(),
        }
    }

    fn checked_index(state: &ConfigState, handle: OutputHandle) -> Result<usize> {
        match state.outputs.get(handle.index) {
            Some(output) if output.id() == handle.id => Ok(handle.index),
            _ => Err(ConfigError::StaleHandle { index: handle.index }),
        }
    }

    fn find_locked(state: &ConfigState, name: &str) -> Option<usize> {
        state.outputs.iter().position(|o| o.name() == name)
    }

    /// Returns the output's index and whether it was just created.
    fn find_or_add_locked(state: &mut ConfigState, name: &str, options: &str) -> Result<(usize, bool)> {
        if let Some(index) = Self::find_locked(state, name) {
            warn_ignored_options(&state.outputs[index], options);
            return Ok((index, false));
        }
        let output = create_output(name, options)?;
        state.outputs.push(output);
        Ok((state.outputs.len() - 1, true))
    }

    fn configure_output_locked(
        &self,
        state: &mut ConfigState,
        index: usize,
        selection: &Selection,
        decorators: Option<DecoratorSet>,
        fresh: bool,
    ) -> Result<()> {
        let output = Arc::clone(&state.outputs[index]);
        let effective = output.selection().compose(selection).without_leading_off();
        // The live config-string must stay a valid selection.
        if effective.clauses().len() > MAX_SELECTIONS {
            return Err(SelectionError::TooManySelections(effective.to_string()).into());
        }

        match decorators {
            Some(decorators) => output.set_decorators(decorators),
            None if fresh => output.set_decorators(DecoratorSet::DEFAULT),
            None => {}
        }

        let mut enabled_on = 0;
        for tag_set in self.registry.snapshot() {
            let level = effective.resolve(&tag_set).unwrap_or(Level::Off);
            tag_set.set_output_level(&output, level);
            if level != Level::Off {
                enabled_on += 1;
            }
        }

        debug!(output = output.name(), config = %effective, enabled_on, "Configured log output");
        output.set_selection(effective);

        if enabled_on == 0 && index > STDERR_INDEX {
            self.delete_output_locked(state, index);
        }
        Ok(())
    }

    fn disable_output_locked(&self, state: &mut ConfigState, index: usize) {
        let output = Arc::clone(&state.outputs[index]);
        for tag_set in self.registry.snapshot() {
            tag_set.set_output_level(&output, Level::Off);
        }
        output.set_selection(Selection::all(Level::Off));
        if index > STDERR_INDEX {
            self.delete_output_locked(state, index);
        } else {
            output.set_decorators(DecoratorSet::DEFAULT);
        }
    }

    fn delete_output_locked(&self, state: &mut ConfigState, index: usize) {
        let output = state.outputs.swap_remove(index);
        for tag_set in self.registry.snapshot() {
            tag_set.set_output_level(&output, Level::Off);
        }
        debug!(output = output.name(), "Removed unused log output");
    }
}

fn notify(listeners: &[UpdateListener]) {
    for listener in listeners {
        listener();
    }
}

fn warn_ignored_options(output: &Arc<dyn LogOutput>, options: &str) {
    if !options.is_empty() {
        warn!(
            "Ignoring output options '{}' for output '{}': output already exists",
            options,
            output.name()
        );
    }
}

fn create_output(name: &str, options: &str) -> Result<Arc<dyn LogOutput>> {
    let Some(template) = name.strip_prefix("file=") else {
        return Err(OutputError::UnsupportedType(name.to_string()).into());
    };
    let output = FileOutput::new(template);
    output.initialize(options).map_err(|source| OutputError::Initialize {
        name: name.to_string(),
        options: options.to_string(),
        source: Box::new(source),
    })?;
    info!(output = name, "Created log output");
    Ok(Arc::new(output))
}

fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

/// Map the `output` part of a command to a registry name or index.
fn normalize_output_name(text: &str) -> Result<OutputRef> {
    match text {
        "" | "stdout" => return Ok(OutputRef::Name("stdout".to_string())),
        "stderr" => return Ok(OutputRef::Name("stderr".to_string())),
        _ => {}
    }
    if let Some(index) = text.strip_prefix('#') {
        return index
            .parse()
            .map(OutputRef::Index)
            .map_err(|_| ConfigError::NoSuchOutput(text.to_string()));
    }
    if text.starts_with('"') {
        return Ok(OutputRef::Name(format!("file={}", unquote(text))));
    }
    match text.split_once('=') {
        Some(("file", path)) if !path.is_empty() => Ok(OutputRef::Name(format!("file={}", unquote(path)))),
        Some((kind, _)) => Err(OutputError::UnsupportedType(kind.to_string()).into()),
        None => Ok(OutputRef::Name(format!("file={}", text))),
    }
}

/// Split a command on `:` outside double quotes into at most four parts.
fn split_command(command: &str) -> Result<Vec<&str>> {
    let mut parts = Vec::with_capacity(4);
    let mut start = 0;
    let mut quoted = false;
    for (i, c) in command.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ':' if !quoted => {
                parts.push(&command[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if quoted {
        return Err(ConfigError::MalformedCommand(command.to_string()));
    }
    parts.push(&command[start..]);
    if parts.len() > 4 {
        return Err(ConfigError::MalformedCommand(command.to_string()));
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    fn config() -> LogConfiguration {
        LogConfiguration::with_streams(Box::new(std::io::sink()), Box::new(std::io::sink()))
    }

    #[test]
    fn test_split_command_respects_quotes() {
        assert_eq!(split_command("gc").unwrap(), vec!["gc"]);
        assert_eq!(
            split_command("gc=debug:file=\"C:\\logs\\gc.log\":uptime:filecount=2").unwrap(),
            vec!["gc=debug", "file=\"C:\\logs\\gc.log\"", "uptime", "filecount=2"]
        );
        assert!(split_command("gc:stdout:uptime:filecount=2:extra").is_err());
        assert!(split_command("gc:\"unterminated").is_err());
    }

    #[test]
    fn test_normalize_output_name() {
        assert_eq!(normalize_output_name("").unwrap(), OutputRef::Name("stdout".into()));
        assert_eq!(normalize_output_name("#3").unwrap(), OutputRef::Index(3));
        assert_eq!(normalize_output_name("gc.log").unwrap(), OutputRef::Name("file=gc.log".into()));
        assert_eq!(
            normalize_output_name("file=\"a:b.log\"").unwrap(),
            OutputRef::Name("file=a:b.log".into())
        );
        assert!(matches!(
            normalize_output_name("socket=localhost"),
            Err(ConfigError::Output(OutputError::UnsupportedType(_)))
        ));
        assert!(normalize_output_name("#x").is_err());
    }

    #[test]
    fn test_standard_outputs_survive_everything() {
        let config = config();
        config.tag_set(&[Tag::Gc]).unwrap();
        config.parse_command("gc=debug:stderr").unwrap();
        config.parse_command(DISABLE_COMMAND).unwrap();
        config.parse_command("all=off:stdout").unwrap();
        let outputs = config.outputs();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[STDOUT_INDEX].name(), "stdout");
        assert_eq!(outputs[STDERR_INDEX].name(), "stderr");
        assert_eq!(outputs[STDERR_INDEX].config_string(), "all=off");
    }

    #[test]
    fn test_new_tag_set_follows_existing_configuration() {
        let config = config();
        config.parse_command("gc*=debug:stdout").unwrap();
        let ts = config.tag_set(&[Tag::Gc, Tag::Heap]).unwrap();
        assert_eq!(ts.level_for(config.stdout().id()), Level::Debug);
        assert_eq!(ts.level_for(config.stderr().id()), Level::Warning);

        let other = config.tag_set(&[Tag::Class]).unwrap();
        assert_eq!(other.level_for(config.stdout().id()), Level::Off);
    }

    #[test]
    fn test_rejected_command_changes_nothing() {
        let config = config();
        let ts = config.tag_set(&[Tag::Gc]).unwrap();
        config.parse_command("gc=info").unwrap();
        assert!(config.parse_command("gc=trace:stdout:colour").is_err());
        assert!(config.parse_command("gc=verbose").is_err());
        assert_eq!(ts.level_for(config.stdout().id()), Level::Info);
        assert_eq!(config.stdout().config_string(), "gc=info");
    }

    #[test]
    fn test_file_output_lifecycle() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gc.log");
        let config = config();
        let ts = config.tag_set(&[Tag::Gc]).unwrap();

        config
            .parse_command(&format!("gc=debug:file={}::filecount=2", path.display()))
            .unwrap();
        assert_eq!(config.output_count(), 3);
        let handle = config.find_output_by_name(&format!("file={}", path.display())).unwrap();
        assert_eq!(handle.index(), 2);
        assert!(ts.is_level(Level::Debug));

        // Reconfiguring by index keeps the output; options are ignored.
        config.parse_command("gc=trace:#2::filecount=4").unwrap();
        let output = config.output(handle).unwrap();
        assert_eq!(output.options_description().unwrap(), "filecount=2,filesize=20M");
        assert_eq!(output.config_string(), "gc=trace");

        config.parse_command("gc=off:#2").unwrap();
        assert_eq!(config.output_count(), 2);
        assert!(matches!(config.output(handle), Err(ConfigError::StaleHandle { index: 2 })));
    }

    #[test]
    fn test_file_output_matching_no_tag_set_is_removed() {
        let dir = tempdir().unwrap();
        let config = config();
        config.register_tag_sets(&[&[Tag::Gc]]).unwrap();

        let path = dir.path().join("class.log");
        config.parse_command(&format!("class=info:{}", path.display())).unwrap();
        assert_eq!(config.output_count(), 2);
        assert!(config.find_output_by_name(&format!("file={}", path.display())).is_none());

        config.parse_command(&format!("gc=info:{}", path.display())).unwrap();
        assert_eq!(config.output_count(), 3);
        config.parse_command("gc=off,class=debug:#2").unwrap();
        assert_eq!(config.output_count(), 2);
    }

    #[test]
    fn test_update_overflowing_live_config_is_rejected() {
        let config = config();
        let clauses: Vec<String> = Tag::ALL[..MAX_SELECTIONS]
            .iter()
            .map(|t| format!("{}=info", t.name()))
            .collect();
        let command = format!("{}:stderr", clauses.join(","));

        // stderr keeps its all=warning base, which would be a 33rd clause.
        assert!(matches!(
            config.parse_command(&command),
            Err(ConfigError::Selection(SelectionError::TooManySelections(_)))
        ));
        assert_eq!(config.stderr().config_string(), "all=warning");

        config.parse_command(&format!("{}:stdout", clauses.join(","))).unwrap();
        assert_eq!(config.stdout().config_string(), clauses.join(","));
    }

    #[test]
    fn test_handles_detect_swap_remove() {
        let dir = tempdir().unwrap();
        let config = config();
        config.tag_set(&[Tag::Gc]).unwrap();
        let a = dir.path().join("a.log");
        let b = dir.path().join("b.log");
        config.parse_command(&format!("gc:{}", a.display())).unwrap();
        config.parse_command(&format!("gc:{}", b.display())).unwrap();
        let handle_a = config.find_output_by_name(&format!("file={}", a.display())).unwrap();
        let handle_b = config.find_output_by_name(&format!("file={}", b.display())).unwrap();

        assert_eq!(handle_b.index(), 3);

        config.disable_output(handle_a).unwrap();
        // b was moved into a's slot; neither old handle may reach it.
        assert!(config.output(handle_a).is_err());
        assert!(config.output(handle_b).is_err());
        assert!(config.configure_output(handle_b, &Selection::all(Level::Off), None).is_err());

        let moved = config.find_output_by_name(&format!("file={}", b.display())).unwrap();
        assert_eq!(moved.index(), 2);
        assert_eq!(moved.id(), handle_b.id());
        assert_eq!(config.output(moved).unwrap().name(), format!("file={}", b.display()));
    }

    #[test]
    fn test_decorators_default_and_keep() {
        let config = config();
        config.parse_command("gc=info:stdout:level,pid").unwrap();
        assert_eq!(config.stdout().decorators().to_string(), "pid,level");
        config.parse_command("class=info:stdout").unwrap();
        assert_eq!(config.stdout().decorators().to_string(), "pid,level");
        config.parse_command("class=info:stdout:none").unwrap();
        assert_eq!(config.stdout().decorators(), DecoratorSet::NONE);
    }

    #[test]
    fn test_configure_stdout() {
        let config = config();
        let exact = config.tag_set(&[Tag::Safepoint]).unwrap();
        let wider = config.tag_set(&[Tag::Safepoint, Tag::Stats]).unwrap();
        config.configure_stdout(Level::Debug, true, &[Tag::Safepoint]).unwrap();
        assert_eq!(exact.level_for(config.stdout().id()), Level::Debug);
        assert_eq!(wider.level_for(config.stdout().id()), Level::Off);
        config.configure_stdout(Level::Info, false, &[Tag::Safepoint]).unwrap();
        assert_eq!(wider.level_for(config.stdout().id()), Level::Info);
        assert_eq!(config.stdout().config_string(), "safepoint*=info");
    }

    #[test]
    fn test_update_listeners_fire_on_success_only() {
        let config = config();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        config.register_update_listener(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        config.parse_command("gc=info").unwrap();
        let _ = config.parse_command("gc=bogus");
        config.disable_logging();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_describe_lists_vocabulary_and_outputs() {
        let config = config();
        config.parse_command("gc=info:stdout:uptime,level").unwrap();
        let text = config.describe();
        assert!(text.contains("Available log levels: off, error, warning, info, debug, trace"));
        assert!(text.contains("uptimemillis (um)"));
        assert!(text.contains("safepoint"));
        assert!(text.contains(" #0: stdout gc=info uptime,level"));
        assert!(text.contains(" #1: stderr all=warning uptime,level,tags"));
    }
}
