//! Per-call snapshot of decoration values.
//!
//! A [`Decorations`] is built right before a message is written, against the
//! merged decorator set of the tag-set, so every output enabled on that
//! tag-set can pick the values it needs. Values are rendered once into a
//! single buffer; the level and the tag label are not rendered but derived
//! on demand, since both are already available as static/immutable strings.

use crate::decorators::{Decorator, DecoratorSet, DECORATOR_COUNT};
use crate::level::Level;
use crate::os;
use crate::tagset::TagSet;
use std::fmt::Write;
use std::ops::Range;
use std::sync::Arc;

/// Initial capacity of the decoration buffer; enough for every time-based
/// decorator plus pid and tid without reallocating.
pub const DECORATIONS_BUFFER_SIZE: usize = 256;

/// Rendered decorations of one log call.
#[derive(Clone, Debug)]
pub struct Decorations {
    level: Level,
    tag_set: Arc<TagSet>,
    decorators: DecoratorSet,
    buffer: String,
    offsets: [Option<Range<usize>>; DECORATOR_COUNT],
}

impl Decorations {
    /// Capture the current value of every decorator in `decorators`.
    pub fn new(level: Level, tag_set: &Arc<TagSet>, decorators: DecoratorSet) -> Self {
        let mut decorations = Decorations {
            level,
            tag_set: Arc::clone(tag_set),
            decorators,
            buffer: String::with_capacity(DECORATIONS_BUFFER_SIZE),
            offsets: Default::default(),
        };
        for decorator in decorators.iter() {
            decorations.render(decorator);
        }
        decorations
    }

    fn render(&mut self, decorator: Decorator) {
        let start = self.buffer.len();
        let buf = &mut self.buffer;
        // Writing into a String cannot fail.
        let _ = match decorator {
            Decorator::Time => write!(buf, "{}", os::now_local().format("%Y-%m-%dT%H:%M:%S%.3f%z")),
            Decorator::UtcTime => write!(buf, "{}", os::now_utc().format("%Y-%m-%dT%H:%M:%S%.3f+0000")),
            Decorator::Uptime => write!(buf, "{:.3}s", os::uptime().as_secs_f64()),
            Decorator::TimeMillis => write!(buf, "{}ms", os::current_timestamp_ns() / 1_000_000),
            Decorator::UptimeMillis => write!(buf, "{}ms", os::uptime().as_millis()),
            Decorator::TimeNanos => write!(buf, "{}ns", os::current_timestamp_ns()),
            Decorator::UptimeNanos => write!(buf, "{}ns", os::uptime().as_nanos()),
            Decorator::Hostname => buf.write_str(os::hostname()),
            Decorator::Pid => write!(buf, "{}", os::process_id()),
            Decorator::Tid => write!(buf, "{}", os::thread_id()),
            Decorator::Level | Decorator::Tags => return,
        };
        self.offsets[decorator.index()] = Some(start..self.buffer.len());
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Change the level without re-rendering the other decorations.
    pub fn set_level(&mut self, level: Level) {
        self.level = level;
    }

    pub fn tag_set(&self) -> &Arc<TagSet> {
        &self.tag_set
    }

    /// Decorators captured by this snapshot.
    pub fn decorators(&self) -> DecoratorSet {
        self.decorators
    }

    /// Rendered value of `decorator`, or `None` if it was not captured.
    pub fn decoration(&self, decorator: Decorator) -> Option<&str> {
        if !self.decorators.contains(decorator) {
            return None;
        }
        match decorator {
            Decorator::Level => Some(self.level.name()),
            Decorator::Tags => Some(self.tag_set.label()),
            _ => self.offsets[decorator.index()]
                .as_ref()
                .map(|range| &self.buffer[range.clone()]),
        }
    }
}
