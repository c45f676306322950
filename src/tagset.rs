//! # Tag-sets and the Tag-set Registry
//!
//! A tag-set is the immutable combination of tags attached to a call site,
//! e.g. `{gc, heap}`. Each distinct combination is created exactly once and
//! lives for the rest of the process in the append-only [`TagSetRegistry`].
//!
//! ## Level tables
//!
//! Every tag-set carries a [`LevelTable`]: the outputs it is enabled on,
//! the threshold for each, the merged decorators of those outputs and the
//! maximum threshold. The table is replaced wholesale by the configurator
//! (under the configuration lock) and read lock-free by log call sites
//! through an [`ArcSwap`], so a reader always sees either the old or the new
//! table, never a half-updated one.
//!
//! ## Reader barrier
//!
//! Emission brackets its use of a table with [`TagSet::enter`]. Switching to
//! asynchronous logging calls [`TagSet::wait_until_no_readers`] on every
//! tag-set so that no thread is still writing through the synchronous path
//! once the background writer starts.

use crate::decorators::DecoratorSet;
use crate::error::TagSetError;
use crate::level::Level;
use crate::output::{LogOutput, OutputId};
use crate::tag::{Tag, MAX_TAGS_PER_SET};
use arc_swap::{ArcSwap, Guard};
use crossbeam::utils::Backoff;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Threshold of one output on one tag-set.
#[derive(Clone)]
pub struct OutputLevel {
    pub output: Arc<dyn LogOutput>,
    pub level: Level,
}

/// Snapshot of where a tag-set's messages go.
///
/// Only outputs with a level other than `Off` are stored.
#[derive(Clone, Default)]
pub struct LevelTable {
    entries: Vec<OutputLevel>,
    decorators: DecoratorSet,
    max_level: Level,
}

impl LevelTable {
    fn single(output: Arc<dyn LogOutput>, level: Level) -> Self {
        let mut table = LevelTable::default();
        table.set(output, level);
        table
    }

    /// Enabled outputs and their thresholds, in the order they were enabled.
    pub fn entries(&self) -> &[OutputLevel] {
        &self.entries
    }

    /// Union of the decorators of every enabled output.
    pub fn decorators(&self) -> DecoratorSet {
        self.decorators
    }

    /// Most verbose threshold over all outputs.
    pub fn max_level(&self) -> Level {
        self.max_level
    }

    pub fn level_for(&self, id: OutputId) -> Level {
        self.entries
            .iter()
            .find(|entry| entry.output.id() == id)
            .map(|entry| entry.level)
            .unwrap_or(Level::Off)
    }

    fn set(&mut self, output: Arc<dyn LogOutput>, level: Level) {
        let id = output.id();
        let existing = self.entries.iter().position(|e| e.output.id() == id);
        match (existing, level) {
            (Some(pos), Level::Off) => {
                self.entries.remove(pos);
            }
            (Some(pos), level) => self.entries[pos].level = level,
            (None, Level::Off) => {}
            (None, level) => self.entries.push(OutputLevel { output, level }),
        }
        self.recompute();
    }

    fn recompute(&mut self) {
        self.max_level = self
            .entries
            .iter()
            .map(|e| e.level)
            .max()
            .unwrap_or(Level::Off);
        self.decorators = self
            .entries
            .iter()
            .fold(DecoratorSet::NONE, |acc, e| acc.merge(e.output.decorators()));
    }
}

/// An immutable combination of 1 to 5 distinct tags.
pub struct TagSet {
    tags: Box<[Tag]>,
    label: String,
    table: ArcSwap<LevelTable>,
    readers: AtomicUsize,
}

/// Marks a thread as reading a tag-set's level table; see [`TagSet::enter`].
pub struct ReaderGuard<'a> {
    tag_set: &'a TagSet,
}

impl Drop for ReaderGuard<'_> {
    fn drop(&mut self) {
        self.tag_set.readers.fetch_sub(1, Ordering::Release);
    }
}

impl TagSet {
    /// Create a tag-set whose only enabled entry is `stderr` at `Warning`.
    pub(crate) fn new(tags: &[Tag], stderr: Arc<dyn LogOutput>) -> Result<Self, TagSetError> {
        validate_tags(tags)?;
        let label = tags.iter().map(|t| t.name()).collect::<Vec<_>>().join(",");
        Ok(Self {
            tags: tags.into(),
            label,
            table: ArcSwap::from_pointee(LevelTable::single(stderr, Level::Warning)),
            readers: AtomicUsize::new(0),
        })
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    /// Comma separated tag names, as printed by the `tags` decorator.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Current level table (lock-free).
    pub fn table(&self) -> Guard<Arc<LevelTable>> {
        self.table.load()
    }

    /// Whether any output would emit a message at `level`.
    #[inline]
    pub fn is_level(&self, level: Level) -> bool {
        level.passes(self.table.load().max_level)
    }

    pub fn level_for(&self, id: OutputId) -> Level {
        self.table.load().level_for(id)
    }

    pub fn decorators(&self) -> DecoratorSet {
        self.table.load().decorators
    }

    /// Register the calling thread as a reader until the guard is dropped.
    pub fn enter(&self) -> ReaderGuard<'_> {
        self.readers.fetch_add(1, Ordering::SeqCst);
        ReaderGuard { tag_set: self }
    }

    /// Block until no thread holds a [`ReaderGuard`] for this tag-set.
    ///
    /// Readers that enter after this call starts are not waited for; the
    /// caller must publish whatever state those readers should observe first.
    pub fn wait_until_no_readers(&self) {
        let backoff = Backoff::new();
        while self.readers.load(Ordering::SeqCst) != 0 {
            backoff.snooze();
        }
    }

    /// Set `output`'s threshold. Must be called with the configuration lock held.
    pub(crate) fn set_output_level(&self, output: &Arc<dyn LogOutput>, level: Level) {
        let mut table = LevelTable::clone(&self.table.load());
        table.set(Arc::clone(output), level);
        self.table.store(Arc::new(table));
    }
}

impl fmt::Debug for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagSet")
            .field("tags", &self.label)
            .field("max_level", &self.table.load().max_level)
            .finish()
    }
}

fn validate_tags(tags: &[Tag]) -> Result<(), TagSetError> {
    if tags.is_empty() {
        return Err(TagSetError::Empty);
    }
    if tags.len() > MAX_TAGS_PER_SET {
        return Err(TagSetError::TooManyTags(tags.len()));
    }
    for (i, tag) in tags.iter().enumerate() {
        if tags[..i].contains(tag) {
            return Err(TagSetError::DuplicateTag(*tag));
        }
    }
    Ok(())
}

fn registry_key(tags: &[Tag]) -> Vec<Tag> {
    let mut key = tags.to_vec();
    key.sort();
    key
}

/// Append-only registry of every tag-set ever created.
///
/// Lookup treats a tag combination as a set: `{heap, gc}` finds the tag-set
/// first created as `{gc, heap}`, and keeps the original tag order.
#[derive(Default)]
pub struct TagSetRegistry {
    inner: RwLock<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    sets: Vec<Arc<TagSet>>,
    index: HashMap<Vec<Tag>, usize>,
}

impl TagSetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, tags: &[Tag]) -> Option<Arc<TagSet>> {
        let inner = self.inner.read();
        inner
            .index
            .get(&registry_key(tags))
            .map(|&i| Arc::clone(&inner.sets[i]))
    }

    /// Insert `tag_set` unless an equal combination raced in first; returns the winner.
    pub(crate) fn insert(&self, tag_set: TagSet) -> Arc<TagSet> {
        let mut inner = self.inner.write();
        let key = registry_key(tag_set.tags());
        if let Some(&i) = inner.index.get(&key) {
            return Arc::clone(&inner.sets[i]);
        }
        let tag_set = Arc::new(tag_set);
        let position = inner.sets.len();
        inner.sets.push(Arc::clone(&tag_set));
        inner.index.insert(key, position);
        tag_set
    }

    /// All registered tag-sets in creation order.
    pub fn snapshot(&self) -> Vec<Arc<TagSet>> {
        self.inner.read().sets.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
