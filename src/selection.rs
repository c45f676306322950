//! # Selection Expressions
//!
//! A selection maps tag combinations to levels:
//!
//! ```text
//! selection := clause (',' clause)*
//! clause    := ('all' | tag ('+' tag)*) ['*'] ['=' level]
//! ```
//!
//! `gc+heap=debug` selects exactly the tag-set `{gc, heap}`; the trailing
//! wildcard in `gc*=info` selects every tag-set that contains `gc`; `all`
//! selects every tag-set. A clause without a level means `info`.
//!
//! ## Resolution
//!
//! Clauses are evaluated in order and the **last** matching clause decides
//! the level, so `all=warning,gc=info` gives `{gc}` info and everything else
//! warning, while `gc=info,all=warning` gives warning to everything.
//!
//! ## Example
//!
//! ```rust
//! use unilog::{Level, Selection};
//!
//! let selection = Selection::parse("all=warning,gc*=debug").unwrap();
//! assert_eq!(selection.to_string(), "all=warning,gc*=debug");
//! assert_eq!(selection.clauses().len(), 2);
//! assert_eq!(selection.clauses()[1].level(), Level::Debug);
//! ```

use crate::error::SelectionError;
use crate::level::Level;
use crate::tag::{Tag, MAX_TAGS_PER_SET};
use crate::tagset::TagSet;
use std::fmt;
use std::sync::Arc;

/// Maximum number of clauses in one parsed selection.
pub const MAX_SELECTIONS: usize = 32;

/// Maximum number of "did you mean" suggestions per unmatched clause.
const MAX_SUGGESTIONS: usize = 5;

/// One `tags[*]=level` clause.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogSelection {
    tags: Vec<Tag>,
    wildcard: bool,
    level: Level,
}

impl LogSelection {
    pub fn new(tags: &[Tag], wildcard: bool, level: Level) -> Self {
        Self {
            tags: tags.to_vec(),
            wildcard: wildcard || tags.is_empty(),
            level,
        }
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Whether tag-sets with tags beyond the clause's own also match.
    pub fn allows_other_tags(&self) -> bool {
        self.wildcard
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// The clause is `all`.
    pub fn is_all(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn matches(&self, tag_set: &TagSet) -> bool {
        self.matches_tags(tag_set.tags())
    }

    fn matches_tags(&self, tags: &[Tag]) -> bool {
        (self.wildcard || tags.len() == self.tags.len()) && self.tags.iter().all(|t| tags.contains(t))
    }

    /// Whether every tag-set matched by `other` is also matched by `self`.
    fn subsumes(&self, other: &LogSelection) -> bool {
        let tags_covered = self.tags.iter().all(|t| other.tags.contains(t));
        tags_covered && (self.wildcard || (!other.wildcard && self.tags.len() == other.tags.len()))
    }

    fn parse(text: &str) -> Result<Self, SelectionError> {
        if text.chars().any(char::is_whitespace) {
            return Err(SelectionError::Malformed(text.to_string()));
        }
        let (combo, level) = match text.split_once('=') {
            Some((combo, level_text)) => {
                let level = Level::from_name(level_text)
                    .ok_or_else(|| SelectionError::UnknownLevel(level_text.to_string()))?;
                (combo, level)
            }
            None => (text, Level::UNSPECIFIED_DEFAULT),
        };

        let (combo, wildcard) = match combo.strip_suffix('*') {
            Some(stripped) => (stripped, true),
            None => (combo, false),
        };
        if combo.is_empty() || combo.contains('*') {
            return Err(SelectionError::Malformed(text.to_string()));
        }

        if combo.eq_ignore_ascii_case("all") {
            if wildcard {
                return Err(SelectionError::Malformed(text.to_string()));
            }
            return Ok(LogSelection::new(&[], true, level));
        }

        let mut tags = Vec::with_capacity(MAX_TAGS_PER_SET);
        for name in combo.split('+') {
            if name.is_empty() {
                return Err(SelectionError::EmptyTag(text.to_string()));
            }
            let tag = Tag::from_name(name).ok_or_else(|| SelectionError::UnknownTag(name.to_string()))?;
            if tags.contains(&tag) {
                return Err(SelectionError::DuplicateTag {
                    selection: text.to_string(),
                    tag: name.to_string(),
                });
            }
            tags.push(tag);
        }
        if tags.len() > MAX_TAGS_PER_SET {
            return Err(SelectionError::TooManyTags(text.to_string()));
        }
        Ok(LogSelection::new(&tags, wildcard, level))
    }

    fn fmt_tags(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            return f.write_str("all");
        }
        for (i, tag) in self.tags.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            f.write_str(tag.name())?;
        }
        if self.wildcard {
            f.write_str("*")?;
        }
        Ok(())
    }
}

impl fmt::Display for LogSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tags(f)?;
        write!(f, "={}", self.level)
    }
}

/// A clause that matched no registered tag-set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnmatchedSelection {
    /// The clause as written in canonical form, without its level.
    pub selection: String,
    /// Labels of registered tag-sets that contain every tag of the clause.
    pub suggestions: Vec<String>,
}

impl fmt::Display for UnmatchedSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No tag set matches selection: {}.", self.selection)?;
        if !self.suggestions.is_empty() {
            write!(
                f,
                " Did you mean any of the following? {}",
                self.suggestions.join(" ")
            )?;
        }
        Ok(())
    }
}

/// An ordered list of clauses; see the module documentation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    clauses: Vec<LogSelection>,
}

impl Selection {
    /// Parse a selection expression. An empty expression means `all`.
    pub fn parse(text: &str) -> Result<Self, SelectionError> {
        let text = text.trim();
        let text = if text.is_empty() { "all" } else { text };

        let mut clauses = Vec::new();
        for clause in text.split(',') {
            if clause.is_empty() {
                return Err(SelectionError::Malformed(text.to_string()));
            }
            if clauses.len() == MAX_SELECTIONS {
                return Err(SelectionError::TooManySelections(text.to_string()));
            }
            clauses.push(LogSelection::parse(clause)?);
        }
        Ok(Self { clauses })
    }

    /// `all=<level>`.
    pub fn all(level: Level) -> Self {
        Self::single(LogSelection::new(&[], true, level))
    }

    pub fn single(clause: LogSelection) -> Self {
        Self { clauses: vec![clause] }
    }

    pub fn clauses(&self) -> &[LogSelection] {
        &self.clauses
    }

    /// Level of the last clause matching `tag_set`, or `None` if no clause
    /// mentions it.
    pub fn resolve(&self, tag_set: &TagSet) -> Option<Level> {
        self.resolve_tags(tag_set.tags())
    }

    /// Like [`resolve`](Selection::resolve), for a tag combination that may
    /// not be registered.
    pub fn resolve_tags(&self, tags: &[Tag]) -> Option<Level> {
        self.clauses
            .iter()
            .rev()
            .find(|clause| clause.matches_tags(tags))
            .map(|clause| clause.level)
    }

    /// Clauses that match none of `tag_sets`, with suggestions of tag-sets
    /// that would have matched had the clause ended with `*`.
    pub fn verify_against_registry(&self, tag_sets: &[Arc<TagSet>]) -> Vec<UnmatchedSelection> {
        self.clauses
            .iter()
            .filter(|clause| !clause.is_all())
            .filter(|clause| !tag_sets.iter().any(|ts| clause.matches(ts)))
            .map(|clause| {
                let suggestions = tag_sets
                    .iter()
                    .filter(|ts| clause.tags.iter().all(|t| ts.contains(*t)))
                    .take(MAX_SUGGESTIONS)
                    .map(|ts| ts.tags().iter().map(|t| t.name()).collect::<Vec<_>>().join("+"))
                    .collect();
                UnmatchedSelection {
                    selection: TagsOnly(clause).to_string(),
                    suggestions,
                }
            })
            .collect()
    }

    /// A selection equivalent to applying `self` and then `later`.
    ///
    /// Clauses that a later clause fully subsumes can never be the last
    /// match, so they are dropped; the result is therefore also the minimal
    /// live config-string for an output configured in several steps.
    pub fn compose(&self, later: &Selection) -> Selection {
        let combined: Vec<&LogSelection> = self.clauses.iter().chain(later.clauses.iter()).collect();
        let clauses = combined
            .iter()
            .enumerate()
            .filter(|(i, clause)| !combined[i + 1..].iter().any(|after| after.subsumes(clause)))
            .map(|(_, clause)| (*clause).clone())
            .collect();
        Selection { clauses }
    }

    /// Drops leading `off` clauses, keeping at least one clause.
    ///
    /// A leading `off` clause only decides tag-sets no later clause matches,
    /// and an output treats those as `off` anyway.
    pub fn without_leading_off(mut self) -> Selection {
        let leading = self.clauses.iter().take_while(|c| c.level == Level::Off).count();
        let leading = leading.min(self.clauses.len().saturating_sub(1));
        self.clauses.drain(..leading);
        self
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", clause)?;
        }
        Ok(())
    }
}

struct TagsOnly<'a>(&'a LogSelection);

impl fmt::Display for TagsOnly<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_tags(f)
    }
}
