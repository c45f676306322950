use crate::error::DecoratorError;
use std::fmt;

/// A formatting add-on that can be prepended to every emitted line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Decorator {
    /// Local wall-clock time, ISO-8601 with milliseconds and offset
    Time,
    /// UTC wall-clock time, ISO-8601 with milliseconds
    UtcTime,
    /// Seconds since start, millisecond precision
    Uptime,
    TimeMillis,
    UptimeMillis,
    TimeNanos,
    UptimeNanos,
    Hostname,
    Pid,
    Tid,
    Level,
    Tags,
}

/// Number of decorators in the catalog.
pub const DECORATOR_COUNT: usize = 12;

impl Decorator {
    /// The whole catalog in output order.
    pub const ALL: [Decorator; DECORATOR_COUNT] = [
        Decorator::Time,
        Decorator::UtcTime,
        Decorator::Uptime,
        Decorator::TimeMillis,
        Decorator::UptimeMillis,
        Decorator::TimeNanos,
        Decorator::UptimeNanos,
        Decorator::Hostname,
        Decorator::Pid,
        Decorator::Tid,
        Decorator::Level,
        Decorator::Tags,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Decorator::Time => "time",
            Decorator::UtcTime => "utctime",
            Decorator::Uptime => "uptime",
            Decorator::TimeMillis => "timemillis",
            Decorator::UptimeMillis => "uptimemillis",
            Decorator::TimeNanos => "timenanos",
            Decorator::UptimeNanos => "uptimenanos",
            Decorator::Hostname => "hostname",
            Decorator::Pid => "pid",
            Decorator::Tid => "tid",
            Decorator::Level => "level",
            Decorator::Tags => "tags",
        }
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            Decorator::Time => "t",
            Decorator::UtcTime => "utc",
            Decorator::Uptime => "u",
            Decorator::TimeMillis => "tm",
            Decorator::UptimeMillis => "um",
            Decorator::TimeNanos => "tn",
            Decorator::UptimeNanos => "un",
            Decorator::Hostname => "hn",
            Decorator::Pid => "p",
            Decorator::Tid => "ti",
            Decorator::Level => "l",
            Decorator::Tags => "tg",
        }
    }

    /// Looks a decorator up by full name or abbreviation, ignoring case.
    pub fn from_name(name: &str) -> Option<Decorator> {
        Decorator::ALL.iter().copied().find(|d| {
            d.name().eq_ignore_ascii_case(name) || d.abbreviation().eq_ignore_ascii_case(name)
        })
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    #[inline]
    fn mask(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for Decorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of decorators stored as a bit-vector over [`Decorator::ALL`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DecoratorSet(u16);

impl DecoratorSet {
    /// The empty set, spelled `none` in configuration text.
    pub const NONE: DecoratorSet = DecoratorSet(0);

    /// `uptime,level,tags`, applied when a new output names no decorators.
    pub const DEFAULT: DecoratorSet = DecoratorSet(
        (1 << Decorator::Uptime as u16) | (1 << Decorator::Level as u16) | (1 << Decorator::Tags as u16),
    );

    pub fn from_decorators(decorators: &[Decorator]) -> Self {
        let mut set = DecoratorSet::NONE;
        for &d in decorators {
            set.insert(d);
        }
        set
    }

    /// Parses a comma separated list of decorator names or abbreviations.
    ///
    /// `none` yields the empty set. An empty string is not handled here: the
    /// configurator decides what an omitted decorator list means.
    pub fn parse(text: &str) -> Result<Self, DecoratorError> {
        let mut set = DecoratorSet::NONE;
        let mut saw_none = false;
        let mut count = 0;
        for token in text.split(',') {
            count += 1;
            if token.eq_ignore_ascii_case("none") {
                saw_none = true;
                continue;
            }
            let decorator =
                Decorator::from_name(token).ok_or_else(|| DecoratorError::Unknown(token.to_string()))?;
            set.insert(decorator);
        }
        if saw_none && count > 1 {
            return Err(DecoratorError::NoneCombined(text.to_string()));
        }
        Ok(set)
    }

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn from_bits(bits: u16) -> Self {
        DecoratorSet(bits & ((1 << DECORATOR_COUNT) - 1))
    }

    pub fn insert(&mut self, decorator: Decorator) {
        self.0 |= decorator.mask();
    }

    pub fn contains(self, decorator: Decorator) -> bool {
        self.0 & decorator.mask() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Bitwise union of two sets.
    pub fn merge(self, other: DecoratorSet) -> DecoratorSet {
        DecoratorSet(self.0 | other.0)
    }

    /// Decorators of the set in catalog order.
    pub fn iter(self) -> impl Iterator<Item = Decorator> {
        Decorator::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

impl fmt::Display for DecoratorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        for (i, decorator) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(decorator.name())?;
        }
        Ok(())
    }
}

impl fmt::Debug for DecoratorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DecoratorSet({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_and_abbreviations() {
        let set = DecoratorSet::parse("uptime,l,tg").unwrap();
        assert_eq!(set, DecoratorSet::DEFAULT);
        assert_eq!(set.to_string(), "uptime,level,tags");

        let set = DecoratorSet::parse("utc,pid,tid").unwrap();
        assert!(set.contains(Decorator::UtcTime));
        assert!(set.contains(Decorator::Pid));
        assert!(!set.contains(Decorator::Time));
    }

    #[test]
    fn test_parse_none() {
        assert_eq!(DecoratorSet::parse("none").unwrap(), DecoratorSet::NONE);
        assert_eq!(DecoratorSet::NONE.to_string(), "none");
        assert!(DecoratorSet::parse("none,uptime").is_err());
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(
            DecoratorSet::parse("uptime,colour"),
            Err(DecoratorError::Unknown("colour".to_string()))
        );
        assert!(DecoratorSet::parse("uptime,,level").is_err());
    }

    #[test]
    fn test_merge_is_union() {
        let a = DecoratorSet::from_decorators(&[Decorator::Time, Decorator::Pid]);
        let b = DecoratorSet::from_decorators(&[Decorator::Pid, Decorator::Level]);
        let merged = a.merge(b);
        assert_eq!(merged.iter().count(), 3);
        assert_eq!(merged.merge(DecoratorSet::NONE), merged);
    }
}
