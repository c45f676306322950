use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Verbosity of a message, and threshold of an output on a tag-set.
///
/// The variants are ordered from least to most verbose, so a message at
/// level `L` passes an output threshold `T` iff `T != Off && L <= T`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Level {
    Off = 0,
    Error = 1,
    Warning = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl Level {
    /// Every level, least verbose first.
    pub const ALL: [Level; 6] = [
        Level::Off,
        Level::Error,
        Level::Warning,
        Level::Info,
        Level::Debug,
        Level::Trace,
    ];

    /// Level assigned to a selection clause that names no level, e.g. `gc`.
    pub const UNSPECIFIED_DEFAULT: Level = Level::Info;

    /// Lower-case name used in selections and in the `level` decoration.
    pub fn name(self) -> &'static str {
        match self {
            Level::Off => "off",
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "trace",
        }
    }

    /// Case-insensitive lookup of a level name.
    pub fn from_name(name: &str) -> Option<Level> {
        Level::ALL
            .iter()
            .copied()
            .find(|level| level.name().eq_ignore_ascii_case(name))
    }

    /// Whether a message at `self` is emitted by an output with threshold `threshold`.
    #[inline]
    pub fn passes(self, threshold: Level) -> bool {
        threshold != Level::Off && self != Level::Off && self <= threshold
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::Off
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::from_name(s).ok_or_else(|| format!("Invalid level '{}'", s))
    }
}
