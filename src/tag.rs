//! The fixed catalog of log tags.
//!
//! Tags are interned at build time: the `define_tags!` invocation below is
//! the manifest of every subsystem name a call site may use. Parsing a name
//! that is not in the catalog fails, which is how typos in a selection such
//! as `gc+hep=debug` are caught.

use std::fmt;

/// Maximum number of tags in one tag-set or one selection clause.
pub const MAX_TAGS_PER_SET: usize = 5;

macro_rules! define_tags {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// An atomic log tag identifying the subsystem of a call site.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Tag {
            $($variant),+
        }

        impl Tag {
            /// Every tag of the catalog, in declaration order.
            pub const ALL: &'static [Tag] = &[$(Tag::$variant),+];

            /// The textual name used in selections and tag labels.
            pub fn name(self) -> &'static str {
                match self {
                    $(Tag::$variant => $name),+
                }
            }
        }
    };
}

define_tags! {
    Add => "add",
    Age => "age",
    Alloc => "alloc",
    Arguments => "arguments",
    Async => "async",
    Cds => "cds",
    Class => "class",
    Cleanup => "cleanup",
    Codecache => "codecache",
    Compaction => "compaction",
    Compilation => "compilation",
    Container => "container",
    Cpu => "cpu",
    Ergo => "ergo",
    Exceptions => "exceptions",
    Exit => "exit",
    Gc => "gc",
    Handshake => "handshake",
    Heap => "heap",
    Init => "init",
    Inlining => "inlining",
    Interpreter => "interpreter",
    Jit => "jit",
    Jni => "jni",
    Load => "load",
    Loader => "loader",
    Logging => "logging",
    Mark => "mark",
    Marking => "marking",
    Metadata => "metadata",
    Metaspace => "metaspace",
    Module => "module",
    Monitorinflation => "monitorinflation",
    Nmethod => "nmethod",
    Oom => "oom",
    Os => "os",
    Pagesize => "pagesize",
    Path => "path",
    Perf => "perf",
    Phases => "phases",
    Plab => "plab",
    Promotion => "promotion",
    Redefine => "redefine",
    Ref => "ref",
    Region => "region",
    Remset => "remset",
    Resolve => "resolve",
    Safepoint => "safepoint",
    Start => "start",
    Startuptime => "startuptime",
    Stats => "stats",
    Stringtable => "stringtable",
    System => "system",
    Task => "task",
    Thread => "thread",
    Time => "time",
    Tlab => "tlab",
    Unload => "unload",
    Verify => "verify",
    Vmoperation => "vmoperation",
    Vmthread => "vmthread",
}

impl Tag {
    /// Case-insensitive lookup of a tag name.
    pub fn from_name(name: &str) -> Option<Tag> {
        Tag::ALL
            .iter()
            .copied()
            .find(|tag| tag.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
