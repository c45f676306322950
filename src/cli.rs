use crate::async_writer::AsyncConfig;
use crate::level::Level;
use crate::tag::Tag;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// unilog - configure the logging subsystem and emit messages through it
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
pub struct Args {
    /// Configuration command `what[:output[:decorators[:output-options]]]`, applied in order
    #[clap(short = 'x', long = "xlog", value_name = "CMD", help_heading = "Configuration")]
    pub commands: Vec<String>,

    /// JSON file with `commands` and optional `async` settings, applied before -x
    #[clap(long, help_heading = "Configuration")]
    pub options_file: Option<PathBuf>,

    /// Write through the background writer instead of on the calling thread
    #[clap(long = "async", default_value_t = false, help_heading = "Async Mode")]
    pub async_mode: bool,

    /// Byte budget of the async queue
    #[clap(long, default_value_t = crate::defaults::ASYNC_BUFFER_SIZE, help_heading = "Async Mode")]
    pub async_buffer_size: usize,

    /// Longest idle time between two drains of the async queue
    #[clap(long, value_parser = parse_duration, default_value = "1s", help_heading = "Async Mode")]
    pub async_flush_interval: Duration,

    /// Message to log, as `tags:level:message`, e.g. `gc+heap:info:expanded`
    #[clap(short = 'e', long, value_parser = parse_emit)]
    pub emit: Vec<EmitSpec>,

    /// Number of times the --emit messages are logged
    #[clap(long, default_value_t = 1)]
    pub repeat: usize,

    /// Force a rotation of every file output after emitting
    #[clap(long, default_value_t = false)]
    pub rotate: bool,

    /// Print available levels, decorators, tags and the output table
    #[clap(long, default_value_t = false)]
    pub describe: bool,

    /// Show the subsystem's own debug diagnostics
    #[clap(short = 'v', long, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    /// Async settings, if async mode was requested.
    pub fn async_config(&self) -> Option<AsyncConfig> {
        self.async_mode.then(|| AsyncConfig {
            buffer_size: self.async_buffer_size,
            flush_interval_ms: self.async_flush_interval.as_millis() as u64,
        })
    }
}

/// A synthetic message given on the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmitSpec {
    pub tags: Vec<Tag>,
    pub level: Level,
    pub message: String,
}

fn parse_emit(s: &str) -> Result<EmitSpec, String> {
    let mut parts = s.splitn(3, ':');
    let (Some(tags), Some(level), Some(message)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("Expected tags:level:message, got '{}'", s));
    };
    let tags = tags
        .split('+')
        .map(|name| Tag::from_name(name).ok_or_else(|| format!("Unknown tag '{}'", name)))
        .collect::<Result<Vec<_>, _>>()?;
    let level = level.parse::<Level>()?;
    if level == Level::Off {
        return Err("Cannot emit a message at level 'off'".to_string());
    }
    Ok(EmitSpec {
        tags,
        level,
        message: message.to_string(),
    })
}

/// Parse duration from string (e.g., "500ms", "10s", "5m")
fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Duration cannot be empty".to_string());
    }

    let (num_str, unit) = if let Some(stripped) = s.strip_suffix("ms") {
        (stripped, "ms")
    } else if let Some(stripped) = s.strip_suffix('s') {
        (stripped, "s")
    } else if let Some(stripped) = s.strip_suffix('m') {
        (stripped, "m")
    } else {
        (s, "s") // Default to seconds
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number in duration: {}", num_str))?;
    if !num.is_finite() || num < 0.0 {
        return Err(format!("Duration must be positive: {}", s));
    }

    let duration = match unit {
        "ms" => Duration::from_millis(num as u64),
        "s" => Duration::from_millis((num * 1000.0) as u64),
        "m" => Duration::from_secs((num * 60.0) as u64),
        _ => return Err(format!("Invalid duration unit: {}", unit)),
    };

    // Sub-millisecond values would make the drain thread spin.
    if duration < Duration::from_millis(1) {
        return Err(format!("Duration must be at least 1ms: {}", s));
    }

    Ok(duration)
}
