mod common;

use anyhow::Result;
use common::SharedBuffer;
use std::thread;
use std::time::Duration;
use unilog::{log_debug, log_info, LogConfiguration, LogSystem, Tag};

fn uptime_of(line: &str) -> f64 {
    let end = line.find(']').expect("uptime decoration");
    line[1..end]
        .trim_end()
        .strip_suffix('s')
        .expect("seconds suffix")
        .parse()
        .expect("numeric uptime")
}

#[test]
fn gc_info_on_stdout_with_uptime_and_level() -> Result<()> {
    let out = SharedBuffer::default();
    let config = LogConfiguration::with_streams(Box::new(out.clone()), Box::new(std::io::sink()));
    let system = LogSystem::with_configuration(config);
    system.configuration().parse_command("gc=info:stdout:uptime,level")?;

    let log = system.logger(&[Tag::Gc])?;
    log_info!(log, "first");
    log_debug!(log, "hidden");
    thread::sleep(Duration::from_millis(20));
    log_info!(log, "second");

    let lines = out.lines();
    assert_eq!(lines.len(), 2, "{:?}", lines);
    assert!(lines[0].contains("[info] first"), "{}", lines[0]);
    assert!(lines[1].contains("[info] second"), "{}", lines[1]);
    assert!(uptime_of(&lines[1]) > uptime_of(&lines[0]));
    Ok(())
}

#[test]
fn other_tag_sets_stay_silent_on_stdout() -> Result<()> {
    let out = SharedBuffer::default();
    let config = LogConfiguration::with_streams(Box::new(out.clone()), Box::new(std::io::sink()));
    let system = LogSystem::with_configuration(config);
    system.configuration().parse_command("gc=info:stdout:uptime,level")?;

    system.logger(&[Tag::Gc, Tag::Heap])?.info("exact match only");
    system.logger(&[Tag::Class])?.warning("stderr only");
    assert!(out.text().is_empty());
    Ok(())
}
