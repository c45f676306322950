mod common;

use anyhow::Result;
use common::SharedBuffer;
use tempfile::tempdir;
use unilog::{ConfigError, Level, LogConfiguration, LogSystem, Tag};

fn config_with_buffers() -> (LogConfiguration, SharedBuffer, SharedBuffer) {
    let out = SharedBuffer::default();
    let err = SharedBuffer::default();
    let config = LogConfiguration::with_streams(Box::new(out.clone()), Box::new(err.clone()));
    (config, out, err)
}

/// Outputs 0 and 1 stay in place through any sequence of configuration
/// and disable calls.
#[test]
fn standard_streams_are_permanent() -> Result<()> {
    let dir = tempdir()?;
    let (config, _out, _err) = config_with_buffers();
    config.register_tag_sets(&[&[Tag::Gc], &[Tag::Class]])?;

    let commands = [
        format!("gc=debug:{}", dir.path().join("a.log").display()),
        "all=off:stdout".to_string(),
        "class=trace:stderr".to_string(),
        "disable".to_string(),
        format!("class=info:{}", dir.path().join("b.log").display()),
        "all=off:stderr".to_string(),
        "all=off:#2".to_string(),
        "disable".to_string(),
    ];
    for command in &commands {
        config.parse_command(command)?;
        let outputs = config.outputs();
        assert!(outputs.len() >= 2);
        assert_eq!(outputs[0].name(), "stdout");
        assert_eq!(outputs[1].name(), "stderr");
    }

    let stdout = config.find_output_by_name("stdout").unwrap();
    config.disable_output(stdout)?;
    assert_eq!(config.output_count(), 2);
    Ok(())
}

#[test]
fn disable_turns_off_errors_too() -> Result<()> {
    let system = {
        let (config, _out, _err) = config_with_buffers();
        LogSystem::with_configuration(config)
    };
    let gc = system.logger(&[Tag::Gc])?;
    assert!(gc.is_enabled(Level::Error));

    system.configuration().parse_command("disable")?;
    assert!(!gc.is_enabled(Level::Error));
    for tag_set in system.configuration().registry().snapshot() {
        assert!(tag_set.table().entries().is_empty());
    }

    // A tag-set created after disabling stays silent as well.
    let class = system.logger(&[Tag::Class])?;
    assert!(!class.is_enabled(Level::Error));
    Ok(())
}

#[test]
fn unknown_index_and_type_are_rejected() {
    let (config, _out, _err) = config_with_buffers();
    assert!(matches!(
        config.parse_command("gc:#7"),
        Err(ConfigError::NoSuchOutput(name)) if name == "#7"
    ));
    assert!(matches!(config.parse_command("gc:syslog=local0"), Err(ConfigError::Output(_))));
    assert!(matches!(config.parse_command("gc:stdout::filecount=2"), Ok(())));
    assert_eq!(config.output_count(), 2);
}

#[test]
fn failed_file_initialization_reports_options() -> Result<()> {
    let dir = tempdir()?;
    let (config, _out, _err) = config_with_buffers();
    let command = format!("gc:{}::filecount=many", dir.path().join("gc.log").display());
    let err = config.parse_command(&command).unwrap_err();
    assert!(err.to_string().contains("filecount=many"), "{}", err);
    assert_eq!(config.output_count(), 2);
    Ok(())
}

#[test]
fn quoted_file_names_may_contain_colons() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("vm:1.log");
    let (config, _out, _err) = config_with_buffers();
    config.tag_set(&[Tag::Gc])?;
    config.parse_command(&format!("gc=info:file=\"{}\"", path.display()))?;
    assert!(config.find_output_by_name(&format!("file={}", path.display())).is_some());
    assert!(path.exists());
    Ok(())
}

#[test]
fn describe_reports_file_options_and_widths() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("gc.log");
    let system = {
        let (config, _out, _err) = config_with_buffers();
        LogSystem::with_configuration(config)
    };
    system.configuration().register_tag_sets(&[&[Tag::Gc]])?;
    system
        .configuration()
        .parse_command(&format!("gc=info:{}:level:filecount=2,filesize=1M", path.display()))?;
    system.logger(&[Tag::Gc])?.warning("wide");

    let text = system.configuration().describe();
    let line = text
        .lines()
        .find(|l| l.starts_with(" #2: "))
        .expect("file output listed");
    assert_eq!(
        line,
        format!(" #2: file={} gc=info level filecount=2,filesize=1M (widths: l=7)", path.display())
    );
    Ok(())
}
