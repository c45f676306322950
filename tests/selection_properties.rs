use anyhow::Result;
use tempfile::tempdir;
use unilog::selection::MAX_SELECTIONS;
use unilog::{Level, LogConfiguration, Selection, Tag};

const SAMPLES: &[&[Tag]] = &[
    &[Tag::Gc],
    &[Tag::Logging],
    &[Tag::Class],
    &[Tag::Gc, Tag::Logging],
    &[Tag::Gc, Tag::Heap],
    &[Tag::Gc, Tag::Heap, Tag::Region],
    &[Tag::Class, Tag::Load],
    &[Tag::Safepoint, Tag::Stats],
];

/// A tag-set touched by exactly one clause gets that clause's level; a
/// tag-set touched by none is not mentioned.
#[test]
fn single_clause_levels() -> Result<()> {
    let selection = Selection::parse("gc+heap=debug,class=error,safepoint*=trace")?;
    assert_eq!(selection.resolve_tags(&[Tag::Gc, Tag::Heap]), Some(Level::Debug));
    assert_eq!(selection.resolve_tags(&[Tag::Class]), Some(Level::Error));
    assert_eq!(selection.resolve_tags(&[Tag::Safepoint, Tag::Stats]), Some(Level::Trace));
    assert_eq!(selection.resolve_tags(&[Tag::Gc]), None);
    assert_eq!(selection.resolve_tags(&[Tag::Class, Tag::Load]), None);
    Ok(())
}

#[test]
fn trailing_all_overrides_everything() -> Result<()> {
    let selection = Selection::parse("logging,gc*=trace,all=error")?;
    for tags in SAMPLES {
        assert_eq!(selection.resolve_tags(tags), Some(Level::Error), "{:?}", tags);
    }
    Ok(())
}

#[test]
fn registered_tag_sets_resolve_like_raw_tags() -> Result<()> {
    let config = LogConfiguration::with_streams(Box::new(std::io::sink()), Box::new(std::io::sink()));
    let selection = Selection::parse("gc+logging=trace,class*=error")?;
    for tags in SAMPLES {
        let tag_set = config.tag_set(tags)?;
        assert_eq!(selection.resolve(&tag_set), selection.resolve_tags(tags));
    }
    let logging = config.tag_set(&[Tag::Logging])?;
    assert_eq!(selection.resolve(&logging), None);
    Ok(())
}

/// Every accepted expression, configured on an output and read back from
/// its live config-string, resolves every tag-set to the same level.
#[test]
fn live_config_string_round_trips() -> Result<()> {
    let expressions = [
        "gc",
        "all=warning,gc=info",
        "logging,gc*=trace,all=error",
        "gc+logging=trace,class*=error",
        "GC+Heap*=Debug,safepoint=off",
        "",
    ];
    for expression in expressions {
        let config = LogConfiguration::with_streams(Box::new(std::io::sink()), Box::new(std::io::sink()));
        config.parse_command(&format!("{}:stdout", expression))?;

        let original = Selection::parse(expression)?;
        let live = config.stdout().config_string();
        let reparsed = Selection::parse(&live)?;
        for tags in SAMPLES {
            assert_eq!(
                reparsed.resolve_tags(tags).unwrap_or(Level::Off),
                original.resolve_tags(tags).unwrap_or(Level::Off),
                "{} rendered as {} for {:?}",
                expression,
                live,
                tags
            );
        }
    }
    Ok(())
}

/// The largest accepted expression still parses back from the live
/// config-string of a fresh output.
#[test]
fn live_config_string_of_full_expression_parses() -> Result<()> {
    let clauses: Vec<String> = Tag::ALL[..MAX_SELECTIONS]
        .iter()
        .map(|t| format!("{}=info", t.name()))
        .collect();
    let expression = clauses.join(",");
    let original = Selection::parse(&expression)?;
    assert_eq!(original.clauses().len(), MAX_SELECTIONS);

    let dir = tempdir()?;
    let file = dir.path().join("all.log");
    let config = LogConfiguration::with_streams(Box::new(std::io::sink()), Box::new(std::io::sink()));
    config.register_tag_sets(&[&[Tag::Add]])?;
    config.parse_command(&format!("{}:stdout", expression))?;
    config.parse_command(&format!("{}:{}", expression, file.display()))?;

    for output in config.outputs().iter().filter(|o| o.name() != "stderr") {
        let reparsed = Selection::parse(&output.config_string())?;
        assert_eq!(reparsed, original, "{}", output.name());
    }
    Ok(())
}

#[test]
fn unmatched_clauses_get_suggestions() -> Result<()> {
    let config = LogConfiguration::with_streams(Box::new(std::io::sink()), Box::new(std::io::sink()));
    config.register_tag_sets(&[&[Tag::Gc, Tag::Heap], &[Tag::Gc, Tag::Heap, Tag::Region], &[Tag::Class]])?;

    let selection = Selection::parse("heap=debug,class=info,os=trace")?;
    let unmatched = selection.verify_against_registry(&config.registry().snapshot());
    assert_eq!(unmatched.len(), 2);
    assert_eq!(unmatched[0].selection, "heap");
    assert_eq!(unmatched[0].suggestions, vec!["gc+heap", "gc+heap+region"]);
    assert_eq!(unmatched[1].selection, "os");
    assert!(unmatched[1].suggestions.is_empty());
    assert!(unmatched[0].to_string().contains("Did you mean"));
    Ok(())
}
