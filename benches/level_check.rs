use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::io;
use unilog::{Level, LogConfiguration, Selection, Tag};

/// Benchmark the cost of a disabled and an enabled level check
fn bench_level_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_check");

    let config = LogConfiguration::with_streams(Box::new(io::sink()), Box::new(io::sink()));
    config.parse_command("gc=info:stdout").unwrap();
    let tag_set = config.tag_set(&[Tag::Gc]).unwrap();

    group.bench_function("disabled_debug", |b| {
        b.iter(|| black_box(tag_set.is_level(black_box(Level::Debug))))
    });

    group.bench_function("enabled_info", |b| {
        b.iter(|| black_box(tag_set.is_level(black_box(Level::Info))))
    });

    group.finish();
}

/// Benchmark selection resolution against tag-sets of growing size
fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    let selection = Selection::parse("all=warning,gc*=info,gc+heap=debug,safepoint=trace,class*=error").unwrap();
    let tag_sets: [&[Tag]; 3] = [&[Tag::Os], &[Tag::Gc, Tag::Heap], &[Tag::Gc, Tag::Heap, Tag::Region, Tag::Remset]];

    for tags in tag_sets {
        group.bench_function(format!("{}_tags", tags.len()), |b| {
            b.iter(|| black_box(selection.resolve_tags(black_box(tags))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_level_check, bench_resolve);
criterion_main!(benches);
