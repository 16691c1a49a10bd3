//! Requirements parsing performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::str::FromStr;

use whisk_benchmarks::criterion_config;
use whisk_config::RequirementsParser;
use whisk_core::types::{Requirement, SpecifierSet, Version};

fn requirements_text(lines: usize) -> String {
    let mut text = String::from("# generated requirements\n");
    for i in 0..lines {
        match i % 4 {
            0 => text.push_str(&format!("package{}\n", i)),
            1 => text.push_str(&format!("package{}=={}.{}.0\n", i, i % 9, i % 7)),
            2 => text.push_str(&format!("package{}>={}.0,<{}.0\n", i, i % 5, i % 5 + 2)),
            _ => text.push_str(&format!("package{}[extra]~={}.1.0\n", i, i % 3 + 1)),
        }
    }
    text
}

/// Benchmark requirements-file parsing for different file sizes
fn bench_requirements_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("requirements_parsing");

    for line_count in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*line_count as u64));
        let text = requirements_text(*line_count);

        group.bench_with_input(BenchmarkId::new("lines", line_count), &text, |b, text| {
            b.iter(|| {
                let mut parser = RequirementsParser::new();
                let parsed = parser
                    .parse_str(black_box(text), "requirements.txt", None)
                    .unwrap();
                black_box(parsed.len())
            });
        });
    }

    group.finish();
}

/// Benchmark individual requirement and specifier parsing
fn bench_specifier_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("specifier_operations");

    let requirement_strings: Vec<String> = (0..1000)
        .map(|i| format!("package{}[extra]>={}.0,<{}.0", i, i % 7, i % 7 + 2))
        .collect();

    group.bench_function("requirement_parsing", |b| {
        let mut index = 0;
        b.iter(|| {
            let text = &requirement_strings[index % requirement_strings.len()];
            index += 1;
            black_box(Requirement::parse(text))
        });
    });

    let version_strings: Vec<String> = (0..1000)
        .map(|i| format!("{}.{}.{}", i % 10, i % 20, i % 30))
        .collect();

    group.bench_function("version_parsing", |b| {
        let mut index = 0;
        b.iter(|| {
            let text = &version_strings[index % version_strings.len()];
            index += 1;
            black_box(Version::from_str(text))
        });
    });

    let specifiers = SpecifierSet::parse(">=1.2,<3.0,!=2.5").unwrap();
    let versions: Vec<Version> = version_strings
        .iter()
        .map(|text| Version::from_str(text).unwrap())
        .collect();

    group.bench_function("specifier_matching", |b| {
        let mut index = 0;
        b.iter(|| {
            let version = &versions[index % versions.len()];
            index += 1;
            black_box(specifiers.matches(version))
        });
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_requirements_parsing, bench_specifier_operations
}
criterion_main!(benches);
