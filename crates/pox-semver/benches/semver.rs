use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pox_semver::{compare_versions, Comparator, VersionParser};

fn bench_compare_versions(c: &mut Criterion) {
    let cases = [
        ("1.2.3.0", "1.2.4.0"),
        ("2.4.0.0-alpha", "2.4.0.0"),
        ("2.1.0.0-dev", "2.1.0.0"),
        ("1.2.3.0-RC1", "1.2.3.0-beta2"),
        ("1.2.3.0-patch1", "1.2.3.0"),
    ];

    c.bench_function("compare_versions", |b| {
        b.iter(|| {
            for (a, other) in cases {
                black_box(compare_versions(black_box(a), black_box(other)));
            }
        })
    });
}

fn bench_normalize(c: &mut Criterion) {
    let parser = VersionParser::new();
    let versions = [
        "v1.2.3",
        "1.2.3-beta.1",
        "2.4.0+build.5",
        "1.2.x-dev",
        "dev-master",
        "2020.04.20",
        "1.2.3-rc1",
    ];

    c.bench_function("normalize_versions", |b| {
        b.iter(|| {
            for version in versions {
                black_box(parser.normalize(black_box(version)).ok());
            }
        })
    });
}

fn bench_candidate_filtering(c: &mut Criterion) {
    let parser = VersionParser::new();
    let constraint = parser.parse_constraints("^1.2 || ~2.4.1").expect("parse constraint");
    let mut candidates: Vec<String> = (0..50)
        .flat_map(|minor| (0..4).map(move |major| format!("{}.{}.0.0", major, minor)))
        .collect();

    c.bench_function("filter_and_sort_candidates", |b| {
        b.iter(|| {
            candidates.sort_by(|a, b| Comparator::order(b, a));
            let matching = candidates
                .iter()
                .filter(|version| constraint.matches_version(version))
                .count();
            black_box(matching)
        })
    });
}

criterion_group!(
    benches,
    bench_compare_versions,
    bench_normalize,
    bench_candidate_filtering
);
criterion_main!(benches);
