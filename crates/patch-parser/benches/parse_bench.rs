use criterion::{criterion_group, criterion_main, Criterion};
use patch_parser::parse;

fn sample_unified_patch(hunks: usize) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"--- a/file.txt\n+++ b/file.txt\n");
    for i in 0..hunks {
        let start = i * 10 + 1;
        out.extend_from_slice(format!("@@ -{start},3 +{start},3 @@\n").as_bytes());
        out.extend_from_slice(b" context one\n-removed line\n+added line\n context two\n");
    }
    out
}

fn bench_parse(c: &mut Criterion) {
    let small = sample_unified_patch(5);
    let large = sample_unified_patch(200);

    c.bench_function("parse small unified patch", |b| {
        b.iter(|| parse(&small).unwrap())
    });
    c.bench_function("parse large unified patch", |b| {
        b.iter(|| parse(&large).unwrap())
    });
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
