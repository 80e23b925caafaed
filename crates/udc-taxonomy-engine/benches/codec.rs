use criterion::{Criterion, criterion_group, criterion_main};
use udc_taxonomy_engine::codec::Codec;
use udc_taxonomy_engine::hierarchy;
mod common;

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    group.sample_size(10);

    let roots = hierarchy::build(common::generate_records(9)).roots;

    group.bench_function("index", |b| {
        b.iter(|| {
            let codec = Codec::from_nodes(std::hint::black_box(roots.clone())).unwrap();
            std::hint::black_box(codec);
        });
    });

    let codec = Codec::from_nodes(roots).unwrap();

    group.bench_function("ancestry", |b| {
        b.iter(|| {
            let path = codec.ancestry(std::hint::black_box("888.8"));
            std::hint::black_box(path);
        });
    });

    group.bench_function("search", |b| {
        b.iter(|| {
            let hits = codec.search(std::hint::black_box("class 45"));
            std::hint::black_box(hits);
        });
    });

    group.bench_function("validate_composite", |b| {
        b.iter(|| {
            let result = codec.validate(std::hint::black_box("123.4:567.8(0)"));
            std::hint::black_box(result.is_err());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
