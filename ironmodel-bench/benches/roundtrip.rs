//! Parse and serialize benchmarks.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use ironmodel_bench::fixtures::{SAMPLE_MODEL, wide_model};
use ironmodel_schema::xml::{parse_document, write_document};
use ironmodel_schema::{ModelContext, SerializeOptions, parse_model, serialize_model};
use std::hint::black_box;

fn benchmark_element_tree(c: &mut Criterion) {
    let root = parse_document(SAMPLE_MODEL).unwrap();

    c.bench_function("xml_parse_document", |b| {
        b.iter(|| parse_document(black_box(SAMPLE_MODEL)))
    });

    c.bench_function("xml_write_document", |b| {
        b.iter(|| write_document(black_box(&root), true))
    });
}

fn benchmark_sample_model(c: &mut Criterion) {
    let ctx = ModelContext::default();
    let model = parse_model(SAMPLE_MODEL, &ctx).unwrap();
    let options = SerializeOptions::default();

    c.bench_function("parse_sample_model", |b| {
        b.iter(|| parse_model(black_box(SAMPLE_MODEL), &ctx))
    });

    c.bench_function("serialize_sample_model", |b| {
        b.iter(|| serialize_model(black_box(&model), &ctx, &options))
    });
}

fn benchmark_wide_models(c: &mut Criterion) {
    let ctx = ModelContext::default();
    let options = SerializeOptions::compact();
    let mut group = c.benchmark_group("wide_model");

    for fields in [10usize, 100, 500] {
        let xml = wide_model(1, fields);
        let model = parse_model(&xml, &ctx).unwrap();
        group.throughput(Throughput::Elements(fields as u64));

        group.bench_with_input(BenchmarkId::new("parse", fields), &xml, |b, xml| {
            b.iter(|| parse_model(black_box(xml), &ctx))
        });
        group.bench_with_input(BenchmarkId::new("serialize", fields), &model, |b, model| {
            b.iter(|| serialize_model(black_box(model), &ctx, &options))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_element_tree,
    benchmark_sample_model,
    benchmark_wide_models,
);
criterion_main!(benches);
