use criterion::{black_box, criterion_group, criterion_main, Criterion};
use huffpack::bitpack::{pack, unpack_payload};
use huffpack::{Codec, CodeTable, FrequencyTable};

fn sample_text() -> String {
    "It was the best of times, it was the worst of times, it was the age of wisdom, \
     it was the age of foolishness, it was the epoch of belief. "
        .repeat(256)
}

fn table_build(c: &mut Criterion) {
    let text = sample_text();
    let freq = FrequencyTable::count(&text);

    c.bench_function("frequency count", |b| {
        b.iter(|| FrequencyTable::count(black_box(&text)))
    });
    c.bench_function("code table build", |b| {
        b.iter(|| CodeTable::build(black_box(&freq)))
    });
}

fn packing(c: &mut Criterion) {
    let text = sample_text();
    let table = CodeTable::build(&FrequencyTable::count(&text)).unwrap();
    let payload = pack(&text, &table).unwrap();

    c.bench_function("pack", |b| b.iter(|| pack(black_box(&text), &table)));
    c.bench_function("unpack", |b| {
        b.iter(|| unpack_payload(black_box(&payload), &table))
    });
}

fn full_compress(c: &mut Criterion) {
    let text = sample_text();
    let codec = Codec::default();

    c.bench_function("codec compress", |b| {
        b.iter(|| codec.compress(black_box(&text)))
    });
}

criterion_group!(benches, table_build, packing, full_compress);
criterion_main!(benches);
