//! Benchmark for decoding `list -Hp` output
//!
//! Large hosts list tens of thousands of snapshots in one call.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use zfs_ops::command::table::{split_records, split_table};
use zfs_ops::Info;

fn listing(rows: usize) -> String {
    (0..rows)
        .map(|i| {
            format!(
                "tank/data/fs{}@snap-{}\t-\t{}\t-\t-\t-\t-\t0\t{}\t{}\t{}\t-\n",
                i / 100,
                i,
                i * 4096,
                i * 8192,
                i * 512,
                i * 4096
            )
        })
        .collect()
}

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_parse");
    let text = listing(10_000);
    group.throughput(Throughput::Bytes(text.len() as u64));

    group.bench_function("split_table", |b| {
        b.iter(|| split_table(black_box(&text)));
    });

    group.bench_function("split_records", |b| {
        b.iter(|| split_records(black_box(&text)));
    });

    group.finish();
}

fn bench_decode_info(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_parse");

    for rows in [100, 1_000, 10_000] {
        let table = split_table(&listing(rows));
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("info_from_rows", rows), &table, |b, table| {
            b.iter(|| Info::from_rows(black_box(table)).map(|infos| infos.len()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_split, bench_decode_info);
criterion_main!(benches);
