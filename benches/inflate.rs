use std::io::Write;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use flate2::write::GzEncoder;
use flate2::Compression;
use gzstream::{decompress_gzip, GzStream, MinSettings};

fn build_corpus(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut i = 0u64;
    while data.len() < size {
        data.extend_from_slice(
            format!("{i:016x} the quick brown fox jumps over the lazy dog {i}\n").as_bytes(),
        );
        i = i.wrapping_mul(6364136223846793005).wrapping_add(1);
    }
    data.truncate(size);
    data
}

fn bench_decompress(c: &mut Criterion) {
    let data = build_corpus(4 << 20);
    let mut group = c.benchmark_group("Decompress");
    group.throughput(Throughput::Bytes(data.len() as u64));

    for level in [1u32, 6, 9] {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level));
        encoder.write_all(&data).unwrap();
        let archive = encoder.finish().unwrap();

        group.bench_with_input(
            BenchmarkId::new("gzip verified", level),
            &archive,
            |b, archive| b.iter(|| decompress_gzip(&archive[..]).unwrap()),
        );

        group.bench_with_input(
            BenchmarkId::new("gzip unverified", level),
            &archive,
            |b, archive| {
                b.iter(|| {
                    GzStream::<_, MinSettings>::from_slice(&archive[..])
                        .unwrap()
                        .read_all()
                        .unwrap()
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_decompress);
criterion_main!(benches);
