use bagit::creator::{walk_file_tree, PayloadManifestVisitor};
use bagit::hash::{hash_file, SupportedAlgorithm};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fs::File;
use std::hint::black_box;
use std::io::Write;
use tempfile::TempDir;

/// Create a test file with specified size
fn create_test_file(dir: &TempDir, name: &str, size_mb: usize) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = File::create(&path).unwrap();

    // Write in 1MB chunks to avoid memory issues
    let chunk = vec![0xABu8; 1024 * 1024];
    for _ in 0..size_mb {
        file.write_all(&chunk).unwrap();
    }
    file.flush().unwrap();

    path
}

/// One algorithm versus all of them in a single pass
fn bench_hash_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_file");

    for size_mb in [1usize, 16].iter() {
        let temp = TempDir::new().unwrap();
        let file = create_test_file(&temp, "payload.bin", *size_mb);
        group.throughput(Throughput::Bytes((*size_mb as u64) * 1024 * 1024));

        group.bench_with_input(BenchmarkId::new("sha256", size_mb), size_mb, |b, _| {
            b.iter(|| black_box(hash_file(&file, &[SupportedAlgorithm::Sha256]).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("all", size_mb), size_mb, |b, _| {
            b.iter(|| black_box(hash_file(&file, &SupportedAlgorithm::ALL).unwrap()));
        });
    }

    group.finish();
}

/// Manifest building over many small files
fn bench_payload_manifests(c: &mut Criterion) {
    let temp = TempDir::new().unwrap();
    for i in 0..500 {
        std::fs::write(temp.path().join(format!("file-{}.txt", i)), vec![b'x'; 4096]).unwrap();
    }

    c.bench_function("payload_manifests_500_files", |b| {
        b.iter(|| {
            let mut visitor = PayloadManifestVisitor::new(
                &[SupportedAlgorithm::Md5, SupportedAlgorithm::Sha256],
                false,
            );
            walk_file_tree(temp.path(), &mut visitor).unwrap();
            black_box(visitor.into_manifests())
        });
    });
}

criterion_group!(benches, bench_hash_file, bench_payload_manifests);
criterion_main!(benches);
