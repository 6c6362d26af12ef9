//! Benchmarks for arena seeding and the CPU kernel mirror.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use gravwell::cpu::{CpuCanvas, CpuKernel};
use gravwell::{Distribution, ParticleBuffer, ParticleCount};

fn bench_seed(c: &mut Criterion) {
    let mut group = c.benchmark_group("seed");
    group.sample_size(20);

    group.bench_function("uniform_edges", |b| {
        let mut buffer = ParticleBuffer::new(ParticleCount::HalfMillion);
        let mut rng = SmallRng::seed_from_u64(7);
        b.iter(|| {
            buffer.seed(Distribution::Uniform, true, 1280, 720, &mut rng);
            black_box(buffer.as_bytes().len())
        })
    });

    group.bench_function("gaussian", |b| {
        let mut buffer = ParticleBuffer::new(ParticleCount::HalfMillion);
        let mut rng = SmallRng::seed_from_u64(7);
        b.iter(|| {
            buffer.seed(Distribution::Gaussian, false, 1280, 720, &mut rng);
            black_box(buffer.as_bytes().len())
        })
    });

    group.finish();
}

fn bench_cpu_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_step");
    group.sample_size(10);

    group.bench_function("half_million_tier", |b| {
        let mut buffer = ParticleBuffer::new(ParticleCount::HalfMillion);
        let mut rng = SmallRng::seed_from_u64(7);
        buffer.seed(Distribution::Uniform, true, 1280, 720, &mut rng);
        let mut kernel = CpuKernel::new(1280, 720);
        let mut canvas = CpuCanvas::new(1280, 720);
        b.iter(|| {
            canvas.clear();
            kernel.step(buffer.as_mut_slice(), &mut canvas);
            black_box(canvas.lit_pixels())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_seed, bench_cpu_step);
criterion_main!(benches);
