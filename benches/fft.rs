use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use split_fft::SplitFFT;

fn generate_white_noise(size: usize) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(size as u64);
    (0..size).map(|_| rng.random_range(-1.0..1.0)).collect()
}

fn bench_complex(c: &mut Criterion) {
    let mut group = c.benchmark_group("complex_forward");

    for bits in [10u32, 14, 18, 20] {
        let len = 1usize << bits;
        let input = generate_white_noise(len);
        group.throughput(Throughput::Bytes((len * size_of::<f64>()) as u64));

        for threads in [1usize, 2, 4] {
            let mut fft = SplitFFT::<f64>::new();
            fft.set_parallel(threads).unwrap();
            let mut data = input.clone();

            group.bench_with_input(BenchmarkId::new(format!("{threads}_threads"), len), &len, |b, _| {
                b.iter(|| {
                    data.copy_from_slice(&input);
                    fft.complex_forward(black_box(&mut data)).unwrap();
                })
            });
        }
    }

    group.finish();
}

fn bench_real(c: &mut Criterion) {
    let mut group = c.benchmark_group("real_amplitude_cycle");

    for bits in [12u32, 16, 20] {
        let len = 1usize << bits;
        let input = generate_white_noise(len);
        group.throughput(Throughput::Bytes((len * size_of::<f64>()) as u64));

        let mut sequential = SplitFFT::<f64>::new();
        let mut auto = SplitFFT::<f64>::new();
        auto.auto_thread();

        for (name, fft) in [("sequential", &mut sequential), ("auto", &mut auto)] {
            let mut data = input.clone();
            group.bench_with_input(BenchmarkId::new(name, len), &len, |b, _| {
                b.iter(|| {
                    fft.real_to_amplitude(black_box(&mut data)).unwrap();
                    fft.amplitude_to_real(black_box(&mut data)).unwrap();
                })
            });
        }
    }

    group.finish();
}

fn bench_average_power(c: &mut Criterion) {
    let data = generate_white_noise(1 << 18);
    let mut fft = SplitFFT::<f64>::new();

    c.bench_function("average_power_1024", |b| {
        b.iter(|| black_box(fft.average_power_with_size(black_box(&data), 1024).unwrap()))
    });
}

criterion_group!(benches, bench_complex, bench_real, bench_average_power);
criterion_main!(benches);
