//! Benchmarks for heatmap rendering, PNG encoding and histogram binning.
//!
//! Run with: cargo bench --package renderer --bench render_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use renderer::{png, render_heatmap, ColorRamp, Histogram, DEFAULT_BINS};

/// Smooth precipitation-like band, increasing southwards.
fn generate_band(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let ripple = ((x as f64 / width as f64) * std::f64::consts::PI * 4.0).sin() * 20.0;
            data.push(50.0 + 400.0 * y as f64 / height as f64 + ripple);
        }
    }
    data
}

/// Land-cover-like band with a handful of classes.
fn generate_classes(width: usize, height: usize) -> Vec<f64> {
    (0..width * height).map(|i| [7.0, 9.0, 10.0, 12.0, 16.0][(i / 37) % 5]).collect()
}

fn bench_heatmap(c: &mut Criterion) {
    let mut group = c.benchmark_group("heatmap");
    let ramp = ColorRamp::viridis();

    // Assaba at 1 km and at 500 m
    for (w, h) in [(290, 250), (580, 500)] {
        let band = generate_band(w, h);
        group.throughput(Throughput::Elements((w * h) as u64));
        group.bench_with_input(BenchmarkId::new("viridis", format!("{w}x{h}")), &band, |b, band| {
            b.iter(|| render_heatmap(black_box(band), w, h, f64::is_finite, &ramp))
        });
    }
    group.finish();
}

fn bench_png(c: &mut Criterion) {
    let mut group = c.benchmark_group("png");
    let ramp = ColorRamp::viridis();
    let (w, h) = (580, 500);

    let classes = render_heatmap(&generate_classes(w, h), w, h, f64::is_finite, &ramp);
    group.bench_function("indexed_classes", |b| {
        b.iter(|| png::create_png_auto(black_box(&classes.pixels), w, h))
    });

    let continuous = render_heatmap(&generate_band(w, h), w, h, f64::is_finite, &ramp);
    group.bench_function("auto_continuous", |b| {
        b.iter(|| png::create_png_auto(black_box(&continuous.pixels), w, h))
    });
    group.finish();
}

fn bench_histogram(c: &mut Criterion) {
    let band = generate_band(580, 500);
    c.bench_function("histogram_50_bins", |b| {
        b.iter(|| Histogram::compute(black_box(band.iter().copied()), DEFAULT_BINS))
    });
}

criterion_group!(benches, bench_heatmap, bench_png, bench_histogram);
criterion_main!(benches);
