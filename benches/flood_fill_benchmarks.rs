use bgkey::{
    find_border_background, key_background, BorderHistogram, NearWhiteClassifier,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{Rgba, RgbaImage};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const INK: Rgba<u8> = Rgba([30, 30, 120, 255]);

/// White canvas with a centered dark disc covering roughly a third of it
fn logo_image(size: u32) -> RgbaImage {
    let center = f64::from(size) / 2.0;
    let radius = f64::from(size) / 3.0;
    RgbaImage::from_fn(size, size, |x, y| {
        let dx = f64::from(x) - center;
        let dy = f64::from(y) - center;
        if dx * dx + dy * dy < radius * radius {
            INK
        } else {
            WHITE
        }
    })
}

fn bench_flood_fill(c: &mut Criterion) {
    let classifier = NearWhiteClassifier::default();
    let mut group = c.benchmark_group("flood_fill");

    for size in [64u32, 256, 1024] {
        let image = logo_image(size);
        group.throughput(Throughput::Elements(u64::from(size * size)));
        group.bench_with_input(BenchmarkId::from_parameter(size), &image, |b, image| {
            b.iter(|| find_border_background(black_box(image), &classifier));
        });
    }

    group.finish();
}

fn bench_key_background(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_background");

    for size in [256u32, 1024] {
        let image = logo_image(size);
        group.throughput(Throughput::Elements(u64::from(size * size)));
        group.bench_with_input(BenchmarkId::new("logo", size), &image, |b, image| {
            b.iter_batched(
                || image.clone(),
                |mut buffer| key_background(&mut buffer),
                criterion::BatchSize::LargeInput,
            );
        });
    }

    // Already keyed input exercises the all-foreground border path
    let mut keyed = logo_image(1024);
    let _ = key_background(&mut keyed);
    group.bench_function("rekey_1024", |b| {
        b.iter_batched(
            || keyed.clone(),
            |mut buffer| key_background(&mut buffer),
            criterion::BatchSize::LargeInput,
        );
    });

    group.finish();
}

fn bench_border_histogram(c: &mut Criterion) {
    let image = logo_image(1024);
    c.bench_function("border_histogram_1024", |b| {
        b.iter(|| BorderHistogram::from_image(black_box(&image)));
    });
}

criterion_group!(
    benches,
    bench_flood_fill,
    bench_key_background,
    bench_border_histogram
);
criterion_main!(benches);
