use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use plaque_analysis::{AnalysisParams, PlaqueQuantifier};
use plaque_core::RgbImage;
use std::hint::black_box;

const SIZES: [usize; 3] = [160, 320, 640];

// Enamel with a diagonal band of stain, roughly what a tooth crop looks like.
fn synthetic_tooth(side: usize) -> RgbImage {
    let mut img = RgbImage::new(side, side);
    for y in 0..side {
        for x in 0..side {
            let rgb = if (x + y) % 97 < 20 {
                [170, 120, 60]
            } else {
                [230, 225, 215]
            };
            img.put_pixel(x, y, rgb);
        }
    }
    img
}

fn bench_plaque_mask(c: &mut Criterion) {
    let quantifier = PlaqueQuantifier::new(&AnalysisParams::default());
    let mut group = c.benchmark_group("plaque_mask");
    for &side in SIZES.iter() {
        let img = synthetic_tooth(side);
        group.bench_with_input(BenchmarkId::from_parameter(side), &img, |b, img| {
            b.iter(|| quantifier.plaque_mask(black_box(&img.view())))
        });
    }
    group.finish();
}

fn bench_measure(c: &mut Criterion) {
    let quantifier = PlaqueQuantifier::new(&AnalysisParams::default());
    let crop = synthetic_tooth(180);
    let resized = synthetic_tooth(640);
    c.bench_function("measure_180_to_640", |b| {
        b.iter(|| quantifier.measure(black_box(&crop.view()), black_box(&resized.view())))
    });
}

criterion_group!(benches, bench_plaque_mask, bench_measure);
criterion_main!(benches);
