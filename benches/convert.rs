use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stillframe::processing::{convert_image, scale_nearest};
use stillframe::{PixelFormat, SourceImage};

const SIZES: [(u32, u32); 3] = [(640, 480), (1280, 720), (1920, 1080)];

fn gradient(width: u32, height: u32) -> SourceImage {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255]);
        }
    }
    SourceImage::new(pixels, width, height).unwrap()
}

fn bench_convert(c: &mut Criterion) {
    for format in [PixelFormat::Nv12, PixelFormat::I420, PixelFormat::Bgra] {
        let mut group = c.benchmark_group(format!("convert_{}", format.name().to_lowercase()));

        for &(width, height) in SIZES.iter() {
            let image = gradient(width, height);
            group.bench_with_input(
                BenchmarkId::from_parameter(format!("{}x{}", width, height)),
                &image,
                |b, image| b.iter(|| convert_image(black_box(image), format).unwrap()),
            );
        }
        group.finish();
    }
}

fn bench_scale(c: &mut Criterion) {
    let mut group = c.benchmark_group("scale_nearest");
    let image = gradient(1280, 720);

    for &(width, height) in SIZES.iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", width, height)),
            &(width, height),
            |b, &(width, height)| {
                b.iter(|| {
                    scale_nearest(black_box(image.pixels()), 1280, 720, width, height).unwrap()
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_convert, bench_scale);
criterion_main!(benches);
