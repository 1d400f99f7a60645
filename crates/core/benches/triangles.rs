use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use softraster_core::graphics::{BlendState, StipplePattern};
use softraster_core::point::Z_FRAC_BITS;
use softraster_core::{PixelMode, ScreenPoint, Shading, Surface, TexelSource, Xrgb8888};
use std::sync::Arc;

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;

fn surface() -> Surface<Xrgb8888> {
    let mut surface = Surface::<Xrgb8888>::open(WIDTH, HEIGHT, PixelMode::Rgba32, None).unwrap();
    surface.clear(Some(0), Some(0xFF000000));
    let texture = TexelSource::<Xrgb8888>::checkerboard(64, 8, 0xFFFFFFFF, 0xFF404040).unwrap();
    surface.bind_texture(Some(Arc::new(texture)));
    surface
}

/// A large triangle with every attribute varying
fn triangle() -> [ScreenPoint; 3] {
    let z0 = 1000 << Z_FRAC_BITS;
    [
        ScreenPoint::new(10, 5, z0)
            .with_rgb8(255, 0, 0)
            .with_texcoord(0.0, 0.0),
        ScreenPoint::new(300, 40, z0 * 3 / 2)
            .with_rgb8(0, 255, 0)
            .with_texcoord(0.99, 0.0),
        ScreenPoint::new(60, 230, z0 * 5 / 4)
            .with_rgb8(0, 0, 255)
            .with_texcoord(0.0, 0.99),
    ]
}

fn bench_shading_families(c: &mut Criterion) {
    let mut group = c.benchmark_group("triangle_shading");
    let [a, b, d] = triangle();

    for shading in Shading::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(shading), &shading, |bench, &shading| {
            let mut surface = surface();
            bench.iter(|| {
                surface.fill_triangle(shading, &a, &b, &d);
                black_box(surface.pixel(100, 100));
            });
        });
    }

    group.finish();
}

fn bench_depth_variants(c: &mut Criterion) {
    let mut group = c.benchmark_group("triangle_depth");
    let [a, b, d] = triangle();

    for (name, test, write) in [
        ("none", false, false),
        ("write", false, true),
        ("test", true, false),
        ("test_write", true, true),
    ] {
        group.bench_function(name, |bench| {
            let mut surface = surface();
            surface.state_mut().depth_test = test;
            surface.state_mut().depth_write = write;
            bench.iter(|| {
                surface.fill_triangle(Shading::Smooth, &a, &b, &d);
                black_box(surface.depth_at(100, 100));
            });
        });
    }

    group.finish();
}

fn bench_blend_and_stipple(c: &mut Criterion) {
    let mut group = c.benchmark_group("triangle_state");
    let [a, b, d] = triangle();

    group.bench_function("blend_additive", |bench| {
        let mut surface = surface();
        surface.state_mut().blend = BlendState::additive();
        bench.iter(|| {
            surface.fill_triangle(Shading::Textured, &a, &b, &d);
            black_box(surface.pixel(100, 100));
        });
    });

    group.bench_function("stipple_checkerboard", |bench| {
        let mut surface = surface();
        surface.state_mut().stipple = Some(StipplePattern::checkerboard(2));
        bench.iter(|| {
            surface.fill_triangle(Shading::Flat, &a, &b, &d);
            black_box(surface.pixel(100, 100));
        });
    });

    group.finish();
}

fn bench_lines_and_copy(c: &mut Criterion) {
    c.bench_function("line_interpolated", |bench| {
        let mut surface = surface();
        let p1 = ScreenPoint::new(0, 0, 0).with_rgb8(255, 255, 0);
        let p2 = ScreenPoint::new(319, 239, 0).with_rgb8(0, 64, 255);
        bench.iter(|| {
            surface.draw_line(&p1, &p2);
            black_box(surface.pixel(160, 120));
        });
    });

    c.bench_function("copy_out_rgb565", |bench| {
        let surface = surface();
        let stride = WIDTH as usize * 2;
        let mut frame = vec![0u8; stride * HEIGHT as usize];
        bench.iter(|| {
            surface.copy_out::<softraster_core::Rgb565>(&mut frame, stride);
            black_box(frame[0]);
        });
    });
}

criterion_group!(
    benches,
    bench_shading_families,
    bench_depth_variants,
    bench_blend_and_stipple,
    bench_lines_and_copy
);
criterion_main!(benches);
