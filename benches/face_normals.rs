use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use shadow_scene::config::DemoConfig;
use shadow_scene::core::TraceContext;
use shadow_scene::geometry::LETTER_F;
use shadow_scene::math::calculate_normals;
use shadow_scene::ShadowDemo;

/// Flat normals of the letter mesh
fn bench_letter_normals(c: &mut Criterion) {
    c.bench_function("letter_normals", |b| {
        b.iter(|| calculate_normals(black_box(&LETTER_F)))
    });
}

/// Normals of the letter mesh repeated `count` times
fn bench_large_meshes(c: &mut Criterion) {
    let mut group = c.benchmark_group("mesh_normals");

    for count in [10, 100, 1000].iter() {
        let vertices: Vec<f32> = LETTER_F
            .iter()
            .copied()
            .cycle()
            .take(LETTER_F.len() * count)
            .collect();

        group.bench_with_input(BenchmarkId::new("letters", count), count, |b, _| {
            b.iter(|| calculate_normals(black_box(&vertices)))
        });
    }

    group.finish();
}

/// Both passes against the recording context
fn bench_headless_redraw(c: &mut Criterion) {
    let mut ctx = TraceContext::new();
    let mut demo = match ShadowDemo::new(&mut ctx, &DemoConfig::default()) {
        Ok(demo) => demo,
        Err(e) => panic!("demo setup failed: {}", e),
    };

    c.bench_function("headless_redraw", |b| {
        b.iter(|| {
            demo.redraw(&mut ctx).ok();
            ctx.take_commands()
        })
    });
}

criterion_group!(
    benches,
    bench_letter_normals,
    bench_large_meshes,
    bench_headless_redraw
);
criterion_main!(benches);
