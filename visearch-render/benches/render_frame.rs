use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use visearch_core::{RingSlot, Screen, Shape, ShapeColor, StimulusLayout};
use visearch_render::SkiaRenderer;
use visearch_timing::HighPrecisionTimer;

const WIDTH: u32 = 1920;
const HEIGHT: u32 = 1080;

fn layout() -> StimulusLayout {
    let shapes = [
        Shape::Triangle,
        Shape::Circle,
        Shape::Square,
        Shape::Hexagon,
        Shape::Trapezoid,
        Shape::Circle,
    ];
    let slots = std::array::from_fn(|i| {
        let a = (17.0 + i as f32 * 60.0).to_radians();
        RingSlot {
            shape: shapes[i],
            color: ShapeColor::White,
            position: (0.25 * a.cos(), 0.25 * a.sin()),
            size: 0.06,
        }
    });
    StimulusLayout {
        slots,
        target_index: 0,
        angle_offset_deg: 17.0,
        icon: None,
        fixation_size: 0.008,
    }
}

fn harness() -> (SkiaRenderer, Vec<u8>, HighPrecisionTimer) {
    let r = SkiaRenderer::new(WIDTH, HEIGHT, None, ".").expect("renderer");
    let fb = vec![0u8; (WIDTH * HEIGHT * 4) as usize];
    (r, fb, HighPrecisionTimer::new())
}

pub fn bench_frames(c: &mut Criterion) {
    let mut g = c.benchmark_group("render_frame");
    g.sample_size(40);
    let stim = layout();

    g.bench_function("stimulus_frame", |b| {
        b.iter_batched(
            harness,
            |(mut r, mut fb, t)| {
                let stats = r.render_frame(&Screen::Stimulus(&stim), &mut fb, &t);
                black_box(stats)
            },
            BatchSize::LargeInput,
        )
    });

    g.bench_function("fixation_frame", |b| {
        b.iter_batched(
            harness,
            |(mut r, mut fb, t)| {
                let stats = r.render_frame(&Screen::Fixation { size: 0.008 }, &mut fb, &t);
                black_box(stats)
            },
            BatchSize::LargeInput,
        )
    });

    g.finish();
}

criterion_group!(benches, bench_frames);
criterion_main!(benches);
