use std::hint::black_box;
use std::time::Instant;

use glam::Vec3;
use leashwalk_common::LayoutConfig;
use leashwalk_stream::{ChunkGrid, ViewCone, WorldStreamer};
use leashwalk_worldgen::CityBlockGenerator;

fn streamer() -> WorldStreamer<CityBlockGenerator> {
    WorldStreamer::new(
        ChunkGrid::new(20.0, 0.3),
        CityBlockGenerator::new(0xC0FFEE, 20.0, LayoutConfig::default()),
    )
}

fn bench_reconcile_straight(step: f32, iterations: usize) {
    let mut s = streamer();
    let mut pos = Vec3::new(10.0, 1.0, 10.0);

    let start = Instant::now();
    for _ in 0..iterations {
        pos.x += step;
        let _ = black_box(s.reconcile(black_box(pos)));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  straight walk (step {step}, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn bench_reconcile_idle(iterations: usize) {
    let mut s = streamer();
    let pos = Vec3::new(10.0, 1.0, 10.0);
    s.reconcile(pos);

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = black_box(s.reconcile(black_box(pos)));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  idle ({iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn bench_cull(iterations: usize) {
    let mut s = streamer();
    let viewer = Vec3::new(19.0, 1.6, 19.0);
    s.reconcile(viewer);
    let cone = ViewCone::new(0.25);

    let start = Instant::now();
    for i in 0..iterations {
        let yaw = i as f32 * 0.01;
        let forward = Vec3::new(yaw.sin(), 0.0, -yaw.cos());
        let _ = black_box(s.cull(&cone, black_box(viewer), black_box(forward)));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  cull ({} chunks, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}",
        s.len()
    );
}

fn main() {
    println!("=== Chunk Streaming Benchmarks ===\n");

    println!("Reconcile:");
    bench_reconcile_idle(100_000);
    bench_reconcile_straight(0.07, 10_000);
    bench_reconcile_straight(1.5, 10_000);

    println!("\nCull:");
    bench_cull(100_000);

    println!("\n=== Done ===");
}
