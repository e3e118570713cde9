//! # View and Group Benchmarks
//!
//! Measures the storage hot paths:
//! - emplace throughput into CPU and GPU-resident pools
//! - single-type view scan (contiguous array walk)
//! - two-type view intersection driven by the smaller pool
//! - owning group iteration (no membership checks)
//!
//! Run with: `cargo bench --package tessera_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use bytemuck::{Pod, Zeroable};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tessera_core::{component, gpu_component, EcsConfig, GpuPoolConfig, Registry};

#[derive(Clone, Copy, Debug, Default)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Clone, Copy, Debug, Default)]
struct Velocity {
    x: f32,
    y: f32,
    z: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct Transform {
    matrix: [f32; 16],
}

component!(Position, Velocity);
gpu_component!(Transform);

const SIZES: [usize; 2] = [10_000, 100_000];

/// Registry where every entity has a position and one in `stride` also moves.
fn populated(count: usize, stride: usize) -> Registry {
    let mut registry = Registry::default();
    for i in 0..count {
        let entity = registry.create_entity();
        let f = i as f32;
        registry
            .add_component(entity, Position { x: f, y: f, z: f })
            .unwrap();
        if i % stride == 0 {
            registry
                .add_component(entity, Velocity { x: 0.1, y: 0.2, z: 0.3 })
                .unwrap();
        }
    }
    registry
}

fn bench_emplace(c: &mut Criterion) {
    let mut group = c.benchmark_group("emplace");

    for count in SIZES {
        group.bench_with_input(BenchmarkId::new("cpu", count), &count, |b, &count| {
            b.iter(|| {
                let mut registry = Registry::default();
                for _ in 0..count {
                    let entity = registry.create_entity();
                    registry.add_component(entity, Position::default()).unwrap();
                }
                black_box(registry.pool_size::<Position>())
            });
        });

        group.bench_with_input(BenchmarkId::new("gpu", count), &count, |b, &count| {
            let config = EcsConfig {
                gpu_pool: GpuPoolConfig {
                    initial_capacity: 1024,
                    growth_factor: 2,
                },
                ..EcsConfig::default()
            };
            b.iter(|| {
                let mut registry = Registry::new(&config);
                for _ in 0..count {
                    let entity = registry.create_entity();
                    registry
                        .add_component(entity, Transform { matrix: [0.0; 16] })
                        .unwrap();
                }
                black_box(registry.pool_size::<Transform>())
            });
        });
    }

    group.finish();
}

fn bench_single_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_view");

    for count in SIZES {
        let mut registry = populated(count, 1);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                registry.view::<(Position,)>().for_each(|_, position| {
                    position.x += 1.0;
                });
            });
        });
    }

    group.finish();
}

fn bench_two_type_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("two_type_view");

    for count in SIZES {
        // One in four entities moves, so Velocity drives the view
        let mut registry = populated(count, 4);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                registry
                    .view::<(Position, Velocity)>()
                    .for_each(|_, position, velocity| {
                        position.x += velocity.x;
                        position.y += velocity.y;
                        position.z += velocity.z;
                    });
            });
        });
    }

    group.finish();
}

fn bench_group(c: &mut Criterion) {
    let mut group = c.benchmark_group("owning_group");

    for count in SIZES {
        let mut registry = populated(count, 4);
        // Build the group once, outside the measured loop
        black_box(registry.group::<(Position, Velocity)>().len());

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                registry
                    .group::<(Position, Velocity)>()
                    .for_each(|_, position, velocity| {
                        position.x += velocity.x;
                        position.y += velocity.y;
                        position.z += velocity.z;
                    });
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_emplace,
    bench_single_view,
    bench_two_type_view,
    bench_group,
);

criterion_main!(benches);
