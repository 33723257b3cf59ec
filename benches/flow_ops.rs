//! Benchmarks for curvature estimation and the flow step.

use std::f64::consts::PI;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use mcflow::algo::curvature::{
    compute_curvature, compute_curvature_sequential, fit_curvature, fit_curvature_sequential,
    update_curvature, CurvatureMethod,
};
use mcflow::algo::flow::{mean_curvature_flow_step, FlowOptions};
use mcflow::prelude::*;
use nalgebra::Point3;

/// Latitude/longitude sphere with poles, closed.
fn create_uv_sphere(rings: usize, segments: usize) -> HalfEdgeMesh {
    let mut vertices = vec![Point3::new(0.0, 0.0, 1.0)];
    for j in 1..rings {
        let phi = PI * j as f64 / rings as f64;
        for i in 0..segments {
            let theta = 2.0 * PI * i as f64 / segments as f64;
            vertices.push(Point3::new(
                phi.sin() * theta.cos(),
                phi.sin() * theta.sin(),
                phi.cos(),
            ));
        }
    }
    vertices.push(Point3::new(0.0, 0.0, -1.0));
    let south = vertices.len() - 1;

    let ring = |j: usize, i: usize| 1 + (j - 1) * segments + i % segments;
    let mut faces = Vec::new();
    for i in 0..segments {
        faces.push([0, ring(1, i), ring(1, i + 1)]);
        faces.push([south, ring(rings - 1, i + 1), ring(rings - 1, i)]);
    }
    for j in 1..rings - 1 {
        for i in 0..segments {
            let (a, b) = (ring(j, i), ring(j, i + 1));
            let (c, d) = (ring(j + 1, i), ring(j + 1, i + 1));
            faces.push([a, c, d]);
            faces.push([a, d, b]);
        }
    }

    build_from_triangles(&vertices, &faces).unwrap()
}

fn bench_curvature(c: &mut Criterion) {
    let mut group = c.benchmark_group("curvature");
    for &n in &[32usize, 96] {
        let mesh = create_uv_sphere(n, 2 * n);
        group.bench_with_input(BenchmarkId::new("quadric_fit", n), &mesh, |b, m| {
            b.iter(|| fit_curvature(m))
        });
        group.bench_with_input(BenchmarkId::new("quadric_fit_sequential", n), &mesh, |b, m| {
            b.iter(|| fit_curvature_sequential(m))
        });
        group.bench_with_input(BenchmarkId::new("meyer", n), &mesh, |b, m| {
            b.iter(|| compute_curvature(m))
        });
        group.bench_with_input(BenchmarkId::new("meyer_sequential", n), &mesh, |b, m| {
            b.iter(|| compute_curvature_sequential(m))
        });
    }
    group.finish();
}

fn bench_flow_step(c: &mut Criterion) {
    let mut mesh = create_uv_sphere(128, 256);
    update_curvature(&mut mesh, CurvatureMethod::QuadricFit);

    // Zero step keeps the mesh identical across iterations.
    let parallel = FlowOptions::default().with_time_step(0.0);
    let sequential = parallel.clone().sequential();

    c.bench_function("flow_step_parallel", |b| {
        b.iter(|| mean_curvature_flow_step(&mut mesh, &parallel).unwrap())
    });
    c.bench_function("flow_step_sequential", |b| {
        b.iter(|| mean_curvature_flow_step(&mut mesh, &sequential).unwrap())
    });
}

criterion_group!(benches, bench_curvature, bench_flow_step);
criterion_main!(benches);
