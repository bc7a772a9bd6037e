//! Build a hypercube index, query it, and cross-check against brute force.
//!
//! ```bash
//! cargo run --release --bin cube_bench -- [n] [dim] [code_bits] [workers] [budget] [radius]
//! cargo run --release --bin cube_bench -- 60000 784 8 1 600 255 points.txt queries.txt
//! ```
//!
//! With file arguments the pointset and queries are whitespace-separated
//! ASCII scalars; otherwise a clustered synthetic dataset is generated.

use std::time::Instant;

use kyvos::benchmark::{self, linear_radius_scan};
use kyvos::{io, Hypercube, HypercubeParams, PointSet};

struct Config {
    n: usize,
    dim: usize,
    code_bits: usize,
    workers: usize,
    budget: usize,
    radius: f32,
    pointset_path: Option<String>,
    queries_path: Option<String>,
}

fn parse_args() -> Config {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let num = |i: usize, default: usize| -> usize {
        args.get(i).and_then(|s| s.parse().ok()).unwrap_or(default)
    };
    let n = num(0, 10_000);
    Config {
        n,
        dim: num(1, 32),
        code_bits: num(2, kyvos::default_code_bits(n)),
        workers: num(3, 1),
        budget: num(4, n / 100 + 1),
        radius: args
            .get(5)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.25_f32),
        pointset_path: args.get(6).cloned(),
        queries_path: args.get(7).cloned(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = parse_args();
    let q_total = (cfg.n / 10).max(1);

    println!(
        "n = {}, dim = {}, code_bits = {}, workers = {}, budget = {}, radius = {}",
        cfg.n, cfg.dim, cfg.code_bits, cfg.workers, cfg.budget, cfg.radius
    );

    let data: Vec<f32> = match &cfg.pointset_path {
        Some(path) => io::read_ascii(path, cfg.n, cfg.dim)?,
        None => benchmark::clustered_pointset(cfg.n, cfg.dim, 16, 0.05, 42),
    };
    let queries: Vec<f32> = match &cfg.queries_path {
        Some(path) => io::read_ascii(path, q_total, cfg.dim)?,
        None => benchmark::clustered_pointset(q_total, cfg.dim, 16, 0.05, 43),
    };
    let points = PointSet::new(&data, cfg.dim)?;

    let mut params = HypercubeParams::new(cfg.code_bits);
    params.workers = cfg.workers;

    let t = Instant::now();
    let cube = Hypercube::build(points, &params)?;
    println!("build: {:.3}s", t.elapsed().as_secs_f64());

    let occupancy = cube.vertex_occupancy();
    println!("occupied vertices: {}", occupancy.len());
    for (code, count) in occupancy.iter().take(8) {
        println!("  {code}: {count} points");
    }

    let t = Instant::now();
    let hits = cube.radius_query(&queries, cfg.radius, cfg.budget, cfg.workers)?;
    println!(
        "radius query: {:.1}us/query",
        t.elapsed().as_secs_f64() * 1e6 / q_total as f64
    );

    let t = Instant::now();
    let nearest = cube.nearest_neighbor_query(&queries, cfg.budget, cfg.workers)?;
    println!(
        "nn query: {:.1}us/query",
        t.elapsed().as_secs_f64() * 1e6 / q_total as f64
    );

    // Brute-force reference over the full set.
    let t = Instant::now();
    let squared_radius = cfg.radius * cfg.radius;
    let reference: Vec<Option<u32>> = (0..q_total)
        .map(|qi| {
            let q = &queries[qi * cfg.dim..(qi + 1) * cfg.dim];
            linear_radius_scan(&points, q, squared_radius)
        })
        .collect();
    println!(
        "brute force: {:.1}us/query",
        t.elapsed().as_secs_f64() * 1e6 / q_total as f64
    );

    let agreement = benchmark::radius_agreement(&hits, &reference);
    println!("radius agreement vs brute force: {:.1}%", agreement * 100.0);

    let found = nearest.iter().filter(|r| r.is_some()).count();
    println!("nn answered: {found}/{q_total}");

    Ok(())
}
