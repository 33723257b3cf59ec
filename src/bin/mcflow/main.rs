//! mcflow CLI - mean curvature flow on mesh files.
//!
//! Usage: mcflow <COMMAND> [OPTIONS]
//!
//! Run `mcflow --help` for available commands. Set `RUST_LOG=debug` for
//! preprocessing details.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

use mcflow::algo::curvature::{self, CurvatureMethod};
use mcflow::algo::flow::{FlowOptions, DEFAULT_TIME_STEP};
use mcflow::algo::Progress;
use mcflow::filter::{
    Filter, FilterRegistry, MeanCurvatureFlowFilter, MEAN_CURVATURE_FLOW_ID, TIME_PARAMETER,
};
use mcflow::io;
use mcflow::mesh::HalfEdgeMesh;

#[derive(Parser)]
#[command(name = "mcflow")]
#[command(author, version, about = "Mean curvature flow on triangle meshes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file (.stl or .ply)
        input: PathBuf,

        /// Show curvature statistics
        #[arg(long)]
        curvature: bool,
    },

    /// Run mean curvature flow
    Flow {
        /// Input mesh file (.stl or .ply)
        input: PathBuf,

        /// Output mesh file (.stl or .ply)
        output: PathBuf,

        /// Mean curvature factor per step
        #[arg(short, long, default_value_t = DEFAULT_TIME_STEP, allow_negative_numbers = true)]
        time: f64,

        /// Number of steps; curvature is re-estimated before each
        #[arg(short, long, default_value = "1")]
        iterations: usize,

        /// Curvature estimator
        #[arg(short, long, value_enum, default_value = "quadric")]
        method: Method,

        /// Fail on meshes with boundary edges instead of warning
        #[arg(long)]
        require_closed: bool,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },

    /// List the registered filters and their parameters
    Filters,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Method {
    /// Local quadric fitting
    Quadric,
    /// Meyer et al. discrete operators
    Meyer,
}

impl From<Method> for CurvatureMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Quadric => CurvatureMethod::QuadricFit,
            Method::Meyer => CurvatureMethod::Meyer,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input, curvature } => cmd_info(&input, curvature)?,

        Commands::Flow {
            input,
            output,
            time,
            iterations,
            method,
            require_closed,
            sequential,
        } => {
            let options = FlowOptions::default()
                .with_parallel(!sequential)
                .with_require_closed(require_closed);
            cmd_flow(&input, &output, time, iterations, method.into(), options)?;
        }

        Commands::Filters => cmd_filters(),
    }

    Ok(())
}

/// Progress bar on stderr. Only redraws when the percentage grows.
fn create_progress() -> Progress {
    let shown = Arc::new(AtomicUsize::new(0));

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }
        let percent = if current >= total {
            100
        } else {
            (current * 100 + total / 2) / total
        };

        if shown.fetch_max(percent, Ordering::Relaxed) >= percent && percent != 100 {
            return;
        }

        let width = 30;
        let filled = percent * width / 100;
        eprint!(
            "\r[{}{}] {:3}% {}",
            "=".repeat(filled),
            " ".repeat(width - filled),
            percent,
            message
        );
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn min_max_avg(values: impl Iterator<Item = f64>) -> Option<(f64, f64, f64)> {
    let (mut min, mut max, mut sum, mut n) = (f64::INFINITY, f64::NEG_INFINITY, 0.0, 0usize);
    for v in values {
        min = min.min(v);
        max = max.max(v);
        sum += v;
        n += 1;
    }
    (n > 0).then(|| (min, max, sum / n as f64))
}

fn cmd_info(input: &PathBuf, show_curvature: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh: HalfEdgeMesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Half-edges: {}", mesh.num_halfedges());

    let unreferenced = mesh.live_vertex_ids().filter(|&v| mesh.is_isolated(v)).count();
    if unreferenced > 0 {
        println!("Unreferenced vertices: {}", unreferenced);
    }

    println!("Surface area: {:.6}", mesh.surface_area());
    println!("Average edge length: {:.6}", mesh.average_edge_length());

    if let Some(bbox) = mesh.update_bounding_box() {
        let (min, max, size) = (bbox.min, bbox.max, bbox.extent());
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        println!("Dimensions: {:.3} x {:.3} x {:.3}", size.x, size.y, size.z);
    }

    match mesh.boundary_edge_count() {
        0 => println!("Topology: Closed (no boundary)"),
        n => println!("Topology: Open ({} boundary edges)", n),
    }

    if show_curvature {
        println!("\nCurvature:");

        let meyer = curvature::compute_curvature(&mesh);
        if let Some((lo, hi, avg)) = min_max_avg(meyer.gaussian_values().iter().copied()) {
            println!("  Gaussian:    min={:.4}, max={:.4}, avg={:.4}", lo, hi, avg);
        }

        let fit = curvature::fit_curvature(&mesh);
        let live: Vec<_> = mesh.live_vertex_ids().collect();
        let stats = [
            ("k1", min_max_avg(live.iter().map(|&v| fit.principal(v).0))),
            ("k2", min_max_avg(live.iter().map(|&v| fit.principal(v).1))),
            ("Mean (fit)", min_max_avg(live.iter().map(|&v| fit.mean(v)))),
        ];
        for (label, s) in stats {
            if let Some((lo, hi, avg)) = s {
                println!("  {:<12} min={:.4}, max={:.4}, avg={:.4}", format!("{}:", label), lo, hi, avg);
            }
        }
    }

    Ok(())
}

fn cmd_flow(
    input: &PathBuf,
    output: &PathBuf,
    time: f64,
    iterations: usize,
    method: CurvatureMethod,
    options: FlowOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = FilterRegistry::new();
    registry.register(
        MeanCurvatureFlowFilter::new()
            .with_method(method)
            .with_options(options),
    )?;
    let filter = registry.require(MEAN_CURVATURE_FLOW_ID)?;

    println!("Loading {}...", input.display());
    let mut mesh: HalfEdgeMesh = io::load(input)?;
    println!("  {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    let mut params = filter.default_parameters();
    params.set_float(TIME_PARAMETER, time)?;

    println!(
        "{} x{} (time={}, method={:?})",
        filter.descriptor().name,
        iterations,
        time,
        method
    );
    let start = Instant::now();
    let bar = Arc::new(create_progress());

    for step in 0..iterations {
        filter.prepare(&mut mesh)?;

        let outer = Arc::clone(&bar);
        let progress = Progress::new(move |done, of, message| {
            outer.report_sub(done, of, step, iterations, message);
        });
        filter.apply(&mut mesh, &params, &progress)?;
    }

    let elapsed = start.elapsed();
    println!("  Completed in {:.2?}", elapsed);

    println!("Saving {}...", output.display());
    io::save(&mesh, output)?;

    Ok(())
}

fn cmd_filters() {
    let registry = FilterRegistry::with_builtin_filters();
    for d in registry.descriptors() {
        println!("{} [{}]", d.id, d.class);
        println!("  {}", d.name);
        println!("  {}", d.description);
        for p in &d.parameters {
            println!(
                "  - {} ({}, default {}): {} - {}",
                p.name,
                p.default.type_name(),
                p.default,
                p.label,
                p.description
            );
        }
    }
}
