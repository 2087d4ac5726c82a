//! Cross-checks the tree against the brute-force oracle on the faces and the edges of a
//! mesh, then measures the closest point query throughput.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use aabb_tree::differential::{DifferentialConfig, DifferentialTester};
use aabb_tree::{
    AabbTree, BoundingHierarchy, Intersects, Line, Primitive, Ray, Segment, TriangleMesh,
};
use anyhow::{Context, Result};
use clap::Parser;
use flexi_logger::Logger;
use log::{info, warn};
use nalgebra::{Point3, Vector3};
use obj::raw::object::Polygon;
use obj::raw::parse_obj;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Parser)]
#[command(name = "aabb-harness")]
#[command(about = "Differential tester and benchmark for the AABB tree")]
struct Args {
    /// OBJ mesh to load; a random triangle soup is generated when omitted
    mesh: Option<PathBuf>,

    /// Number of triangles of the random soup
    #[arg(long, default_value_t = 10_000)]
    triangles: usize,

    /// Seconds spent on each family of checks
    #[arg(long, default_value_t = 1.0)]
    check_seconds: f64,

    /// Seconds spent benchmarking closest point queries
    #[arg(long, default_value_t = 1.0)]
    benchmark_seconds: f64,

    /// Relative tolerance on distances and intersection parameters
    #[arg(long, default_value_t = 1e-6)]
    tolerance: f64,

    /// Seed of the soup generator and of the queries
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Build the trees on the current thread only
    #[arg(long)]
    sequential: bool,

    /// Seed distance queries from a hierarchy over the reference points
    #[arg(long)]
    accelerate: bool,

    /// Log specification, e.g. `info` or `aabb_tree=debug`
    #[arg(long, default_value = "info")]
    log: String,
}

impl Args {
    fn config(&self) -> DifferentialConfig {
        DifferentialConfig {
            check_duration: Duration::from_secs_f64(self.check_seconds),
            benchmark_duration: Duration::from_secs_f64(self.benchmark_seconds),
            relative_tolerance: self.tolerance,
            seed: self.seed,
            ..Default::default()
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _logger = Logger::try_with_str(&args.log)?.start()?;

    let mesh = match &args.mesh {
        Some(path) => load_obj(path)?,
        None => random_soup(args.triangles, args.seed)?,
    };
    info!(
        "mesh of {} vertices, {} faces and {} edges",
        mesh.vertices().len(),
        mesh.face_count(),
        mesh.edge_count()
    );

    check_family("faces", mesh.faces(), &args)?;
    check_family("edges", mesh.edges(), &args)?;
    Ok(())
}

/// Builds a tree over `primitives`, runs the differential checks and the benchmark.
fn check_family<P>(name: &str, primitives: impl IntoIterator<Item = P>, args: &Args) -> Result<()>
where
    P: Primitive<f64, 3>,
    P::Datum: Intersects<f64, 3, Segment<f64, 3>>
        + Intersects<f64, 3, Ray<f64, 3>>
        + Intersects<f64, 3, Line<f64, 3>>,
{
    let start = Instant::now();
    let mut tree = if args.sequential {
        AabbTree::build(primitives)
    } else {
        AabbTree::build_par(primitives)
    };
    if args.accelerate {
        tree = tree.accelerate_distance_queries();
    }
    info!("built the {} tree in {:?}", name, start.elapsed());

    let mut tester = DifferentialTester::new(&tree, args.config());
    let report = tester
        .run()
        .with_context(|| format!("the {name} tree disagrees with the brute-force oracle"))?;
    println!("{name}: {} primitives\n{report}", tree.size());

    if tree.is_empty() {
        warn!("no {} to benchmark", name);
    } else {
        let per_second = tester.benchmark_distance_queries();
        println!("{name}: {per_second:.0} closest point queries per second\n");
    }
    Ok(())
}

/// Loads an OBJ file, splitting polygons into triangle fans.
fn load_obj(path: &PathBuf) -> Result<TriangleMesh<f64>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let raw = parse_obj(BufReader::new(file))
        .with_context(|| format!("cannot parse {}", path.display()))?;
    let vertices = raw
        .positions
        .iter()
        .map(|p| Point3::new(p.0 as f64, p.1 as f64, p.2 as f64))
        .collect();
    let mut faces = Vec::new();
    for polygon in raw.polygons {
        let indices: Vec<usize> = match polygon {
            Polygon::P(vec) => vec,
            Polygon::PT(vec) | Polygon::PN(vec) => vec.iter().map(|vertex| vertex.0).collect(),
            Polygon::PTN(vec) => vec.iter().map(|vertex| vertex.0).collect(),
        };
        for window in 1..indices.len().saturating_sub(1) {
            faces.push([indices[0], indices[window], indices[window + 1]]);
        }
    }
    Ok(TriangleMesh::new(vertices, faces)?)
}

/// Generates `n` unconnected triangles of size up to 2 in the cube of half size 10.
fn random_soup(n: usize, seed: u64) -> Result<TriangleMesh<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut random_vector = |range: f64| {
        Vector3::new(
            rng.random_range(-range..range),
            rng.random_range(-range..range),
            rng.random_range(-range..range),
        )
    };
    let mut vertices = Vec::with_capacity(3 * n);
    for _ in 0..n {
        let center = Point3::origin() + random_vector(10.0);
        vertices.push(center + random_vector(1.0));
        vertices.push(center + random_vector(1.0));
        vertices.push(center + random_vector(1.0));
    }
    let faces = (0..n).map(|i| [3 * i, 3 * i + 1, 3 * i + 2]).collect();
    Ok(TriangleMesh::new(vertices, faces)?)
}
