//! # mcflow
//!
//! Explicit mean curvature flow on triangle meshes, packaged as a filter a
//! host application can register and run.
//!
//! One flow step moves every vertex along its normal by its mean curvature
//! times a step factor:
//!
//! ```text
//! p <- p - n * ((k1 + k2) / 2) * dt
//! ```
//!
//! ## Features
//!
//! - **Half-edge mesh** with typed, index-generic handles and optional
//!   per-vertex attribute layers (normals, principal curvatures, principal
//!   directions)
//! - **Cleaning**: drop unreferenced vertices and compact storage
//! - **Curvature**: quadric fitting or the Meyer et al. discrete operators
//! - **Flow**: single steps or iterated flow, parallel through rayon
//! - **Filters**: descriptors, typed parameters and a registry
//! - **I/O**: STL and PLY
//!
//! ## Quick Start
//!
//! ```no_run
//! use mcflow::prelude::*;
//! use mcflow::algo::Progress;
//!
//! let mut mesh: HalfEdgeMesh = mcflow::io::load("bunny.ply").unwrap();
//!
//! let registry = FilterRegistry::with_builtin_filters();
//! let filter = registry.get("mean_curvature_flow").unwrap();
//!
//! filter.prepare(&mut mesh).unwrap();
//! let mut params = filter.default_parameters();
//! params.set_float("Time", 0.005).unwrap();
//! let outcome = filter.apply(&mut mesh, &params, &Progress::none()).unwrap();
//! println!("{}", outcome.message);
//!
//! mcflow::io::save(&mesh, "bunny-smooth.ply").unwrap();
//! ```
//!
//! ## Using the algorithms directly
//!
//! ```
//! use mcflow::prelude::*;
//! use mcflow::algo::curvature::{update_curvature, CurvatureMethod};
//! use mcflow::algo::flow::{mean_curvature_flow_step, FlowOptions};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//! let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//! let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! update_curvature(&mut mesh, CurvatureMethod::Meyer);
//! let options = FlowOptions::default().with_time_step(0.02).with_require_closed(true);
//! mean_curvature_flow_step(&mut mesh, &options).unwrap();
//!
//! let v = VertexId::new(0);
//! println!("moved to {:?}", mesh.position(v));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod filter;
pub mod io;
pub mod mesh;

/// Commonly used types and functions.
///
/// ```
/// use mcflow::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{MeshError, Result};
    pub use crate::filter::{Filter, FilterRegistry, ParameterSet};
    pub use crate::mesh::{
        build_from_triangles, to_face_vertex, AttributeMask, FaceId, HalfEdgeId, HalfEdgeMesh,
        MeshIndex, VertexId,
    };
}

pub use nalgebra;
