//! Explicit mean curvature flow.
//!
//! One step moves every vertex along its normal by its mean curvature scaled
//! by the time step:
//!
//! ```text
//! p <- p - n * ((k1 + k2) / 2) * dt
//! ```
//!
//! With outward normals and convex-positive curvature (see
//! [`super::curvature`]) convex regions move inward, so a closed surface
//! shrinks and bumps flatten out. The step reads normals and curvatures from
//! the mesh's attribute layers and never updates them; call
//! [`super::curvature::update_curvature`] before each step, or use
//! [`mean_curvature_flow`] which does so.
//!
//! # Example
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
//! let report = mean_curvature_flow_step(&mut mesh, &FlowOptions::default()).unwrap();
//! assert_eq!(report.vertices_displaced, 4);
//! assert!(!mesh.is_bounding_box_stale());
//! ```

use nalgebra::Vector3;
use rayon::prelude::*;

use super::curvature::{update_curvature_impl, CurvatureMethod};
use super::Progress;
use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex, Vertex};

/// Default step factor.
pub const DEFAULT_TIME_STEP: f64 = 0.01;

/// Options for [`mean_curvature_flow_step`].
#[derive(Debug, Clone)]
pub struct FlowOptions {
    /// Factor multiplied with the mean curvature. Any value is accepted,
    /// including zero, negative and non-finite ones.
    pub time_step: f64,

    /// Whether to displace vertices on the rayon pool (default: true).
    pub parallel: bool,

    /// Reject meshes with boundary edges instead of warning (default: false).
    pub require_closed: bool,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            time_step: DEFAULT_TIME_STEP,
            parallel: true,
            require_closed: false,
        }
    }
}

impl FlowOptions {
    /// Set the step factor.
    pub fn with_time_step(mut self, time_step: f64) -> Self {
        self.time_step = time_step;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Fail with [`MeshError::OpenMesh`] on meshes with boundary edges.
    pub fn with_require_closed(mut self, require_closed: bool) -> Self {
        self.require_closed = require_closed;
        self
    }
}

/// What a flow step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlowReport {
    /// Live vertices at the time of the step.
    pub vertices_displaced: usize,
}

fn check_closed<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, options: &FlowOptions) -> Result<()> {
    let boundary_edges = mesh.boundary_edge_count();
    if boundary_edges == 0 {
        return Ok(());
    }
    if options.require_closed {
        return Err(MeshError::OpenMesh { boundary_edges });
    }
    log::warn!(
        "mean curvature flow on an open mesh ({} boundary edges); boundary vertices may drift",
        boundary_edges
    );
    Ok(())
}

#[inline]
fn displace<I: MeshIndex>(vertex: &mut Vertex<I>, normal: &Vector3<f64>, k: &[f64; 2], dt: f64) {
    let mean = 0.5 * (k[0] + k[1]);
    vertex.position -= normal * (mean * dt);
}

/// Apply one explicit mean curvature flow step.
///
/// Every vertex slot is displaced using the stored normal and principal
/// curvatures. The bounding box is recomputed before returning.
///
/// # Errors
///
/// * [`MeshError::MissingAttribute`] if the normal or curvature layer is
///   not enabled
/// * [`MeshError::OpenMesh`] if `options.require_closed` is set and the mesh
///   has boundary edges; no vertex moves in that case
pub fn mean_curvature_flow_step<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    options: &FlowOptions,
) -> Result<FlowReport> {
    check_closed(mesh, options)?;

    let dt = options.time_step;
    let normals = mesh
        .attributes
        .normals
        .as_deref()
        .ok_or(MeshError::MissingAttribute { attribute: "normal" })?;
    let curvature = mesh
        .attributes
        .curvature
        .as_deref()
        .ok_or(MeshError::MissingAttribute { attribute: "curvature" })?;

    if options.parallel {
        mesh.vertices
            .par_iter_mut()
            .zip(normals.par_iter())
            .zip(curvature.par_iter())
            .for_each(|((vertex, n), k)| displace(vertex, n, k, dt));
    } else {
        mesh.vertices
            .iter_mut()
            .zip(normals.iter())
            .zip(curvature.iter())
            .for_each(|((vertex, n), k)| displace(vertex, n, k, dt));
    }

    mesh.mark_bounding_box_stale();
    mesh.update_bounding_box();

    Ok(FlowReport {
        vertices_displaced: mesh.num_live_vertices(),
    })
}

/// Run `iterations` flow steps, re-estimating normals and curvature with
/// `method` before each one.
///
/// Because curvature is re-evaluated between steps the result depends on how
/// the total time is split. Progress is reported once per iteration.
///
/// # Errors
///
/// [`MeshError::OpenMesh`] under `options.require_closed`, checked before the
/// first step.
pub fn mean_curvature_flow<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    options: &FlowOptions,
    iterations: usize,
    method: CurvatureMethod,
    progress: &Progress,
) -> Result<FlowReport> {
    check_closed(mesh, options)?;

    // The closedness check above already ran.
    let step_options = FlowOptions {
        require_closed: false,
        ..options.clone()
    };

    let mut report = FlowReport::default();
    for i in 0..iterations {
        update_curvature_impl(mesh, method, options.parallel);
        report = mean_curvature_flow_step(mesh, &step_options)?;
        progress.report(i + 1, iterations, "mean curvature flow");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::curvature::tests::{create_flat_grid, create_icosphere};
    use crate::algo::curvature::update_curvature;
    use crate::mesh::{build_from_triangles, remove_unreferenced_vertices, AttributeMask, VertexId};
    use nalgebra::Point3;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn positions(mesh: &HalfEdgeMesh) -> Vec<Point3<f64>> {
        mesh.vertex_ids().map(|v| *mesh.position(v)).collect()
    }

    fn prepared_sphere() -> HalfEdgeMesh {
        let mut mesh = create_icosphere(2, 1.0);
        update_curvature(&mut mesh, CurvatureMethod::QuadricFit);
        mesh
    }

    #[test]
    fn test_zero_step_is_identity() {
        let mut mesh = prepared_sphere();
        let before = positions(&mesh);

        let options = FlowOptions::default().with_time_step(0.0);
        mean_curvature_flow_step(&mut mesh, &options).unwrap();

        assert_eq!(positions(&mesh), before);
    }

    #[test]
    fn test_steps_add_with_fixed_curvature() {
        let mut split = prepared_sphere();
        let mut whole = split.clone();

        mean_curvature_flow_step(&mut split, &FlowOptions::default().with_time_step(0.02)).unwrap();
        mean_curvature_flow_step(&mut split, &FlowOptions::default().with_time_step(0.03)).unwrap();
        mean_curvature_flow_step(&mut whole, &FlowOptions::default().with_time_step(0.05)).unwrap();

        for (a, b) in positions(&split).iter().zip(positions(&whole).iter()) {
            assert!((a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn test_topology_unchanged() {
        let mut mesh = prepared_sphere();
        let (nv, nh, nf) = (mesh.num_vertices(), mesh.num_halfedges(), mesh.num_faces());
        let triangles: Vec<_> = mesh.face_ids().map(|f| mesh.face_triangle(f)).collect();

        mean_curvature_flow_step(&mut mesh, &FlowOptions::default().with_time_step(0.1)).unwrap();

        assert_eq!((mesh.num_vertices(), mesh.num_halfedges(), mesh.num_faces()), (nv, nh, nf));
        let after: Vec<_> = mesh.face_ids().map(|f| mesh.face_triangle(f)).collect();
        assert_eq!(triangles, after);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_unit_curvature_moves_inward_by_dt() {
        let mut mesh = create_icosphere(2, 1.0);
        mesh.enable_attributes(AttributeMask::NORMAL | AttributeMask::CURVATURE);
        for v in mesh.vertex_ids().collect::<Vec<_>>() {
            let radial = mesh.position(v).coords.normalize();
            mesh.set_normal(v, radial).unwrap();
            mesh.set_principal_curvatures(v, 1.0, 1.0).unwrap();
        }

        let dt = 0.1;
        mean_curvature_flow_step(&mut mesh, &FlowOptions::default().with_time_step(dt)).unwrap();

        for v in mesh.vertex_ids() {
            let r = mesh.position(v).coords.norm();
            assert!((r - (1.0 - dt)).abs() < 1e-12, "radius {} at {:?}", r, v);
        }
    }

    #[test]
    fn test_empty_mesh() {
        let mut mesh: HalfEdgeMesh = HalfEdgeMesh::new();
        mesh.enable_attributes(AttributeMask::CURVATURE_FLOW);

        let report = mean_curvature_flow_step(&mut mesh, &FlowOptions::default()).unwrap();

        assert_eq!(report.vertices_displaced, 0);
        assert!(mesh.bounding_box().is_none());
        assert!(!mesh.is_bounding_box_stale());
    }

    #[test]
    fn test_flat_patch_is_stationary() {
        let mut mesh = create_flat_grid(4);
        update_curvature(&mut mesh, CurvatureMethod::QuadricFit);
        let before = positions(&mesh);

        for dt in [0.01, 1.0, -3.0] {
            mean_curvature_flow_step(&mut mesh, &FlowOptions::default().with_time_step(dt)).unwrap();
        }

        assert_eq!(positions(&mesh), before);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut par = prepared_sphere();
        let mut seq = par.clone();

        mean_curvature_flow_step(&mut par, &FlowOptions::default().with_time_step(0.05)).unwrap();
        mean_curvature_flow_step(&mut seq, &FlowOptions::default().with_time_step(0.05).sequential())
            .unwrap();

        assert_eq!(positions(&par), positions(&seq));
        assert_eq!(par.bounding_box(), seq.bounding_box());
    }

    #[test]
    fn test_require_closed_rejects_open_mesh() {
        let mut mesh = create_flat_grid(3);
        update_curvature(&mut mesh, CurvatureMethod::QuadricFit);
        let before = positions(&mesh);

        let options = FlowOptions::default().with_require_closed(true);
        let err = mean_curvature_flow_step(&mut mesh, &options).unwrap_err();

        assert!(matches!(err, MeshError::OpenMesh { boundary_edges: 12 }));
        assert_eq!(positions(&mesh), before);
    }

    #[test]
    fn test_open_mesh_allowed_by_default() {
        let mut mesh = create_flat_grid(3);
        update_curvature(&mut mesh, CurvatureMethod::QuadricFit);
        assert!(mean_curvature_flow_step(&mut mesh, &FlowOptions::default()).is_ok());
    }

    #[test]
    fn test_missing_layers() {
        let mut mesh = create_icosphere(0, 1.0);
        let err = mean_curvature_flow_step(&mut mesh, &FlowOptions::default()).unwrap_err();
        assert!(matches!(err, MeshError::MissingAttribute { attribute: "normal" }));

        mesh.enable_attributes(AttributeMask::NORMAL);
        let err = mean_curvature_flow_step(&mut mesh, &FlowOptions::default()).unwrap_err();
        assert!(matches!(err, MeshError::MissingAttribute { attribute: "curvature" }));
    }

    #[test]
    fn test_reports_live_vertices() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
            Point3::new(4.0, 4.0, 4.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
        remove_unreferenced_vertices(&mut mesh);
        update_curvature(&mut mesh, CurvatureMethod::Meyer);

        let report = mean_curvature_flow_step(&mut mesh, &FlowOptions::default()).unwrap();

        assert_eq!(report.vertices_displaced, 4);
        assert_eq!(*mesh.position(VertexId::new(4)), Point3::new(4.0, 4.0, 4.0));
        // The deleted stray does not stretch the box.
        let bbox = mesh.bounding_box().unwrap();
        assert!(bbox.max.x < 2.0);
    }

    #[test]
    fn test_iterated_flow_shrinks_sphere() {
        let mut mesh = create_icosphere(2, 1.0);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let progress = Progress::new(move |_, total, _| {
            assert_eq!(total, 5);
            seen.fetch_add(1, Ordering::Relaxed);
        });

        let options = FlowOptions::default().with_time_step(0.01);
        let report =
            mean_curvature_flow(&mut mesh, &options, 5, CurvatureMethod::QuadricFit, &progress)
                .unwrap();

        assert_eq!(report.vertices_displaced, mesh.num_vertices());
        assert_eq!(calls.load(Ordering::Relaxed), 5);
        for v in mesh.vertex_ids() {
            let r = mesh.position(v).coords.norm();
            assert!(r < 0.99 && r > 0.9, "radius {}", r);
        }
    }

    #[test]
    fn test_iterated_flow_checks_closedness_first() {
        let mut mesh = create_flat_grid(2);
        let before = positions(&mesh);
        let options = FlowOptions::default().with_require_closed(true);

        let result = mean_curvature_flow(&mut mesh, &options, 3, CurvatureMethod::Meyer, &Progress::none());

        assert!(result.is_err());
        assert_eq!(positions(&mesh), before);
        assert!(!mesh.has_attributes(AttributeMask::CURVATURE));
    }
}
