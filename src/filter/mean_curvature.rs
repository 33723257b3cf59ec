//! The mean curvature flow filter.

use super::params::{ParameterDecl, ParameterSet};
use super::registry::{Filter, FilterClass, FilterDescriptor, FilterOutcome};
use crate::algo::curvature::{update_curvature_impl, CurvatureMethod};
use crate::algo::flow::{mean_curvature_flow_step, FlowOptions, DEFAULT_TIME_STEP};
use crate::algo::Progress;
use crate::error::Result;
use crate::mesh::{compact_vertices, remove_unreferenced_vertices, AttributeMask, HalfEdgeMesh};

/// Registry id of [`MeanCurvatureFlowFilter`].
pub const MEAN_CURVATURE_FLOW_ID: &str = "mean_curvature_flow";

/// Name of the step-factor parameter.
pub const TIME_PARAMETER: &str = "Time";

/// One explicit mean curvature flow step, as a host filter.
///
/// [`Filter::prepare`] enables the normal and curvature layers, drops
/// unreferenced vertices, compacts vertex storage and estimates curvature.
/// [`Filter::apply`] then displaces every vertex by the `"Time"` parameter
/// times its mean curvature.
///
/// ```
/// use mcflow::filter::{Filter, MeanCurvatureFlowFilter};
/// use mcflow::algo::Progress;
/// use mcflow::prelude::*;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
///     Point3::new(0.5, 0.5, 1.0),
/// ];
/// let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
/// let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
///
/// let filter = MeanCurvatureFlowFilter::new();
/// filter.prepare(&mut mesh).unwrap();
/// let outcome = filter
///     .apply(&mut mesh, &filter.default_parameters(), &Progress::none())
///     .unwrap();
/// assert_eq!(outcome.message, "Successfully displaced 4 vertices");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MeanCurvatureFlowFilter {
    options: FlowOptions,
    method: CurvatureMethod,
}

impl MeanCurvatureFlowFilter {
    /// Quadric-fit curvature, parallel, open meshes allowed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `options` for the step. Its `time_step` is ignored in favour of
    /// the `"Time"` parameter.
    pub fn with_options(mut self, options: FlowOptions) -> Self {
        self.options = options;
        self
    }

    /// Estimate curvature with `method` during preparation.
    pub fn with_method(mut self, method: CurvatureMethod) -> Self {
        self.method = method;
        self
    }

    /// The curvature estimator in use.
    pub fn method(&self) -> CurvatureMethod {
        self.method
    }
}

impl Filter for MeanCurvatureFlowFilter {
    fn descriptor(&self) -> FilterDescriptor {
        FilterDescriptor {
            id: MEAN_CURVATURE_FLOW_ID,
            name: "Mean curvature flow",
            description: "Move the vertices of the mesh along vertex normal according to curvature. \
                          Warning: This version works only with closed meshes.",
            class: FilterClass::Smoothing,
            parameters: vec![ParameterDecl::float(
                TIME_PARAMETER,
                DEFAULT_TIME_STEP,
                "Mean curvature factor",
                "Value which will be multiplied with curvature.",
            )],
        }
    }

    fn prepare(&self, mesh: &mut HalfEdgeMesh) -> Result<()> {
        mesh.enable_attributes(AttributeMask::CURVATURE_FLOW);

        let flagged = remove_unreferenced_vertices(mesh);
        let reclaimed = compact_vertices(mesh);
        if flagged > 0 || reclaimed > 0 {
            log::debug!(
                "removed {} unreferenced vertices, reclaimed {} slots",
                flagged,
                reclaimed
            );
        }

        update_curvature_impl(mesh, self.method, self.options.parallel);
        Ok(())
    }

    fn apply(
        &self,
        mesh: &mut HalfEdgeMesh,
        params: &ParameterSet,
        progress: &Progress,
    ) -> Result<FilterOutcome> {
        let time_step = params.get_float(TIME_PARAMETER)?;
        let options = self.options.clone().with_time_step(time_step);

        progress.report(0, 1, "displacing vertices");
        let report = mean_curvature_flow_step(mesh, &options)?;
        progress.report(1, 1, "displacing vertices");

        let message = format!("Successfully displaced {} vertices", report.vertices_displaced);
        log::info!("{}", message);

        Ok(FilterOutcome {
            message,
            vertices_affected: report.vertices_displaced,
        })
    }
}
