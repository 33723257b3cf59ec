//! Discrete curvature estimation.
//!
//! Two estimators are provided:
//!
//! - [`fit_curvature`]: fits a height-field quadric
//!   `z = a x² + b xy + c y² + d x + e y` to the neighbourhood of each vertex,
//!   expressed in the vertex's tangent frame. The eigen-decomposition of the
//!   quadric's shape operator gives the principal curvatures *and* directions.
//!   This is the default for the curvature flow.
//! - [`compute_curvature`]: the Meyer et al. discrete operators (angle defect
//!   for Gaussian curvature, cotangent Laplacian for mean curvature) with
//!   principal curvatures recovered as `H ± sqrt(H² - K)`.
//!
//! [`update_curvature`] runs either estimator and stores the result in the
//! mesh's attribute layers.
//!
//! # Sign convention
//!
//! Curvature is positive where the surface bends away from its normal, i.e. on
//! convex regions of a closed mesh with outward normals. A sphere of radius r
//! has `k1 = k2 = 1/r`.
//!
//! # References
//!
//! - Meyer, M., et al. (2003). "Discrete Differential-Geometry Operators for
//!   Triangulated 2-Manifolds." Visualization and Mathematics III.
//! - Goldfeather, J., Interrante, V. (2004). "A novel cubic-order algorithm for
//!   approximating principal direction vectors." ACM TOG 23(1).

use std::collections::HashSet;
use std::f64::consts::PI;
use std::marker::PhantomData;

use nalgebra::{Matrix2, Matrix5, Point3, Vector2, Vector3, Vector5};
use rayon::prelude::*;

use crate::mesh::{AttributeMask, FaceId, HalfEdgeMesh, MeshIndex, VertexId};

/// Fewest neighbours a quadric fit accepts (one per unknown).
const MIN_FIT_NEIGHBORS: usize = 5;

/// Which estimator [`update_curvature`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurvatureMethod {
    /// Local quadric fitting; yields principal directions.
    #[default]
    QuadricFit,
    /// Meyer et al. discrete operators; directions are the tangent frame.
    Meyer,
}

// ============================================================================
// Meyer et al. operators
// ============================================================================

/// Per-vertex curvature from the discrete operators.
#[derive(Debug, Clone)]
pub struct CurvatureResult<I: MeshIndex = u32> {
    gaussian: Vec<f64>,
    mean: Vec<f64>,
    principal_max: Vec<f64>,
    principal_min: Vec<f64>,
    _marker: PhantomData<I>,
}

impl<I: MeshIndex> CurvatureResult<I> {
    /// Gaussian curvature K at a vertex.
    #[inline]
    pub fn gaussian(&self, v: VertexId<I>) -> f64 {
        self.gaussian[v.index()]
    }

    /// Signed mean curvature H at a vertex.
    #[inline]
    pub fn mean(&self, v: VertexId<I>) -> f64 {
        self.mean[v.index()]
    }

    /// Principal curvatures `(k1, k2)` with `k1 >= k2`.
    #[inline]
    pub fn principal(&self, v: VertexId<I>) -> (f64, f64) {
        (self.principal_max[v.index()], self.principal_min[v.index()])
    }

    /// All Gaussian curvatures.
    #[inline]
    pub fn gaussian_values(&self) -> &[f64] {
        &self.gaussian
    }

    /// All mean curvatures.
    #[inline]
    pub fn mean_values(&self) -> &[f64] {
        &self.mean
    }

    /// Number of vertices covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.gaussian.len()
    }

    /// Whether the result covers no vertex.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.gaussian.is_empty()
    }
}

/// Interior angle at `a` of triangle (a, b, c).
fn triangle_angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let ab = (b - a).normalize();
    let ac = (c - a).normalize();
    ab.dot(&ac).clamp(-1.0, 1.0).acos()
}

/// Cotangent of the angle at `a` of triangle (a, b, c); zero when degenerate.
fn cotangent_angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let ab = b - a;
    let ac = c - a;
    let cross_norm = ab.cross(&ac).norm();
    if cross_norm < 1e-10 {
        0.0
    } else {
        ab.dot(&ac) / cross_norm
    }
}

/// Corners of `f` rotated so that `v` comes first: (p_v, p_next, p_prev).
fn corners_from<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    f: FaceId<I>,
    v: VertexId<I>,
) -> (Point3<f64>, Point3<f64>, Point3<f64>) {
    let verts = mesh.face_triangle(f);
    let [p0, p1, p2] = mesh.face_positions(f);
    if verts[0] == v {
        (p0, p1, p2)
    } else if verts[1] == v {
        (p1, p2, p0)
    } else {
        (p2, p0, p1)
    }
}

/// Mixed Voronoi area of a vertex (Meyer et al., Fig. 4).
fn mixed_area<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> f64 {
    let mut area = 0.0;
    let mut barycentric = 0.0;

    for f in mesh.vertex_faces(v) {
        let (p, q, r) = corners_from(mesh, f, v);
        let tri_area = mesh.face_area(f);
        barycentric += tri_area / 3.0;

        let half_pi = PI / 2.0;
        let at_p = triangle_angle(&p, &q, &r);
        let at_q = triangle_angle(&q, &r, &p);
        let at_r = triangle_angle(&r, &p, &q);

        if at_p > half_pi {
            area += tri_area / 2.0;
        } else if at_q > half_pi || at_r > half_pi {
            area += tri_area / 4.0;
        } else {
            let cot_q = cotangent_angle(&q, &r, &p);
            let cot_r = cotangent_angle(&r, &p, &q);
            area += 0.125 * ((p - r).norm_squared() * cot_q + (p - q).norm_squared() * cot_r);
        }
    }

    if area < 1e-10 {
        barycentric
    } else {
        area
    }
}

fn angle_sum<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> f64 {
    mesh.vertex_faces(v)
        .map(|f| {
            let (p, q, r) = corners_from(mesh, f, v);
            triangle_angle(&p, &q, &r)
        })
        .sum()
}

/// Cotangent Laplacian of the position, `Σ (cot α + cot β)(p_j - p_i) / 2`.
fn cotangent_laplacian<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> Vector3<f64> {
    let p_v = *mesh.position(v);
    let mut laplacian = Vector3::zeros();

    for he in mesh.vertex_halfedges(v) {
        let p_j = *mesh.position(mesh.dest(he));
        let mut cot_sum = 0.0;

        for side in [he, mesh.twin(he)] {
            if mesh.is_boundary_halfedge(side) {
                continue;
            }
            let p_opp = mesh.position(mesh.origin(mesh.prev(side)));
            cot_sum += cotangent_angle(p_opp, &p_v, &p_j);
        }

        laplacian += cot_sum.max(0.0) * (p_j - p_v);
    }

    0.5 * laplacian
}

fn meyer_vertex<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> [f64; 4] {
    let area = mixed_area(mesh, v);
    if area <= 1e-10 {
        return [0.0; 4];
    }

    let k = (2.0 * PI - angle_sum(mesh, v)) / area;

    let laplacian = cotangent_laplacian(mesh, v) / area;
    // The Laplacian points into the surface on convex regions.
    let sign = if laplacian.dot(&mesh.vertex_normal(v)) <= 0.0 {
        1.0
    } else {
        -1.0
    };
    let h = sign * laplacian.norm() / 2.0;

    let discriminant = h * h - k;
    let (k1, k2) = if discriminant >= 0.0 {
        let s = discriminant.sqrt();
        (h + s, h - s)
    } else {
        (h, h)
    };

    [k, h, k1, k2]
}

/// Gaussian, mean and principal curvature for every vertex slot, computed in
/// parallel.
///
/// # Example
///
/// ```
/// use mcflow::prelude::*;
/// use mcflow::algo::curvature::compute_curvature;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
///     Point3::new(0.5, 0.5, 1.0),
/// ];
/// let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
///
/// let result = compute_curvature(&mesh);
/// for v in mesh.vertex_ids() {
///     let (k1, k2) = result.principal(v);
///     assert!(k1 >= k2);
/// }
/// ```
pub fn compute_curvature<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> CurvatureResult<I> {
    compute_curvature_impl(mesh, true)
}

/// Single-threaded [`compute_curvature`].
pub fn compute_curvature_sequential<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> CurvatureResult<I> {
    compute_curvature_impl(mesh, false)
}

fn compute_curvature_impl<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, parallel: bool) -> CurvatureResult<I> {
    let n = mesh.num_vertices();
    let per_vertex = |i: usize| meyer_vertex(mesh, VertexId::new(i));

    let rows: Vec<[f64; 4]> = if parallel {
        (0..n).into_par_iter().map(per_vertex).collect()
    } else {
        (0..n).map(per_vertex).collect()
    };

    let mut result = CurvatureResult {
        gaussian: Vec::with_capacity(n),
        mean: Vec::with_capacity(n),
        principal_max: Vec::with_capacity(n),
        principal_min: Vec::with_capacity(n),
        _marker: PhantomData,
    };
    for [k, h, k1, k2] in rows {
        result.gaussian.push(k);
        result.mean.push(h);
        result.principal_max.push(k1);
        result.principal_min.push(k2);
    }
    result
}

// ============================================================================
// Quadric fitting
// ============================================================================

/// Principal curvatures and directions for every vertex slot.
#[derive(Debug, Clone)]
pub struct PrincipalFrames<I: MeshIndex = u32> {
    k1: Vec<f64>,
    k2: Vec<f64>,
    d1: Vec<Vector3<f64>>,
    d2: Vec<Vector3<f64>>,
    _marker: PhantomData<I>,
}

impl<I: MeshIndex> PrincipalFrames<I> {
    /// `(k1, k2)` with `k1 >= k2`.
    #[inline]
    pub fn principal(&self, v: VertexId<I>) -> (f64, f64) {
        (self.k1[v.index()], self.k2[v.index()])
    }

    /// Mean curvature `(k1 + k2) / 2`.
    #[inline]
    pub fn mean(&self, v: VertexId<I>) -> f64 {
        0.5 * (self.k1[v.index()] + self.k2[v.index()])
    }

    /// Unit directions of `k1` and `k2`.
    #[inline]
    pub fn directions(&self, v: VertexId<I>) -> (Vector3<f64>, Vector3<f64>) {
        (self.d1[v.index()], self.d2[v.index()])
    }

    /// Number of vertices covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.k1.len()
    }

    /// Whether the result covers no vertex.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.k1.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    k1: f64,
    k2: f64,
    d1: Vector3<f64>,
    d2: Vector3<f64>,
}

/// Orthonormal tangent basis for a unit normal; arbitrary but deterministic.
fn tangent_basis(n: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let axis = if n.x.abs() <= n.y.abs() && n.x.abs() <= n.z.abs() {
        Vector3::x()
    } else if n.y.abs() <= n.z.abs() {
        Vector3::y()
    } else {
        Vector3::z()
    };
    let t1 = n.cross(&axis).normalize();
    let t2 = n.cross(&t1);
    (t1, t2)
}

/// One-ring of `v`, widened to the two-ring when the one-ring is too small
/// to determine a quadric.
fn fitting_neighborhood<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> Vec<VertexId<I>> {
    let ring: Vec<VertexId<I>> = mesh.vertex_neighbors(v).collect();
    if ring.len() >= MIN_FIT_NEIGHBORS {
        return ring;
    }

    let mut seen: HashSet<VertexId<I>> = ring.iter().copied().collect();
    seen.insert(v);
    let mut wide = ring.clone();
    for &r in &ring {
        for w in mesh.vertex_neighbors(r) {
            if seen.insert(w) {
                wide.push(w);
            }
        }
    }
    wide
}

fn fit_vertex<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> Frame {
    let n = mesh.vertex_normal(v);
    if n.norm_squared() < 0.5 || mesh.is_deleted(v) {
        return Frame {
            k1: 0.0,
            k2: 0.0,
            d1: Vector3::zeros(),
            d2: Vector3::zeros(),
        };
    }
    let (t1, t2) = tangent_basis(&n);
    let flat = Frame {
        k1: 0.0,
        k2: 0.0,
        d1: t1,
        d2: t2,
    };

    let neighborhood = fitting_neighborhood(mesh, v);
    if neighborhood.len() < MIN_FIT_NEIGHBORS {
        return flat;
    }

    // Normal equations of the least-squares height-field fit.
    let p = mesh.position(v);
    let mut ata = Matrix5::<f64>::zeros();
    let mut atb = Vector5::<f64>::zeros();
    for w in neighborhood {
        let d = mesh.position(w) - p;
        let (x, y, z) = (d.dot(&t1), d.dot(&t2), d.dot(&n));
        let row = Vector5::new(x * x, x * y, y * y, x, y);
        ata += row * row.transpose();
        atb += row * z;
    }

    let coeffs = match ata.lu().solve(&atb) {
        Some(c) if c.iter().all(|c| c.is_finite()) => c,
        _ => return flat,
    };
    let (a, b, c, dx, dy) = (coeffs[0], coeffs[1], coeffs[2], coeffs[3], coeffs[4]);

    // Fundamental forms of the fitted surface at the origin.
    let w = (1.0 + dx * dx + dy * dy).sqrt();
    let first = Matrix2::new(1.0 + dx * dx, dx * dy, dx * dy, 1.0 + dy * dy);
    let second = Matrix2::new(2.0 * a, b, b, 2.0 * c) / w;
    let weingarten = match first.try_inverse() {
        Some(inv) => inv * second,
        None => return flat,
    };

    // Eigenvalues of the 2x2 shape operator, largest first.
    let half_trace = 0.5 * weingarten.trace();
    let det = weingarten.determinant();
    let disc = (half_trace * half_trace - det).max(0.0).sqrt();
    let (lambda_hi, lambda_lo) = (half_trace + disc, half_trace - disc);

    // Height grows along +n where the surface curves towards the normal, so
    // the convex-positive curvatures are the negated eigenvalues.
    let (k1, k2) = (-lambda_lo, -lambda_hi);

    let dir_param = eigenvector(&weingarten, lambda_lo);
    let d1 = match dir_param {
        Some(e) => {
            let t = e.x * t1 + e.y * t2;
            t.normalize()
        }
        None => t1,
    };
    let d2 = n.cross(&d1);

    Frame { k1, k2, d1, d2 }
}

/// Unit eigenvector of a 2x2 matrix for `lambda`, or `None` at umbilics.
fn eigenvector(m: &Matrix2<f64>, lambda: f64) -> Option<Vector2<f64>> {
    let candidates = [
        Vector2::new(m[(0, 1)], lambda - m[(0, 0)]),
        Vector2::new(lambda - m[(1, 1)], m[(1, 0)]),
    ];
    let best = if candidates[0].norm_squared() >= candidates[1].norm_squared() {
        candidates[0]
    } else {
        candidates[1]
    };
    let len = best.norm();
    (len > 1e-12).then(|| best / len)
}

/// Principal curvatures and directions by local quadric fitting, computed in
/// parallel.
///
/// Vertices that cannot be fitted (isolated, deleted, fewer than five
/// neighbours in their two-ring, or a singular system) get zero curvature.
pub fn fit_curvature<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> PrincipalFrames<I> {
    fit_curvature_impl(mesh, true)
}

/// Single-threaded [`fit_curvature`].
pub fn fit_curvature_sequential<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> PrincipalFrames<I> {
    fit_curvature_impl(mesh, false)
}

fn fit_curvature_impl<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, parallel: bool) -> PrincipalFrames<I> {
    let n = mesh.num_vertices();
    let per_vertex = |i: usize| fit_vertex(mesh, VertexId::new(i));

    let frames: Vec<Frame> = if parallel {
        (0..n).into_par_iter().map(per_vertex).collect()
    } else {
        (0..n).map(per_vertex).collect()
    };

    PrincipalFrames {
        k1: frames.iter().map(|f| f.k1).collect(),
        k2: frames.iter().map(|f| f.k2).collect(),
        d1: frames.iter().map(|f| f.d1).collect(),
        d2: frames.iter().map(|f| f.d2).collect(),
        _marker: PhantomData,
    }
}

// ============================================================================
// Storing into the mesh
// ============================================================================

/// Enable the normal, curvature and curvature-direction layers and fill them.
///
/// Normals are refreshed first; both estimators then read the current
/// positions. With [`CurvatureMethod::Meyer`] the direction layer receives the
/// tangent frame of each vertex normal.
pub fn update_curvature<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>, method: CurvatureMethod) {
    update_curvature_impl(mesh, method, true);
}

/// Single-threaded [`update_curvature`].
pub fn update_curvature_sequential<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>, method: CurvatureMethod) {
    update_curvature_impl(mesh, method, false);
}

pub(crate) fn update_curvature_impl<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    method: CurvatureMethod,
    parallel: bool,
) {
    mesh.enable_attributes(AttributeMask::CURVATURE_FLOW);
    mesh.update_vertex_normals();

    let n = mesh.num_vertices();
    let (values, dirs): (Vec<[f64; 2]>, Vec<[Vector3<f64>; 2]>) = match method {
        CurvatureMethod::QuadricFit => {
            let frames = fit_curvature_impl(mesh, parallel);
            (0..n)
                .map(|i| {
                    let v = VertexId::new(i);
                    let (k1, k2) = frames.principal(v);
                    let (d1, d2) = frames.directions(v);
                    ([k1, k2], [d1, d2])
                })
                .unzip()
        }
        CurvatureMethod::Meyer => {
            let result = compute_curvature_impl(mesh, parallel);
            (0..n)
                .map(|i| {
                    let v = VertexId::new(i);
                    let (k1, k2) = result.principal(v);
                    let normal = mesh.vertex_normal(v);
                    let dirs = if normal.norm_squared() > 0.5 {
                        let (t1, t2) = tangent_basis(&normal);
                        [t1, t2]
                    } else {
                        [Vector3::zeros(); 2]
                    };
                    ([k1, k2], dirs)
                })
                .unzip()
        }
    };

    mesh.attributes.curvature = Some(values);
    mesh.attributes.directions = Some(dirs);

    log::debug!("estimated curvature on {} vertices with {:?}", n, method);
}
