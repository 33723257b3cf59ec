//! Half-edge mesh storage and traversal.
//!
//! Each undirected edge is stored as two opposite half-edges. A half-edge
//! knows its origin, twin, the next and previous half-edge around its face,
//! and the face itself. Half-edges on the border of an open surface carry a
//! null face; their `next`/`prev` links walk the boundary loop.
//!
//! Vertex-face and face-face adjacency are derived from this connectivity on
//! demand, so they are always available and never go stale.
//!
//! Besides connectivity the mesh carries optional per-vertex attribute layers
//! (see [`super::attributes`]), a deleted flag per vertex used by the cleaning
//! passes, and a cached bounding box.

use nalgebra::{Point3, Vector3};

use super::attributes::VertexAttributes;
use super::bounds::Aabb;
use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};

/// A vertex in the half-edge mesh.
#[derive(Debug, Clone)]
pub struct Vertex<I: MeshIndex = u32> {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// One outgoing half-edge. Boundary vertices point at a boundary
    /// half-edge; isolated vertices hold the null handle.
    pub halfedge: HalfEdgeId<I>,

    /// Set by [`super::clean::remove_unreferenced_vertices`]; the slot is
    /// reclaimed by [`super::clean::compact_vertices`].
    pub deleted: bool,
}

impl<I: MeshIndex> Vertex<I> {
    /// A live, isolated vertex at `position`.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            halfedge: HalfEdgeId::invalid(),
            deleted: false,
        }
    }
}

/// A half-edge in the mesh.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge<I: MeshIndex = u32> {
    /// Vertex the half-edge leaves from.
    pub origin: VertexId<I>,
    /// Opposite half-edge.
    pub twin: HalfEdgeId<I>,
    /// Next half-edge around the face (or boundary loop).
    pub next: HalfEdgeId<I>,
    /// Previous half-edge around the face (or boundary loop).
    pub prev: HalfEdgeId<I>,
    /// Incident face; null on the boundary.
    pub face: FaceId<I>,
}

impl<I: MeshIndex> HalfEdge<I> {
    /// A half-edge with every link null.
    pub fn new() -> Self {
        Self {
            origin: VertexId::invalid(),
            twin: HalfEdgeId::invalid(),
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            face: FaceId::invalid(),
        }
    }

    /// Boundary half-edges have no face.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.face.is_valid()
    }
}

impl<I: MeshIndex> Default for HalfEdge<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// A triangular face.
#[derive(Debug, Clone, Copy)]
pub struct Face<I: MeshIndex = u32> {
    /// One of the three half-edges bounding the face.
    pub halfedge: HalfEdgeId<I>,
}

impl<I: MeshIndex> Face<I> {
    /// A face anchored at `halfedge`.
    pub fn new(halfedge: HalfEdgeId<I>) -> Self {
        Self { halfedge }
    }
}

/// Triangle mesh in half-edge form.
#[derive(Debug, Clone)]
pub struct HalfEdgeMesh<I: MeshIndex = u32> {
    pub(crate) vertices: Vec<Vertex<I>>,
    pub(crate) halfedges: Vec<HalfEdge<I>>,
    pub(crate) faces: Vec<Face<I>>,
    pub(crate) attributes: VertexAttributes,
    bbox: Option<Aabb>,
    bbox_stale: bool,
}

impl<I: MeshIndex> Default for HalfEdgeMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// An empty mesh: no vertices, no faces, no bounding box.
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// An empty mesh with room for the given element counts.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        // Three half-edges per face plus some slack for boundary half-edges.
        let num_halfedges = num_faces * 3 + num_faces / 2;

        Self {
            vertices: Vec::with_capacity(num_vertices),
            halfedges: Vec::with_capacity(num_halfedges),
            faces: Vec::with_capacity(num_faces),
            attributes: VertexAttributes::default(),
            bbox: None,
            bbox_stale: false,
        }
    }

    // ==================== Counts ====================

    /// Number of vertex slots, deleted ones included.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of vertices not flagged as deleted.
    pub fn num_live_vertices(&self) -> usize {
        self.vertices.iter().filter(|v| !v.deleted).count()
    }

    /// Number of half-edges, boundary half-edges included.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    /// Number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    // ==================== Element access ====================

    /// Vertex record for `id`.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex<I> {
        &self.vertices[id.index()]
    }

    #[inline]
    pub(crate) fn vertex_mut(&mut self, id: VertexId<I>) -> &mut Vertex<I> {
        &mut self.vertices[id.index()]
    }

    /// Half-edge record for `id`.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId<I>) -> &HalfEdge<I> {
        &self.halfedges[id.index()]
    }

    #[inline]
    pub(crate) fn halfedge_mut(&mut self, id: HalfEdgeId<I>) -> &mut HalfEdge<I> {
        &mut self.halfedges[id.index()]
    }

    /// Face record for `id`.
    #[inline]
    pub fn face(&self, id: FaceId<I>) -> &Face<I> {
        &self.faces[id.index()]
    }

    /// Position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Move a vertex. The cached bounding box becomes stale.
    #[inline]
    pub fn set_position(&mut self, v: VertexId<I>, pos: Point3<f64>) {
        self.vertex_mut(v).position = pos;
        self.bbox_stale = true;
    }

    /// Whether the vertex was flagged by a cleaning pass.
    #[inline]
    pub fn is_deleted(&self, v: VertexId<I>) -> bool {
        self.vertex(v).deleted
    }

    /// Whether no face references the vertex.
    #[inline]
    pub fn is_isolated(&self, v: VertexId<I>) -> bool {
        !self.vertex(v).halfedge.is_valid()
    }

    // ==================== Topology ====================

    /// Opposite half-edge.
    #[inline]
    pub fn twin(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).twin
    }

    /// Next half-edge around the face.
    #[inline]
    pub fn next(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).next
    }

    /// Previous half-edge around the face.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).prev
    }

    /// Vertex a half-edge leaves from.
    #[inline]
    pub fn origin(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.halfedge(he).origin
    }

    /// Vertex a half-edge points to.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.origin(self.twin(he))
    }

    /// Face of a half-edge (null on the boundary).
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId<I>) -> FaceId<I> {
        self.halfedge(he).face
    }

    /// Whether a half-edge lies on the boundary.
    #[inline]
    pub fn is_boundary_halfedge(&self, he: HalfEdgeId<I>) -> bool {
        self.halfedge(he).is_boundary()
    }

    /// Whether a vertex touches the boundary. Isolated vertices count as
    /// boundary.
    pub fn is_boundary_vertex(&self, v: VertexId<I>) -> bool {
        if self.is_isolated(v) {
            return true;
        }
        self.vertex_halfedges(v)
            .any(|he| self.is_boundary_halfedge(he))
    }

    /// Number of boundary edges. Every boundary edge owns exactly one
    /// face-less half-edge.
    pub fn boundary_edge_count(&self) -> usize {
        self.halfedges.iter().filter(|he| he.is_boundary()).count()
    }

    /// Whether the surface has no boundary edges (watertight).
    pub fn is_closed(&self) -> bool {
        self.boundary_edge_count() == 0
    }

    // ==================== Iteration ====================

    /// All vertex slots, deleted ones included.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// Vertices not flagged as deleted.
    pub fn live_vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.deleted)
            .map(|(i, _)| VertexId::new(i))
    }

    /// All half-edge ids.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        (0..self.halfedges.len()).map(HalfEdgeId::new)
    }

    /// All face ids.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Outgoing half-edges around a vertex.
    pub fn vertex_halfedges(&self, v: VertexId<I>) -> VertexHalfEdgeIter<'_, I> {
        VertexHalfEdgeIter::new(self, v)
    }

    /// One-ring neighbours of a vertex.
    pub fn vertex_neighbors(&self, v: VertexId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertex_halfedges(v).map(|he| self.dest(he))
    }

    /// Faces incident to a vertex (vertex-face adjacency).
    pub fn vertex_faces(&self, v: VertexId<I>) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.vertex_halfedges(v)
            .map(|he| self.face_of(he))
            .filter(|f| f.is_valid())
    }

    /// Half-edges bounding a face.
    pub fn face_halfedges(&self, f: FaceId<I>) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        let he0 = self.face(f).halfedge;
        let he1 = self.next(he0);
        let he2 = self.next(he1);
        [he0, he1, he2].into_iter()
    }

    /// Faces sharing an edge with `f` (face-face adjacency). Boundary edges
    /// contribute nothing.
    pub fn face_neighbors(&self, f: FaceId<I>) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.face_halfedges(f)
            .map(|he| self.face_of(self.twin(he)))
            .filter(|g| g.is_valid())
    }

    /// The three corners of a face, in winding order.
    pub fn face_triangle(&self, f: FaceId<I>) -> [VertexId<I>; 3] {
        let he0 = self.face(f).halfedge;
        let he1 = self.next(he0);
        let he2 = self.next(he1);
        [self.origin(he0), self.origin(he1), self.origin(he2)]
    }

    /// Corner positions of a face.
    pub fn face_positions(&self, f: FaceId<I>) -> [Point3<f64>; 3] {
        let [v0, v1, v2] = self.face_triangle(f);
        [*self.position(v0), *self.position(v1), *self.position(v2)]
    }

    // ==================== Geometry ====================

    /// Unit normal of a face, following its winding.
    pub fn face_normal(&self, f: FaceId<I>) -> Vector3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        (p1 - p0).cross(&(p2 - p0)).normalize()
    }

    /// Area of a face.
    pub fn face_area(&self, f: FaceId<I>) -> f64 {
        let [p0, p1, p2] = self.face_positions(f);
        0.5 * (p1 - p0).cross(&(p2 - p0)).norm()
    }

    /// Area-weighted vertex normal. Zero for isolated vertices and vertices
    /// whose incident faces cancel out.
    pub fn vertex_normal(&self, v: VertexId<I>) -> Vector3<f64> {
        let mut normal = Vector3::zeros();
        for f in self.vertex_faces(v) {
            let [p0, p1, p2] = self.face_positions(f);
            normal += (p1 - p0).cross(&(p2 - p0));
        }
        let len = normal.norm();
        if len > 1e-12 {
            normal / len
        } else {
            Vector3::zeros()
        }
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    /// Mean edge length over all edges.
    pub fn average_edge_length(&self) -> f64 {
        let mut total = 0.0;
        let mut count = 0usize;
        for (i, he) in self.halfedges.iter().enumerate() {
            // Visit each edge once, through its lower-numbered half-edge.
            if he.twin.index() < i {
                continue;
            }
            let p0 = self.position(he.origin);
            let p1 = self.position(self.origin(he.twin));
            total += (p1 - p0).norm();
            count += 1;
        }
        if count == 0 {
            0.0
        } else {
            total / count as f64
        }
    }

    // ==================== Bounding box ====================

    /// The cached bounding box. May be stale after vertices moved; see
    /// [`Self::is_bounding_box_stale`].
    #[inline]
    pub fn bounding_box(&self) -> Option<Aabb> {
        self.bbox
    }

    /// Whether positions changed since the last [`Self::update_bounding_box`].
    #[inline]
    pub fn is_bounding_box_stale(&self) -> bool {
        self.bbox_stale
    }

    /// Recompute the cached bounding box over the live vertices.
    pub fn update_bounding_box(&mut self) -> Option<Aabb> {
        self.bbox = Aabb::from_points(
            self.vertices
                .iter()
                .filter(|v| !v.deleted)
                .map(|v| &v.position),
        );
        self.bbox_stale = false;
        self.bbox
    }

    pub(crate) fn mark_bounding_box_stale(&mut self) {
        self.bbox_stale = true;
    }

    // ==================== Construction ====================

    /// Append an isolated vertex. Enabled attribute layers grow with it.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId<I> {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Vertex::new(position));
        self.attributes.push_default();
        self.bbox_stale = true;
        id
    }

    // ==================== Validation ====================

    /// Check that every stored link is mutually consistent.
    pub fn is_valid(&self) -> bool {
        for (i, v) in self.vertices.iter().enumerate() {
            if v.halfedge.is_valid() && self.halfedge(v.halfedge).origin.index() != i {
                return false;
            }
        }

        for (i, he) in self.halfedges.iter().enumerate() {
            if !he.origin.is_valid() || he.origin.index() >= self.vertices.len() {
                return false;
            }
            if he.twin.is_valid() && self.halfedge(he.twin).twin.index() != i {
                return false;
            }
            if he.next.is_valid() && self.halfedge(he.next).prev.index() != i {
                return false;
            }
            if he.prev.is_valid() && self.halfedge(he.prev).next.index() != i {
                return false;
            }
        }

        self.faces.iter().all(|f| f.halfedge.is_valid())
            && self.attributes.len_matches(self.vertices.len())
    }
}

/// Iterator over the outgoing half-edges of a vertex.
pub struct VertexHalfEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex> VertexHalfEdgeIter<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, v: VertexId<I>) -> Self {
        let start = mesh.vertex(v).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for VertexHalfEdgeIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;

        // twin(v -> w) is (w -> v); the half-edge after it leaves v again.
        let advanced = self.mesh.next(self.mesh.twin(self.current));
        if !advanced.is_valid() || advanced == self.start {
            self.done = true;
        } else {
            self.current = advanced;
        }

        Some(result)
    }
}
