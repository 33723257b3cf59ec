//! Building half-edge meshes from indexed triangle lists, and back.

use std::collections::HashMap;

use nalgebra::Point3;

use super::halfedge::{Face, HalfEdge, HalfEdgeMesh};
use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// Build a half-edge mesh from positions and consistently wound triangles.
///
/// Vertices that no triangle references are kept as isolated vertices; run
/// [`super::clean::remove_unreferenced_vertices`] to get rid of them.
///
/// # Errors
///
/// * [`MeshError::EmptyMesh`] if `faces` is empty
/// * [`MeshError::InvalidVertexIndex`] for an out-of-range corner
/// * [`MeshError::DegenerateFace`] for a triangle repeating a corner
/// * [`MeshError::NonManifoldEdge`] when two triangles share a directed edge
/// * [`MeshError::NonManifoldVertex`] when a vertex joins two separate
///   triangle fans (a bowtie)
///
/// # Example
/// ```
/// use mcflow::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.boundary_edge_count(), 3);
/// ```
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh<I>> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        if let Some(&vi) = face.iter().find(|&&vi| vi >= vertices.len()) {
            return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
        }
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            return Err(MeshError::DegenerateFace { face: fi });
        }
    }

    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), faces.len());
    let vertex_ids: Vec<VertexId<I>> = vertices.iter().map(|&p| mesh.add_vertex(p)).collect();

    // Directed edge (from, to) -> interior half-edge.
    let mut edge_map: HashMap<(usize, usize), HalfEdgeId<I>> =
        HashMap::with_capacity(faces.len() * 3);

    for face in faces {
        let face_id = FaceId::<I>::new(mesh.num_faces());
        let base = mesh.num_halfedges();
        let ids: [HalfEdgeId<I>; 3] = [
            HalfEdgeId::new(base),
            HalfEdgeId::new(base + 1),
            HalfEdgeId::new(base + 2),
        ];
        mesh.faces.push(Face::new(ids[0]));

        for corner in 0..3 {
            let from = face[corner];
            let to = face[(corner + 1) % 3];
            if edge_map.insert((from, to), ids[corner]).is_some() {
                return Err(MeshError::NonManifoldEdge { v0: from, v1: to });
            }

            mesh.halfedges.push(HalfEdge {
                origin: vertex_ids[from],
                twin: HalfEdgeId::invalid(),
                next: ids[(corner + 1) % 3],
                prev: ids[(corner + 2) % 3],
                face: face_id,
            });
            mesh.vertex_mut(vertex_ids[from]).halfedge = ids[corner];
        }
    }

    // Pair twins; unmatched edges get a face-less boundary half-edge.
    // Sorting keeps half-edge numbering independent of hash order.
    let mut directed: Vec<((usize, usize), HalfEdgeId<I>)> =
        edge_map.iter().map(|(&k, &he)| (k, he)).collect();
    directed.sort_unstable_by_key(|&(k, _)| k);

    for ((from, to), he) in directed {
        if let Some(&twin) = edge_map.get(&(to, from)) {
            mesh.halfedge_mut(he).twin = twin;
        } else {
            let boundary = HalfEdgeId::<I>::new(mesh.num_halfedges());
            mesh.halfedges.push(HalfEdge {
                origin: vertex_ids[to],
                twin: he,
                ..HalfEdge::new()
            });
            mesh.halfedge_mut(he).twin = boundary;
        }
    }

    link_boundary_loops(&mut mesh)?;
    anchor_boundary_vertices(&mut mesh);

    Ok(mesh)
}

/// Chain boundary half-edges into loops through `next`/`prev`.
///
/// A manifold vertex has at most one outgoing boundary half-edge; a second
/// one means several fans meet at the vertex.
fn link_boundary_loops<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) -> Result<()> {
    let boundary: Vec<HalfEdgeId<I>> = mesh
        .halfedge_ids()
        .filter(|&he| mesh.is_boundary_halfedge(he))
        .collect();

    let mut outgoing: HashMap<usize, HalfEdgeId<I>> = HashMap::with_capacity(boundary.len());
    for &he in &boundary {
        let origin = mesh.origin(he).index();
        if outgoing.insert(origin, he).is_some() {
            return Err(MeshError::NonManifoldVertex { vertex: origin });
        }
    }

    for &he in &boundary {
        let dest = mesh.dest(he).index();
        if let Some(&next) = outgoing.get(&dest) {
            mesh.halfedge_mut(he).next = next;
            mesh.halfedge_mut(next).prev = he;
        }
    }
    Ok(())
}

/// Point boundary vertices at their outgoing boundary half-edge so that
/// one-ring walks start at the gap.
fn anchor_boundary_vertices<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) {
    for i in 0..mesh.halfedges.len() {
        let he = &mesh.halfedges[i];
        if he.is_boundary() {
            let origin = he.origin;
            mesh.vertex_mut(origin).halfedge = HalfEdgeId::new(i);
        }
    }
}

/// Export positions (one per vertex slot) and triangles.
pub fn to_face_vertex<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let vertices: Vec<Point3<f64>> = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();

    let faces: Vec<[usize; 3]> = mesh
        .face_ids()
        .map(|f| mesh.face_triangle(f).map(|v| v.index()))
        .collect();

    (vertices, faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetrahedron() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        (vertices, faces)
    }

    #[test]
    fn test_single_triangle() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();

        // 3 interior + 3 boundary half-edges
        assert_eq!(mesh.num_halfedges(), 6);
        assert!(mesh.is_valid());
        for v in mesh.vertex_ids() {
            assert!(mesh.is_boundary_vertex(v));
            assert_eq!(mesh.vertex_neighbors(v).count(), 2);
        }
    }

    #[test]
    fn test_tetrahedron_is_closed() {
        let (vertices, faces) = tetrahedron();
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_halfedges(), 12);
        assert!(mesh.is_valid());
        assert!(mesh.is_closed());
        for v in mesh.vertex_ids() {
            assert!(!mesh.is_boundary_vertex(v));
            assert_eq!(mesh.vertex_faces(v).count(), 3);
        }
        for f in mesh.face_ids() {
            assert_eq!(mesh.face_neighbors(f).count(), 3);
        }
    }

    #[test]
    fn test_unreferenced_vertex_stays_isolated() {
        let (mut vertices, faces) = tetrahedron();
        vertices.push(Point3::new(9.0, 9.0, 9.0));
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 5);
        assert!(mesh.is_isolated(VertexId::new(4)));
        assert!(mesh.is_closed());
    }

    #[test]
    fn test_roundtrip() {
        let (vertices, faces) = tetrahedron();
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
        let (out_verts, out_faces) = to_face_vertex(&mesh);

        assert_eq!(out_verts, vertices);
        assert_eq!(out_faces, faces);
    }

    #[test]
    fn test_rejects_bad_input() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];

        let r: Result<HalfEdgeMesh> = build_from_triangles(&vertices, &[]);
        assert!(matches!(r, Err(MeshError::EmptyMesh)));

        let r: Result<HalfEdgeMesh> = build_from_triangles(&vertices, &[[0, 1, 7]]);
        assert!(matches!(r, Err(MeshError::InvalidVertexIndex { face: 0, vertex: 7 })));

        let r: Result<HalfEdgeMesh> = build_from_triangles(&vertices, &[[0, 0, 2]]);
        assert!(matches!(r, Err(MeshError::DegenerateFace { face: 0 })));

        let r: Result<HalfEdgeMesh> = build_from_triangles(&vertices, &[[0, 1, 2], [0, 1, 2]]);
        assert!(matches!(r, Err(MeshError::NonManifoldEdge { .. })));
    }

    #[test]
    fn test_rejects_bowtie_vertex() {
        // Two triangles touching only at vertex 0.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(-1.0, -1.0, 0.0),
        ];

        let r: Result<HalfEdgeMesh> = build_from_triangles(&vertices, &[[0, 1, 2], [0, 3, 4]]);
        assert!(matches!(r, Err(MeshError::NonManifoldVertex { vertex: 0 })));

        // The same corner shared by one fan is fine.
        let r: Result<HalfEdgeMesh> = build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]);
        assert!(r.unwrap().is_valid());
    }
}
