//! Mesh cleaning passes.
//!
//! Cleaning is split in two steps. [`remove_unreferenced_vertices`] only flags
//! vertices as deleted, which keeps every handle stable. [`compact_vertices`]
//! then reclaims the flagged slots and renumbers the survivors, after which the
//! vertex storage size equals the live vertex count.
//!
//! ```
//! use mcflow::mesh::{build_from_triangles, compact_vertices, remove_unreferenced_vertices, HalfEdgeMesh};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(7.0, 7.0, 7.0), // not used by any face
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 2, 3]]).unwrap();
//!
//! assert_eq!(remove_unreferenced_vertices(&mut mesh), 1);
//! assert_eq!(compact_vertices(&mut mesh), 1);
//! assert_eq!(mesh.num_vertices(), 3);
//! ```

use super::halfedge::HalfEdgeMesh;
use super::index::{MeshIndex, VertexId};

/// Flag every live vertex that no face references as deleted.
///
/// Returns the number of vertices flagged by this call.
pub fn remove_unreferenced_vertices<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) -> usize {
    let mut removed = 0;
    for v in mesh.vertices.iter_mut() {
        if !v.deleted && !v.halfedge.is_valid() {
            v.deleted = true;
            removed += 1;
        }
    }
    if removed > 0 {
        mesh.mark_bounding_box_stale();
    }
    removed
}

/// Reclaim the storage of deleted vertices.
///
/// Survivors keep their relative order. Half-edge origins and every enabled
/// attribute layer are remapped. Returns the number of slots reclaimed.
///
/// # Panics
///
/// Panics if a half-edge still originates at a deleted vertex. Only isolated
/// vertices can be flagged through the public API, so this indicates corrupted
/// connectivity.
pub fn compact_vertices<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) -> usize {
    let keep: Vec<bool> = mesh.vertices.iter().map(|v| !v.deleted).collect();
    let reclaimed = keep.iter().filter(|&&k| !k).count();
    if reclaimed == 0 {
        return 0;
    }

    let mut remap: Vec<VertexId<I>> = Vec::with_capacity(keep.len());
    let mut next = 0usize;
    for &k in &keep {
        if k {
            remap.push(VertexId::new(next));
            next += 1;
        } else {
            remap.push(VertexId::invalid());
        }
    }

    for he in mesh.halfedges.iter_mut() {
        let mapped = remap[he.origin.index()];
        assert!(mapped.is_valid(), "half-edge originates at a deleted vertex");
        he.origin = mapped;
    }

    mesh.vertices.retain(|v| !v.deleted);
    mesh.attributes.retain(&keep);

    log::debug!(
        "compacted vertex storage: {} slots reclaimed, {} remain",
        reclaimed,
        mesh.vertices.len()
    );
    reclaimed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_triangles, AttributeMask};
    use nalgebra::Point3;

    fn tetrahedron_with_strays() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(-5.0, 0.0, 0.0), // stray
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(9.0, 9.0, 9.0), // stray
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[1, 3, 2], [1, 2, 5], [2, 3, 5], [3, 1, 5]];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_remove_only_flags() {
        let mut mesh = tetrahedron_with_strays();
        assert_eq!(remove_unreferenced_vertices(&mut mesh), 2);
        assert_eq!(mesh.num_vertices(), 6);
        assert_eq!(mesh.num_live_vertices(), 4);
        assert!(mesh.is_deleted(VertexId::new(0)));
        assert!(mesh.is_deleted(VertexId::new(4)));

        // Running again finds nothing new.
        assert_eq!(remove_unreferenced_vertices(&mut mesh), 0);
    }

    #[test]
    fn test_compact_remaps_topology() {
        let mut mesh = tetrahedron_with_strays();
        let before: Vec<[Point3<f64>; 3]> =
            mesh.face_ids().map(|f| mesh.face_positions(f)).collect();

        remove_unreferenced_vertices(&mut mesh);
        assert_eq!(compact_vertices(&mut mesh), 2);

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_live_vertices(), 4);
        assert!(mesh.is_valid());
        assert!(mesh.is_closed());

        let after: Vec<[Point3<f64>; 3]> =
            mesh.face_ids().map(|f| mesh.face_positions(f)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_compact_shrinks_attribute_layers() {
        let mut mesh = tetrahedron_with_strays();
        mesh.enable_attributes(AttributeMask::CURVATURE);
        mesh.set_principal_curvatures(VertexId::new(5), 3.0, 1.0).unwrap();

        remove_unreferenced_vertices(&mut mesh);
        compact_vertices(&mut mesh);

        assert_eq!(mesh.curvatures().unwrap().len(), 4);
        // Old slot 5 is the last survivor.
        assert_eq!(mesh.principal_curvatures(VertexId::new(3)).unwrap(), (3.0, 1.0));
    }

    #[test]
    fn test_compact_without_deletions_is_noop() {
        let mut mesh = tetrahedron_with_strays();
        assert_eq!(compact_vertices(&mut mesh), 0);
        assert_eq!(mesh.num_vertices(), 6);
    }
}
