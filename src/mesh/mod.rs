//! Core mesh data structures.
//!
//! [`HalfEdgeMesh`] stores a triangle mesh as a half-edge structure. Vertex-face
//! and face-face adjacency are read straight off the connectivity.
//!
//! On top of the connectivity the mesh carries:
//!
//! - optional per-vertex attribute layers (normals, principal curvatures,
//!   principal directions), toggled with an [`AttributeMask`];
//! - a deleted flag per vertex, driven by the [`clean`] passes;
//! - a cached [`Aabb`] that goes stale when positions change and is refreshed
//!   with [`HalfEdgeMesh::update_bounding_box`].
//!
//! Elements are addressed through typed handles ([`VertexId`], [`HalfEdgeId`],
//! [`FaceId`]) that are generic over the storage integer ([`MeshIndex`]).
//!
//! # Construction
//!
//! ```
//! use mcflow::mesh::{HalfEdgeMesh, build_from_triangles};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert!(!mesh.is_closed());
//! ```

mod attributes;
mod bounds;
mod builder;
pub mod clean;
mod halfedge;
mod index;

pub use attributes::AttributeMask;
pub use bounds::Aabb;
pub use builder::{build_from_triangles, to_face_vertex};
pub use clean::{compact_vertices, remove_unreferenced_vertices};
pub use halfedge::{Face, HalfEdge, HalfEdgeMesh, Vertex, VertexHalfEdgeIter};
pub use index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
