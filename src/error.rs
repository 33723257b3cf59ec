//! Error types for mcflow.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side
//! is [`MeshError`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur while building, preparing or flowing a mesh.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The face list was empty.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an out-of-range vertex.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face repeats a vertex.
    #[error("face {face} is degenerate (has duplicate vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// Two faces traverse the same directed edge (inconsistent winding or a
    /// non-manifold edge).
    #[error("edge ({v0}, {v1}) is used twice in the same direction")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// Several triangle fans meet at one vertex (a bowtie).
    #[error("vertex {vertex} is non-manifold (more than one boundary fan)")]
    NonManifoldVertex {
        /// The vertex index.
        vertex: usize,
    },

    /// A per-vertex attribute layer the operation reads is not enabled.
    #[error("vertex attribute `{attribute}` is not enabled on this mesh")]
    MissingAttribute {
        /// Name of the missing layer.
        attribute: &'static str,
    },

    /// The mesh has boundary edges but the operation requires a closed surface.
    #[error("mesh is not closed: {boundary_edges} boundary edges")]
    OpenMesh {
        /// Number of boundary edges found.
        boundary_edges: usize,
    },

    /// A parameter lookup named a parameter that was never declared.
    #[error("parameter `{name}` is not declared")]
    ParameterMissing {
        /// The requested parameter name.
        name: String,
    },

    /// A parameter exists but holds a value of another type.
    #[error("parameter `{name}` is a {found}, expected {expected}")]
    ParameterType {
        /// The parameter name.
        name: String,
        /// The type the caller asked for.
        expected: &'static str,
        /// The type actually stored.
        found: &'static str,
    },

    /// A filter with the same id is already registered.
    #[error("a filter with id `{id}` is already registered")]
    DuplicateFilter {
        /// The clashing id.
        id: String,
    },

    /// No filter is registered under the requested id.
    #[error("no filter registered with id `{id}`")]
    UnknownFilter {
        /// The requested id.
        id: String,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let e = MeshError::OpenMesh { boundary_edges: 4 };
        assert_eq!(e.to_string(), "mesh is not closed: 4 boundary edges");

        let e = MeshError::ParameterType {
            name: "Time".to_string(),
            expected: "float",
            found: "bool",
        };
        assert_eq!(e.to_string(), "parameter `Time` is a bool, expected float");

        let e = MeshError::NonManifoldVertex { vertex: 7 };
        assert_eq!(
            e.to_string(),
            "vertex 7 is non-manifold (more than one boundary fan)"
        );
    }
}
