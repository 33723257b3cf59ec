//! Mesh file I/O.
//!
//! | Format | Extension | Load | Save |
//! |--------|-----------|------|------|
//! | STL | `.stl` | binary and ASCII | binary |
//! | PLY | `.ply` | any encoding | ASCII |
//!
//! [`load`] and [`save`] pick the format from the file extension:
//!
//! ```no_run
//! use mcflow::io::{load, save};
//! use mcflow::mesh::HalfEdgeMesh;
//!
//! let mesh: HalfEdgeMesh = load("bunny.ply").unwrap();
//! save(&mesh, "bunny.stl").unwrap();
//! ```

pub mod ply;
pub mod stl;

use std::path::Path;

use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// STL (stereolithography).
    Stl,
    /// PLY (Stanford polygon file).
    Ply,
}

impl Format {
    /// Format for a file extension, case-insensitive.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_ascii_lowercase().as_str() {
            "stl" => Some(Format::Stl),
            "ply" => Some(Format::Ply),
            _ => None,
        }
    }

    /// Format of a path, from its extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

fn detect(path: &Path) -> Result<Format> {
    Format::from_path(path).ok_or_else(|| MeshError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })
}

/// Load a mesh, choosing the reader from the file extension.
///
/// # Errors
///
/// [`MeshError::UnsupportedFormat`] for an unknown extension, otherwise
/// whatever the format reader reports.
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let mesh = match detect(path)? {
        Format::Stl => stl::load(path)?,
        Format::Ply => ply::load(path)?,
    };
    log::debug!(
        "loaded {}: {} vertices, {} faces",
        path.display(),
        mesh.num_vertices(),
        mesh.num_faces()
    );
    Ok(mesh)
}

/// Save a mesh, choosing the writer from the file extension.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Stl => stl::save(mesh, path),
        Format::Ply => ply::save(mesh, path),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;
    use nalgebra::Point3;
    use std::path::PathBuf;

    pub(crate) fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mcflow-{}-{}", std::process::id(), name))
    }

    pub(crate) fn tetrahedron() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path("a/b/mesh.STL"), Some(Format::Stl));
        assert_eq!(Format::from_path("mesh.ply"), Some(Format::Ply));
        assert_eq!(Format::from_path("mesh.obj"), None);
        assert_eq!(Format::from_path("mesh"), None);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = save(&tetrahedron(), "mesh.off").unwrap_err();
        assert!(matches!(err, MeshError::UnsupportedFormat { ref extension } if extension == "off"));

        let err = load::<_, u32>("mesh").unwrap_err();
        assert!(matches!(err, MeshError::UnsupportedFormat { ref extension } if extension == "(none)"));
    }

    #[test]
    fn test_dispatch_by_extension() {
        let mesh = tetrahedron();
        for name in ["dispatch.stl", "dispatch.ply"] {
            let path = scratch_path(name);
            save(&mesh, &path).unwrap();
            let back: HalfEdgeMesh = load(&path).unwrap();
            std::fs::remove_file(&path).unwrap();

            assert_eq!(back.num_vertices(), 4);
            assert_eq!(back.num_faces(), 4);
            assert!(back.is_closed());
        }
    }
}
