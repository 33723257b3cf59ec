//! STL support through `stl_io`.
//!
//! STL stores three corners per triangle. `stl_io` merges bit-identical
//! corners when reading, which restores the shared vertices of a mesh that was
//! written without loss.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_triangles, HalfEdgeMesh, MeshIndex};

/// Load a binary or ASCII STL file.
///
/// Triangles that collapse to an edge or a point after welding are skipped.
///
/// ```no_run
/// use mcflow::io::stl;
/// use mcflow::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = stl::load("part.stl").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let load_error = |message: String| MeshError::LoadError {
        path: path.to_path_buf(),
        message,
    };

    let mut reader = BufReader::new(File::open(path)?);
    let stl = stl_io::read_stl(&mut reader).map_err(|e| load_error(e.to_string()))?;

    let vertices: Vec<Point3<f64>> = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();

    let mut skipped = 0usize;
    let faces: Vec<[usize; 3]> = stl
        .faces
        .iter()
        .map(|tri| tri.vertices)
        .filter(|&[a, b, c]| {
            let keep = a != b && b != c && a != c;
            skipped += usize::from(!keep);
            keep
        })
        .collect();

    if skipped > 0 {
        log::warn!("{}: skipped {} degenerate triangles", path.display(), skipped);
    }
    if faces.is_empty() {
        return Err(load_error("no usable triangles".to_string()));
    }

    build_from_triangles(&vertices, &faces)
}

/// Write the faces of a mesh as binary STL.
pub fn write<W: Write, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, writer: &mut W) -> std::io::Result<()> {
    let to_f32 = |p: &Point3<f64>| [p.x as f32, p.y as f32, p.z as f32];

    let triangles: Vec<stl_io::Triangle> = mesh
        .face_ids()
        .map(|f| {
            let [p0, p1, p2] = mesh.face_positions(f);
            let n = (p1 - p0)
                .cross(&(p2 - p0))
                .try_normalize(1e-300)
                .unwrap_or_else(nalgebra::Vector3::zeros);
            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [
                    stl_io::Vertex::new(to_f32(&p0)),
                    stl_io::Vertex::new(to_f32(&p1)),
                    stl_io::Vertex::new(to_f32(&p2)),
                ],
            }
        })
        .collect();

    stl_io::write_stl(writer, triangles.iter())
}

/// Save a mesh as binary STL. Positions are narrowed to `f32`.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);

    write(mesh, &mut writer)
        .and_then(|()| writer.flush())
        .map_err(|e| MeshError::SaveError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::tests::{scratch_path, tetrahedron};

    #[test]
    fn test_binary_roundtrip_welds_corners() {
        let mesh = tetrahedron();
        let path = scratch_path("roundtrip.stl");
        save(&mesh, &path).unwrap();
        let back: HalfEdgeMesh = load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(back.num_vertices(), 4);
        assert_eq!(back.num_faces(), 4);
        assert!(back.is_valid());
        assert!(back.is_closed());
        assert!((back.surface_area() - mesh.surface_area()).abs() < 1e-5);
    }

    #[test]
    fn test_ascii_with_degenerate_triangle() {
        let ascii = "solid test
facet normal 0 0 1
  outer loop
    vertex 0 0 0
    vertex 1 0 0
    vertex 0 1 0
  endloop
endfacet
facet normal 0 0 1
  outer loop
    vertex 1 0 0
    vertex 1 1 0
    vertex 0 1 0
  endloop
endfacet
facet normal 0 0 0
  outer loop
    vertex 1 1 0
    vertex 1 1 0
    vertex 0 1 0
  endloop
endfacet
endsolid test
";
        let path = scratch_path("ascii.stl");
        std::fs::write(&path, ascii).unwrap();
        let mesh: HalfEdgeMesh = load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.boundary_edge_count(), 4);
    }

    #[test]
    fn test_missing_file() {
        let result: Result<HalfEdgeMesh> = load(scratch_path("does-not-exist.stl"));
        assert!(matches!(result, Err(MeshError::Io(_))));
    }
}
