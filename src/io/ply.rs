//! PLY support. Reading goes through `ply-rs` and accepts every encoding;
//! writing produces ASCII.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_triangles, HalfEdgeMesh, MeshIndex};

/// Load a PLY file. Polygons with more than three corners are fan
/// triangulated.
///
/// ```no_run
/// use mcflow::io::ply;
/// use mcflow::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = ply::load("scan.ply").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let load_error = |message: &str| MeshError::LoadError {
        path: path.to_path_buf(),
        message: message.to_string(),
    };

    let mut reader = BufReader::new(File::open(path)?);
    let ply = Parser::<DefaultElement>::new()
        .read_ply(&mut reader)
        .map_err(|e| load_error(&e.to_string()))?;

    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| load_error("no vertex element"))?;
    let vertices = vertex_element
        .iter()
        .map(|v| {
            match (scalar(v, "x"), scalar(v, "y"), scalar(v, "z")) {
                (Some(x), Some(y), Some(z)) => Ok(Point3::new(x, y, z)),
                _ => Err(load_error("vertex without numeric x, y and z")),
            }
        })
        .collect::<Result<Vec<Point3<f64>>>>()?;

    let face_element = ply
        .payload
        .get("face")
        .ok_or_else(|| load_error("no face element"))?;
    let mut faces: Vec<[usize; 3]> = Vec::with_capacity(face_element.len());
    for face in face_element {
        let corners = index_list(face, "vertex_indices")
            .or_else(|| index_list(face, "vertex_index"))
            .ok_or_else(|| load_error("face without a vertex index list"))?;
        for i in 1..corners.len().saturating_sub(1) {
            faces.push([corners[0], corners[i], corners[i + 1]]);
        }
    }

    if faces.is_empty() {
        return Err(load_error("no faces"));
    }

    build_from_triangles(&vertices, &faces)
}

fn scalar(element: &DefaultElement, name: &str) -> Option<f64> {
    Some(match element.get(name)? {
        Property::Double(v) => *v,
        Property::Float(v) => *v as f64,
        Property::Int(v) => *v as f64,
        Property::UInt(v) => *v as f64,
        Property::Short(v) => *v as f64,
        Property::UShort(v) => *v as f64,
        Property::Char(v) => *v as f64,
        Property::UChar(v) => *v as f64,
        _ => return None,
    })
}

fn index_list(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    fn convert<T: Copy + TryInto<usize>>(values: &[T]) -> Option<Vec<usize>> {
        values.iter().map(|&x| x.try_into().ok()).collect()
    }

    match element.get(name)? {
        Property::ListInt(v) => convert(v),
        Property::ListUInt(v) => convert(v),
        Property::ListShort(v) => convert(v),
        Property::ListUShort(v) => convert(v),
        Property::ListChar(v) => convert(v),
        Property::ListUChar(v) => convert(v),
        _ => None,
    }
}

/// Write a mesh as ASCII PLY with double-precision coordinates.
///
/// Every vertex slot is written, so face indices match [`VertexId`] indices.
///
/// [`VertexId`]: crate::mesh::VertexId
pub fn write<W: Write, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment written by mcflow")?;
    writeln!(writer, "element vertex {}", mesh.num_vertices())?;
    for axis in ["x", "y", "z"] {
        writeln!(writer, "property double {}", axis)?;
    }
    writeln!(writer, "element face {}", mesh.num_faces())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for v in mesh.vertex_ids() {
        let p = mesh.position(v);
        writeln!(writer, "{} {} {}", p.x, p.y, p.z)?;
    }
    for f in mesh.face_ids() {
        let [a, b, c] = mesh.face_triangle(f);
        writeln!(writer, "3 {} {} {}", a.index(), b.index(), c.index())?;
    }
    Ok(())
}

/// Save a mesh as ASCII PLY.
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
    fn test_roundtrip_is_exact() {
        let mut mesh = tetrahedron();
        let v = crate::mesh::VertexId::new(3);
        mesh.set_position(v, Point3::new(0.1 + 0.2, 1.0 / 3.0, std::f64::consts::PI));

        let path = scratch_path("roundtrip.ply");
        save(&mesh, &path).unwrap();
        let back: HalfEdgeMesh = load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(back.num_faces(), 4);
        for v in mesh.vertex_ids() {
            assert_eq!(back.position(v), mesh.position(v));
        }
    }

    #[test]
    fn test_quad_is_fan_triangulated() {
        let text = "ply
format ascii 1.0
element vertex 4
property float x
property float y
property float z
element face 1
property list uchar int vertex_indices
end_header
0 0 0
1 0 0
1 1 0
0 1 0
4 0 1 2 3
";
        let path = scratch_path("quad.ply");
        std::fs::write(&path, text).unwrap();
        let mesh: HalfEdgeMesh = load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.boundary_edge_count(), 4);
        assert!((mesh.surface_area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_vertices_without_faces() {
        let text = "ply
format ascii 1.0
element vertex 1
property float x
property float y
property float z
end_header
0 0 0
";
        let path = scratch_path("nofaces.ply");
        std::fs::write(&path, text).unwrap();
        let result: Result<HalfEdgeMesh> = load(&path);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(MeshError::LoadError { .. })));
    }
}
