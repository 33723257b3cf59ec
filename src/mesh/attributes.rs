//! Optional per-vertex attribute layers.
//!
//! A freshly built mesh carries positions and connectivity only. Algorithms
//! that need more per-vertex data enable the corresponding layer first:
//!
//! | Flag | Layer | Filled by |
//! |------|-------|-----------|
//! | [`AttributeMask::NORMAL`] | unit vertex normal | [`HalfEdgeMesh::update_vertex_normals`] |
//! | [`AttributeMask::CURVATURE`] | principal curvatures `(k1, k2)` | [`crate::algo::curvature::update_curvature`] |
//! | [`AttributeMask::CURVATURE_DIR`] | principal directions `(d1, d2)` | [`crate::algo::curvature::update_curvature`] |
//!
//! Enabling a layer allocates it with zeros. Layers track the vertex storage:
//! they grow with [`HalfEdgeMesh::add_vertex`] and shrink with
//! [`crate::mesh::compact_vertices`].
//!
//! ```
//! use mcflow::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//!
//! assert!(mesh.normal(VertexId::new(0)).is_err());
//! mesh.update_vertex_normals();
//! assert!((mesh.normal(VertexId::new(0)).unwrap().z - 1.0).abs() < 1e-12);
//! ```

use bitflags::bitflags;
use nalgebra::Vector3;

use super::halfedge::HalfEdgeMesh;
use super::index::{MeshIndex, VertexId};
use crate::error::{MeshError, Result};

bitflags! {
    /// Set of per-vertex attribute layers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AttributeMask: u8 {
        /// Unit vertex normals.
        const NORMAL = 0b0000_0001;
        /// Principal curvature values `(k1, k2)`.
        const CURVATURE = 0b0000_0010;
        /// Principal curvature directions `(d1, d2)`.
        const CURVATURE_DIR = 0b0000_0100;
        /// Every layer the curvature flow reads or refreshes.
        const CURVATURE_FLOW = Self::NORMAL.bits() | Self::CURVATURE.bits() | Self::CURVATURE_DIR.bits();
    }
}

impl AttributeMask {
    /// Layer names, for diagnostics.
    pub fn names(self) -> Vec<&'static str> {
        [
            (Self::NORMAL, "normal"),
            (Self::CURVATURE, "curvature"),
            (Self::CURVATURE_DIR, "curvature_dir"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect()
    }
}

/// Storage of the optional layers. `None` means disabled.
#[derive(Debug, Clone, Default)]
pub(crate) struct VertexAttributes {
    pub(crate) normals: Option<Vec<Vector3<f64>>>,
    pub(crate) curvature: Option<Vec<[f64; 2]>>,
    pub(crate) directions: Option<Vec<[Vector3<f64>; 2]>>,
}

impl VertexAttributes {
    pub(crate) fn mask(&self) -> AttributeMask {
        let mut mask = AttributeMask::empty();
        if self.normals.is_some() {
            mask |= AttributeMask::NORMAL;
        }
        if self.curvature.is_some() {
            mask |= AttributeMask::CURVATURE;
        }
        if self.directions.is_some() {
            mask |= AttributeMask::CURVATURE_DIR;
        }
        mask
    }

    fn enable(&mut self, mask: AttributeMask, len: usize) {
        if mask.contains(AttributeMask::NORMAL) && self.normals.is_none() {
            self.normals = Some(vec![Vector3::zeros(); len]);
        }
        if mask.contains(AttributeMask::CURVATURE) && self.curvature.is_none() {
            self.curvature = Some(vec![[0.0; 2]; len]);
        }
        if mask.contains(AttributeMask::CURVATURE_DIR) && self.directions.is_none() {
            self.directions = Some(vec![[Vector3::zeros(); 2]; len]);
        }
    }

    fn disable(&mut self, mask: AttributeMask) {
        if mask.contains(AttributeMask::NORMAL) {
            self.normals = None;
        }
        if mask.contains(AttributeMask::CURVATURE) {
            self.curvature = None;
        }
        if mask.contains(AttributeMask::CURVATURE_DIR) {
            self.directions = None;
        }
    }

    pub(crate) fn push_default(&mut self) {
        if let Some(n) = &mut self.normals {
            n.push(Vector3::zeros());
        }
        if let Some(k) = &mut self.curvature {
            k.push([0.0; 2]);
        }
        if let Some(d) = &mut self.directions {
            d.push([Vector3::zeros(); 2]);
        }
    }

    /// Drop the entries whose `keep` flag is false, preserving order.
    pub(crate) fn retain(&mut self, keep: &[bool]) {
        fn retain_layer<T>(layer: &mut Option<Vec<T>>, keep: &[bool]) {
            if let Some(values) = layer {
                let mut i = 0;
                values.retain(|_| {
                    let k = keep[i];
                    i += 1;
                    k
                });
            }
        }
        retain_layer(&mut self.normals, keep);
        retain_layer(&mut self.curvature, keep);
        retain_layer(&mut self.directions, keep);
    }

    pub(crate) fn len_matches(&self, len: usize) -> bool {
        self.normals.as_ref().map_or(true, |v| v.len() == len)
            && self.curvature.as_ref().map_or(true, |v| v.len() == len)
            && self.directions.as_ref().map_or(true, |v| v.len() == len)
    }
}

fn missing(attribute: &'static str) -> MeshError {
    MeshError::MissingAttribute { attribute }
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Allocate the layers in `mask` that are not already present.
    /// Existing layers keep their values.
    pub fn enable_attributes(&mut self, mask: AttributeMask) {
        let len = self.num_vertices();
        self.attributes.enable(mask, len);
    }

    /// Free the layers in `mask`.
    pub fn disable_attributes(&mut self, mask: AttributeMask) {
        self.attributes.disable(mask);
    }

    /// Layers currently enabled.
    pub fn enabled_attributes(&self) -> AttributeMask {
        self.attributes.mask()
    }

    /// Whether every layer in `mask` is enabled.
    pub fn has_attributes(&self, mask: AttributeMask) -> bool {
        self.attributes.mask().contains(mask)
    }

    /// Fail with [`MeshError::MissingAttribute`] naming the first layer of
    /// `mask` that is not enabled.
    pub fn require_attributes(&self, mask: AttributeMask) -> Result<()> {
        let absent = mask.difference(self.attributes.mask());
        match absent.names().first().copied() {
            Some(name) => Err(missing(name)),
            None => Ok(()),
        }
    }

    /// Enable the normal layer and fill it with area-weighted vertex normals.
    pub fn update_vertex_normals(&mut self) {
        let normals: Vec<Vector3<f64>> = self.vertex_ids().map(|v| self.vertex_normal(v)).collect();
        self.attributes.normals = Some(normals);
    }

    // ==================== Normals ====================

    /// Stored normal of a vertex.
    pub fn normal(&self, v: VertexId<I>) -> Result<Vector3<f64>> {
        self.normals().map(|n| n[v.index()])
    }

    /// All stored normals, indexed by vertex slot.
    pub fn normals(&self) -> Result<&[Vector3<f64>]> {
        self.attributes.normals.as_deref().ok_or_else(|| missing("normal"))
    }

    /// Overwrite the stored normal of a vertex.
    pub fn set_normal(&mut self, v: VertexId<I>, n: Vector3<f64>) -> Result<()> {
        let normals = self.attributes.normals.as_mut().ok_or_else(|| missing("normal"))?;
        normals[v.index()] = n;
        Ok(())
    }

    // ==================== Curvature ====================

    /// Stored principal curvatures `(k1, k2)` of a vertex.
    pub fn principal_curvatures(&self, v: VertexId<I>) -> Result<(f64, f64)> {
        self.curvatures().map(|k| (k[v.index()][0], k[v.index()][1]))
    }

    /// All stored `[k1, k2]` pairs, indexed by vertex slot.
    pub fn curvatures(&self) -> Result<&[[f64; 2]]> {
        self.attributes.curvature.as_deref().ok_or_else(|| missing("curvature"))
    }

    /// Overwrite the stored principal curvatures of a vertex.
    pub fn set_principal_curvatures(&mut self, v: VertexId<I>, k1: f64, k2: f64) -> Result<()> {
        let values = self.attributes.curvature.as_mut().ok_or_else(|| missing("curvature"))?;
        values[v.index()] = [k1, k2];
        Ok(())
    }

    /// Stored mean curvature `(k1 + k2) / 2` of a vertex.
    pub fn mean_curvature(&self, v: VertexId<I>) -> Result<f64> {
        self.principal_curvatures(v).map(|(k1, k2)| 0.5 * (k1 + k2))
    }

    /// Stored principal directions `(d1, d2)` of a vertex.
    pub fn principal_directions(&self, v: VertexId<I>) -> Result<(Vector3<f64>, Vector3<f64>)> {
        let dirs = self
            .attributes
            .directions
            .as_deref()
            .ok_or_else(|| missing("curvature_dir"))?;
        let [d1, d2] = dirs[v.index()];
        Ok((d1, d2))
    }

    /// Overwrite the stored principal directions of a vertex.
    pub fn set_principal_directions(
        &mut self,
        v: VertexId<I>,
        d1: Vector3<f64>,
        d2: Vector3<f64>,
    ) -> Result<()> {
        let dirs = self
            .attributes
            .directions
            .as_mut()
            .ok_or_else(|| missing("curvature_dir"))?;
        dirs[v.index()] = [d1, d2];
        Ok(())
    }
}
