//! Labeled planar triangulation.
//!
//! Boundary information lives on triangle sides: each entry maps
//! `(triangle, corner)` to the label of the side opposite that corner.
//! An absent entry means the side is interior (label 0).

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    datatypes::{EdgeKey, Node, Triangle, INTERIOR_LABEL},
    error::BridgeError,
};

/// What [`LabeledMesh::rename_boundary`] does when a mapping sends two
/// distinct labels to the same one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelMerge {
    #[default]
    Allow,
    Forbid,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabeledMesh {
    nodes: Vec<Node>,
    triangles: Vec<Triangle>,
    boundary: BTreeMap<EdgeKey, u32>,
}

impl LabeledMesh {
    /// Builds a mesh and checks every index it references.
    ///
    /// Entries labeled 0 are dropped, since absence already means interior.
    pub fn new(
        nodes: Vec<Node>,
        triangles: Vec<Triangle>,
        boundary: BTreeMap<EdgeKey, u32>,
    ) -> Result<LabeledMesh, BridgeError> {
        let boundary = boundary
            .into_iter()
            .filter(|(_, label)| *label != INTERIOR_LABEL)
            .collect();
        let mesh = LabeledMesh {
            nodes,
            triangles,
            boundary,
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Checks that triangles reference existing nodes and boundary entries
    /// reference existing triangle corners.
    pub fn validate(&self) -> Result<(), BridgeError> {
        for (k, triangle) in self.triangles.iter().enumerate() {
            for node in triangle.nodes {
                if node >= self.nodes.len() {
                    return Err(BridgeError::Index(format!(
                        "triangle {k} references node {node} but the mesh has {} nodes",
                        self.nodes.len()
                    )));
                }
            }
        }
        for key in self.boundary.keys() {
            self.check_edge(key.triangle, key.corner)?;
        }
        Ok(())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// The boundary-edge mapping, ordered by triangle then corner.
    pub fn boundary_edges(&self) -> &BTreeMap<EdgeKey, u32> {
        &self.boundary
    }

    /// Label of the side opposite `corner` in `triangle`; 0 when interior.
    pub fn boundary_label(&self, triangle: usize, corner: usize) -> u32 {
        self.boundary
            .get(&EdgeKey::new(triangle, corner))
            .copied()
            .unwrap_or(INTERIOR_LABEL)
    }

    /// Local side labels of one triangle, in corner order.
    pub fn triangle_labels(&self, triangle: usize) -> [u32; 3] {
        [0, 1, 2].map(|corner| self.boundary_label(triangle, corner))
    }

    /// The two node indices of the side opposite `corner`.
    pub fn edge_nodes(&self, triangle: usize, corner: usize) -> Result<(usize, usize), BridgeError> {
        self.check_edge(triangle, corner)?;
        let nodes = self.triangles[triangle].nodes;
        Ok((nodes[(corner + 1) % 3], nodes[(corner + 2) % 3]))
    }

    /// Finds the triangle side joining `a` and `b`, in either order.
    ///
    /// Interior sides belong to two triangles; the one with the lower
    /// index is returned.
    pub fn find_edge(&self, a: usize, b: usize) -> Option<EdgeKey> {
        for (k, triangle) in self.triangles.iter().enumerate() {
            for corner in 0..3 {
                let p = triangle.nodes[(corner + 1) % 3];
                let q = triangle.nodes[(corner + 2) % 3];
                if (p == a && q == b) || (p == b && q == a) {
                    return Some(EdgeKey::new(k, corner));
                }
            }
        }
        None
    }

    /// Every distinct non-zero boundary label, ascending.
    pub fn boundary_labels(&self) -> BTreeSet<u32> {
        self.boundary.values().copied().collect()
    }

    pub fn edges_with_label(&self, label: u32) -> Vec<EdgeKey> {
        self.boundary
            .iter()
            .filter(|(_, l)| **l == label)
            .map(|(key, _)| *key)
            .collect()
    }

    /// Signed area of a triangle: positive when its vertices
    /// run counter-clockwise.
    pub fn signed_area(&self, triangle: usize) -> Result<f64, BridgeError> {
        let t = match self.triangles.get(triangle) {
            Some(t) => t,
            None => {
                return Err(BridgeError::Index(format!(
                    "triangle {triangle} out of range (mesh has {})",
                    self.triangles.len()
                )))
            }
        };
        let p0 = self.nodes[t.nodes[0]].point();
        let p1 = self.nodes[t.nodes[1]].point();
        let p2 = self.nodes[t.nodes[2]].point();

        Ok(0.5 * (p1 - p0).perp(&(p2 - p0)))
    }

    /// Indices of the triangles whose three corners are collinear.
    pub fn degenerate_triangles(&self) -> Vec<usize> {
        self.triangles
            .iter()
            .enumerate()
            .filter(|(_, t)| {
                let [p0, p1, p2] = t.nodes.map(|n| self.nodes[n].point());
                (p1 - p0).perp(&(p2 - p0)) == 0.0
            })
            .map(|(k, _)| k)
            .collect()
    }

    /// Upserts the label of one triangle side. Label 0 removes the entry.
    pub fn set_boundary_edge(
        &mut self,
        triangle: usize,
        corner: usize,
        label: u32,
    ) -> Result<(), BridgeError> {
        self.check_edge(triangle, corner)?;
        let key = EdgeKey::new(triangle, corner);
        if label == INTERIOR_LABEL {
            self.boundary.remove(&key);
        } else {
            self.boundary.insert(key, label);
        }
        Ok(())
    }

    /// Labels the side joining nodes `a` and `b`, whichever order the
    /// triangle lists them in.
    pub fn set_boundary_edge_by_nodes(
        &mut self,
        a: usize,
        b: usize,
        label: u32,
    ) -> Result<EdgeKey, BridgeError> {
        let key = match self.find_edge(a, b) {
            Some(key) => key,
            None => {
                return Err(BridgeError::Index(format!(
                    "no triangle side joins nodes {a} and {b}"
                )))
            }
        };
        self.set_boundary_edge(key.triangle, key.corner, label)?;
        Ok(key)
    }

    /// Removes one entry, returning its former label (0 if there was none).
    pub fn remove_boundary_edge(&mut self, triangle: usize, corner: usize) -> Result<u32, BridgeError> {
        self.check_edge(triangle, corner)?;
        Ok(self
            .boundary
            .remove(&EdgeKey::new(triangle, corner))
            .unwrap_or(INTERIOR_LABEL))
    }

    /// Rewrites every boundary label through `mapping`.
    ///
    /// Labels absent from the mapping are kept. Mapping a label to 0 turns
    /// those sides interior. With [`LabelMerge::Forbid`] the call fails,
    /// leaving the mesh untouched, if two distinct labels in use (the
    /// interior label included) would end up equal.
    pub fn rename_boundary(
        &mut self,
        mapping: &BTreeMap<u32, u32>,
        merges: LabelMerge,
    ) -> Result<(), BridgeError> {
        let rename = |label: u32| mapping.get(&label).copied().unwrap_or(label);

        if merges == LabelMerge::Forbid {
            let mut in_use = self.boundary_labels();
            in_use.insert(INTERIOR_LABEL);

            let mut seen: BTreeMap<u32, u32> = BTreeMap::new();
            for label in in_use {
                let target = rename(label);
                if let Some(previous) = seen.insert(target, label) {
                    return Err(BridgeError::Config(format!(
                        "renaming would merge boundary labels {previous} and {label} into {target}"
                    )));
                }
            }
        }

        self.boundary = std::mem::take(&mut self.boundary)
            .into_iter()
            .map(|(key, label)| (key, rename(label)))
            .filter(|(_, label)| *label != INTERIOR_LABEL)
            .collect();

        Ok(())
    }

    fn check_edge(&self, triangle: usize, corner: usize) -> Result<(), BridgeError> {
        if triangle >= self.triangles.len() {
            return Err(BridgeError::Index(format!(
                "triangle {triangle} out of range (mesh has {})",
                self.triangles.len()
            )));
        }
        if corner > 2 {
            return Err(BridgeError::Index(format!(
                "local corner {corner} is not one of 0, 1, 2"
            )));
        }
        Ok(())
    }
}
