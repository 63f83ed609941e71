use nalgebra::Point2;

/// A mesh vertex. Its index is its position in the node list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub x: f64,
    pub y: f64,
}

impl Node {
    pub fn new(x: f64, y: f64) -> Node {
        Node { x, y }
    }

    pub fn point(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }
}

/// A triangle of the mesh, as three node indices plus the label of the
/// region it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    pub nodes: [usize; 3],
    pub region: u32,
}

impl Triangle {
    pub fn new(nodes: [usize; 3]) -> Triangle {
        Triangle { nodes, region: 0 }
    }

    pub fn with_region(nodes: [usize; 3], region: u32) -> Triangle {
        Triangle { nodes, region }
    }
}

/// Identifies one side of a triangle: the side opposite local corner
/// `corner` (0, 1 or 2) of triangle `triangle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey {
    pub triangle: usize,
    pub corner: usize,
}

impl EdgeKey {
    pub fn new(triangle: usize, corner: usize) -> EdgeKey {
        EdgeKey { triangle, corner }
    }
}

/// Label meaning "not a boundary".
pub const INTERIOR_LABEL: u32 = 0;
