//! Handles and geometry shared by the graph and the network.

use std::fmt;
use std::ops::{Add, Sub};

/// Stable handle to a vertex in the graph arena.
/// Vertex 0 is always ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub usize);

impl VertexId {
    /// The ground vertex (always index 0).
    pub const GROUND: VertexId = VertexId(0);

    /// Check if this is the ground vertex.
    pub fn is_ground(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ground() {
            write!(f, "GND")
        } else {
            write!(f, "V{}", self.0)
        }
    }
}

/// Stable handle to an edge (one circuit branch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub usize);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// Stable handle to a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub usize);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// Which end of an edge (or component) is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Terminal {
    Input,
    Output,
}

impl Terminal {
    /// The opposite end.
    pub fn other(self) -> Self {
        match self {
            Terminal::Input => Terminal::Output,
            Terminal::Output => Terminal::Input,
        }
    }
}

/// A position on the drawing plane.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Distance from this point to the segment `a`-`b`.
    pub fn distance_to_segment(&self, a: Point, b: Point) -> f64 {
        let ab = b - a;
        let len_sq = ab.x * ab.x + ab.y * ab.y;
        if len_sq == 0.0 {
            return self.distance(a);
        }
        let ap = *self - a;
        let t = ((ap.x * ab.x + ap.y * ab.y) / len_sq).clamp(0.0, 1.0);
        self.distance(Point::new(a.x + t * ab.x, a.y + t * ab.y))
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}
