//! Refinement operations: the two elementary topology-preserving moves,
//! `split_arc` and `vertex_split`.
//!
//! Both operations validate every precondition before touching the arena, so
//! a failed call leaves the graph in its exact prior (valid) state.  Both
//! only append records and rewire existing `origin`/endpoint fields and
//! rotation membership — nothing is ever removed.

use std::fmt;

use crate::graph::{DualGraph, EdgeId, EdgeKind, HalfEdgeId, VertexId, VertexKind};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A rejected refinement operation; the graph is unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationError {
    EdgeOutOfRange(EdgeId),
    VertexOutOfRange(VertexId),
    /// `vertex_split` only applies to face vertices.
    NotAFaceVertex(VertexId),
    /// `vertex_split` requires degree >= 2.
    DegreeTooSmall { vertex: VertexId, degree: usize },
    /// A slice index is outside the vertex's rotation.
    IndexOutOfRange { vertex: VertexId, index: usize, degree: usize },
    /// `i == j` would move an empty (or complete) slice.
    EmptySlice { vertex: VertexId, index: usize },
    /// An edge's half-edge is absent from its endpoint's rotation
    /// (corrupt precondition).
    RotationMissingHalfEdge { vertex: VertexId, halfedge: HalfEdgeId },
    /// A half-edge in the rotation does not match either endpoint of its
    /// owning edge (corrupt precondition).
    EndpointMismatch { edge: EdgeId, halfedge: HalfEdgeId },
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EdgeOutOfRange(e) => write!(f, "{e} is out of range"),
            Self::VertexOutOfRange(v) => write!(f, "{v} is out of range"),
            Self::NotAFaceVertex(v) => {
                write!(f, "vertex split is only supported for face vertices, got {v}")
            }
            Self::DegreeTooSmall { vertex, degree } => {
                write!(f, "vertex split of {vertex} requires degree >= 2, got {degree}")
            }
            Self::IndexOutOfRange { vertex, index, degree } => {
                write!(f, "slice index {index} out of range for {vertex} of degree {degree}")
            }
            Self::EmptySlice { vertex, index } => {
                write!(f, "vertex split of {vertex} with i == j == {index} moves nothing")
            }
            Self::RotationMissingHalfEdge { vertex, halfedge } => {
                write!(f, "{halfedge} is missing from the rotation of {vertex}")
            }
            Self::EndpointMismatch { edge, halfedge } => {
                write!(f, "{halfedge} does not match either endpoint of {edge}")
            }
        }
    }
}

impl std::error::Error for OperationError {}

// ---------------------------------------------------------------------------
// Cyclic slices
// ---------------------------------------------------------------------------

/// `items[i..j)` on a cyclic sequence (i inclusive, j exclusive, wrapping).
/// `i == j` yields the full cycle starting at `i`, not the empty slice.
fn cycle_slice(items: &[HalfEdgeId], i: usize, j: usize) -> Vec<HalfEdgeId> {
    if items.is_empty() {
        return Vec::new();
    }
    let n = items.len();
    let (i, j) = (i % n, j % n);
    if i < j {
        items[i..j].to_vec()
    } else {
        let mut out = items[i..].to_vec();
        out.extend_from_slice(&items[..j]);
        out
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

impl DualGraph {
    /// SplitArc: replace edge `e = (u, v)` with two parallel edges of the
    /// same kind, the new one inserted as the cyclic successor of the
    /// original in both endpoint rotations.  Returns the new edge's id.
    pub fn split_arc(&mut self, edge: EdgeId) -> Result<EdgeId, OperationError> {
        let e = *self.edges.get(edge.0).ok_or(OperationError::EdgeOutOfRange(edge))?;

        // Locate both insertion slots before committing anything.
        let iu = self.rotation[e.u.0]
            .iter()
            .position(|&he| he == e.he_u)
            .ok_or(OperationError::RotationMissingHalfEdge { vertex: e.u, halfedge: e.he_u })?;
        let iv = self.rotation[e.v.0]
            .iter()
            .position(|&he| he == e.he_v)
            .ok_or(OperationError::RotationMissingHalfEdge { vertex: e.v, halfedge: e.he_v })?;

        let new_edge = self.add_edge(e.u, e.v, e.kind);
        let new = self.edges[new_edge.0];
        self.rotation[e.u.0].insert(iu + 1, new.he_u);
        self.rotation[e.v.0].insert(iv + 1, new.he_v);

        Ok(new_edge)
    }

    /// VertexSplit: split face vertex `v` into `v` (retained) and `v'` (new),
    /// moving the cyclic rotation slice `[i, j)` to `v'` and keeping `[j, i)`
    /// on `v`, then joining the two with a new internal edge whose half-edges
    /// close each rotation.  Returns `(v', new edge)`.
    pub fn vertex_split(
        &mut self,
        vertex: VertexId,
        i: usize,
        j: usize,
    ) -> Result<(VertexId, EdgeId), OperationError> {
        let v = self
            .vertices
            .get(vertex.0)
            .ok_or(OperationError::VertexOutOfRange(vertex))?
            .clone();
        if v.kind != VertexKind::Face {
            return Err(OperationError::NotAFaceVertex(vertex));
        }

        let degree = self.rotation[vertex.0].len();
        if degree < 2 {
            return Err(OperationError::DegreeTooSmall { vertex, degree });
        }
        for index in [i, j] {
            if index >= degree {
                return Err(OperationError::IndexOutOfRange { vertex, index, degree });
            }
        }
        if i == j {
            return Err(OperationError::EmptySlice { vertex, index: i });
        }

        let moved = cycle_slice(&self.rotation[vertex.0], i, j);
        let remaining = cycle_slice(&self.rotation[vertex.0], j, i);

        // Every moved half-edge must match an endpoint of its edge; checked
        // up front so no rewiring is committed on a corrupt graph.
        for &he in &moved {
            let e = self.edges[self.halfedges[he.0].edge.0];
            if e.he_u != he && e.he_v != he {
                return Err(OperationError::EndpointMismatch { edge: e.id, halfedge: he });
            }
        }

        let new_vertex = self.add_vertex(
            VertexKind::Face,
            v.color,
            v.parent.or(Some(vertex)),
            None,
            v.centroid,
        );

        // Reattach the moved half-edges (and their edges) to the new vertex.
        for &he in &moved {
            self.halfedges[he.0].origin = new_vertex;
            let eid = self.halfedges[he.0].edge;
            let e = &mut self.edges[eid.0];
            if e.he_u == he {
                e.u = new_vertex;
            } else {
                e.v = new_vertex;
            }
        }

        let new_edge = self.add_edge(vertex, new_vertex, EdgeKind::Internal);
        let new = self.edges[new_edge.0];

        let mut rot_v = remaining;
        rot_v.push(new.he_u);
        self.rotation[vertex.0] = rot_v;

        let mut rot_new = moved;
        rot_new.push(new.he_v);
        self.rotation[new_vertex.0] = rot_new;

        Ok((new_vertex, new_edge))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
