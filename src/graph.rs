//! Embedded dual multigraph — the core arena of vertices, edges and
//! half-edges plus the rotation system that fixes a planar embedding.
//!
//! # Structure
//!
//! The graph is the *dual* of a two-colour planar subdivision: vertices are
//! faces (plus optional synthetic "green" boundary ports), edges encode
//! adjacency across a shared boundary arc (parallel edges allowed), and
//! `rotation[v]` lists the half-edges leaving `v` in the cyclic order of the
//! embedding.  Every undirected edge owns exactly two half-edges, one per
//! endpoint.
//!
//! # Indexing
//!
//! All elements are stored in flat `Vec`s and addressed by strongly-typed
//! index wrappers (`VertexId`, `EdgeId`, `HalfEdgeId`).  Record ids always
//! equal the record's index in its arena, and the arenas are append-only:
//! refinement rewires fields but never removes a record, so ids stay valid
//! for the lifetime of the graph (required for op-replay logs).

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Index types
// ---------------------------------------------------------------------------

macro_rules! idx {
    ($name:ident) => {
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub usize);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

idx!(VertexId);
idx!(EdgeId);
idx!(HalfEdgeId);

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Vertex kind: a visible face of the subdivision, or a synthetic "green"
/// port anchoring the subdivision to one side of the enclosing frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VertexKind {
    Face,
    Green,
}

/// Edge kind: a visible boundary arc between two faces (or a face and a
/// green port), or an internal same-colour edge introduced by `vertex_split`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Boundary,
    Internal,
}

/// Image side a green port belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// A dual vertex.
///
/// `color` is `Some(0 | 1)` for face vertices and `None` for green ports;
/// `side` is the opposite.  `parent` is the originating visible face (self
/// for un-split faces, inherited on `vertex_split`).  `centroid` is advisory
/// geometry for downstream ordering and plays no role in topology.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DualVertex {
    pub id: VertexId,
    pub kind: VertexKind,
    pub color: Option<u8>,
    pub parent: Option<VertexId>,
    #[serde(default)]
    pub side: Option<Side>,
    #[serde(default)]
    pub centroid: Option<(f64, f64)>,
}

/// One oriented side of an edge, owned by the endpoint `origin`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HalfEdge {
    pub id: HalfEdgeId,
    pub edge: EdgeId,
    pub origin: VertexId,
}

/// An undirected dual edge between `u` and `v` (a multigraph: several
/// parallel edges may share the same endpoints).  `he_u` / `he_v` are the
/// half-edges whose origins are `u` / `v` respectively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DualEdge {
    pub id: EdgeId,
    pub u: VertexId,
    pub v: VertexId,
    pub kind: EdgeKind,
    pub he_u: HalfEdgeId,
    pub he_v: HalfEdgeId,
}

impl DualEdge {
    /// The half-edge of this edge whose origin is `v`, if `v` is an endpoint.
    ///
    /// For a self-loop both half-edges originate at `v`; `he_u` wins.
    pub fn halfedge_from(&self, v: VertexId) -> Option<HalfEdgeId> {
        if self.u == v {
            Some(self.he_u)
        } else if self.v == v {
            Some(self.he_v)
        } else {
            None
        }
    }

    /// The endpoint opposite to `v`, if `v` is an endpoint.
    pub fn other(&self, v: VertexId) -> Option<VertexId> {
        if self.u == v {
            Some(self.v)
        } else if self.v == v {
            Some(self.u)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

/// A violated structural invariant, naming the rule and the offending id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// `rotation` does not have one entry per vertex.
    RotationCountMismatch { rotations: usize, vertices: usize },
    /// A vertex record's id does not match its arena index.
    VertexIdMismatch { index: usize, id: VertexId },
    /// An edge record's id does not match its arena index.
    EdgeIdMismatch { index: usize, id: EdgeId },
    /// A half-edge record's id does not match its arena index.
    HalfEdgeIdMismatch { index: usize, id: HalfEdgeId },
    /// `rotation[vertex]` references a half-edge id that is out of range.
    RotationHalfEdgeOutOfRange { vertex: VertexId, halfedge: HalfEdgeId },
    /// `rotation[vertex]` contains a half-edge not originating at `vertex`.
    RotationOriginMismatch { vertex: VertexId, halfedge: HalfEdgeId },
    /// An edge endpoint references a vertex id that is out of range.
    EdgeEndpointOutOfRange { edge: EdgeId, endpoint: VertexId },
    /// An edge's `he_u`/`he_v` references a half-edge id out of range.
    EdgeHalfEdgeOutOfRange { edge: EdgeId, halfedge: HalfEdgeId },
    /// An edge's half-edge does not point back to the edge.
    EdgeBackrefMismatch { edge: EdgeId, halfedge: HalfEdgeId },
    /// An edge's half-edge does not originate at the matching endpoint.
    EdgeOriginMismatch { edge: EdgeId, halfedge: HalfEdgeId, expected: VertexId },
    /// An edge's half-edge is absent from its endpoint's rotation.
    HalfEdgeNotInRotation { edge: EdgeId, halfedge: HalfEdgeId, vertex: VertexId },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RotationCountMismatch { rotations, vertices } => {
                write!(f, "rotation table has {rotations} entries for {vertices} vertices")
            }
            Self::VertexIdMismatch { index, id } => {
                write!(f, "vertex at index {index} has id {id}")
            }
            Self::EdgeIdMismatch { index, id } => {
                write!(f, "edge at index {index} has id {id}")
            }
            Self::HalfEdgeIdMismatch { index, id } => {
                write!(f, "half-edge at index {index} has id {id}")
            }
            Self::RotationHalfEdgeOutOfRange { vertex, halfedge } => {
                write!(f, "rotation of {vertex} contains invalid half-edge id {halfedge}")
            }
            Self::RotationOriginMismatch { vertex, halfedge } => {
                write!(f, "rotation of {vertex} contains {halfedge} not owned by the vertex")
            }
            Self::EdgeEndpointOutOfRange { edge, endpoint } => {
                write!(f, "{edge} references invalid endpoint {endpoint}")
            }
            Self::EdgeHalfEdgeOutOfRange { edge, halfedge } => {
                write!(f, "{edge} references invalid half-edge id {halfedge}")
            }
            Self::EdgeBackrefMismatch { edge, halfedge } => {
                write!(f, "{halfedge} does not point back to {edge}")
            }
            Self::EdgeOriginMismatch { edge, halfedge, expected } => {
                write!(f, "{halfedge} of {edge} does not originate at {expected}")
            }
            Self::HalfEdgeNotInRotation { edge, halfedge, vertex } => {
                write!(f, "{halfedge} of {edge} is missing from the rotation of {vertex}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

// ---------------------------------------------------------------------------
// DualGraph
// ---------------------------------------------------------------------------

/// The embedded dual multigraph.
///
/// Arenas are append-only; all cross-references are plain ids resolved by
/// index lookup, so there are no ownership cycles.  `validate()` re-checks
/// every structural invariant and is run on construction and import.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DualGraph {
    pub(crate) vertices: Vec<DualVertex>,
    pub(crate) edges: Vec<DualEdge>,
    pub(crate) halfedges: Vec<HalfEdge>,
    pub(crate) rotation: Vec<Vec<HalfEdgeId>>,
}

impl DualGraph {
    // -----------------------------------------------------------------------
    // Counts
    // -----------------------------------------------------------------------

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn halfedge_count(&self) -> usize {
        self.halfedges.len()
    }

    /// Degree of `v` in the embedding (length of its rotation, counting each
    /// incident edge-end once).
    pub fn degree(&self, v: VertexId) -> usize {
        self.rotation[v.0].len()
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn vertex(&self, id: VertexId) -> &DualVertex {
        &self.vertices[id.0]
    }

    pub fn edge(&self, id: EdgeId) -> &DualEdge {
        &self.edges[id.0]
    }

    pub fn halfedge(&self, id: HalfEdgeId) -> &HalfEdge {
        &self.halfedges[id.0]
    }

    /// Cyclic order of half-edges leaving `v` in the planar embedding.
    pub fn rotation(&self, v: VertexId) -> &[HalfEdgeId] {
        &self.rotation[v.0]
    }

    pub fn vertices(&self) -> impl Iterator<Item = &DualVertex> {
        self.vertices.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = &DualEdge> {
        self.edges.iter()
    }

    /// Edges incident to `v`, in arena order (self-loops appear once).
    pub fn incident_edges(&self, v: VertexId) -> impl Iterator<Item = &DualEdge> {
        self.edges.iter().filter(move |e| e.u == v || e.v == v)
    }

    // -----------------------------------------------------------------------
    // Green-port queries (downstream solvers consume boundary-run order)
    // -----------------------------------------------------------------------

    /// Green ports tagged with `side`, in id order — the boundary-run order
    /// along that side as produced by raster construction.
    pub fn greens_by_side(&self, side: Side) -> impl Iterator<Item = &DualVertex> {
        self.vertices
            .iter()
            .filter(move |v| v.kind == VertexKind::Green && v.side == Some(side))
    }

    /// The face a green port is linked to, or `None` if `green` is not a
    /// green vertex or has no face neighbour.
    pub fn green_adjacent_face(&self, green: VertexId) -> Option<VertexId> {
        if self.vertices.get(green.0)?.kind != VertexKind::Green {
            return None;
        }
        self.incident_edges(green)
            .filter_map(|e| e.other(green))
            .find(|&n| self.vertices[n.0].kind == VertexKind::Face)
    }

    // -----------------------------------------------------------------------
    // Builders (crate-internal; construction and refinement only append)
    // -----------------------------------------------------------------------

    /// Append a vertex with an empty rotation and return its id.
    pub(crate) fn add_vertex(
        &mut self,
        kind: VertexKind,
        color: Option<u8>,
        parent: Option<VertexId>,
        side: Option<Side>,
        centroid: Option<(f64, f64)>,
    ) -> VertexId {
        let id = VertexId(self.vertices.len());
        self.vertices.push(DualVertex { id, kind, color, parent, side, centroid });
        self.rotation.push(Vec::new());
        id
    }

    /// Append an edge and its two half-edges (origins `u` and `v`).
    ///
    /// Rotation membership is **not** established here; construction installs
    /// whole rotations after tracing, refinement inserts at specific slots.
    pub(crate) fn add_edge(&mut self, u: VertexId, v: VertexId, kind: EdgeKind) -> EdgeId {
        let id = EdgeId(self.edges.len());
        let he_u = HalfEdgeId(self.halfedges.len());
        let he_v = HalfEdgeId(self.halfedges.len() + 1);
        self.halfedges.push(HalfEdge { id: he_u, edge: id, origin: u });
        self.halfedges.push(HalfEdge { id: he_v, edge: id, origin: v });
        self.edges.push(DualEdge { id, u, v, kind, he_u, he_v });
        id
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Re-check every structural invariant in one pass over each arena.
    ///
    /// Run automatically on construction and import; callers may re-run it
    /// after any mutation sequence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.rotation.len() != self.vertices.len() {
            return Err(ValidationError::RotationCountMismatch {
                rotations: self.rotation.len(),
                vertices: self.vertices.len(),
            });
        }

        for (index, v) in self.vertices.iter().enumerate() {
            if v.id.0 != index {
                return Err(ValidationError::VertexIdMismatch { index, id: v.id });
            }
        }
        for (index, he) in self.halfedges.iter().enumerate() {
            if he.id.0 != index {
                return Err(ValidationError::HalfEdgeIdMismatch { index, id: he.id });
            }
        }

        for (v_idx, rot) in self.rotation.iter().enumerate() {
            let vertex = VertexId(v_idx);
            for &he in rot {
                let Some(record) = self.halfedges.get(he.0) else {
                    return Err(ValidationError::RotationHalfEdgeOutOfRange { vertex, halfedge: he });
                };
                if record.origin != vertex {
                    return Err(ValidationError::RotationOriginMismatch { vertex, halfedge: he });
                }
            }
        }

        for (index, e) in self.edges.iter().enumerate() {
            if e.id.0 != index {
                return Err(ValidationError::EdgeIdMismatch { index, id: e.id });
            }
            for endpoint in [e.u, e.v] {
                if endpoint.0 >= self.vertices.len() {
                    return Err(ValidationError::EdgeEndpointOutOfRange { edge: e.id, endpoint });
                }
            }
            for (he, expected) in [(e.he_u, e.u), (e.he_v, e.v)] {
                let Some(record) = self.halfedges.get(he.0) else {
                    return Err(ValidationError::EdgeHalfEdgeOutOfRange { edge: e.id, halfedge: he });
                };
                if record.edge != e.id {
                    return Err(ValidationError::EdgeBackrefMismatch { edge: e.id, halfedge: he });
                }
                if record.origin != expected {
                    return Err(ValidationError::EdgeOriginMismatch { edge: e.id, halfedge: he, expected });
                }
                if !self.rotation[expected.0].contains(&he) {
                    return Err(ValidationError::HalfEdgeNotInRotation {
                        edge: e.id,
                        halfedge: he,
                        vertex: expected,
                    });
                }
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
