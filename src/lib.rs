//! Embedded dual multigraph for two-colour planar subdivisions.
//!
//! A [`DualGraph`] represents the face-adjacency structure of a segmented
//! two-colour image: one vertex per visible face (plus optional "green"
//! boundary ports), one edge per maximal boundary arc (multiedges allowed),
//! and a rotation system — the cyclic order of incident half-edges around
//! each vertex — that fixes a unique planar embedding.
//!
//! Graphs are built from a face-label pixel grid by
//! [`build_from_raster`](raster::build_from_raster), mutated in place by the
//! two refinement moves [`split_arc`](DualGraph::split_arc) and
//! [`vertex_split`](DualGraph::vertex_split), and exchanged with external
//! tools through validated JSON snapshots.

pub mod graph;
pub mod raster;
pub mod refine;
pub mod replay;
pub mod snapshot;

pub use graph::{
    DualEdge, DualGraph, DualVertex, EdgeId, EdgeKind, HalfEdge, HalfEdgeId, Side,
    ValidationError, VertexId, VertexKind,
};
pub use raster::{build_from_raster, ConstructionError, GridPoint, LabelGrid, VisibleFace, OUTSIDE};
pub use refine::OperationError;
pub use replay::{apply_ops, AppliedOp, ParseOpError, RefineOp};
pub use snapshot::{Snapshot, SnapshotError};
