//! Snapshot import/export: the four-parallel-collections JSON format shared
//! with the external solver and replay tooling.
//!
//! A snapshot is the structural inverse of the in-memory graph — ids, kinds
//! and adjacency round-trip exactly.  Import always re-validates and rejects
//! malformed snapshots outright; nothing is ever auto-repaired.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::{DualEdge, DualGraph, DualVertex, HalfEdge, HalfEdgeId, ValidationError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while reading or writing snapshots.
#[derive(Debug)]
pub enum SnapshotError {
    /// The payload is not syntactically valid JSON for the snapshot shape.
    Json(serde_json::Error),
    /// The snapshot decoded but violates a structural invariant.
    Invalid(ValidationError),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(e) => write!(f, "malformed snapshot JSON: {e}"),
            Self::Invalid(e) => write!(f, "invalid snapshot: {e}"),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            Self::Invalid(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<ValidationError> for SnapshotError {
    fn from(e: ValidationError) -> Self {
        Self::Invalid(e)
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Serialisable mirror of a [`DualGraph`]: four parallel collections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub vertices: Vec<DualVertex>,
    pub edges: Vec<DualEdge>,
    pub halfedges: Vec<HalfEdge>,
    pub rotation: Vec<Vec<HalfEdgeId>>,
}

impl DualGraph {
    /// Export the graph as a snapshot (pure copy; always succeeds).
    pub fn export(&self) -> Snapshot {
        Snapshot {
            vertices: self.vertices.clone(),
            edges: self.edges.clone(),
            halfedges: self.halfedges.clone(),
            rotation: self.rotation.clone(),
        }
    }

    /// Import a snapshot, re-checking every invariant before returning.
    pub fn import(snapshot: Snapshot) -> Result<Self, SnapshotError> {
        let graph = DualGraph {
            vertices: snapshot.vertices,
            edges: snapshot.edges,
            halfedges: snapshot.halfedges,
            rotation: snapshot.rotation,
        };
        graph.validate()?;
        Ok(graph)
    }

    /// Serialise to the snapshot JSON format.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(&self.export())?)
    }

    /// Deserialise from snapshot JSON, validating before returning.
    pub fn from_json(data: &str) -> Result<Self, SnapshotError> {
        Self::import(serde_json::from_str(data)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
