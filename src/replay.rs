//! Ordered refinement op lists: parsing, application, and a replayable
//! record of each op together with the ids it produced.
//!
//! External drivers feed ops in the colon syntax `split_arc:<edge>` /
//! `vertex_split:<vertex>:<i>:<j>`; the applied log is serialisable so a
//! refinement sequence can be replayed against the same starting snapshot.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::graph::{DualGraph, EdgeId, VertexId};
use crate::refine::OperationError;

// ---------------------------------------------------------------------------
// Ops
// ---------------------------------------------------------------------------

/// One refinement operation to apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RefineOp {
    SplitArc { edge: EdgeId },
    VertexSplit { vertex: VertexId, i: usize, j: usize },
}

/// A successfully applied op, with the ids it produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AppliedOp {
    SplitArc { edge: EdgeId, new_edge: EdgeId },
    VertexSplit { vertex: VertexId, i: usize, j: usize, new_vertex: VertexId, new_edge: EdgeId },
}

/// Errors parsing the colon op syntax.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseOpError {
    UnknownOp(String),
    /// Wrong number of `:`-separated arguments for the named op.
    BadArity { op: &'static str, expected: usize, actual: usize },
    BadInt(ParseIntError),
}

impl fmt::Display for ParseOpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOp(op) => {
                write!(f, "unknown op '{op}' (supported: split_arc, vertex_split)")
            }
            Self::BadArity { op, expected, actual } => {
                write!(f, "{op} expects {expected} arguments, got {actual}")
            }
            Self::BadInt(e) => write!(f, "bad integer argument: {e}"),
        }
    }
}

impl std::error::Error for ParseOpError {}

impl From<ParseIntError> for ParseOpError {
    fn from(e: ParseIntError) -> Self {
        Self::BadInt(e)
    }
}

impl FromStr for RefineOp {
    type Err = ParseOpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts[0] {
            "split_arc" => {
                if parts.len() != 2 {
                    return Err(ParseOpError::BadArity {
                        op: "split_arc",
                        expected: 1,
                        actual: parts.len() - 1,
                    });
                }
                Ok(Self::SplitArc { edge: EdgeId(parts[1].parse()?) })
            }
            "vertex_split" => {
                if parts.len() != 4 {
                    return Err(ParseOpError::BadArity {
                        op: "vertex_split",
                        expected: 3,
                        actual: parts.len() - 1,
                    });
                }
                Ok(Self::VertexSplit {
                    vertex: VertexId(parts[1].parse()?),
                    i: parts[2].parse()?,
                    j: parts[3].parse()?,
                })
            }
            other => Err(ParseOpError::UnknownOp(other.to_string())),
        }
    }
}

impl fmt::Display for RefineOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SplitArc { edge } => write!(f, "split_arc:{}", edge.0),
            Self::VertexSplit { vertex, i, j } => {
                write!(f, "vertex_split:{}:{i}:{j}", vertex.0)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Apply `ops` in order, recording each op with its produced ids.
///
/// The first failing op aborts with its error; each individual op is atomic,
/// so the graph then reflects exactly the ops applied before the failure.
pub fn apply_ops(
    graph: &mut DualGraph,
    ops: &[RefineOp],
) -> Result<Vec<AppliedOp>, OperationError> {
    let mut applied = Vec::with_capacity(ops.len());
    for &op in ops {
        applied.push(match op {
            RefineOp::SplitArc { edge } => {
                let new_edge = graph.split_arc(edge)?;
                AppliedOp::SplitArc { edge, new_edge }
            }
            RefineOp::VertexSplit { vertex, i, j } => {
                let (new_vertex, new_edge) = graph.vertex_split(vertex, i, j)?;
                AppliedOp::VertexSplit { vertex, i, j, new_vertex, new_edge }
            }
        });
    }
    Ok(applied)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
