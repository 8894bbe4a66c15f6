//! Raster boundary tracer: builds a validated [`DualGraph`] from a face-label
//! pixel grid.
//!
//! Faces are 4-connected components of equal colour; adjacencies exist across
//! pixel edges.  The tracer emits one unit "micro-edge" per differing pixel
//! pair, groups micro-edges into maximal connected boundary components (one
//! dual edge each, so disjoint touching regions yield parallel edges), and
//! recovers each face's rotation by walking its boundary on the grid-point
//! lattice with the face kept on the left.
//!
//! Grid coordinates follow raster convention: x grows right, y grows *down*.
//! Pixel `(x, y)` spans lattice points `(x, y)` to `(x + 1, y + 1)`.

use std::collections::BTreeMap;
use std::fmt;

use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};

use crate::graph::{DualGraph, EdgeId, EdgeKind, Side, VertexId, VertexKind};

/// A point on the grid-point lattice (pixel corners), `(x, y)`.
pub type GridPoint = (i32, i32);

/// Sentinel face label for "outside the image"; only ever appears on the
/// synthetic micro-edges that let the boundary trace traverse the frame.
pub const OUTSIDE: u32 = u32::MAX;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A fatal, non-recoverable construction failure.
#[derive(Debug)]
pub enum ConstructionError {
    /// Label buffer length does not match `width * height`.
    GridSizeMismatch { width: usize, height: usize, labels: usize },
    /// Input rows are not all the same length.
    RaggedRows { row: usize, expected: usize, actual: usize },
    /// Visible face ids must be contiguous and equal their list index.
    NonContiguousFaceIds { index: usize, id: u32 },
    /// A grid cell references a face id outside the visible face list.
    LabelOutOfRange { x: usize, y: usize, label: u32 },
    /// The boundary trace followed a direction that has no micro-edge.
    LostDirectedEdge { face: VertexId, from: GridPoint, to: GridPoint },
    /// A micro-edge was never assigned to a dual edge.
    MissingDualEdge { face: VertexId, from: GridPoint, to: GridPoint },
    /// No turn candidate continues the walk.
    DeadEnd { face: VertexId, at: GridPoint },
    /// The walk re-entered itself without closing at its start.
    WalkDidNotClose { face: VertexId },
    /// A traced dual edge is not incident to the face being traced.
    EdgeNotIncident { face: VertexId, edge: EdgeId },
    /// The face's boundary decomposes into more than one cycle (it has a
    /// hole); multiply-connected faces are rejected, not approximated.
    FaceNotSimplyConnected { face: VertexId, cycles: usize },
    /// The finished graph failed validation (internal inconsistency).
    Invalid(crate::graph::ValidationError),
}

impl fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GridSizeMismatch { width, height, labels } => {
                write!(f, "label grid has {labels} cells for a {width}x{height} image")
            }
            Self::RaggedRows { row, expected, actual } => {
                write!(f, "row {row} has {actual} cells, expected {expected}")
            }
            Self::NonContiguousFaceIds { index, id } => {
                write!(f, "visible face at index {index} has id {id}")
            }
            Self::LabelOutOfRange { x, y, label } => {
                write!(f, "cell ({x}, {y}) references unknown face {label}")
            }
            Self::LostDirectedEdge { face, from, to } => {
                write!(f, "boundary trace of {face} lost directed edge {from:?} -> {to:?}")
            }
            Self::MissingDualEdge { face, from, to } => {
                write!(f, "micro-edge {from:?} -> {to:?} of {face} has no dual edge")
            }
            Self::DeadEnd { face, at } => {
                write!(f, "boundary trace of {face} hit a dead end at {at:?}")
            }
            Self::WalkDidNotClose { face } => {
                write!(f, "boundary trace of {face} did not return to its start")
            }
            Self::EdgeNotIncident { face, edge } => {
                write!(f, "traced {edge} is not incident to {face}")
            }
            Self::FaceNotSimplyConnected { face, cycles } => {
                write!(
                    f,
                    "{face} has {cycles} boundary cycles; only simply connected faces are supported"
                )
            }
            Self::Invalid(e) => write!(f, "constructed graph failed validation: {e}"),
        }
    }
}

impl std::error::Error for ConstructionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Invalid(e) => Some(e),
            _ => None,
        }
    }
}

impl From<crate::graph::ValidationError> for ConstructionError {
    fn from(e: crate::graph::ValidationError) -> Self {
        Self::Invalid(e)
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// A visible face of the subdivision, produced externally by flood fill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibleFace {
    /// Face id; must equal the face's index in the input list.
    pub id: u32,
    /// Two-colouring: 0 or 1.
    pub color: u8,
    /// Advisory centroid in pixel coordinates.
    pub centroid: Option<(f64, f64)>,
}

/// A row-major pixel → face-id label grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelGrid {
    width: usize,
    height: usize,
    labels: Vec<u32>,
}

impl LabelGrid {
    /// Wrap a row-major label buffer; rejects a length mismatch.
    pub fn new(width: usize, height: usize, labels: Vec<u32>) -> Result<Self, ConstructionError> {
        if labels.len() != width * height {
            return Err(ConstructionError::GridSizeMismatch { width, height, labels: labels.len() });
        }
        Ok(Self { width, height, labels })
    }

    /// Build from nested rows (`rows[y][x]`); rejects ragged input.
    pub fn from_rows(rows: &[Vec<u32>]) -> Result<Self, ConstructionError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        for (row, r) in rows.iter().enumerate() {
            if r.len() != width {
                return Err(ConstructionError::RaggedRows { row, expected: width, actual: r.len() });
            }
        }
        Ok(Self { width, height, labels: rows.concat() })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn get(&self, x: usize, y: usize) -> u32 {
        self.labels[y * self.width + x]
    }
}

// ---------------------------------------------------------------------------
// Micro-edges
// ---------------------------------------------------------------------------

/// A unit boundary segment between two differently-labelled pixels, directed
/// `p0 -> p1` so that `left` is the face on the left of the walk.  Vertical
/// boundaries run upward (left = west pixel), horizontal boundaries run
/// eastward (left = north pixel).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct MicroEdge {
    p0: GridPoint,
    p1: GridPoint,
    left: u32,
    right: u32,
}

struct RasterBuilder {
    graph: DualGraph,
    micro: Vec<MicroEdge>,
    /// Dual edge owning each micro-edge, parallel to `micro`.
    micro_edge_owner: Vec<Option<EdgeId>>,
    n_faces: usize,
    width: usize,
    height: usize,
}

/// Runs of constant value along a 1D boundary: `(label, start, end_excl)`.
fn boundary_runs(seq: impl IntoIterator<Item = u32>) -> Vec<(u32, usize, usize)> {
    let mut runs = Vec::new();
    let mut iter = seq.into_iter().enumerate();
    let Some((_, mut cur)) = iter.next() else {
        return runs;
    };
    let mut start = 0;
    let mut len = 1;
    for (i, v) in iter {
        if v != cur {
            runs.push((cur, start, i));
            cur = v;
            start = i;
        }
        len = i + 1;
    }
    runs.push((cur, start, len));
    runs
}

// Turns in raster coordinates (y grows downward).
fn turn_left(dx: i32, dy: i32) -> (i32, i32) {
    (dy, -dx)
}

fn turn_right(dx: i32, dy: i32) -> (i32, i32) {
    (-dy, dx)
}

impl RasterBuilder {
    fn add_micro(&mut self, me: MicroEdge) -> usize {
        let mid = self.micro.len();
        self.micro.push(me);
        self.micro_edge_owner.push(None);
        mid
    }

    /// Step 1: one micro-edge per 4-adjacent pixel pair with differing labels.
    fn collect_micro_edges(&mut self, grid: &LabelGrid) {
        for y in 0..self.height {
            for x in 0..self.width {
                let a = grid.get(x, y);
                if x + 1 < self.width {
                    let b = grid.get(x + 1, y);
                    if a != b {
                        // Vertical boundary at x+1; canonical direction is up,
                        // so the west pixel is on the left.
                        let (px, py) = (x as i32 + 1, y as i32);
                        self.add_micro(MicroEdge {
                            p0: (px, py + 1),
                            p1: (px, py),
                            left: a,
                            right: b,
                        });
                    }
                }
                if y + 1 < self.height {
                    let b = grid.get(x, y + 1);
                    if a != b {
                        // Horizontal boundary below; runs eastward, north
                        // pixel on the left.
                        let (px, py) = (x as i32, y as i32 + 1);
                        self.add_micro(MicroEdge {
                            p0: (px, py),
                            p1: (px + 1, py),
                            left: a,
                            right: b,
                        });
                    }
                }
            }
        }
    }

    /// Step 2: group micro-edges by unordered face pair, partition each group
    /// into connected components over shared endpoints, and emit one boundary
    /// dual edge per component.  Sorted pair order keeps edge ids
    /// deterministic.
    fn group_boundary_edges(&mut self) {
        let mut pair_to_micro: BTreeMap<(u32, u32), Vec<usize>> = BTreeMap::new();
        for (mid, me) in self.micro.iter().enumerate() {
            let pair = if me.left < me.right { (me.left, me.right) } else { (me.right, me.left) };
            pair_to_micro.entry(pair).or_default().push(mid);
        }

        for ((a, b), mids) in pair_to_micro {
            let mut endpoint_adj: HashMap<GridPoint, Vec<usize>> = HashMap::new();
            for (local, &mid) in mids.iter().enumerate() {
                let me = self.micro[mid];
                endpoint_adj.entry(me.p0).or_default().push(local);
                endpoint_adj.entry(me.p1).or_default().push(local);
            }

            let mut seen = vec![false; mids.len()];
            for first in 0..mids.len() {
                if seen[first] {
                    continue;
                }
                seen[first] = true;
                let mut stack = vec![first];
                let mut component = Vec::new();
                while let Some(cur) = stack.pop() {
                    component.push(mids[cur]);
                    let me = self.micro[mids[cur]];
                    for p in [me.p0, me.p1] {
                        for &next in endpoint_adj.get(&p).into_iter().flatten() {
                            if !seen[next] {
                                seen[next] = true;
                                stack.push(next);
                            }
                        }
                    }
                }

                let eid =
                    self.graph.add_edge(VertexId(a as usize), VertexId(b as usize), EdgeKind::Boundary);
                for mid in component {
                    self.micro_edge_owner[mid] = Some(eid);
                }
            }
        }
    }

    /// One green port per maximal constant-label run along a side, plus the
    /// synthetic micro-edges that let the trace walk the frame.
    fn add_green_run(
        &mut self,
        side: Side,
        face: u32,
        start: usize,
        end_excl: usize,
    ) -> EdgeId {
        let (w, h) = (self.width as f64, self.height as f64);
        let centroid = match side {
            Side::Top => ((start + end_excl) as f64 / 2.0, -0.5),
            Side::Bottom => ((start + end_excl) as f64 / 2.0, h + 0.5),
            Side::Left => (-0.5, (start + end_excl) as f64 / 2.0),
            Side::Right => (w + 0.5, (start + end_excl) as f64 / 2.0),
        };
        let gid =
            self.graph.add_vertex(VertexKind::Green, None, None, Some(side), Some(centroid));
        self.graph.add_edge(VertexId(face as usize), gid, EdgeKind::Boundary)
    }

    /// Step 3: boundary runs on all four sides, in fixed order top, bottom,
    /// left, right.
    fn add_green_ports(&mut self, grid: &LabelGrid) {
        let (w, h) = (self.width, self.height);
        if w == 0 || h == 0 {
            return;
        }

        for (face, start, end) in boundary_runs((0..w).map(|x| grid.get(x, 0))) {
            let eid = self.add_green_run(Side::Top, face, start, end);
            for x in start..end {
                let mid = self.add_micro(MicroEdge {
                    p0: (x as i32, 0),
                    p1: (x as i32 + 1, 0),
                    left: OUTSIDE,
                    right: face,
                });
                self.micro_edge_owner[mid] = Some(eid);
            }
        }

        for (face, start, end) in boundary_runs((0..w).map(|x| grid.get(x, h - 1))) {
            let eid = self.add_green_run(Side::Bottom, face, start, end);
            for x in start..end {
                let mid = self.add_micro(MicroEdge {
                    p0: (x as i32, h as i32),
                    p1: (x as i32 + 1, h as i32),
                    left: face,
                    right: OUTSIDE,
                });
                self.micro_edge_owner[mid] = Some(eid);
            }
        }

        for (face, start, end) in boundary_runs((0..h).map(|y| grid.get(0, y))) {
            let eid = self.add_green_run(Side::Left, face, start, end);
            for y in start..end {
                // Vertical frame segment; canonical direction is up.
                let mid = self.add_micro(MicroEdge {
                    p0: (0, y as i32 + 1),
                    p1: (0, y as i32),
                    left: OUTSIDE,
                    right: face,
                });
                self.micro_edge_owner[mid] = Some(eid);
            }
        }

        for (face, start, end) in boundary_runs((0..h).map(|y| grid.get(w - 1, y))) {
            let eid = self.add_green_run(Side::Right, face, start, end);
            for y in start..end {
                let mid = self.add_micro(MicroEdge {
                    p0: (w as i32, y as i32 + 1),
                    p1: (w as i32, y as i32),
                    left: face,
                    right: OUTSIDE,
                });
                self.micro_edge_owner[mid] = Some(eid);
            }
        }
    }

    /// Step 4: recover each face's rotation by walking its directed boundary.
    fn trace_rotations(&mut self) -> Result<(), ConstructionError> {
        for fid in 0..self.n_faces {
            let face = VertexId(fid);

            // Outward-directed adjacency for this face: the face stays on the
            // left of every directed micro-edge, so left-owners go p0 -> p1
            // and right-owners go p1 -> p0.
            let mut outgoing: HashMap<GridPoint, Vec<GridPoint>> = HashMap::new();
            let mut directed: HashMap<(GridPoint, GridPoint), usize> = HashMap::new();
            let mut order: Vec<(GridPoint, GridPoint)> = Vec::new();
            for (mid, me) in self.micro.iter().enumerate() {
                if me.left == fid as u32 {
                    outgoing.entry(me.p0).or_default().push(me.p1);
                    directed.insert((me.p0, me.p1), mid);
                    order.push((me.p0, me.p1));
                }
                if me.right == fid as u32 {
                    outgoing.entry(me.p1).or_default().push(me.p0);
                    directed.insert((me.p1, me.p0), mid);
                    order.push((me.p1, me.p0));
                }
            }

            if directed.is_empty() {
                // A face with no boundary at all (single face, no ports).
                continue;
            }

            let mut visited: HashSet<(GridPoint, GridPoint)> = HashSet::new();
            let mut cycles: Vec<Vec<EdgeId>> = Vec::new();

            for &start in &order {
                if visited.contains(&start) {
                    continue;
                }
                let (mut cur_u, mut cur_v) = start;
                let mut seq: Vec<EdgeId> = Vec::new();
                loop {
                    visited.insert((cur_u, cur_v));
                    let Some(&mid) = directed.get(&(cur_u, cur_v)) else {
                        return Err(ConstructionError::LostDirectedEdge {
                            face,
                            from: cur_u,
                            to: cur_v,
                        });
                    };
                    let Some(eid) = self.micro_edge_owner[mid] else {
                        return Err(ConstructionError::MissingDualEdge {
                            face,
                            from: cur_u,
                            to: cur_v,
                        });
                    };
                    seq.push(eid);

                    // Prefer the sharpest left turn that exists.
                    let dx = cur_v.0 - cur_u.0;
                    let dy = cur_v.1 - cur_u.1;
                    let candidates =
                        [turn_left(dx, dy), (dx, dy), turn_right(dx, dy), (-dx, -dy)];
                    let outs = outgoing.get(&cur_v);
                    let next = candidates.iter().find_map(|&(ndx, ndy)| {
                        let p = (cur_v.0 + ndx, cur_v.1 + ndy);
                        outs.is_some_and(|o| o.contains(&p)).then_some(p)
                    });
                    let Some(next) = next else {
                        return Err(ConstructionError::DeadEnd { face, at: cur_v });
                    };
                    (cur_u, cur_v) = (cur_v, next);
                    if (cur_u, cur_v) == start {
                        break;
                    }
                    if visited.contains(&(cur_u, cur_v)) {
                        return Err(ConstructionError::WalkDidNotClose { face });
                    }
                }

                // Collapse consecutive duplicates, cycle-aware: a degree-2
                // pinch point revisits the same dual edge back to back.
                let mut compressed: Vec<EdgeId> = Vec::new();
                for eid in seq {
                    if compressed.last() != Some(&eid) {
                        compressed.push(eid);
                    }
                }
                if compressed.len() > 1 && compressed.first() == compressed.last() {
                    compressed.pop();
                }
                cycles.push(compressed);
            }

            if cycles.len() != 1 {
                return Err(ConstructionError::FaceNotSimplyConnected {
                    face,
                    cycles: cycles.len(),
                });
            }

            // Convert the dual-edge cycle to the face-side half-edge sequence.
            let mut rot = Vec::with_capacity(cycles[0].len());
            for &eid in &cycles[0] {
                let Some(he) = self.graph.edge(eid).halfedge_from(face) else {
                    return Err(ConstructionError::EdgeNotIncident { face, edge: eid });
                };
                rot.push(he);
            }
            self.graph.rotation[fid] = rot;
        }

        Ok(())
    }

    /// Step 5: green ports get a trivial rotation in edge-encounter order
    /// (insertion order; geometric canonicalisation is left to downstream
    /// tools).
    fn fill_green_rotations(&mut self) {
        for vid in self.n_faces..self.graph.vertex_count() {
            let v = VertexId(vid);
            let rot: Vec<_> =
                self.graph.edges().filter_map(|e| e.halfedge_from(v)).collect();
            self.graph.rotation[vid] = rot;
        }
    }
}

/// Build the embedded dual graph of a raster subdivision.
///
/// `faces` lists the visible faces (ids must equal list indices); `grid` maps
/// every pixel to its face; `green_sides` adds one green port per boundary
/// run on each image side.  The result is validated before being returned.
pub fn build_from_raster(
    faces: &[VisibleFace],
    grid: &LabelGrid,
    green_sides: bool,
) -> Result<DualGraph, ConstructionError> {
    for (index, f) in faces.iter().enumerate() {
        if f.id as usize != index {
            return Err(ConstructionError::NonContiguousFaceIds { index, id: f.id });
        }
    }
    for y in 0..grid.height {
        for x in 0..grid.width {
            let label = grid.get(x, y);
            if label as usize >= faces.len() {
                return Err(ConstructionError::LabelOutOfRange { x, y, label });
            }
        }
    }

    let mut graph = DualGraph::default();
    for f in faces {
        let id = VertexId(f.id as usize);
        graph.add_vertex(VertexKind::Face, Some(f.color), Some(id), None, f.centroid);
    }

    let mut builder = RasterBuilder {
        graph,
        micro: Vec::new(),
        micro_edge_owner: Vec::new(),
        n_faces: faces.len(),
        width: grid.width,
        height: grid.height,
    };

    builder.collect_micro_edges(grid);
    builder.group_boundary_edges();
    if green_sides {
        builder.add_green_ports(grid);
    }
    builder.trace_rotations()?;
    builder.fill_green_rotations();

    builder.graph.validate()?;
    Ok(builder.graph)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
