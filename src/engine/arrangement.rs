//! Planar arrangement of split segments: vertex snapping, classification of
//! pieces against a fill predicate and linking of kept pieces into contours.

use std::collections::HashMap;

use kurbo::{
    CubicBez, Line, ParamCurve, ParamCurveDeriv, ParamCurveNearest, PathEl, PathSeg, Point,
    QuadBez, Shape, Vec2,
};

use super::{
    intersect::{control_box, crossings, touching},
    Tolerances,
};
use crate::path::contour::{Contour, Seg};

/// Winding numbers of the (at most two) inputs of an operation.
pub(super) type Windings = [i32; 2];

/// Vertices merged within the point tolerance. Earlier insertions win, so
/// input vertices inserted first keep their exact coordinates.
struct Vertices {
    points: Vec<Point>,
    grid: HashMap<(i64, i64), Vec<usize>>,
    cell: f64,
    eps: f64,
}

impl Vertices {
    /// `scale` is the largest coordinate magnitude of the input; the grid
    /// cell grows with it so cell indices stay far from the `i64` range.
    fn new(eps: f64, scale: f64) -> Self {
        Vertices {
            points: Vec::new(),
            grid: HashMap::new(),
            cell: (eps * 4.0).max(scale * 1e-9),
            eps,
        }
    }

    fn key(&self, pt: Point) -> (i64, i64) {
        (
            (pt.x / self.cell).floor() as i64,
            (pt.y / self.cell).floor() as i64,
        )
    }

    fn find(&self, pt: Point) -> Option<usize> {
        let (kx, ky) = self.key(pt);
        (kx.saturating_sub(1)..=kx.saturating_add(1))
            .flat_map(|x| (ky.saturating_sub(1)..=ky.saturating_add(1)).map(move |y| (x, y)))
            .filter_map(|key| self.grid.get(&key))
            .flatten()
            .copied()
            .filter(|&i| (self.points[i] - pt).hypot() <= self.eps)
            .min()
    }

    fn insert(&mut self, pt: Point) -> usize {
        if let Some(existing) = self.find(pt) {
            return existing;
        }
        let index = self.points.len();
        self.points.push(pt);
        let key = self.key(pt);
        self.grid.entry(key).or_default().push(index);
        index
    }
}

/// A split segment running between two vertices.
///
/// `owners` counts, per input, the input edges running along the piece:
/// +1 for each one in the piece's direction, -1 for each one against it.
#[derive(Debug, Clone, Copy)]
struct Piece {
    seg: PathSeg,
    from: usize,
    to: usize,
    owners: Windings,
}

impl Piece {
    fn reversed(&self) -> Piece {
        Piece {
            seg: self.seg.reverse(),
            from: self.to,
            to: self.from,
            owners: [-self.owners[0], -self.owners[1]],
        }
    }

    /// Contribution of this piece to the winding numbers at `pt`.
    fn winding(&self, pt: Point) -> Windings {
        let rect = control_box(&self.seg);
        if pt.y < rect.y0 || pt.y > rect.y1 || pt.x < rect.x0 {
            return [0, 0];
        }
        let end = match self.seg {
            PathSeg::Line(l) => PathEl::LineTo(l.p1),
            PathSeg::Quad(q) => PathEl::QuadTo(q.p1, q.p2),
            PathSeg::Cubic(c) => PathEl::CurveTo(c.p1, c.p2, c.p3),
        };
        let els = [PathEl::MoveTo(self.seg.start()), end];
        let crossings = els.as_slice().winding(pt);
        [crossings * self.owners[0], crossings * self.owners[1]]
    }
}

/// Winding numbers of every input at `pt`, summed over all pieces.
fn windings_at(pieces: &[Piece], pt: Point) -> Windings {
    pieces.iter().fold([0, 0], |acc, piece| {
        let w = piece.winding(pt);
        [acc[0] + w[0], acc[1] + w[1]]
    })
}

/// Distance from `pt` to the nearest piece other than `skip`, or `limit`
/// when nothing is closer.
fn clearance(pieces: &[Piece], skip: usize, pt: Point, limit: f64, accuracy: f64) -> f64 {
    pieces
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != skip)
        .fold(limit, |best, (_, piece)| {
            if !control_box(&piece.seg).inflate(best, best).contains(pt) {
                return best;
            }
            best.min(piece.seg.nearest(pt, accuracy).distance_sq.sqrt())
        })
}

fn with_end_points(seg: PathSeg, p0: Point, p1: Point) -> PathSeg {
    match seg {
        PathSeg::Line(_) => PathSeg::Line(Line::new(p0, p1)),
        PathSeg::Quad(q) => PathSeg::Quad(QuadBez::new(p0, q.p1, p1)),
        PathSeg::Cubic(c) => PathSeg::Cubic(CubicBez::new(p0, c.p1, c.p2, p1)),
    }
}

/// Whether every control point sits on the end point, i.e. the piece has no
/// extent.
fn is_degenerate(seg: &PathSeg, eps: f64) -> bool {
    let rect = control_box(seg);
    rect.width() <= eps && rect.height() <= eps
}

/// Direction of travel leaving the start of `seg`.
fn start_tangent(seg: &PathSeg) -> Vec2 {
    let p0 = seg.start();
    let candidates = match *seg {
        PathSeg::Line(l) => [l.p1, l.p1, l.p1],
        PathSeg::Quad(q) => [q.p1, q.p2, q.p2],
        PathSeg::Cubic(c) => [c.p1, c.p2, c.p3],
    };
    candidates
        .iter()
        .map(|p| *p - p0)
        .find(|v| v.hypot2() > 0.0)
        .unwrap_or(Vec2::ZERO)
}

/// Direction of travel arriving at the end of `seg`.
fn end_tangent(seg: &PathSeg) -> Vec2 {
    -start_tangent(&seg.reverse())
}

fn mid_tangent(seg: &PathSeg) -> Vec2 {
    let d = match *seg {
        PathSeg::Line(l) => l.p1 - l.p0,
        PathSeg::Quad(q) => q.deriv().eval(0.5).to_vec2(),
        PathSeg::Cubic(c) => c.deriv().eval(0.5).to_vec2(),
    };
    if d.hypot2() > 0.0 {
        d
    } else {
        seg.end() - seg.start()
    }
}

/// Split every segment where it crosses or touches another one.
fn split_segments(edges: &[PathSeg], tolerances: &Tolerances) -> Vec<Vec<f64>> {
    let mut splits: Vec<Vec<f64>> = vec![Vec::new(); edges.len()];
    for i in 0..edges.len() {
        for j in i + 1..edges.len() {
            for (t, u) in crossings(&edges[i], &edges[j], tolerances) {
                splits[i].push(t);
                splits[j].push(u);
            }
            for end in [edges[j].start(), edges[j].end()] {
                splits[i].extend(touching(&edges[i], end, tolerances));
            }
            for end in [edges[i].start(), edges[i].end()] {
                splits[j].extend(touching(&edges[j], end, tolerances));
            }
        }
    }
    for params in splits.iter_mut() {
        params.retain(|t| *t > 0.0 && *t < 1.0);
        params.sort_by(f64::total_cmp);
        params.dedup_by(|a, b| (*a - *b).abs() <= tolerances.param);
    }
    splits
}

/// Largest coordinate magnitude over all control points.
fn coordinate_scale(edges: &[(PathSeg, usize)]) -> f64 {
    edges.iter().fold(0.0, |scale: f64, (seg, _)| {
        let rect = control_box(seg);
        scale
            .max(rect.x0.abs())
            .max(rect.x1.abs())
            .max(rect.y0.abs())
            .max(rect.y1.abs())
    })
}

fn build_pieces(
    edges: &[(PathSeg, usize)],
    scale: f64,
    tolerances: &Tolerances,
) -> (Vertices, Vec<Piece>) {
    let mut vertices = Vertices::new(tolerances.point, scale);
    for (edge, _) in edges {
        vertices.insert(edge.start());
        vertices.insert(edge.end());
    }
    let segs: Vec<PathSeg> = edges.iter().map(|(seg, _)| *seg).collect();
    let splits = split_segments(&segs, tolerances);
    log::trace!(
        "{} split points across {} edges",
        splits.iter().map(Vec::len).sum::<usize>(),
        edges.len()
    );

    let mut pieces: Vec<Piece> = Vec::new();
    let mut by_vertex_pair: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
    for ((edge, input), params) in edges.iter().zip(splits) {
        let bounds: Vec<f64> = std::iter::once(0.0)
            .chain(params)
            .chain(std::iter::once(1.0))
            .collect();
        for range in bounds.windows(2) {
            let raw = edge.subsegment(range[0]..range[1]);
            let from = vertices.insert(raw.start());
            let to = vertices.insert(raw.end());
            let seg = with_end_points(raw, vertices.points[from], vertices.points[to]);
            if from == to && is_degenerate(&seg, tolerances.point) {
                continue;
            }
            let key = (from.min(to), from.max(to));
            let mid = seg.eval(0.5);
            let duplicate = by_vertex_pair.get(&key).and_then(|existing| {
                existing.iter().copied().find(|&k| {
                    (pieces[k].seg.eval(0.5) - mid).hypot() <= tolerances.coincidence
                })
            });
            if let Some(k) = duplicate {
                pieces[k].owners[*input] += if pieces[k].from == from { 1 } else { -1 };
                continue;
            }
            let mut owners = [0, 0];
            owners[*input] = 1;
            by_vertex_pair.entry(key).or_default().push(pieces.len());
            pieces.push(Piece {
                seg,
                from,
                to,
                owners,
            });
        }
    }
    (vertices, pieces)
}

/// Keep the pieces with the result on exactly one side, oriented so that
/// the result lies on their left.
///
/// Each side is sampled just off the piece's midpoint, closer to the piece
/// than to any other piece, so thin regions are sampled inside.
fn classify(
    pieces: &[Piece],
    inside: &dyn Fn(Windings) -> bool,
    scale: f64,
    tolerances: &Tolerances,
) -> Vec<Piece> {
    let floor = (tolerances.point * 10.0).max(scale * f64::EPSILON * 64.0);
    pieces
        .iter()
        .enumerate()
        .filter_map(|(i, piece)| {
            if piece.owners == [0, 0] {
                return None;
            }
            let mid = piece.seg.eval(0.5);
            let tangent = mid_tangent(&piece.seg);
            let length = tangent.hypot();
            if length == 0.0 {
                return None;
            }
            let normal = Vec2::new(-tangent.y, tangent.x) / length;
            let rect = control_box(&piece.seg);
            let reach = (rect.width().max(rect.height()) * tolerances.probe).max(floor);
            let room = clearance(pieces, i, mid, 2.0 * reach, tolerances.param);
            let offset = reach.min(0.5 * room);
            if offset <= 0.0 {
                log::trace!("no room to sample around the piece at {mid:?}");
                return None;
            }
            let left = inside(windings_at(pieces, mid + normal * offset));
            let right = inside(windings_at(pieces, mid - normal * offset));
            match (left, right) {
                (true, false) => Some(*piece),
                (false, true) => Some(piece.reversed()),
                _ => None,
            }
        })
        .collect()
}

/// Counter-clockwise angle from `from` to `to`, in `(0, 2π]`.
fn ccw_angle(from: Vec2, to: Vec2) -> f64 {
    let angle = from.cross(to).atan2(from.dot(to));
    if angle <= 0.0 {
        angle + std::f64::consts::TAU
    } else {
        angle
    }
}

/// Walk kept pieces into closed cycles. At each vertex the walk continues
/// along the first outgoing piece clockwise from the incoming one, which
/// traces the boundary of the region on the left.
fn link(pieces: &[Piece]) -> Vec<Vec<Piece>> {
    let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
    for (i, piece) in pieces.iter().enumerate() {
        outgoing.entry(piece.from).or_default().push(i);
    }
    let mut used = vec![false; pieces.len()];
    let mut cycles = Vec::new();
    for first in 0..pieces.len() {
        if used[first] {
            continue;
        }
        used[first] = true;
        let mut cycle = vec![pieces[first]];
        let mut current = first;
        let closed = loop {
            let vertex = pieces[current].to;
            let back = -end_tangent(&pieces[current].seg);
            let next = outgoing
                .get(&vertex)
                .into_iter()
                .flatten()
                .copied()
                .filter(|&k| !used[k] || k == first)
                .max_by(|&a, &b| {
                    let angle_a = ccw_angle(back, start_tangent(&pieces[a].seg));
                    let angle_b = ccw_angle(back, start_tangent(&pieces[b].seg));
                    angle_a.total_cmp(&angle_b)
                });
            match next {
                Some(k) if k == first => break true,
                Some(k) => {
                    used[k] = true;
                    cycle.push(pieces[k]);
                    current = k;
                }
                None => break false,
            }
        };
        if closed {
            cycles.push(cycle);
        } else {
            log::warn!(
                "abandoning a dangling chain of {} pieces at vertex {}",
                cycle.len(),
                pieces[current].to
            );
        }
    }
    cycles
}

fn collinear(a: Point, b: Point, c: Point, eps: f64) -> bool {
    let ac = c - a;
    let len = ac.hypot();
    len > 0.0 && ((b - a).cross(ac).abs() / len) <= eps && (b - a).dot(c - b) > 0.0
}

/// Merge runs of collinear lines, including across the cycle's seam.
fn merge_lines(cycle: Vec<Piece>, vertices: &Vertices, eps: f64) -> Vec<Piece> {
    let mut merged: Vec<Piece> = Vec::with_capacity(cycle.len());
    let at = |i: usize| vertices.points[i];
    let join = |a: &Piece, b: &Piece| -> Option<Piece> {
        match (a.seg, b.seg) {
            (PathSeg::Line(_), PathSeg::Line(_))
                if collinear(at(a.from), at(a.to), at(b.to), eps) =>
            {
                Some(Piece {
                    seg: PathSeg::Line(Line::new(at(a.from), at(b.to))),
                    from: a.from,
                    to: b.to,
                    owners: a.owners,
                })
            }
            _ => None,
        }
    };
    for piece in cycle {
        match merged.last().and_then(|last| join(last, &piece)) {
            Some(joined) => {
                merged.pop();
                merged.push(joined);
            }
            None => merged.push(piece),
        }
    }
    while merged.len() > 2 {
        let (Some(last), Some(first)) = (merged.last(), merged.first()) else {
            break;
        };
        let Some(joined) = join(last, first) else {
            break;
        };
        merged.pop();
        merged[0] = joined;
    }
    merged
}

fn to_contour(mut cycle: Vec<Piece>, vertices: &Vertices) -> Contour {
    let lowest = cycle
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            let (pa, pb) = (vertices.points[a.from], vertices.points[b.from]);
            pa.y.total_cmp(&pb.y).then(pa.x.total_cmp(&pb.x))
        })
        .map(|(i, _)| i)
        .unwrap_or(0);
    cycle.rotate_left(lowest);
    let start = cycle
        .first()
        .map(|p| vertices.points[p.from])
        .unwrap_or_default();
    let mut segs: Vec<Seg> = cycle
        .iter()
        .map(|piece| match piece.seg {
            PathSeg::Line(l) => Seg::Line(l.p1),
            PathSeg::Quad(q) => Seg::Quad(q.p1, q.p2),
            PathSeg::Cubic(c) => Seg::Cubic(c.p1, c.p2, c.p3),
        })
        .collect();
    if segs.last() == Some(&Seg::Line(start)) {
        segs.pop();
    }
    Contour {
        start,
        segs,
        terminator: Some(crate::Verb::Close),
    }
}

/// Boundary contours of the region where `inside` holds, over the
/// arrangement of `edges`. Each edge is tagged with the input (0 or 1) it
/// comes from. Contours are ordered by their start points.
pub(super) fn trace_region(
    edges: &[(PathSeg, usize)],
    inside: &dyn Fn(Windings) -> bool,
    tolerances: &Tolerances,
) -> Vec<Contour> {
    let scale = coordinate_scale(edges);
    let (vertices, pieces) = build_pieces(edges, scale, tolerances);
    let kept = classify(&pieces, inside, scale, tolerances);
    let cycles = link(&kept);
    log::debug!(
        "{} edges, {} vertices, {} pieces, {} kept, {} contours",
        edges.len(),
        vertices.points.len(),
        pieces.len(),
        kept.len(),
        cycles.len()
    );
    let mut contours: Vec<Contour> = cycles
        .into_iter()
        .map(|cycle| merge_lines(cycle, &vertices, tolerances.point))
        .filter(|cycle| !cycle.is_empty())
        .map(|cycle| to_contour(cycle, &vertices))
        .collect();
    contours.sort_by(|a, b| {
        a.start
            .y
            .total_cmp(&b.start.y)
            .then(a.start.x.total_cmp(&b.start.x))
    });
    contours
}
