//! Segment/segment intersection in parameter space.

use kurbo::{Line, ParamCurve, ParamCurveNearest, PathSeg, Point, Rect, Vec2};

use super::Tolerances;

const MAX_SUBDIVISION_DEPTH: u32 = 48;

/// Bounding box of the control polygon, which always contains the curve.
pub(super) fn control_box(seg: &PathSeg) -> Rect {
    match *seg {
        PathSeg::Line(l) => Rect::from_points(l.p0, l.p1),
        PathSeg::Quad(q) => Rect::from_points(q.p0, q.p2).union_pt(q.p1),
        PathSeg::Cubic(c) => Rect::from_points(c.p0, c.p3)
            .union_pt(c.p1)
            .union_pt(c.p2),
    }
}

pub(super) fn boxes_overlap(a: Rect, b: Rect, eps: f64) -> bool {
    a.x0 <= b.x1 + eps && b.x0 <= a.x1 + eps && a.y0 <= b.y1 + eps && b.y0 <= a.y1 + eps
}

fn distance_to_chord(p: Point, chord: Line) -> f64 {
    let d = chord.p1 - chord.p0;
    let len = d.hypot();
    if len == 0.0 {
        (p - chord.p0).hypot()
    } else {
        (p - chord.p0).cross(d).abs() / len
    }
}

fn is_flat(seg: &PathSeg, tolerance: f64) -> bool {
    let chord = Line::new(seg.start(), seg.end());
    match *seg {
        PathSeg::Line(_) => true,
        PathSeg::Quad(q) => distance_to_chord(q.p1, chord) <= tolerance,
        PathSeg::Cubic(c) => {
            distance_to_chord(c.p1, chord) <= tolerance
                && distance_to_chord(c.p2, chord) <= tolerance
        }
    }
}

/// Parameters `(t, u)` where `a(t) == b(u)`, or `None` for parallel lines and
/// crossings outside both segments.
fn line_line(a: Line, b: Line, param_eps: f64) -> Option<(f64, f64)> {
    let r = a.p1 - a.p0;
    let s = b.p1 - b.p0;
    let denom = r.cross(s);
    if denom.abs() <= f64::EPSILON * r.hypot() * s.hypot() {
        return None;
    }
    let qp: Vec2 = b.p0 - a.p0;
    let t = qp.cross(s) / denom;
    let u = qp.cross(r) / denom;
    let range = -param_eps..=1.0 + param_eps;
    (range.contains(&t) && range.contains(&u)).then_some((t, u))
}

/// Same curve within `eps`, in either direction.
fn same_curve(a: &PathSeg, b: &PathSeg, eps: f64) -> bool {
    let close = |p: Point, q: Point| (p - q).hypot() <= eps;
    let matches = |a: &PathSeg, b: &PathSeg| match (a, b) {
        (PathSeg::Quad(x), PathSeg::Quad(y)) => {
            close(x.p0, y.p0) && close(x.p1, y.p1) && close(x.p2, y.p2)
        }
        (PathSeg::Cubic(x), PathSeg::Cubic(y)) => {
            close(x.p0, y.p0) && close(x.p1, y.p1) && close(x.p2, y.p2) && close(x.p3, y.p3)
        }
        _ => false,
    };
    matches(a, b) || matches(a, &b.reverse())
}

#[derive(Debug, Clone, Copy)]
struct Span {
    seg: PathSeg,
    t0: f64,
    t1: f64,
}

impl Span {
    fn whole(seg: &PathSeg) -> Span {
        Span {
            seg: *seg,
            t0: 0.0,
            t1: 1.0,
        }
    }

    fn global(&self, local: f64) -> f64 {
        self.t0 + (self.t1 - self.t0) * local
    }

    fn halves(&self, whole: &PathSeg) -> [Span; 2] {
        let mid = 0.5 * (self.t0 + self.t1);
        [
            Span {
                seg: whole.subsegment(self.t0..mid),
                t0: self.t0,
                t1: mid,
            },
            Span {
                seg: whole.subsegment(mid..self.t1),
                t0: mid,
                t1: self.t1,
            },
        ]
    }
}

fn curve_curve(
    a: &PathSeg,
    span_a: Span,
    b: &PathSeg,
    span_b: Span,
    depth: u32,
    tolerances: &Tolerances,
    hits: &mut Vec<(f64, f64)>,
) {
    if !boxes_overlap(
        control_box(&span_a.seg),
        control_box(&span_b.seg),
        tolerances.point,
    ) {
        return;
    }
    let flat_a = is_flat(&span_a.seg, tolerances.flatness);
    let flat_b = is_flat(&span_b.seg, tolerances.flatness);
    if (flat_a && flat_b) || depth >= MAX_SUBDIVISION_DEPTH {
        let chord_a = Line::new(span_a.seg.start(), span_a.seg.end());
        let chord_b = Line::new(span_b.seg.start(), span_b.seg.end());
        if let Some((t, u)) = line_line(chord_a, chord_b, tolerances.param) {
            hits.push((span_a.global(t), span_b.global(u)));
        }
        return;
    }
    let parts_a = if flat_a {
        vec![span_a]
    } else {
        span_a.halves(a).to_vec()
    };
    let parts_b = if flat_b {
        vec![span_b]
    } else {
        span_b.halves(b).to_vec()
    };
    for part_a in &parts_a {
        for part_b in &parts_b {
            curve_curve(a, *part_a, b, *part_b, depth + 1, tolerances, hits);
        }
    }
}

/// Every crossing of `a` and `b`, as parameter pairs.
///
/// Overlapping collinear or identical pieces report no crossings; their end
/// points are picked up by [`touching`].
pub(super) fn crossings(a: &PathSeg, b: &PathSeg, tolerances: &Tolerances) -> Vec<(f64, f64)> {
    let mut hits = Vec::new();
    if !boxes_overlap(control_box(a), control_box(b), tolerances.point) {
        return hits;
    }
    match (a, b) {
        (PathSeg::Line(la), PathSeg::Line(lb)) => {
            hits.extend(line_line(*la, *lb, tolerances.param));
        }
        (PathSeg::Line(line), curve) => {
            hits.extend(
                curve
                    .intersect_line(*line)
                    .iter()
                    .map(|hit| (hit.line_t, hit.segment_t)),
            );
        }
        (curve, PathSeg::Line(line)) => {
            hits.extend(
                curve
                    .intersect_line(*line)
                    .iter()
                    .map(|hit| (hit.segment_t, hit.line_t)),
            );
        }
        _ => {
            if !same_curve(a, b, tolerances.point) {
                curve_curve(a, Span::whole(a), b, Span::whole(b), 0, tolerances, &mut hits);
            }
        }
    }
    hits
}

/// Parameter on `seg` where `pt` lies on its interior, if it does.
pub(super) fn touching(seg: &PathSeg, pt: Point, tolerances: &Tolerances) -> Option<f64> {
    if !boxes_overlap(
        control_box(seg),
        Rect::from_points(pt, pt),
        tolerances.point,
    ) {
        return None;
    }
    let nearest = seg.nearest(pt, tolerances.param);
    let interior = nearest.t > 0.0 && nearest.t < 1.0;
    (interior && nearest.distance_sq <= tolerances.point * tolerances.point).then_some(nearest.t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{CubicBez, QuadBez};

    fn tolerances() -> Tolerances {
        Tolerances::default()
    }

    #[test]
    fn crossing_lines() {
        let a = PathSeg::Line(Line::new((0.0, 0.0), (10.0, 10.0)));
        let b = PathSeg::Line(Line::new((0.0, 10.0), (10.0, 0.0)));
        assert_eq!(crossings(&a, &b, &tolerances()), vec![(0.5, 0.5)]);
    }

    #[test]
    fn parallel_lines_do_not_cross() {
        let a = PathSeg::Line(Line::new((0.0, 0.0), (10.0, 0.0)));
        let b = PathSeg::Line(Line::new((0.0, 1.0), (10.0, 1.0)));
        assert!(crossings(&a, &b, &tolerances()).is_empty());
        let c = PathSeg::Line(Line::new((5.0, 0.0), (15.0, 0.0)));
        assert!(crossings(&a, &c, &tolerances()).is_empty());
        assert_eq!(touching(&a, Point::new(5.0, 0.0), &tolerances()), Some(0.5));
    }

    #[test]
    fn line_through_quad() {
        let quad = PathSeg::Quad(QuadBez::new((0.0, 0.0), (5.0, 10.0), (10.0, 0.0)));
        let line = PathSeg::Line(Line::new((-1.0, 2.5), (11.0, 2.5)));
        let hits = crossings(&line, &quad, &tolerances());
        assert_eq!(hits.len(), 2);
        for (t, u) in hits {
            let p = line.eval(t);
            let q = quad.eval(u);
            assert!((p - q).hypot() < 1e-9, "{p:?} {q:?}");
        }
    }

    #[test]
    fn crossing_cubics() {
        let a = PathSeg::Cubic(CubicBez::new(
            (0.0, 0.0),
            (3.0, 10.0),
            (7.0, 10.0),
            (10.0, 0.0),
        ));
        let b = PathSeg::Cubic(CubicBez::new(
            (0.0, 8.0),
            (3.0, -2.0),
            (7.0, -2.0),
            (10.0, 8.0),
        ));
        let hits = crossings(&a, &b, &tolerances());
        assert!(!hits.is_empty());
        for (t, u) in hits {
            assert!((a.eval(t) - b.eval(u)).hypot() < 1e-5);
        }
    }

    #[test]
    fn identical_curves_report_nothing() {
        let a = PathSeg::Quad(QuadBez::new((0.0, 0.0), (5.0, 10.0), (10.0, 0.0)));
        assert!(crossings(&a, &a.reverse(), &tolerances()).is_empty());
    }

    #[test]
    fn end_points_are_not_touching() {
        let a = PathSeg::Line(Line::new((0.0, 0.0), (10.0, 0.0)));
        assert_eq!(touching(&a, Point::new(10.0, 0.0), &tolerances()), None);
        assert_eq!(touching(&a, Point::new(5.0, 1.0), &tolerances()), None);
    }
}
