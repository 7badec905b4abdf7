use std::collections::VecDeque;

use kurbo::Point;

use crate::{
    path::contour::{Contour, Seg},
    points_almost_equal, Path, PathOpsError, Pen, Segment,
};

/// Iterator replaying a [`Path`] as the shortest equivalent sequence of pen
/// commands.
///
/// Runs of quadratic curves with implied on-curve midpoints are joined into
/// one [`Segment::QCurveTo`], and a closing line back to the MOVE point is
/// left to [`Segment::ClosePath`]. Iteration stops after the first error.
#[derive(Debug)]
pub struct Segments {
    contours: std::vec::IntoIter<Contour>,
    pending: VecDeque<Segment>,
    failed: bool,
}

impl Segments {
    fn new(path: &Path) -> Self {
        Segments {
            contours: path.split_contours().into_iter(),
            pending: VecDeque::new(),
            failed: false,
        }
    }
}

impl Iterator for Segments {
    type Item = Result<Segment, PathOpsError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if self.pending.is_empty() {
            let contour = self.contours.next()?;
            if let Err(e) = emit_contour(&contour, &mut self.pending) {
                self.failed = true;
                self.pending.clear();
                return Some(Err(e));
            }
        }
        self.pending.pop_front().map(Ok)
    }
}

fn emit_contour(contour: &Contour, out: &mut VecDeque<Segment>) -> Result<(), PathOpsError> {
    let start = contour.start;
    let closed = contour.is_closed();
    let segs = &contour.segs;
    let last = segs.len().saturating_sub(1);
    // a curve ending within tolerance of the start closes onto it exactly
    let snap = |index: usize, pt: Point| {
        if closed && index == last && points_almost_equal(pt, start) {
            start
        } else {
            pt
        }
    };

    out.push_back(Segment::MoveTo(start));
    let mut i = 0;
    while i < segs.len() {
        match segs[i] {
            Seg::Line(pt) => {
                if !(closed && i == last && pt == start) {
                    out.push_back(Segment::LineTo(pt));
                }
            }
            Seg::Cubic(c1, c2, pt) => out.push_back(Segment::CurveTo(c1, c2, snap(i, pt))),
            Seg::Quad(control, mut on_curve) => {
                let mut off_curves = vec![control];
                let mut previous = control;
                while let Some(&Seg::Quad(next, next_on)) = segs.get(i + 1) {
                    if !points_almost_equal(on_curve, previous.midpoint(next)) {
                        break;
                    }
                    off_curves.push(next);
                    previous = next;
                    on_curve = next_on;
                    i += 1;
                }
                out.push_back(Segment::QCurveTo(off_curves, Some(snap(i, on_curve))));
            }
            Seg::Conic(..) => {
                return Err(PathOpsError::UnsupportedVerb(
                    "conic segments cannot be drawn with a pen; convert them to quads first"
                        .to_string(),
                ))
            }
        }
        i += 1;
    }
    out.push_back(if closed {
        Segment::ClosePath
    } else {
        Segment::EndPath
    });
    Ok(())
}

impl Path {
    /// The pen commands equivalent to this path.
    pub fn segments(&self) -> Segments {
        Segments::new(self)
    }

    /// Replay this path into `pen`.
    pub fn draw(&self, pen: &mut dyn Pen) -> Result<(), PathOpsError> {
        for segment in self.segments() {
            segment?.replay(pen)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{bits2float, PathPen, RecordingPen, Verb};
    use pretty_assertions::assert_eq;

    fn pt(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn segments(path: &Path) -> Vec<Segment> {
        path.segments().collect::<Result<_, _>>().unwrap()
    }

    #[test]
    fn open_contours() {
        let mut path = Path::new();
        let mut pen = PathPen::new(&mut path);
        pen.move_to(pt(0.0, 0.0)).unwrap();
        pen.move_to(pt(1.0, 0.0)).unwrap();
        pen.line_to(pt(1.0, 1.0)).unwrap();
        pen.curve_to(pt(2.0, 2.0), pt(3.0, 3.0), pt(4.0, 4.0))
            .unwrap();
        pen.end_path().unwrap();
        drop(pen);
        assert_eq!(
            segments(&path),
            vec![
                Segment::MoveTo(pt(0.0, 0.0)),
                Segment::EndPath,
                Segment::MoveTo(pt(1.0, 0.0)),
                Segment::LineTo(pt(1.0, 1.0)),
                Segment::CurveTo(pt(2.0, 2.0), pt(3.0, 3.0), pt(4.0, 4.0)),
                Segment::EndPath,
            ]
        );
    }

    #[test]
    fn unterminated_contour_ends() {
        let mut path = Path::new();
        path.move_to((0.0, 0.0));
        path.line_to((1.0, 0.0));
        assert_eq!(segments(&path).last(), Some(&Segment::EndPath));
    }

    #[test]
    fn quadratic_runs_are_joined() {
        let mut path = Path::new();
        let mut pen = PathPen::new(&mut path);
        pen.move_to(pt(0.0, 0.0)).unwrap();
        pen.q_curve_to(&[pt(1.0, 1.0), pt(2.0, 2.0)], Some(pt(3.0, 3.0)))
            .unwrap();
        pen.close_path().unwrap();
        drop(pen);
        assert_eq!(
            segments(&path),
            vec![
                Segment::MoveTo(pt(0.0, 0.0)),
                Segment::QCurveTo(vec![pt(1.0, 1.0), pt(2.0, 2.0)], Some(pt(3.0, 3.0))),
                Segment::ClosePath,
            ]
        );
    }

    #[test]
    fn explicit_on_curve_splits_quadratic_runs() {
        let mut path = Path::new();
        path.move_to((0.0, 0.0));
        path.quad_to((1.0, 1.0), (2.0, 1.0));
        path.quad_to((3.0, 1.0), (4.0, 0.0));
        path.end();
        assert_eq!(
            segments(&path),
            vec![
                Segment::MoveTo(pt(0.0, 0.0)),
                Segment::QCurveTo(vec![pt(1.0, 1.0)], Some(pt(2.0, 1.0))),
                Segment::QCurveTo(vec![pt(3.0, 1.0)], Some(pt(4.0, 0.0))),
                Segment::EndPath,
            ]
        );
    }

    #[test]
    fn last_implicit_line_to() {
        let mut path = Path::new();
        let mut pen = PathPen::new(&mut path);
        pen.move_to(pt(100.0, 100.0)).unwrap();
        pen.line_to(pt(100.0, 200.0)).unwrap();
        pen.close_path().unwrap();
        drop(pen);
        assert_eq!(
            segments(&path),
            vec![
                Segment::MoveTo(pt(100.0, 100.0)),
                Segment::LineTo(pt(100.0, 200.0)),
                Segment::ClosePath,
            ]
        );
    }

    #[test]
    fn stored_closing_line_is_elided() {
        let mut path = Path::new();
        path.move_to((0.0, 0.0));
        path.line_to((1.0, 0.0));
        path.line_to((0.0, 0.0));
        path.close();
        assert_eq!(path.verbs().len(), 4);
        assert_eq!(
            segments(&path),
            vec![
                Segment::MoveTo(pt(0.0, 0.0)),
                Segment::LineTo(pt(1.0, 0.0)),
                Segment::ClosePath,
            ]
        );
    }

    #[test]
    fn almost_closed_curve_snaps_to_start() {
        let start = pt(bits2float(0x434805cb), bits2float(0x43881798));
        let end = pt(bits2float(0x434805cb), bits2float(0x43881797));
        let mut path = Path::new();
        path.move_to(start);
        path.cubic_to((210.0, 280.0), (205.0, 290.0), end);
        path.close();
        assert_ne!(path.points().last(), Some(&start));
        let segments = segments(&path);
        assert_eq!(segments.len(), 3);
        assert_eq!(
            segments[1],
            Segment::CurveTo(pt(210.0, 280.0), pt(205.0, 290.0), start)
        );
    }

    #[test]
    fn almost_closed_line_is_not_snapped() {
        let mut path = Path::new();
        path.move_to((0.0, 0.0));
        path.line_to((1.0, 0.0));
        path.line_to((0.0, 1e-6));
        path.close();
        assert_eq!(segments(&path)[2], Segment::LineTo(pt(0.0, 1e-6)));
    }

    #[test]
    fn conics_cannot_be_drawn() {
        let mut path = Path::new();
        path.move_to((0.0, 0.0));
        path.conic_to((1.0, 1.0), (2.0, 0.0), 0.5);
        path.close();
        let mut iter = path.segments();
        assert!(matches!(
            iter.next(),
            Some(Err(PathOpsError::UnsupportedVerb(_)))
        ));
        assert!(iter.next().is_none());
        assert!(path.draw(&mut RecordingPen::new()).is_err());
    }

    #[test]
    fn draw_round_trip() {
        let mut path = Path::new();
        let mut pen = PathPen::new(&mut path);
        pen.move_to(pt(0.0, 0.0)).unwrap();
        pen.line_to(pt(1.0, 2.0)).unwrap();
        pen.curve_to(pt(3.5, 4.0), pt(5.0, 6.0), pt(7.0, 8.0))
            .unwrap();
        pen.q_curve_to(&[pt(9.0, 10.0)], Some(pt(11.0, 12.0)))
            .unwrap();
        pen.close_path().unwrap();
        pen.move_to(pt(20.0, 20.0)).unwrap();
        pen.line_to(pt(30.0, 20.0)).unwrap();
        drop(pen);

        let mut copy = Path::new();
        path.draw(&mut PathPen::new(&mut copy)).unwrap();
        assert_eq!(copy, path);
        assert_eq!(copy.verbs().last(), Some(&Verb::End));
    }
}
