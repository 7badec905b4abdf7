use kurbo::Point;

use crate::{FillType, Path, Verb};

/// One drawing verb with its points, detached from the flat storage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Seg {
    Line(Point),
    Quad(Point, Point),
    Conic(Point, Point, f64),
    Cubic(Point, Point, Point),
}

impl Seg {
    pub(crate) fn end(&self) -> Point {
        match *self {
            Seg::Line(p) | Seg::Quad(_, p) | Seg::Conic(_, p, _) | Seg::Cubic(_, _, p) => p,
        }
    }

    /// The same segment traversed backwards, ending at `start` (the end point
    /// of the segment preceding it).
    pub(crate) fn reversed(&self, start: Point) -> Seg {
        match *self {
            Seg::Line(_) => Seg::Line(start),
            Seg::Quad(c, _) => Seg::Quad(c, start),
            Seg::Conic(c, _, w) => Seg::Conic(c, start, w),
            Seg::Cubic(c1, c2, _) => Seg::Cubic(c2, c1, start),
        }
    }
}

/// A single contour: its MOVE point, the segments after it and how it ends.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Contour {
    pub start: Point,
    pub segs: Vec<Seg>,
    /// `Close`, `End`, or `None` for an unterminated contour.
    pub terminator: Option<Verb>,
}

impl Contour {
    pub(crate) fn is_closed(&self) -> bool {
        self.terminator == Some(Verb::Close)
    }

    /// The MOVE point followed by the end point of every segment.
    pub(crate) fn on_curve_points(&self) -> Vec<Point> {
        std::iter::once(self.start)
            .chain(self.segs.iter().map(Seg::end))
            .collect()
    }

    pub(crate) fn reverse(&mut self) {
        let on_curve = self.on_curve_points();
        let Some(&last) = on_curve.last() else {
            return;
        };
        let segs = self
            .segs
            .iter()
            .zip(on_curve.iter())
            .rev()
            .map(|(seg, &start)| seg.reversed(start))
            .collect();
        self.start = last;
        self.segs = segs;
    }

    /// Rotate a closed contour so it begins at on-curve point `index` (0 is
    /// the MOVE point). The implicit closing line becomes explicit during the
    /// rotation; a closing LINE at the new seam is left implicit again.
    pub(crate) fn rotate_to(&mut self, index: usize) {
        if !self.is_closed() || index == 0 {
            return;
        }
        let closes_explicitly = self.segs.last().map(Seg::end) == Some(self.start);
        let distinct = self.segs.len() + usize::from(!closes_explicitly);
        if index >= distinct {
            return;
        }
        if !closes_explicitly {
            self.segs.push(Seg::Line(self.start));
        }
        let new_start = self.segs[index - 1].end();
        self.segs.rotate_left(index);
        if self.segs.last() == Some(&Seg::Line(new_start)) {
            self.segs.pop();
        }
        self.start = new_start;
    }

    /// Append this contour verbatim; no MOVE injection happens.
    pub(crate) fn write_into(&self, path: &mut Path) {
        path.verbs.push(Verb::Move);
        path.points.push(self.start);
        for seg in &self.segs {
            match *seg {
                Seg::Line(p) => {
                    path.verbs.push(Verb::Line);
                    path.points.push(p);
                }
                Seg::Quad(c, p) => {
                    path.verbs.push(Verb::Quad);
                    path.points.extend([c, p]);
                }
                Seg::Conic(c, p, w) => {
                    path.verbs.push(Verb::Conic);
                    path.points.extend([c, p]);
                    path.weights.push(w);
                }
                Seg::Cubic(c1, c2, p) => {
                    path.verbs.push(Verb::Cubic);
                    path.points.extend([c1, c2, p]);
                }
            }
        }
        if let Some(terminator) = self.terminator {
            path.verbs.push(terminator);
        }
    }
}

impl Path {
    /// Split the flat storage into contours. Verbs before the first MOVE
    /// cannot occur through the public API and are skipped.
    pub(crate) fn split_contours(&self) -> Vec<Contour> {
        let mut contours = Vec::new();
        let mut current: Option<Contour> = None;
        let mut points = self.points.iter().copied();
        let mut weights = self.weights.iter().copied();
        for &verb in &self.verbs {
            let mut next = || points.next().unwrap_or_default();
            match verb {
                Verb::Move => {
                    contours.extend(current.take());
                    current = Some(Contour {
                        start: next(),
                        segs: Vec::new(),
                        terminator: None,
                    });
                }
                Verb::Close | Verb::End => {
                    if let Some(mut contour) = current.take() {
                        contour.terminator = Some(verb);
                        contours.push(contour);
                    }
                }
                _ => {
                    let seg = match verb {
                        Verb::Line => Seg::Line(next()),
                        Verb::Quad => Seg::Quad(next(), next()),
                        Verb::Conic => {
                            let (c, p) = (next(), next());
                            Seg::Conic(c, p, weights.next().unwrap_or(1.0))
                        }
                        _ => Seg::Cubic(next(), next(), next()),
                    };
                    if let Some(contour) = current.as_mut() {
                        contour.segs.push(seg);
                    }
                }
            }
        }
        contours.extend(current);
        contours
    }

    pub(crate) fn from_contours(contours: &[Contour], fill_type: FillType) -> Path {
        let mut path = Path::new();
        path.set_fill_type(fill_type);
        for contour in contours {
            contour.write_into(&mut path);
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn square() -> Contour {
        Contour {
            start: Point::new(0.0, 0.0),
            segs: vec![
                Seg::Line(Point::new(10.0, 0.0)),
                Seg::Line(Point::new(10.0, 10.0)),
                Seg::Line(Point::new(0.0, 10.0)),
            ],
            terminator: Some(Verb::Close),
        }
    }

    #[test]
    fn split_and_rebuild() {
        let mut path = Path::new();
        path.move_to((0.0, 0.0));
        path.line_to((1.0, 1.0));
        path.end();
        path.move_to((5.0, 5.0));
        path.conic_to((6.0, 6.0), (7.0, 5.0), 0.5);
        path.close();
        let contours = path.split_contours();
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].terminator, Some(Verb::End));
        assert_eq!(
            contours[1].segs,
            vec![Seg::Conic(Point::new(6.0, 6.0), Point::new(7.0, 5.0), 0.5)]
        );
        assert_eq!(Path::from_contours(&contours, path.fill_type()), path);
    }

    #[test]
    fn rotation_keeps_the_closing_line_implicit() {
        let mut contour = square();
        contour.rotate_to(2);
        assert_eq!(contour.start, Point::new(10.0, 10.0));
        assert_eq!(
            contour.segs,
            vec![
                Seg::Line(Point::new(0.0, 10.0)),
                Seg::Line(Point::new(0.0, 0.0)),
                Seg::Line(Point::new(10.0, 0.0)),
            ]
        );
        let mut same = square();
        same.rotate_to(4);
        assert_eq!(same, square());
    }

    #[test]
    fn reverse_twice_is_identity() {
        let mut contour = square();
        contour.reverse();
        assert_eq!(contour.start, Point::new(0.0, 10.0));
        contour.reverse();
        assert_eq!(contour, square());
    }
}
