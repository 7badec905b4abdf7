//! Post-processing of boolean results: contour orientation by nesting depth
//! and rotation of contours back onto the inputs' starting points.

use kurbo::{BezPath, ParamCurve, Point, Shape};

use crate::{path::contour::Contour, FillType, Path};

fn closed_shape(contour: &Contour) -> BezPath {
    Path::from_contours(std::slice::from_ref(contour), FillType::NonZero).to_closed_bezpath()
}

/// A point on the contour away from its vertices.
fn probe_point(shape: &BezPath) -> Option<Point> {
    shape
        .segments()
        .find(|seg| seg.start() != seg.end())
        .map(|seg| seg.eval(0.5))
}

/// Orient every closed contour by how many other contours enclose it: outer
/// contours (even depth) run counter-clockwise, holes clockwise, or the other
/// way round when `clockwise` is set. The fill type becomes nonzero.
pub(crate) fn fix_winding(path: &mut Path, clockwise: bool) {
    let mut contours = path.split_contours();
    let shapes: Vec<BezPath> = contours.iter().map(closed_shape).collect();
    let mut flipped = 0;
    for (i, contour) in contours.iter_mut().enumerate() {
        if !contour.is_closed() {
            continue;
        }
        let area = shapes[i].area();
        let Some(probe) = probe_point(&shapes[i]) else {
            continue;
        };
        if area == 0.0 {
            continue;
        }
        let depth = shapes
            .iter()
            .enumerate()
            .filter(|(j, other)| *j != i && other.winding(probe) != 0)
            .count();
        let want_ccw = (depth % 2 == 0) != clockwise;
        if (area > 0.0) != want_ccw {
            contour.reverse();
            flipped += 1;
        }
    }
    log::trace!("fix_winding reversed {flipped} of {} contours", contours.len());
    *path = Path::from_contours(&contours, FillType::NonZero);
}

/// Rotate each closed contour so that it starts at the first of its on-curve
/// points found in `first_points`, if any.
pub(crate) fn restore_starting_points(path: &mut Path, first_points: &[Point]) {
    if first_points.is_empty() {
        return;
    }
    let mut contours = path.split_contours();
    for contour in contours.iter_mut().filter(|c| c.is_closed()) {
        let found = contour
            .on_curve_points()
            .iter()
            .position(|pt| first_points.contains(pt));
        if let Some(index) = found {
            contour.rotate_to(index);
        }
    }
    *path = Path::from_contours(&contours, path.fill_type);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rect(path: &mut Path, x0: f64, y0: f64, x1: f64, y1: f64) {
        path.move_to((x0, y0));
        path.line_to((x1, y0));
        path.line_to((x1, y1));
        path.line_to((x0, y1));
        path.close();
    }

    fn nested(outer_ccw: bool, inner_ccw: bool) -> Path {
        let mut outer = Path::new();
        rect(&mut outer, 0.0, 0.0, 10.0, 10.0);
        if !outer_ccw {
            outer.reverse();
        }
        let mut inner = Path::new();
        rect(&mut inner, 2.0, 2.0, 8.0, 8.0);
        if !inner_ccw {
            inner.reverse();
        }
        outer.append(&inner);
        outer.set_fill_type(FillType::EvenOdd);
        outer
    }

    #[test]
    fn outer_ccw_inner_cw() {
        let mut path = nested(false, false);
        fix_winding(&mut path, false);
        let areas: Vec<f64> = path.contours().map(|c| c.area()).collect();
        assert_eq!(areas, vec![100.0, -36.0]);
        assert_eq!(path.fill_type(), FillType::NonZero);
    }

    #[test]
    fn clockwise_flips_the_convention() {
        let mut path = nested(true, true);
        fix_winding(&mut path, true);
        let areas: Vec<f64> = path.contours().map(|c| c.area()).collect();
        assert_eq!(areas, vec![-100.0, 36.0]);
    }

    #[test]
    fn fixing_twice_changes_nothing() {
        let mut once = nested(false, true);
        fix_winding(&mut once, false);
        let mut twice = once.clone();
        fix_winding(&mut twice, false);
        assert_eq!(once, twice);
    }

    #[test]
    fn open_contours_are_left_alone() {
        let mut path = Path::new();
        path.move_to((0.0, 0.0));
        path.line_to((0.0, 10.0));
        path.line_to((10.0, 10.0));
        path.end();
        let before = path.clone();
        fix_winding(&mut path, false);
        assert_eq!(path.points(), before.points());
    }

    #[test]
    fn starting_points_are_restored() {
        let mut path = Path::new();
        rect(&mut path, 0.0, 0.0, 10.0, 10.0);
        restore_starting_points(&mut path, &[Point::new(10.0, 10.0)]);
        assert_eq!(path.points()[0], Point::new(10.0, 10.0));
        assert_eq!(path.points().len(), 4);

        let mut untouched = Path::new();
        rect(&mut untouched, 0.0, 0.0, 10.0, 10.0);
        let expected = untouched.clone();
        restore_starting_points(&mut untouched, &[Point::new(3.0, 3.0)]);
        assert_eq!(untouched, expected);
    }
}
