//! Pen-to-pen boolean operations over collections of contours.
//!
//! Each side is drawn into a scratch [`Path`], combined through an
//! [`OpBuilder`] and the result is drawn into the output pen.

use crate::{Draw, OpBuilder, OpOptions, Path, PathOp, PathOpsError, PathPen, Pen};

fn draw_all<D: Draw>(contours: impl IntoIterator<Item = D>) -> Result<Path, PathOpsError> {
    let mut path = Path::new();
    let mut pen = PathPen::new(&mut path);
    for contour in contours {
        contour.draw(&mut pen)?;
    }
    drop(pen);
    Ok(path)
}

fn builder(options: &OpOptions) -> OpBuilder {
    OpBuilder::new(options.fix_winding, options.keep_starting_points)
        .with_clockwise(options.clockwise)
}

/// Merge overlapping contours. An empty collection draws nothing.
pub fn union<D: Draw>(
    contours: impl IntoIterator<Item = D>,
    out: &mut dyn Pen,
    options: &OpOptions,
) -> Result<(), PathOpsError> {
    let path = draw_all(contours)?;
    if path.is_empty() {
        return Ok(());
    }
    let mut builder = builder(options);
    builder.add(&path, PathOp::Union)?;
    builder.resolve()?.draw(out)
}

fn boolean<S: Draw, C: Draw>(
    subject: impl IntoIterator<Item = S>,
    clip: impl IntoIterator<Item = C>,
    operator: PathOp,
    out: &mut dyn Pen,
    options: &OpOptions,
) -> Result<(), PathOpsError> {
    let subject = draw_all(subject)?;
    let clip = draw_all(clip)?;
    let mut builder = builder(options);
    builder.add(&subject, PathOp::Union)?;
    builder.add(&clip, operator)?;
    builder.resolve()?.draw(out)
}

/// Subject minus clip.
pub fn difference<S: Draw, C: Draw>(
    subject: impl IntoIterator<Item = S>,
    clip: impl IntoIterator<Item = C>,
    out: &mut dyn Pen,
    options: &OpOptions,
) -> Result<(), PathOpsError> {
    boolean(subject, clip, PathOp::Difference, out, options)
}

pub fn intersection<S: Draw, C: Draw>(
    subject: impl IntoIterator<Item = S>,
    clip: impl IntoIterator<Item = C>,
    out: &mut dyn Pen,
    options: &OpOptions,
) -> Result<(), PathOpsError> {
    boolean(subject, clip, PathOp::Intersection, out, options)
}

/// Areas covered by exactly one side.
pub fn xor<S: Draw, C: Draw>(
    subject: impl IntoIterator<Item = S>,
    clip: impl IntoIterator<Item = C>,
    out: &mut dyn Pen,
    options: &OpOptions,
) -> Result<(), PathOpsError> {
    boolean(subject, clip, PathOp::Xor, out, options)
}

/// Clip minus subject.
pub fn reverse_difference<S: Draw, C: Draw>(
    subject: impl IntoIterator<Item = S>,
    clip: impl IntoIterator<Item = C>,
    out: &mut dyn Pen,
    options: &OpOptions,
) -> Result<(), PathOpsError> {
    boolean(subject, clip, PathOp::ReverseDifference, out, options)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{RecordingPen, Segment};
    use kurbo::Point;
    use pretty_assertions::assert_eq;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Path {
        let mut path = Path::new();
        path.move_to((x0, y0));
        path.line_to((x1, y0));
        path.line_to((x1, y1));
        path.line_to((x0, y1));
        path.close();
        path
    }

    fn pt(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn empty_union_draws_nothing() {
        let mut out = RecordingPen::new();
        union(Vec::<Path>::new(), &mut out, &OpOptions::default()).unwrap();
        assert!(out.segments.is_empty());
    }

    #[test]
    fn intersection_of_squares() {
        let mut out = RecordingPen::new();
        intersection(
            [rect(0.0, 0.0, 10.0, 10.0)],
            [rect(5.0, 5.0, 15.0, 15.0)],
            &mut out,
            &OpOptions::default(),
        )
        .unwrap();
        assert_eq!(
            out.segments,
            vec![
                Segment::MoveTo(pt(5.0, 5.0)),
                Segment::LineTo(pt(10.0, 5.0)),
                Segment::LineTo(pt(10.0, 10.0)),
                Segment::LineTo(pt(5.0, 10.0)),
                Segment::ClosePath,
            ]
        );
    }

    #[test]
    fn union_of_a_single_contour_is_simplify() {
        let mut path = rect(0.0, 0.0, 10.0, 10.0);
        path.append(&rect(5.0, 5.0, 15.0, 15.0));
        let mut out = RecordingPen::new();
        union([&path], &mut out, &OpOptions::default()).unwrap();

        let mut simplified = path.clone();
        simplified.simplify(&OpOptions::default()).unwrap();
        let mut expected = RecordingPen::new();
        simplified.draw(&mut expected).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn difference_and_reverse_difference_mirror() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(5.0, 0.0, 15.0, 10.0);
        let options = OpOptions::default();

        let mut left = Path::new();
        difference([&a], [&b], &mut PathPen::new(&mut left), &options).unwrap();
        let mut right = Path::new();
        reverse_difference([&b], [&a], &mut PathPen::new(&mut right), &options).unwrap();
        assert_eq!(left, right);
        assert_eq!(left.area(), 50.0);

        let mut both = Path::new();
        xor([&a], [&b], &mut PathPen::new(&mut both), &options).unwrap();
        assert_eq!(both.area(), 100.0);
        assert_eq!(both.contour_count(), 2);
    }

    #[test]
    fn recorded_contours_can_be_combined() {
        let mut recording = RecordingPen::new();
        rect(0.0, 0.0, 10.0, 10.0).draw(&mut recording).unwrap();
        let mut out = Path::new();
        union([&recording], &mut PathPen::new(&mut out), &OpOptions::default()).unwrap();
        assert_eq!(out.area(), 100.0);
    }
}
