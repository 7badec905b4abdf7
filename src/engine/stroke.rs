use kurbo::{Cap, Join, ParamCurveNearest, PathSeg, Point, Stroke, StrokeOpts};

use crate::{path::contour::Contour, LineCap, LineJoin, Path, PathOpsError, StrokeStyle};

impl From<LineCap> for Cap {
    fn from(cap: LineCap) -> Self {
        match cap {
            LineCap::Butt => Cap::Butt,
            LineCap::Round => Cap::Round,
            LineCap::Square => Cap::Square,
        }
    }
}

impl From<LineJoin> for Join {
    fn from(join: LineJoin) -> Self {
        match join {
            LineJoin::Miter => Join::Miter,
            LineJoin::Round => Join::Round,
            LineJoin::Bevel => Join::Bevel,
        }
    }
}

/// Outline of `path` stroked with `style`. Open contours get caps, closed
/// ones joins all round. Each outline contour starts at its lowest point and
/// dashes come out in the order they occur along `path`.
pub(super) fn stroke(
    path: &Path,
    style: &StrokeStyle,
    tolerance: f64,
) -> Result<Path, PathOpsError> {
    if !(style.width.is_finite() && style.width > 0.0) {
        return Err(PathOpsError::Geometry(format!(
            "stroke width must be positive, got {}",
            style.width
        )));
    }
    if style.dash_array.iter().any(|d| !d.is_finite() || *d < 0.0) {
        return Err(PathOpsError::Geometry(format!(
            "invalid dash array {:?}",
            style.dash_array
        )));
    }
    let kurbo_style = Stroke::new(style.width)
        .with_caps(style.cap.into())
        .with_join(style.join.into())
        .with_miter_limit(style.miter_limit)
        .with_dashes(style.dash_offset, style.dash_array.iter().copied());
    let outline = kurbo::stroke(
        path.to_bezpath(),
        &kurbo_style,
        &StrokeOpts::default(),
        tolerance,
    );
    log::trace!(
        "stroked {} contours into {} elements",
        path.contour_count(),
        outline.elements().len()
    );
    let mut contours = Path::from(&outline).split_contours();
    for contour in contours.iter_mut() {
        start_at_lowest_point(contour);
    }
    if !style.dash_array.is_empty() {
        let source: Vec<PathSeg> = path.to_bezpath().segments().collect();
        let mut keyed: Vec<_> = contours
            .into_iter()
            .map(|contour| (travel_position(&contour, &source), contour))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
        contours = keyed.into_iter().map(|(_, contour)| contour).collect();
    }
    Ok(Path::from_contours(&contours, path.fill_type()))
}

/// Rotate a closed contour to begin at its lowest on-curve point, by y then
/// x.
fn start_at_lowest_point(contour: &mut Contour) {
    let lowest = contour
        .on_curve_points()
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)))
        .map(|(index, _)| index);
    if let Some(index) = lowest {
        contour.rotate_to(index);
    }
}

/// Where along the source segments an outline piece sits: the index of the
/// source segment nearest to the piece's center and the parameter on it.
fn travel_position(contour: &Contour, source: &[PathSeg]) -> (usize, f64) {
    let points = contour.on_curve_points();
    let sum = points.iter().fold(Point::ZERO, |acc, p| acc + p.to_vec2());
    let center = Point::new(sum.x / points.len() as f64, sum.y / points.len() as f64);
    source
        .iter()
        .enumerate()
        .map(|(index, seg)| (index, seg.nearest(center, 1e-9)))
        .min_by(|(_, a), (_, b)| a.distance_sq.total_cmp(&b.distance_sq))
        .map_or((0, 0.0), |(index, nearest)| (index, nearest.t))
}
