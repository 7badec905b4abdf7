use crate::Path;

/// Reverse each contour of `path` independently.
///
/// Segments are visited back to front and each one is re-anchored on the
/// end point of its predecessor, so control points swap order and the MOVE
/// point becomes the last on-curve point. An implicit closing line stays
/// implicit; an explicit one (including a duplicate of the MOVE point) is
/// kept as a real segment.
pub(super) fn reverse_contours(path: &mut Path) {
    let mut contours = path.split_contours();
    for contour in contours.iter_mut() {
        contour.reverse();
    }
    *path = Path::from_contours(&contours, path.fill_type);
}
