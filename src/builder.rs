use crate::{
    engine::{finish, GeometryEngine},
    OpOptions, Path, PathOp, PathOpsError, PlanarEngine,
};

/// Accumulates paths and combines them in insertion order.
///
/// A builder is resolved once; adding to or resolving a resolved builder is
/// an error.
#[derive(Debug, Clone)]
pub struct OpBuilder<E: GeometryEngine = PlanarEngine> {
    engine: E,
    paths: Vec<(Path, PathOp)>,
    options: OpOptions,
    resolved: bool,
}

impl OpBuilder<PlanarEngine> {
    pub fn new(fix_winding: bool, keep_starting_points: bool) -> Self {
        Self::with_engine(PlanarEngine::default(), fix_winding, keep_starting_points)
    }
}

impl Default for OpBuilder<PlanarEngine> {
    fn default() -> Self {
        let options = OpOptions::default();
        Self::new(options.fix_winding, options.keep_starting_points)
    }
}

impl<E: GeometryEngine> OpBuilder<E> {
    pub fn with_engine(engine: E, fix_winding: bool, keep_starting_points: bool) -> Self {
        OpBuilder {
            engine,
            paths: Vec::new(),
            options: OpOptions::default()
                .with_fix_winding(fix_winding)
                .with_keep_starting_points(keep_starting_points),
            resolved: false,
        }
    }

    /// Orient outer contours clockwise in the result.
    pub fn with_clockwise(mut self, clockwise: bool) -> Self {
        self.options.clockwise = clockwise;
        self
    }

    pub fn options(&self) -> &OpOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Queue `path` to be combined with everything added before it.
    pub fn add(&mut self, path: &Path, operator: PathOp) -> Result<(), PathOpsError> {
        if self.resolved {
            return Err(PathOpsError::BuilderConsumed);
        }
        // the first operand is always unioned onto nothing
        if self.paths.is_empty() && operator != PathOp::Union {
            self.paths.push((Path::new(), PathOp::Union));
        }
        self.paths.push((path.clone(), operator));
        Ok(())
    }

    /// Fold the queued paths: `result = engine(result, path, op)` for each
    /// in turn, then normalize winding and starting points.
    pub fn resolve(&mut self) -> Result<Path, PathOpsError> {
        if self.resolved {
            return Err(PathOpsError::BuilderConsumed);
        }
        if self.paths.is_empty() {
            return Err(PathOpsError::EmptyBuilder);
        }
        self.resolved = true;
        let paths = std::mem::take(&mut self.paths);
        log::debug!("resolving {} paths", paths.len());

        let first_points: Vec<_> = if self.options.keep_starting_points {
            paths.iter().flat_map(|(path, _)| path.first_points()).collect()
        } else {
            Vec::new()
        };

        let mut entries = paths.into_iter();
        let mut result = match entries.next() {
            Some((first, _)) => first,
            None => return Err(PathOpsError::EmptyBuilder),
        };
        let mut folded = false;
        for (path, operator) in entries {
            log::trace!("folding {operator:?} of {} contours", path.contour_count());
            result = self.engine.boolean(&result, &path, operator)?;
            folded = true;
        }
        if !folded {
            result = self.engine.remove_overlaps(&result)?;
        }
        finish(&self.engine, &mut result, &self.options, &first_points);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
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

    #[test]
    fn resolve_twice_fails() {
        let mut builder = OpBuilder::new(true, true);
        builder.add(&rect(0.0, 0.0, 1.0, 1.0), PathOp::Union).unwrap();
        builder.resolve().unwrap();
        assert_eq!(builder.resolve(), Err(PathOpsError::BuilderConsumed));
        assert_eq!(
            builder.add(&rect(0.0, 0.0, 1.0, 1.0), PathOp::Union),
            Err(PathOpsError::BuilderConsumed)
        );
    }

    #[test]
    fn resolve_empty_fails() {
        let mut builder = OpBuilder::default();
        assert_eq!(builder.resolve(), Err(PathOpsError::EmptyBuilder));
    }

    #[test]
    fn fold_in_insertion_order() {
        let mut builder = OpBuilder::new(true, false);
        builder.add(&rect(0.0, 0.0, 10.0, 10.0), PathOp::Union).unwrap();
        builder.add(&rect(5.0, 5.0, 15.0, 15.0), PathOp::Union).unwrap();
        builder.add(&rect(0.0, 0.0, 15.0, 7.0), PathOp::Difference).unwrap();
        assert_eq!(builder.len(), 3);
        let result = builder.resolve().unwrap();
        assert!((result.area() - (175.0 - 10.0 * 7.0 - 5.0 * 2.0)).abs() < 1e-9);
        assert_eq!(result.first_points(), vec![Point::new(0.0, 7.0)]);
    }

    #[test]
    fn leading_difference_subtracts_from_nothing() {
        let mut builder = OpBuilder::new(true, true);
        builder.add(&rect(0.0, 0.0, 10.0, 10.0), PathOp::Difference).unwrap();
        assert_eq!(builder.len(), 2);
        assert!(builder.resolve().unwrap().is_empty());
    }

    #[test]
    fn single_path_is_simplified() {
        let mut path = rect(0.0, 0.0, 10.0, 10.0);
        path.append(&rect(5.0, 5.0, 15.0, 15.0));
        let mut builder = OpBuilder::new(true, true);
        builder.add(&path, PathOp::Union).unwrap();
        let result = builder.resolve().unwrap();
        assert_eq!(result.contour_count(), 1);
        assert_eq!(result.area(), 175.0);
    }

    #[test]
    fn clockwise_results() {
        let mut builder = OpBuilder::new(true, true).with_clockwise(true);
        builder.add(&rect(0.0, 0.0, 10.0, 10.0), PathOp::Union).unwrap();
        let result = builder.resolve().unwrap();
        assert!(result.is_clockwise());
        assert_eq!(result.points()[0], Point::new(0.0, 0.0));
    }

    #[test]
    fn union_keeps_a_notched_square_and_a_spike() {
        let mut square = Path::new();
        square.move_to((5.0, -225.0));
        square.line_to((-225.0, 7425.0));
        square.line_to((7425.0, 7425.0));
        square.line_to((7425.0, -225.0));
        square.line_to((-225.0, -225.0));
        square.close();

        let mut spike = Path::new();
        spike.move_to((5940.0, 2790.0));
        spike.line_to((5940.0, 2160.0));
        spike.line_to((5970.0, 1980.0));
        spike.line_to((5688.0, 773669888.0));
        spike.line_to((5688.0, 2160.0));
        spike.line_to((5688.0, 2430.0));
        spike.line_to((5400.0, 4590.0));
        spike.line_to((5220.0, 4590.0));
        spike.line_to((5220.0, 4920.0));
        spike.cubic_to(
            (5182.22900390625, 4948.328125),
            (5160.0, 4992.78662109375),
            (5160.0, 5040.00048828125),
        );
        spike.line_to((5940.0, 2790.0));
        spike.close();

        let mut builder = OpBuilder::new(false, false);
        builder.add(&square, PathOp::Union).unwrap();
        builder.add(&spike, PathOp::Union).unwrap();
        let result = builder.resolve().unwrap();

        assert!(!result.is_empty());
        let bounds = result.bounds();
        assert_eq!(bounds.x0, -225.0);
        assert_eq!(bounds.y0, -225.0);
        assert_eq!(bounds.x1, 7425.0);
        assert!(bounds.y1 > 7425.0);
        assert!(result.area().abs() >= square.area().abs() - 1.0);
    }
}
