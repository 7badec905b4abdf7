//! Rational quadratic (conic) approximation by ordinary quadratics, using the
//! same power-of-two subdivision as Skia's `SkConic::chopIntoQuadsPOW2`.

use kurbo::Point;

const MAX_CONIC_TO_QUAD_POW2: u32 = 5;

#[derive(Debug, Clone, Copy)]
struct Conic {
    p0: Point,
    p1: Point,
    p2: Point,
    w: f64,
}

impl Conic {
    /// How many times the conic must be halved before every half is within
    /// `tolerance` of its control-polygon quad.
    fn quad_pow2(&self, tolerance: f64) -> u32 {
        if !(tolerance >= 0.0)
            || !tolerance.is_finite()
            || ![self.p0, self.p1, self.p2].iter().all(|p| p.is_finite())
        {
            return 0;
        }
        let a = self.w - 1.0;
        let k = a / (4.0 * (2.0 + a));
        let x = k * (self.p0.x - 2.0 * self.p1.x + self.p2.x);
        let y = k * (self.p0.y - 2.0 * self.p1.y + self.p2.y);
        let mut error = x.hypot(y);
        let mut pow2 = 0;
        while pow2 < MAX_CONIC_TO_QUAD_POW2 {
            if error <= tolerance {
                break;
            }
            error *= 0.25;
            pow2 += 1;
        }
        pow2
    }

    /// Split at t = 0.5.
    fn chop(&self) -> (Conic, Conic) {
        let scale = 1.0 / (1.0 + self.w);
        let new_w = (0.5 + self.w * 0.5).sqrt();
        let wp1 = self.p1.to_vec2() * self.w;
        let m = ((self.p0.to_vec2() + wp1 * 2.0 + self.p2.to_vec2()) * scale * 0.5).to_point();
        let left = Conic {
            p0: self.p0,
            p1: ((self.p0.to_vec2() + wp1) * scale).to_point(),
            p2: m,
            w: new_w,
        };
        let right = Conic {
            p0: m,
            p1: ((wp1 + self.p2.to_vec2()) * scale).to_point(),
            p2: self.p2,
            w: new_w,
        };
        (left, right)
    }

    fn subdivide(&self, level: u32, out: &mut Vec<(Point, Point)>) {
        if level == 0 {
            out.push((self.p1, self.p2));
            return;
        }
        let (mut left, mut right) = self.chop();
        // keep y-monotonic halves monotonic after rounding
        let (y0, y1, y2) = (self.p0.y, self.p1.y, self.p2.y);
        if between(y0, y1, y2) {
            let mid_y = left.p2.y;
            if !between(y0, mid_y, y2) {
                let closer = if (mid_y - y0).abs() < (mid_y - y2).abs() {
                    y0
                } else {
                    y2
                };
                left.p2.y = closer;
                right.p0.y = closer;
            }
            if !between(y0, left.p1.y, left.p2.y) {
                left.p1.y = y0;
            }
            if !between(right.p0.y, right.p1.y, y2) {
                right.p1.y = y2;
            }
        }
        left.subdivide(level - 1, out);
        right.subdivide(level - 1, out);
    }
}

fn between(a: f64, b: f64, c: f64) -> bool {
    (a - b) * (c - b) <= 0.0
}

/// Approximate the conic `p0, p1, p2` with weight `w` by quadratic curves,
/// returned as `(control, end)` pairs. The last end point is always `p2`.
pub(crate) fn conic_to_quads(
    p0: Point,
    p1: Point,
    p2: Point,
    w: f64,
    tolerance: f64,
) -> Vec<(Point, Point)> {
    let conic = Conic { p0, p1, p2, w };
    let pow2 = conic.quad_pow2(tolerance);
    let mut quads = Vec::with_capacity(1 << pow2);
    conic.subdivide(pow2, &mut quads);
    quads
}
