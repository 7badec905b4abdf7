use kurbo::Point;

/// Per-axis tolerance of the "almost equal" point relation (Skia's
/// `SK_ScalarNearlyZero`).
pub const TOLERANCE: f64 = 1.0 / 4096.0;

/// True when both coordinates differ by no more than [`TOLERANCE`].
///
/// Only the emission heuristics use this; `Point` equality stays exact.
pub fn points_almost_equal(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() <= TOLERANCE && (a.y - b.y).abs() <= TOLERANCE
}

/// Bit pattern of `value` as an IEEE single-precision float.
pub fn float2bits(value: f64) -> u32 {
    (value as f32).to_bits()
}

/// Inverse of [`float2bits`]. Negative inputs are taken as their two's
/// complement 32-bit pattern, so `-0x3ee00000` decodes like `0xc1200000`.
pub fn bits2float(bits: i64) -> f64 {
    f32::from_bits(bits as u32) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_bits() {
        assert_eq!(float2bits(17.5), 0x418c0000);
        assert_eq!(float2bits(-10.0), 0xc1200000);
        assert_eq!(bits2float(0x418c0000), 17.5);
        assert_eq!(bits2float(0xc1200000), -10.0);
        assert_eq!(bits2float(-0x3ee00000), -10.0);
    }

    #[test]
    fn one_ulp_apart_is_almost_equal() {
        let a = Point::new(bits2float(0x434805cb), bits2float(0x43881798));
        let b = Point::new(bits2float(0x434805cb), bits2float(0x43881797));
        assert_ne!(a, b);
        assert!(points_almost_equal(a, b));
        assert!(!points_almost_equal(a, Point::new(a.x, a.y + 0.01)));
    }
}
