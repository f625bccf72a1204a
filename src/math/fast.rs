//! Branch-light transcendental kernels used by the hidden layer.
//!
//! These build an IEEE-754 single directly from a polynomial-corrected
//! exponent field instead of calling into libm. The formulas and the clip
//! point at `-126` are part of the model contract: weights trained with one
//! kernel do not transfer to another.

/// Lowest exponent that still yields a valid (normal) exponent field.
const EXP2_CLIP: f32 = -126.0;

/// Approximate `2^p`.
#[inline]
pub fn fast_exp2(p: f32) -> f32 {
    let offset = if p < 0.0 { 1.0 } else { 0.0 };
    let clipp = if p < EXP2_CLIP { EXP2_CLIP } else { p };
    let w = clipp as i32;
    let z = clipp - w as f32 + offset;
    let bits = ((1u32 << 23) as f32
        * (clipp + 121.274_057_5 + 27.728_023_3 / (4.842_525_68 - z) - 1.490_129_07 * z)) as u32;
    f32::from_bits(bits)
}

/// Approximate `e^p`.
#[inline]
pub fn fast_exp(p: f32) -> f32 {
    fast_exp2(1.442_695_040 * p)
}

/// Approximate `tanh(p)` via `-1 + 2 / (1 + e^(-2p))`.
#[inline]
pub fn fast_tanh(p: f32) -> f32 {
    -1.0 + 2.0 / (1.0 + fast_exp(-2.0 * p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exp2_is_exact_at_small_integers() {
        assert_eq!(fast_exp2(0.0), 1.0);
        assert_eq!(fast_exp2(1.0), 2.0);
    }

    #[test]
    fn exp2_clips_below_minimum_exponent() {
        assert_eq!(fast_exp2(-200.0), fast_exp2(-126.0));
        assert!(fast_exp2(-126.0) > 0.0);
        assert!(fast_exp2(-126.0).is_normal());
    }

    #[test]
    fn exp_tracks_libm() {
        for i in -40..=40 {
            let p = i as f32 / 10.0;
            let rel = (fast_exp(p) - p.exp()).abs() / p.exp();
            assert!(rel < 1e-3, "p = {p}: relative error {rel}");
        }
    }

    #[test]
    fn tanh_is_zero_at_origin() {
        assert_eq!(fast_tanh(0.0), 0.0);
    }

    #[test]
    fn tanh_strictly_increasing_and_bounded_on_hidden_range() {
        let mut prev = fast_tanh(-3.0);
        assert!(prev.abs() < 1.0);
        for i in -59..=60 {
            let p = i as f32 * 0.05;
            let t = fast_tanh(p);
            assert!(t > prev, "not increasing at {p}: {t} <= {prev}");
            assert!(t.abs() < 1.0, "out of range at {p}: {t}");
            prev = t;
        }
    }

    #[test]
    fn tanh_close_to_exact() {
        for i in -30..=30 {
            let p = i as f32 / 10.0;
            assert!((fast_tanh(p) - p.tanh()).abs() < 1e-3, "p = {p}");
        }
    }
}
