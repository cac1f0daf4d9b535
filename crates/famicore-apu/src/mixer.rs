//! The console's nonlinear mixer.
//!
//! ```text
//! pulse_out = 95.88 / (8128 / (p1 + p2) + 100)
//! tnd_out   = 159.79 / (1 / (t/8227 + n/12241 + d/22638) + 100)
//! ```
//!
//! Both groups are zero when their channel sum is zero. The combined
//! output lies in [0, 1), well inside the [-1, 1] sample contract.

/// Pulse group contribution.
fn pulse_out(p1: u8, p2: u8) -> f32 {
    let sum = f32::from(p1) + f32::from(p2);
    if sum == 0.0 {
        0.0
    } else {
        95.88 / (8128.0 / sum + 100.0)
    }
}

/// Triangle/noise/DMC group contribution.
fn tnd_out(t: u8, n: u8, d: u8) -> f32 {
    let sum = f32::from(t) / 8227.0 + f32::from(n) / 12241.0 + f32::from(d) / 22638.0;
    if sum == 0.0 {
        0.0
    } else {
        159.79 / (1.0 / sum + 100.0)
    }
}

/// Mix the five raw channel levels into one sample.
#[must_use]
pub fn mix(p1: u8, p2: u8, t: u8, n: u8, d: u8) -> f32 {
    pulse_out(p1, p2) + tnd_out(t, n, d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_is_exactly_zero() {
        assert_eq!(mix(0, 0, 0, 0, 0), 0.0);
    }

    #[test]
    fn output_bounded() {
        let max = mix(15, 15, 15, 15, 127);
        assert!(max > 0.0 && max < 1.0);
    }

    #[test]
    fn pulse_formula_value() {
        // p1 + p2 = 15: 95.88 / (8128/15 + 100) = 0.14929...
        let value = mix(15, 0, 0, 0, 0);
        assert!((value - 0.149).abs() < 0.001);
    }

    #[test]
    fn monotonic_in_each_channel() {
        assert!(mix(8, 0, 0, 0, 0) < mix(9, 0, 0, 0, 0));
        assert!(mix(0, 0, 4, 0, 0) < mix(0, 0, 5, 0, 0));
        assert!(mix(0, 0, 0, 0, 60) < mix(0, 0, 0, 0, 80));
    }
}
