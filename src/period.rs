// src/period.rs
//
// Period reconciliation: find the shortest buffer length into which every
// input period tiles exactly, so mixed loops close without a click.

use crate::audio_buffer::BUFFER_CAPACITY;
use crate::error::ConfigError;

/// Greatest common divisor.
///
/// A zero operand is treated as "relatively prime": `gcd(0, b) == max(1, b)`,
/// so the result is never 0 and can always divide in [`lcm`].
pub fn gcd(a: usize, b: usize) -> usize {
    if a == 0 || b == 0 {
        return a.max(b).max(1);
    }
    let (mut a, mut b) = (a.max(b), a.min(b));
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Least common multiple, with operands below 1 treated as 1.
///
/// Divides before multiplying to keep the intermediate value small.
#[inline]
pub fn lcm(a: usize, b: usize) -> usize {
    (a.max(1) / gcd(a, b)) * b.max(1)
}

/// [`lcm`] that reports overflow instead of wrapping.
#[inline]
pub fn checked_lcm(a: usize, b: usize) -> Option<usize> {
    (a.max(1) / gcd(a, b)).checked_mul(b.max(1))
}

/// Number of samples in one cycle of `frequency` at `sample_rate`.
///
/// `round(sample_rate / frequency)`, never below 1.
pub fn period_len(frequency: f32, sample_rate: u32) -> Result<usize, ConfigError> {
    if !frequency.is_finite() || frequency <= 0.0 {
        return Err(ConfigError::InvalidFrequency { frequency });
    }
    let n = (f64::from(sample_rate) / f64::from(frequency)).round();
    if n > BUFFER_CAPACITY as f64 {
        return Err(ConfigError::PeriodTooLong {
            length: n as usize,
            capacity: BUFFER_CAPACITY,
        });
    }
    Ok((n as usize).max(1))
}

/// Fold [`lcm`] left-to-right over `periods`.
///
/// Empty periods (length 0, i.e. silent inputs) do not constrain the
/// result. Returns 0 when nothing non-empty is left.
pub fn reconcile<I>(periods: I) -> Result<usize, ConfigError>
where
    I: IntoIterator<Item = usize>,
{
    let mut acc = 0usize;
    for p in periods.into_iter().filter(|&p| p > 0) {
        acc = if acc == 0 {
            p
        } else {
            checked_lcm(acc, p).ok_or(ConfigError::PeriodOverflow)?
        };
        if acc > BUFFER_CAPACITY {
            return Err(ConfigError::PeriodTooLong {
                length: acc,
                capacity: BUFFER_CAPACITY,
            });
        }
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gcd_with_zero_is_never_zero() {
        assert_eq!(gcd(0, 0), 1);
        for n in [1usize, 2, 7, 100] {
            assert_eq!(gcd(n, 0), n.max(1));
            assert_eq!(gcd(0, n), n.max(1));
        }
    }

    #[test]
    fn gcd_is_symmetric_euclid() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(18, 12), 6);
        assert_eq!(gcd(17, 5), 1);
    }

    #[test]
    fn lcm_is_divisible_by_both_operands() {
        for a in 1..40usize {
            for b in 1..40usize {
                let m = lcm(a, b);
                assert_eq!(m % a, 0, "lcm({a}, {b}) = {m}");
                assert_eq!(m % b, 0, "lcm({a}, {b}) = {m}");
            }
        }
    }

    #[test]
    fn lcm_of_large_operands_does_not_overflow_intermediate() {
        let a = usize::MAX / 2;
        assert_eq!(lcm(a, a), a);
        assert_eq!(checked_lcm(a, a), Some(a));
    }

    #[test]
    fn reconcile_matches_pairwise_fold() {
        let (a, b, c) = (4usize, 6, 10);
        assert_eq!(reconcile([a, b, c]).unwrap(), lcm(lcm(a, b), c));
        assert_eq!(reconcile([a, b, c]).unwrap(), lcm(a, lcm(b, c)));
        assert_eq!(reconcile([a, b, c]).unwrap(), 60);
    }

    #[test]
    fn reconcile_ignores_silent_inputs() {
        assert_eq!(reconcile([0, 5, 0]).unwrap(), 5);
        assert_eq!(reconcile(std::iter::empty()).unwrap(), 0);
        assert_eq!(reconcile([0, 0]).unwrap(), 0);
    }

    #[test]
    fn reconcile_rejects_lengths_above_capacity() {
        let err = reconcile([BUFFER_CAPACITY - 1, BUFFER_CAPACITY]).unwrap_err();
        assert!(matches!(err, ConfigError::PeriodTooLong { .. }));
    }

    #[test]
    fn period_len_rounds_and_rejects_non_positive() {
        assert_eq!(period_len(441.0, 44_100).unwrap(), 100);
        assert_eq!(period_len(440.0, 44_100).unwrap(), 100);
        assert_eq!(period_len(1e9, 44_100).unwrap(), 1);
        assert!(period_len(0.0, 44_100).is_err());
        assert!(period_len(-5.0, 44_100).is_err());
        assert!(period_len(f32::NAN, 44_100).is_err());
        assert!(matches!(
            period_len(0.001, 44_100),
            Err(ConfigError::PeriodTooLong { .. })
        ));
    }
}
