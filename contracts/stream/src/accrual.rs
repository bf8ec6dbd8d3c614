//! Release curves.
//!
//! Everything here is pure: the ledger passes in the stream terms and the
//! elapsed logical time, and gets back the cumulative amount released to the
//! recipient. Only whole intervals are credited.

use crate::storage::SCALE;
use crate::types::{CurveKind, Stream};

/// Exponent used to normalise the exponential curve (`p^n / p^10`).
const EXPONENTIAL_PIVOT: u64 = 10;

/// Cumulative amount released after `elapsed` ticks, clamped to `[0, total]`.
///
/// `curve_param` is the plain shape parameter and is ignored for `Linear`; it
/// is lifted to `SCALE` fixed point here and the scale is divided back out of
/// the result. Intermediate overflow only happens when the true value is far
/// beyond any representable cap, so it saturates to `total`.
pub fn released_amount(
    elapsed: u64,
    interval: u64,
    rate: i128,
    curve: CurveKind,
    curve_param: i128,
    total: i128,
) -> i128 {
    if interval == 0 || total <= 0 || rate <= 0 {
        return 0;
    }
    if curve != CurveKind::Linear && curve_param <= 0 {
        return 0;
    }

    let n = (elapsed / interval) as i128;
    if n == 0 {
        return 0;
    }

    let released = n.checked_mul(rate).and_then(|base| match curve {
        CurveKind::Linear => Some(base),
        CurveKind::Exponential => exponential(base, n as u64, curve_param.checked_mul(SCALE)?),
        CurveKind::Logarithmic => {
            // n*rate*(1 + n/p) == base * (n*SCALE + p*SCALE) / (p*SCALE)
            let scaled_p = curve_param.checked_mul(SCALE)?;
            let numerator = n.checked_mul(SCALE)?.checked_add(scaled_p)?;
            mul_div(base, numerator, scaled_p)
        }
        CurveKind::Sigmoid => {
            // n*rate*(n / (n + p)) == base * n*SCALE / (n*SCALE + p*SCALE)
            let scaled_p = curve_param.checked_mul(SCALE)?;
            let scaled_n = n.checked_mul(SCALE)?;
            mul_div(base, scaled_n, scaled_n.checked_add(scaled_p)?)
        }
    });

    match released {
        Some(amount) => amount.clamp(0, total),
        None => total,
    }
}

/// `base * p^n / p^10`, evaluated as a single power of `p` so the
/// normalisation never has to materialise both powers. `p` arrives in
/// `SCALE` fixed point.
fn exponential(base: i128, n: u64, p: i128) -> Option<i128> {
    if n >= EXPONENTIAL_PIVOT {
        let factor = pow_fixed(p, n - EXPONENTIAL_PIVOT)?;
        mul_div(base, factor, SCALE)
    } else {
        match pow_fixed(p, EXPONENTIAL_PIVOT - n) {
            Some(0) => None,
            Some(divisor) => mul_div(base, SCALE, divisor),
            // Divisor beyond i128 means the quotient rounds to zero.
            None => Some(0),
        }
    }
}

/// `p^exp` in fixed point. `None` on overflow.
fn pow_fixed(p: i128, mut exp: u64) -> Option<i128> {
    let mut result = SCALE;
    let mut base = p;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result.checked_mul(base)? / SCALE;
            if result == 0 {
                return Some(0);
            }
        }
        exp >>= 1;
        if exp > 0 {
            base = base.checked_mul(base)? / SCALE;
        }
    }
    Some(result)
}

/// `a * b / d` for non-negative operands, multiplying first and falling back
/// to a split evaluation when the direct product overflows.
fn mul_div(a: i128, b: i128, d: i128) -> Option<i128> {
    if d == 0 {
        return None;
    }
    match a.checked_mul(b) {
        Some(product) => Some(product / d),
        None => {
            let whole = (a / d).checked_mul(b)?;
            let frac = (a % d).checked_mul(b)? / d;
            whole.checked_add(frac)
        }
    }
}

/// Logical time that counts toward accrual at `now`.
///
/// Bounded by `end_time`, shifted by any time the stream spent paused, and
/// frozen at `paused_at` while a pause is in effect.
pub fn elapsed_at(stream: &Stream, now: u64) -> u64 {
    let clock = match stream.paused_at {
        Some(paused_at) => paused_at.min(now),
        None => now,
    };
    let bound = clock.min(stream.end_time.saturating_add(stream.paused_duration));
    bound
        .saturating_sub(stream.start_time)
        .saturating_sub(stream.paused_duration)
}

/// Cumulative release for `stream` at `now`.
pub fn released_at(stream: &Stream, now: u64) -> i128 {
    released_amount(
        elapsed_at(stream, now),
        stream.interval.ticks(),
        stream.rate_per_interval,
        stream.curve,
        stream.curve_param,
        stream.total_amount,
    )
}

/// Released but not yet withdrawn. Terminal streams have nothing available.
pub fn available_at(stream: &Stream, now: u64) -> i128 {
    if stream.status.is_terminal() {
        return 0;
    }
    (released_at(stream, now) - stream.withdrawn_amount).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOTAL: i128 = 1_000_000;

    #[test]
    fn test_linear_release() {
        assert_eq!(
            released_amount(500, 1, 1_000, CurveKind::Linear, 0, TOTAL),
            500_000
        );
        assert_eq!(
            released_amount(1_000, 1, 1_000, CurveKind::Linear, 0, TOTAL),
            TOTAL
        );
    }

    #[test]
    fn test_linear_is_capped_at_total() {
        assert_eq!(
            released_amount(5_000, 1, 1_000, CurveKind::Linear, 0, TOTAL),
            TOTAL
        );
    }

    #[test]
    fn test_partial_interval_not_credited() {
        // 119 seconds at one-minute granularity is a single interval.
        assert_eq!(
            released_amount(119, 60, 10, CurveKind::Linear, 0, TOTAL),
            10
        );
        assert_eq!(released_amount(59, 60, 10, CurveKind::Linear, 0, TOTAL), 0);
    }

    #[test]
    fn test_linear_monotonic() {
        let mut previous = 0;
        for t in 0..1_200u64 {
            let released = released_amount(t, 7, 1_000, CurveKind::Linear, 0, TOTAL);
            assert!(released >= previous);
            assert_eq!(released, core::cmp::min(TOTAL, 1_000 * (t / 7) as i128));
            previous = released;
        }
    }

    #[test]
    fn test_exponential_normalised_at_pivot() {
        // p = 2: at n = 10 the factor p^10 / p^10 is exactly one.
        let p = 2;
        assert_eq!(
            released_amount(10, 1, 100, CurveKind::Exponential, p, TOTAL),
            1_000
        );
        // n = 12: 12 * 100 * 2^2
        assert_eq!(
            released_amount(12, 1, 100, CurveKind::Exponential, p, TOTAL),
            4_800
        );
        // n = 8: 8 * 100 / 2^2
        assert_eq!(
            released_amount(8, 1, 100, CurveKind::Exponential, p, TOTAL),
            200
        );
    }

    #[test]
    fn test_exponential_overflow_saturates() {
        let p = 2;
        assert_eq!(
            released_amount(1_000, 1, 100, CurveKind::Exponential, p, TOTAL),
            TOTAL
        );
    }

    #[test]
    fn test_exponential_grows_superlinearly() {
        let p = 2;
        let a = released_amount(20, 1, 1_000, CurveKind::Exponential, p, i128::MAX);
        let b = released_amount(40, 1, 1_000, CurveKind::Exponential, p, i128::MAX);
        assert!(b > 2 * a);
    }

    #[test]
    fn test_logarithmic_formula() {
        // n = 10, p = 5: 10 * 10 * (1 + 10/5) = 300
        assert_eq!(
            released_amount(10, 1, 10, CurveKind::Logarithmic, 5, TOTAL),
            300
        );
        // n = 3, p = 2: 3 * 10 * (1 + 1.5) = 75
        assert_eq!(
            released_amount(3, 1, 10, CurveKind::Logarithmic, 2, TOTAL),
            75
        );
    }

    #[test]
    fn test_sigmoid_formula() {
        // n = 10, p = 10: 10 * 100 * (10 / 20) = 500
        assert_eq!(
            released_amount(10, 1, 100, CurveKind::Sigmoid, 10, TOTAL),
            500
        );
        // n = 30, p = 10: 30 * 100 * 0.75 = 2250
        assert_eq!(
            released_amount(30, 1, 100, CurveKind::Sigmoid, 10, TOTAL),
            2_250
        );
    }

    #[test]
    fn test_sigmoid_stays_below_linear() {
        for n in 1..200u64 {
            let sigmoid = released_amount(n, 1, 100, CurveKind::Sigmoid, 10, i128::MAX);
            let linear = released_amount(n, 1, 100, CurveKind::Linear, 0, i128::MAX);
            assert!(sigmoid < linear);
        }
    }

    #[test]
    fn test_zero_interval_and_param_release_nothing() {
        assert_eq!(released_amount(10, 0, 100, CurveKind::Linear, 0, TOTAL), 0);
        assert_eq!(
            released_amount(10, 1, 100, CurveKind::Sigmoid, 0, TOTAL),
            0
        );
    }

    #[test]
    fn test_max_values_do_not_overflow() {
        assert_eq!(
            released_amount(u64::MAX, 1, i128::MAX, CurveKind::Linear, 0, i128::MAX),
            i128::MAX
        );
        assert_eq!(
            released_amount(u64::MAX, 1, i128::MAX, CurveKind::Logarithmic, 1, i128::MAX),
            i128::MAX
        );
    }

    #[test]
    fn test_mul_div_fallback_is_exact() {
        let a = i128::MAX / 3;
        assert_eq!(mul_div(a, 6, 4), Some(a / 4 * 6 + (a % 4) * 6 / 4));
        assert_eq!(mul_div(10, 3, 0), None);
    }
}
