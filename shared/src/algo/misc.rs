//! Guarded arithmetic and shot filtering utilities.

/// Divides `numerator` by `denominator`, returning `0.0` when the result
/// would be undefined (zero denominator, NaN or infinite operands/result).
///
/// # Examples
///
/// ```rust
/// use shared::algo::misc::safe_div;
///
/// assert_eq!(safe_div(6.0, 3.0), 2.0);
/// assert_eq!(safe_div(1.0, 0.0), 0.0);
/// ```
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let result = numerator / denominator;
    if result.is_finite() {
        result
    } else {
        0.0
    }
}

/// Keeps the values whose corresponding flag is `false`.
///
/// Used to drop readings flagged as bad (e.g. dropped shots) before
/// averaging. Values without a matching flag are kept.
pub fn skim<T: Copy>(values: &[T], rejected: &[bool]) -> Vec<T> {
    values
        .iter()
        .enumerate()
        .filter(|(i, _)| !rejected.get(*i).copied().unwrap_or(false))
        .map(|(_, v)| *v)
        .collect()
}
