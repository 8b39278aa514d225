//! Helpers for decoders mapping genes from `[0, 1]` to problem domains.
//!
//! A [`Problem`](crate::problem::Problem) only ever sees genes inside the
//! unit interval, so these functions do not range-check their input.

/// Maps a gene linearly onto `[low, high]`.
///
/// ```
/// use u_metaopt::genotype::value_in;
///
/// assert_eq!(value_in(0.5, -10.0, 10.0), 0.0);
/// ```
pub fn value_in(gene: f64, low: f64, high: f64) -> f64 {
    low + gene * (high - low)
}

/// Maps a gene onto the integers `low..=high`.
///
/// Every integer gets an equal share of the unit interval; a gene of
/// exactly `1.0` maps to `high`.
pub fn int_in(gene: f64, low: i64, high: i64) -> i64 {
    let span = (high - low + 1) as f64;
    let offset = (gene * span).floor() as i64;
    (low + offset).min(high)
}

/// Picks an element of `items` by gene, or `None` when `items` is empty.
pub fn pick<T>(gene: f64, items: &[T]) -> Option<&T> {
    if items.is_empty() {
        return None;
    }
    let index = int_in(gene, 0, items.len() as i64 - 1);
    items.get(index as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_in_endpoints() {
        assert_eq!(value_in(0.0, 2.0, 4.0), 2.0);
        assert_eq!(value_in(1.0, 2.0, 4.0), 4.0);
        assert_eq!(value_in(0.25, 2.0, 4.0), 2.5);
    }

    #[test]
    fn test_int_in_buckets() {
        assert_eq!(int_in(0.0, 1, 4), 1);
        assert_eq!(int_in(0.24, 1, 4), 1);
        assert_eq!(int_in(0.25, 1, 4), 2);
        assert_eq!(int_in(0.99, 1, 4), 4);
        assert_eq!(int_in(1.0, 1, 4), 4);
    }

    #[test]
    fn test_pick() {
        let items = ["a", "b", "c"];
        assert_eq!(pick(0.0, &items), Some(&"a"));
        assert_eq!(pick(0.5, &items), Some(&"b"));
        assert_eq!(pick(1.0, &items), Some(&"c"));
        assert_eq!(pick::<u8>(0.5, &[]), None);
    }
}
