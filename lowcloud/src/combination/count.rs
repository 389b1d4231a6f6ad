//! Closed-form combination counting.

/// Number of combinations an exhaustive enumeration of tiles with the given
/// item counts yields, saturating at `u64::MAX`.
///
/// Ordered selections of `k` distinct tiles contribute `k! * e_k(sizes)`,
/// where `e_k` is the elementary symmetric polynomial of degree `k`.
pub fn total_combinations(sizes: &[usize]) -> u64 {
    // e[k] after processing a prefix of `sizes`.
    let mut e: Vec<u128> = vec![0; sizes.len() + 1];
    e[0] = 1;
    for (i, &size) in sizes.iter().enumerate() {
        let size = size as u128;
        for k in (1..=i + 1).rev() {
            e[k] = e[k].saturating_add(e[k - 1].saturating_mul(size));
        }
    }

    let mut total: u128 = 0;
    let mut factorial: u128 = 1;
    for (k, e_k) in e.iter().enumerate().skip(1) {
        factorial = factorial.saturating_mul(k as u128);
        total = total.saturating_add(factorial.saturating_mul(*e_k));
    }
    u64::try_from(total).unwrap_or(u64::MAX)
}
