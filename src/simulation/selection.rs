//! Ranking helpers: top-k selection and permutation enumeration.

use std::cmp::Ordering;

/// Returns the `k` items with the largest key, best first.
///
/// The sort is stable, so items with equal keys keep their input order.
/// NaN keys rank below every number.
pub fn top_k_by<T>(mut items: Vec<T>, k: usize, key: impl Fn(&T) -> f32) -> Vec<T> {
    items.sort_by(|a, b| descending(key(a), key(b)));
    items.truncate(k);
    items
}

fn descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}

/// Every ordering of `1..=depth`.
///
/// Built by insertion: each permutation of `1..n` yields `n` permutations of
/// `1..=n` by inserting `n` at each of its `n` positions.
pub fn permutations(depth: usize) -> Vec<Vec<usize>> {
    let mut result = Vec::new();
    extend_permutations(Vec::with_capacity(depth), depth, 1, &mut result);
    result
}

fn extend_permutations(
    prefix: Vec<usize>,
    depth: usize,
    next: usize,
    result: &mut Vec<Vec<usize>>,
) {
    if next == depth + 1 {
        result.push(prefix);
        return;
    }

    for index in 0..next {
        let mut extended = prefix.clone();
        extended.insert(index, next);
        extend_permutations(extended, depth, next + 1, result);
    }
}
