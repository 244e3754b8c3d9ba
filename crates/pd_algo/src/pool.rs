//! Candidate pool for one partition.
//!
//! Positions follow the partition's ascending member order. Live candidates
//! carry their refusal weight in a cumulative (Fenwick) tree so that the
//! weighted walk "first candidate whose running sum reaches `u`" costs
//! O(log n) instead of a linear scan. Refused candidates contribute zero.
//!
//! `weight_sum` is the running sum the draw is scaled by; it is decremented by
//! exactly the removed candidate's weight on every removal.

#[derive(Clone, Debug)]
pub struct CandidatePool {
    weights: Vec<f64>,
    live: Vec<bool>,
    /// 1-based Fenwick tree over `weights` of live candidates.
    tree: Vec<f64>,
    len: usize,
    weight_sum: f64,
}

impl CandidatePool {
    /// Full pool: every member live.
    pub fn new(weights: Vec<f64>) -> Self {
        let n = weights.len();
        let mut tree = vec![0.0; n + 1];
        for (i, &w) in weights.iter().enumerate() {
            let k = i + 1;
            tree[k] += w;
            let parent = k + lowbit(k);
            if parent <= n {
                tree[parent] += tree[k];
            }
        }
        let weight_sum: f64 = weights.iter().sum();
        debug_assert!(weight_sum.is_finite(), "pool weight sum overflowed");
        Self {
            live: vec![true; n],
            weights,
            tree,
            len: n,
            weight_sum,
        }
    }

    /// Number of live candidates.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn weight_sum(&self) -> f64 {
        self.weight_sum
    }

    pub fn contains(&self, position: usize) -> bool {
        self.live.get(position).copied().unwrap_or(false)
    }

    /// Shallow removal (no propagation). Returns `false` if already removed.
    pub fn remove(&mut self, position: usize) -> bool {
        if !self.contains(position) {
            return false;
        }
        self.live[position] = false;
        self.len -= 1;
        let w = self.weights[position];
        self.weight_sum -= w;

        let n = self.weights.len();
        let mut k = position + 1;
        while k <= n {
            self.tree[k] -= w;
            k += lowbit(k);
        }
        true
    }

    /// Weighted walk: the first live position (ascending) whose cumulative
    /// weight reaches or exceeds `u`.
    ///
    /// If rounding leaves `u` above the final cumulative weight, the last live
    /// position is returned. `None` only when the pool is empty.
    pub fn select(&self, u: f64) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        let n = self.weights.len();

        // Largest prefix strictly below `u`.
        let mut idx = 0usize;
        let mut rem = u;
        let mut step = highest_power_of_two(n);
        while step > 0 {
            let next = idx + step;
            if next <= n && self.tree[next] < rem {
                idx = next;
                rem -= self.tree[next];
            }
            step >>= 1;
        }

        // `idx` is now the 0-based position where the running sum first
        // reaches `u`; refused entries weigh nothing, so skip forward to a
        // live one.
        (idx..n)
            .find(|&p| self.live[p])
            .or_else(|| (0..n).rev().find(|&p| self.live[p]))
    }

    /// Live positions, ascending.
    pub fn live_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.live
            .iter()
            .enumerate()
            .filter_map(|(p, &alive)| alive.then_some(p))
    }
}

#[inline]
fn lowbit(k: usize) -> usize {
    k & k.wrapping_neg()
}

#[inline]
fn highest_power_of_two(n: usize) -> usize {
    if n == 0 {
        0
    } else {
        1usize << (usize::BITS - 1 - n.leading_zeros())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(ws: &[f64]) -> CandidatePool {
        CandidatePool::new(ws.to_vec())
    }

    #[test]
    fn select_matches_linear_cumulative_walk() {
        let p = pool(&[1.0, 1.0, 2.0]);
        assert_eq!(p.select(0.0), Some(0));
        assert_eq!(p.select(1.0), Some(0));
        assert_eq!(p.select(1.5), Some(1));
        assert_eq!(p.select(2.0), Some(1));
        assert_eq!(p.select(2.1), Some(2));
        assert_eq!(p.select(3.99), Some(2));
    }

    #[test]
    fn select_past_the_end_falls_back_to_last_live() {
        let mut p = pool(&[1.0, 1.0, 1.0]);
        assert_eq!(p.select(10.0), Some(2));
        p.remove(2);
        assert_eq!(p.select(10.0), Some(1));
    }

    #[test]
    fn removed_candidates_are_skipped() {
        let mut p = pool(&[1.0, 0.5, 1.0, 1.0]);
        assert!(p.remove(0));
        assert_eq!(p.select(0.0), Some(1));
        assert_eq!(p.select(0.5), Some(1));
        assert_eq!(p.select(0.6), Some(2));
        assert!(p.remove(2));
        assert_eq!(p.select(0.6), Some(3));
    }

    #[test]
    fn remove_is_idempotent_and_tracks_sum() {
        let mut p = pool(&[1.0, 0.25, 0.5]);
        assert_eq!(p.weight_sum(), 1.75);
        assert!(p.remove(1));
        assert!(!p.remove(1));
        assert!(!p.remove(99));
        assert_eq!(p.len(), 2);
        assert_eq!(p.weight_sum(), 1.5);
        assert!(!p.contains(1));
        assert_eq!(p.live_positions().collect::<Vec<_>>(), [0, 2]);
    }

    #[test]
    fn empty_pool_selects_nothing() {
        let mut p = pool(&[1.0]);
        p.remove(0);
        assert!(p.is_empty());
        assert_eq!(p.select(0.0), None);
        assert_eq!(pool(&[]).select(0.0), None);
    }

    #[test]
    fn select_agrees_with_linear_scan_on_larger_pool() {
        let ws: Vec<f64> = (0..37).map(|i| 0.25 + (i % 5) as f64 * 0.5).collect();
        let mut p = pool(&ws);
        for pos in [3usize, 4, 17, 30, 36] {
            p.remove(pos);
        }
        let total: f64 = p.live_positions().map(|i| ws[i]).sum();
        for k in 0..200 {
            let u = total * k as f64 / 200.0;
            let mut acc = 0.0;
            let expected = p.live_positions().find(|&i| {
                acc += ws[i];
                acc >= u
            });
            assert_eq!(p.select(u), expected, "u = {u}");
        }
    }
}
