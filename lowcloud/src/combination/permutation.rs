//! Lazy k-permutations of `0..n` in lexicographic order.

/// Iterator over ordered selections of `k` distinct indices from `0..n`.
///
/// Yields in lexicographic order, e.g. for `n = 3, k = 2`:
/// `[0,1] [0,2] [1,0] [1,2] [2,0] [2,1]`. Only the current selection is held
/// in memory.
#[derive(Debug, Clone)]
pub(crate) struct KPermutations {
    n: usize,
    k: usize,
    indices: Vec<usize>,
    used: Vec<bool>,
    started: bool,
    done: bool,
}

impl KPermutations {
    pub(crate) fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            k,
            indices: Vec::with_capacity(k),
            used: vec![false; n],
            started: false,
            done: k == 0 || k > n,
        }
    }

    fn advance(&mut self) -> bool {
        for pos in (0..self.k).rev() {
            let current = self.indices[pos];
            self.used[current] = false;

            if let Some(next) = (current + 1..self.n).find(|&v| !self.used[v]) {
                self.indices[pos] = next;
                self.used[next] = true;

                let mut fill = 0;
                for slot in pos + 1..self.k {
                    while self.used[fill] {
                        fill += 1;
                    }
                    self.indices[slot] = fill;
                    self.used[fill] = true;
                }
                return true;
            }
        }
        false
    }
}

impl Iterator for KPermutations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            self.indices.extend(0..self.k);
            for &i in &self.indices {
                self.used[i] = true;
            }
            return Some(self.indices.clone());
        }
        if self.advance() {
            Some(self.indices.clone())
        } else {
            self.done = true;
            None
        }
    }
}
