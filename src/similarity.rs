//! File name similarity
//!
//! Names are compared case-insensitively with the normalized indel ratio
//! `2 * LCS(a, b) / (|a| + |b|)`, counted in chars. The ratio is symmetric,
//! is `1.0` only for names that are equal ignoring case, and for a fixed pair
//! of lengths falls strictly as the insert/delete edit distance grows.

/// Similarity of two names in `[0, 1]`
///
/// Two empty names are identical and score `1.0`.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    Scorer::new(a).score(b)
}

/// Scores names against one query, reusing its buffers between calls
#[derive(Debug, Clone)]
pub struct Scorer {
    /// Lower-cased query
    query: Vec<char>,
    /// Lower-cased name being scored
    name:  Vec<char>,
    /// DP row for the previous name char
    prev:  Vec<usize>,
    /// DP row for the current name char
    cur:   Vec<usize>,
}

impl Scorer {
    /// Create a scorer for `query`
    #[must_use]
    pub fn new(query: &str) -> Self {
        let query = lowered(query);
        let width = query.len() + 1;
        Self { query, name: Vec::new(), prev: vec![0; width], cur: vec![0; width] }
    }

    /// Similarity between the query and `name`
    pub fn score(&mut self, name: &str) -> f64 {
        self.load(name);
        self.ratio()
    }

    /// Similarity between the query and `name`, or `None` when it is below
    /// `cutoff`
    ///
    /// Skips the LCS table when the length difference alone rules the name
    /// out.
    pub fn score_at_least(&mut self, name: &str, cutoff: f64) -> Option<f64> {
        self.load(name);
        let shorter = self.query.len().min(self.name.len());
        let total = self.query.len() + self.name.len();
        if total > 0 && ratio_of(shorter, total) < cutoff {
            return None;
        }
        let score = self.ratio();
        (score >= cutoff).then_some(score)
    }

    fn load(&mut self, name: &str) {
        self.name.clear();
        self.name.extend(name.chars().flat_map(char::to_lowercase));
    }

    fn ratio(&mut self) -> f64 {
        let total = self.query.len() + self.name.len();
        if total == 0 {
            return 1.0;
        }
        ratio_of(self.lcs(), total)
    }

    /// Longest common subsequence of the loaded name and the query
    fn lcs(&mut self) -> usize {
        self.prev.fill(0);
        for &n in &self.name {
            self.cur[0] = 0;
            for (i, &q) in self.query.iter().enumerate() {
                self.cur[i + 1] = if q == n {
                    self.prev[i] + 1
                } else {
                    self.prev[i + 1].max(self.cur[i])
                };
            }
            std::mem::swap(&mut self.prev, &mut self.cur);
        }
        self.prev[self.query.len()]
    }
}

fn lowered(s: &str) -> Vec<char> {
    s.chars().flat_map(char::to_lowercase).collect()
}

#[allow(clippy::cast_precision_loss)]
fn ratio_of(common: usize, total: usize) -> f64 {
    (2 * common) as f64 / total as f64
}
