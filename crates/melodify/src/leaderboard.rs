//! Final scores of finished rounds, best first. Not persisted.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Leaderboard {
    scores: Vec<u64>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `score`, keeping the list sorted descending. Returns its rank,
    /// zero-based; ties rank below earlier equal scores.
    pub fn record(&mut self, score: u64) -> usize {
        let rank = self.scores.partition_point(|&s| s >= score);
        self.scores.insert(rank, score);
        rank
    }

    pub fn scores(&self) -> &[u64] {
        &self.scores
    }

    pub fn top(&self, n: usize) -> &[u64] {
        &self.scores[..n.min(self.scores.len())]
    }

    pub fn best(&self) -> Option<u64> {
        self.scores.first().copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kept_sorted_descending() {
        let mut board = Leaderboard::new();
        assert_eq!(board.record(30), 0);
        assert_eq!(board.record(50), 0);
        assert_eq!(board.record(10), 2);
        assert_eq!(board.record(30), 2);
        assert_eq!(board.scores(), &[50, 30, 30, 10]);
        assert_eq!(board.best(), Some(50));
        assert_eq!(board.top(2), &[50, 30]);
        assert_eq!(board.top(10).len(), 4);
    }

    #[test]
    fn empty_board() {
        let board = Leaderboard::new();
        assert_eq!(board.best(), None);
        assert!(board.top(3).is_empty());
    }
}
