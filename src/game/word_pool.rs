use rand::{seq::SliceRandom, Rng};

/// Shuffled supply of words, each handed out at most once per game
#[derive(Debug, Default)]
pub struct WordPool {
    words: Vec<String>,
}

impl WordPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refill from `corpus` in a fresh uniformly shuffled order
    pub fn reset<R: Rng + ?Sized>(&mut self, corpus: &[String], rng: &mut R) {
        self.words = corpus.to_vec();
        self.words.shuffle(rng);
    }

    /// Remove and return the next word, `None` once the pool is exhausted
    pub fn take(&mut self) -> Option<String> {
        self.words.pop()
    }

    pub fn remaining(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    fn corpus(k: usize) -> Vec<String> {
        (0..k).map(|i| format!("word{}", i)).collect()
    }

    #[test]
    fn test_exactly_k_takes_before_empty() {
        let mut rng = StdRng::seed_from_u64(7);
        for k in [0, 1, 5, 50] {
            let mut pool = WordPool::new();
            pool.reset(&corpus(k), &mut rng);

            let mut seen = HashSet::new();
            for _ in 0..k {
                let word = pool.take().expect("pool should not be empty yet");
                assert!(seen.insert(word), "word repeated within a game");
            }
            assert_eq!(pool.take(), None);
            assert!(pool.is_empty());
            assert_eq!(seen.len(), k);
        }
    }

    #[test]
    fn test_remaining_strictly_decreases() {
        let mut pool = WordPool::new();
        pool.reset(&corpus(3), &mut StdRng::seed_from_u64(1));

        assert_eq!(pool.remaining(), 3);
        pool.take();
        assert_eq!(pool.remaining(), 2);
        pool.take();
        pool.take();
        assert_eq!(pool.remaining(), 0);
        pool.take();
        assert_eq!(pool.remaining(), 0);
    }

    #[test]
    fn test_reset_refills_after_exhaustion() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut pool = WordPool::new();
        pool.reset(&corpus(2), &mut rng);
        pool.take();
        pool.take();
        assert!(pool.is_empty());

        pool.reset(&corpus(2), &mut rng);
        assert_eq!(pool.remaining(), 2);
    }

    #[test]
    fn test_reset_does_not_modify_corpus() {
        let words = corpus(10);
        let mut pool = WordPool::new();
        pool.reset(&words, &mut StdRng::seed_from_u64(9));
        pool.take();
        assert_eq!(words, corpus(10));
    }
}
