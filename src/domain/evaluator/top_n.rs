//! Bounded best-first collection used to keep grid-search winners.

/// Keeps the `limit` highest-scoring items, in descending score order.
/// Ties preserve insertion order. Scores are assumed finite.
#[derive(Debug, Clone)]
pub struct TopN<T> {
    limit: usize,
    entries: Vec<(f64, T)>,
}

impl<T> TopN<T> {
    pub fn new(limit: usize) -> TopN<T> {
        TopN {
            limit,
            entries: Vec::with_capacity(limit),
        }
    }

    pub fn insert(&mut self, score: f64, item: T) {
        let at = self.entries.partition_point(|(held, _)| *held >= score);
        if at < self.limit {
            self.entries.insert(at, (score, item));
            self.entries.truncate(self.limit);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_items(self) -> Vec<T> {
        self.entries.into_iter().map(|(_, item)| item).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_the_best_in_descending_order() {
        let mut top = TopN::new(3);
        for (score, name) in [(1.0, "a"), (5.0, "b"), (3.0, "c"), (4.0, "d"), (2.0, "e")] {
            top.insert(score, name);
        }
        assert_eq!(top.into_items(), vec!["b", "d", "c"]);
    }

    #[test]
    fn holds_fewer_items_than_the_limit_when_underfilled() {
        let mut top = TopN::new(10);
        top.insert(1.0, "only");
        assert_eq!(top.len(), 1);
        assert_eq!(top.into_items(), vec!["only"]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut top = TopN::new(2);
        top.insert(1.0, "first");
        top.insert(1.0, "second");
        top.insert(1.0, "third");
        assert_eq!(top.into_items(), vec!["first", "second"]);
    }

    #[test]
    fn zero_limit_holds_nothing() {
        let mut top = TopN::new(0);
        top.insert(10.0, "best");
        assert!(top.is_empty());
    }

    #[test]
    fn evicts_the_worst_when_full() {
        let mut top = TopN::new(2);
        top.insert(1.0, "low");
        top.insert(2.0, "mid");
        top.insert(3.0, "high");
        assert_eq!(top.into_items(), vec!["high", "mid"]);
    }
}
