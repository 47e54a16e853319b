//! Queue randomization

use rand::seq::SliceRandom;
use rand::thread_rng;

/// Uniform random permutation (Fisher-Yates)
///
/// Every ordering of `items` is equally likely.
pub fn shuffle_random<T>(items: &mut [T]) {
    let mut rng = thread_rng();
    items.shuffle(&mut rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[test]
    fn preserves_all_items() {
        let mut items: Vec<u32> = (0..20).collect();
        shuffle_random(&mut items);

        let set: HashSet<u32> = items.iter().copied().collect();
        assert_eq!(set.len(), 20);
        assert!((0..20).all(|i| set.contains(&i)));
    }

    #[test]
    fn empty_and_single() {
        let mut empty: Vec<u32> = vec![];
        shuffle_random(&mut empty);
        assert!(empty.is_empty());

        let mut single = vec![7];
        shuffle_random(&mut single);
        assert_eq!(single, vec![7]);
    }

    #[test]
    fn all_orderings_reachable() {
        // 3 items have 6 orderings; 3000 draws make a miss vanishingly unlikely
        let mut seen: HashMap<Vec<u32>, usize> = HashMap::new();
        for _ in 0..3000 {
            let mut items = vec![1, 2, 3];
            shuffle_random(&mut items);
            *seen.entry(items).or_default() += 1;
        }

        assert_eq!(seen.len(), 6);
        for count in seen.values() {
            assert!(*count > 300, "ordering badly under-represented: {}", count);
        }
    }
}
