use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Word;

/// How words are lined up for a review sitting.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReviewMode {
    /// Uniform random permutation.
    #[default]
    Shuffle,
    /// Less familiar words tend to come first.
    Weighted,
    /// Newest first, as the store returns them.
    Recent,
}

impl ReviewMode {
    pub fn order<R: Rng + ?Sized>(self, words: &[Word], rng: &mut R) -> Vec<usize> {
        match self {
            ReviewMode::Shuffle => shuffle_order(words.len(), rng),
            ReviewMode::Weighted => {
                let weights: Vec<f64> = words.iter().map(Word::weight).collect();
                weighted_order(&weights, rng)
            }
            ReviewMode::Recent => (0..words.len()).collect(),
        }
    }

    /// Whether running off the end starts over instead of exhausting the sitting.
    pub fn wraps(self) -> bool {
        self == ReviewMode::Recent
    }
}

pub fn shuffle_order<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);
    order
}

/// Weighted sampling without replacement.
///
/// Each draw picks among the remaining indices with probability proportional
/// to their weight. Once the remaining weight is zero (or not finite) the rest
/// follow in uniform random order, so zero-weight entries always come last.
/// Each draw rescans the remaining pool, O(n²) overall.
pub fn weighted_order<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Vec<usize> {
    let weight = |i: usize| weights[i].max(0.0);
    let mut remaining: Vec<usize> = (0..weights.len()).collect();
    let mut order = Vec::with_capacity(weights.len());

    while !remaining.is_empty() {
        let sum: f64 = remaining.iter().map(|&i| weight(i)).sum();
        if !sum.is_finite() || sum <= 0.0 {
            remaining.shuffle(rng);
            order.append(&mut remaining);
            break;
        }

        // rounding can leave `target` just past the last bucket
        let Some(mut pick) = remaining.iter().rposition(|&i| weight(i) > 0.0) else {
            break;
        };
        let mut target = rng.gen::<f64>() * sum;
        for (pos, &i) in remaining.iter().enumerate() {
            let w = weight(i);
            if w <= 0.0 {
                continue;
            }
            if target < w {
                pick = pos;
                break;
            }
            target -= w;
        }
        order.push(remaining.remove(pick));
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::word;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn is_permutation(order: &[usize], n: usize) -> bool {
        let mut sorted = order.to_vec();
        sorted.sort_unstable();
        sorted == (0..n).collect::<Vec<_>>()
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let order = shuffle_order(20, &mut rng);
        assert!(is_permutation(&order, 20));
    }

    #[test]
    fn zero_weight_never_first_but_always_present() {
        let weights = [0.0, 0.5, 1.0, 0.2];
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let order = weighted_order(&weights, &mut rng);
            assert!(is_permutation(&order, weights.len()));
            assert_ne!(order[0], 0);
            assert_eq!(*order.last().unwrap(), 0);
        }
    }

    #[test]
    fn all_zero_weights_fall_back_to_uniform() {
        let mut rng = StdRng::seed_from_u64(3);
        let order = weighted_order(&[0.0; 6], &mut rng);
        assert!(is_permutation(&order, 6));
    }

    #[test]
    fn non_finite_weights_fall_back() {
        let mut rng = StdRng::seed_from_u64(3);
        let order = weighted_order(&[f64::INFINITY, 1.0, f64::NAN], &mut rng);
        assert!(is_permutation(&order, 3));
    }

    #[test]
    fn heavier_words_tend_to_come_first() {
        let weights = [0.05, 1.0];
        let mut heavy_first = 0;
        for seed in 0..500 {
            let mut rng = StdRng::seed_from_u64(seed);
            if weighted_order(&weights, &mut rng)[0] == 1 {
                heavy_first += 1;
            }
        }
        assert!(heavy_first > 400, "heavy word first only {heavy_first} times");
    }

    #[test]
    fn recent_keeps_store_order() {
        let words = vec![word(3, "c", 0, None), word(2, "b", 0, None), word(1, "a", 0, None)];
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(ReviewMode::Recent.order(&words, &mut rng), vec![0, 1, 2]);
        assert!(ReviewMode::Recent.wraps());
        assert!(!ReviewMode::Weighted.wraps());
    }

    #[test]
    fn weighted_mode_uses_familiarity() {
        // word 0 is fully known and must come last
        let words = vec![word(1, "known", 5, Some(0)), word(2, "new", 0, None), word(3, "mid", 1, Some(1))];
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let order = ReviewMode::Weighted.order(&words, &mut rng);
            assert_eq!(order[2], 0);
        }
    }
}
