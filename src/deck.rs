use rand::rngs::{StdRng, ThreadRng};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A term/definition unit supplied by a board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub id: String,
    pub term: String,
    pub definition: String,
}

impl Pair {
    pub fn new(id: impl Into<String>, term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            term: term.into(),
            definition: definition.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum_macros::Display)]
pub enum Side {
    Term,
    Definition,
}

/// One playable card: the text it shows and the pair it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Face {
    pub value: String,
    pub pair_id: String,
    pub side: Side,
}

/// Source of uniformly distributed values in `[0, 1)`
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;

    /// Uniform index in `[0, upper]`
    fn index_upto(&mut self, upper: usize) -> usize {
        let scaled = (self.next_unit() * (upper + 1) as f64).floor() as usize;
        scaled.min(upper)
    }
}

impl RandomSource for ThreadRng {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

impl RandomSource for StdRng {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Adapts any `FnMut() -> f64` into a random source
pub struct FnSource<F>(pub F);

impl<F: FnMut() -> f64> RandomSource for FnSource<F> {
    fn next_unit(&mut self) -> f64 {
        (self.0)()
    }
}

/// Expand pairs into term and definition faces and shuffle them in place
pub fn build_deck(pairs: &[Pair], rng: &mut dyn RandomSource) -> Vec<Face> {
    let mut faces = Vec::with_capacity(pairs.len() * 2);
    for pair in pairs {
        faces.push(Face {
            value: pair.term.clone(),
            pair_id: pair.id.clone(),
            side: Side::Term,
        });
        faces.push(Face {
            value: pair.definition.clone(),
            pair_id: pair.id.clone(),
            side: Side::Definition,
        });
    }

    shuffle(&mut faces, rng);
    faces
}

/// Fisher-Yates, walking from the last index down to 1
pub fn shuffle<T>(items: &mut [T], rng: &mut dyn RandomSource) {
    for i in (1..items.len()).rev() {
        let j = rng.index_upto(i);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn sample_pairs(n: usize) -> Vec<Pair> {
        (0..n)
            .map(|i| Pair::new(format!("p{i}"), format!("term {i}"), format!("definition {i}")))
            .collect()
    }

    #[test]
    fn test_build_deck_empty() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(build_deck(&[], &mut rng).is_empty());
    }

    #[test]
    fn test_build_deck_length_and_pair_multiplicity() {
        let mut rng = StdRng::seed_from_u64(42);
        for n in [1, 2, 5, 12] {
            let faces = build_deck(&sample_pairs(n), &mut rng);
            assert_eq!(faces.len(), 2 * n);

            let counts = faces.iter().counts_by(|f| f.pair_id.clone());
            assert_eq!(counts.len(), n);
            assert!(counts.values().all(|&c| c == 2));
        }
    }

    #[test]
    fn test_build_deck_is_a_permutation() {
        let pairs = sample_pairs(6);
        let mut unshuffled = build_deck(&pairs, &mut FnSource(|| 0.999_999));
        let mut shuffled = build_deck(&pairs, &mut StdRng::seed_from_u64(3));

        unshuffled.sort();
        shuffled.sort();
        assert_eq!(unshuffled, shuffled);
    }

    #[test]
    fn test_each_pair_has_one_term_and_one_definition() {
        let faces = build_deck(&sample_pairs(4), &mut StdRng::seed_from_u64(11));
        let mut sides: HashMap<&str, Vec<Side>> = HashMap::new();
        for face in &faces {
            sides.entry(face.pair_id.as_str()).or_default().push(face.side);
        }
        for (_, mut s) in sides {
            s.sort();
            assert_eq!(s, vec![Side::Term, Side::Definition]);
        }
    }

    #[test]
    fn test_source_near_one_keeps_order() {
        // Always picking j == i leaves the sequence untouched
        let faces = build_deck(&sample_pairs(2), &mut FnSource(|| 0.999_999));
        let values: Vec<&str> = faces.iter().map(|f| f.value.as_str()).collect();
        assert_eq!(
            values,
            vec!["term 0", "definition 0", "term 1", "definition 1"]
        );
    }

    #[test]
    fn test_source_zero_rotates() {
        // j == 0 at every step: [a, b, c, d] -> swap(3,0) -> swap(2,0) -> swap(1,0)
        let mut items = vec!['a', 'b', 'c', 'd'];
        shuffle(&mut items, &mut FnSource(|| 0.0));
        assert_eq!(items, vec!['b', 'c', 'd', 'a']);
    }

    #[test]
    fn test_index_upto_clamps() {
        let mut source = FnSource(|| 1.0);
        assert_eq!(source.index_upto(3), 3);
        let mut source = FnSource(|| 0.5);
        assert_eq!(source.index_upto(3), 2);
    }

    #[test]
    fn test_same_seed_same_deck() {
        let pairs = sample_pairs(8);
        let a = build_deck(&pairs, &mut StdRng::seed_from_u64(99));
        let b = build_deck(&pairs, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }
}
