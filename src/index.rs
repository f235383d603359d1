use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use ndarray::{Array1, ArrayViewMut1};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use crate::error::SpaceError;


/// Side of the focus word a context word was found on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {

    // left contexts are rotated one step up, right contexts one step down
    fn shift(&self, position: usize) -> usize {
        match self {
            Direction::Left => position + 1,
            Direction::Right => position - 1,
        }
    }
}


/// Sparse signed random vector. Positions lie in `[1, dimen - 2]` so that the
/// directional shift never leaves `[0, dimen - 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexVector {
    dimen: usize,
    entries: Vec<(usize, i8)>,
}

impl IndexVector {

    /// Index vector from explicit (position, sign) pairs, for projections that
    /// do not draw their vectors from a `RandomIndexGenerator`.
    pub fn new(dimen: usize, entries: Vec<(usize, i8)>) -> Result<IndexVector, SpaceError> {
        let mut seen = HashSet::new();
        for (position, sign) in &entries {
            let in_range = *position >= 1 && *position + 2 <= dimen;
            if !in_range || !(*sign == 1 || *sign == -1) || !seen.insert(*position) {
                return Err(SpaceError::InvalidIndex { position: *position, sign: *sign, dimen });
            }
        }
        Ok(Self { dimen, entries })
    }

    pub fn dimen(&self) -> usize {
        self.dimen
    }

    pub fn entries(&self) -> &[(usize, i8)] {
        &self.entries
    }

    pub fn nonzeros(&self) -> usize {
        self.entries.len()
    }

    /// Adds `weight` times the shifted vector into `dense`, which must have
    /// the same dimensionality as this vector.
    pub fn add_to(&self, dense: &mut ArrayViewMut1<f32>, direction: Direction, weight: f32) -> Result<(), SpaceError> {
        if dense.len() != self.dimen {
            return Err(SpaceError::DimenMismatch { expected: dense.len(), found: self.dimen });
        }
        self.scatter(dense, direction, weight);
        Ok(())
    }

    fn scatter(&self, dense: &mut ArrayViewMut1<f32>, direction: Direction, weight: f32) {
        for (position, sign) in &self.entries {
            dense[direction.shift(*position)] += weight * *sign as f32;
        }
    }

    pub fn to_dense(&self, direction: Direction) -> Array1<f32> {
        let mut dense = Array1::zeros(self.dimen);
        self.scatter(&mut dense.view_mut(), direction, 1.0);
        dense
    }
}


#[derive(Clone, Copy, Debug)]
pub struct RandomIndexGenerator {
    dimen: usize,
    nonzeros: usize,
}

impl RandomIndexGenerator {

    pub fn new(dimen: usize, nonzeros: usize) -> Result<RandomIndexGenerator, SpaceError> {

        // two positions are reserved for the left/right permutation
        if dimen < 3 {
            return Err(SpaceError::DimenTooSmall(dimen));
        }
        if nonzeros == 0 {
            return Err(SpaceError::NoNonzeros);
        }
        if nonzeros > dimen - 2 {
            return Err(SpaceError::TooManyNonzeros { nonzeros, dimen });
        }

        Ok(Self { dimen, nonzeros })
    }

    pub fn dimen(&self) -> usize {
        self.dimen
    }

    pub fn nonzeros(&self) -> usize {
        self.nonzeros
    }

    /// Draws `nonzeros` distinct positions from `{0, .., dimen - 3}`, moves them
    /// up by one and gives each an independent random sign.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> IndexVector {
        let entries = sample(rng, self.dimen - 2, self.nonzeros)
            .into_iter()
            .map(|position| {
                let sign = if rng.gen_bool(0.5) { 1 } else { -1 };
                (position + 1, sign)
            })
            .collect();

        IndexVector { dimen: self.dimen, entries }
    }
}


/// Maps a word to its fixed index vector.
pub trait Projection {
    fn dimen(&self) -> usize;
    fn index_vector(&mut self, word: &str) -> IndexVector;
}

/// Draws a fresh random vector the first time a word is projected and keeps
/// it for every later call.
pub struct RandomIndex {
    generator: RandomIndexGenerator,
    rng: StdRng,
    assigned: HashMap<String, IndexVector>,
}

impl RandomIndex {

    pub fn new(generator: RandomIndexGenerator, seed: Option<u64>) -> RandomIndex {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            generator,
            rng,
            assigned: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

impl Projection for RandomIndex {

    fn dimen(&self) -> usize {
        self.generator.dimen()
    }

    fn index_vector(&mut self, word: &str) -> IndexVector {
        if let Some(index) = self.assigned.get(word) {
            return index.clone();
        }
        let index = self.generator.generate(&mut self.rng);
        self.assigned.insert(word.to_owned(), index.clone());
        index
    }
}

/// Derives each word's vector from a hash of the word and a shared seed, so
/// independent copies always agree without holding any state.
#[derive(Clone, Copy, Debug)]
pub struct HashedIndex {
    generator: RandomIndexGenerator,
    seed: u64,
}

impl HashedIndex {

    pub fn new(generator: RandomIndexGenerator, seed: u64) -> HashedIndex {
        Self { generator, seed }
    }
}

impl Projection for HashedIndex {

    fn dimen(&self) -> usize {
        self.generator.dimen()
    }

    fn index_vector(&mut self, word: &str) -> IndexVector {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        word.hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(hasher.finish());
        self.generator.generate(&mut rng)
    }
}
