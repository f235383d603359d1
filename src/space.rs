use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use tracing::debug;
use crate::collocation::{CollocationStore, Entry, Spill};
use crate::error::{LookupError, SpaceError};
use crate::index::{Projection, RandomIndex, RandomIndexGenerator};
use crate::weight::OnlineWeighter;


#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpaceParams {
    pub theta: f64,
    pub mincount: usize,
    pub dimen: usize,
    pub nonzeros: usize,
}

impl SpaceParams {

    pub fn generator(&self) -> Result<RandomIndexGenerator, SpaceError> {
        RandomIndexGenerator::new(self.dimen, self.nonzeros)
    }
}


/// Where a word currently stands in the word space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WordStatus {
    /// never seen, neither as focus nor as context
    Unknown,
    /// seen, still held as raw collocation counts
    Pending,
    Distilled,
}


/// A WordSpace where word usage statistics are aggregated. Raw collocation
/// counts are kept per word until the word has seen more than `mincount`
/// distinct contexts; `distill` then folds them into a dense vector through
/// the projection and frees the raw counts.
pub struct WordSpace<P: Projection> {
    projection: P,
    mincount: usize,
    store: CollocationStore,
    dense: Array2<f32>,
    rows: Vec<usize>,
}

impl WordSpace<RandomIndex> {

    /// Word space backed by persistent random index vectors.
    pub fn random(params: SpaceParams, seed: Option<u64>) -> Result<WordSpace<RandomIndex>, SpaceError> {
        let projection = RandomIndex::new(params.generator()?, seed);
        WordSpace::new(params.theta, params.mincount, projection)
    }
}

impl<P: Projection> WordSpace<P> {

    pub fn new(theta: f64, mincount: usize, projection: P) -> Result<WordSpace<P>, SpaceError> {

        // fail here rather than half way through a corpus
        let weighter = OnlineWeighter::new(theta)?;
        let dimen = projection.dimen();
        if dimen < 3 {
            return Err(SpaceError::DimenTooSmall(dimen));
        }

        Ok(Self {
            projection,
            mincount,
            store: CollocationStore::new(weighter),
            dense: Array2::zeros((0, dimen)),
            rows: Vec::new(),
        })
    }

    fn project(projection: &mut P, dense: &mut Array2<f32>, spill: Spill<'_>) -> Result<(), SpaceError> {
        let index = projection.index_vector(spill.context);
        index.add_to(&mut dense.row_mut(spill.row), spill.direction, spill.weight)
    }

    /// Adds collocation counts for one window to the word space.
    ///
    /// Words that are already distilled take the new evidence straight into
    /// their dense vector. The counts are recorded even when that projection
    /// fails; the first failure is returned.
    pub fn add_counts<S: AsRef<str>>(&mut self, focus: &str, contexts: &[S]) -> Result<(), SpaceError> {
        let WordSpace { projection, store, dense, .. } = self;
        let mut failure = None;
        store.add_counts(focus, contexts, |spill| {
            if failure.is_none() {
                failure = Self::project(projection, dense, spill).err();
            }
        });
        failure.map_or(Ok(()), Err)
    }

    /// Merges the counts of a shard into this word space.
    pub fn absorb(&mut self, shard: CollocationStore) -> Result<(), SpaceError> {
        let WordSpace { projection, store, dense, .. } = self;
        let mut failure = None;
        store.merge(shard, |spill| {
            if failure.is_none() {
                failure = Self::project(projection, dense, spill).err();
            }
        });
        failure.map_or(Ok(()), Err)
    }

    /// Distills the raw collocation of every word with more than `mincount`
    /// distinct contexts into a dense vector and frees the raw counts.
    /// Returns how many words were distilled by this call.
    pub fn distill(&mut self) -> Result<usize, SpaceError> {

        let WordSpace { projection, mincount, store, dense, rows } = self;
        let zeros: Array1<f32> = Array1::zeros(dense.ncols());
        let mut distilled = 0;

        for i in 0..store.entries.len() {

            let counts = match &store.entries[i] {
                Entry::Raw(counts) if counts.len() > *mincount => counts,
                _ => continue,
            };

            // project into a scratch row first, a failing word stays raw
            let mut vec = zeros.clone();
            for ((direction, context), weight) in counts {
                if let Some(word) = store.vocab.word(*context) {
                    projection.index_vector(word).add_to(&mut vec.view_mut(), *direction, *weight)?;
                }
            }

            let row = dense.nrows();
            dense.push_row(vec.view())?;
            store.entries[i] = Entry::Distilled(row);

            rows.push(i);
            distilled += 1;
        }

        debug!(distilled, total_distilled = rows.len(), raw = store.raw_len(), "distilled word space");
        Ok(distilled)
    }

    pub fn status(&self, word: &str) -> WordStatus {
        match self.store.entry(word) {
            None => WordStatus::Unknown,
            Some(Entry::Raw(_)) => WordStatus::Pending,
            Some(Entry::Distilled(_)) => WordStatus::Distilled,
        }
    }

    /// Dense vector of a distilled word.
    pub fn vector(&self, word: &str) -> Result<ArrayView1<'_, f32>, LookupError> {
        match self.store.entry(word) {
            None => Err(LookupError::Unknown(word.to_owned())),
            Some(Entry::Raw(_)) => Err(LookupError::Pending(word.to_owned())),
            Some(Entry::Distilled(row)) => Ok(self.dense.row(*row)),
        }
    }

    /// Distilled words with their vectors, in distillation order.
    pub fn vecs(&self) -> impl Iterator<Item = (&str, ArrayView1<'_, f32>)> + '_ {
        self.words().into_iter().zip(self.dense.rows())
    }

    /// Distilled words, aligned with the rows of `matrix`.
    pub fn words(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter_map(|i| self.store.vocab.word(*i))
            .collect()
    }

    pub fn matrix(&self) -> ArrayView2<'_, f32> {
        self.dense.view()
    }

    pub fn into_matrix(self) -> (Vec<String>, Array2<f32>) {
        let words = self.words().into_iter().map(|w| w.to_owned()).collect();
        (words, self.dense)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> usize {
        self.store.total()
    }

    /// Number of unique words this word space has seen as focus.
    pub fn get_uniq(&self) -> usize {
        self.store.uniq()
    }

    pub fn wordcount(&self, word: &str) -> usize {
        self.store.wordcount(word)
    }

    pub fn store(&self) -> &CollocationStore {
        &self.store
    }

    pub fn projection(&self) -> &P {
        &self.projection
    }

    pub fn mincount(&self) -> usize {
        self.mincount
    }

    pub fn dimen(&self) -> usize {
        self.dense.ncols()
    }
}
