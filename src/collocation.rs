use std::collections::HashMap;
use crate::index::Direction;
use crate::weight::OnlineWeighter;


/// Raw context counters of one word, keyed by (direction, context id).
pub type Collocations = HashMap<(Direction, usize), f32>;

/// State of a word: still raw, or distilled into a row of the dense arena.
#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    Raw(Collocations),
    Distilled(usize),
}

/// An observation that landed on a word which has already been distilled.
/// The owner of the dense rows has to project it.
#[derive(Clone, Copy, Debug)]
pub struct Spill<'a> {
    pub row: usize,
    pub direction: Direction,
    pub context: &'a str,
    pub weight: f32,
}


/// Stable ids for every word seen, in order of first sighting.
#[derive(Clone, Debug, Default)]
pub struct Vocabulary {
    t2i: HashMap<String, usize>,
    i2t: Vec<String>,
}

impl Vocabulary {

    pub fn intern(&mut self, word: &str) -> usize {
        if let Some(i) = self.t2i.get(word) {
            return *i;
        }
        let i = self.i2t.len();
        self.t2i.insert(word.to_owned(), i);
        self.i2t.push(word.to_owned());
        i
    }

    pub fn index(&self, word: &str) -> Option<usize> {
        self.t2i.get(word).copied()
    }

    pub fn word(&self, i: usize) -> Option<&str> {
        self.i2t.get(i).map(|w| w.as_str())
    }

    pub fn len(&self) -> usize {
        self.i2t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.i2t.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.i2t
    }
}


/// Word counts and per-word collocation counters of a stream.
///
/// Only the focus role counts as an occurrence: `wordcount`, `uniq` and `total`
/// move when a word is the focus of a window, while a context word merely gets
/// an (empty) entry the first time it is seen.
#[derive(Clone, Debug)]
pub struct CollocationStore {
    pub(crate) vocab: Vocabulary,
    pub(crate) wordcount: Vec<usize>,
    pub(crate) entries: Vec<Entry>,
    uniq: usize,
    total: usize,
    weighter: OnlineWeighter,
}

impl CollocationStore {

    pub fn new(weighter: OnlineWeighter) -> CollocationStore {
        Self {
            vocab: Vocabulary::default(),
            wordcount: Vec::new(),
            entries: Vec::new(),
            uniq: 0,
            total: 0,
            weighter,
        }
    }

    fn intern(&mut self, word: &str) -> usize {
        let i = self.vocab.intern(word);
        if i == self.entries.len() {
            self.entries.push(Entry::Raw(Collocations::new()));
            self.wordcount.push(0);
        }
        i
    }

    fn count_focus(&mut self, i: usize, count: usize) {
        if count == 0 {
            return;
        }
        if self.wordcount[i] == 0 {
            self.uniq += 1;
        }
        self.wordcount[i] += count;
        self.total += count;
    }

    fn weight_of(&self, i: usize) -> f32 {
        self.weighter.weight(self.wordcount[i], self.uniq)
    }

    fn accumulate<F>(&mut self, target: usize, direction: Direction, context: usize, context_word: &str, weight: f32, spill: &mut F)
    where
        F: FnMut(Spill<'_>),
    {
        match &mut self.entries[target] {
            Entry::Raw(counts) => {
                *counts.entry((direction, context)).or_insert(0.0) += weight;
            },
            Entry::Distilled(row) => spill(Spill {
                row: *row,
                direction,
                context: context_word,
                weight,
            }),
        }
    }

    /// Registers one window: `focus` and the words to its left.
    ///
    /// The focus is counted first, so the running statistics already include
    /// it when the weights of this window are computed. Every pair updates
    /// both sides: `focus` saw `context` on its left, and `context` saw `focus`
    /// on its right.
    pub fn add_counts<S, F>(&mut self, focus: &str, contexts: &[S], mut spill: F)
    where
        S: AsRef<str>,
        F: FnMut(Spill<'_>),
    {
        let focus_i = self.intern(focus);
        self.count_focus(focus_i, 1);

        for context in contexts {
            let context = context.as_ref();
            let context_i = self.intern(context);

            let context_weight = self.weight_of(context_i);
            let focus_weight = self.weight_of(focus_i);

            self.accumulate(focus_i, Direction::Left, context_i, context, context_weight, &mut spill);
            self.accumulate(context_i, Direction::Right, focus_i, focus, focus_weight, &mut spill);
        }
    }

    /// Folds a shard built over another part of the corpus into this store by
    /// summing counts and weights entry by entry.
    pub fn merge<F>(&mut self, shard: CollocationStore, mut spill: F)
    where
        F: FnMut(Spill<'_>),
    {
        let CollocationStore { vocab, wordcount, entries, .. } = shard;

        // shard ids -> ids of this store
        let ids: Vec<usize> = vocab.words().iter().map(|word| self.intern(word)).collect();

        for (shard_i, count) in wordcount.iter().enumerate() {
            self.count_focus(ids[shard_i], *count);
        }

        for (shard_i, entry) in entries.into_iter().enumerate() {
            // a standalone store never distills, shards only hold raw counts
            if let Entry::Raw(counts) = entry {
                for ((direction, context), weight) in counts {
                    let context_word = vocab.words()[context].as_str();
                    self.accumulate(ids[shard_i], direction, ids[context], context_word, weight, &mut spill);
                }
            }
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of distinct words seen as focus.
    pub fn uniq(&self) -> usize {
        self.uniq
    }

    pub fn weighter(&self) -> &OnlineWeighter {
        &self.weighter
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn wordcount(&self, word: &str) -> usize {
        match self.vocab.index(word) {
            Some(i) => self.wordcount[i],
            None => 0,
        }
    }

    /// Current weight a new observation of `word` would receive.
    pub fn weight(&self, word: &str) -> f32 {
        let freq = self.wordcount(word);
        self.weighter.weight(freq, self.uniq)
    }

    pub fn entry(&self, word: &str) -> Option<&Entry> {
        self.vocab.index(word).map(|i| &self.entries[i])
    }

    /// Raw counters of `word` by (direction, context word), if it has not been
    /// distilled yet.
    pub fn collocation(&self, word: &str) -> Option<HashMap<(Direction, &str), f32>> {
        match self.entry(word)? {
            Entry::Raw(counts) => Some(
                counts
                    .iter()
                    .filter_map(|((direction, context), weight)| {
                        self.vocab.word(*context).map(|c| ((*direction, c), *weight))
                    })
                    .collect(),
            ),
            Entry::Distilled(_) => None,
        }
    }

    pub fn collocation_weight(&self, focus: &str, direction: Direction, context: &str) -> Option<f32> {
        let context = self.vocab.index(context)?;
        match self.entry(focus)? {
            Entry::Raw(counts) => counts.get(&(direction, context)).copied(),
            Entry::Distilled(_) => None,
        }
    }

    /// Number of distinct (direction, context) keys `word` holds raw.
    pub fn distinct_contexts(&self, word: &str) -> Option<usize> {
        match self.entry(word)? {
            Entry::Raw(counts) => Some(counts.len()),
            Entry::Distilled(_) => None,
        }
    }

    pub fn raw_len(&self) -> usize {
        self.entries.iter().filter(|e| matches!(e, Entry::Raw(_))).count()
    }
}


#[cfg(test)]
mod tests {

    use super::{CollocationStore, Entry, Spill, Vocabulary};
    use crate::index::Direction;
    use crate::weight::OnlineWeighter;

    fn store() -> CollocationStore {
        CollocationStore::new(OnlineWeighter::new(1.0).unwrap())
    }

    fn no_spill(_: Spill<'_>) {
        panic!("nothing is distilled in these tests");
    }

    #[test]
    fn vocabulary_ids_are_stable() {
        let mut vocab = Vocabulary::default();
        assert_eq!(vocab.intern("one"), 0);
        assert_eq!(vocab.intern("two"), 1);
        assert_eq!(vocab.intern("one"), 0);
        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab.word(1), Some("two"));
        assert_eq!(vocab.index("three"), None);
    }

    #[test]
    fn empty_context_only_counts() {
        let mut store = store();
        store.add_counts::<&str, _>("alone", &[], no_spill);

        assert_eq!(store.total(), 1);
        assert_eq!(store.uniq(), 1);
        assert_eq!(store.wordcount("alone"), 1);
        assert_eq!(store.distinct_contexts("alone"), Some(0));
    }

    #[test]
    fn pairs_register_both_sides() {
        let mut store = store();
        store.add_counts("f", &["c"], no_spill);

        assert!(store.collocation_weight("f", Direction::Left, "c").unwrap() > 0.0);
        assert!(store.collocation_weight("c", Direction::Right, "f").unwrap() > 0.0);

        // the context word gets an entry but is not counted
        assert_eq!(store.wordcount("c"), 0);
        assert_eq!(store.uniq(), 1);
        assert_eq!(store.total(), 1);
    }

    #[test]
    fn weights_follow_running_counts() {
        let mut store = store();
        store.add_counts("f", &["c"], no_spill);

        // f: count 1, uniq 1 -> exp(-1); c: count 0 -> 1
        let to_f = store.collocation_weight("f", Direction::Left, "c").unwrap();
        let to_c = store.collocation_weight("c", Direction::Right, "f").unwrap();
        assert_eq!(to_f, 1.0);
        assert!((to_c - (-1.0f32).exp()).abs() < 1e-6);
    }

    #[test]
    fn later_observations_weigh_less() {
        let mut store = store();
        let mut previous = 0.0;
        let mut increments = Vec::new();

        // every window counts "c" again, so "c" seen from "f" gets lighter each time
        for _ in 0..4 {
            store.add_counts("c", &["f"], no_spill);
            let weight = store.weight("c");
            let current = store.collocation_weight("f", Direction::Right, "c").unwrap();
            increments.push(current - previous);
            assert!((current - previous - weight).abs() < 1e-6);
            previous = current;
        }

        for pair in increments.windows(2) {
            assert!(pair[1] < pair[0], "{:?}", increments);
        }
        assert!(store.weight("unseen") > store.weight("c"));
    }

    #[test]
    fn repeated_contexts_accumulate() {
        let mut store = store();
        store.add_counts("f", &["c", "c"], no_spill);
        assert_eq!(store.collocation_weight("f", Direction::Left, "c"), Some(2.0));
        assert_eq!(store.distinct_contexts("f"), Some(1));
    }

    #[test]
    fn counts_are_conserved() {
        let mut store = store();
        let lines = [vec!["x", "y", "z", "x"], vec!["y"], vec!["z", "w", "x"]];
        for line in &lines {
            for i in 0..line.len() {
                let start = i.saturating_sub(2);
                store.add_counts(line[i], &line[start..i], no_spill);
            }
        }

        let sum: usize = ["x", "y", "z", "w"].iter().map(|w| store.wordcount(w)).sum();
        assert_eq!(store.total(), 8);
        assert_eq!(sum, store.total());
        assert_eq!(store.uniq(), 4);
    }

    #[test]
    fn merge_sums_shards() {

        let mut left = store();
        left.add_counts("a", &["b"], no_spill);

        let mut right = store();
        right.add_counts::<&str, _>("c", &[], no_spill);
        right.add_counts("a", &["b"], no_spill);

        let expected = left.collocation_weight("a", Direction::Left, "b").unwrap()
            + right.collocation_weight("a", Direction::Left, "b").unwrap();

        left.merge(right, no_spill);
        assert_eq!(left.total(), 3);
        assert_eq!(left.uniq(), 2);
        assert_eq!(left.wordcount("a"), 2);
        assert_eq!(left.wordcount("b"), 0);
        assert_eq!(left.collocation_weight("a", Direction::Left, "b"), Some(expected));
        assert!(matches!(left.entry("c"), Some(Entry::Raw(_))));
    }

    #[test]
    fn distilled_targets_spill() {
        let mut store = store();
        store.add_counts("f", &["c"], no_spill);
        let f = store.vocab.index("f").unwrap();
        store.entries[f] = Entry::Distilled(0);

        let mut spilled = Vec::new();
        store.add_counts("f", &["d"], |spill: Spill<'_>| {
            spilled.push((spill.row, spill.direction, spill.context.to_owned()));
        });

        assert_eq!(spilled, vec![(0, Direction::Left, "d".to_owned())]);
        assert!(store.collocation_weight("d", Direction::Right, "f").unwrap() > 0.0);
        assert_eq!(store.collocation("f"), None);
    }
}
