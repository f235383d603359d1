use std::{error::Error, collections::HashMap};
use ndarray::{prelude::*};
use ndarray_stats::CorrelationExt;
use tracing::warn;


/// Cosine similarity queries over a finished set of word vectors.
pub struct Similarity {
    w: Array2<f32>,
    t2i: HashMap<String, usize>,
    i2t: Vec<String>
}

/// Outcome of a synonym (TOEFL style) test.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VocabularyReport {
    pub score: f32,
    pub incorrect: Vec<String>,
    pub unknown_targets: Vec<String>,
    pub unknown_answers: Vec<String>,
}

impl Similarity {

    pub fn new(mut w: Array2<f32>, words: Vec<String>) -> Result<Similarity, Box<dyn Error>> {

        if w.nrows() != words.len() {
            return Err(format!("inconsistent number of entries in w ({}) and tokens ({})", w.nrows(), words.len()).into());
        }

        // normalize w so each row has l2 norm 1, rows of zeros stay as they are
        for mut row in w.axis_iter_mut(Axis(0)) {
            let norm = row.dot(&row).sqrt();
            if norm > 0.0 {
                row.mapv_inplace(|a| a / norm);
            }
        }

        let t2i = words.iter().enumerate().map(|(i, t)| (t.to_owned(), i)).collect();

        Ok(Self {
            w,
            t2i,
            i2t: words
        })
    }

    pub fn contains(&self, token: &str) -> bool {
        self.t2i.contains_key(token)
    }

    pub fn extract_vec_from_word(&self, token: &str) -> Result<ArrayView1<f32>, Box<dyn Error>> {
        match self.t2i.get(token) {
            Some(i) => Ok(self.w.row(*i)),
            None => Err(format!("token: {} has no vector", token).into())
        }
    }

    /// Cosine similarity of two words, `None` if either has no vector.
    pub fn sim(&self, word1: &str, word2: &str) -> Option<f32> {
        let i = self.t2i.get(word1)?;
        let j = self.t2i.get(word2)?;
        Some(self.w.row(*i).dot(&self.w.row(*j)))
    }

    pub fn find_k_most_similar(&self, vec: &ArrayView1<f32>, k: usize) -> Vec<(String, f32)> {

        // rows are unit length, only the query needs normalizing
        let norm = vec.dot(vec).sqrt();
        let scale = if norm > 0.0 { 1.0 / norm } else { 0.0 };
        let scores = self.w.dot(vec) * scale;
        let mut indexed_scores: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();

        // sort by most similar in descending order
        indexed_scores.sort_by(|(_i, s), (_j, t)| t.total_cmp(s));

        indexed_scores
            .into_iter()
            .take(k)
            .map(|(index, score)| (self.i2t[index].to_owned(), score))
            .collect()
    }

    /// The `k` nearest neighbours of `word`, leaving out the word itself.
    pub fn nns(&self, word: &str, k: usize) -> Result<Vec<(String, f32)>, Box<dyn Error>> {
        let vec = self.extract_vec_from_word(word)?;
        let neighbours = self
            .find_k_most_similar(&vec, k + 1)
            .into_iter()
            .filter(|(token, _)| token != word)
            .take(k)
            .collect();
        Ok(neighbours)
    }

    /// Spearman rank correlation between gold similarity scores and the cosine
    /// similarities of the model. Pairs with an unknown word score 0.
    pub fn similarity_test(&self, gold: &[(String, String, f32)]) -> Option<f32> {

        let model: Vec<f32> = gold.iter().map(|(word1, word2, _)| {
            self.sim(word1, word2).unwrap_or_else(|| {
                warn!(word1 = %word1, word2 = %word2, "pair not in vocabulary, scored 0");
                0.0
            })
        }).collect();
        let gold: Vec<f32> = gold.iter().map(|(_, _, score)| *score).collect();

        spearman(&gold, &model)
    }

    /// Synonym test: each item is a target followed by its alternatives, the
    /// first alternative being the right answer. The alternative most similar
    /// to the target (and above 0) is the model's pick.
    pub fn vocabulary_test(&self, items: &[Vec<String>]) -> VocabularyReport {

        let mut report = VocabularyReport::default();
        let mut correct = 0;

        for item in items {

            let (target, alternatives) = match item.split_first() {
                Some((target, alternatives)) if !alternatives.is_empty() => (target, alternatives),
                _ => {
                    warn!(?item, "synonym item needs a target and at least one alternative");
                    continue
                }
            };

            if !self.contains(target) {
                report.unknown_targets.push(target.to_owned());
                continue;
            }

            let mut winner: Option<(&str, f32)> = None;
            for (k, alternative) in alternatives.iter().enumerate() {
                match self.sim(target, alternative) {
                    Some(sim) if sim > winner.map_or(0.0, |(_, best)| best) => winner = Some((alternative.as_str(), sim)),
                    Some(_) => {},
                    None if k == 0 => report.unknown_answers.push(alternative.to_owned()),
                    None => {},
                }
            }

            match winner {
                Some((word, _)) if word == alternatives[0] => correct += 1,
                _ => report.incorrect.push(target.to_owned()),
            }
        }

        // unknown targets count as misses
        let tested = items.iter().filter(|item| item.len() > 1).count();
        if tested > 0 {
            report.score = correct as f32 / tested as f32;
        }
        report
    }
}


// average ranks, ties share the mean of the positions they occupy
fn rank(values: &[f32]) -> Vec<f64> {

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|a, b| values[*a].total_cmp(&values[*b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && values[order[end + 1]] == values[order[start]] {
            end += 1;
        }
        let shared = (start + end) as f64 / 2.0 + 1.0;
        for position in &order[start..=end] {
            ranks[*position] = shared;
        }
        start = end + 1;
    }
    ranks
}

fn spearman(x: &[f32], y: &[f32]) -> Option<f32> {

    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    // rows are the two ranked variables, columns the observations
    let mut ranked: Array2<f64> = Array2::zeros((2, x.len()));
    ranked.row_mut(0).assign(&Array1::from(rank(x)));
    ranked.row_mut(1).assign(&Array1::from(rank(y)));

    let correlation = ranked.pearson_correlation().ok()?;
    let rho = correlation[[0, 1]];
    if rho.is_nan() { None } else { Some(rho as f32) }
}


#[cfg(test)]
mod tests {

    use ndarray::array;
    use super::{rank, spearman, Similarity};

    fn similarity() -> Similarity {
        let w = array![
            [1.0, 0.0, 0.0],
            [2.0, 0.1, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 3.0],
        ];
        let words = ["car", "auto", "tree", "sky"].map(|w| w.to_string()).to_vec();
        Similarity::new(w, words).unwrap()
    }

    fn strings(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn cosine_of_words() {
        let sim = similarity();
        assert!((sim.sim("car", "car").unwrap() - 1.0).abs() < 1e-6);
        assert!(sim.sim("car", "auto").unwrap() > 0.99);
        assert_eq!(sim.sim("car", "sky"), Some(0.0));
        assert_eq!(sim.sim("car", "boat"), None);
    }

    #[test]
    fn nearest_neighbours_skip_the_word() {
        let sim = similarity();
        let nns = sim.nns("car", 2).unwrap();
        assert_eq!(nns.len(), 2);
        assert_eq!(nns[0].0, "auto");
        assert!(sim.nns("boat", 2).is_err());
    }

    #[test]
    fn mismatched_rows_are_rejected() {
        let w = array![[1.0, 0.0]];
        assert!(Similarity::new(w, strings(&["a", "b"])).is_err());
    }

    #[test]
    fn ranks_average_ties() {
        assert_eq!(rank(&[10.0, 30.0, 20.0, 20.0]), vec![1.0, 4.0, 2.5, 2.5]);
    }

    #[test]
    fn spearman_of_monotone_series() {
        let rho = spearman(&[1.0, 2.0, 3.0, 4.0], &[10.0, 20.0, 25.0, 100.0]).unwrap();
        assert!((rho - 1.0).abs() < 1e-6);
        let rho = spearman(&[1.0, 2.0, 3.0, 4.0], &[4.0, 3.0, 2.0, 1.0]).unwrap();
        assert!((rho + 1.0).abs() < 1e-6);
        assert_eq!(spearman(&[1.0], &[1.0]), None);
    }

    #[test]
    fn similarity_test_agrees_with_gold() {
        let sim = similarity();
        let gold = vec![
            ("car".to_string(), "auto".to_string(), 9.0),
            ("car".to_string(), "tree".to_string(), 2.0),
            ("tree".to_string(), "sky".to_string(), 1.0),
        ];
        // car-tree and tree-sky both have cosine 0, tied in the model ranks
        let rho = sim.similarity_test(&gold).unwrap();
        assert!(rho > 0.8);
    }

    #[test]
    fn vocabulary_test_report() {
        let sim = similarity();
        let items = vec![
            strings(&["car", "auto", "tree", "sky"]),
            strings(&["auto", "sky", "car"]),
            strings(&["boat", "car"]),
            strings(&["tree", "plant", "car"]),
        ];
        let report = sim.vocabulary_test(&items);

        assert_eq!(report.incorrect, strings(&["auto", "tree"]));
        assert_eq!(report.unknown_targets, strings(&["boat"]));
        assert_eq!(report.unknown_answers, strings(&["plant"]));
        assert!((report.score - 0.25).abs() < 1e-6);
    }
}
