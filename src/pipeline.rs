// imports
use crate::collocation::CollocationStore;
use crate::config::{files_handling, Config, JsonParams};
use crate::error::SpaceError;
use crate::index::{HashedIndex, Projection, RandomIndex};
use crate::reduce;
use crate::space::WordSpace;
use crate::weight::OnlineWeighter;
use crate::window::{left_windows, words};

use std::env;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::time::Instant;
use ndarray::Array2;
use rayon::{prelude::*, ThreadPoolBuilder};
use tracing::{debug, info};

pub struct Pipeline {}

impl Pipeline {

    // runs the main procedure of 3 steps -
    // -> configuration of arguments
    // -> streaming the corpus into a word space
    // -> (optional pruning and) saving the distilled vectors

    fn read_file(file_path: &str) -> Result<Lines<BufReader<File>>, Box<dyn Error>> {
        let f = File::open(file_path)?;
        Ok(io::BufReader::new(f).lines())
    }

    fn add_line<P: Projection>(line: &str, size: usize, wordspace: &mut WordSpace<P>) -> Result<(), SpaceError> {
        let tokens = words(line);
        for (focus, left_context) in left_windows(&tokens, size) {
            wordspace.add_counts(focus, left_context)?;
        }
        Ok(())
    }

    /// Adds the contents of `infile` to the word space with context windows of
    /// `size` words. Distills every `distill_every` lines (never in between if
    /// 0) and once more at the end. Returns the number of lines read.
    pub fn dsm<P: Projection>(infile: &str, size: usize, wordspace: &mut WordSpace<P>, distill_every: usize) -> Result<usize, Box<dyn Error>> {

        let mut n_lines = 0;
        for line in Pipeline::read_file(infile)? {
            Pipeline::add_line(&line?, size, wordspace)?;
            n_lines += 1;

            // distilling on the way keeps the raw counts from piling up
            if distill_every > 0 && n_lines % distill_every == 0 {
                let distilled = wordspace.distill()?;
                info!(lines = n_lines, distilled, vectors = wordspace.len(), raw = wordspace.store().raw_len(), "periodic distillation");
            }
        }

        wordspace.distill()?;
        info!(lines = n_lines, tokens = wordspace.total(), uniq = wordspace.get_uniq(), vectors = wordspace.len(), "finished corpus");
        Ok(n_lines)
    }

    fn count_shard(lines: &[String], size: usize, weighter: OnlineWeighter) -> CollocationStore {

        // the shard sees only its own lines, weights follow its local counts
        let mut store = CollocationStore::new(weighter);
        for line in lines {
            let tokens = words(line);
            for (focus, left_context) in left_windows(&tokens, size) {
                store.add_counts(focus, left_context, |_| {});
            }
        }
        store
    }

    /// Like `dsm`, but splits the corpus into `num_shards` consecutive parts
    /// counted on separate threads. The shard counts are summed into the word
    /// space before it is distilled, so the whole corpus is held in memory and
    /// there is no periodic distillation.
    pub fn dsm_sharded<P: Projection>(infile: &str, size: usize, wordspace: &mut WordSpace<P>, num_shards: usize) -> Result<usize, Box<dyn Error>> {

        let lines = Pipeline::read_file(infile)?.collect::<Result<Vec<String>, io::Error>>()?;
        let num_shards = num_shards.max(1);
        let shard_size = lines.len().div_ceil(num_shards).max(1);
        let weighter = *wordspace.store().weighter();

        let pool = ThreadPoolBuilder::new().num_threads(num_shards).build()?;
        let shards: Vec<CollocationStore> = pool.install(|| {
            lines.par_chunks(shard_size).map(|chunk| {
                Pipeline::count_shard(chunk, size, weighter)
            }).collect()
        });

        for (shard_i, shard) in shards.into_iter().enumerate() {
            debug!(shard = shard_i, tokens = shard.total(), uniq = shard.uniq(), "merging shard");
            wordspace.absorb(shard)?;
        }

        wordspace.distill()?;
        info!(lines = lines.len(), tokens = wordspace.total(), uniq = wordspace.get_uniq(), vectors = wordspace.len(), "finished sharded corpus");
        Ok(lines.len())
    }

    /// Builds the word space described by `params` and returns the distilled
    /// words with their (row aligned) vectors.
    pub fn build(params: &JsonParams) -> Result<(Vec<String>, Array2<f32>), Box<dyn Error>> {

        let generator = params.space.generator()?;

        if params.num_shards > 1 {
            // shards and the final projection must agree on every word's vector
            let seed = params.seed.unwrap_or_else(rand::random);
            let projection = HashedIndex::new(generator, seed);
            let mut wordspace = WordSpace::new(params.space.theta, params.space.mincount, projection)?;
            Pipeline::dsm_sharded(&params.corpus_file, params.window_size, &mut wordspace, params.num_shards)?;
            return Ok(wordspace.into_matrix());
        }

        let projection = RandomIndex::new(generator, params.seed);
        let mut wordspace = WordSpace::new(params.space.theta, params.space.mincount, projection)?;
        Pipeline::dsm(&params.corpus_file, params.window_size, &mut wordspace, params.distill_every)?;
        Ok(wordspace.into_matrix())
    }

    pub fn run() -> Result<(), Box<dyn Error>> {

        info!("entering program...");
        let args: Vec<String> = env::args().collect();

        info!("building parameters...");
        let params = Config::new(&args)?.get_params();
        info!("{}", params);

        let timer = Instant::now();
        info!("starting word space building...");
        let (words, mut vecs) = Pipeline::build(&params)?;
        info!("finished word space with {} vectors, took {} seconds ...", words.len(), timer.elapsed().as_secs());

        if let Some((mode, nrstd)) = params.prune {
            vecs = reduce::prune(vecs.view(), mode, nrstd);
            info!(?mode, nrstd, "pruned columns by variance");
        }

        // save the vectors and the words aligned with their rows
        files_handling::save_output::<Array2<f32>>(&params.output_dir, "vecs", vecs)?;
        files_handling::save_output::<Vec<String>>(&params.output_dir, "words", words)?;
        info!("saved vecs and words to {}", params.output_dir);

        Ok(())
    }

}


#[cfg(test)]
mod tests {

    use std::fs;
    use std::path::Path;
    use serde_json::json;
    use super::Pipeline;
    use crate::config::Config;
    use crate::index::{Direction, HashedIndex, RandomIndexGenerator};
    use crate::space::{WordSpace, WordStatus};

    fn write_corpus(dir: &Path, lines: &[&str]) -> String {
        let path = dir.join("corpus.txt");
        fs::write(&path, lines.join("\n")).unwrap();
        path.display().to_string()
    }

    fn space(mincount: usize) -> WordSpace<HashedIndex> {
        let generator = RandomIndexGenerator::new(32, 4).unwrap();
        WordSpace::new(1.0, mincount, HashedIndex::new(generator, 3)).unwrap()
    }

    #[test]
    fn dsm_streams_lines() {

        let dir = tempfile::tempdir().unwrap();
        let corpus = write_corpus(dir.path(), &["a b c", "", "   ", "b c a"]);

        let mut wordspace = space(100);
        let n_lines = Pipeline::dsm(&corpus, 1, &mut wordspace, 0).unwrap();

        assert_eq!(n_lines, 4);
        assert_eq!(wordspace.total(), 6);
        assert_eq!(wordspace.get_uniq(), 3);
        assert!(wordspace.store().collocation_weight("b", Direction::Left, "a").unwrap() > 0.0);
        assert!(wordspace.store().collocation_weight("b", Direction::Right, "c").unwrap() > 0.0);
        assert!(wordspace.is_empty());
    }

    #[test]
    fn periodic_distillation_leaves_no_raw_ready_words() {

        let dir = tempfile::tempdir().unwrap();
        let corpus = write_corpus(dir.path(), &["the cat sat", "the dog sat", "a cat ran"]);

        let mut wordspace = space(0);
        Pipeline::dsm(&corpus, 2, &mut wordspace, 1).unwrap();

        for word in ["the", "cat", "sat", "dog", "a", "ran"] {
            assert_eq!(wordspace.status(word), WordStatus::Distilled, "{}", word);
        }
    }

    #[test]
    fn shards_add_up_to_the_same_counts() {

        let dir = tempfile::tempdir().unwrap();
        let lines = ["x y z", "y z w", "z w x", "w x y", "x"];
        let corpus = write_corpus(dir.path(), &lines);

        let mut single = space(1000);
        Pipeline::dsm(&corpus, 2, &mut single, 0).unwrap();
        let mut sharded = space(1000);
        Pipeline::dsm_sharded(&corpus, 2, &mut sharded, 3).unwrap();

        assert_eq!(sharded.total(), single.total());
        assert_eq!(sharded.get_uniq(), single.get_uniq());
        for word in ["x", "y", "z", "w"] {
            assert_eq!(sharded.wordcount(word), single.wordcount(word));
            assert_eq!(sharded.store().distinct_contexts(word), single.store().distinct_contexts(word));
        }
    }

    #[test]
    fn build_from_config() {

        let dir = tempfile::tempdir().unwrap();
        let corpus = write_corpus(dir.path(), &["a b c d", "d c b a"]);
        let json = json!({
            "corpus_file": corpus,
            "output_dir": dir.path().display().to_string(),
            "window_size": 2,
            "mincount": 0,
            "dimen": 16,
            "nonzeros": 2,
            "seed": 5
        });
        let params = Config::from_json(&json).unwrap().get_params();

        let (words, vecs) = Pipeline::build(&params).unwrap();
        assert_eq!(words.len(), 4);
        assert_eq!(vecs.dim(), (4, 16));

        let sharded = json!({
            "corpus_file": params.corpus_file,
            "output_dir": params.output_dir,
            "mincount": 0,
            "dimen": 16,
            "nonzeros": 2,
            "num_shards": 2
        });
        let params = Config::from_json(&sharded).unwrap().get_params();
        let (words, vecs) = Pipeline::build(&params).unwrap();
        assert_eq!(words.len(), 4);
        assert_eq!(vecs.nrows(), 4);
    }

    #[test]
    fn missing_corpus_is_an_error() {
        let mut wordspace = space(1);
        assert!(Pipeline::dsm("/definitely/not/here.txt", 2, &mut wordspace, 0).is_err());
    }
}
