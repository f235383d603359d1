use std::{error::Error, env, fs::File, io::{self, BufRead}, process};
use ndarray::Array2;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use word_space::{files_handling, Similarity};


// checks on distilled vectors, run independently of the main binary.
// arguments to this executable should be:
// a letter selector: "s" for the similarity test, "v" for the synonym (vocabulary) test,
// "n" for nearest neighbours
// path to input based on selector (scored pairs, synonym items or single words)
// path to the output directory holding vecs.npy and words.txt
// example: ... s Input/simlex.txt Output

fn main() {

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run() {
        error!("{}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {

    let args: Vec<String> = env::args().collect();
    if args.len() != 4 {
        return Err("expected a selector (s, v or n), an input file and the output directory of the vectors".into());
    }
    let selector = args[1].as_str();

    // read inputs file
    let lines = io::BufReader::new(File::open(&args[2])?)
        .lines()
        .collect::<Result<Vec<String>, io::Error>>()?;

    // read in distilled vecs and words
    let w = files_handling::read_input::<Array2<f32>>(&format!("{}/vecs", args[3]))?;
    let words = files_handling::read_input::<Vec<String>>(&format!("{}/words", args[3]))?;
    let sim_obj = Similarity::new(w, words)?;

    match selector {
        "s" => run_similarity_test(&lines, &sim_obj),
        "v" => run_vocabulary_test(&lines, &sim_obj),
        "n" => run_nearest_neighbours(&lines, 10, &sim_obj),
        _ => Err(format!("unrecognized pattern in first argument {}", selector).into())
    }
}


fn run_similarity_test(lines: &[String], similarity_object: &Similarity) -> Result<(), Box<dyn Error>> {

    // each line holds two words and a gold score, separated by whitespace:
    // car automobile 8.94
    let mut gold: Vec<(String, String, f32)> = Vec::new();
    for line in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [word1, word2, score] => gold.push((word1.to_string(), word2.to_string(), score.parse()?)),
            [] => continue,
            _ => warn!(line = %line, "expected two words and a score"),
        }
    }

    match similarity_object.similarity_test(&gold) {
        Some(rho) => info!("Spearman rank correlation over {} pairs: {}", gold.len(), rho),
        None => warn!("Spearman rank correlation is undefined for these pairs"),
    }
    Ok(())
}

fn run_vocabulary_test(lines: &[String], similarity_object: &Similarity) -> Result<(), Box<dyn Error>> {

    // each line holds a target followed by its alternatives, the right one first
    let items: Vec<Vec<String>> = lines
        .iter()
        .map(|line| line.split_whitespace().map(|x| x.to_string()).collect::<Vec<String>>())
        .filter(|item| !item.is_empty())
        .collect();

    let report = similarity_object.vocabulary_test(&items);
    info!("TOEFL synonym score: {}", report.score);
    info!("Incorrect: {:?}", report.incorrect);
    info!("Unknown targets: {:?}", report.unknown_targets);
    info!("Unknown answers: {:?}", report.unknown_answers);
    Ok(())
}

fn run_nearest_neighbours(lines: &[String], k: usize, similarity_object: &Similarity) -> Result<(), Box<dyn Error>> {

    // finding the k most similar words to each of the input tokens
    for token in lines.iter().map(|line| line.trim()).filter(|token| !token.is_empty()) {

        let neighbours = match similarity_object.nns(token, k) {
            Ok(neighbours) => neighbours,
            Err(e) => {
                warn!("{}", e);
                continue
            }
        };

        info!("{} most similar words to {}", k, token);
        for (i, (similar_token, score)) in neighbours.iter().enumerate() {
            info!("{} : {} ? {} = {}", i, token, similar_token, score);
        }
    }

    Ok(())
}
