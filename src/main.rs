use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;
use word_space::Pipeline;

// builds random indexing vectors from a corpus, given a json file of parameters:
// ... config.json

fn main() {

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = Pipeline::run() {
        error!("{}", e);
        process::exit(1);
    }
}
