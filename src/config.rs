use serde_json::Value;
use std::{fs::File, error::Error, fmt::Display, io::BufReader};
use crate::error::ConfigError;
use crate::reduce::PruneMode;
use crate::space::SpaceParams;


#[derive(Clone, Debug, PartialEq)]
pub struct JsonParams {
    pub corpus_file: String,
    pub output_dir: String,
    pub window_size: usize,
    pub space: SpaceParams,
    pub seed: Option<u64>,
    pub distill_every: usize,
    pub num_shards: usize,
    pub prune: Option<(PruneMode, f32)>
}


impl Display for JsonParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "using hyper-params:
        corpus_file: {}
        output_dir: {}
        window_size: {}
        theta: {}
        mincount: {}
        dimen: {}
        nonzeros: {}
        seed: {:?}
        distill_every: {}
        num_shards: {}
        prune: {:?}",
        self.corpus_file, self.output_dir, self.window_size, self.space.theta, self.space.mincount,
        self.space.dimen, self.space.nonzeros, self.seed, self.distill_every, self.num_shards, self.prune
        )
    }
}

pub struct Config {
    params: JsonParams
}

impl Config {

    pub fn get_params(&self) -> JsonParams {
        self.params.clone()
    }

    pub fn new(args: &[String]) -> Result<Config, Box<dyn Error>> {

        if args.len() != 2 {
            return Err(ConfigError::Arguments.into());
        }

        // parse input json
        let f = BufReader::new(File::open(&args[1])?);
        let json: Value = serde_json::from_reader(f)?;
        Ok(Config::from_json(&json)?)
    }

    pub fn from_json(json: &Value) -> Result<Config, ConfigError> {

        // input and output are required
        let corpus_file = get_str(json, "corpus_file")?;
        let output_dir = get_str(json, "output_dir")?;

        // handle default vs input parameters
        let space = SpaceParams {
            theta: get_f64(json, "theta", 1.0)?,
            mincount: get_usize(json, "mincount", 5)?,
            dimen: get_usize(json, "dimen", 2000)?,
            nonzeros: get_usize(json, "nonzeros", 8)?,
        };
        let seed = match json.get("seed") {
            Some(seed) => Some(seed.as_u64().ok_or(ConfigError::WrongType { key: "seed", expected: "a non-negative integer" })?),
            None => None
        };
        let prune = match json.get("prune") {
            Some(prune) => Some(get_prune(prune)?),
            None => None
        };

        // sharded runs distill once, after the shards are merged
        let num_shards = get_usize(json, "num_shards", 1)?.max(1);
        let distill_every = match json.get("distill_every") {
            Some(_) if num_shards > 1 => match get_usize(json, "distill_every", 0)? {
                0 => 0,
                every => return Err(ConfigError::ShardedDistill(every))
            },
            _ => get_usize(json, "distill_every", 100000)?
        };

        let params = JsonParams {
            corpus_file: corpus_file.to_owned(),
            output_dir: output_dir.to_owned(),
            window_size: get_usize(json, "window_size", 2)?,
            space,
            seed,
            distill_every,
            num_shards,
            prune
        };

        Ok(Self { params })
    }

}

fn get_str<'a>(json: &'a Value, key: &'static str) -> Result<&'a str, ConfigError> {
    json.get(key)
        .ok_or(ConfigError::Missing(key))?
        .as_str()
        .ok_or(ConfigError::WrongType { key, expected: "a string" })
}

fn get_usize(json: &Value, key: &'static str, default: usize) -> Result<usize, ConfigError> {
    match json.get(key) {
        Some(value) => value.as_u64().map(|v| v as usize).ok_or(ConfigError::WrongType { key, expected: "a non-negative integer" }),
        None => Ok(default)
    }
}

fn get_f64(json: &Value, key: &'static str, default: f64) -> Result<f64, ConfigError> {
    match json.get(key) {
        Some(value) => value.as_f64().ok_or(ConfigError::WrongType { key, expected: "numeric" }),
        None => Ok(default)
    }
}

fn get_prune(json: &Value) -> Result<(PruneMode, f32), ConfigError> {
    let mode = match get_str(json, "mode")? {
        "high" => PruneMode::High,
        "low" => PruneMode::Low,
        other => return Err(ConfigError::PruneMode(other.to_owned()))
    };
    let nrstd = get_f64(json, "nrstd", 1.0)?;
    Ok((mode, nrstd as f32))
}


pub mod files_handling {

    use ndarray::Array2;
    use ndarray_npy::{ReadNpyError, read_npy, write_npy};
    use std::{fs::{self, File}, error::Error, io::{BufReader, BufWriter, Write}};

    pub fn read_input<R: ReadFile>(file_path: &str) -> Result<<R as ReadFile>::Item, <R as ReadFile>::Error> {
        let input = <R as ReadFile>::read_file(file_path)?;
        Ok(input)
    }

    pub fn save_output<S: SaveFile>(output_dir: &str, file_name: &str, item: S) -> Result<(), Box<dyn Error>> {

        // create output folder
        fs::create_dir_all(output_dir)?;

        // SaveFile can be Array2<f32> or Vec<String>
        item.save_file(output_dir, file_name)?;
        Ok(())
    }

    pub trait ReadFile {
        type Error;
        type Item;
        fn read_file(file_path: &str) -> Result<Self::Item, Self::Error>;
    }

    impl ReadFile for Array2<f32> {
        type Error = ReadNpyError;
        type Item = Self;
        fn read_file(file_path: &str) -> Result<Self::Item, Self::Error> {
            let in_file = file_path.to_string() + ".npy";
            read_npy(in_file)
        }
    }

    impl ReadFile for Vec<String> {
        type Error = Box<dyn Error>;
        type Item = Self;
        fn read_file(file_path: &str) -> Result<Self::Item, Self::Error> {
            let in_file = file_path.to_string() + ".txt";
            let f = BufReader::new(File::open(in_file)?);
            let item = serde_json::from_reader(f)?;
            Ok(item)
        }
    }

    pub trait SaveFile {
        fn save_file(&self, output_dir: &str, file_name: &str) -> Result<(), Box<dyn Error>>;
    }

    impl SaveFile for Array2<f32> {
        fn save_file(&self, output_dir: &str, file_name: &str) -> Result<(), Box<dyn Error>> {
            let out = output_dir.to_string() + "/" + file_name + ".npy";
            write_npy(out, self)?;
            Ok(())
        }
    }

    impl SaveFile for Vec<String> {
        fn save_file(&self, output_dir: &str, file_name: &str) -> Result<(), Box<dyn Error>> {
            let out = output_dir.to_string() + "/" + file_name + ".txt";
            let mut f = BufWriter::new(File::create(out)?);
            serde_json::to_writer(&mut f, self)?;
            f.flush()?;
            Ok(())
        }
    }
}
