use ndarray::ShapeError;
use thiserror::Error;

/// Errors raised while configuring or updating a `WordSpace`.
#[derive(Debug, Error)]
pub enum SpaceError {
    #[error("theta must be a finite positive number, got {0}")]
    InvalidTheta(f64),
    #[error("dimen must be at least 3 to leave room for the direction shift, got {0}")]
    DimenTooSmall(usize),
    #[error("nonzeros must be at least 1")]
    NoNonzeros,
    #[error("nonzeros ({nonzeros}) cannot exceed dimen - 2 with dimen {dimen}")]
    TooManyNonzeros { nonzeros: usize, dimen: usize },
    #[error("index vector entry ({position}, {sign}) is not a signed position in [1, dimen - 2] with dimen {dimen}, or repeats a position")]
    InvalidIndex { position: usize, sign: i8, dimen: usize },
    #[error("index vector of dimen {found} does not fit a word space of dimen {expected}")]
    DimenMismatch { expected: usize, found: usize },
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// A vector lookup that could not be answered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("word '{0}' was never seen")]
    Unknown(String),
    #[error("word '{0}' is still accumulating raw counts")]
    Pending(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("input should be a path to json file only")]
    Arguments,
    #[error("{0} was not supplied through json")]
    Missing(&'static str),
    #[error("given {key} is not {expected}")]
    WrongType { key: &'static str, expected: &'static str },
    #[error("unrecognized prune mode '{0}', expected \"high\" or \"low\"")]
    PruneMode(String),
    #[error("distill_every ({0}) cannot be combined with num_shards > 1, shards are only distilled once merged")]
    ShardedDistill(usize),
}
