mod collocation;
mod config;
mod error;
mod index;
mod pipeline;
mod reduce;
mod similarity;
mod space;
mod weight;
mod window;

pub use collocation::{CollocationStore, Collocations, Entry, Spill, Vocabulary};
pub use config::{files_handling, Config, JsonParams};
pub use error::{ConfigError, LookupError, SpaceError};
pub use index::{Direction, HashedIndex, IndexVector, Projection, RandomIndex, RandomIndexGenerator};
pub use pipeline::Pipeline;
pub use reduce::{prune, prune_high_variance, prune_low_variance, PruneMode};
pub use similarity::{Similarity, VocabularyReport};
pub use space::{SpaceParams, WordSpace, WordStatus};
pub use weight::OnlineWeighter;
pub use window::{left_windows, words};
