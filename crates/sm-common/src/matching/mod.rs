pub mod capacity;
pub mod category;
pub mod facility;
pub mod location;
pub mod pipeline;
pub mod price;
pub mod ranking;
pub mod result;
pub mod schedule;
pub mod scoring;
pub mod weights;

pub use pipeline::{BatchOutcome, MatchingError, MatchingService, PersistedMatch};
pub use result::{MatchResult, ScoreBreakdown};
pub use weights::{CANONICAL_WEIGHTS, Dimension, WeightVector};
