pub mod file_handle;
pub mod loaders;
pub mod outcome;
pub mod pair;

pub use file_handle::{FileHandle, FileKind};
pub use loaders::load_files_from_dir;
pub use outcome::{BatchSummary, OutcomeStatus, PairOutcome};
pub use pair::{KeyCollision, MatchKey, MatchResult, Pair};
