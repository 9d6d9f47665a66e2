pub mod matching_service;
pub mod name_normalizer;
pub mod prompt;
pub mod report_writer;
pub mod result_aggregator;
pub mod verification_service;

pub use matching_service::MatchingService;
pub use name_normalizer::{normalize, NameNormalizer, TokenStripping};
pub use prompt::{PageLayout, PromptTemplate};
pub use report_writer::ReportWriter;
pub use verification_service::VerificationService;
