pub mod grade;
pub mod loaders;
pub mod submission;

pub use grade::{ErrorBody, GradeRecord, GradeResponse, SubmissionOutcome};
pub use loaders::{load_all_submission_files, load_submission_file};
pub use submission::{GradeRequest, SubmissionBatch};
