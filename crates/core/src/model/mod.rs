mod ease;
mod ids;
mod outcome;
mod progress;

pub use ease::EaseFactor;
pub use ids::{QuestionId, UserId};
pub use outcome::{AnswerResult, MAX_QUALITY, Outcome};
pub use progress::{ProgressRecord, ProgressStateError, ProgressStatus};
