pub mod evaluation;
pub mod level;
pub mod role;
pub mod word;

pub use evaluation::{EvaluationError, EvaluationResult, Fluency, ScoreGrade, WordScore};
pub use level::{Level, LEVELS};
pub use role::Role;
pub use word::{QuizItem, StudyItem, WordRecord};
