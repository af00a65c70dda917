mod ids;
mod level;
mod profile;
mod progress;
mod question;

pub use ids::{LevelId, ParseIdError, UserId};

pub use level::{CatalogError, ComplementStyle, LevelCatalog, LevelDescriptor, LevelError, LevelRule};
pub use profile::{ProfileDraft, ProfileError, UserProfile};
pub use progress::{
    LevelBest, LevelState, ProgressRecord, QUESTIONS_PER_SESSION, ResultOutcome, Score,
    ScoreError, Stars,
};
pub use question::{Hint, Question, QuestionBody, Visual};
