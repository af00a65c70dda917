#![forbid(unsafe_code)]

pub mod audio;
pub mod error;
pub mod progress_store;
pub mod sessions;

mod profiles;

pub use kids_math_core::Clock;

pub use audio::{AudioCue, AudioCues, SilentAudio};
pub use error::{ProgressError, SessionError};
pub use progress_store::ProgressStore;

pub use sessions::{AnswerOutcome, Session, SessionProgress, SessionResult, SessionRunner};
