use thiserror::Error;

use crate::generator::{ChoiceError, GenerateError};
use crate::model::{CatalogError, LevelError, ProfileError, ScoreError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Choice(#[from] ChoiceError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
}
