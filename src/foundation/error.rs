use std::path::PathBuf;

pub type StitchkitResult<T> = Result<T, StitchkitError>;

#[derive(thiserror::Error, Debug)]
pub enum StitchkitError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("no images found in source folder '{}'", .0.display())]
    EmptySource(PathBuf),

    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("memory probe error: {0}")]
    Memory(String),

    #[error("image error: {0}")]
    Image(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StitchkitError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    pub fn memory(msg: impl Into<String>) -> Self {
        Self::Memory(msg.into())
    }

    pub fn image(msg: impl Into<String>) -> Self {
        Self::Image(msg.into())
    }
}
