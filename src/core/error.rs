use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unknown block denomination: {0}")]
    UnknownDenomination(u32),

    #[error("{what} does not fit: needs {needed} columns, {available} available")]
    LayoutDoesNotFit {
        what: String,
        needed: i32,
        available: i32,
    },

    #[error("Not enough columns on the top row: needs {needed}, grid has {available}")]
    NotEnoughColumns { needed: usize, available: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, GridError>;
