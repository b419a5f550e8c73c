use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Hash selector outside `{full256, trunc8, trunc16}` (or `1`, `2`, `3`).
    #[error("invalid hash variant `{0}`, select 1, 2 or 3")]
    InvalidVariant(String),

    #[error("difficulty {0} exceeds 256 bits")]
    InvalidDifficulty(u32),

    /// A bounded search ran out of budget before finding anything.
    #[error("search exhausted after {attempts} attempts")]
    SearchExhausted { attempts: u64 },

    /// The secure random source could not supply entropy.
    #[error("random source failure: {0}")]
    RandomSourceFailure(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde: {0}")]
    Serde(#[from] serde_json::Error),
}
