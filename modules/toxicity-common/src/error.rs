use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToxicityError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Persistence error: {0}")]
    Persist(String),
}
