use thiserror::Error;

pub type PaygateResult<T> = Result<T, PaygateError>;

#[derive(Error, Debug)]
pub enum PaygateError {
    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Checkout error: {0}")]
    Checkout(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(String),
}
