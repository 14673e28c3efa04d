use thiserror::Error;

#[derive(Debug, Error)]
pub enum LicenseError {
    #[error("RSA error: {0}")]
    Rsa(#[from] rsa::Error),

    #[error("PEM error: {0}")]
    Pem(String),

    #[error("Invalid license format: {0}")]
    InvalidFormat(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("License expired at {0}")]
    Expired(String),

    #[error("Hardware fingerprint does not match this machine")]
    HardwareMismatch,

    #[error("Key load error: {0}")]
    KeyLoad(String),

    #[error("Key file already exists: {0}")]
    KeyFileExists(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
